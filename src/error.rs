use std::fmt;

use crate::FrameId;

/// Errors raised when a caller violates the replacer contract.
///
/// Both variants indicate caller misuse rather than a runtime condition.
/// A failed call leaves the replacer completely untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacerError {
  /// The frame id is not currently tracked as a live entry. It was either
  /// never recorded, or has already been evicted or removed.
  InvalidFrame(FrameId),
  /// The frame is live but pinned. Pinned frames must be marked evictable
  /// before they can be removed.
  FrameNotEvictable(FrameId),
}

impl fmt::Display for ReplacerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReplacerError::InvalidFrame(frame_id) => {
        write!(f, "frame {} is not tracked by the replacer", frame_id)
      }
      ReplacerError::FrameNotEvictable(frame_id) => {
        write!(f, "frame {} is pinned and cannot be removed", frame_id)
      }
    }
  }
}

impl std::error::Error for ReplacerError {}
