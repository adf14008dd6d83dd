use std::sync::atomic::Ordering;

use ahash::{HashMap, HashMapExt};
use parking_lot::Mutex;

use crate::error::ReplacerError;
use crate::list::KeyedList;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::{FrameId, PageId};

/// Which live list currently holds a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiveTier {
  /// Seen once recently.
  Recent,
  /// Seen at least twice.
  Frequent,
}

/// Which ghost list remembers an evicted page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GhostTier {
  Recent,
  Frequent,
}

/// Bookkeeping for one live frame.
#[derive(Debug)]
struct LiveSlot {
  page_id: PageId,
  tier: LiveTier,
  evictable: bool,
}

/// Everything the single lock protects.
///
/// Live lists are keyed by frame id; ghost lists by page id, since the page
/// id is the only identity a page keeps after its frame is reused.
#[derive(Debug)]
struct ReplacerState {
  recent: KeyedList<FrameId>,
  frequent: KeyedList<FrameId>,
  recent_ghost: KeyedList<PageId>,
  frequent_ghost: KeyedList<PageId>,
  live: HashMap<FrameId, LiveSlot>,
  ghost: HashMap<PageId, GhostTier>,
  // Target size of the recent list. The frequent list implicitly gets
  // whatever capacity remains.
  recent_target: usize,
  // Number of live entries currently marked evictable.
  evictable_count: usize,
}

impl ReplacerState {
  fn total_tracked(&self) -> usize {
    self.recent.len() + self.frequent.len() + self.recent_ghost.len() + self.frequent_ghost.len()
  }

  // Bring a ghost-hit page back as a live, evictable entry on the
  // frequent side: a ghost hit is by definition a repeated access.
  fn revive(&mut self, frame_id: FrameId, page_id: PageId) {
    self.frequent.push_front(frame_id);
    self.live.insert(
      frame_id,
      LiveSlot {
        page_id,
        tier: LiveTier::Frequent,
        evictable: true,
      },
    );
    self.evictable_count += 1;
  }

  // First evictable entry from the LRU end of the given live list.
  fn victim_in(&self, tier: LiveTier) -> Option<FrameId> {
    let list = match tier {
      LiveTier::Recent => &self.recent,
      LiveTier::Frequent => &self.frequent,
    };
    list
      .iter_lru()
      .find(|frame_id| self.live.get(frame_id).is_some_and(|slot| slot.evictable))
  }
}

/// An Adaptive Replacement Cache (ARC) eviction policy for a fixed pool of
/// buffer frames.
///
/// The replacer tracks resident frames in two live lists, one for frames
/// seen once recently and one for frames seen repeatedly, and remembers
/// recently evicted pages in two metadata-only ghost lists. A hit on a ghost
/// entry is evidence that the corresponding side deserved more room, so it
/// shifts an adaptive target that decides which live list surrenders the
/// next victim. The policy manipulates identifiers only; it never sees page
/// contents.
///
/// Frames enter untracked-by-eviction ("pinned"): [`ArcReplacer::evict`]
/// only ever returns frames the owner explicitly marked evictable via
/// [`ArcReplacer::set_evictable`].
///
/// A single mutex serializes every operation, so all methods take `&self`
/// and the type can be shared across the owning pool's worker threads.
#[derive(Debug)]
pub struct ArcReplacer {
  capacity: usize,
  state: Mutex<ReplacerState>,
  metrics: Metrics,
}

impl ArcReplacer {
  /// Creates a replacer for a pool of `capacity` frames, with all lists
  /// empty and the adaptive target at zero.
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      state: Mutex::new(ReplacerState {
        recent: KeyedList::new(),
        frequent: KeyedList::new(),
        recent_ghost: KeyedList::new(),
        frequent_ghost: KeyedList::new(),
        live: HashMap::new(),
        ghost: HashMap::new(),
        recent_target: 0,
        evictable_count: 0,
      }),
      metrics: Metrics::new(),
    }
  }

  /// Records an access to `frame_id`, currently mapped to `page_id`.
  ///
  /// Must be called on every touch of a frame, hit or fill. Exactly one of
  /// four things happens: a live recent entry is promoted to the frequent
  /// list, a live frequent entry is refreshed, a ghost entry is revived
  /// into the frequent list (adapting the target), or a brand-new entry is
  /// inserted at the front of the recent list. New entries start pinned;
  /// revived entries start evictable.
  pub fn record_access(&self, frame_id: FrameId, page_id: PageId) {
    let mut state = self.state.lock();
    let s = &mut *state;

    // Live hit: promote or refresh.
    if let Some(slot) = s.live.get_mut(&frame_id) {
      match slot.tier {
        LiveTier::Recent => {
          // Second touch moves the frame to the frequent side.
          s.recent.remove(&frame_id);
          s.frequent.push_front(frame_id);
          slot.tier = LiveTier::Frequent;
        }
        LiveTier::Frequent => {
          s.frequent.move_to_front(&frame_id);
        }
      }
      self.metrics.hits.fetch_add(1, Ordering::Relaxed);
      return;
    }

    match s.ghost.get(&page_id).copied() {
      // The page was recently evicted from the recency side. The miss would
      // have been a hit with a larger recency allocation, so grow the
      // target before reviving the page.
      Some(GhostTier::Recent) => {
        let delta = if s.recent_ghost.len() >= s.frequent_ghost.len() {
          1
        } else {
          s.frequent_ghost.len() / s.recent_ghost.len()
        };
        let raised = (s.recent_target + delta).min(self.capacity);
        if raised != s.recent_target {
          self.metrics.target_raises.fetch_add(1, Ordering::Relaxed);
        }
        s.recent_target = raised;

        s.recent_ghost.remove(&page_id);
        s.ghost.remove(&page_id);
        s.revive(frame_id, page_id);
        self.metrics.ghost_hits.fetch_add(1, Ordering::Relaxed);
      }
      // Symmetric for the frequency side: shrink the target.
      Some(GhostTier::Frequent) => {
        let delta = if s.frequent_ghost.len() >= s.recent_ghost.len() {
          1
        } else {
          s.recent_ghost.len() / s.frequent_ghost.len()
        };
        let lowered = s.recent_target.saturating_sub(delta);
        if lowered != s.recent_target {
          self.metrics.target_lowers.fetch_add(1, Ordering::Relaxed);
        }
        s.recent_target = lowered;

        s.frequent_ghost.remove(&page_id);
        s.ghost.remove(&page_id);
        s.revive(frame_id, page_id);
        self.metrics.ghost_hits.fetch_add(1, Ordering::Relaxed);
      }
      // Full miss. Make room in the ghost bookkeeping first, then track
      // the frame as a fresh, pinned entry on the recent side.
      None => {
        if s.recent.len() + s.recent_ghost.len() == self.capacity {
          // The recency side (live + ghost) is saturated.
          if let Some(page) = s.recent_ghost.pop_back() {
            s.ghost.remove(&page);
          }
        } else if s.recent.len() + s.recent_ghost.len() < self.capacity
          && s.total_tracked() == 2 * self.capacity
        {
          // Total tracked population is at its bound.
          if let Some(page) = s.frequent_ghost.pop_back() {
            s.ghost.remove(&page);
          }
        }

        s.recent.push_front(frame_id);
        s.live.insert(
          frame_id,
          LiveSlot {
            page_id,
            tier: LiveTier::Recent,
            evictable: false,
          },
        );
        self.metrics.misses.fetch_add(1, Ordering::Relaxed);
      }
    }
  }

  /// Selects a victim, converts it into a ghost entry, and returns its
  /// frame id. Returns `None` when no live entry is evictable.
  ///
  /// The recency side gives up the victim while it holds at least the
  /// adaptive target (the tie is deliberately resolved to the recency
  /// side); otherwise the frequency side does. Pinned entries are skipped,
  /// and if the preferred side has no candidate at all, the other side is
  /// scanned under the same oldest-first rule.
  pub fn evict(&self) -> Option<FrameId> {
    let mut state = self.state.lock();
    let s = &mut *state;

    if s.evictable_count == 0 {
      return None;
    }

    let scan_order = if s.recent.len() >= s.recent_target {
      [LiveTier::Recent, LiveTier::Frequent]
    } else {
      [LiveTier::Frequent, LiveTier::Recent]
    };

    for tier in scan_order {
      let Some(frame_id) = s.victim_in(tier) else {
        continue;
      };
      let Some(slot) = s.live.remove(&frame_id) else {
        continue;
      };
      match tier {
        LiveTier::Recent => {
          s.recent.remove(&frame_id);
          s.recent_ghost.push_front(slot.page_id);
          s.ghost.insert(slot.page_id, GhostTier::Recent);
        }
        LiveTier::Frequent => {
          s.frequent.remove(&frame_id);
          s.frequent_ghost.push_front(slot.page_id);
          s.ghost.insert(slot.page_id, GhostTier::Frequent);
        }
      }
      s.evictable_count -= 1;
      self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
      return Some(frame_id);
    }

    None
  }

  /// Pins or unpins a live frame.
  ///
  /// Setting the flag to its current value is a no-op. Fails with
  /// [`ReplacerError::InvalidFrame`] when the frame is not live; callers
  /// must only pass ids the replacer has seen via
  /// [`ArcReplacer::record_access`].
  pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) -> Result<(), ReplacerError> {
    let mut state = self.state.lock();
    let s = &mut *state;

    let Some(slot) = s.live.get_mut(&frame_id) else {
      return Err(ReplacerError::InvalidFrame(frame_id));
    };
    if slot.evictable == evictable {
      return Ok(());
    }
    slot.evictable = evictable;
    if evictable {
      s.evictable_count += 1;
    } else {
      s.evictable_count -= 1;
    }
    Ok(())
  }

  /// Deletes a live, evictable frame outright, leaving no ghost residue.
  ///
  /// Used when a frame is repurposed outside normal eviction, e.g. a forced
  /// invalidation. An absent frame is a silent no-op, since the caller may
  /// race with an eviction. Fails with [`ReplacerError::FrameNotEvictable`]
  /// when the frame is live but pinned.
  pub fn remove(&self, frame_id: FrameId) -> Result<(), ReplacerError> {
    let mut state = self.state.lock();
    let s = &mut *state;

    let Some(slot) = s.live.get(&frame_id) else {
      return Ok(());
    };
    if !slot.evictable {
      return Err(ReplacerError::FrameNotEvictable(frame_id));
    }

    let tier = slot.tier;
    s.live.remove(&frame_id);
    match tier {
      LiveTier::Recent => s.recent.remove(&frame_id),
      LiveTier::Frequent => s.frequent.remove(&frame_id),
    };
    s.evictable_count -= 1;
    self.metrics.removals.fetch_add(1, Ordering::Relaxed);
    Ok(())
  }

  /// The number of live entries currently marked evictable.
  pub fn size(&self) -> usize {
    self.state.lock().evictable_count
  }

  /// Whether no live entry is currently evictable.
  pub fn is_empty(&self) -> bool {
    self.size() == 0
  }

  /// The fixed number of frames this replacer was built for.
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// The current adaptive target size of the recency list.
  pub fn recency_target(&self) -> usize {
    self.state.lock().recent_target
  }

  /// Resets the replacer to its freshly-constructed state. Metrics
  /// counters are not reset.
  pub fn clear(&self) {
    let mut state = self.state.lock();
    state.recent.clear();
    state.frequent.clear();
    state.recent_ghost.clear();
    state.frequent_ghost.clear();
    state.live.clear();
    state.ghost.clear();
    state.recent_target = 0;
    state.evictable_count = 0;
  }

  /// Creates a point-in-time snapshot of the replacer's activity counters.
  pub fn metrics(&self) -> MetricsSnapshot {
    self.metrics.snapshot()
  }
}
