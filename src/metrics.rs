use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// A thread-safe, internal metrics collector for the replacer.
/// All fields are atomic to allow for lock-free updates.
#[derive(Debug)]
pub(crate) struct Metrics {
  // --- Access classification ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,
  pub(crate) ghost_hits: CachePadded<AtomicU64>,

  // --- Frame turnover ---
  pub(crate) evictions: CachePadded<AtomicU64>,
  pub(crate) removals: CachePadded<AtomicU64>,

  // --- Adaptation activity ---
  pub(crate) target_raises: CachePadded<AtomicU64>,
  pub(crate) target_lowers: CachePadded<AtomicU64>,

  // --- Timestamp for uptime ---
  created_at: Instant,
}

// Manual implementation of Default to handle the non-default `Instant`.
impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: CachePadded::new(AtomicU64::new(0)),
      misses: CachePadded::new(AtomicU64::new(0)),
      ghost_hits: CachePadded::new(AtomicU64::new(0)),
      evictions: CachePadded::new(AtomicU64::new(0)),
      removals: CachePadded::new(AtomicU64::new(0)),
      target_raises: CachePadded::new(AtomicU64::new(0)),
      target_lowers: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Creates a point-in-time snapshot of the current metrics.
  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let ghost_hits = self.ghost_hits.load(Ordering::Relaxed);
    let total_accesses = hits + misses + ghost_hits;

    MetricsSnapshot {
      hits,
      misses,
      ghost_hits,
      hit_ratio: if total_accesses == 0 {
        0.0
      } else {
        hits as f64 / total_accesses as f64
      },
      evictions: self.evictions.load(Ordering::Relaxed),
      removals: self.removals.load(Ordering::Relaxed),
      target_raises: self.target_raises.load(Ordering::Relaxed),
      target_lowers: self.target_lowers.load(Ordering::Relaxed),
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of the replacer's metrics.
#[derive(Clone)]
pub struct MetricsSnapshot {
  /// The number of accesses that found their frame in a live list.
  pub hits: u64,
  /// The number of accesses that missed every list.
  pub misses: u64,
  /// The number of accesses served from a ghost list.
  pub ghost_hits: u64,
  /// The live hit ratio (hits / all recorded accesses).
  pub hit_ratio: f64,
  /// The number of frames evicted into a ghost list.
  pub evictions: u64,
  /// The number of frames removed outright, without ghost residue.
  pub removals: u64,
  /// How many times a ghost hit raised the recency target.
  pub target_raises: u64,
  /// How many times a ghost hit lowered the recency target.
  pub target_lowers: u64,
  /// The number of seconds the replacer has been running.
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("ghost_hits", &self.ghost_hits)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("evictions", &self.evictions)
      .field("removals", &self.removals)
      .field("target_raises", &self.target_raises)
      .field("target_lowers", &self.target_lowers)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
