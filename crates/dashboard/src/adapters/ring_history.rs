// Rust guideline compliant 2026-10-18

//! Bounded in-memory adapter for the `History` port.
//!
//! One mutex guards both `append` and the copy-out in `list_all`, so a reader
//! always sees the buffer either before or after a racing append.

use std::collections::VecDeque;

use domain::{History, MetricSnapshot};
use parking_lot::Mutex;

/// Maximum number of snapshots any ring holds.
pub const CAPACITY: usize = 100;

/// FIFO ring of metric snapshots; the oldest entry is evicted when full.
#[derive(Debug)]
pub struct RingHistory {
    capacity: usize,
    entries: Mutex<VecDeque<MetricSnapshot>>,
}

impl RingHistory {
    /// Create an empty ring holding at most [`CAPACITY`] snapshots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(CAPACITY)
    }

    /// Smaller rings for tests; `capacity` is clamped to `1..=CAPACITY`.
    #[must_use]
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, CAPACITY);
        Self { capacity, entries: Mutex::new(VecDeque::with_capacity(capacity)) }
    }

    /// Maximum number of stored snapshots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// `true` when nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for RingHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl History for RingHistory {
    fn append(&self, snapshot: MetricSnapshot) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(snapshot);
    }

    fn list_all(&self) -> Vec<MetricSnapshot> {
        self.entries.lock().iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Metrics, MetricsSource, MonitorError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use updater::{Updater, UpdaterConfig};

    fn snapshot(v: f64) -> MetricSnapshot {
        MetricSnapshot::now(Metrics::Regression { mse: v, rmse: v, r2_score: v, mae: v })
    }

    fn mse(s: &MetricSnapshot) -> f64 {
        match s.metrics {
            Metrics::Regression { mse, .. } => mse,
            Metrics::Classification { accuracy, .. } => accuracy,
        }
    }

    /// Emits `mse = 0, 1, 2, ...` on successive calls.
    #[derive(Default)]
    struct CountingSource(AtomicUsize);

    impl MetricsSource for CountingSource {
        fn current_metrics(&self) -> Result<Metrics, MonitorError> {
            let v = self.0.fetch_add(1, Ordering::SeqCst) as f64;
            Ok(Metrics::Regression { mse: v, rmse: v, r2_score: v, mae: v })
        }
    }

    #[test]
    fn keeps_last_min_n_capacity_in_order() {
        for n in [0_usize, 1, 99, 100, 101, 250] {
            let ring = RingHistory::default();
            for i in 0..n {
                ring.append(snapshot(i as f64));
            }
            let all = ring.list_all();
            assert_eq!(all.len(), n.min(100), "n = {n}");
            let expected: Vec<f64> = (n.saturating_sub(100)..n).map(|i| i as f64).collect();
            assert_eq!(all.iter().map(mse).collect::<Vec<_>>(), expected, "n = {n}");
        }
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let ring = RingHistory::with_capacity(0);
        ring.append(snapshot(1.0));
        ring.append(snapshot(2.0));
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.list_all().iter().map(mse).collect::<Vec<_>>(), [2.0]);
    }

    #[test]
    fn oversized_capacity_is_capped_at_one_hundred() {
        let ring = RingHistory::with_capacity(500);
        for i in 0..300 {
            ring.append(snapshot(f64::from(i)));
        }
        assert_eq!(ring.capacity(), CAPACITY);
        assert_eq!(ring.len(), 100);
        assert!((mse(&ring.list_all()[0]) - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn list_all_is_a_copy() {
        let ring = RingHistory::with_capacity(3);
        ring.append(snapshot(1.0));
        let before = ring.list_all();
        ring.append(snapshot(2.0));
        assert_eq!(before.len(), 1);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn concurrent_appends_and_reads_stay_bounded_and_ordered() {
        let ring = RingHistory::default();
        std::thread::scope(|s| {
            // writer w appends w*1000 + seq so each writer's order is checkable
            for w in 0..2_usize {
                let ring = &ring;
                s.spawn(move || {
                    for seq in 0..500_usize {
                        ring.append(snapshot((w * 1000 + seq) as f64));
                    }
                });
            }
            for _ in 0..3 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let all = ring.list_all();
                        assert!(all.len() <= 100);
                        for w in 0..2 {
                            let own: Vec<f64> =
                                all.iter().map(mse).filter(|v| (*v / 1000.0).floor() as usize == w).collect();
                            assert!(own.windows(2).all(|p| p[0] < p[1]), "writer {w} reordered");
                        }
                    }
                });
            }
        });
        assert_eq!(ring.len(), 100);
    }

    #[test]
    fn single_writer_timestamps_are_ordered() {
        let ring = RingHistory::default();
        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..300 {
                    ring.append(snapshot(f64::from(i)));
                }
            });
            s.spawn(|| {
                for _ in 0..200 {
                    let all = ring.list_all();
                    assert!(all.len() <= 100);
                    assert!(all.windows(2).all(|p| p[0].timestamp <= p[1].timestamp));
                }
            });
        });
    }

    #[test]
    fn hundred_and_one_ticks_evict_the_first() {
        let ring = RingHistory::default();
        let source = CountingSource::default();
        let updater = Updater::new(UpdaterConfig::builder().jitter(0.0).seed(1).build().unwrap());
        for _ in 0..101 {
            updater.tick_once(&source, &ring).unwrap();
        }
        let all = ring.list_all();
        assert_eq!(all.len(), 100);
        assert!((mse(&all[0]) - 1.0).abs() < f64::EPSILON);
        assert!((mse(&all[99]) - 100.0).abs() < f64::EPSILON);
    }
}
