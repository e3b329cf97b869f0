//! Latest-obstacles staging buffer.
//!
//! Single-slot store bridging the asynchronous obstacle stream and the
//! synchronous engine pull. Producers overwrite, the engine reads a
//! consistent copy. This is its own lock domain, independent of the
//! engine lock, and the lock is held only for the copy or the swap,
//! never across geometry work.

use parking_lot::Mutex;

use crate::pose::Point2D;

/// Thread-safe single-slot store of the most recent local obstacle
/// point set.
#[derive(Debug, Default)]
pub struct ObstacleBuffer {
    latest: Mutex<Vec<Point2D>>,
}

impl ObstacleBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored set with a new sample. Last writer wins; any
    /// unread prior value is discarded, no history is kept.
    pub fn set_latest(&self, points: Vec<Point2D>) {
        *self.latest.lock() = points;
    }

    /// Copy out the current set. Callers never observe a set
    /// mid-mutation and never hold a live reference into the buffer.
    ///
    /// No staleness timestamp is attached: if the producer stalls, this
    /// keeps returning the last sample it delivered, however old.
    pub fn snapshot(&self) -> Vec<Point2D> {
        self.latest.lock().clone()
    }

    /// Number of points currently stored.
    pub fn len(&self) -> usize {
        self.latest.lock().len()
    }

    /// Whether no sample has been stored yet (or the last one was empty).
    pub fn is_empty(&self) -> bool {
        self.latest.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_empty_snapshot_is_valid() {
        let buf = ObstacleBuffer::new();
        assert!(buf.snapshot().is_empty());
    }

    #[test]
    fn test_last_writer_wins() {
        let buf = ObstacleBuffer::new();
        buf.set_latest(vec![Point2D::new(1.0, 1.0)]);
        buf.set_latest(vec![Point2D::new(2.0, 2.0), Point2D::new(3.0, 3.0)]);
        let snap = buf.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0], Point2D::new(2.0, 2.0));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let buf = ObstacleBuffer::new();
        buf.set_latest(vec![Point2D::new(1.0, 1.0)]);
        let snap = buf.snapshot();
        buf.set_latest(vec![]);
        // Earlier snapshot is unaffected by the overwrite.
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn test_concurrent_writes_never_tear() {
        // Each writer stores a set whose points all carry the same value;
        // a torn snapshot would mix values from different writers.
        let buf = Arc::new(ObstacleBuffer::new());
        let mut writers = Vec::new();
        for id in 0..4 {
            let buf = Arc::clone(&buf);
            writers.push(thread::spawn(move || {
                for _ in 0..500 {
                    let v = id as f64;
                    buf.set_latest(vec![Point2D::new(v, v); 16]);
                }
            }));
        }

        let reader = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                for _ in 0..2000 {
                    let snap = buf.snapshot();
                    if let Some(first) = snap.first() {
                        assert!(snap.iter().all(|p| p == first), "torn snapshot: {:?}", snap);
                    }
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();
    }
}
