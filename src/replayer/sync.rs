//! Sync-marker queue fed by `8xx` and `E8x`

use std::collections::VecDeque;

/// Entries kept before the oldest marker is dropped.
pub const SYNC_QUEUE_CAPACITY: usize = 256;

/// Bounded FIFO of sync markers for an external consumer.
///
/// Storage is reserved up front so pushing from the mixer never allocates.
#[derive(Debug, Clone)]
pub struct SyncQueue {
    entries: VecDeque<u8>,
}

impl Default for SyncQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncQueue {
    /// Empty queue with [`SYNC_QUEUE_CAPACITY`] slots reserved.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(SYNC_QUEUE_CAPACITY),
        }
    }

    /// Append a marker, dropping the oldest one when full.
    pub fn push(&mut self, value: u8) {
        if self.entries.len() == SYNC_QUEUE_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(value);
    }

    /// Oldest pending marker.
    pub fn pop(&mut self) -> Option<u8> {
        self.entries.pop_front()
    }

    /// Remove and yield all pending markers, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = u8> + '_ {
        self.entries.drain(..)
    }

    /// Number of pending markers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no marker is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discard all pending markers.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = SyncQueue::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.drain().collect::<Vec<_>>(), vec![2, 3]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut q = SyncQueue::new();
        for i in 0..SYNC_QUEUE_CAPACITY + 3 {
            q.push((i % 16) as u8);
        }
        assert_eq!(q.len(), SYNC_QUEUE_CAPACITY);
        assert_eq!(q.pop(), Some(3));
    }
}
