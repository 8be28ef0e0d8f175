use std::time::Duration;

use crate::traits::clock::{TimerHandle, TimerTask};

pub(crate) struct Pending {
    pub due: Duration,
    seq: u64,
    pub handle: TimerHandle,
    pub task: TimerTask,
}

/// Pending one-shot tasks ordered by (due time, insertion order).
#[derive(Default)]
pub(crate) struct TimerQueue {
    pending: Vec<Pending>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn push(&mut self, due: Duration, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle::new();
        self.pending.push(Pending {
            due,
            seq: self.next_seq,
            handle: handle.clone(),
            task,
        });
        self.next_seq += 1;
        handle
    }

    /// Earliest due time among live tasks. Drops cancelled tasks as a side effect.
    pub fn next_due(&mut self) -> Option<Duration> {
        self.pending.retain(|p| !p.handle.is_cancelled());
        self.pending.iter().map(|p| p.due).min()
    }

    /// Remove and return the earliest live task due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<Pending> {
        self.pending.retain(|p| !p.handle.is_cancelled());
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= now)
            .min_by_key(|(_, p)| (p.due, p.seq))
            .map(|(i, _)| i)?;
        Some(self.pending.swap_remove(index))
    }

    pub fn len(&self) -> usize {
        self.pending.iter().filter(|p| !p.handle.is_cancelled()).count()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_then_insertion_order() {
        let mut q = TimerQueue::default();
        q.push(Duration::from_secs(2), Box::new(|| {}));
        q.push(Duration::from_secs(1), Box::new(|| {}));
        q.push(Duration::from_secs(1), Box::new(|| {}));

        let order: Vec<(Duration, u64)> = std::iter::from_fn(|| q.pop_due(Duration::from_secs(5)))
            .map(|p| (p.due, p.seq))
            .collect();
        assert_eq!(
            order,
            vec![
                (Duration::from_secs(1), 1),
                (Duration::from_secs(1), 2),
                (Duration::from_secs(2), 0),
            ]
        );
    }

    #[test]
    fn cancelled_tasks_are_skipped() {
        let mut q = TimerQueue::default();
        let h = q.push(Duration::from_secs(1), Box::new(|| {}));
        h.cancel();
        assert_eq!(q.len(), 0);
        assert!(q.next_due().is_none());
        assert!(q.pop_due(Duration::from_secs(10)).is_none());
    }

    #[test]
    fn not_due_yet() {
        let mut q = TimerQueue::default();
        q.push(Duration::from_secs(3), Box::new(|| {}));
        assert!(q.pop_due(Duration::from_secs(2)).is_none());
        assert_eq!(q.next_due(), Some(Duration::from_secs(3)));
    }
}
