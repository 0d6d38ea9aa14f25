//! Simulated clock with one-shot and repeating timers.

use std::{collections::BTreeMap, time::Duration};

use space_defense_core::{CellCoord, EnemyId, ItemId};

/// Work performed when a timer falls due. Actions carry identifiers only; an
/// identifier that no longer resolves turns the action into a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerAction {
    March,
    Spawn,
    Detonate(ItemId),
    Produce { item: ItemId, cell: CellCoord },
    SettleEnemy(EnemyId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TimerHandle(u64);

#[derive(Clone, Copy, Debug)]
struct Timer {
    period: Option<Duration>,
    action: TimerAction,
}

/// Timers fire ordered by due time, ties broken by creation order.
#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    now: Duration,
    next_sequence: u64,
    queue: BTreeMap<(Duration, u64), Timer>,
    due_at: BTreeMap<u64, Duration>,
}

impl Scheduler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn now(&self) -> Duration {
        self.now
    }

    pub(crate) fn schedule(&mut self, delay: Duration, action: TimerAction) -> TimerHandle {
        self.insert(delay, None, action)
    }

    /// The first firing happens one period from now. Zero periods are
    /// clamped to one millisecond so the queue always drains.
    pub(crate) fn schedule_repeating(
        &mut self,
        period: Duration,
        action: TimerAction,
    ) -> TimerHandle {
        let period = period.max(Duration::from_millis(1));
        self.insert(period, Some(period), action)
    }

    /// Returns `false` when the timer already fired or was cancelled.
    pub(crate) fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.due_at.remove(&handle.0) {
            Some(due) => self.queue.remove(&(due, handle.0)).is_some(),
            None => false,
        }
    }

    /// Pops the earliest timer due at or before `limit`, advancing the clock
    /// to its due time. Repeating timers are re-armed before returning.
    pub(crate) fn pop_due(&mut self, limit: Duration) -> Option<TimerAction> {
        let (&(due, sequence), _) = self.queue.iter().next()?;
        if due > limit {
            return None;
        }
        let timer = self.queue.remove(&(due, sequence))?;
        self.now = self.now.max(due);

        match timer.period {
            Some(period) => {
                let next = due.saturating_add(period);
                let _ = self.queue.insert((next, sequence), timer);
                let _ = self.due_at.insert(sequence, next);
            }
            None => {
                let _ = self.due_at.remove(&sequence);
            }
        }

        Some(timer.action)
    }

    /// Moves the clock to `target` once every due timer has been popped.
    pub(crate) fn settle(&mut self, target: Duration) {
        self.now = self.now.max(target);
    }

    /// Earliest due time of a queued timer running `action`.
    pub(crate) fn next_due(&self, action: TimerAction) -> Option<Duration> {
        self.queue
            .iter()
            .find(|(_, timer)| timer.action == action)
            .map(|(&(due, _), _)| due)
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.len()
    }

    fn insert(
        &mut self,
        delay: Duration,
        period: Option<Duration>,
        action: TimerAction,
    ) -> TimerHandle {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        let due = self.now.saturating_add(delay);
        let _ = self.queue.insert((due, sequence), Timer { period, action });
        let _ = self.due_at.insert(sequence, due);
        TimerHandle(sequence)
    }
}
