use std::time::{Duration, Instant};

use crate::error::Error;

/// What a task reports back after one unit of work.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskStatus {
    /// More work pending, poll again on the next round.
    Yield,
    /// Task finished, drop it from the schedule.
    Done,
    /// Nothing to do before the given delay elapses.
    Sleep(Duration),
}

/// A cooperative unit of work. `step` must return promptly; long-running
/// work is split across calls.
pub trait Task {
    fn step(&mut self) -> Result<TaskStatus, Error>;
}

struct Slot {
    task: Box<dyn Task>,
    wake_at: Option<Instant>,
}

/// Polls its tasks round-robin; sleeping tasks are skipped until their
/// deadline passes.
pub struct Scheduler {
    slots: Vec<Slot>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { slots: vec![] }
    }

    pub fn add_task(&mut self, task: Box<dyn Task>) {
        self.slots.push(Slot {
            task,
            wake_at: None,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// One round over all tasks. Returns how many actually ran.
    pub fn run_once(&mut self) -> Result<usize, Error> {
        let now = Instant::now();
        let mut ran = 0;
        let mut finished = vec![];

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(wake_at) = slot.wake_at {
                if wake_at > now {
                    continue;
                }
                slot.wake_at = None;
            }
            ran += 1;
            match slot.task.step()? {
                TaskStatus::Yield => (),
                TaskStatus::Done => finished.push(index),
                TaskStatus::Sleep(duration) => slot.wake_at = Some(now + duration),
            }
        }

        for index in finished.into_iter().rev() {
            self.slots.remove(index);
        }
        Ok(ran)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic sweep of the escrow buckets: purges expired entries so they
/// don't linger until the next organic drain touches them.
pub struct EscrowSweepTask {
    escrows: super::escrow::EscrowHandles,
    interval: Duration,
}

impl EscrowSweepTask {
    pub fn new(escrows: super::escrow::EscrowHandles, interval: Duration) -> Self {
        Self { escrows, interval }
    }
}

impl Task for EscrowSweepTask {
    fn step(&mut self) -> Result<TaskStatus, Error> {
        self.escrows.out_of_order.escrowed_out_of_order.purge_stale()?;
        self.escrows
            .partially_signed
            .escrowed_partially_signed
            .purge_stale()?;
        self.escrows.nt_receipts.escrowed_nt_receipts.purge_stale()?;
        self.escrows
            .trans_receipts
            .escrowed_trans_receipts
            .purge_stale()?;
        self.escrows.delegation.escrowed_delegated.purge_stale()?;
        Ok(TaskStatus::Sleep(self.interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown {
        left: u32,
    }

    impl Task for Countdown {
        fn step(&mut self) -> Result<TaskStatus, Error> {
            self.left -= 1;
            Ok(if self.left == 0 {
                TaskStatus::Done
            } else {
                TaskStatus::Yield
            })
        }
    }

    struct Sleeper;

    impl Task for Sleeper {
        fn step(&mut self) -> Result<TaskStatus, Error> {
            Ok(TaskStatus::Sleep(Duration::from_secs(3600)))
        }
    }

    #[test]
    fn test_round_robin() -> Result<(), Error> {
        let mut scheduler = Scheduler::new();
        scheduler.add_task(Box::new(Countdown { left: 2 }));
        scheduler.add_task(Box::new(Countdown { left: 1 }));

        assert_eq!(scheduler.run_once()?, 2);
        assert_eq!(scheduler.run_once()?, 1);
        assert!(scheduler.is_empty());
        Ok(())
    }

    #[test]
    fn test_sleeping_task_is_skipped() -> Result<(), Error> {
        let mut scheduler = Scheduler::new();
        scheduler.add_task(Box::new(Sleeper));

        assert_eq!(scheduler.run_once()?, 1);
        // still asleep on the next round
        assert_eq!(scheduler.run_once()?, 0);
        assert!(!scheduler.is_empty());
        Ok(())
    }
}
