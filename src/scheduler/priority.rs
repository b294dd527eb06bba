use tracing::warn;

use super::{KernelCtx, Scheduler, TaskId};
use crate::core::{DsqId, Priority, Rank, Ticks};

/// Wait, in ticks, a task of the given priority may accumulate before it is
/// reported as starved. Unlisted priorities get 100.
pub fn starvation_threshold(priority: Priority) -> Ticks {
    match priority {
        1 => 50,
        2 => 60,
        3 => 70,
        4 => 80,
        5 => 90,
        6 => 100,
        7 => 120,
        8 => 150,
        _ => 100,
    }
}

// Lower values run first. Starvation is only flagged.
pub struct PriorityScheduler {
    priq: DsqId,
    // Enqueue counter; breaks priority ties in arrival order
    seq: u64,
}

impl PriorityScheduler {
    pub fn new(ctx: &mut KernelCtx) -> Self {
        Self {
            priq: ctx.create_dsq_priq(),
            seq: 0,
        }
    }
}

impl Scheduler for PriorityScheduler {
    const PREEMPTIVE: bool = false;

    fn name(&self) -> &'static str {
        "Priority Scheduling"
    }

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId) {
        let rank = Rank {
            priority: ctx.task(task).priority,
            seq: self.seq,
        };
        self.seq += 1;
        ctx.dsq_push_priq(self.priq, task, rank);
    }

    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Option<TaskId> {
        ctx.dsq_pop(self.priq)
    }

    // Tasks run once, from time zero's queue, so the clock is their wait.
    fn running(&mut self, ctx: &mut KernelCtx, task: TaskId) {
        let wait = ctx.now;
        let (pid, priority) = {
            let task = ctx.task(task);
            (task.pid, task.priority)
        };
        let threshold = starvation_threshold(priority);

        if wait > threshold {
            warn!(pid, priority, wait, threshold, "process is starved");
            ctx.flag_starved(task, wait, threshold);
        }
    }

    fn exit(&mut self, ctx: &mut KernelCtx) {
        ctx.destroy_dsq(self.priq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_follow_fixed_table() {
        let table: Vec<_> = (1..=8).map(starvation_threshold).collect();
        assert_eq!(table, vec![50, 60, 70, 80, 90, 100, 120, 150]);
        assert_eq!(starvation_threshold(0), 100);
        assert_eq!(starvation_threshold(9), 100);
        assert_eq!(starvation_threshold(-4), 100);
    }

    #[test]
    fn dispatch_orders_by_priority_then_arrival() {
        let mut ctx = KernelCtx::new(2048);
        let a = ctx.create_task(10, 1, 3, 1);
        let b = ctx.create_task(11, 1, 1, 1);
        let c = ctx.create_task(12, 1, 3, 1);
        let d = ctx.create_task(13, 1, 2, 1);
        ctx.admit_pending();

        let mut sched = PriorityScheduler::new(&mut ctx);
        while let Some(task) = ctx.dsq_pop(ctx.ready_dsq()) {
            sched.enqueue(&mut ctx, task);
        }
        let order: Vec<_> = std::iter::from_fn(|| sched.dispatch(&mut ctx)).collect();

        assert_eq!(order, vec![b, d, a, c]);
    }

    #[test]
    fn wait_equal_to_threshold_is_not_starvation() {
        let mut ctx = KernelCtx::new(2048);
        let task = ctx.create_task(1, 1, 1, 1);
        let mut sched = PriorityScheduler::new(&mut ctx);

        ctx.now = 50;
        sched.running(&mut ctx, task);
        assert!(!ctx.task(task).starved);

        ctx.now = 51;
        sched.running(&mut ctx, task);
        assert!(ctx.task(task).starved);
    }
}
