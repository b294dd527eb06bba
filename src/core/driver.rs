use tracing::{debug, info, warn};

use super::{
    observer::Observer,
    state::{KernelCtx, Slice, TaskId, Ticks},
    syscall::SystemCalls,
};
use crate::error::{SchedError, SchedResult};
use crate::scheduler::Scheduler;

pub struct SchedCore<'a, S: Scheduler> {
    pub ctx: &'a mut KernelCtx,
    pub scheduler: S,
    syscalls: &'a mut dyn SystemCalls,
    observer: Observer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: Vec<TaskId>,
    pub slices: Vec<Slice>,
    pub makespan: Ticks,
}

impl<'a, S: Scheduler> SchedCore<'a, S> {
    pub fn new(ctx: &'a mut KernelCtx, scheduler: S, syscalls: &'a mut dyn SystemCalls) -> Self {
        Self {
            ctx,
            scheduler,
            syscalls,
            observer: Observer::new(),
        }
    }

    pub fn run(&mut self) -> SchedResult<RunSummary> {
        let policy = self.scheduler.name();
        let ready = self.ctx.ready_dsq();
        let jobs = self.ctx.dsq_len(ready);

        if jobs == 0 {
            self.scheduler.exit(self.ctx);
            warn!(policy, "no jobs available to schedule");
            return Err(SchedError::EmptyReadyQueue);
        }

        info!(policy, jobs, "starting run");
        self.ctx.now = 0;
        let first_completed = self.ctx.completed.len();
        let first_slice = self.ctx.slices.len();

        // Hand over in ready-queue order
        while let Some(task) = self.ctx.dsq_pop(ready) {
            self.scheduler.enqueue(self.ctx, task);
        }

        while let Some(task) = self.scheduler.dispatch(self.ctx) {
            self.run_slice(task);
        }

        self.scheduler.exit(self.ctx);
        let summary = RunSummary {
            completed: self.ctx.completed[first_completed..].to_vec(),
            slices: self.ctx.slices[first_slice..].to_vec(),
            makespan: self.ctx.now,
        };
        info!(
            policy,
            completed = summary.completed.len(),
            makespan = summary.makespan,
            "run finished"
        );
        Ok(summary)
    }

    fn run_slice(&mut self, task_id: TaskId) {
        self.syscalls.wait();

        self.ctx.set_running(task_id);
        self.scheduler.running(self.ctx, task_id);

        let remaining = self.ctx.task(task_id).remaining_time;
        let service = self.scheduler.slice(self.ctx, task_id).min(remaining);
        let slice = self.ctx.run_current(service);
        self.ctx.clear_cpu();

        let task = self.ctx.task(task_id);
        debug!(
            pid = task.pid,
            start = slice.start,
            end = slice.end,
            remaining = task.remaining_time,
            "slice finished"
        );

        if task.remaining_time == 0 {
            self.ctx.mark_completed(task_id);
            let task = self.ctx.task(task_id);
            info!(
                pid = task.pid,
                stop = self.ctx.now,
                wait = task.wait_time,
                turnaround = task.turnaround_time,
                "process completed"
            );
            self.syscalls.exit(task);
        } else {
            self.ctx.mark_waiting(task_id);
            self.scheduler.enqueue(self.ctx, task_id);
        }

        self.observer.observe(self.ctx);
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NoopSystemCalls, TaskState};
    use crate::scheduler::{FcfsScheduler, PriorityScheduler, RoundRobinScheduler};

    fn ctx_with(jobs: &[(u64, u64, i32, u64)]) -> KernelCtx {
        let mut ctx = KernelCtx::new(2048);
        for &(pid, burst, priority, memory) in jobs {
            ctx.create_task(pid, burst, priority, memory);
        }
        ctx.admit_pending();
        ctx
    }

    #[derive(Default)]
    struct CountingCalls {
        waits: usize,
        exits: Vec<u64>,
    }

    impl SystemCalls for CountingCalls {
        fn wait(&mut self) {
            self.waits += 1;
        }

        fn exit(&mut self, task: &crate::core::Task) {
            self.exits.push(task.pid);
        }
    }

    #[test]
    fn empty_ready_queue_is_signalled() {
        let mut ctx = KernelCtx::new(2048);
        let mut calls = NoopSystemCalls;
        let sched = FcfsScheduler::new(&mut ctx);
        let result = SchedCore::new(&mut ctx, sched, &mut calls).run();

        assert_eq!(result, Err(SchedError::EmptyReadyQueue));
        assert!(ctx.completed.is_empty());
        // Policy queue is torn down again
        assert_eq!(ctx.dsqs.len(), 2);
    }

    #[test]
    fn fcfs_runs_each_job_once_in_order() {
        let mut ctx = ctx_with(&[(1, 5, 2, 100), (2, 3, 1, 100), (3, 4, 1, 100)]);
        let mut calls = CountingCalls::default();
        let sched = FcfsScheduler::new(&mut ctx);
        let mut core = SchedCore::new(&mut ctx, sched, &mut calls);
        let summary = core.run().unwrap();
        assert_eq!(core.observer().steps(), 3);

        assert_eq!(summary.completed, vec![0, 1, 2]);
        assert_eq!(summary.makespan, 12);
        assert_eq!(calls.waits, 3);
        assert_eq!(calls.exits, vec![1, 2, 3]);
        let waits: Vec<_> = summary
            .completed
            .iter()
            .map(|&t| ctx.task(t).wait_time.unwrap())
            .collect();
        assert_eq!(waits, vec![0, 5, 8]);
    }

    #[test]
    fn round_robin_requeues_until_done() {
        let mut ctx = ctx_with(&[(1, 5, 2, 100), (2, 3, 1, 100)]);
        let mut calls = NoopSystemCalls;
        let sched = RoundRobinScheduler::new(&mut ctx, 2).unwrap();
        let summary = SchedCore::new(&mut ctx, sched, &mut calls).run().unwrap();

        let spans: Vec<_> = summary
            .slices
            .iter()
            .map(|s| (s.pid, s.start, s.end))
            .collect();
        assert_eq!(
            spans,
            vec![(1, 0, 2), (2, 2, 4), (1, 4, 6), (2, 6, 7), (1, 7, 8)]
        );
        assert_eq!(summary.completed, vec![1, 0]);
        assert!(ctx.tasks.iter().all(|t| t.state == TaskState::Completed));
    }

    #[test]
    fn priority_flags_long_waits() {
        // Priority 1 tolerates 50 ticks of waiting, priority 2 tolerates 60
        let mut ctx = ctx_with(&[(1, 70, 1, 10), (2, 10, 2, 10), (3, 5, 1, 10)]);
        let mut calls = NoopSystemCalls;
        let sched = PriorityScheduler::new(&mut ctx);
        let summary = SchedCore::new(&mut ctx, sched, &mut calls).run().unwrap();

        assert_eq!(summary.completed, vec![0, 2, 1]);
        assert!(!ctx.task(0).starved);
        assert!(ctx.task(2).starved);
        assert!(ctx.task(1).starved);
        assert_eq!(ctx.task(1).wait_time, Some(75));
    }

    #[test]
    fn second_run_finds_nothing_to_do() {
        let mut ctx = ctx_with(&[(1, 2, 1, 1)]);
        let mut calls = NoopSystemCalls;
        let sched = FcfsScheduler::new(&mut ctx);
        SchedCore::new(&mut ctx, sched, &mut calls).run().unwrap();

        let sched = PriorityScheduler::new(&mut ctx);
        let again = SchedCore::new(&mut ctx, sched, &mut calls).run();
        assert_eq!(again, Err(SchedError::EmptyReadyQueue));
        assert_eq!(ctx.completed.len(), 1);
    }
}
