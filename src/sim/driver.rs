use tracing::info;

use super::job::JobRecord;
use super::report::{Averages, CompletedJob, RunReport, Timeline};
use crate::config::SimConfig;
use crate::core::{
    AdmissionReport, KernelCtx, SchedCore, SchedCoreEvent, SystemCalls, TaskId,
};
use crate::error::SchedResult;
use crate::scheduler::{
    FcfsScheduler, Policy, PriorityScheduler, RoundRobinScheduler, Scheduler,
};

pub struct Sim {
    pub ctx: KernelCtx,
}

impl Sim {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            ctx: KernelCtx::new(config.memory_capacity),
        }
    }

    pub fn load(&mut self, jobs: impl IntoIterator<Item = JobRecord>) -> Vec<TaskId> {
        let tasks: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                self.ctx
                    .create_task(job.id, job.burst_time, job.priority, job.memory)
            })
            .collect();
        info!(loaded = tasks.len(), "jobs queued for admission");
        tasks
    }

    pub fn admit(&mut self, syscalls: &mut dyn SystemCalls) -> AdmissionReport {
        let report = self.ctx.admit_pending();
        for (task, _) in &report.rejected {
            syscalls.abort(self.ctx.task(*task));
        }
        info!(
            admitted = report.admitted.len(),
            rejected = report.rejected.len(),
            committed = self.ctx.ledger.committed(),
            capacity = self.ctx.ledger.capacity(),
            "admission finished"
        );
        report
    }

    pub fn run(
        &mut self,
        policy: Policy,
        syscalls: &mut dyn SystemCalls,
    ) -> SchedResult<RunReport> {
        match policy {
            Policy::Fcfs => {
                let sched = FcfsScheduler::new(&mut self.ctx);
                self.run_with(policy, sched, syscalls)
            }
            Policy::RoundRobin { quantum } => {
                let sched = RoundRobinScheduler::new(&mut self.ctx, quantum)?;
                self.run_with(policy, sched, syscalls)
            }
            Policy::Priority => {
                let sched = PriorityScheduler::new(&mut self.ctx);
                self.run_with(policy, sched, syscalls)
            }
        }
    }

    fn run_with<S: Scheduler>(
        &mut self,
        policy: Policy,
        scheduler: S,
        syscalls: &mut dyn SystemCalls,
    ) -> SchedResult<RunReport> {
        let summary = SchedCore::new(&mut self.ctx, scheduler, syscalls).run()?;

        let completed: Vec<_> = summary
            .completed
            .iter()
            .filter_map(|&task| CompletedJob::from_task(&self.ctx, task))
            .collect();
        let timeline = if S::PREEMPTIVE {
            Timeline::from_slices(&summary.slices)
        } else {
            Timeline::reconstruct(&completed)
        };
        let averages = Averages::compute(&self.completed_jobs())?;

        Ok(RunReport {
            policy,
            completed,
            timeline,
            averages,
        })
    }

    pub fn completed_jobs(&self) -> Vec<CompletedJob> {
        self.ctx
            .completed
            .iter()
            .filter_map(|&task| CompletedJob::from_task(&self.ctx, task))
            .collect()
    }

    pub fn ready_len(&self) -> usize {
        self.ctx.dsq_len(self.ctx.ready_dsq())
    }

    pub fn drain_events(&mut self) -> Vec<SchedCoreEvent> {
        self.ctx.drain_events()
    }
}
