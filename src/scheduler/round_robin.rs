use super::{KernelCtx, Scheduler, TaskId};
use crate::core::{DsqId, Ticks};
use crate::error::{SchedError, SchedResult};

pub struct RoundRobinScheduler {
    fifo: DsqId,
    quantum: Ticks,
}

impl RoundRobinScheduler {
    // Checked before any DSQ is created
    pub fn new(ctx: &mut KernelCtx, quantum: Ticks) -> SchedResult<Self> {
        if quantum == 0 {
            return Err(SchedError::InvalidPolicySelection(
                "round-robin quantum must be positive".into(),
            ));
        }
        Ok(Self {
            fifo: ctx.create_dsq_fifo(),
            quantum,
        })
    }
}

impl Scheduler for RoundRobinScheduler {
    const PREEMPTIVE: bool = true;

    fn name(&self) -> &'static str {
        "Round-Robin"
    }

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId) {
        ctx.dsq_push_fifo(self.fifo, task);
    }

    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Option<TaskId> {
        ctx.dsq_pop(self.fifo)
    }

    fn slice(&self, ctx: &KernelCtx, task: TaskId) -> Ticks {
        ctx.task(task).remaining_time.min(self.quantum)
    }

    fn exit(&mut self, ctx: &mut KernelCtx) {
        ctx.destroy_dsq(self.fifo);
    }
}
