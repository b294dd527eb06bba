use super::{KernelCtx, Scheduler, TaskId};
use crate::core::DsqId;

pub struct FcfsScheduler {
    fifo: DsqId,
}

impl FcfsScheduler {
    pub fn new(ctx: &mut KernelCtx) -> Self {
        Self {
            fifo: ctx.create_dsq_fifo(),
        }
    }
}

impl Scheduler for FcfsScheduler {
    const PREEMPTIVE: bool = false;

    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId) {
        ctx.dsq_push_fifo(self.fifo, task);
    }

    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Option<TaskId> {
        ctx.dsq_pop(self.fifo)
    }

    fn exit(&mut self, ctx: &mut KernelCtx) {
        ctx.destroy_dsq(self.fifo);
    }
}
