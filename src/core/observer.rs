use super::state::{KernelCtx, TaskState};

#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn observe(&mut self, ctx: &KernelCtx) {
        self.step += 1;

        debug_assert!(
            ctx.ledger.committed() <= ctx.ledger.capacity(),
            "Ledger committed {} past capacity {}",
            ctx.ledger.committed(),
            ctx.ledger.capacity()
        );

        let running = ctx
            .tasks
            .iter()
            .filter(|t| t.state == TaskState::Running)
            .count();
        debug_assert!(running <= 1, "{running} tasks marked Running at once");
        if let Some(task_id) = ctx.current {
            debug_assert_eq!(
                ctx.task(task_id).state,
                TaskState::Running,
                "current task {task_id} must be Running"
            );
        }

        for task in &ctx.tasks {
            debug_assert!(
                task.remaining_time <= task.burst_time,
                "Task {} has more work left than it started with",
                task.id
            );
            debug_assert_eq!(
                task.state == TaskState::Completed,
                task.turnaround_time.is_some(),
                "Task {} timing set without completion",
                task.id
            );
        }

        for (&task_id, &dsq_id) in &ctx.task_to_dsq {
            let task = ctx.task(task_id);
            debug_assert_ne!(
                task.state,
                TaskState::Completed,
                "Completed task {task_id} still present in DSQ {dsq_id:?}"
            );
            debug_assert_ne!(
                task.state,
                TaskState::Running,
                "Running task {task_id} must not appear in any DSQ"
            );
            if let Some(dsq) = ctx.dsqs.get(dsq_id) {
                debug_assert!(
                    dsq.contains(task_id),
                    "task_to_dsq claims task {task_id} in DSQ {dsq_id:?}, but queue does not contain it"
                );
            } else {
                debug_assert!(false, "task_to_dsq references unknown DSQ {dsq_id:?}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_observations() {
        let mut ctx = KernelCtx::new(64);
        ctx.create_task(1, 3, 1, 8);
        ctx.admit_pending();

        let mut observer = Observer::new();
        observer.observe(&ctx);
        observer.observe(&ctx);
        assert_eq!(observer.steps(), 2);
    }
}
