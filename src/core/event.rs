use crate::core::{MemUnits, Slice, TaskId, TaskState, Ticks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedCoreEvent {
    Admitted {
        task: TaskId,
        committed: MemUnits,
    },
    Rejected {
        task: TaskId,
        memory: MemUnits,
        committed: MemUnits,
    },
    TaskStateChange {
        task: TaskId,
        from: TaskState,
        to: TaskState,
    },
    Slice(Slice),
    // Waited past its priority's threshold before first dispatch
    Starved {
        task: TaskId,
        wait: Ticks,
        threshold: Ticks,
    },
}
