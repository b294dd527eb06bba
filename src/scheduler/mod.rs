pub mod fcfs;
pub mod priority;
pub mod round_robin;

use std::fmt;
use std::str::FromStr;

use crate::core::{
    Ticks,
    state::{KernelCtx, TaskId},
};
use crate::error::{SchedError, SchedResult};
pub use fcfs::FcfsScheduler;
pub use priority::{PriorityScheduler, starvation_threshold};
pub use round_robin::RoundRobinScheduler;

/// A scheduling discipline driven by [`crate::core::SchedCore`].
///
/// The core hands every ready task to `enqueue` in ready-queue order, then
/// repeatedly asks `dispatch` for the next task and runs it for `slice`
/// ticks. A task with work left after its slice is passed to `enqueue`
/// again.
pub trait Scheduler {
    const PREEMPTIVE: bool;

    fn name(&self) -> &'static str;

    fn enqueue(&mut self, ctx: &mut KernelCtx, task: TaskId);

    fn dispatch(&mut self, ctx: &mut KernelCtx) -> Option<TaskId>;

    // Clamped by the core to the remaining burst
    fn slice(&self, ctx: &KernelCtx, task: TaskId) -> Ticks {
        ctx.task(task).remaining_time
    }

    fn running(&mut self, _ctx: &mut KernelCtx, _task: TaskId) {}

    fn exit(&mut self, _ctx: &mut KernelCtx) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Fcfs,
    RoundRobin { quantum: Ticks },
    Priority,
}

impl Policy {
    pub fn round_robin(quantum: Ticks) -> SchedResult<Self> {
        if quantum == 0 {
            return Err(SchedError::InvalidPolicySelection(
                "round-robin quantum must be positive".into(),
            ));
        }
        Ok(Self::RoundRobin { quantum })
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fcfs => write!(f, "FCFS"),
            Self::RoundRobin { .. } => write!(f, "Round-Robin"),
            Self::Priority => write!(f, "Priority Scheduling"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyChoice {
    Fcfs,
    RoundRobin,
    Priority,
}

impl PolicyChoice {
    pub fn needs_quantum(self) -> bool {
        self == Self::RoundRobin
    }

    pub fn into_policy(self, quantum: Option<&str>) -> SchedResult<Policy> {
        match self {
            Self::Fcfs => Ok(Policy::Fcfs),
            Self::Priority => Ok(Policy::Priority),
            Self::RoundRobin => {
                let raw = quantum.ok_or_else(|| {
                    SchedError::InvalidPolicySelection("round-robin needs a quantum".into())
                })?;
                let quantum = raw.trim().parse::<Ticks>().map_err(|_| {
                    SchedError::InvalidPolicySelection(format!("quantum {raw:?}"))
                })?;
                Policy::round_robin(quantum)
            }
        }
    }
}

impl FromStr for PolicyChoice {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "fcfs" => Ok(Self::Fcfs),
            "2" | "rr" | "round-robin" => Ok(Self::RoundRobin),
            "3" | "priority" => Ok(Self::Priority),
            _ => Err(SchedError::InvalidPolicySelection(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_numbers_and_names_select_policies() {
        assert_eq!("1".parse::<PolicyChoice>(), Ok(PolicyChoice::Fcfs));
        assert_eq!(" RR ".parse::<PolicyChoice>(), Ok(PolicyChoice::RoundRobin));
        assert_eq!("priority".parse::<PolicyChoice>(), Ok(PolicyChoice::Priority));
        assert_eq!(
            "4".parse::<PolicyChoice>(),
            Err(SchedError::InvalidPolicySelection("4".into()))
        );
    }

    #[test]
    fn round_robin_requires_positive_quantum() {
        let rr = PolicyChoice::RoundRobin;
        assert!(rr.needs_quantum());
        assert_eq!(rr.into_policy(Some("7")), Ok(Policy::RoundRobin { quantum: 7 }));
        for bad in [None, Some("0"), Some("-3"), Some("fast")] {
            assert!(matches!(
                rr.into_policy(bad),
                Err(SchedError::InvalidPolicySelection(_))
            ));
        }
    }

    #[test]
    fn quantum_is_ignored_outside_round_robin() {
        assert_eq!(PolicyChoice::Fcfs.into_policy(Some("junk")), Ok(Policy::Fcfs));
        assert_eq!(PolicyChoice::Priority.into_policy(None), Ok(Policy::Priority));
    }
}
