pub mod driver;
pub mod event;
pub mod observer;
pub mod state;
pub mod syscall;

pub use driver::{RunSummary, SchedCore};
pub use event::SchedCoreEvent;
pub use state::{
    AdmissionReport, Dsq, DsqId, KernelCtx, MemUnits, MemoryLedger, Pid, Priority, Rank, Slice,
    Task, TaskId, TaskState, Ticks,
};
pub use syscall::{NoopSystemCalls, PacedSystemCalls, SystemCalls};
