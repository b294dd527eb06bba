pub mod config;
pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use config::SimConfig;
pub use core::{NoopSystemCalls, PacedSystemCalls, SchedCoreEvent, SystemCalls};
pub use error::{SchedError, SchedResult};
pub use scheduler::{Policy, PolicyChoice, Scheduler};
pub use sim::{JobRecord, RunReport, Sim};
