pub mod driver;
pub mod job;
pub mod report;

pub use driver::Sim;
pub use job::{JobRecord, LoadedJobs, bernoulli_jobs, load_jobs, read_jobs};
pub use report::{Averages, CompletedJob, RunReport, Timeline, TimelineEntry};
