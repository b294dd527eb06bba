use std::fmt;

use crate::core::{MemUnits, Pid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    MalformedRecord { line: usize, reason: String },
    AdmissionRejected {
        pid: Pid,
        memory: MemUnits,
        committed: MemUnits,
        capacity: MemUnits,
    },
    EmptyReadyQueue,
    EmptyResult,
    InvalidPolicySelection(String),
    JobSource { path: String, reason: String },
    InvalidConfig { key: &'static str, value: String },
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRecord { line, reason } => {
                write!(f, "malformed job record on line {line}: {reason}")
            }
            Self::AdmissionRejected {
                pid,
                memory,
                committed,
                capacity,
            } => write!(
                f,
                "job {pid} needs {memory} units but only {} of {capacity} are free",
                capacity.saturating_sub(*committed)
            ),
            Self::EmptyReadyQueue => write!(f, "no jobs available to schedule"),
            Self::EmptyResult => write!(f, "no completed jobs to report on"),
            Self::InvalidPolicySelection(choice) => {
                write!(f, "invalid scheduling policy selection: {choice:?}")
            }
            Self::JobSource { path, reason } => {
                write!(f, "cannot read job list {path}: {reason}")
            }
            Self::InvalidConfig { key, value } => {
                write!(f, "invalid value {value:?} for {key}")
            }
        }
    }
}

impl std::error::Error for SchedError {}

pub type SchedResult<T> = Result<T, SchedError>;
