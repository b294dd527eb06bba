use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::prelude::*;
use tracing::{debug, info, warn};

use crate::core::{MemUnits, Pid, Priority, Ticks};
use crate::error::{SchedError, SchedResult};

// id:burst:priority:memory, ';' also accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobRecord {
    pub id: Pid,
    pub burst_time: Ticks,
    pub priority: Priority,
    pub memory: MemUnits,
}

#[derive(Debug, Default)]
pub struct LoadedJobs {
    pub jobs: Vec<JobRecord>,
    pub skipped: Vec<SchedError>,
}

impl JobRecord {
    pub fn parse(line: usize, text: &str) -> SchedResult<Self> {
        let malformed = |reason: String| SchedError::MalformedRecord { line, reason };

        let fields: Vec<&str> = text.trim().split([':', ';']).map(str::trim).collect();
        if fields.len() != 4 {
            return Err(malformed(format!(
                "expected 4 fields, found {}",
                fields.len()
            )));
        }

        fn field<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, String> {
            raw.parse().map_err(|_| format!("{name} {raw:?} is not a valid integer"))
        }

        Ok(Self {
            id: field("id", fields[0]).map_err(malformed)?,
            burst_time: field("burst time", fields[1]).map_err(malformed)?,
            priority: field("priority", fields[2]).map_err(malformed)?,
            memory: field("memory", fields[3]).map_err(malformed)?,
        })
    }
}

// Lines are decoded lossily so a stray non-UTF-8 byte only costs its own
// line. A real read error ends loading with what was read so far.
pub fn read_jobs(reader: impl BufRead) -> LoadedJobs {
    let mut loaded = LoadedJobs::default();

    for (index, line) in reader.split(b'\n').enumerate() {
        let line_no = index + 1;
        let bytes = match line {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(line = line_no, "error reading job data: {err}");
                loaded.skipped.push(SchedError::MalformedRecord {
                    line: line_no,
                    reason: err.to_string(),
                });
                break;
            }
        };
        let text = String::from_utf8_lossy(&bytes);

        if text.trim().is_empty() {
            continue;
        }

        match JobRecord::parse(line_no, &text) {
            Ok(job) => {
                debug!(pid = job.id, "process loaded");
                loaded.jobs.push(job);
            }
            Err(err) => {
                warn!("{err}");
                loaded.skipped.push(err);
            }
        }
    }

    loaded
}

pub fn load_jobs(path: impl AsRef<Path>) -> SchedResult<LoadedJobs> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| SchedError::JobSource {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    let loaded = read_jobs(BufReader::new(file));
    info!(
        path = %path.display(),
        loaded = loaded.jobs.len(),
        skipped = loaded.skipped.len(),
        "job list read"
    );
    Ok(loaded)
}

pub fn bernoulli_jobs(count: usize, p_short: f64, seed: u64) -> Vec<JobRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut jobs = Vec::with_capacity(count);

    for id in 1..=count as u64 {
        let burst_time = if rng.random::<f64>() < p_short {
            rng.random_range(1..=5)
        } else {
            rng.random_range(6..=20)
        };

        jobs.push(JobRecord {
            id,
            burst_time,
            priority: rng.random_range(1..=8),
            memory: rng.random_range(32..=512),
        });
    }

    jobs
}
