use std::fmt;

use average::{Estimate, Mean};

use crate::core::{KernelCtx, Pid, Priority, Slice, TaskId, Ticks};
use crate::error::{SchedError, SchedResult};
use crate::scheduler::Policy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletedJob {
    pub pid: Pid,
    pub priority: Priority,
    pub burst_time: Ticks,
    pub wait_time: Ticks,
    pub turnaround_time: Ticks,
    pub starved: bool,
}

impl CompletedJob {
    pub fn from_task(ctx: &KernelCtx, task: TaskId) -> Option<Self> {
        let task = ctx.task(task);
        Some(Self {
            pid: task.pid,
            priority: task.priority,
            burst_time: task.burst_time,
            wait_time: task.wait_time?,
            turnaround_time: task.turnaround_time?,
            starved: task.starved,
        })
    }

    pub fn stop_time(&self) -> Ticks {
        self.turnaround_time
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub wait: f64,
    pub turnaround: f64,
}

impl Averages {
    pub fn compute(jobs: &[CompletedJob]) -> SchedResult<Self> {
        if jobs.is_empty() {
            return Err(SchedError::EmptyResult);
        }

        Ok(Self {
            wait: mean(jobs.iter().map(|j| j.wait_time as f64)),
            turnaround: mean(jobs.iter().map(|j| j.turnaround_time as f64)),
        })
    }

    pub fn wait_rounded(&self) -> f64 {
        round2(self.wait)
    }

    pub fn turnaround_rounded(&self) -> f64 {
        round2(self.turnaround)
    }
}

fn mean(iter: impl Iterator<Item = f64>) -> f64 {
    iter.collect::<Mean>().estimate()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEntry {
    pub pid: Pid,
    pub start: Ticks,
    pub end: Ticks,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn from_slices(slices: &[Slice]) -> Self {
        Self {
            entries: slices
                .iter()
                .map(|s| TimelineEntry {
                    pid: s.pid,
                    start: s.start,
                    end: s.end,
                })
                .collect(),
        }
    }

    // Only faithful for run-to-completion policies
    pub fn reconstruct(jobs: &[CompletedJob]) -> Self {
        let mut clock = 0;
        let entries = jobs
            .iter()
            .map(|job| {
                let entry = TimelineEntry {
                    pid: job.pid,
                    start: clock,
                    end: clock.saturating_add(job.burst_time),
                };
                clock = entry.end;
                entry
            })
            .collect();
        Self { entries }
    }

    pub fn for_pid(&self, pid: Pid) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter().filter(move |e| e.pid == pid)
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            write!(f, "| P{} ({} - {}) ", entry.pid, entry.start, entry.end)?;
        }
        write!(f, "|")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub policy: Policy,
    pub completed: Vec<CompletedJob>,
    pub timeline: Timeline,
    // Over every run so far, not just this one
    pub averages: Averages,
}

impl RunReport {
    pub fn starved(&self) -> impl Iterator<Item = &CompletedJob> {
        self.completed.iter().filter(|j| j.starved)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Execution Details:", self.policy)?;
        for job in &self.completed {
            write!(
                f,
                "Process {} | Stop Time: {} | Wait Time: {} | Turnaround Time: {}",
                job.pid,
                job.stop_time(),
                job.wait_time,
                job.turnaround_time
            )?;
            if job.starved {
                write!(f, " | starved")?;
            }
            writeln!(f)?;
        }
        writeln!(
            f,
            "Average Wait Time for {}: {:.2}",
            self.policy,
            self.averages.wait_rounded()
        )?;
        writeln!(
            f,
            "Average Turnaround Time for {}: {:.2}",
            self.policy,
            self.averages.turnaround_rounded()
        )?;
        write!(f, "Gantt Chart for {}: {}", self.policy, self.timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(pid: Pid, burst_time: Ticks, wait_time: Ticks) -> CompletedJob {
        CompletedJob {
            pid,
            priority: 1,
            burst_time,
            wait_time,
            turnaround_time: wait_time + burst_time,
            starved: false,
        }
    }

    #[test]
    fn averages_over_empty_list_are_refused() {
        assert_eq!(Averages::compute(&[]), Err(SchedError::EmptyResult));
    }

    #[test]
    fn averages_round_to_two_places() {
        let jobs = [job(1, 1, 0), job(2, 1, 1), job(3, 1, 1)];
        let averages = Averages::compute(&jobs).unwrap();
        assert!((averages.wait - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(averages.wait_rounded(), 0.67);
        assert_eq!(averages.turnaround_rounded(), 1.67);
    }

    #[test]
    fn rounding_is_not_truncation() {
        assert_eq!(round2(2.345_6), 2.35);
        assert_eq!(round2(2.5), 2.5);
        assert_eq!(round2(1.004), 1.0);
    }

    #[test]
    fn reconstruction_uses_its_own_clock() {
        let timeline = Timeline::reconstruct(&[job(2, 3, 40), job(1, 5, 43)]);
        assert_eq!(
            timeline.entries,
            vec![
                TimelineEntry { pid: 2, start: 0, end: 3 },
                TimelineEntry { pid: 1, start: 3, end: 8 },
            ]
        );
        assert_eq!(timeline.to_string(), "| P2 (0 - 3) | P1 (3 - 8) |");
    }

    #[test]
    fn reconstruction_clock_saturates_on_huge_burst() {
        let huge = CompletedJob {
            pid: 2,
            priority: 1,
            burst_time: u64::MAX,
            wait_time: 0,
            turnaround_time: u64::MAX,
            starved: false,
        };
        let timeline = Timeline::reconstruct(&[job(1, 5, 0), huge, job(3, 1, 0)]);
        assert_eq!(
            timeline.entries,
            vec![
                TimelineEntry { pid: 1, start: 0, end: 5 },
                TimelineEntry { pid: 2, start: 5, end: u64::MAX },
                TimelineEntry { pid: 3, start: u64::MAX, end: u64::MAX },
            ]
        );
    }

    #[test]
    fn empty_timeline_renders_closing_bar() {
        assert_eq!(Timeline::default().to_string(), "|");
    }
}
