use keyed_priority_queue::KeyedPriorityQueue;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use super::event::SchedCoreEvent;
use crate::error::{SchedError, SchedResult};

// Index into Task Vec
pub type TaskId = usize;
// Identity carried by the job list
pub type Pid = u64;
pub type Ticks = u64;
pub type Priority = i32;
pub type MemUnits = u64;
new_key_type! {
    pub struct DsqId;
}

/// Ordering key for priority DSQs: priority value first, then enqueue order.
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub struct Rank {
    pub priority: Priority,
    pub seq: u64,
}

// KeyedPriorityQueue is a max-heap, so Rank's Ord is flipped: the lowest
// priority value pops first and equal priorities pop in enqueue order.
impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Loaded,
    Waiting,
    Running,
    Completed,
    Rejected,
}

/// Process control block.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub pid: Pid,
    pub state: TaskState,
    pub priority: Priority,
    pub memory: MemUnits,
    // Set once at creation
    pub burst_time: Ticks,
    pub remaining_time: Ticks,
    // Only set once the task has completed
    pub wait_time: Option<Ticks>,
    pub turnaround_time: Option<Ticks>,
    pub admitted: bool,
    pub starved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub task: TaskId,
    pub pid: Pid,
    pub start: Ticks,
    pub end: Ticks,
}

impl Slice {
    pub fn duration(&self) -> Ticks {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLedger {
    committed: MemUnits,
    capacity: MemUnits,
}

impl MemoryLedger {
    pub fn new(capacity: MemUnits) -> Self {
        Self {
            committed: 0,
            capacity,
        }
    }

    pub fn committed(&self) -> MemUnits {
        self.committed
    }

    pub fn capacity(&self) -> MemUnits {
        self.capacity
    }

    pub fn try_commit(&mut self, pid: Pid, memory: MemUnits) -> SchedResult<()> {
        match self.committed.checked_add(memory) {
            Some(total) if total <= self.capacity => {
                self.committed = total;
                Ok(())
            }
            _ => Err(SchedError::AdmissionRejected {
                pid,
                memory,
                committed: self.committed,
                capacity: self.capacity,
            }),
        }
    }
}

#[derive(Debug, Default)]
pub struct AdmissionReport {
    pub admitted: Vec<TaskId>,
    pub rejected: Vec<(TaskId, SchedError)>,
}

#[derive(Debug)]
pub enum Dsq {
    Fifo {
        tasks: VecDeque<TaskId>,
    },
    Priq {
        tasks: KeyedPriorityQueue<TaskId, Rank>,
    },
}

impl Dsq {
    pub fn new_fifo() -> Self {
        Self::Fifo {
            tasks: VecDeque::new(),
        }
    }

    pub fn new_priq() -> Self {
        Self::Priq {
            tasks: KeyedPriorityQueue::new(),
        }
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        match self {
            Self::Fifo { tasks } => tasks.contains(&task_id),
            Self::Priq { tasks } => tasks.iter().any(|t| *t.0 == task_id),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fifo { tasks } => tasks.len(),
            Self::Priq { tasks } => tasks.len(),
        }
    }
}

#[derive(Debug)]
pub struct KernelCtx {
    pub now: Ticks,
    pub current: Option<TaskId>,
    pub tasks: Vec<Task>,
    pub dsqs: SlotMap<DsqId, Dsq>,
    pub task_to_dsq: FxHashMap<TaskId, DsqId>,
    pub job_dsq_id: DsqId,
    pub ready_dsq_id: DsqId,
    pub completed: Vec<TaskId>,
    pub slices: Vec<Slice>,
    pub ledger: MemoryLedger,
    events: Vec<SchedCoreEvent>,

    // Increment upon task creation
    next_task_id: TaskId,
}

impl KernelCtx {
    pub fn new(memory_capacity: MemUnits) -> Self {
        let mut dsqs = SlotMap::with_capacity_and_key(3);
        let job_dsq_id = dsqs.insert(Dsq::new_fifo());
        let ready_dsq_id = dsqs.insert(Dsq::new_fifo());

        Self {
            now: 0,
            current: None,
            tasks: Vec::new(),
            dsqs,
            task_to_dsq: FxHashMap::default(),
            job_dsq_id,
            ready_dsq_id,
            completed: Vec::new(),
            slices: Vec::new(),
            ledger: MemoryLedger::new(memory_capacity),
            events: Vec::new(),
            next_task_id: 0,
        }
    }

    pub fn create_task(
        &mut self,
        pid: Pid,
        burst_time: Ticks,
        priority: Priority,
        memory: MemUnits,
    ) -> TaskId {
        let id = self.next_task_id;
        self.next_task_id += 1;

        let task = Task {
            id,
            pid,
            state: TaskState::Loaded,
            priority,
            memory,
            burst_time,
            remaining_time: burst_time,
            wait_time: None,
            turnaround_time: None,
            admitted: false,
            starved: false,
        };

        debug_assert_eq!(self.tasks.len(), id, "TaskId must match Vec index");
        self.tasks.push(task);
        self.dsq_push_fifo(self.job_dsq_id, id);
        debug!(task = id, pid, burst_time, priority, memory, "process loaded");

        id
    }

    /// Drain the job queue in load order, moving every task that fits the
    /// memory budget to the ready queue. Rejections are final.
    pub fn admit_pending(&mut self) -> AdmissionReport {
        let mut report = AdmissionReport::default();

        while let Some(task_id) = self.dsq_pop(self.job_dsq_id) {
            let (pid, memory) = {
                let task = self.task(task_id);
                (task.pid, task.memory)
            };

            match self.ledger.try_commit(pid, memory) {
                Ok(()) => {
                    self.task_mut(task_id).admitted = true;
                    self.set_state(task_id, TaskState::Waiting);
                    self.dsq_push_fifo(self.ready_dsq_id, task_id);
                    let committed = self.ledger.committed();
                    self.events.push(SchedCoreEvent::Admitted {
                        task: task_id,
                        committed,
                    });
                    info!(pid, memory, committed, "job added to ready queue");
                    report.admitted.push(task_id);
                }
                Err(err) => {
                    self.set_state(task_id, TaskState::Rejected);
                    self.events.push(SchedCoreEvent::Rejected {
                        task: task_id,
                        memory,
                        committed: self.ledger.committed(),
                    });
                    warn!(pid, memory, "{err}");
                    report.rejected.push((task_id, err));
                }
            }
        }

        report
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn create_dsq_fifo(&mut self) -> DsqId {
        self.dsqs.insert(Dsq::new_fifo())
    }

    pub fn create_dsq_priq(&mut self) -> DsqId {
        self.dsqs.insert(Dsq::new_priq())
    }

    fn dsq_push(&mut self, dsq_id: DsqId, task_id: TaskId, rank: Option<Rank>) {
        assert!(
            !self.task_to_dsq.contains_key(&task_id),
            "Task {task_id} already present in some DSQ"
        );

        let state = self.task(task_id).state;
        debug_assert!(
            state != TaskState::Completed && state != TaskState::Running,
            "Task {task_id} must not be Running or Completed when enqueued"
        );

        let dsq = self.dsqs.get_mut(dsq_id).expect("Unknown DSQ");
        match dsq {
            Dsq::Fifo { tasks } => tasks.push_back(task_id),
            Dsq::Priq { tasks } => {
                tasks.push(
                    task_id,
                    rank.expect("Attempted to push to a priority DSQ with no rank"),
                );
            }
        };

        self.task_to_dsq.insert(task_id, dsq_id);
    }

    pub fn dsq_push_fifo(&mut self, dsq_id: DsqId, task_id: TaskId) {
        self.dsq_push(dsq_id, task_id, None);
    }

    pub fn dsq_push_priq(&mut self, dsq_id: DsqId, task_id: TaskId, rank: Rank) {
        self.dsq_push(dsq_id, task_id, Some(rank));
    }

    pub fn dsq_pop(&mut self, dsq_id: DsqId) -> Option<TaskId> {
        let dsq = self.dsqs.get_mut(dsq_id)?;
        let task = match dsq {
            Dsq::Fifo { tasks } => tasks.pop_front(),
            Dsq::Priq { tasks } => tasks.pop().map(|t| t.0),
        }?;

        let removed = self.task_to_dsq.remove(&task);
        debug_assert!(removed.is_some(), "Task {task} missing DSQ membership");

        Some(task)
    }

    pub fn dsq_len(&self, dsq_id: DsqId) -> usize {
        self.dsqs.get(dsq_id).map_or(0, Dsq::len)
    }

    /// Tasks in a FIFO DSQ, front first. Priority DSQs have no stable order
    /// to report and yield nothing.
    pub fn dsq_tasks(&self, dsq_id: DsqId) -> Vec<TaskId> {
        match self.dsqs.get(dsq_id) {
            Some(Dsq::Fifo { tasks }) => tasks.iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    pub fn destroy_dsq(&mut self, dsq_id: DsqId) {
        debug_assert!(
            self.dsq_len(dsq_id) == 0,
            "Destroying DSQ {dsq_id:?} that still holds tasks"
        );
        self.dsqs.remove(dsq_id);
    }

    pub fn task_in_any_dsq(&self, task_id: TaskId) -> bool {
        self.task_to_dsq.contains_key(&task_id)
    }

    pub fn task(&self, task_id: TaskId) -> &Task {
        &self.tasks[task_id]
    }

    pub fn task_mut(&mut self, task_id: TaskId) -> &mut Task {
        &mut self.tasks[task_id]
    }

    pub fn job_dsq(&self) -> DsqId {
        self.job_dsq_id
    }

    pub fn ready_dsq(&self) -> DsqId {
        self.ready_dsq_id
    }

    pub fn cpu_is_idle(&self) -> bool {
        self.current.is_none()
    }

    fn set_state(&mut self, task_id: TaskId, to: TaskState) -> TaskState {
        let task = self.task_mut(task_id);
        let from = task.state;
        task.state = to;
        self.events.push(SchedCoreEvent::TaskStateChange {
            task: task_id,
            from,
            to,
        });
        from
    }

    // Return previous state (Waiting for every admitted task)
    pub fn set_running(&mut self, task_id: TaskId) -> TaskState {
        debug_assert!(
            !self.task_to_dsq.contains_key(&task_id),
            "Running task {task_id} must not be enqueued"
        );
        debug_assert!(self.cpu_is_idle(), "CPU already running a task");

        self.current = Some(task_id);
        self.set_state(task_id, TaskState::Running)
    }

    pub fn clear_cpu(&mut self) {
        self.current = None;
    }

    pub fn run_current(&mut self, service: Ticks) -> Slice {
        let task_id = self.current.expect("No task on the CPU");
        let start = self.now;
        self.advance_time(service);

        let task = self.task_mut(task_id);
        debug_assert!(
            service <= task.remaining_time,
            "Slice of {service} overruns task {task_id}"
        );
        task.remaining_time = task.remaining_time.saturating_sub(service);

        let slice = Slice {
            task: task_id,
            pid: task.pid,
            start,
            end: self.now,
        };
        self.slices.push(slice);
        self.events.push(SchedCoreEvent::Slice(slice));
        slice
    }

    pub fn mark_waiting(&mut self, task_id: TaskId) {
        debug_assert!(
            self.task(task_id).state != TaskState::Completed,
            "Completed task {task_id} cannot wait again"
        );
        self.set_state(task_id, TaskState::Waiting);
    }

    /// Finish a task at the current clock. Every task of a run is ready at
    /// time zero, so turnaround is the completion time and wait is whatever
    /// part of it was not spent on the CPU.
    pub fn mark_completed(&mut self, task_id: TaskId) {
        debug_assert!(
            !self.task_in_any_dsq(task_id),
            "Completing task {task_id} that is still enqueued"
        );
        debug_assert!(
            self.task(task_id).state == TaskState::Running,
            "Task {task_id} must have been running before marked complete"
        );

        let now = self.now;
        let task = self.task_mut(task_id);
        task.wait_time = Some(
            now.saturating_sub(task.burst_time)
                .saturating_sub(task.remaining_time),
        );
        task.turnaround_time = Some(now);
        self.set_state(task_id, TaskState::Completed);
        self.completed.push(task_id);
    }

    pub fn flag_starved(&mut self, task_id: TaskId, wait: Ticks, threshold: Ticks) {
        self.task_mut(task_id).starved = true;
        self.events.push(SchedCoreEvent::Starved {
            task: task_id,
            wait,
            threshold,
        });
    }

    pub fn events(&self) -> &[SchedCoreEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SchedCoreEvent> {
        std::mem::take(&mut self.events)
    }
}
