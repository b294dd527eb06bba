use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::state::Task;

// Never influence computed times
pub trait SystemCalls {
    fn wait(&mut self) {}

    fn exit(&mut self, _task: &Task) {}

    fn abort(&mut self, _task: &Task) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSystemCalls;

impl SystemCalls for NoopSystemCalls {}

#[derive(Debug, Clone, Copy)]
pub struct PacedSystemCalls {
    delay: Duration,
}

impl PacedSystemCalls {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl SystemCalls for PacedSystemCalls {
    fn wait(&mut self) {
        debug!(delay_ms = self.delay.as_millis() as u64, "waiting for a process to finish");
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }

    fn exit(&mut self, task: &Task) {
        info!(pid = task.pid, "process has exited");
    }

    fn abort(&mut self, task: &Task) {
        warn!(pid = task.pid, "process has been aborted");
    }
}
