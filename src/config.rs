use std::env;
use std::time::Duration;

use crate::core::MemUnits;
use crate::error::{SchedError, SchedResult};

pub const MAX_MEMORY: MemUnits = 2048;

pub const DEFAULT_PACING: Duration = Duration::from_millis(300);

pub const ENV_MEMORY_CAPACITY: &str = "SCHED_MEMORY_CAPACITY";
pub const ENV_PACING_MS: &str = "SCHED_PACING_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub memory_capacity: MemUnits,
    pub pacing: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            memory_capacity: MAX_MEMORY,
            pacing: DEFAULT_PACING,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> SchedResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> SchedResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MEMORY_CAPACITY) {
            config.memory_capacity = parse_u64(ENV_MEMORY_CAPACITY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PACING_MS) {
            config.pacing = Duration::from_millis(parse_u64(ENV_PACING_MS, &raw)?);
        }

        Ok(config)
    }

    pub fn with_memory_capacity(mut self, memory_capacity: MemUnits) -> Self {
        self.memory_capacity = memory_capacity;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }
}

fn parse_u64(key: &'static str, raw: &str) -> SchedResult<u64> {
    raw.trim().parse().map_err(|_| SchedError::InvalidConfig {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_budget() {
        let config = SimConfig::default();
        assert_eq!(config.memory_capacity, 2048);
        assert_eq!(config.pacing, Duration::from_millis(300));
    }

    #[test]
    fn overrides_are_applied() {
        let config = SimConfig::from_lookup(|key| match key {
            ENV_MEMORY_CAPACITY => Some("512".into()),
            ENV_PACING_MS => Some(" 0 ".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.memory_capacity, 512);
        assert_eq!(config.pacing, Duration::ZERO);
    }

    #[test]
    fn garbage_override_is_reported() {
        let err = SimConfig::from_lookup(|key| {
            (key == ENV_PACING_MS).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert_eq!(
            err,
            SchedError::InvalidConfig {
                key: ENV_PACING_MS,
                value: "soon".into()
            }
        );
    }
}
