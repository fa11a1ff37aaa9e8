//! Concurrency configuration for the construction pipelines.

use serde::{Deserialize, Serialize};

/// Desired level of parallelism for a build.
///
/// A value of 1 runs the pipelines single-threaded; builders still go through
/// the provider machinery so the code path is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concurrency {
    value: usize,
}

impl Concurrency {
    pub const fn new(value: usize) -> Self {
        Self { value }
    }

    pub fn single_threaded() -> Self {
        Self { value: 1 }
    }

    /// One worker per available CPU core.
    pub fn available_cores() -> Self {
        Self {
            value: num_cpus::get().max(1),
        }
    }

    pub fn value(self) -> usize {
        self.value
    }

    pub fn is_valid(self) -> bool {
        self.value > 0
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self::available_cores()
    }
}

impl std::fmt::Display for Concurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
