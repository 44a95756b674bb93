// Probe Domain Model

use serde::{Deserialize, Serialize};

/// Which capability test produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Phase A: lock/unlock a whole-file lock in-process
    SelfTest,
    /// Phase B: cross-process conflict detection
    Conflict,
    /// Phase C: byte-range record lock set + query
    RecordLock,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::SelfTest => write!(f, "flock self-test"),
            Phase::Conflict => write!(f, "flock conflict"),
            Phase::RecordLock => write!(f, "fcntl record lock"),
        }
    }
}

/// Outcome category of a single phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Supported,
    /// Record lock could be set but its state could not be queried
    Partial,
    Unsupported,
    /// Lock calls succeed without providing mutual exclusion
    Simulated,
    Error,
    Unknown,
}

impl Category {
    /// Whether this category counts as working locking for the verdict
    pub fn is_supported(&self) -> bool {
        matches!(self, Category::Supported | Category::Partial)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Supported => write!(f, "SUPPORTED"),
            Category::Partial => write!(f, "PARTIAL"),
            Category::Unsupported => write!(f, "UNSUPPORTED"),
            Category::Simulated => write!(f, "SIMULATED"),
            Category::Error => write!(f, "ERROR"),
            Category::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Outcome of one capability test
///
/// Built once per phase and reported as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub phase: Phase,
    pub category: Category,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errno: Option<i32>,
}

impl ProbeResult {
    pub fn new(phase: Phase, category: Category, detail: impl Into<String>) -> Self {
        Self {
            phase,
            category,
            detail: detail.into(),
            errno: None,
        }
    }

    pub fn with_errno(mut self, errno: Option<i32>) -> Self {
        self.errno = errno;
        self
    }
}
