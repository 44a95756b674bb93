// Domain Layer - Probe results and verdicts

pub mod failure;
pub mod probe;
pub mod report;

// Re-exports
pub use failure::ProbeFailure;
pub use probe::{Category, Phase, ProbeResult};
pub use report::{ProbeReport, Verdict};
