// Probe Report & Verdict synthesis

use super::probe::{Category, ProbeResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Composite verdict over all phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    RealLocking,
    NoLocking,
    FakeLocking,
    Inconclusive,
}

impl Verdict {
    /// Combine the whole-file and record-lock results
    ///
    /// Precedence: any `Unsupported` wins, then a simulated conflict test,
    /// then real support on both axes. Everything else is inconclusive.
    pub fn synthesize(whole_file: &ProbeResult, record_lock: &ProbeResult) -> Self {
        if whole_file.category == Category::Unsupported
            || record_lock.category == Category::Unsupported
        {
            Verdict::NoLocking
        } else if whole_file.category == Category::Simulated {
            Verdict::FakeLocking
        } else if whole_file.category == Category::Supported && record_lock.category.is_supported()
        {
            Verdict::RealLocking
        } else {
            Verdict::Inconclusive
        }
    }

    /// Human-readable headline
    pub fn headline(&self) -> &'static str {
        match self {
            Verdict::RealLocking => "FILESYSTEM SUPPORTS REAL FILE LOCKING",
            Verdict::NoLocking => "FILESYSTEM DOES NOT SUPPORT FILE LOCKING",
            Verdict::FakeLocking => "LOCKS APPEAR TO SUCCEED BUT PROVIDE NO MUTUAL EXCLUSION",
            Verdict::Inconclusive => "MIXED OR INCONCLUSIVE RESULTS",
        }
    }

    /// Follow-up explanation printed under the headline
    pub fn explanation(&self) -> &'static str {
        match self {
            Verdict::RealLocking => {
                "Locks held by one process block other processes; checkpoint/restore tools can rely on them."
            }
            Verdict::NoLocking => {
                "Lock calls are rejected, so locks exist only locally and cannot be serialized or restored."
            }
            Verdict::FakeLocking => {
                "Lock calls report success but another process was not blocked; callers are unprotected."
            }
            Verdict::Inconclusive => "Manual investigation needed; see the raw phase results.",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::RealLocking => write!(f, "REAL_LOCKING"),
            Verdict::NoLocking => write!(f, "NO_LOCKING"),
            Verdict::FakeLocking => write!(f, "FAKE_LOCKING"),
            Verdict::Inconclusive => write!(f, "INCONCLUSIVE"),
        }
    }
}

/// Everything one probe run learned about a directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    pub target: PathBuf,
    pub filesystem_type: String,
    pub self_test: ProbeResult,
    /// None when the self-test short-circuited on an unsupported lock call
    pub conflict: Option<ProbeResult>,
    pub record_lock: ProbeResult,
    pub verdict: Verdict,
}

impl ProbeReport {
    pub fn new(
        target: PathBuf,
        filesystem_type: String,
        self_test: ProbeResult,
        conflict: Option<ProbeResult>,
        record_lock: ProbeResult,
    ) -> Self {
        let whole_file = conflict.as_ref().unwrap_or(&self_test);
        let verdict = Verdict::synthesize(whole_file, &record_lock);
        Self {
            target,
            filesystem_type,
            self_test,
            conflict,
            record_lock,
            verdict,
        }
    }

    /// Whole-file (flock) axis: the conflict test if it ran, else the self-test
    pub fn whole_file(&self) -> &ProbeResult {
        self.conflict.as_ref().unwrap_or(&self.self_test)
    }

    /// All phase results in execution order
    pub fn phases(&self) -> Vec<&ProbeResult> {
        let mut phases = vec![&self.self_test];
        if let Some(conflict) = &self.conflict {
            phases.push(conflict);
        }
        phases.push(&self.record_lock);
        phases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Phase;

    fn whole(category: Category) -> ProbeResult {
        ProbeResult::new(Phase::Conflict, category, "test")
    }

    fn record(category: Category) -> ProbeResult {
        ProbeResult::new(Phase::RecordLock, category, "test")
    }

    #[test]
    fn test_unsupported_takes_precedence() {
        assert_eq!(
            Verdict::synthesize(&whole(Category::Simulated), &record(Category::Unsupported)),
            Verdict::NoLocking
        );
        assert_eq!(
            Verdict::synthesize(&whole(Category::Unsupported), &record(Category::Supported)),
            Verdict::NoLocking
        );
    }

    #[test]
    fn test_simulated_is_fake_locking() {
        assert_eq!(
            Verdict::synthesize(&whole(Category::Simulated), &record(Category::Supported)),
            Verdict::FakeLocking
        );
    }

    #[test]
    fn test_real_locking_accepts_partial_record_lock() {
        assert_eq!(
            Verdict::synthesize(&whole(Category::Supported), &record(Category::Supported)),
            Verdict::RealLocking
        );
        assert_eq!(
            Verdict::synthesize(&whole(Category::Supported), &record(Category::Partial)),
            Verdict::RealLocking
        );
    }

    #[test]
    fn test_errors_are_inconclusive() {
        assert_eq!(
            Verdict::synthesize(&whole(Category::Supported), &record(Category::Error)),
            Verdict::Inconclusive
        );
        assert_eq!(
            Verdict::synthesize(&whole(Category::Unknown), &record(Category::Supported)),
            Verdict::Inconclusive
        );
    }

    #[test]
    fn test_report_falls_back_to_self_test_when_conflict_skipped() {
        let self_test = ProbeResult::new(Phase::SelfTest, Category::Unsupported, "ENOSYS");
        let report = ProbeReport::new(
            PathBuf::from("/tmp/x"),
            "fuse".to_string(),
            self_test,
            None,
            record(Category::Supported),
        );

        assert_eq!(report.whole_file().phase, Phase::SelfTest);
        assert_eq!(report.verdict, Verdict::NoLocking);
        assert_eq!(report.phases().len(), 2);
    }

    #[test]
    fn test_report_serializes_categories() {
        let report = ProbeReport::new(
            PathBuf::from("/data"),
            "ext4".to_string(),
            ProbeResult::new(Phase::SelfTest, Category::Supported, "ok"),
            Some(whole(Category::Supported)),
            record(Category::Supported),
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdict"], "REAL_LOCKING");
        assert_eq!(json["conflict"]["phase"], "conflict");
        assert_eq!(json["record_lock"]["category"], "SUPPORTED");
        assert!(json["self_test"].get("errno").is_none());
    }
}
