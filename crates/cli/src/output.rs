// Report rendering (text / JSON)

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use tabled::{Table, Tabled};

use lockprobe_core::domain::{Category, Phase, ProbeReport, ProbeResult, Verdict};

const RULE_WIDTH: usize = 60;

/// Report format on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Tabled)]
struct PhaseRow {
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Errno")]
    errno: String,
}

impl PhaseRow {
    fn from_result(result: &ProbeResult) -> Self {
        Self {
            phase: result.phase.to_string(),
            result: result.category.to_string(),
            errno: result
                .errno
                .map(|e| e.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }

    fn skipped() -> Self {
        Self {
            phase: Phase::Conflict.to_string(),
            result: "SKIPPED".to_string(),
            errno: "-".to_string(),
        }
    }
}

fn status_glyph(category: Category) -> ColoredString {
    match category {
        Category::Supported => "✓".green(),
        Category::Partial => "~".yellow(),
        Category::Unsupported => "✗".red(),
        Category::Simulated => "⚠".yellow(),
        Category::Error => "✗".red(),
        Category::Unknown => "?".yellow(),
    }
}

fn verdict_headline(verdict: Verdict) -> ColoredString {
    let line = format!("{} {}", verdict, verdict.headline());
    match verdict {
        Verdict::RealLocking => line.green().bold(),
        Verdict::NoLocking | Verdict::FakeLocking => line.red().bold(),
        Verdict::Inconclusive => line.yellow().bold(),
    }
}

fn phase_line(result: &ProbeResult) -> String {
    format!(
        "  {} {}: {} - {}",
        status_glyph(result.category),
        result.phase.to_string().bold(),
        result.category,
        result.detail
    )
}

/// Human-readable report
pub fn render_text(report: &ProbeReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = Vec::new();

    out.push(format!("{}", "Lock Capability Probe".cyan().bold()));
    out.push(rule.clone());
    out.push(format!("  {} {}", "Target:".bold(), report.target.display()));
    out.push(format!("  {} {}", "Filesystem type:".bold(), report.filesystem_type));
    out.push(String::new());

    out.push(phase_line(&report.self_test));
    match &report.conflict {
        Some(conflict) => out.push(phase_line(conflict)),
        None => out.push(format!(
            "  ○ {}: skipped (whole-file locking unsupported)",
            Phase::Conflict.to_string().bold()
        )),
    }
    out.push(phase_line(&report.record_lock));
    out.push(String::new());

    let rows = vec![
        PhaseRow::from_result(&report.self_test),
        report
            .conflict
            .as_ref()
            .map(PhaseRow::from_result)
            .unwrap_or_else(PhaseRow::skipped),
        PhaseRow::from_result(&report.record_lock),
    ];
    out.push(Table::new(rows).to_string());
    out.push(String::new());

    out.push(rule);
    out.push(format!("{}", verdict_headline(report.verdict)));
    out.push(format!("  {}", report.verdict.explanation()));
    if report.verdict == Verdict::Inconclusive {
        out.push(format!(
            "  whole-file locking: {}, record locking: {}",
            report.whole_file().category,
            report.record_lock.category
        ));
    }

    out.join("\n")
}

/// Machine-readable report
pub fn render_json(report: &ProbeReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}
