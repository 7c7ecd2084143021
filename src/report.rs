//! Output formatting for analysis results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - Narrative: the plain-text reply used by the chat-completion adapter

use colored::*;
use serde::{Deserialize, Serialize};

use crate::analyze::{Finding, FindingKind};

/// Findings for one analyzed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub file: String,
    pub findings: Vec<Finding>,
}

impl FileReport {
    pub fn new(file: impl Into<String>, findings: Vec<Finding>) -> Self {
        Self {
            file: file.into(),
            findings,
        }
    }
}

/// Total number of findings across reports.
pub fn total_findings(reports: &[FileReport]) -> usize {
    reports.iter().map(|r| r.findings.len()).sum()
}

// =============================================================================
// Narrative Format
// =============================================================================

const NARRATIVE_HEADER: &str = "Python Code Analysis:\n\n";
const NARRATIVE_CLEAN: &str = "✅ The code appears to follow Python best practices!\n";
const GENERAL_RECOMMENDATIONS: &[&str] = &[
    "Use descriptive snake_case names",
    "Add docstrings to document functions and classes",
    "Keep functions small and focused",
    "Follow PEP 8 (the Python style guide)",
];

/// Render findings as the assistant reply of a chat completion.
///
/// One line per finding (❌ for errors, ⚠️ otherwise), followed by a fixed
/// list of general recommendations.
pub fn render_narrative(findings: &[Finding]) -> String {
    let mut text = String::from(NARRATIVE_HEADER);

    if findings.is_empty() {
        text.push_str(NARRATIVE_CLEAN);
    } else {
        for finding in findings {
            let prefix = if finding.is_error() { "❌" } else { "⚠️" };
            text.push_str(&format!("{} {}\n", prefix, finding.message()));
        }
    }

    text.push_str("\nGeneral Recommendations:\n");
    for recommendation in GENERAL_RECOMMENDATIONS {
        text.push_str(&format!("- {}\n", recommendation));
    }
    text
}

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub files_analyzed: usize,
    pub total_findings: usize,
    pub results: Vec<FileReport>,
}

impl JsonReport {
    pub fn new(path: &str, reports: &[FileReport]) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            path: path.to_string(),
            files_analyzed: reports.len(),
            total_findings: total_findings(reports),
            results: reports.to_vec(),
        }
    }
}

/// Write results in JSON format.
pub fn write_json(path: &str, reports: &[FileReport]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport::new(path, reports))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results as colored terminal output.
pub fn write_pretty(path: &str, config_path: Option<&str>, reports: &[FileReport]) {
    // Header
    println!();
    print!("  ");
    print!("{}", "pycodeadvisor".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Analyzing: ".dimmed());
    println!("{}", path);
    print!("  {}", "Config:    ".dimmed());
    println!("{}", config_path.unwrap_or("(defaults)"));
    println!();

    for report in reports {
        write_file_report(report);
    }

    write_summary(reports);
    println!();
}

fn write_file_report(report: &FileReport) {
    if report.findings.is_empty() {
        println!("  {} {}", "✓".green(), report.file);
        return;
    }

    println!("  {} {}", "●".yellow(), report.file.bold());
    for finding in &report.findings {
        println!(
            "      {:<15} {}",
            colored_kind(finding.kind()),
            finding.message()
        );
    }
    println!();
}

fn colored_kind(kind: FindingKind) -> ColoredString {
    let label = kind.as_str();
    match kind {
        FindingKind::Error => label.red().bold(),
        FindingKind::Complexity => label.yellow(),
        FindingKind::Documentation => label.blue(),
        FindingKind::Style => label.dimmed(),
    }
}

fn write_summary(reports: &[FileReport]) {
    let total = total_findings(reports);
    let errors: usize = reports
        .iter()
        .flat_map(|r| &r.findings)
        .filter(|f| f.is_error())
        .count();

    println!();
    if total == 0 {
        print!("  {}", "✓ CLEAN".green());
    } else if errors > 0 {
        print!("  {}", "✗ ERRORS".red());
    } else {
        print!("  {}", "● SUGGESTIONS".yellow());
    }
    println!(
        "  {} file(s), {} finding(s), {} error(s)",
        reports.len(),
        total,
        errors
    );
}
