//! The analyzer facade.
//!
//! `Analyzer::analyze` runs, in this order:
//! 1. the parser (a failure short-circuits into a single `error` finding),
//! 2. `DefinitionVisitor` over the tree (pre-order),
//! 3. the naming-convention scan over raw lines,
//! 4. the function-count complexity scan.
//!
//! The findings of steps 2–4 are concatenated in that fixed order. No error
//! ever escapes `analyze`: every failure is returned as a finding.

mod rules;
mod types;
mod visitor;

use std::time::Duration;

use tracing::debug;

use crate::syntax::{AnalysisFailure, PythonParser};

pub use rules::{check_code_complexity, check_naming_conventions, count_definitions, DefinitionCounts};
pub use types::{Finding, FindingKind};
pub use visitor::DefinitionVisitor;

/// Default maximum number of positional parameters per function.
pub const DEFAULT_MAX_PARAMETERS: usize = 5;

/// Default maximum number of function definitions per module.
pub const DEFAULT_MAX_FUNCTIONS: usize = 5;

/// Limits above which complexity findings are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub max_parameters: usize,
    pub max_functions: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_parameters: DEFAULT_MAX_PARAMETERS,
            max_functions: DEFAULT_MAX_FUNCTIONS,
        }
    }
}

/// Stateless entry point for analyzing Python source.
///
/// Safe to share across threads; every call builds its own tree.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    parser: PythonParser,
    thresholds: Thresholds,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_parse_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.parser = self.parser.with_timeout(timeout);
        self
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Analyze source text. Never fails.
    pub fn analyze(&self, code: &str) -> Vec<Finding> {
        self.try_analyze(code).unwrap_or_else(|failure| {
            debug!(error = %failure, "analysis failed");
            vec![Finding::from(failure)]
        })
    }

    /// Analyze raw bytes. Input that is not UTF-8 yields an `error` finding.
    pub fn analyze_bytes(&self, code: &[u8]) -> Vec<Finding> {
        match std::str::from_utf8(code) {
            Ok(text) => self.analyze(text),
            Err(e) => vec![Finding::from(AnalysisFailure::analysis(format!(
                "source is not valid UTF-8: {}",
                e
            )))],
        }
    }

    /// Analyze source text, returning the failure instead of converting it.
    pub fn try_analyze(&self, code: &str) -> Result<Vec<Finding>, AnalysisFailure> {
        let tree = self.parser.parse(code)?;

        let mut visitor = DefinitionVisitor::new(self.thresholds.max_parameters);
        tree.walk(&mut visitor)?;
        let mut findings = visitor.into_findings();
        let definition_findings = findings.len();

        let naming = check_naming_conventions(tree.source());
        let naming_findings = naming.len();
        findings.extend(naming);

        findings.extend(check_code_complexity(&tree, self.thresholds.max_functions)?);

        debug!(
            bytes = code.len(),
            definition_findings,
            naming_findings,
            total = findings.len(),
            "analyzed source"
        );
        Ok(findings)
    }
}

/// Analyze source text with default thresholds.
pub fn analyze(code: &str) -> Vec<Finding> {
    Analyzer::new().analyze(code)
}
