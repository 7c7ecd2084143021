//! Heuristic rules over raw source lines and whole-tree statistics.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::syntax::{AnalysisFailure, ClassDef, FunctionDef, SyntaxTree, Visitor};

use super::Finding;

/// An uppercase letter or number.
///
/// Letters and numbers are the `L` and `N` categories, so uppercase symbols
/// such as circled letters (`So`) are not matched.
static UPPERCASE_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}&&\p{Uppercase}]").unwrap());

/// Flag every line containing an uppercase alphanumeric character.
///
/// Deliberately crude: string literals, comments and class names are flagged
/// too. Lines are split on `'\n'` and numbered from 1.
pub fn check_naming_conventions(code: &str) -> Vec<Finding> {
    code.split('\n')
        .enumerate()
        .filter(|(_, line)| UPPERCASE_ALNUM.is_match(line))
        .map(|(idx, _)| {
            Finding::style(format!(
                "Line {}: Consider using snake_case for names (lowercase_words_separated_by_underscores)",
                idx + 1
            ))
        })
        .collect()
}

/// Number of function and class definitions anywhere in a tree.
///
/// Only `def` statements count as functions; `async def` does not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefinitionCounts {
    pub functions: usize,
    pub classes: usize,
}

impl Visitor for DefinitionCounts {
    fn visit_function_def(&mut self, _def: &FunctionDef) {
        self.functions += 1;
    }

    fn visit_class_def(&mut self, _def: &ClassDef) {
        self.classes += 1;
    }
}

/// Count definitions over a full traversal, nested ones included.
pub fn count_definitions(tree: &SyntaxTree) -> Result<DefinitionCounts, AnalysisFailure> {
    let mut counts = DefinitionCounts::default();
    tree.walk(&mut counts)?;
    Ok(counts)
}

/// Emit a single finding when the module defines more than `max_functions`
/// functions.
///
/// The class count is gathered alongside but has no threshold of its own.
pub fn check_code_complexity(
    tree: &SyntaxTree,
    max_functions: usize,
) -> Result<Vec<Finding>, AnalysisFailure> {
    let counts = count_definitions(tree)?;
    tracing::trace!(
        functions = counts.functions,
        classes = counts.classes,
        "counted definitions"
    );

    let mut findings = Vec::new();
    if counts.functions > max_functions {
        findings.push(Finding::complexity(
            "The code has too many functions. Consider breaking it down into smaller modules.",
        ));
    }
    Ok(findings)
}
