//! Python syntax trees for the analyzer.
//!
//! This module wraps tree-sitter behind a small, closed node model:
//! - `PythonParser`: turns source text into a `SyntaxTree` or an `AnalysisFailure`
//! - `SyntaxTree`: owns the parsed tree and walks it in pre-order
//! - `SyntaxNode`: the node kinds the rules care about, everything else is `Other`
//! - `Visitor`: callbacks invoked by `SyntaxTree::walk` for each definition
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌────────────┐     ┌──────────┐
//! │ Source text │────▶│ PythonParser │────▶│ SyntaxTree │────▶│ Visitors │
//! └─────────────┘     └──────────────┘     └────────────┘     └──────────┘
//!                            │
//!                            ▼
//!                     AnalysisFailure
//!                  (SyntaxError | AnalysisError)
//! ```

mod literal;
mod python;
mod tree;

use std::fmt;

pub use python::PythonParser;
pub use tree::SyntaxTree;

/// Failure to turn source text into a usable syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisFailure {
    /// The source is not valid Python.
    #[error("{}", format_syntax_error(.message, .line, .column))]
    SyntaxError {
        message: String,
        /// Line of the first offending token (1-indexed).
        line: Option<usize>,
        /// Column of the first offending token (1-indexed).
        column: Option<usize>,
    },
    /// Anything else: encoding problems, parser failures, malformed nodes.
    #[error("{message}")]
    AnalysisError { message: String },
}

impl AnalysisFailure {
    pub fn analysis(message: impl Into<String>) -> Self {
        AnalysisFailure::AnalysisError {
            message: message.into(),
        }
    }

    /// Line number of a syntax error, if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            AnalysisFailure::SyntaxError { line, .. } => *line,
            AnalysisFailure::AnalysisError { .. } => None,
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(self, AnalysisFailure::SyntaxError { .. })
    }
}

fn format_syntax_error(message: &str, line: &Option<usize>, column: &Option<usize>) -> String {
    match (*line, *column) {
        (Some(line), Some(column)) => format!("{} (line {}, column {})", message, line, column),
        (Some(line), None) => format!("{} (line {})", message, line),
        _ => message.to_string(),
    }
}

/// How a parameter binds its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Declared before a `/` separator.
    PositionalOnly,
    /// Regular positional-or-keyword parameter.
    Positional,
    /// `*args`
    VarPositional,
    /// Declared after `*` or `*args`.
    KeywordOnly,
    /// `**kwargs`
    VarKeyword,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::PositionalOnly => "positional_only",
            ParameterKind::Positional => "positional",
            ParameterKind::VarPositional => "var_positional",
            ParameterKind::KeywordOnly => "keyword_only",
            ParameterKind::VarKeyword => "var_keyword",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
}

/// A `def` or `async def` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    /// Parameters in declaration order.
    pub parameters: Vec<Parameter>,
    /// Leading docstring, trimmed. `None` when absent or blank.
    pub docstring: Option<String>,
    /// Line of the `def` keyword (1-indexed).
    pub line: usize,
}

impl FunctionDef {
    /// Number of regular positional parameters (`self` included).
    ///
    /// Positional-only, keyword-only and variadic parameters are not counted.
    pub fn positional_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| p.kind == ParameterKind::Positional)
            .count()
    }
}

/// A `class` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    pub docstring: Option<String>,
    pub line: usize,
}

/// Closed set of node kinds produced by the tree walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    FunctionDef(FunctionDef),
    AsyncFunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Other,
}

/// Callbacks for `SyntaxTree::walk`.
///
/// All methods default to no-ops. The walk always continues into the
/// children of a node after its callback returns.
pub trait Visitor {
    fn visit_function_def(&mut self, _def: &FunctionDef) {}

    fn visit_async_function_def(&mut self, _def: &FunctionDef) {}

    fn visit_class_def(&mut self, _def: &ClassDef) {}
}
