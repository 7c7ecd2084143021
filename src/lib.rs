//! pycodeadvisor - static analysis advisor for Python code.
//!
//! Parses Python source with tree-sitter and reports missing docstrings,
//! functions with too many parameters, modules with too many functions and
//! lines that break snake_case naming. Analysis never fails: syntax and
//! internal errors come back as a single `error` finding.
//!
//! # Architecture
//!
//! - `syntax`: tree-sitter parsing into a typed definition tree and visitor
//! - `analyze`: rules and the `Analyzer` facade
//! - `validate`: syntax and size checks for adapters
//! - `config`: YAML settings
//! - `chat`: chat-completion request/response shim
//! - `report`: pretty, JSON and narrative output
//! - `server`: HTTP adapter
//! - `cli`: command-line interface
//!
//! ```
//! let findings = pycodeadvisor::analyze("def f():\n    pass");
//! assert_eq!(findings[0].message(), "Function 'f' lacks a docstring");
//! ```

pub mod analyze;
pub mod chat;
pub mod cli;
pub mod config;
pub mod report;
pub mod server;
pub mod syntax;
pub mod validate;

pub use analyze::{analyze, Analyzer, Finding, FindingKind, Thresholds};
pub use config::Settings;
pub use syntax::{AnalysisFailure, PythonParser, SyntaxTree};
