//! Core types for analysis results.

use serde::{Deserialize, Serialize};

use crate::syntax::AnalysisFailure;

/// Category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Error,
    Style,
    Documentation,
    Complexity,
}

impl FindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::Error => "error",
            FindingKind::Style => "style",
            FindingKind::Documentation => "documentation",
            FindingKind::Complexity => "complexity",
        }
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FindingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(FindingKind::Error),
            "style" => Ok(FindingKind::Style),
            "documentation" => Ok(FindingKind::Documentation),
            "complexity" => Ok(FindingKind::Complexity),
            _ => Err(format!("unknown finding kind: {}", s)),
        }
    }
}

/// A single reported issue.
///
/// Serialized as `{"type": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    kind: FindingKind,
    message: String,
}

impl Finding {
    pub fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FindingKind::Error, message)
    }

    pub fn style(message: impl Into<String>) -> Self {
        Self::new(FindingKind::Style, message)
    }

    pub fn documentation(message: impl Into<String>) -> Self {
        Self::new(FindingKind::Documentation, message)
    }

    pub fn complexity(message: impl Into<String>) -> Self {
        Self::new(FindingKind::Complexity, message)
    }

    pub fn kind(&self) -> FindingKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        self.kind == FindingKind::Error
    }
}

impl From<AnalysisFailure> for Finding {
    fn from(failure: AnalysisFailure) -> Self {
        match failure {
            AnalysisFailure::SyntaxError { .. } => {
                Finding::error(format!("Syntax error: {}", failure))
            }
            AnalysisFailure::AnalysisError { message } => {
                Finding::error(format!("Analysis error: {}", message))
            }
        }
    }
}
