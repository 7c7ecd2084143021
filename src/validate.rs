//! Input validation performed before analysis.

use crate::syntax::{AnalysisFailure, PythonParser};

/// Default maximum accepted source size, in characters.
pub const DEFAULT_MAX_CODE_SIZE: usize = 10_000;

/// Check that `code` is syntactically valid Python.
pub fn validate_code(code: &str) -> Result<(), String> {
    match PythonParser::new().parse(code) {
        Ok(_) => Ok(()),
        Err(AnalysisFailure::SyntaxError {
            message,
            line: Some(line),
            ..
        }) => Err(format!("Syntax error on line {}: {}", line, message)),
        Err(AnalysisFailure::SyntaxError { message, line: None, .. }) => {
            Err(format!("Syntax error: {}", message))
        }
        Err(AnalysisFailure::AnalysisError { message }) => Err(message),
    }
}

/// Check that `code` is at most `max_size` characters long.
pub fn validate_code_size(code: &str, max_size: usize) -> Result<(), String> {
    if code.chars().count() > max_size {
        return Err(format!(
            "Code exceeds maximum size of {} characters",
            max_size
        ));
    }
    Ok(())
}
