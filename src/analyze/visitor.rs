//! Definition checks driven by the syntax tree walk.

use crate::syntax::{ClassDef, FunctionDef, Visitor};

use super::Finding;

/// Records documentation and parameter-count findings in walk order.
///
/// `async def` functions fall through to the default no-op callback; their
/// bodies are still walked.
#[derive(Debug)]
pub struct DefinitionVisitor {
    max_parameters: usize,
    findings: Vec<Finding>,
}

impl DefinitionVisitor {
    pub fn new(max_parameters: usize) -> Self {
        Self {
            max_parameters,
            findings: Vec::new(),
        }
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }
}

impl Visitor for DefinitionVisitor {
    fn visit_function_def(&mut self, def: &FunctionDef) {
        if def.docstring.is_none() {
            self.findings.push(Finding::documentation(format!(
                "Function '{}' lacks a docstring",
                def.name
            )));
        }

        if def.positional_count() > self.max_parameters {
            self.findings.push(Finding::complexity(format!(
                "Function '{}' has too many parameters. Consider refactoring.",
                def.name
            )));
        }
    }

    fn visit_class_def(&mut self, def: &ClassDef) {
        if def.docstring.is_none() {
            self.findings.push(Finding::documentation(format!(
                "Class '{}' lacks a docstring",
                def.name
            )));
        }
    }
}
