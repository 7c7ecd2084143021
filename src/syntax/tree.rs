//! Owned syntax tree and its pre-order walk.

use super::python::classify;
use super::{AnalysisFailure, SyntaxNode, Visitor};

/// A successfully parsed Python module.
///
/// Holds the tree-sitter tree together with the source it was parsed from,
/// since node text is resolved lazily against the source bytes.
pub struct SyntaxTree {
    tree: tree_sitter::Tree,
    source: String,
}

impl SyntaxTree {
    pub(super) fn new(tree: tree_sitter::Tree, source: String) -> Self {
        Self { tree, source }
    }

    /// The source text this tree was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Visit every node in pre-order: a node before its children, siblings in
    /// source order.
    ///
    /// The walk uses a tree cursor rather than recursion, so deeply nested
    /// input cannot exhaust the stack.
    pub fn walk<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<(), AnalysisFailure> {
        let source = self.source.as_bytes();
        let mut cursor = self.tree.walk();

        loop {
            match classify(cursor.node(), source)? {
                SyntaxNode::FunctionDef(def) => visitor.visit_function_def(&def),
                SyntaxNode::AsyncFunctionDef(def) => visitor.visit_async_function_def(&def),
                SyntaxNode::ClassDef(def) => visitor.visit_class_def(&def),
                SyntaxNode::Other => {}
            }

            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return Ok(());
                }
            }
        }
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("root", &self.tree.root_node().kind())
            .field("source_len", &self.source.len())
            .finish()
    }
}
