//! Python parsing using tree-sitter.

use std::time::Duration;

use once_cell::sync::Lazy;
use tree_sitter::{Language, Node, Parser};

use super::literal;
use super::{
    AnalysisFailure, ClassDef, FunctionDef, Parameter, ParameterKind, SyntaxNode, SyntaxTree,
};

static PYTHON: Lazy<Language> = Lazy::new(|| tree_sitter_python::LANGUAGE.into());

/// Parses Python source into a `SyntaxTree`.
///
/// A fresh tree-sitter parser is created per call, so one `PythonParser`
/// can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct PythonParser {
    timeout: Option<Duration>,
}

impl PythonParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort parsing after `timeout`. The call then fails with an `AnalysisError`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn create_parser(&self) -> Result<Parser, AnalysisFailure> {
        let mut parser = Parser::new();
        parser
            .set_language(&PYTHON)
            .map_err(|e| AnalysisFailure::analysis(format!("failed to load Python grammar: {}", e)))?;
        if let Some(timeout) = self.timeout {
            parser.set_timeout_micros(timeout.as_micros().min(u64::MAX as u128) as u64);
        }
        Ok(parser)
    }

    /// Parse source text.
    ///
    /// tree-sitter recovers from errors, so a tree containing ERROR or MISSING
    /// nodes is turned into a `SyntaxError` pointing at the first one.
    pub fn parse(&self, source: &str) -> Result<SyntaxTree, AnalysisFailure> {
        if source.contains('\0') {
            return Err(AnalysisFailure::analysis(
                "source code string cannot contain null bytes",
            ));
        }

        let mut parser = self.create_parser()?;
        let tree = parser.parse(source, None).ok_or_else(|| {
            AnalysisFailure::analysis("parser produced no tree (timed out or cancelled)")
        })?;

        let root = tree.root_node();
        if root.has_error() {
            if let Some(node) = first_error(root) {
                return Err(syntax_error(node, source.as_bytes()));
            }
            return Err(AnalysisFailure::SyntaxError {
                message: "invalid syntax".to_string(),
                line: None,
                column: None,
            });
        }
        if let Some(failure) = first_rejected(root) {
            return Err(failure);
        }

        Ok(SyntaxTree::new(tree, source.to_string()))
    }

    /// Parse raw bytes, rejecting anything that is not UTF-8.
    pub fn parse_bytes(&self, source: &[u8]) -> Result<SyntaxTree, AnalysisFailure> {
        let text = std::str::from_utf8(source).map_err(|e| {
            AnalysisFailure::analysis(format!("source is not valid UTF-8: {}", e))
        })?;
        self.parse(text)
    }
}

/// Find the first ERROR or MISSING node in source order.
fn first_error(root: Node) -> Option<Node> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        // Only subtrees flagged with errors can contain one.
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

/// Find the first construct the grammar accepts but Python 3 rejects.
///
/// The grammar still carries Python 2 statements and is looser than
/// CPython about starred parameters, `del` targets and comprehension
/// iterables.
fn first_rejected(root: Node) -> Option<AnalysisFailure> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if let Some(message) = rejection(node) {
            let position = node.start_position();
            return Some(AnalysisFailure::SyntaxError {
                message: message.to_string(),
                line: Some(position.row + 1),
                column: Some(position.column + 1),
            });
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn rejection(node: Node) -> Option<&'static str> {
    match node.kind() {
        "print_statement" => {
            Some("Missing parentheses in call to 'print'. Did you mean print(...)?")
        }
        "exec_statement" => Some("Missing parentheses in call to 'exec'"),
        "keyword_separator" if !has_named_parameter_after(node) => {
            Some("named arguments must follow bare *")
        }
        "delete_statement" => {
            let mut cursor = node.walk();
            let deletes_call = node
                .named_children(&mut cursor)
                .any(contains_call_target);
            deletes_call.then_some("cannot delete function call")
        }
        "for_in_clause" => {
            let mut cursor = node.walk();
            let has_comma = node.children(&mut cursor).any(|c| c.kind() == ",");
            if !has_comma {
                None
            } else if node.parent().map(|p| p.kind()) == Some("generator_expression") {
                Some("Generator expression must be parenthesized")
            } else {
                Some("invalid syntax")
            }
        }
        _ => None,
    }
}

/// A bare `*` must be followed by a parameter other than `**kwargs`.
fn has_named_parameter_after(separator: Node) -> bool {
    let mut next = separator.next_named_sibling();
    while let Some(node) = next {
        if node.kind() != "comment" && variadic_kind(node) != Some(ParameterKind::VarKeyword) {
            return true;
        }
        next = node.next_named_sibling();
    }
    false
}

fn contains_call_target(target: Node) -> bool {
    match target.kind() {
        "call" => true,
        "expression_list" | "tuple" | "list" | "parenthesized_expression" => {
            let mut cursor = target.walk();
            let found = target
                .named_children(&mut cursor)
                .any(contains_call_target);
            found
        }
        _ => false,
    }
}

fn syntax_error(node: Node, source: &[u8]) -> AnalysisFailure {
    let position = node.start_position();
    let message = if node.is_missing() {
        format!("expected '{}'", node.kind())
    } else {
        match offending_token(node, source) {
            Some(token) => format!("invalid syntax near '{}'", token),
            None => "invalid syntax".to_string(),
        }
    };
    AnalysisFailure::SyntaxError {
        message,
        line: Some(position.row + 1),
        column: Some(position.column + 1),
    }
}

/// First line of an ERROR node's text, shortened for messages.
fn offending_token(node: Node, source: &[u8]) -> Option<String> {
    const MAX_LEN: usize = 40;

    let text = node.utf8_text(source).ok()?;
    let first_line = text.lines().next()?.trim();
    if first_line.is_empty() {
        return None;
    }
    if first_line.chars().count() > MAX_LEN {
        let short: String = first_line.chars().take(MAX_LEN).collect();
        return Some(format!("{}...", short));
    }
    Some(first_line.to_string())
}

/// Map a tree-sitter node onto the closed `SyntaxNode` model.
pub(super) fn classify(node: Node, source: &[u8]) -> Result<SyntaxNode, AnalysisFailure> {
    match node.kind() {
        "function_definition" => {
            let def = function_def(node, source)?;
            let is_async = node.child(0).map(|c| c.kind() == "async").unwrap_or(false);
            if is_async {
                Ok(SyntaxNode::AsyncFunctionDef(def))
            } else {
                Ok(SyntaxNode::FunctionDef(def))
            }
        }
        "class_definition" => Ok(SyntaxNode::ClassDef(ClassDef {
            name: definition_name(node, source, "class")?,
            docstring: docstring(node, source),
            line: node.start_position().row + 1,
        })),
        _ => Ok(SyntaxNode::Other),
    }
}

fn function_def(node: Node, source: &[u8]) -> Result<FunctionDef, AnalysisFailure> {
    Ok(FunctionDef {
        name: definition_name(node, source, "function")?,
        parameters: parameters(node, source)?,
        docstring: docstring(node, source),
        line: node.start_position().row + 1,
    })
}

fn definition_name(node: Node, source: &[u8], what: &str) -> Result<String, AnalysisFailure> {
    let line = node.start_position().row + 1;
    let name_node = node.child_by_field_name("name").ok_or_else(|| {
        AnalysisFailure::analysis(format!("malformed {} definition on line {}: missing name", what, line))
    })?;
    node_text(name_node, source).map(str::to_string)
}

fn node_text<'a>(node: Node, source: &'a [u8]) -> Result<&'a str, AnalysisFailure> {
    node.utf8_text(source)
        .map_err(|e| AnalysisFailure::analysis(format!("invalid UTF-8 in node text: {}", e)))
}

fn parameters(node: Node, source: &[u8]) -> Result<Vec<Parameter>, AnalysisFailure> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Ok(Vec::new());
    };

    let mut result: Vec<Parameter> = Vec::new();
    let mut kind = ParameterKind::Positional;
    let mut cursor = params.walk();

    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "comment" => {}
            "positional_separator" => {
                for p in result.iter_mut().filter(|p| p.kind == ParameterKind::Positional) {
                    p.kind = ParameterKind::PositionalOnly;
                }
            }
            "keyword_separator" => kind = ParameterKind::KeywordOnly,
            _ => {
                let variadic = variadic_kind(child);
                result.push(Parameter {
                    name: parameter_name(child, source)?,
                    kind: variadic.unwrap_or(kind),
                });
                if variadic == Some(ParameterKind::VarPositional) {
                    kind = ParameterKind::KeywordOnly;
                }
            }
        }
    }

    Ok(result)
}

/// `*args` / `**kwargs`, possibly wrapped in a type annotation.
fn variadic_kind(node: Node) -> Option<ParameterKind> {
    match node.kind() {
        "list_splat_pattern" => Some(ParameterKind::VarPositional),
        "dictionary_splat_pattern" => Some(ParameterKind::VarKeyword),
        "typed_parameter" => node.named_child(0).and_then(variadic_kind),
        _ => None,
    }
}

fn parameter_name(node: Node, source: &[u8]) -> Result<String, AnalysisFailure> {
    match node.kind() {
        "default_parameter" | "typed_default_parameter" => match node.child_by_field_name("name") {
            Some(name) => parameter_name(name, source),
            None => node_text(node, source).map(str::to_string),
        },
        "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
            match node.named_child(0) {
                Some(inner) => parameter_name(inner, source),
                None => node_text(node, source).map(str::to_string),
            }
        }
        _ => node_text(node, source).map(str::to_string),
    }
}

/// Extract the docstring of a function or class definition.
///
/// The first statement of the body must be a string literal (or an implicit
/// concatenation of them), possibly parenthesized. Byte strings and f-strings
/// don't count, and neither does a literal whose decoded value is blank.
fn docstring(node: Node, source: &[u8]) -> Option<String> {
    let body = node.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")?;

    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }

    let literal = string_literal(unparenthesized(first.named_child(0)?)?, source)?;
    if literal.blank {
        return None;
    }
    Some(literal.content.trim().to_string())
}

/// Strip redundant parentheses: `("doc")` is still a string expression.
fn unparenthesized(mut node: Node) -> Option<Node> {
    while node.kind() == "parenthesized_expression" {
        let mut cursor = node.walk();
        let inner = node
            .named_children(&mut cursor)
            .find(|n| n.kind() != "comment")?;
        node = inner;
    }
    Some(node)
}

struct StringLiteral {
    content: String,
    /// Value is empty or only whitespace once escapes are decoded.
    blank: bool,
}

fn string_literal(node: Node, source: &[u8]) -> Option<StringLiteral> {
    match node.kind() {
        "string" => {
            let mut content = String::new();
            let mut raw = false;
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "string_start" => {
                        let prefix = child
                            .utf8_text(source)
                            .ok()?
                            .trim_end_matches(['"', '\''])
                            .to_ascii_lowercase();
                        // bytes, f-strings and template strings are not str constants
                        if prefix.contains(['b', 'f', 't']) {
                            return None;
                        }
                        raw = prefix.contains('r');
                    }
                    "string_content" => content.push_str(child.utf8_text(source).ok()?),
                    "interpolation" => return None,
                    _ => {}
                }
            }
            let blank = literal::is_blank(&content, raw);
            Some(StringLiteral { content, blank })
        }
        "concatenated_string" => {
            let mut content = String::new();
            let mut blank = true;
            let mut cursor = node.walk();
            for part in node.named_children(&mut cursor) {
                if part.kind() == "comment" {
                    continue;
                }
                let literal = string_literal(part, source)?;
                content.push_str(&literal.content);
                blank &= literal.blank;
            }
            Some(StringLiteral { content, blank })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Visitor;

    #[derive(Default)]
    struct Collect {
        nodes: Vec<SyntaxNode>,
    }

    impl Visitor for Collect {
        fn visit_function_def(&mut self, def: &FunctionDef) {
            self.nodes.push(SyntaxNode::FunctionDef(def.clone()));
        }

        fn visit_async_function_def(&mut self, def: &FunctionDef) {
            self.nodes.push(SyntaxNode::AsyncFunctionDef(def.clone()));
        }

        fn visit_class_def(&mut self, def: &ClassDef) {
            self.nodes.push(SyntaxNode::ClassDef(def.clone()));
        }
    }

    fn collect(source: &str) -> Vec<SyntaxNode> {
        let tree = PythonParser::new().parse(source).unwrap();
        let mut visitor = Collect::default();
        tree.walk(&mut visitor).unwrap();
        visitor.nodes
    }

    fn only_function(source: &str) -> FunctionDef {
        match collect(source).into_iter().next() {
            Some(SyntaxNode::FunctionDef(def)) => def,
            other => panic!("expected a function, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_source() {
        let tree = PythonParser::new().parse("").unwrap();
        assert_eq!(tree.source(), "");
        assert!(collect("").is_empty());
    }

    #[test]
    fn test_syntax_error_location() {
        let err = PythonParser::new().parse("x = 1\ndef (").unwrap_err();
        assert!(err.is_syntax_error(), "got {:?}", err);
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_missing_token_is_syntax_error() {
        let err = PythonParser::new().parse("print((1, 2)\n").unwrap_err();
        assert!(err.is_syntax_error(), "got {:?}", err);
    }

    #[test]
    fn test_null_bytes_are_analysis_errors() {
        let err = PythonParser::new().parse("x = 1\0").unwrap_err();
        assert!(!err.is_syntax_error());
        assert!(err.to_string().contains("null bytes"));
    }

    #[test]
    fn test_invalid_utf8_is_analysis_error() {
        let err = PythonParser::new().parse_bytes(&[0x66, 0xff, 0xfe]).unwrap_err();
        assert!(!err.is_syntax_error());
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_docstring_variants() {
        assert_eq!(
            only_function("def f():\n    \"\"\"  Does things.  \"\"\"\n").docstring,
            Some("Does things.".to_string())
        );
        assert_eq!(
            only_function("def f():\n    # leading comment\n    'doc'\n").docstring,
            Some("doc".to_string())
        );
        assert_eq!(
            only_function("def f():\n    'part one ' 'part two'\n").docstring,
            Some("part one part two".to_string())
        );
        assert_eq!(only_function("def f():\n    pass\n").docstring, None);
        assert_eq!(only_function("def f():\n    x = 'doc'\n").docstring, None);
        assert_eq!(only_function("def f():\n    b'doc'\n").docstring, None);
        assert_eq!(only_function("def f():\n    f'doc {x}'\n").docstring, None);
        assert_eq!(only_function("def f():\n    '''   '''\n").docstring, None);
        assert_eq!(only_function("def f():\n    '\\n\\t'\n").docstring, None);
        assert_eq!(
            only_function("def f():\n    pass\n    'late string'\n").docstring,
            None
        );
    }

    #[test]
    fn test_parenthesized_and_escaped_docstrings() {
        assert_eq!(
            only_function("def f():\n    ('''doc''')\n").docstring,
            Some("doc".to_string())
        );
        assert_eq!(
            only_function("def f():\n    (('a' 'b'))\n").docstring,
            Some("ab".to_string())
        );
        assert_eq!(only_function("def f():\n    '\\x20'\n").docstring, None);
        assert_eq!(only_function("def f():\n    '\\N{SPACE}\\040'\n").docstring, None);
        assert_eq!(only_function("def f():\n    ' ' '\\u3000'\n").docstring, None);
        assert!(only_function("def f():\n    ' ' r'\\x20'\n").docstring.is_some());
    }

    #[test]
    fn test_python2_and_loose_constructs_rejected() {
        let cases = [
            ("print \"hello\"\n", "print"),
            ("exec \"x = 1\"\n", "exec"),
            ("del f()\n", "cannot delete function call"),
            ("del a, (b, g())\n", "cannot delete function call"),
            ("def f(*):\n    '''doc'''\n", "bare *"),
            ("def f(*, **kwargs):\n    pass\n", "bare *"),
            ("f(x for x in y, 1)\n", "Generator expression must be parenthesized"),
            ("[x for x in 1, 2]\n", "invalid syntax"),
        ];
        for (source, expected) in cases {
            let err = PythonParser::new().parse(source).unwrap_err();
            assert!(err.is_syntax_error(), "{:?}: got {:?}", source, err);
            assert_eq!(err.line(), Some(1));
            assert!(err.to_string().contains(expected), "{:?}: got {}", source, err);
        }
    }

    #[test]
    fn test_python3_equivalents_accepted() {
        for source in [
            "print(\"hello\")\n",
            "exec(\"x = 1\")\n",
            "del a, b[0], c.d\n",
            "def f(*, key, **kwargs):\n    pass\n",
            "lambda *, key: key\n",
            "f(x for x in y)\n",
            "f((x for x in y), 1)\n",
            "[x for x in (1, 2)]\n",
        ] {
            assert!(PythonParser::new().parse(source).is_ok(), "{:?} should parse", source);
        }
    }

    #[test]
    fn test_parameter_kinds() {
        let def = only_function("def f(a, b=1, /, c: int = 2, *args, d, e=3, **kwargs):\n    pass\n");
        let kinds: Vec<_> = def.parameters.iter().map(|p| (p.name.as_str(), p.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("a", ParameterKind::PositionalOnly),
                ("b", ParameterKind::PositionalOnly),
                ("c", ParameterKind::Positional),
                ("args", ParameterKind::VarPositional),
                ("d", ParameterKind::KeywordOnly),
                ("e", ParameterKind::KeywordOnly),
                ("kwargs", ParameterKind::VarKeyword),
            ]
        );
        assert_eq!(def.positional_count(), 1);
    }

    #[test]
    fn test_bare_star_starts_keyword_only() {
        let def = only_function("def f(self, a, *, b, c):\n    pass\n");
        assert_eq!(def.positional_count(), 2);
        assert_eq!(def.parameters.len(), 4);
        assert_eq!(def.parameters[2].kind, ParameterKind::KeywordOnly);
    }

    #[test]
    fn test_typed_variadics() {
        let def = only_function("def f(x: int, *rest: str, **opts: bool):\n    pass\n");
        assert_eq!(def.parameters[1].name, "rest");
        assert_eq!(def.parameters[1].kind, ParameterKind::VarPositional);
        assert_eq!(def.parameters[2].name, "opts");
        assert_eq!(def.parameters[2].kind, ParameterKind::VarKeyword);
        assert_eq!(def.positional_count(), 1);
    }

    #[test]
    fn test_async_and_decorated_definitions() {
        let nodes = collect(
            "@decorator\ndef plain():\n    pass\n\nasync def fetch():\n    pass\n\nclass Box:\n    'a box'\n",
        );
        assert_eq!(nodes.len(), 3);
        assert!(matches!(&nodes[0], SyntaxNode::FunctionDef(d) if d.name == "plain" && d.line == 2));
        assert!(matches!(&nodes[1], SyntaxNode::AsyncFunctionDef(d) if d.name == "fetch"));
        assert!(
            matches!(&nodes[2], SyntaxNode::ClassDef(c) if c.name == "Box" && c.docstring.as_deref() == Some("a box"))
        );
    }
}
