//! Integration tests for the analyzer against inline sources and fixtures.

use std::path::PathBuf;

use pycodeadvisor::{analyze, Analyzer, Finding, FindingKind, Settings, Thresholds};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn analyze_fixture(name: &str) -> Vec<Finding> {
    let path = testdata_path().join(name);
    let code = std::fs::read_to_string(&path).expect("fixture should be readable");
    analyze(&code)
}

fn messages(findings: &[Finding]) -> Vec<&str> {
    findings.iter().map(|f| f.message()).collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_undocumented_function() {
    let findings = analyze("def f():\n    pass");
    assert_eq!(
        findings,
        vec![Finding::documentation("Function 'f' lacks a docstring")]
    );
}

#[test]
fn test_uppercase_function_name() {
    let findings = analyze("def F():\n    pass");
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].kind(), FindingKind::Documentation);
    assert_eq!(findings[0].message(), "Function 'F' lacks a docstring");
    assert_eq!(findings[1].kind(), FindingKind::Style);
    assert_eq!(
        findings[1].message(),
        "Line 1: Consider using snake_case for names (lowercase_words_separated_by_underscores)"
    );
}

#[test]
fn test_too_many_parameters() {
    let findings = analyze("def g(a,b,c,d,e,f):\n    '''doc'''\n    pass");
    assert_eq!(
        findings,
        vec![Finding::complexity(
            "Function 'g' has too many parameters. Consider refactoring."
        )]
    );
}

#[test]
fn test_syntax_error_is_single_finding() {
    let findings = analyze("def (");
    assert_eq!(findings.len(), 1);
    assert!(findings[0].is_error());
    assert!(findings[0].message().starts_with("Syntax error: "));
}

#[test]
fn test_empty_source() {
    assert!(analyze("").is_empty());
}

// =============================================================================
// Boundaries
// =============================================================================

#[test]
fn test_parameter_boundary() {
    let five = analyze("def g(a, b, c, d, e):\n    '''doc'''\n");
    assert!(five.is_empty());

    let six = analyze("def g(a, b, c, d, e, f):\n    '''doc'''\n");
    assert_eq!(six.len(), 1);
    assert_eq!(six[0].kind(), FindingKind::Complexity);
}

#[test]
fn test_function_count_boundary() {
    let module = |n: usize| {
        (0..n)
            .map(|i| format!("def f{}():\n    '''doc'''\n", i))
            .collect::<String>()
    };

    assert!(analyze(&module(5)).is_empty());
    assert_eq!(
        analyze(&module(6)),
        vec![Finding::complexity(
            "The code has too many functions. Consider breaking it down into smaller modules."
        )]
    );
}

#[test]
fn test_custom_thresholds() {
    let analyzer = Analyzer::new().with_thresholds(Thresholds {
        max_parameters: 1,
        max_functions: 1,
    });
    let findings = analyzer.analyze("def a(x, y):\n    '''doc'''\n\ndef b():\n    '''doc'''\n");
    let kinds: Vec<FindingKind> = findings.iter().map(|f| f.kind()).collect();
    assert_eq!(kinds, vec![FindingKind::Complexity, FindingKind::Complexity]);
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_totality_and_error_exclusivity() {
    let inputs: &[&[u8]] = &[
        b"",
        b"\n\n\n",
        b"def (",
        b"class:",
        b"x = \"unterminated",
        b"\x00",
        b"\xff\xfe",
        b"if True:\npass",
        b"async def f():\n    def Inner():\n        pass\n",
        b"lambda: (yield)",
    ];

    let analyzer = Analyzer::new();
    for input in inputs {
        let findings = analyzer.analyze_bytes(input);
        if findings.iter().any(|f| f.is_error()) {
            assert_eq!(findings.len(), 1, "error must be alone for {:?}", input);
        }
    }
}

#[test]
fn test_grammar_leniencies_are_syntax_errors() {
    let inputs = [
        "print \"hello\"\n",
        "exec \"x = 1\"\n",
        "del f()\n",
        "def f(*):\n    '''doc'''\n",
        "f(x for x in y, 1)\n",
        "def Loud():\n    print \"HELLO\"\n",
    ];

    for input in inputs {
        let findings = analyze(input);
        assert_eq!(findings.len(), 1, "expected one finding for {:?}: {:?}", input, findings);
        assert!(findings[0].is_error(), "expected an error for {:?}", input);
        assert!(findings[0].message().starts_with("Syntax error: "));
        assert!(pycodeadvisor::validate::validate_code(input).is_err());
    }
}

#[test]
fn test_totality_on_large_input() {
    let module: String = (0..60_000)
        .map(|i| format!("def f{}(a, b):\n    '''doc'''\n    return a + b\n\n", i))
        .collect();
    assert!(module.len() > 2_000_000);

    let findings = analyze(&module);
    assert_eq!(
        findings,
        vec![Finding::complexity(
            "The code has too many functions. Consider breaking it down into smaller modules."
        )]
    );

    let mut broken = module.clone();
    broken.push_str("def (\n");
    let findings = analyze(&broken);
    assert_eq!(findings.len(), 1);
    assert!(findings[0].is_error());
}

#[test]
fn test_determinism() {
    let code = std::fs::read_to_string(testdata_path().join("messy.py")).unwrap();
    let first = analyze(&code);
    for _ in 0..5 {
        assert_eq!(analyze(&code), first);
    }
}

#[test]
fn test_group_order() {
    let findings = analyze("X = 1\ndef f():\n    pass\n");
    assert_eq!(findings[0].kind(), FindingKind::Documentation);
    assert_eq!(findings[1].kind(), FindingKind::Style);
    assert!(findings[1].message().starts_with("Line 1:"));
}

// =============================================================================
// Fixtures
// =============================================================================

#[test]
fn test_clean_fixture() {
    assert!(analyze_fixture("clean.py").is_empty());
}

#[test]
fn test_messy_fixture() {
    let findings = analyze_fixture("messy.py");
    assert_eq!(
        messages(&findings),
        vec![
            "Function 'fetchData' lacks a docstring",
            "Function 'fetchData' has too many parameters. Consider refactoring.",
            "Class 'Client' lacks a docstring",
            "Line 3: Consider using snake_case for names (lowercase_words_separated_by_underscores)",
            "Line 6: Consider using snake_case for names (lowercase_words_separated_by_underscores)",
            "Line 10: Consider using snake_case for names (lowercase_words_separated_by_underscores)",
        ]
    );
}

#[test]
fn test_broken_fixture() {
    let findings = analyze_fixture("broken.py");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind(), FindingKind::Error);
    assert!(findings[0].message().starts_with("Syntax error: "));
}

#[test]
fn test_many_functions_fixture() {
    let findings = analyze_fixture("many_functions.py");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind(), FindingKind::Complexity);
}

#[test]
fn test_settings_analyzer_matches_defaults() {
    let code = std::fs::read_to_string(testdata_path().join("messy.py")).unwrap();
    assert_eq!(Settings::default().analyzer().analyze(&code), analyze(&code));
}

#[test]
fn test_project_scan_skips_virtualenv() {
    let root = testdata_path().join("project");
    let files = pycodeadvisor::cli::collect_files(&root, &Settings::default()).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|p| p.strip_prefix(&root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(names, vec!["app.py", "pkg/util.py"]);

    let findings: Vec<Finding> = files
        .iter()
        .flat_map(|p| analyze(&std::fs::read_to_string(p).unwrap()))
        .collect();
    assert_eq!(messages(&findings), vec!["Function 'main' lacks a docstring"]);
}
