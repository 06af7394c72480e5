// Integration tests for the Monkey interpreter
//
// A parser robustness harness (every input must parse or fail cleanly,
// never panic) followed by end-to-end evaluation scenarios driven through
// the public API.

use monkey::environment::Environment;
use monkey::object::Object;
use monkey::parser;
use monkey::{eval, EvalResult};
use pretty_assertions::assert_eq;

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_error_contains: Option<String>,
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Run all tests in this suite
    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

/// Results for a test suite run
#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ✓ {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  ✗ {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  💥 {}: CRASHED - {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

/// Run a single test case, catching panics so crashes are reported
fn run_single_test(test: &TestCase) -> TestResult {
    let result = std::panic::catch_unwind(|| parse_errors(&test.input));

    match result {
        Ok(errors) => match (errors.is_empty(), test.should_succeed) {
            (true, true) => TestResult::Pass,
            (true, false) => {
                TestResult::Fail("Expected parsing to fail, but it succeeded".to_string())
            }
            (false, false) => match &test.expected_error_contains {
                Some(expected) if !errors.iter().any(|e| e.contains(expected.as_str())) => {
                    TestResult::Fail(format!(
                        "Errors {:?} don't contain expected text '{}'",
                        errors, expected
                    ))
                }
                _ => TestResult::Pass,
            },
            (false, true) => TestResult::Fail(format!(
                "Expected parsing to succeed, but got errors: {:?}",
                errors
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

/// Parse input and return the error messages
fn parse_errors(input: &str) -> Vec<String> {
    let (_, errors) = parser::parse(input);
    errors.into_iter().map(|e| e.message).collect()
}

impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_error_contains: None,
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: None,
        }
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: Some(expected_msg.to_string()),
        }
    }
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_malformed_expressions_tests() -> TestSuite {
    let mut suite = TestSuite::new("Malformed Expressions");

    // === PARENTHESES ===
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren",
        "(1 + 2",
        "expected next token to be ), got EOF instead",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren_nested",
        "((1 + 2)",
        "expected next token to be ), got EOF instead",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_closing_paren",
        "1 + 2)",
        "no prefix parse function for )",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "empty_parentheses",
        "()",
        "no prefix parse function for )",
    ));

    // === BRACES ===
    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_function_body",
        "fn(x) { x",
        "expected }, got EOF",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_if_block",
        "if (true) { 1",
        "expected }, got EOF",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "stray_closing_brace",
        "let x = 1; }",
        "no prefix parse function for }",
    ));

    // === CALLS ===
    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_call",
        "add(1, 2",
        "expected next token to be ), got EOF instead",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "trailing_comma_in_call",
        "add(1, )",
        "no prefix parse function for )",
    ));

    suite
}

fn create_statement_tests() -> TestSuite {
    let mut suite = TestSuite::new("Statements");

    suite.add_test(TestCase::should_succeed("let_binding", "let x = 5;"));
    suite.add_test(TestCase::should_succeed("let_without_semicolon", "let x = 5"));
    suite.add_test(TestCase::should_succeed("return_value", "return 5;"));
    suite.add_test(TestCase::should_succeed("bare_semicolons_after_expr", "5;"));

    suite.add_test(TestCase::should_fail_with_message(
        "let_missing_name",
        "let = 5;",
        "expected next token to be IDENT, got = instead",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "let_missing_assign",
        "let x 5;",
        "expected next token to be =, got INT instead",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "let_keyword_as_name",
        "let fn = 5;",
        "expected next token to be IDENT, got FUNCTION instead",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "return_without_value",
        "return;",
        "no prefix parse function for ;",
    ));

    suite
}

fn create_edge_case_tests() -> TestSuite {
    let mut suite = TestSuite::new("Edge Cases");

    suite.add_test(TestCase::should_succeed("empty_input", ""));
    suite.add_test(TestCase::should_succeed("only_whitespace", "   \n\t  "));

    suite.add_test(TestCase::should_fail("unexpected_eof_after_operator", "1 +"));
    suite.add_test(TestCase::should_fail("unexpected_eof_in_group", "1 + ("));
    suite.add_test(TestCase::should_fail("lone_semicolon", ";"));
    suite.add_test(TestCase::should_fail_with_message(
        "illegal_character",
        "1 # 2",
        "no prefix parse function for ILLEGAL",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "integer_too_large",
        "let big = 9223372036854775808;",
        "could not parse 9223372036854775808 as integer",
    ));

    let deep_parens = "(".repeat(500) + "1" + &")".repeat(500);
    suite.add_test(TestCase::should_succeed("deeply_nested_parens", &deep_parens));

    let deep_unclosed = "(".repeat(500) + "1";
    suite.add_test(TestCase::should_fail("deeply_nested_unclosed", &deep_unclosed));

    suite
}

fn create_operator_tests() -> TestSuite {
    let mut suite = TestSuite::new("Operator Tests");

    suite.add_test(TestCase::should_fail("missing_left_operand", "* 1"));
    suite.add_test(TestCase::should_fail("missing_right_operand", "1 *"));
    suite.add_test(TestCase::should_fail("missing_both_operands", "*"));
    suite.add_test(TestCase::should_fail("double_plus", "1 ++ 2"));

    // Unary minus and bang stack on the right-hand side
    suite.add_test(TestCase::should_succeed("double_minus", "1 -- 2"));
    suite.add_test(TestCase::should_succeed("mixed_operators", "1 +- 2"));
    suite.add_test(TestCase::should_succeed("stacked_bangs", "!!!true"));

    suite.add_test(TestCase::should_succeed("comparison_equal", "1 == 2"));
    suite.add_test(TestCase::should_succeed("comparison_not_equal", "1 != 2"));
    suite.add_test(TestCase::should_succeed("comparison_less", "1 < 2"));
    suite.add_test(TestCase::should_succeed("comparison_greater", "1 > 2"));

    // Operators outside the grammar
    suite.add_test(TestCase::should_fail("less_equal", "1 <= 2"));
    suite.add_test(TestCase::should_fail("assignment_expression", "x = 2"));

    suite
}

fn create_control_flow_tests() -> TestSuite {
    let mut suite = TestSuite::new("Control Flow Tests");

    suite.add_test(TestCase::should_succeed("valid_if", "if (true) { 1 }"));
    suite.add_test(TestCase::should_succeed("valid_if_else", "if (x) { 1 } else { 2 }"));
    suite.add_test(TestCase::should_succeed("empty_blocks", "if (x) { } else { }"));
    suite.add_test(TestCase::should_succeed(
        "nested_functions",
        "fn(a) { fn(b) { fn(c) { a + b + c } } }",
    ));
    suite.add_test(TestCase::should_succeed("immediately_invoked", "fn(x) { x }(1)"));

    suite.add_test(TestCase::should_fail_with_message(
        "if_without_parens",
        "if true { 1 }",
        "expected next token to be (, got TRUE instead",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "if_without_braces",
        "if (true) 1",
        "expected next token to be {, got INT instead",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "else_without_braces",
        "if (true) { 1 } else 2",
        "expected next token to be {, got INT instead",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "function_parameter_not_identifier",
        "fn(1) { 1 }",
        "expected next token to be IDENT, got INT instead",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "function_missing_comma",
        "fn(a b) { a }",
        "expected next token to be ), got IDENT instead",
    ));

    suite
}

// ============================================================================
// Parser robustness
// ============================================================================

#[test]
fn parser_robustness_suites() {
    let suites = [
        create_malformed_expressions_tests(),
        create_statement_tests(),
        create_edge_case_tests(),
        create_operator_tests(),
        create_control_flow_tests(),
    ];

    let mut all_passed = true;
    for suite in &suites {
        let results = suite.run();
        all_passed &= results.is_all_passed();
    }

    assert!(all_passed, "some parser robustness tests failed; see output above");
}

#[test]
fn every_error_in_one_pass() {
    let errors = parse_errors("let = 1;\nlet y 2;\nlet ok = 3;\n4 * ;");
    assert_eq!(
        errors,
        vec![
            "expected next token to be IDENT, got = instead",
            "expected next token to be =, got INT instead",
            "no prefix parse function for ;",
        ]
    );
}

#[test]
fn canonical_rendering_matches_precedence() {
    let cases = [
        ("a + b * c", "(a + (b * c))"),
        ("-a + b", "((-a) + b)"),
        ("!(!true != true)", "(!((!true) != true))"),
        ("a * (b + c) - d / e", "((a * (b + c)) - (d / e))"),
        ("f(a)(b)", "f(a)(b)"),
        ("-f(x) * 2", "((-f(x)) * 2)"),
    ];

    for (input, expected) in cases {
        let (program, errors) = parser::parse(input);
        assert!(errors.is_empty(), "{:?}: {:?}", input, errors);
        assert_eq!(program.to_string(), expected, "input: {}", input);
    }
}

// ============================================================================
// End-to-end evaluation
// ============================================================================

fn run(source: &str) -> EvalResult {
    let (program, errors) = parser::parse(source);
    assert!(errors.is_empty(), "{:?}: {:?}", source, errors);
    eval(&program, &Environment::new_shared())
}

#[test]
fn arithmetic_and_comparison() {
    assert_eq!(run("2 + 4 * 8"), Ok(Object::Integer(34)));
    assert_eq!(run("4 / (2 + 2)"), Ok(Object::Integer(1)));
    assert_eq!(run("90 - -9 * 3"), Ok(Object::Integer(117)));
    assert_eq!(run("(1 < 2) == true"), Ok(Object::Boolean(true)));
    assert_eq!(run("1 != 2"), Ok(Object::Boolean(true)));
}

#[test]
fn conditionals_and_early_return() {
    assert_eq!(run("if (false) { 10 }"), Ok(Object::Null));
    assert_eq!(run("if (1 != 1) { 10 } else { 20 }"), Ok(Object::Integer(20)));
    assert_eq!(
        run("if (10 > 1) { if (10 > 1) { return 10; } return 1; }"),
        Ok(Object::Integer(10))
    );
}

#[test]
fn closures_across_separate_programs() {
    let env = Environment::new_shared();
    let lines = [
        "let adder = fn(x) { fn(y) { x + y; } };",
        "let addTwo = adder(2);",
        "addTwo(3)",
    ];

    let mut last = Ok(Object::Null);
    for line in lines {
        let (program, errors) = parser::parse(line);
        assert!(errors.is_empty());
        last = eval(&program, &env);
    }

    assert_eq!(last, Ok(Object::Integer(5)));
}

#[test]
fn errors_are_values_not_aborts() {
    let not_found = run("foobar").unwrap_err();
    assert!(not_found.to_string().contains("not found"));
    assert_eq!(not_found.inspect(), "ERROR: identifier not found: foobar");

    let mismatch = run("5 + true").unwrap_err();
    assert!(mismatch.to_string().contains("type mismatch"));
}

#[test]
fn nested_let_does_not_leak_into_outer_scope() {
    assert_eq!(
        run("let x = 10; let shadow = fn() { let x = 99; x }; shadow() + x"),
        Ok(Object::Integer(109))
    );
}

#[test]
fn a_small_program() {
    let source = "
        let max = fn(a, b) { if (a > b) { a } else { b } };
        let apply = fn(f, a, b) { f(a, b) };
        let fact = fn(n) { if (n < 2) { return 1; } n * fact(n - 1) };
        apply(max, fact(5), 100)
    ";
    assert_eq!(run(source), Ok(Object::Integer(120)));
}

#[test]
fn long_prefix_chain_parses_evaluates_and_drops() {
    let source = "-".repeat(100_000) + "1";
    let (program, errors) = parser::parse(&source);
    assert!(errors.is_empty());

    let value = eval(&program, &Environment::new_shared());
    assert_eq!(value, Ok(Object::Integer(1)));
    drop(program);
}

#[test]
fn deeply_nested_ifs_parse_evaluate_and_drop() {
    let depth = 20_000;
    let source = "if (true) { ".repeat(depth) + "7" + &" }".repeat(depth);
    assert_eq!(run(&source), Ok(Object::Integer(7)));
}

#[test]
fn deeply_nested_function_literal_outlives_its_program() {
    let depth = 20_000;
    let source = "fn() { ".repeat(depth) + "1" + &" }".repeat(depth);
    let (program, errors) = parser::parse(&source);
    assert!(errors.is_empty());

    let closure = eval(&program, &Environment::new_shared()).unwrap();
    assert_eq!(closure.type_name(), "FUNCTION");

    // The closure now holds the last reference to the nested bodies
    drop(program);
    drop(closure);
}
