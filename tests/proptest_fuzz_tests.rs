//! Property-based fuzzing tests for the minifn parser, lowering and optimizer
//!
//! These tests use proptest to generate random inputs and verify that:
//! 1. The scanner and parser never panic on arbitrary input
//! 2. Printing a program and parsing it again gives the same AST
//! 3. Compiled functions agree with a direct evaluation of the AST
//! 4. Optimization and parallel lowering never change results

use minifn::compiler::{lower_module, lower_parallel, Interpreter};
use minifn::parser::MAX_NESTING;
use minifn::{
    parse, Atom, Block, CompileOptions, Compiler, Error, Expression, Function, LowerError,
    Operator, Program, Scanner,
};
use proptest::prelude::*;
use std::collections::HashMap;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

const PARAM_NAMES: [&str; 4] = ["a", "b", "c", "d"];

/// Generate random strings that might break parsers
fn arbitrary_source_string() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[\x00-\x7F]{0,300}").unwrap()
}

/// Generate strings built from minifn-looking tokens
fn token_soup() -> impl Strategy<Value = String> {
    prop::collection::vec(soup_token(), 0..60).prop_map(|tokens| tokens.join(" "))
}

fn soup_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("fn".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just(",".to_string()),
        Just("+".to_string()),
        Just("-".to_string()),
        Just("*".to_string()),
        Just("/".to_string()),
        (0i64..1000).prop_map(|n| n.to_string()),
        Just("0".to_string()),
        Just("99999999999999999999".to_string()),
        "[a-z_][a-z0-9_]{0,6}".prop_map(|s| s),
    ]
}

fn int_atom() -> impl Strategy<Value = Atom> {
    prop_oneof![
        4 => (0i64..100).prop_map(Atom::IntegerLiteral),
        1 => Just(Atom::IntegerLiteral(0)),
        1 => Just(Atom::IntegerLiteral(1)),
        1 => (0i64..=i64::MAX).prop_map(Atom::IntegerLiteral),
    ]
}

fn leaf_atom(params: Vec<String>) -> BoxedStrategy<Atom> {
    if params.is_empty() {
        int_atom().boxed()
    } else {
        prop_oneof![
            int_atom(),
            prop::sample::select(params).prop_map(Atom::VariableRef),
        ]
        .boxed()
    }
}

fn mul_op() -> impl Strategy<Value = Operator> {
    prop_oneof![Just(Operator::Mul), Just(Operator::Div)]
}

fn add_op() -> impl Strategy<Value = Operator> {
    prop_oneof![Just(Operator::Add), Just(Operator::Sub)]
}

/// Atoms, including parenthesized multiplicative sub-expressions
fn atom(params: Vec<String>) -> BoxedStrategy<Atom> {
    leaf_atom(params)
        .prop_recursive(3, 16, 3, |inner| {
            (inner.clone(), prop::collection::vec((mul_op(), inner), 0..3)).prop_map(
                |(first, rest)| {
                    Atom::NestedExpression(Box::new(Expression::multiplicative(first, rest)))
                },
            )
        })
        .boxed()
}

fn mul_expr(params: Vec<String>) -> BoxedStrategy<Expression> {
    let atoms = atom(params);
    (atoms.clone(), prop::collection::vec((mul_op(), atoms), 0..3))
        .prop_map(|(first, rest)| Expression::multiplicative(first, rest))
        .boxed()
}

fn add_expr(params: Vec<String>) -> impl Strategy<Value = Expression> {
    let terms = mul_expr(params);
    (terms.clone(), prop::collection::vec((add_op(), terms), 0..4))
        .prop_map(|(first, rest)| Expression::additive(first, rest))
}

/// `(params, body)` where the body only references declared parameters
fn function_parts() -> impl Strategy<Value = (Vec<String>, Expression)> {
    prop::sample::subsequence(PARAM_NAMES.to_vec(), 0..=PARAM_NAMES.len()).prop_flat_map(
        |names| {
            let params: Vec<String> = names.iter().map(|s| s.to_string()).collect();
            (Just(params.clone()), add_expr(params))
        },
    )
}

/// Generate well-formed programs with uniquely named functions
fn valid_program() -> impl Strategy<Value = Program> {
    prop::collection::vec(function_parts(), 0..5).prop_map(|parts| Program {
        functions: parts
            .into_iter()
            .enumerate()
            .map(|(i, (params, ret))| Function {
                name: format!("f{}", i),
                params,
                body: Block { ret },
            })
            .collect(),
    })
}

fn argument() -> impl Strategy<Value = i64> {
    prop_oneof![
        4 => -1000i64..1000,
        1 => Just(0i64),
        1 => Just(-1i64),
        1 => Just(i64::MIN),
        1 => any::<i64>(),
    ]
}

fn arguments() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(argument(), PARAM_NAMES.len())
}

// =============================================================================
// REFERENCE EVALUATOR
// =============================================================================

/// Direct AST evaluation; `None` when a division traps
fn eval_expr(expr: &Expression, env: &HashMap<&str, i64>) -> Option<i64> {
    let mut acc = eval_atom(&expr.first, env)?;
    for operation in &expr.rest {
        let rhs = eval_atom(&operation.operand, env)?;
        acc = match operation.op {
            Operator::Add => acc.wrapping_add(rhs),
            Operator::Sub => acc.wrapping_sub(rhs),
            Operator::Mul => acc.wrapping_mul(rhs),
            Operator::Div => acc.checked_div(rhs)?,
        };
    }
    Some(acc)
}

fn eval_atom(atom: &Atom, env: &HashMap<&str, i64>) -> Option<i64> {
    match atom {
        Atom::IntegerLiteral(n) => Some(*n),
        Atom::VariableRef(name) => env.get(name.as_str()).copied(),
        Atom::NestedExpression(inner) => eval_expr(inner, env),
    }
}

fn eval_function(function: &Function, args: &[i64]) -> Option<i64> {
    let env: HashMap<&str, i64> = function
        .params
        .iter()
        .map(String::as_str)
        .zip(args.iter().copied())
        .collect();
    eval_expr(&function.body.ret, &env)
}

fn compile_at(program: &Program, opt_level: u8) -> minifn::Result<minifn::CompileResult> {
    Compiler::new(CompileOptions {
        opt_level,
        ..Default::default()
    })
    .compile_ast(program)
}

// =============================================================================
// PARSER FUZZING
// =============================================================================

proptest! {
    /// The scanner should never panic on arbitrary input
    #[test]
    fn scanner_never_panics(source in arbitrary_source_string()) {
        let tokens = Scanner::new(&source).scan_tokens();
        prop_assert!(!tokens.is_empty());
    }

    /// The parser should never panic, and errors stay inside the source
    #[test]
    fn parser_never_panics(source in arbitrary_source_string()) {
        if let Err(err) = parse(&source) {
            prop_assert!(err.position <= source.len());
        }
    }

    /// Token soup either parses or fails with a non-empty expectation set
    #[test]
    fn parser_handles_token_soup(source in token_soup()) {
        if let Err(err) = parse(&source) {
            prop_assert!(err.position <= source.len());
            prop_assert!(!err.expected.is_empty());
        }
    }

    /// Parenthesized nesting is accepted up to the nesting limit
    #[test]
    fn parser_handles_deep_nesting(depth in 1usize..(MAX_NESTING + 40)) {
        let source = format!("fn f(){{{}2{}}}", "(".repeat(depth), ")".repeat(depth));
        prop_assert_eq!(parse(&source).is_ok(), depth <= MAX_NESTING);
    }

    /// Unbalanced parentheses are reported, never panic
    #[test]
    fn parser_handles_unbalanced_parens(opens in 0usize..50, closes in 0usize..50) {
        let source = format!("fn f(){{{}1{}}}", "(".repeat(opens), ")".repeat(closes));
        prop_assert_eq!(parse(&source).is_ok(), opens == closes);
    }

    /// The full pipeline never panics on arbitrary input
    #[test]
    fn full_pipeline_never_panics(source in token_soup()) {
        let _ = Compiler::new(CompileOptions::default()).compile(&source);
    }
}

// =============================================================================
// SEMANTIC PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Printing then re-parsing yields a structurally equal AST
    #[test]
    fn print_then_parse_round_trips(program in valid_program()) {
        let printed = program.to_string();
        let reparsed = parse(&printed);
        prop_assert_eq!(reparsed, Ok(program), "printed as:\n{}", printed);
    }

    /// Compiled functions compute what the AST says
    #[test]
    fn compiled_code_matches_reference(program in valid_program(), args in arguments()) {
        match compile_at(&program, 0) {
            Ok(result) => {
                let interp = Interpreter::new(&result.module);
                for function in &program.functions {
                    let args = &args[..function.params.len()];
                    prop_assert_eq!(
                        interp.call(&function.name, args).ok(),
                        eval_function(function, args),
                        "function {}", function
                    );
                }
            }
            Err(Error::Lower(err)) => {
                for (name, error) in err.flatten() {
                    prop_assert_eq!(error, &LowerError::DivisionByZeroLiteral);
                    let function = name.and_then(|n| program.function(n));
                    prop_assert!(function.is_some());
                    if let Some(function) = function {
                        let args = &args[..function.params.len()];
                        prop_assert_eq!(eval_function(function, args), None);
                    }
                }
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Optimization never changes what a function returns
    #[test]
    fn optimizer_preserves_results(program in valid_program(), args in arguments()) {
        if let Ok(plain) = compile_at(&program, 0) {
            for level in 1..=2 {
                let optimized = compile_at(&program, level).unwrap();
                prop_assert!(optimized.ir_instruction_count <= plain.ir_instruction_count);

                let before = Interpreter::new(&plain.module);
                let after = Interpreter::new(&optimized.module);
                for function in &program.functions {
                    let args = &args[..function.params.len()];
                    prop_assert_eq!(
                        before.call(&function.name, args).ok(),
                        after.call(&function.name, args).ok()
                    );
                }
            }
        }
    }

    /// Parallel lowering produces exactly the sequential module
    #[test]
    fn parallel_lowering_matches_sequential(program in valid_program()) {
        prop_assert_eq!(
            lower_parallel(&program, "m"),
            lower_module(&program, "m")
        );
    }

    /// Compiling the same source twice gives identical modules
    #[test]
    fn compilation_is_deterministic(program in valid_program()) {
        let source = program.to_string();
        let compiler = Compiler::new(CompileOptions::default());
        let first = compiler.compile(&source).map(|r| r.module);
        let second = compiler.compile(&source).map(|r| r.module);
        prop_assert_eq!(first, second);
    }
}

// =============================================================================
// SPECIFIC REGRESSION TESTS
// =============================================================================

#[test]
fn regression_empty_input() {
    let program = parse("").unwrap();
    assert!(program.functions.is_empty());
}

#[test]
fn regression_only_whitespace() {
    assert!(parse("   \n\t\r\n   ").unwrap().functions.is_empty());
}

#[test]
fn regression_null_bytes() {
    let err = parse("fn f(){\0 1}").unwrap_err();
    assert_eq!(err.position, 7);
}

#[test]
fn regression_very_long_number() {
    let source = format!("fn f(){{1 + {}}}", "9".repeat(1000));
    let err = parse(&source).unwrap_err();
    assert_eq!(err.position, 11);
}

#[test]
fn regression_i64_max_literal() {
    let source = format!("fn f(){{{}}}", i64::MAX);
    let result = Compiler::new(CompileOptions::default()).compile(&source).unwrap();
    assert_eq!(Interpreter::new(&result.module).call("f", &[]), Ok(i64::MAX));
}

#[test]
fn regression_many_functions() {
    let source: String = (0..500).map(|i| format!("fn f{}(x){{x+{}}}\n", i, i)).collect();
    let result = Compiler::new(CompileOptions {
        parallel: true,
        ..Default::default()
    })
    .compile(&source)
    .unwrap();
    assert_eq!(result.function_count, 500);
    assert_eq!(result.module.functions[499].name, "f499");
}
