//! # minifn - a minimal function language
//!
//! A small compiler front end for integer function definitions:
//!
//! ```text
//! fn add(x, y) { x + y }
//! fn main() { 1 + 2 * 3 }
//! ```
//!
//! A program is a sequence of functions. Each function takes zero or more
//! i64 parameters and returns the value of one arithmetic expression over
//! integer literals, its parameters and `+ - * /`.
//!
//! ## Quick Start
//!
//! ### Basic Usage
//!
//! Compile source text to IR and run a function:
//!
//! ```rust
//! use minifn::{CompileOptions, Compiler, Interpreter};
//!
//! # fn main() -> minifn::Result<()> {
//! let compiler = Compiler::new(CompileOptions::default());
//! let result = compiler.compile("fn main() { 1 + 2 * 3 }")?;
//!
//! let interp = Interpreter::new(&result.module);
//! assert_eq!(interp.run_main()?, 7);
//! # Ok(())
//! # }
//! ```
//!
//! ### Step by Step
//!
//! Each phase is usable on its own:
//!
//! ```rust
//! use minifn::compiler::{lower, Optimizer};
//! use minifn::{Parser, Scanner};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Tokenize (scan)
//! let tokens = Scanner::new("fn scale(n) { n * 2 - 1 }").scan_tokens();
//!
//! // Parse into AST
//! let program = Parser::new(tokens).parse()?;
//! assert_eq!(program.functions[0].params, vec!["n"]);
//!
//! // Lower to IR and optimize
//! let mut module = lower(&program)?;
//! Optimizer::new(2).optimize(&mut module);
//!
//! println!("{}", module);
//! # Ok(())
//! # }
//! ```
//!
//! ## Language Overview
//!
//! - `*` and `/` bind tighter than `+` and `-`; all four are left-associative
//! - Parentheses group a product or quotient: `a / (b * c)`
//! - Arithmetic wraps on overflow; `/` truncates toward zero
//! - Identifiers start with a letter or `_`; `fn` is the only keyword
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → AST → Lowering → IR → Optimizer
//! ```
//!
//! ### Main Components
//!
//! - [`Scanner`] - Tokenizes source code into tokens
//! - [`Parser`] - Parses tokens into an Abstract Syntax Tree (AST)
//! - [`compiler::lower`] - Lowers the AST through an [`compiler::IrBuilder`]
//! - [`Compiler`] - Runs the whole pipeline according to [`CompileOptions`]
//! - [`Interpreter`] - Executes functions of an IR module
//!
//! ## Error Handling
//!
//! Syntax errors point at the furthest token the parser reached:
//!
//! ```rust
//! use minifn::parse;
//!
//! let err = parse("fn f( {1}").unwrap_err();
//! assert_eq!(err.position, 6);
//! assert_eq!(err.message, "expected identifier or `)`, found `{`");
//! ```

/// Version of the minifn crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;

// Re-export main types
pub use compiler::{CompileOptions, CompileResult, Compiler, Interpreter, IrModule};
pub use error::{Error, ErrorSeverity, ExecError, LowerError, ParseError, Result};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::{parse, Atom, Block, Expression, Function, Operation, Operator, Parser, Program};
