//! minifn Parser Module
//!
//! Parses `fn name(params) { expr }` definitions into an Abstract Syntax Tree (AST).

mod ast;
#[allow(clippy::module_inception)]
mod parser;

pub use ast::{Atom, Block, Expression, Function, Operation, Operator, Program};
pub use parser::{parse, Parser, MAX_NESTING};
