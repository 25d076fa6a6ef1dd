//! # minifn Compiler - function definitions to IR
//!
//! This module lowers parsed minifn programs to a three-address-code IR
//! that can be inspected, optimized, exported or run by the interpreter.
//!
//! ## Architecture
//!
//! ```text
//! minifn Source → Tokens → AST → IR → Optimize → Validate
//! ```
//!
//! ## Usage
//!
//! ```
//! use minifn::compiler::{CompileOptions, Compiler, Interpreter};
//!
//! let compiler = Compiler::new(CompileOptions::default());
//! let result = compiler.compile("fn add(x, y) { x + y }")?;
//! assert_eq!(Interpreter::new(&result.module).call("add", &[3, 4])?, 7);
//! # Ok::<(), minifn::Error>(())
//! ```

pub mod debug;
pub mod interp;
pub mod ir;
pub mod lower;
pub mod optimizer;

pub use debug::{debug_compile, dump_ir, format_ir_instr, module_from_json, module_to_json, validate_module};
pub use interp::Interpreter;
pub use ir::{
    BasicBlock, BlockId, FunctionId, IrBinaryOp, IrBuilder, IrFunction, IrInstruction, IrModule,
    IrReg, Linkage, ModuleBuilder,
};
pub use lower::{lower, lower_function, lower_module, lower_parallel};
pub use optimizer::Optimizer;

use crate::lexer::Scanner;
use crate::parser::{Atom, Expression, Parser, Program};
use crate::{Error, Result};
use std::collections::HashSet;

/// IR validation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationMode {
    /// Skip IR validation entirely
    Skip,
    /// Report validation failures as warnings but keep the module
    Warn,
    /// Fail compilation on any validation failure
    #[default]
    Require,
}

/// Compilation options
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Optimization level (0-2)
    pub opt_level: u8,
    /// Name of the produced module
    pub module_name: String,
    /// Lower functions on the rayon thread pool
    pub parallel: bool,
    /// What to do with IR validation failures
    pub verification_mode: VerificationMode,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            opt_level: 1,
            module_name: lower::DEFAULT_MODULE_NAME.to_string(),
            parallel: false,
            verification_mode: VerificationMode::Require,
        }
    }
}

/// Compilation result with metadata
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// The lowered (and optimized) module
    pub module: IrModule,
    /// Number of IR instructions after optimization
    pub ir_instruction_count: usize,
    /// Number of functions in the module
    pub function_count: usize,
    /// Warnings generated during compilation
    pub warnings: Vec<String>,
}

/// minifn to IR compiler
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a new compiler with options
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Options this compiler was created with
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile minifn source code to an IR module
    pub fn compile(&self, source: &str) -> Result<CompileResult> {
        // Phase 1: Parse
        let tokens = Scanner::new(source).scan_tokens();
        let program = Parser::new(tokens).parse()?;
        tracing::debug!(functions = program.functions.len(), "parsed source");

        self.compile_ast(&program)
    }

    /// Compile from already-parsed AST
    pub fn compile_ast(&self, program: &Program) -> Result<CompileResult> {
        let mut warnings = unused_parameter_warnings(program);

        // Phase 2: Lower
        let mut module = if self.options.parallel {
            lower_parallel(program, &self.options.module_name)?
        } else {
            lower_module(program, &self.options.module_name)?
        };

        // Phase 3: Optimize
        let mut optimizer = Optimizer::new(self.options.opt_level);
        optimizer.optimize(&mut module);

        // Phase 4: Validate
        warnings.extend(self.run_validation(&module)?);

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        Ok(CompileResult {
            ir_instruction_count: module.instruction_count(),
            function_count: module.functions.len(),
            module,
            warnings,
        })
    }

    /// Check the module and handle problems according to the verification mode
    fn run_validation(&self, module: &IrModule) -> Result<Vec<String>> {
        if self.options.verification_mode == VerificationMode::Skip {
            return Ok(Vec::new());
        }

        let problems = validate_module(module);
        if problems.is_empty() {
            return Ok(Vec::new());
        }

        match self.options.verification_mode {
            VerificationMode::Require => Err(Error::compiler(format!(
                "IR validation failed: {}",
                problems.join("; ")
            ))),
            _ => Ok(problems
                .into_iter()
                .map(|p| format!("IR validation: {}", p))
                .collect()),
        }
    }
}

/// One warning per declared parameter the body never reads
fn unused_parameter_warnings(program: &Program) -> Vec<String> {
    fn collect<'a>(expr: &'a Expression, used: &mut HashSet<&'a str>) {
        for atom in expr.atoms() {
            match atom {
                Atom::VariableRef(name) => {
                    used.insert(name.as_str());
                }
                Atom::NestedExpression(inner) => collect(inner, used),
                Atom::IntegerLiteral(_) => {}
            }
        }
    }

    let mut warnings = Vec::new();
    for function in &program.functions {
        let mut used = HashSet::new();
        collect(&function.body.ret, &mut used);
        for param in &function.params {
            if !used.contains(param.as_str()) {
                warnings.push(format!(
                    "parameter `{}` of function `{}` is never used",
                    param, function.name
                ));
            }
        }
    }
    warnings
}
