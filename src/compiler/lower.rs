//! Lowering - transforms the AST into IR through an [`IrBuilder`]
//!
//! Each function becomes one target function with a single `entry` block.
//! Its expression is evaluated left to right: the first atom seeds an
//! accumulator and every operation emits `acc' = acc op operand`.
//!
//! A function lowers completely or not at all. If any part of it fails the
//! partially built function is deleted from the builder, and program-level
//! lowering keeps going so every failing function is reported at once.

use super::ir::{FunctionId, IrBinaryOp, IrBuilder, IrFunction, IrModule, IrReg, ModuleBuilder};
use crate::error::{FunctionError, LowerError};
use crate::parser::{Atom, Expression, Function, Operator, Program};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Module name used by [`lower`]
pub const DEFAULT_MODULE_NAME: &str = "main";

impl From<Operator> for IrBinaryOp {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Add => IrBinaryOp::Add,
            Operator::Sub => IrBinaryOp::Sub,
            Operator::Mul => IrBinaryOp::Mul,
            Operator::Div => IrBinaryOp::Div,
        }
    }
}

/// Lower a whole program into a module named [`DEFAULT_MODULE_NAME`]
pub fn lower(program: &Program) -> Result<IrModule, LowerError> {
    lower_module(program, DEFAULT_MODULE_NAME)
}

/// Lower a whole program, one function after another
pub fn lower_module(program: &Program, name: &str) -> Result<IrModule, LowerError> {
    let mut builder = ModuleBuilder::new(name);
    let duplicates = duplicate_flags(program);
    let mut errors = Vec::new();

    for (function, duplicate) in program.functions.iter().zip(duplicates) {
        let result = if duplicate {
            Err(LowerError::DuplicateFunction(function.name.clone()))
        } else {
            lower_function(&mut builder, function).map(|_| ())
        };
        if let Err(error) = result {
            errors.push(FunctionError {
                function: function.name.clone(),
                error,
            });
        }
    }

    finish(builder.finish(), errors)
}

/// Lower every function on the rayon pool, each into its own builder.
///
/// Functions are reassembled in declaration order, so the result equals
/// [`lower_module`] on the same input.
pub fn lower_parallel(program: &Program, name: &str) -> Result<IrModule, LowerError> {
    let duplicates = duplicate_flags(program);

    let lowered: Vec<_> = program
        .functions
        .par_iter()
        .zip(duplicates.into_par_iter())
        .map(|(function, duplicate)| -> Result<Vec<IrFunction>, LowerError> {
            if duplicate {
                return Err(LowerError::DuplicateFunction(function.name.clone()));
            }
            let mut builder = ModuleBuilder::new(name);
            lower_function(&mut builder, function)?;
            Ok(builder.finish().functions)
        })
        .collect();

    let mut module = IrModule::new(name);
    let mut errors = Vec::new();
    for (function, result) in program.functions.iter().zip(lowered) {
        match result {
            Ok(functions) => module.functions.extend(functions),
            Err(error) => errors.push(FunctionError {
                function: function.name.clone(),
                error,
            }),
        }
    }

    finish(module, errors)
}

fn finish(module: IrModule, errors: Vec<FunctionError>) -> Result<IrModule, LowerError> {
    if errors.is_empty() {
        tracing::debug!(
            module = %module.name,
            functions = module.functions.len(),
            "lowered module"
        );
        Ok(module)
    } else {
        tracing::debug!(failed = errors.len(), "lowering failed");
        Err(LowerError::Functions(errors))
    }
}

/// `true` for every function whose name was already used earlier
fn duplicate_flags(program: &Program) -> Vec<bool> {
    let mut seen = HashSet::new();
    program
        .functions
        .iter()
        .map(|f| !seen.insert(f.name.as_str()))
        .collect()
}

/// Lower one function through `builder`.
///
/// On failure nothing of the function remains in the builder.
pub fn lower_function<B: IrBuilder + ?Sized>(
    builder: &mut B,
    function: &Function,
) -> Result<FunctionId, LowerError> {
    let mut declared = HashSet::new();
    for param in &function.params {
        if !declared.insert(param.as_str()) {
            return Err(LowerError::DuplicateParameter(param.clone()));
        }
    }

    let id = builder.create_function(&function.name, &function.params)?;

    let lowered = FunctionLowering::new(builder, id).lower(function);
    match lowered {
        Ok(()) => {
            tracing::debug!(function = %function.name, params = function.params.len(), "lowered function");
            Ok(id)
        }
        Err(error) => {
            match builder.delete_function(id) {
                Ok(()) => tracing::debug!(function = %function.name, %error, "discarded function"),
                Err(delete_error) => tracing::warn!(
                    function = %function.name,
                    %error,
                    %delete_error,
                    "failed to discard function"
                ),
            }
            Err(error)
        }
    }
}

/// Register holding a value, plus the value itself when it is known at
/// compile time
#[derive(Debug, Clone, Copy)]
struct Value {
    reg: IrReg,
    constant: Option<i64>,
}

/// Per-function lowering state
struct FunctionLowering<'a, B: IrBuilder + ?Sized> {
    builder: &'a mut B,
    function: FunctionId,
    /// Parameter name to register mapping
    scope: HashMap<String, Value>,
}

impl<'a, B: IrBuilder + ?Sized> FunctionLowering<'a, B> {
    fn new(builder: &'a mut B, function: FunctionId) -> Self {
        Self {
            builder,
            function,
            scope: HashMap::new(),
        }
    }

    fn lower(&mut self, function: &Function) -> Result<(), LowerError> {
        for (index, name) in function.params.iter().enumerate() {
            let reg = self.builder.param(self.function, index)?;
            self.scope.insert(name.clone(), Value { reg, constant: None });
        }

        let entry = self.builder.append_block(self.function, "entry")?;
        self.builder.position_at_end(entry)?;

        let result = self.lower_expression(&function.body.ret)?;
        self.builder.build_return(result.reg)?;
        Ok(())
    }

    fn lower_expression(&mut self, expr: &Expression) -> Result<Value, LowerError> {
        let mut acc = self.lower_atom(&expr.first)?;

        for operation in &expr.rest {
            let rhs = self.lower_atom(&operation.operand)?;
            let op = IrBinaryOp::from(operation.op);

            if op == IrBinaryOp::Div && acc.constant.is_some() && rhs.constant == Some(0) {
                return Err(LowerError::DivisionByZeroLiteral);
            }

            let reg = self.builder.build_binary(op, acc.reg, rhs.reg)?;
            let constant = match (acc.constant, rhs.constant) {
                (Some(a), Some(b)) => op.apply(a, b),
                _ => None,
            };
            acc = Value { reg, constant };
        }

        Ok(acc)
    }

    fn lower_atom(&mut self, atom: &Atom) -> Result<Value, LowerError> {
        match atom {
            Atom::IntegerLiteral(n) => {
                let reg = self.builder.build_const(*n)?;
                Ok(Value {
                    reg,
                    constant: Some(*n),
                })
            }
            Atom::VariableRef(name) => self
                .scope
                .get(name)
                .copied()
                .ok_or_else(|| LowerError::UnknownVariable(name.clone())),
            Atom::NestedExpression(inner) => self.lower_expression(inner),
        }
    }
}
