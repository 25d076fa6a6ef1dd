//! Reference interpreter for IR modules
//!
//! Executes a function of an [`IrModule`] directly, with the same numeric
//! semantics a native target would have: wrapping `+ - *` and trapping
//! division.

use super::ir::{IrFunction, IrInstruction, IrModule, IrReg};
use crate::error::ExecError;
use std::collections::HashMap;

/// Entry point executed by [`Interpreter::run_main`]
pub const ENTRY_FUNCTION: &str = "main";

/// Executes functions of one module
pub struct Interpreter<'m> {
    module: &'m IrModule,
}

impl<'m> Interpreter<'m> {
    /// Create an interpreter over `module`
    pub fn new(module: &'m IrModule) -> Self {
        Self { module }
    }

    /// Call `name` with `args`, returning its result
    pub fn call(&self, name: &str, args: &[i64]) -> Result<i64, ExecError> {
        let function = self
            .module
            .function(name)
            .ok_or_else(|| ExecError::UndefinedFunction(name.to_string()))?;

        if args.len() != function.arity() {
            return Err(ExecError::ArityMismatch {
                function: name.to_string(),
                expected: function.arity(),
                got: args.len(),
            });
        }

        let result = Frame::new(function, args).run();
        tracing::trace!(function = name, ?args, ?result, "call");
        result
    }

    /// Call the zero-argument `main` function
    pub fn run_main(&self) -> Result<i64, ExecError> {
        self.call(ENTRY_FUNCTION, &[])
    }
}

/// Register file of one activation
///
/// Sparse, so a bogus `register_count` or register number in an imported
/// module costs nothing until it is actually written.
struct Frame<'f> {
    function: &'f IrFunction,
    registers: HashMap<IrReg, i64>,
}

impl<'f> Frame<'f> {
    fn new(function: &'f IrFunction, args: &[i64]) -> Self {
        let registers = args
            .iter()
            .enumerate()
            .map(|(i, value)| (IrReg(i as u32), *value))
            .collect();
        Self {
            function,
            registers,
        }
    }

    fn read(&self, reg: IrReg) -> Result<i64, ExecError> {
        self.registers
            .get(&reg)
            .copied()
            .ok_or(ExecError::UndefinedRegister(reg.0))
    }

    fn write(&mut self, reg: IrReg, value: i64) {
        self.registers.insert(reg, value);
    }

    /// Functions have no branches, so only the entry block ever runs
    fn run(mut self) -> Result<i64, ExecError> {
        let function = self.function;
        let Some(entry) = function.entry() else {
            return Err(ExecError::MissingReturn(function.name.clone()));
        };

        for instr in &entry.instructions {
            match instr {
                IrInstruction::ConstI64(dst, value) => self.write(*dst, *value),
                IrInstruction::Return(src) => return self.read(*src),
                IrInstruction::Nop => {}
                other => {
                    if let Some((op, dst, lhs, rhs)) = other.as_binary() {
                        let a = self.read(lhs)?;
                        let b = self.read(rhs)?;
                        let value = op.apply(a, b).ok_or(if b == 0 {
                            ExecError::DivisionByZero
                        } else {
                            ExecError::DivisionOverflow
                        })?;
                        self.write(dst, value);
                    }
                }
            }
        }

        Err(ExecError::MissingReturn(function.name.clone()))
    }
}
