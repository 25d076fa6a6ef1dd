//! # IR Optimizer for minifn
//!
//! Optimization passes for the IR:
//! - Constant folding
//! - Dead code elimination
//! - Common subexpression elimination
//! - Peephole optimizations (algebraic identities)
//!
//! Every pass works one function at a time. Registers are written exactly
//! once, so a pass may replace uses of one register with another without
//! tracking control flow.

use super::ir::{IrBinaryOp, IrFunction, IrInstruction, IrModule, IrReg};
use std::collections::{HashMap, HashSet};

/// Optimizer with configurable optimization level
pub struct Optimizer {
    level: u8,
}

impl Optimizer {
    /// Create a new optimizer with the specified optimization level (0-2)
    pub fn new(level: u8) -> Self {
        Self { level }
    }

    /// Optimization level this optimizer runs at
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Run all optimization passes
    pub fn optimize(&mut self, module: &mut IrModule) {
        let before = module.instruction_count();

        for function in module.functions.iter_mut() {
            self.optimize_function(function);
        }

        tracing::debug!(
            level = self.level,
            before,
            after = module.instruction_count(),
            "optimized module"
        );
    }

    /// Run all passes enabled at this level over one function
    pub fn optimize_function(&mut self, function: &mut IrFunction) {
        if self.level >= 1 {
            self.constant_folding(function);
        }

        if self.level >= 2 {
            self.common_subexpression_elimination(function);
            self.peephole_optimizations(function);
        }

        if self.level >= 1 {
            self.dead_code_elimination(function);
        }

        // Always remove Nops
        self.remove_nops(function);
    }

    /// Constant folding - evaluate constant expressions at compile time
    fn constant_folding(&mut self, function: &mut IrFunction) {
        let mut constants: HashMap<IrReg, i64> = HashMap::new();

        for instr in function.blocks.iter_mut().flat_map(|b| b.instructions.iter_mut()) {
            if let IrInstruction::ConstI64(dst, value) = instr {
                constants.insert(*dst, *value);
                continue;
            }

            let Some((op, dst, lhs, rhs)) = instr.as_binary() else {
                continue;
            };
            if let (Some(&a), Some(&b)) = (constants.get(&lhs), constants.get(&rhs)) {
                // Division by zero and `i64::MIN / -1` are left for the runtime
                if let Some(result) = op.apply(a, b) {
                    *instr = IrInstruction::ConstI64(dst, result);
                    constants.insert(dst, result);
                }
            }
        }
    }

    /// Dead code elimination - drop values nothing reads.
    ///
    /// Division is kept even when its result is unused, since it can trap.
    fn dead_code_elimination(&mut self, function: &mut IrFunction) {
        // Walk backwards so chains of dead values go in one pass
        let mut used_regs: HashSet<IrReg> = HashSet::new();

        for block in function.blocks.iter_mut().rev() {
            for instr in block.instructions.iter_mut().rev() {
                let removable = match &*instr {
                    IrInstruction::ConstI64(dst, _)
                    | IrInstruction::Add(dst, _, _)
                    | IrInstruction::Sub(dst, _, _)
                    | IrInstruction::Mul(dst, _, _) => !used_regs.contains(dst),
                    _ => false,
                };

                if removable {
                    *instr = IrInstruction::Nop;
                } else {
                    used_regs.extend(instr.operands());
                }
            }
        }
    }

    /// Common subexpression elimination
    fn common_subexpression_elimination(&mut self, function: &mut IrFunction) {
        let mut computed: HashMap<(IrBinaryOp, IrReg, IrReg), IrReg> = HashMap::new();
        let mut aliases: HashMap<IrReg, IrReg> = HashMap::new();

        for instr in function.blocks.iter_mut().flat_map(|b| b.instructions.iter_mut()) {
            rewrite_operands(instr, &aliases);

            let Some((op, dst, lhs, rhs)) = instr.as_binary() else {
                continue;
            };
            let key = match op {
                // Commutative: order the operands so `a+b` and `b+a` share a key
                IrBinaryOp::Add | IrBinaryOp::Mul => (op, lhs.min(rhs), lhs.max(rhs)),
                IrBinaryOp::Sub | IrBinaryOp::Div => (op, lhs, rhs),
            };

            if let Some(&existing) = computed.get(&key) {
                aliases.insert(dst, existing);
                *instr = IrInstruction::Nop;
            } else {
                computed.insert(key, dst);
            }
        }
    }

    /// Peephole optimizations - algebraic identities
    ///
    /// `x + 0`, `0 + x`, `x - 0`, `x * 1`, `1 * x` and `x / 1` become `x`;
    /// `x * 0` and `0 * x` become `0`.
    fn peephole_optimizations(&mut self, function: &mut IrFunction) {
        let mut constants: HashMap<IrReg, i64> = HashMap::new();
        let mut aliases: HashMap<IrReg, IrReg> = HashMap::new();

        for instr in function.blocks.iter_mut().flat_map(|b| b.instructions.iter_mut()) {
            rewrite_operands(instr, &aliases);

            if let IrInstruction::ConstI64(dst, value) = instr {
                constants.insert(*dst, *value);
                continue;
            }

            let Some((op, dst, lhs, rhs)) = instr.as_binary() else {
                continue;
            };
            let l = constants.get(&lhs).copied();
            let r = constants.get(&rhs).copied();

            let identity = match (op, l, r) {
                (IrBinaryOp::Add, _, Some(0))
                | (IrBinaryOp::Sub, _, Some(0))
                | (IrBinaryOp::Mul, _, Some(1))
                | (IrBinaryOp::Div, _, Some(1)) => Some(lhs),
                (IrBinaryOp::Add, Some(0), _) | (IrBinaryOp::Mul, Some(1), _) => Some(rhs),
                _ => None,
            };

            if let Some(src) = identity {
                aliases.insert(dst, src);
                *instr = IrInstruction::Nop;
            } else if op == IrBinaryOp::Mul && (l == Some(0) || r == Some(0)) {
                *instr = IrInstruction::ConstI64(dst, 0);
                constants.insert(dst, 0);
            }
        }
    }

    /// Remove Nop instructions
    fn remove_nops(&mut self, function: &mut IrFunction) {
        for block in function.blocks.iter_mut() {
            block
                .instructions
                .retain(|instr| !matches!(instr, IrInstruction::Nop));
        }
    }
}

/// Replace every read of an aliased register with its replacement
fn rewrite_operands(instr: &mut IrInstruction, aliases: &HashMap<IrReg, IrReg>) {
    if aliases.is_empty() {
        return;
    }
    let resolve = |reg: &mut IrReg| {
        if let Some(&to) = aliases.get(&*reg) {
            *reg = to;
        }
    };
    match instr {
        IrInstruction::Add(_, a, b)
        | IrInstruction::Sub(_, a, b)
        | IrInstruction::Mul(_, a, b)
        | IrInstruction::Div(_, a, b) => {
            resolve(a);
            resolve(b);
        }
        IrInstruction::Return(src) => resolve(src),
        IrInstruction::ConstI64(_, _) | IrInstruction::Nop => {}
    }
}
