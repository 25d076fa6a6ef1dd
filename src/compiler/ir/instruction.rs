//! IR instruction definitions

use serde::{Deserialize, Serialize};

/// Virtual register, numbered per function from 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IrReg(pub u32);

/// Binary arithmetic operation on i64 values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IrBinaryOp {
    /// Wrapping addition
    Add,
    /// Wrapping subtraction
    Sub,
    /// Wrapping multiplication
    Mul,
    /// Signed division truncating toward zero
    Div,
}

impl IrBinaryOp {
    /// Evaluate the operation.
    ///
    /// Returns `None` for a zero divisor and for `i64::MIN / -1`.
    pub fn apply(self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            IrBinaryOp::Add => Some(lhs.wrapping_add(rhs)),
            IrBinaryOp::Sub => Some(lhs.wrapping_sub(rhs)),
            IrBinaryOp::Mul => Some(lhs.wrapping_mul(rhs)),
            IrBinaryOp::Div => lhs.checked_div(rhs),
        }
    }

    /// Mnemonic used in the text listing
    pub fn mnemonic(self) -> &'static str {
        match self {
            IrBinaryOp::Add => "add",
            IrBinaryOp::Sub => "sub",
            IrBinaryOp::Mul => "mul",
            IrBinaryOp::Div => "sdiv",
        }
    }

    /// Instruction computing `dst = lhs op rhs`
    pub fn instruction(self, dst: IrReg, lhs: IrReg, rhs: IrReg) -> IrInstruction {
        match self {
            IrBinaryOp::Add => IrInstruction::Add(dst, lhs, rhs),
            IrBinaryOp::Sub => IrInstruction::Sub(dst, lhs, rhs),
            IrBinaryOp::Mul => IrInstruction::Mul(dst, lhs, rhs),
            IrBinaryOp::Div => IrInstruction::Div(dst, lhs, rhs),
        }
    }
}

/// IR instruction (three-address code)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrInstruction {
    // Constants
    /// Load 64-bit integer constant into register
    ConstI64(IrReg, i64),

    // Arithmetic (dst = src1 op src2)
    /// Addition: dst = lhs + rhs
    Add(IrReg, IrReg, IrReg),
    /// Subtraction: dst = lhs - rhs
    Sub(IrReg, IrReg, IrReg),
    /// Multiplication: dst = lhs * rhs
    Mul(IrReg, IrReg, IrReg),
    /// Division: dst = lhs / rhs
    Div(IrReg, IrReg, IrReg),

    // Control flow
    /// Return the value in a register
    Return(IrReg),

    // No-op (placeholder, removed by optimizer)
    /// No operation (placeholder instruction, removed during optimization)
    Nop,
}

impl IrInstruction {
    /// Register written by this instruction
    pub fn dst(&self) -> Option<IrReg> {
        match self {
            IrInstruction::ConstI64(dst, _)
            | IrInstruction::Add(dst, _, _)
            | IrInstruction::Sub(dst, _, _)
            | IrInstruction::Mul(dst, _, _)
            | IrInstruction::Div(dst, _, _) => Some(*dst),
            IrInstruction::Return(_) | IrInstruction::Nop => None,
        }
    }

    /// Registers read by this instruction
    pub fn operands(&self) -> Vec<IrReg> {
        match self {
            IrInstruction::Add(_, a, b)
            | IrInstruction::Sub(_, a, b)
            | IrInstruction::Mul(_, a, b)
            | IrInstruction::Div(_, a, b) => vec![*a, *b],
            IrInstruction::Return(src) => vec![*src],
            IrInstruction::ConstI64(_, _) | IrInstruction::Nop => Vec::new(),
        }
    }

    /// Split a binary instruction into `(op, dst, lhs, rhs)`
    pub fn as_binary(&self) -> Option<(IrBinaryOp, IrReg, IrReg, IrReg)> {
        match *self {
            IrInstruction::Add(d, a, b) => Some((IrBinaryOp::Add, d, a, b)),
            IrInstruction::Sub(d, a, b) => Some((IrBinaryOp::Sub, d, a, b)),
            IrInstruction::Mul(d, a, b) => Some((IrBinaryOp::Mul, d, a, b)),
            IrInstruction::Div(d, a, b) => Some((IrBinaryOp::Div, d, a, b)),
            _ => None,
        }
    }

    /// True for instructions that end a basic block
    pub fn is_terminator(&self) -> bool {
        matches!(self, IrInstruction::Return(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_wraps() {
        assert_eq!(IrBinaryOp::Add.apply(i64::MAX, 1), Some(i64::MIN));
        assert_eq!(IrBinaryOp::Mul.apply(i64::MIN, -1), Some(i64::MIN));
        assert_eq!(IrBinaryOp::Sub.apply(i64::MIN, 1), Some(i64::MAX));
    }

    #[test]
    fn test_division_truncates_and_rejects_bad_divisors() {
        assert_eq!(IrBinaryOp::Div.apply(-7, 2), Some(-3));
        assert_eq!(IrBinaryOp::Div.apply(7, 0), None);
        assert_eq!(IrBinaryOp::Div.apply(i64::MIN, -1), None);
    }

    #[test]
    fn test_operands_and_dst() {
        let instr = IrBinaryOp::Sub.instruction(IrReg(2), IrReg(0), IrReg(1));
        assert_eq!(instr.dst(), Some(IrReg(2)));
        assert_eq!(instr.operands(), vec![IrReg(0), IrReg(1)]);
        assert_eq!(
            instr.as_binary(),
            Some((IrBinaryOp::Sub, IrReg(2), IrReg(0), IrReg(1)))
        );
        assert!(IrInstruction::Return(IrReg(2)).is_terminator());
        assert!(!instr.is_terminator());
    }
}
