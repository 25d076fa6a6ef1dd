//! IR module, function and basic block definitions

use super::instruction::{IrInstruction, IrReg};
use serde::{Deserialize, Serialize};

/// Basic block: straight-line instructions ending in a terminator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    /// Label identifying this basic block
    pub label: String,
    /// IR instructions in this block
    pub instructions: Vec<IrInstruction>,
}

impl BasicBlock {
    /// Create a new basic block with the given label
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            instructions: Vec::new(),
        }
    }

    /// True once the block ends in a terminator
    pub fn is_terminated(&self) -> bool {
        self.instructions
            .last()
            .map(IrInstruction::is_terminator)
            .unwrap_or(false)
    }
}

/// Symbol visibility of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Linkage {
    /// Visible outside the module
    #[default]
    External,
}

/// A function taking `params.len()` i64 values and returning one i64.
///
/// Parameter `i` arrives in register `%i`; every other register is written
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrFunction {
    /// Symbol name
    pub name: String,
    /// Parameter names in declared order
    pub params: Vec<String>,
    /// Visibility
    pub linkage: Linkage,
    /// Basic blocks; the first is the entry block
    pub blocks: Vec<BasicBlock>,
    /// Number of registers in use, parameters included
    pub register_count: u32,
}

impl IrFunction {
    /// Create a function with no blocks
    pub fn new(name: &str, params: Vec<String>) -> Self {
        let register_count = params.len() as u32;
        Self {
            name: name.to_string(),
            params,
            linkage: Linkage::External,
            blocks: Vec::new(),
            register_count,
        }
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Entry block, if any block has been appended
    pub fn entry(&self) -> Option<&BasicBlock> {
        self.blocks.first()
    }

    /// All instructions across all blocks, in block order
    pub fn instructions(&self) -> impl Iterator<Item = &IrInstruction> {
        self.blocks.iter().flat_map(|b| b.instructions.iter())
    }

    /// Total instruction count
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions.len()).sum()
    }

    /// Hand out the next unused register
    pub fn alloc_reg(&mut self) -> IrReg {
        let reg = IrReg(self.register_count);
        self.register_count += 1;
        reg
    }
}

/// Complete IR module
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IrModule {
    /// Module name
    pub name: String,
    /// Functions in declaration order
    pub functions: Vec<IrFunction>,
}

impl IrModule {
    /// Create a new empty IR module
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            functions: Vec::new(),
        }
    }

    /// Look up a function by name
    pub fn function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Total instruction count across all functions
    pub fn instruction_count(&self) -> usize {
        self.functions.iter().map(IrFunction::instruction_count).sum()
    }
}
