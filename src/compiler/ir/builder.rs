//! Builder interface for emitting IR
//!
//! Lowering talks to its target only through [`IrBuilder`]: create a
//! function, append a block, position at its end and emit instructions.
//! [`ModuleBuilder`] is the in-memory implementation producing an
//! [`IrModule`].

use super::instruction::{IrBinaryOp, IrInstruction, IrReg};
use super::program::{BasicBlock, IrFunction, IrModule};
use crate::error::BuilderError;

/// Handle to a function created by a builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub usize);

/// Handle to a basic block of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId {
    /// Owning function
    pub function: FunctionId,
    /// Index within the function's block list
    pub index: usize,
}

/// Target IR construction interface
pub trait IrBuilder {
    /// Declare a function with one i64 parameter per name and an i64 result
    fn create_function(&mut self, name: &str, params: &[String]) -> Result<FunctionId, BuilderError>;

    /// Register holding parameter `index` of `function`
    fn param(&self, function: FunctionId, index: usize) -> Result<IrReg, BuilderError>;

    /// Append an empty block to `function`
    fn append_block(&mut self, function: FunctionId, label: &str) -> Result<BlockId, BuilderError>;

    /// Direct subsequent emits to the end of `block`
    fn position_at_end(&mut self, block: BlockId) -> Result<(), BuilderError>;

    /// Emit `dst = value`
    fn build_const(&mut self, value: i64) -> Result<IrReg, BuilderError>;

    /// Emit `dst = lhs op rhs`
    fn build_binary(&mut self, op: IrBinaryOp, lhs: IrReg, rhs: IrReg) -> Result<IrReg, BuilderError>;

    /// Emit `ret value`, terminating the current block
    fn build_return(&mut self, value: IrReg) -> Result<(), BuilderError>;

    /// Remove a partially built function from the output
    fn delete_function(&mut self, function: FunctionId) -> Result<(), BuilderError>;
}

/// In-memory [`IrBuilder`] producing an [`IrModule`]
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    name: String,
    /// Deleted functions leave a `None` so handles stay valid
    functions: Vec<Option<IrFunction>>,
    position: Option<BlockId>,
}

impl ModuleBuilder {
    /// Create a builder for a module called `name`
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            functions: Vec::new(),
            position: None,
        }
    }

    /// Live function behind a handle
    pub fn function(&self, id: FunctionId) -> Option<&IrFunction> {
        self.functions.get(id.0).and_then(Option::as_ref)
    }

    /// Number of live functions
    pub fn function_count(&self) -> usize {
        self.functions.iter().flatten().count()
    }

    /// Consume the builder, yielding the live functions in creation order
    pub fn finish(self) -> IrModule {
        IrModule {
            name: self.name,
            functions: self.functions.into_iter().flatten().collect(),
        }
    }

    fn function_mut(&mut self, id: FunctionId) -> Result<&mut IrFunction, BuilderError> {
        self.functions
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(BuilderError::UnknownFunction(id.0))
    }

    /// Function and block at the insertion point
    fn insertion(&mut self) -> Result<(&mut IrFunction, usize), BuilderError> {
        let pos = self.position.ok_or(BuilderError::NotPositioned)?;
        let function = self.function_mut(pos.function)?;
        if pos.index >= function.blocks.len() {
            return Err(BuilderError::UnknownBlock {
                function: pos.function.0,
                block: pos.index,
            });
        }
        let block = &function.blocks[pos.index];
        if block.is_terminated() {
            return Err(BuilderError::BlockTerminated(block.label.clone()));
        }
        Ok((function, pos.index))
    }

    fn emit(&mut self, make: impl FnOnce(&mut IrFunction) -> IrInstruction) -> Result<(), BuilderError> {
        let (function, block) = self.insertion()?;
        let instr = make(function);
        function.blocks[block].instructions.push(instr);
        Ok(())
    }
}

impl IrBuilder for ModuleBuilder {
    fn create_function(&mut self, name: &str, params: &[String]) -> Result<FunctionId, BuilderError> {
        self.functions.push(Some(IrFunction::new(name, params.to_vec())));
        Ok(FunctionId(self.functions.len() - 1))
    }

    fn param(&self, function: FunctionId, index: usize) -> Result<IrReg, BuilderError> {
        let f = self
            .function(function)
            .ok_or(BuilderError::UnknownFunction(function.0))?;
        if index < f.arity() {
            Ok(IrReg(index as u32))
        } else {
            Err(BuilderError::ParamOutOfRange {
                index,
                count: f.arity(),
            })
        }
    }

    fn append_block(&mut self, function: FunctionId, label: &str) -> Result<BlockId, BuilderError> {
        let f = self.function_mut(function)?;
        f.blocks.push(BasicBlock::new(label));
        Ok(BlockId {
            function,
            index: f.blocks.len() - 1,
        })
    }

    fn position_at_end(&mut self, block: BlockId) -> Result<(), BuilderError> {
        let f = self.function_mut(block.function)?;
        if block.index >= f.blocks.len() {
            return Err(BuilderError::UnknownBlock {
                function: block.function.0,
                block: block.index,
            });
        }
        self.position = Some(block);
        Ok(())
    }

    fn build_const(&mut self, value: i64) -> Result<IrReg, BuilderError> {
        let mut dst = IrReg(0);
        self.emit(|f| {
            dst = f.alloc_reg();
            IrInstruction::ConstI64(dst, value)
        })?;
        Ok(dst)
    }

    fn build_binary(&mut self, op: IrBinaryOp, lhs: IrReg, rhs: IrReg) -> Result<IrReg, BuilderError> {
        let mut dst = IrReg(0);
        self.emit(|f| {
            dst = f.alloc_reg();
            op.instruction(dst, lhs, rhs)
        })?;
        Ok(dst)
    }

    fn build_return(&mut self, value: IrReg) -> Result<(), BuilderError> {
        self.emit(|_| IrInstruction::Return(value))
    }

    fn delete_function(&mut self, function: FunctionId) -> Result<(), BuilderError> {
        let slot = self
            .functions
            .get_mut(function.0)
            .ok_or(BuilderError::UnknownFunction(function.0))?;
        *slot = None;
        if self.position.map(|p| p.function) == Some(function) {
            self.position = None;
        }
        Ok(())
    }
}
