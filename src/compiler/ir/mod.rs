//! # Intermediate Representation (IR) for minifn
//!
//! Functions lower to a three-address-code IR over virtual i64 registers.
//!
//! ## Module Structure
//!
//! ```text
//! ir/
//! ├── mod.rs          # This file - module definition and re-exports
//! ├── instruction.rs  # IrReg, IrBinaryOp, IrInstruction
//! ├── program.rs      # BasicBlock, IrFunction, IrModule
//! └── builder.rs      # IrBuilder trait and the in-memory ModuleBuilder
//! ```
//!
//! ## Key Types
//!
//! - [`IrReg`] - Virtual register; parameters occupy `%0..%n`
//! - [`IrInstruction`] - Constant load, arithmetic or return
//! - [`IrModule`] - Named list of functions in declaration order
//! - [`IrBuilder`] - Positioned emitter that lowering targets

mod builder;
mod instruction;
mod program;

pub use builder::{BlockId, FunctionId, IrBuilder, ModuleBuilder};
pub use instruction::{IrBinaryOp, IrInstruction, IrReg};
pub use program::{BasicBlock, IrFunction, IrModule, Linkage};
