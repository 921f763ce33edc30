//! Work-group Kernel Compiler - Intermediate Representation
//! 
//! This crate defines the IR the kernel passes operate on, together with
//! the analyses they consume.
//! 
//! ## Architecture
//! 
//! - `types` - Type system (IrType, AddressSpace)
//! - `values` - Value representations
//! - `ops` - Binary operators, comparison predicates, casts
//! - `instructions` - IR instructions, including barriers
//! - `blocks` - Basic block management
//! - `function` - Function definitions and the block arena
//! - `module` - Module, global variables, linkage
//! - `metadata` - Named metadata tables
//! - `builder` - IR construction utilities
//! - `barrier` - Barrier factory and predicate
//! - `transform` - Block splitting and body cloning
//! - `analysis` - Dominator tree, loop info, data layout

pub use self::types::{AddressSpace, IrType};
pub use self::values::{Value, ValueMap};
pub use self::ops::{CastOp, CmpPredicate, IrBinaryOp};
pub use self::instructions::Instruction;
pub use self::blocks::BasicBlock;
pub use self::function::{Function, Parameter};
pub use self::module::{GlobalVariable, Linkage, Module};
pub use self::metadata::{
    MetadataNode, MetadataOperand, NamedMetadata, KERNELS_METADATA, KERNEL_WG_SIZE_METADATA,
};
pub use self::builder::IrBuilder;
pub use self::barrier::Barrier;
pub use self::transform::{clone_function_into, split_block};
pub use wgc_common::{BlockId, FunctionId, GlobalId, PassError, TempId};

mod types;
mod values;
mod ops;
mod instructions;
mod blocks;
mod function;
mod module;
mod metadata;
mod builder;
mod barrier;
mod transform;
pub mod analysis;
