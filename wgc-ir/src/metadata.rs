//! Named Metadata
//! 
//! Module-level tables of metadata nodes. Kernel tables reference
//! functions by identity through `MetadataOperand::Function`.

use serde::{Deserialize, Serialize};
use std::fmt;
use wgc_common::FunctionId;

/// Table listing the kernels of a module
pub const KERNELS_METADATA: &str = "opencl.kernels";

/// Table of required work-group sizes, first operand is the kernel
pub const KERNEL_WG_SIZE_METADATA: &str = "opencl.kernel_wg_size_info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataOperand {
    Function(FunctionId),
    Int(i64),
    String(String),
    Null,
}

/// A metadata node: an ordered tuple of operands
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataNode {
    pub operands: Vec<MetadataOperand>,
}

impl MetadataNode {
    pub fn new(operands: Vec<MetadataOperand>) -> Self {
        Self { operands }
    }

    /// Function referenced by the first operand, if it is one
    pub fn first_function(&self) -> Option<FunctionId> {
        match self.operands.first() {
            Some(MetadataOperand::Function(id)) => Some(*id),
            _ => None,
        }
    }
}

/// A named, module-scoped list of metadata nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedMetadata {
    pub name: String,
    pub operands: Vec<MetadataNode>,
}

impl NamedMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operands: Vec::new(),
        }
    }

    pub fn add_operand(&mut self, node: MetadataNode) {
        self.operands.push(node);
    }

    pub fn num_operands(&self) -> usize {
        self.operands.len()
    }
}

impl fmt::Display for MetadataOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataOperand::Function(id) => write!(f, "@{id}"),
            MetadataOperand::Int(value) => write!(f, "i32 {value}"),
            MetadataOperand::String(text) => write!(f, "!\"{text}\""),
            MetadataOperand::Null => write!(f, "null"),
        }
    }
}

impl fmt::Display for MetadataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{{")?;
        for (i, op) in self.operands.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{op}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for NamedMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{} = !{{", self.name)?;
        for (i, node) in self.operands.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            write!(f, "{node}")?;
        }
        write!(f, "}}")
    }
}
