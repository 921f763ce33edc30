//! Function Definitions
//! 
//! Functions own their basic blocks in an arena indexed by `BlockId`. The
//! arena never shrinks; `layout` gives the program order of the blocks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::collections::HashSet;
use wgc_common::{BlockId, PassError};
use crate::{BasicBlock, Instruction, IrType, Linkage};

/// Formal parameter of a function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: IrType,
}

/// Function in IR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: IrType,
    pub parameters: Vec<Parameter>,
    pub linkage: Linkage,
    pub is_vararg: bool,
    blocks: Vec<BasicBlock>,
    layout: Vec<BlockId>,
}

impl Function {
    pub fn new(name: impl Into<String>, return_type: IrType) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters: Vec::new(),
            linkage: Linkage::External,
            is_vararg: false,
            blocks: Vec::new(),
            layout: Vec::new(),
        }
    }

    /// Create a body-less function with the given signature
    pub fn with_type(name: impl Into<String>, fn_type: &IrType, linkage: Linkage) -> Option<Self> {
        let IrType::Function { return_type, param_types, is_vararg } = fn_type else {
            return None;
        };
        let mut function = Function::new(name, (**return_type).clone());
        function.linkage = linkage;
        function.is_vararg = *is_vararg;
        function.parameters = param_types
            .iter()
            .map(|ty| Parameter { name: String::new(), ty: ty.clone() })
            .collect();
        Some(function)
    }
    
    pub fn add_parameter(&mut self, name: impl Into<String>, ty: IrType) -> u32 {
        self.parameters.push(Parameter { name: name.into(), ty });
        (self.parameters.len() - 1) as u32
    }

    pub fn function_type(&self) -> IrType {
        IrType::Function {
            return_type: Box::new(self.return_type.clone()),
            param_types: self.parameters.iter().map(|p| p.ty.clone()).collect(),
            is_vararg: self.is_vararg,
        }
    }

    /// A function without a body
    pub fn is_declaration(&self) -> bool {
        self.layout.is_empty()
    }

    /// Move this function's name to `self`, leaving `other` unnamed
    pub fn take_name(&mut self, other: &mut Function) {
        self.name = std::mem::take(&mut other.name);
    }
    
    /// Create a new block at the end of the layout
    pub fn create_block(&mut self, name: impl Into<String>) -> BlockId {
        let id = self.alloc_block(name);
        self.layout.push(id);
        id
    }

    /// Create a new block placed right after `after` in the layout
    pub fn create_block_after(&mut self, after: BlockId, name: impl Into<String>) -> BlockId {
        let id = self.alloc_block(name);
        match self.layout.iter().position(|&b| b == after) {
            Some(pos) => self.layout.insert(pos + 1, id),
            None => self.layout.push(id),
        }
        id
    }

    fn alloc_block(&mut self, name: impl Into<String>) -> BlockId {
        let id = BlockId::from(self.blocks.len());
        self.blocks.push(BasicBlock::new(id, name));
        id
    }

    /// Panics if `id` does not belong to this function.
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }
    
    /// Panics if `id` does not belong to this function.
    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.index()]
    }

    pub fn get_block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(id.index())
    }

    /// Block ids in layout order
    pub fn block_ids(&self) -> &[BlockId] {
        &self.layout
    }

    /// Blocks in layout order
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> + '_ {
        self.layout.iter().map(|id| &self.blocks[id.index()])
    }

    pub fn num_blocks(&self) -> usize {
        self.layout.len()
    }

    /// Size of the block arena, an upper bound for `BlockId::index`
    pub fn block_capacity(&self) -> usize {
        self.blocks.len()
    }

    pub fn find_block(&self, name: &str) -> Option<BlockId> {
        self.blocks().find(|b| b.name == name).map(|b| b.id)
    }
    
    pub fn entry_block(&self) -> Option<BlockId> {
        self.layout.first().copied()
    }

    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        self.block(id).successors()
    }

    /// Distinct predecessors of `id`, in layout order
    pub fn predecessors(&self, id: BlockId) -> Vec<BlockId> {
        self.blocks()
            .filter(|b| b.successors().contains(&id))
            .map(|b| b.id)
            .collect()
    }

    /// Check the block graph is well formed
    ///
    /// Block ids match their arena slots, the layout lists arena blocks at
    /// most once, every laid out block ends with a terminator and every
    /// branch target and phi label is a laid out block.
    pub fn validate(&self) -> Result<(), PassError> {
        let invalid = |message: String| Err(PassError::invalid_ir(self.name.clone(), message));

        for (index, block) in self.blocks.iter().enumerate() {
            if block.id.index() != index {
                return invalid(format!("block '{}' has id {} in slot {index}", block.name, block.id));
            }
        }

        let mut laid_out = HashSet::new();
        for &id in &self.layout {
            if id.index() >= self.blocks.len() {
                return invalid(format!("layout refers to missing block {id}"));
            }
            if !laid_out.insert(id) {
                return invalid(format!("block {id} appears twice in the layout"));
            }
        }

        for block in self.blocks() {
            if !block.has_terminator() {
                return invalid(format!("block '{}' has no terminator", block.name));
            }
            for target in block.successors() {
                if !laid_out.contains(&target) {
                    return invalid(format!("block '{}' branches to missing block {target}", block.name));
                }
            }
            for instr in &block.instructions {
                let Instruction::Phi { incoming, .. } = instr else {
                    continue;
                };
                if let Some((_, label)) = incoming.iter().find(|(_, label)| !laid_out.contains(label)) {
                    return invalid(format!("phi in '{}' names missing block {label}", block.name));
                }
            }
        }
        Ok(())
    }

    /// Replace the body with a copy of `blocks` (same ids, same layout)
    pub(crate) fn set_body(&mut self, blocks: Vec<BasicBlock>, layout: Vec<BlockId>) {
        self.blocks = blocks;
        self.layout = layout;
    }

    pub(crate) fn body(&self) -> (&[BasicBlock], &[BlockId]) {
        (&self.blocks, &self.layout)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.is_declaration() { "declare" } else { "define" };
        write!(f, "{keyword} {} {} @{}(", self.linkage, self.return_type, self.name)?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 { write!(f, ", ")?; }
            if param.name.is_empty() {
                write!(f, "{} %arg{i}", param.ty)?;
            } else {
                write!(f, "{} %{}", param.ty, param.name)?;
            }
        }
        if self.is_vararg {
            write!(f, ", ...")?;
        }
        write!(f, ")")?;
        if self.is_declaration() {
            return writeln!(f);
        }
        writeln!(f, " {{")?;
        for block in self.blocks() {
            write!(f, "{block}")?;
        }
        writeln!(f, "}}")
    }
}
