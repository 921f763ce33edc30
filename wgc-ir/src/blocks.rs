//! Basic Block Management
//! 
//! Defines basic blocks - sequences of instructions with single entry/exit points.

use serde::{Deserialize, Serialize};
use std::fmt;
use wgc_common::BlockId;
use crate::Instruction;

/// Basic Block - a sequence of instructions with a single entry and exit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub name: String,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(id: BlockId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            instructions: Vec::new(),
        }
    }
    
    pub fn add_instruction(&mut self, instr: Instruction) {
        self.instructions.push(instr);
    }
    
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
    
    pub fn has_terminator(&self) -> bool {
        self.instructions.last().is_some_and(Instruction::is_terminator)
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|instr| instr.is_terminator())
    }

    /// Position of the terminator in `instructions`
    pub fn terminator_index(&self) -> Option<usize> {
        if self.has_terminator() {
            Some(self.instructions.len() - 1)
        } else {
            None
        }
    }

    /// Position of the first instruction that is not a phi node
    pub fn first_non_phi_index(&self) -> usize {
        self.instructions
            .iter()
            .position(|instr| !instr.is_phi())
            .unwrap_or(self.instructions.len())
    }

    /// Position of the first barrier in the block
    pub fn find_barrier(&self) -> Option<usize> {
        self.instructions.iter().position(Instruction::is_barrier)
    }

    pub fn successors(&self) -> Vec<BlockId> {
        self.terminator().map(Instruction::successors).unwrap_or_default()
    }

    /// Append a suffix to the block name (".loopbarrier", ".phibarrier", ...)
    pub fn append_name_suffix(&mut self, suffix: &str) {
        self.name.push_str(suffix);
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:  ; {}", self.name, self.id)?;
        for instr in &self.instructions {
            writeln!(f, "  {instr}")?;
        }
        Ok(())
    }
}
