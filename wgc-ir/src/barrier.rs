//! Barrier markers
//! 
//! A barrier is `Instruction::Barrier`: it has no operands and no result,
//! only its position in the block matters.

use wgc_common::{BlockId, PassError};
use crate::{Function, Instruction};

/// Factory and predicate for barrier markers
pub struct Barrier;

impl Barrier {
    /// Insert a barrier in `block` before the instruction at `index`
    pub fn create(function: &mut Function, block: BlockId, index: usize) {
        function
            .block_mut(block)
            .instructions
            .insert(index, Instruction::Barrier);
    }

    /// Insert a barrier right before the terminator of `block`
    pub fn create_before_terminator(function: &mut Function, block: BlockId) -> Result<(), PassError> {
        let index = function.block(block).terminator_index().ok_or_else(|| {
            PassError::invalid_ir(
                function.name.clone(),
                format!("block '{}' has no terminator", function.block(block).name),
            )
        })?;
        Self::create(function, block, index);
        Ok(())
    }

    pub fn is_barrier(instr: &Instruction) -> bool {
        instr.is_barrier()
    }

    /// True when the instruction right before the terminator is a barrier
    pub fn ends_with_barrier(function: &Function, block: BlockId) -> bool {
        let block = function.block(block);
        match block.terminator_index() {
            Some(index) if index > 0 => Self::is_barrier(&block.instructions[index - 1]),
            _ => false,
        }
    }
}
