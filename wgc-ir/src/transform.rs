//! CFG and body transformation utilities
//! 
//! Block splitting and whole-body cloning used by the passes.

use log::trace;
use wgc_common::{BlockId, PassError};
use crate::{Function, Instruction, ValueMap};

/// Split `block` before the instruction at `at`
///
/// Instructions `[at..]` move to a new block placed right after `block` in
/// the layout, `block` ends with a branch to the new block, and phi nodes
/// in the moved terminator's successors now name the new block as their
/// predecessor. The new block is named `<block>.split`.
pub fn split_block(function: &mut Function, block: BlockId, at: usize) -> Result<BlockId, PassError> {
    let len = function.block(block).instructions.len();
    if at >= len {
        return Err(PassError::invalid_ir(
            function.name.clone(),
            format!("split point {at} out of range in block '{}'", function.block(block).name),
        ));
    }

    let name = format!("{}.split", function.block(block).name);
    let new_block = function.create_block_after(block, name);

    let tail = function.block_mut(block).instructions.split_off(at);
    function.block_mut(block).add_instruction(Instruction::Branch(new_block));
    function.block_mut(new_block).instructions = tail;

    for succ in function.successors(new_block) {
        for instr in function.block_mut(succ).instructions.iter_mut() {
            instr.replace_phi_incoming_block(block, new_block);
        }
    }

    trace!("split {} at {} into {}", block, at, new_block);
    Ok(new_block)
}

/// Copy the body of `src` into `dst`, remapping operands through `value_map`
///
/// Block ids and temporaries are preserved, so only parameters and
/// globals need entries in the map. Values without an entry are copied
/// unchanged.
pub fn clone_function_into(dst: &mut Function, src: &Function, value_map: &ValueMap) {
    let (blocks, layout) = src.body();
    let mut blocks = blocks.to_vec();
    for block in blocks.iter_mut() {
        for instr in block.instructions.iter_mut() {
            instr.for_each_operand_mut(|value| {
                if let Some(mapped) = value_map.get(value) {
                    *value = mapped.clone();
                }
            });
        }
    }
    dst.set_body(blocks, layout.to_vec());
}
