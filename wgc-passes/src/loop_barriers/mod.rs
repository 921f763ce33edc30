//! Loop barrier insertion
//! 
//! Work-items execute a kernel in lockstep between barriers. When a loop
//! body contains a barrier, every way into, around and out of one iteration
//! needs a barrier as well, so that replicating the body per work-item keeps
//! all of them in step:
//! 
//! - before the preheader terminator (`.loopbarrier`)
//! - after the header phis, if there are any (`.phibarrier`)
//! - before the terminator of the single exiting block (`.brexitbarrier`)
//! - before the terminator of the latches (`.latchbarrier`)
//! 
//! A loop without barriers only gets its preheader split when the preheader
//! ends with a barrier, so the loop can later be replicated as a whole.

use log::{debug, info, trace};
use wgc_ir::analysis::{DominanceInfo, DominatorTree, LoopId, LoopInfo};
use wgc_ir::{split_block, Barrier, BlockId, Function, FunctionId, Module, PassError};
use crate::KernelPredicate;

/// Loop pass adding the barriers a loop needs for lockstep execution
pub struct LoopBarriers<'a> {
    predicate: &'a dyn KernelPredicate,
}

impl<'a> LoopBarriers<'a> {
    pub fn new(predicate: &'a dyn KernelPredicate) -> Self {
        Self { predicate }
    }

    /// Run over every loop of every kernel, innermost loops first
    pub fn run_on_module(&self, module: &mut Module) -> Result<bool, PassError> {
        let mut changed = false;
        for id in module.function_ids() {
            if !self.predicate.is_kernel_to_process(module, id) {
                continue;
            }
            let function = module
                .function(id)
                .ok_or_else(|| PassError::UnknownFunction(id.to_string()))?;
            function.validate()?;
            let mut dt = DominatorTree::compute(function);
            let mut loops = LoopInfo::compute(function, &dt);
            info!("LoopBarriers: '{}' has {} loops", function.name, loops.len());

            for lp in loops.postorder() {
                changed |= self.run_on_loop(module, id, &mut loops, lp, &mut dt)?;
            }
        }
        Ok(changed)
    }

    /// Process one loop of `function` and check the dominator tree afterwards
    ///
    /// Loops of functions the kernel predicate rejects are left alone.
    pub fn run_on_loop(
        &self,
        module: &mut Module,
        function: FunctionId,
        loops: &mut LoopInfo,
        lp: LoopId,
        dt: &mut dyn DominanceInfo,
    ) -> Result<bool, PassError> {
        if !self.predicate.is_kernel_to_process(module, function) {
            return Ok(false);
        }
        let func = module
            .function_mut(function)
            .ok_or_else(|| PassError::UnknownFunction(function.to_string()))?;

        let changed = process_loop(func, loops, lp, dt)?;
        dt.verify(func)?;
        Ok(changed)
    }
}

/// Insert the barriers loop `lp` needs
///
/// The loop must have a preheader. Barriers already sitting at an insertion
/// point are reused, so running this twice adds nothing the second time.
///
/// Returns whether a barrier was inserted or a block split, not whether the
/// loop contains a barrier: a loop whose insertion points all hold barriers
/// already reports `false`.
pub fn process_loop(
    function: &mut Function,
    loops: &mut LoopInfo,
    lp: LoopId,
    dt: &mut dyn DominanceInfo,
) -> Result<bool, PassError> {
    let Some(l) = loops.get(lp).cloned() else {
        return Err(PassError::invalid_ir(function.name.clone(), format!("unknown loop {lp}")));
    };

    let preheader = l.preheader(function).ok_or_else(|| PassError::NonCanonicalLoop {
        function: function.name.clone(),
        header: function.block(l.header).name.clone(),
    })?;

    let barrier_block = l
        .blocks
        .iter()
        .copied()
        .find(|&block| function.block(block).find_barrier().is_some());

    let Some(barrier_block) = barrier_block else {
        return isolate_preheader_barrier(function, loops, preheader, dt);
    };

    debug!(
        "loop '{}' has a barrier in '{}'",
        function.block(l.header).name,
        function.block(barrier_block).name
    );
    trace!("preheader before insertion:\n{}", function.block(preheader));

    let mut changed = barrier_before_terminator(function, preheader, ".loopbarrier")?;

    // The replicated headers get merged later, the barrier goes after the phis.
    let header = l.header;
    let first_non_phi = function.block(header).first_non_phi_index();
    if first_non_phi != 0 {
        let already = function
            .block(header)
            .instructions
            .get(first_non_phi)
            .is_some_and(Barrier::is_barrier);
        if !already {
            Barrier::create(function, header, first_non_phi);
            function.block_mut(header).append_name_suffix(".phibarrier");
            changed = true;
        }
    }

    // Exiting block and latch differ when there is computation after the
    // exit decision.
    let exiting = l.exiting_block(function);
    if let Some(exiting) = exiting {
        changed |= barrier_before_terminator(function, exiting, ".brexitbarrier")?;
    }

    if let Some(latch) = l.loop_latch(function) {
        if Some(latch) != exiting {
            changed |= barrier_before_terminator(function, latch, ".latchbarrier")?;
        }
        return Ok(changed);
    }

    // Several latches: only those the barrier dominates belong to the same
    // tail of the loop.
    for latch in l.latches(function) {
        if dt.dominates(barrier_block, latch) {
            changed |= barrier_before_terminator(function, latch, ".latchbarrier")?;
        } else {
            debug!("latch '{}' not dominated by the barrier, skipped", function.block(latch).name);
        }
    }

    Ok(changed)
}

/// Put a barrier right before the terminator of `block` unless one is there
fn barrier_before_terminator(function: &mut Function, block: BlockId, suffix: &str) -> Result<bool, PassError> {
    if Barrier::ends_with_barrier(function, block) {
        trace!("'{}' already ends with a barrier", function.block(block).name);
        return Ok(false);
    }
    Barrier::create_before_terminator(function, block)?;
    function.block_mut(block).append_name_suffix(suffix);
    debug!("added barrier to '{}'", function.block(block).name);
    Ok(true)
}

/// Split a preheader that ends with a barrier so the loop is entered from a
/// barrier-free block
fn isolate_preheader_barrier(
    function: &mut Function,
    loops: &mut LoopInfo,
    preheader: BlockId,
    dt: &mut dyn DominanceInfo,
) -> Result<bool, PassError> {
    if !Barrier::ends_with_barrier(function, preheader) {
        return Ok(false);
    }
    let Some(terminator) = function.block(preheader).terminator_index() else {
        return Ok(false);
    };

    let new_block = split_block(function, preheader, terminator)?;
    let name = format!("{}.postbarrier_dummy", function.block(preheader).name);
    function.block_mut(new_block).name = name;
    dt.add_split_block(preheader, new_block);
    loops.add_block_like(preheader, new_block);

    debug!("split preheader '{}' after its barrier", function.block(preheader).name);
    Ok(true)
}

#[cfg(test)]
mod tests;
