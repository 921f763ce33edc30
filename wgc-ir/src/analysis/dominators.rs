//! Dominator tree
//! 
//! Iterative algorithm of Cooper, Harvey and Kennedy over the reverse
//! postorder of the CFG. Unreachable blocks have no immediate dominator.

use log::debug;
use wgc_common::{BlockId, PassError};
use crate::Function;

/// Dominance queries a pass may rely on
///
/// Passes receive this as a capability so tests can hand them a fake.
pub trait DominanceInfo {
    /// Does every path from the entry to `b` go through `a`?
    fn dominates(&self, a: BlockId, b: BlockId) -> bool;

    /// Record that `new` was split off the end of `old`
    fn add_split_block(&mut self, old: BlockId, new: BlockId);

    /// Check the analysis against the current CFG of `function`
    fn verify(&self, function: &Function) -> Result<(), PassError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DominatorTree {
    entry: Option<BlockId>,
    /// Immediate dominator per block index; the entry is its own idom
    idom: Vec<Option<BlockId>>,
}

impl DominatorTree {
    pub fn compute(function: &Function) -> Self {
        let capacity = function.block_capacity();
        let Some(entry) = function.entry_block() else {
            return Self { entry: None, idom: vec![None; capacity] };
        };

        let rpo = reverse_postorder(function, entry);
        let mut rpo_number = vec![usize::MAX; capacity];
        for (i, block) in rpo.iter().enumerate() {
            rpo_number[block.index()] = i;
        }

        let preds: Vec<Vec<BlockId>> = {
            let mut preds = vec![Vec::new(); capacity];
            for &block in &rpo {
                for succ in function.successors(block) {
                    if !preds[succ.index()].contains(&block) {
                        preds[succ.index()].push(block);
                    }
                }
            }
            preds
        };

        let mut idom: Vec<Option<BlockId>> = vec![None; capacity];
        idom[entry.index()] = Some(entry);

        let mut changed = true;
        while changed {
            changed = false;
            for &block in rpo.iter().skip(1) {
                let mut new_idom: Option<BlockId> = None;
                for &pred in &preds[block.index()] {
                    if idom[pred.index()].is_none() {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred,
                        Some(current) => intersect(&idom, &rpo_number, pred, current),
                    });
                }
                if new_idom.is_some() && idom[block.index()] != new_idom {
                    idom[block.index()] = new_idom;
                    changed = true;
                }
            }
        }

        Self { entry: Some(entry), idom }
    }

    /// Immediate dominator; `None` for the entry and unreachable blocks
    pub fn idom(&self, block: BlockId) -> Option<BlockId> {
        if Some(block) == self.entry {
            return None;
        }
        self.idom.get(block.index()).copied().flatten()
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.idom.get(block.index()).is_some_and(Option::is_some)
    }
}

impl DominanceInfo for DominatorTree {
    fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        if a == b {
            return true;
        }
        // Everything dominates an unreachable block, nothing is dominated
        // by one.
        if !self.is_reachable(b) {
            return true;
        }
        if !self.is_reachable(a) {
            return false;
        }
        let mut current = b;
        while let Some(parent) = self.idom(current) {
            if parent == a {
                return true;
            }
            current = parent;
        }
        false
    }

    fn add_split_block(&mut self, old: BlockId, new: BlockId) {
        if self.idom.len() <= new.index() {
            self.idom.resize(new.index() + 1, None);
        }
        if !self.is_reachable(old) {
            return;
        }
        for idom in self.idom.iter_mut() {
            if *idom == Some(old) {
                *idom = Some(new);
            }
        }
        // The entry is its own idom and was rewritten above if it was split.
        if let Some(entry) = self.entry {
            self.idom[entry.index()] = Some(entry);
        }
        self.idom[new.index()] = Some(old);
    }

    fn verify(&self, function: &Function) -> Result<(), PassError> {
        let fresh = DominatorTree::compute(function);
        for &block in function.block_ids() {
            let expected = fresh.idom(block);
            let actual = self.idom(block);
            if expected != actual || fresh.is_reachable(block) != self.is_reachable(block) {
                debug!("dominator tree mismatch at {}: have {:?}, expected {:?}", block, actual, expected);
                return Err(PassError::dominator_mismatch(
                    function.name.clone(),
                    format!(
                        "block '{}' has immediate dominator {:?}, expected {:?}",
                        function.block(block).name,
                        actual,
                        expected
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn intersect(idom: &[Option<BlockId>], rpo_number: &[usize], a: BlockId, b: BlockId) -> BlockId {
    let mut finger1 = a;
    let mut finger2 = b;
    while finger1 != finger2 {
        while rpo_number[finger1.index()] > rpo_number[finger2.index()] {
            finger1 = idom[finger1.index()].unwrap_or(finger1);
        }
        while rpo_number[finger2.index()] > rpo_number[finger1.index()] {
            finger2 = idom[finger2.index()].unwrap_or(finger2);
        }
    }
    finger1
}

/// Reverse postorder of the blocks reachable from `entry`
pub fn reverse_postorder(function: &Function, entry: BlockId) -> Vec<BlockId> {
    let mut visited = vec![false; function.block_capacity()];
    let mut postorder = Vec::with_capacity(function.num_blocks());
    let mut stack: Vec<(BlockId, usize)> = vec![(entry, 0)];
    visited[entry.index()] = true;

    while let Some((block, next)) = stack.pop() {
        let succs = function.successors(block);
        if next < succs.len() {
            stack.push((block, next + 1));
            let succ = succs[next];
            if !visited[succ.index()] {
                visited[succ.index()] = true;
                stack.push((succ, 0));
            }
        } else {
            postorder.push(block);
        }
    }

    postorder.reverse();
    postorder
}
