//! Natural loop analysis
//! 
//! A back edge is an edge `latch -> header` where the header dominates the
//! latch. All back edges to one header form a single loop whose body is
//! everything that reaches a latch without passing through the header.
//! Loops nest by containment.

use log::debug;
use std::collections::HashSet;
use wgc_common::BlockId;
use crate::analysis::{DominanceInfo, DominatorTree};
use crate::Function;

/// Index of a loop in its `LoopInfo`
pub type LoopId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    pub header: BlockId,
    /// Header first, then the remaining members in layout order
    pub blocks: Vec<BlockId>,
    members: HashSet<BlockId>,
    pub parent: Option<LoopId>,
    pub children: Vec<LoopId>,
    /// 1 for outermost loops
    pub depth: u32,
}

impl Loop {
    pub fn contains(&self, block: BlockId) -> bool {
        self.members.contains(&block)
    }

    /// Header predecessors inside the loop
    pub fn latches(&self, function: &Function) -> Vec<BlockId> {
        function
            .predecessors(self.header)
            .into_iter()
            .filter(|pred| self.contains(*pred))
            .collect()
    }

    /// The latch, when there is exactly one
    pub fn loop_latch(&self, function: &Function) -> Option<BlockId> {
        match self.latches(function).as_slice() {
            [latch] => Some(*latch),
            _ => None,
        }
    }

    /// Unique predecessor of the header outside the loop
    pub fn loop_predecessor(&self, function: &Function) -> Option<BlockId> {
        let outside: Vec<BlockId> = function
            .predecessors(self.header)
            .into_iter()
            .filter(|pred| !self.contains(*pred))
            .collect();
        match outside.as_slice() {
            [pred] => Some(*pred),
            _ => None,
        }
    }

    /// Loop predecessor whose only successor is the header
    pub fn preheader(&self, function: &Function) -> Option<BlockId> {
        let pred = self.loop_predecessor(function)?;
        match function.successors(pred).as_slice() {
            [succ] if *succ == self.header => Some(pred),
            _ => None,
        }
    }

    /// Members with a successor outside the loop, in block order
    pub fn exiting_blocks(&self, function: &Function) -> Vec<BlockId> {
        self.blocks
            .iter()
            .copied()
            .filter(|&block| {
                function
                    .successors(block)
                    .iter()
                    .any(|succ| !self.contains(*succ))
            })
            .collect()
    }

    /// The exiting block, when there is exactly one
    pub fn exiting_block(&self, function: &Function) -> Option<BlockId> {
        match self.exiting_blocks(function).as_slice() {
            [exiting] => Some(*exiting),
            _ => None,
        }
    }

    fn insert_after(&mut self, existing: BlockId, block: BlockId) {
        if self.members.insert(block) {
            match self.blocks.iter().position(|&b| b == existing) {
                Some(pos) => self.blocks.insert(pos + 1, block),
                None => self.blocks.push(block),
            }
        }
    }
}

/// All natural loops of a function
#[derive(Debug, Clone, Default)]
pub struct LoopInfo {
    loops: Vec<Loop>,
}

impl LoopInfo {
    pub fn compute(function: &Function, dt: &DominatorTree) -> Self {
        let mut headers: Vec<BlockId> = Vec::new();
        let mut latches_of: Vec<Vec<BlockId>> = Vec::new();

        for &block in function.block_ids() {
            if !dt.is_reachable(block) {
                continue;
            }
            for succ in function.successors(block) {
                if dt.dominates(succ, block) {
                    match headers.iter().position(|&h| h == succ) {
                        Some(pos) => {
                            if !latches_of[pos].contains(&block) {
                                latches_of[pos].push(block);
                            }
                        }
                        None => {
                            headers.push(succ);
                            latches_of.push(vec![block]);
                        }
                    }
                }
            }
        }

        let mut loops: Vec<Loop> = headers
            .iter()
            .zip(latches_of.iter())
            .map(|(&header, latches)| natural_loop(function, dt, header, latches))
            .collect();

        // Parent is the smallest other loop containing the header.
        for i in 0..loops.len() {
            let header = loops[i].header;
            let size = loops[i].blocks.len();
            let parent = (0..loops.len())
                .filter(|&j| j != i && loops[j].contains(header) && loops[j].blocks.len() > size)
                .min_by_key(|&j| loops[j].blocks.len());
            loops[i].parent = parent;
        }
        for i in 0..loops.len() {
            if let Some(parent) = loops[i].parent {
                loops[parent].children.push(i);
            }
        }
        for i in 0..loops.len() {
            let mut depth = 1;
            let mut current = loops[i].parent;
            while let Some(p) = current {
                depth += 1;
                current = loops[p].parent;
            }
            loops[i].depth = depth;
        }

        debug!("found {} loops in '{}'", loops.len(), function.name);
        Self { loops }
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    pub fn get(&self, id: LoopId) -> Option<&Loop> {
        self.loops.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Loop> + '_ {
        self.loops.iter()
    }

    /// Innermost loop containing `block`
    pub fn loop_for(&self, block: BlockId) -> Option<LoopId> {
        (0..self.loops.len())
            .filter(|&i| self.loops[i].contains(block))
            .max_by_key(|&i| self.loops[i].depth)
    }

    /// Loop nest in postorder: every loop comes after its children
    pub fn postorder(&self) -> Vec<LoopId> {
        let mut order = Vec::with_capacity(self.loops.len());
        let mut roots: Vec<LoopId> = (0..self.loops.len())
            .filter(|&i| self.loops[i].parent.is_none())
            .collect();
        roots.sort_by_key(|&i| self.loops[i].header);
        for root in roots {
            self.visit_postorder(root, &mut order);
        }
        order
    }

    fn visit_postorder(&self, id: LoopId, order: &mut Vec<LoopId>) {
        let mut children = self.loops[id].children.clone();
        children.sort_by_key(|&i| self.loops[i].header);
        for child in children {
            self.visit_postorder(child, order);
        }
        order.push(id);
    }

    /// Add `new` to every loop that contains `existing`
    pub fn add_block_like(&mut self, existing: BlockId, new: BlockId) {
        for lp in self.loops.iter_mut() {
            if lp.contains(existing) {
                lp.insert_after(existing, new);
            }
        }
    }
}

fn natural_loop(function: &Function, dt: &DominatorTree, header: BlockId, latches: &[BlockId]) -> Loop {
    let mut members: HashSet<BlockId> = HashSet::new();
    members.insert(header);
    let mut worklist: Vec<BlockId> = latches.to_vec();
    while let Some(block) = worklist.pop() {
        if !members.insert(block) {
            continue;
        }
        for pred in function.predecessors(block) {
            if dt.is_reachable(pred) && !members.contains(&pred) {
                worklist.push(pred);
            }
        }
    }

    let mut blocks = vec![header];
    blocks.extend(
        function
            .block_ids()
            .iter()
            .copied()
            .filter(|b| *b != header && members.contains(b)),
    );

    Loop {
        header,
        blocks,
        members,
        parent: None,
        children: Vec::new(),
        depth: 1,
    }
}
