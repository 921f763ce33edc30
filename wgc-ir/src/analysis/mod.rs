//! Analyses consumed by the passes
//! 
//! - `dominators` - dominator tree and the `DominanceInfo` capability
//! - `loops` - natural loop detection and loop structure queries
//! - `data_layout` - type allocation sizes

pub mod data_layout;
pub mod dominators;
pub mod loops;

pub use self::data_layout::{DataLayout, TargetDataLayout};
pub use self::dominators::{DominanceInfo, DominatorTree};
pub use self::loops::{Loop, LoopId, LoopInfo};

#[cfg(test)]
mod tests;
