//! Identifier types used throughout the compiler
//! 
//! Arena indices for the IR. Functions, blocks and globals are addressed
//! by index so that passes can refer to them by identity while the module
//! is being mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Temporary (SSA value) identifier, local to a function
pub type TempId = u32;

/// Index of a function slot in a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(pub u32);

/// Index of a basic block in a function's block arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

/// Index of a global variable in a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalId(pub u32);

macro_rules! impl_index {
    ($ty:ident, $prefix:expr) => {
        impl $ty {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $ty {
            fn from(index: usize) -> Self {
                $ty(index as u32)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

impl_index!(FunctionId, "fn");
impl_index!(BlockId, "bb");
impl_index!(GlobalId, "g");
