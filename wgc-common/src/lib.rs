//! Work-group Kernel Compiler - Common Types and Errors
//! 
//! This crate contains the identifier types and the error type shared by
//! the IR, the transformation passes and the driver.

pub mod error;
pub mod types;

pub use error::PassError;
pub use types::*;
