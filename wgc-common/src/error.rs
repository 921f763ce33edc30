//! Error handling for the work-group kernel passes
//! 
//! Every error here is fatal for the run: the passes are single-shot,
//! deterministic transforms and nothing retries or degrades.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the IR utilities, the analyses and the passes
#[derive(Error, Debug)]
pub enum PassError {
    /// A loop reached the barrier pass without a preheader
    #[error("Non-canonicalized loop found: loop with header '{header}' in '{function}' has no preheader")]
    NonCanonicalLoop {
        function: String,
        header: String,
    },

    /// The dominator tree no longer matches the CFG after a mutation
    #[error("Dominator tree verification failed in '{function}': {message}")]
    DominatorTreeMismatch {
        function: String,
        message: String,
    },

    /// The kernel description header could not be opened for appending
    #[error("Cannot open header file '{}': {source}", path.display())]
    HeaderOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed IR in '{function}': {message}")]
    InvalidIr {
        function: String,
        message: String,
    },

    #[error("Unknown function {0}")]
    UnknownFunction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Module serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PassError {
    /// Create a malformed-IR error
    pub fn invalid_ir(function: impl Into<String>, message: impl Into<String>) -> Self {
        PassError::InvalidIr {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create a dominator tree mismatch error
    pub fn dominator_mismatch(function: impl Into<String>, message: impl Into<String>) -> Self {
        PassError::DominatorTreeMismatch {
            function: function.into(),
            message: message.into(),
        }
    }
}
