//! Work-group Kernel Compiler - Passes
//! 
//! The module passes preparing kernels for work-group execution: barrier
//! insertion around loops, and the kernel description header with automatic
//! locals hoisted into parameters.

pub mod generate_header;
pub mod loop_barriers;
pub mod pipeline;
pub mod workgroup;

pub use generate_header::{GenerateHeader, KernelReplacements};
pub use loop_barriers::{process_loop, LoopBarriers};
pub use pipeline::{open_header, run_generate_header, run_loop_barriers, run_pipeline, PassOptions};
pub use workgroup::{is_listed_kernel, KernelPredicate, Workgroup};
