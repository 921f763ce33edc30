//! Running the passes with command-line style options

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use log::info;
use wgc_ir::analysis::TargetDataLayout;
use wgc_ir::{Module, PassError};
use crate::{GenerateHeader, LoopBarriers, Workgroup};

/// Options shared by both passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOptions {
    /// Only process the kernel of this name instead of every listed kernel
    pub kernel: Option<String>,
    /// Header receiving the kernel descriptions
    pub header: Option<PathBuf>,
    /// Target pointer size in bytes
    pub pointer_size: u64,
    /// Start the header from scratch instead of appending to it
    pub truncate_header: bool,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            kernel: None,
            header: None,
            pointer_size: 8,
            truncate_header: false,
        }
    }
}

impl PassOptions {
    fn predicate(&self) -> Workgroup {
        Workgroup::new(self.kernel.clone())
    }
}

/// Open the kernel description header for writing
///
/// The header is appended to (and created if missing) so several modules
/// can describe their kernels in the same file.
pub fn open_header(path: &Path, truncate: bool) -> Result<File, PassError> {
    let mut options = OpenOptions::new();
    options.create(true);
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    options.open(path).map_err(|source| PassError::HeaderOpen {
        path: path.to_path_buf(),
        source,
    })
}

pub fn run_loop_barriers(module: &mut Module, options: &PassOptions) -> Result<bool, PassError> {
    module.validate()?;
    let predicate = options.predicate();
    let changed = LoopBarriers::new(&predicate).run_on_module(module)?;
    info!("loop-barriers: module '{}' changed: {}", module.name, changed);
    Ok(changed)
}

pub fn run_generate_header(module: &mut Module, options: &PassOptions) -> Result<bool, PassError> {
    let path = options.header.as_deref().ok_or_else(|| {
        PassError::invalid_ir(module.name.clone(), "no header file given for the kernel descriptions")
    })?;
    module.validate()?;
    let mut header = open_header(path, options.truncate_header)?;

    let predicate = options.predicate();
    let data_layout = TargetDataLayout::new(options.pointer_size);
    let changed = GenerateHeader::new(&data_layout, &predicate).run_on_module(module, &mut header)?;
    info!(
        "generate-header: module '{}' changed: {}, header {}",
        module.name,
        changed,
        path.display()
    );
    Ok(changed)
}

/// Loop barriers, then the header pass
pub fn run_pipeline(module: &mut Module, options: &PassOptions) -> Result<bool, PassError> {
    let barriers = run_loop_barriers(module, options)?;
    let header = run_generate_header(module, options)?;
    Ok(barriers || header)
}
