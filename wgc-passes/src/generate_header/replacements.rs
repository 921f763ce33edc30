//! Kernel replacement plan
//! 
//! Replacement kernels are created while the module is scanned, but nothing
//! that refers to the originals is touched until `commit`. Committing first
//! repairs the metadata tables, then erases the replaced originals.

use log::debug;
use wgc_ir::{
    FunctionId, MetadataNode, MetadataOperand, Module, KERNELS_METADATA, KERNEL_WG_SIZE_METADATA,
};

/// (original kernel, replacement); equal when the kernel was kept
pub type KernelPair = (FunctionId, FunctionId);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelReplacements {
    pairs: Vec<KernelPair>,
}

impl KernelReplacements {
    pub fn push(&mut self, original: FunctionId, replacement: FunctionId) {
        self.pairs.push((original, replacement));
    }

    /// Every visited kernel, in visiting order
    pub fn pairs(&self) -> &[KernelPair] {
        &self.pairs
    }

    /// Pairs whose kernel was actually replaced
    pub fn changed(&self) -> impl Iterator<Item = KernelPair> + '_ {
        self.pairs.iter().copied().filter(|(old, new)| old != new)
    }

    pub fn any_changed(&self) -> bool {
        self.changed().next().is_some()
    }

    /// Point the metadata at the replacements and erase the originals
    pub fn commit(&self, module: &mut Module) {
        regenerate_kernel_metadata(module, &self.pairs);
        for (old, new) in self.changed() {
            debug!("erasing kernel {} replaced by {}", old, new);
            module.erase_function(old);
        }
    }
}

/// Re-point kernel metadata at replacement kernels
///
/// Every `opencl.kernel_wg_size_info` node whose first operand is a replaced
/// kernel gets a copy pointing at the replacement, appended to the table;
/// the old node stays. `opencl.kernels` is rebuilt from scratch with one
/// node per pair, in pair order.
pub fn regenerate_kernel_metadata(module: &mut Module, kernels: &[KernelPair]) {
    if let Some(wg_sizes) = module.named_metadata_mut(KERNEL_WG_SIZE_METADATA) {
        let existing = wg_sizes.num_operands();
        for index in 0..existing {
            let node = wg_sizes.operands[index].clone();
            for &(old_kernel, new_kernel) in kernels {
                if old_kernel == new_kernel || node.first_function() != Some(old_kernel) {
                    continue;
                }
                let mut operands = vec![MetadataOperand::Function(new_kernel)];
                operands.extend(node.operands.iter().skip(1).cloned());
                wg_sizes.add_operand(MetadataNode::new(operands));
            }
        }
    }

    module.erase_named_metadata(KERNELS_METADATA);
    let table = module.get_or_insert_named_metadata(KERNELS_METADATA);
    for &(_, new_kernel) in kernels {
        table.add_operand(MetadataNode::new(vec![MetadataOperand::Function(new_kernel)]));
    }
}
