//! Target data layout queries

use crate::IrType;

/// Size and alignment of types on the target
pub trait DataLayout {
    /// Bytes occupied by a value of `ty` in memory, including tail padding
    fn alloc_size(&self, ty: &IrType) -> u64;

    /// ABI alignment of `ty` in bytes
    fn abi_alignment(&self, ty: &IrType) -> u64;
}

/// Data layout with naturally aligned scalars and a configurable pointer width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDataLayout {
    pub pointer_size: u64,
}

impl Default for TargetDataLayout {
    fn default() -> Self {
        Self { pointer_size: 8 }
    }
}

impl TargetDataLayout {
    pub fn new(pointer_size: u64) -> Self {
        Self { pointer_size }
    }

    /// Bytes written by a store of `ty`, without tail padding
    pub fn store_size(&self, ty: &IrType) -> u64 {
        match ty {
            IrType::Void | IrType::Function { .. } | IrType::Label => 0,
            IrType::I1 | IrType::I8 => 1,
            IrType::I16 => 2,
            IrType::I32 | IrType::F32 => 4,
            IrType::I64 | IrType::F64 => 8,
            IrType::Ptr { .. } => self.pointer_size,
            IrType::Array { size, element_type } => size * self.alloc_size(element_type),
            IrType::Vector { size, element_type } => u64::from(*size) * self.store_size(element_type),
            IrType::Struct { fields, packed, .. } => {
                let mut offset = 0;
                for field in fields {
                    if !packed {
                        offset = align_to(offset, self.abi_alignment(field));
                    }
                    offset += self.alloc_size(field);
                }
                offset
            }
        }
    }
}

impl DataLayout for TargetDataLayout {
    fn alloc_size(&self, ty: &IrType) -> u64 {
        align_to(self.store_size(ty), self.abi_alignment(ty))
    }

    fn abi_alignment(&self, ty: &IrType) -> u64 {
        match ty {
            IrType::Void | IrType::Function { .. } | IrType::Label => 1,
            IrType::Array { element_type, .. } => self.abi_alignment(element_type),
            // Vectors align to their size rounded up to a power of two
            IrType::Vector { .. } => self.store_size(ty).max(1).next_power_of_two(),
            IrType::Struct { packed: true, .. } => 1,
            IrType::Struct { fields, .. } => fields
                .iter()
                .map(|field| self.abi_alignment(field))
                .max()
                .unwrap_or(1),
            _ => self.store_size(ty).max(1),
        }
    }
}

fn align_to(value: u64, align: u64) -> u64 {
    if align <= 1 {
        value
    } else {
        value.div_ceil(align) * align
    }
}
