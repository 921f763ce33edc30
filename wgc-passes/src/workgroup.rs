//! Kernel selection
//! 
//! Both passes only touch functions the kernel predicate accepts.

use wgc_ir::{FunctionId, Module, KERNELS_METADATA};

/// Decides whether a function is a kernel the passes should transform
pub trait KernelPredicate {
    fn is_kernel_to_process(&self, module: &Module, function: FunctionId) -> bool;
}

impl<F> KernelPredicate for F
where
    F: Fn(&Module, FunctionId) -> bool,
{
    fn is_kernel_to_process(&self, module: &Module, function: FunctionId) -> bool {
        self(module, function)
    }
}

/// Default kernel predicate
///
/// Declarations are never kernels. With a kernel name configured only the
/// function of that name is processed, otherwise every function listed in
/// the `opencl.kernels` table is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workgroup {
    kernel_name: Option<String>,
}

impl Workgroup {
    pub fn new(kernel_name: Option<String>) -> Self {
        Self { kernel_name }
    }

    pub fn for_kernel(name: impl Into<String>) -> Self {
        Self { kernel_name: Some(name.into()) }
    }
}

impl KernelPredicate for Workgroup {
    fn is_kernel_to_process(&self, module: &Module, function: FunctionId) -> bool {
        let Some(f) = module.function(function) else {
            return false;
        };
        if f.is_declaration() {
            return false;
        }
        match &self.kernel_name {
            Some(name) => f.name == *name,
            None => is_listed_kernel(module, function),
        }
    }
}

/// Is `function` referenced by a node of the `opencl.kernels` table?
pub fn is_listed_kernel(module: &Module, function: FunctionId) -> bool {
    module
        .named_metadata(KERNELS_METADATA)
        .is_some_and(|table| {
            table
                .operands
                .iter()
                .any(|node| node.first_function() == Some(function))
        })
}
