//! Kernel description header generation
//! 
//! For every kernel this pass appends C preprocessor macros describing its
//! arguments to a header, and turns its automatic locals (module globals
//! named `<kernel>.<something>`) into extra trailing parameters:
//! 
//! ```text
//! #define _k_NUM_ARGS 2
//! #define _k_ARG_IS_POINTER {1, 1}
//! #define _k_ARG_IS_LOCAL {0, 1}
//! #define _k_NUM_LOCALS 1
//! #define _k_LOCAL_SIZE {64}
//! ```
//! 
//! A kernel with automatic locals is replaced by a clone with the wider
//! signature. Replacements are planned first and committed afterwards, see
//! `KernelReplacements`.

mod replacements;

pub use self::replacements::{regenerate_kernel_metadata, KernelPair, KernelReplacements};

use log::{debug, info};
use std::fmt::Display;
use std::io::Write;
use wgc_ir::analysis::DataLayout;
use wgc_ir::{clone_function_into, Function, FunctionId, GlobalId, IrType, Module, PassError, Value, ValueMap};
use crate::KernelPredicate;

/// Module pass writing kernel description macros and hoisting automatic
/// locals into parameters
pub struct GenerateHeader<'a> {
    data_layout: &'a dyn DataLayout,
    predicate: &'a dyn KernelPredicate,
}

impl<'a> GenerateHeader<'a> {
    pub fn new(data_layout: &'a dyn DataLayout, predicate: &'a dyn KernelPredicate) -> Self {
        Self { data_layout, predicate }
    }

    /// Describe every kernel to `out` and replace kernels with automatic
    /// locals
    ///
    /// Kernels are visited in declaration order. The whole header is written
    /// before the module is touched, so a failing sink leaves the module as
    /// it was. Returns `true` when at least one kernel was replaced.
    pub fn run_on_module(&self, module: &mut Module, out: &mut dyn Write) -> Result<bool, PassError> {
        let mut planned = Vec::new();

        for id in module.function_ids() {
            if !self.predicate.is_kernel_to_process(module, id) {
                continue;
            }
            let function = module
                .function(id)
                .ok_or_else(|| PassError::UnknownFunction(id.to_string()))?;
            info!("GenerateHeader: processing kernel '{}'", function.name);

            let mut header = describe_arguments(function);
            let locals = self.describe_locals(module, function, &mut header);
            out.write_all(header.as_bytes())?;
            planned.push((id, locals));
        }
        out.flush()?;

        let mut kernels = KernelReplacements::default();
        for (id, locals) in planned {
            let replacement = if locals.is_empty() {
                id
            } else {
                self.replace_kernel(module, id, &locals)?
            };
            kernels.push(id, replacement);
        }

        if !kernels.any_changed() {
            return Ok(false);
        }
        kernels.commit(module);
        Ok(true)
    }

    /// Append the automatic-locals macros of `kernel` to `out` and, if it has
    /// any, add a replacement taking them as trailing parameters
    ///
    /// Returns the replacement (or `kernel` itself) and whether it differs.
    pub fn rewrite_if_needed(
        &self,
        module: &mut Module,
        kernel: FunctionId,
        out: &mut String,
    ) -> Result<(FunctionId, bool), PassError> {
        let function = module
            .function(kernel)
            .ok_or_else(|| PassError::UnknownFunction(kernel.to_string()))?;
        let locals = self.describe_locals(module, function, out);

        if locals.is_empty() {
            // The kernel signature is unchanged.
            return Ok((kernel, false));
        }
        let replacement = self.replace_kernel(module, kernel, &locals)?;
        Ok((replacement, true))
    }

    /// `_NUM_LOCALS` and `_LOCAL_SIZE` macros; returns the locals found
    fn describe_locals(&self, module: &Module, function: &Function, out: &mut String) -> Vec<GlobalId> {
        let locals = automatic_locals(module, &function.name);
        let sizes: Vec<u64> = locals
            .iter()
            .filter_map(|&id| module.global(id))
            .map(|global| self.data_layout.alloc_size(&global.value_type))
            .collect();

        out.push_str(&format!("#define _{}_NUM_LOCALS {}\n", function.name, locals.len()));
        out.push_str(&format!("#define _{}_LOCAL_SIZE {}\n", function.name, brace_list(&sizes)));
        locals
    }

    /// Append a clone of `kernel` taking `locals` as trailing parameters
    ///
    /// The clone takes over the kernel's name.
    fn replace_kernel(&self, module: &mut Module, kernel: FunctionId, locals: &[GlobalId]) -> Result<FunctionId, PassError> {
        let function = module
            .function(kernel)
            .ok_or_else(|| PassError::UnknownFunction(kernel.to_string()))?;

        let mut param_types: Vec<IrType> = function.parameters.iter().map(|p| p.ty.clone()).collect();
        param_types.extend(
            locals
                .iter()
                .filter_map(|&id| module.global(id))
                .map(|global| global.pointer_type()),
        );
        let fn_type = IrType::Function {
            return_type: Box::new(function.return_type.clone()),
            param_types,
            is_vararg: function.is_vararg,
        };
        let mut new_kernel = Function::with_type("", &fn_type, function.linkage)
            .ok_or_else(|| PassError::invalid_ir(function.name.clone(), "bad replacement signature"))?;

        let mut value_map = ValueMap::new();
        let num_args = function.parameters.len();
        for (i, param) in function.parameters.iter().enumerate() {
            new_kernel.parameters[i].name = param.name.clone();
            value_map.insert(Value::Param(i as u32), Value::Param(i as u32));
        }
        for (i, &local) in locals.iter().enumerate() {
            let position = num_args + i;
            new_kernel.parameters[position].name = format!("_local{i}");
            value_map.insert(Value::Global(local), Value::Param(position as u32));
        }

        clone_function_into(&mut new_kernel, function, &value_map);

        let original = module
            .function_mut(kernel)
            .ok_or_else(|| PassError::UnknownFunction(kernel.to_string()))?;
        new_kernel.take_name(original);

        debug!(
            "kernel '{}' gets {} automatic locals as parameters",
            new_kernel.name,
            locals.len()
        );
        Ok(module.add_function(new_kernel))
    }
}

/// Argument count and per-argument pointer/locality macros for `kernel`
pub fn describe_arguments(kernel: &Function) -> String {
    let is_pointer: Vec<bool> = kernel.parameters.iter().map(|p| p.ty.is_pointer()).collect();
    let is_local: Vec<bool> = kernel
        .parameters
        .iter()
        .map(|p| p.ty.address_space().is_some_and(|space| space.is_local_like()))
        .collect();

    let mut out = String::new();
    out.push_str(&format!("#define _{}_NUM_ARGS {}\n", kernel.name, kernel.parameters.len()));
    out.push_str(&format!("#define _{}_ARG_IS_POINTER {}\n", kernel.name, brace_list(&as_ints(&is_pointer))));
    out.push_str(&format!("#define _{}_ARG_IS_LOCAL {}\n", kernel.name, brace_list(&as_ints(&is_local))));
    out
}

/// Globals whose name starts with `<kernel_name>.`, in declaration order
pub fn automatic_locals(module: &Module, kernel_name: &str) -> Vec<GlobalId> {
    let prefix = format!("{kernel_name}.");
    module
        .globals()
        .filter(|(_, global)| global.name.starts_with(&prefix))
        .map(|(id, _)| id)
        .collect()
}

fn as_ints(flags: &[bool]) -> Vec<u8> {
    flags.iter().map(|&flag| u8::from(flag)).collect()
}

/// `{a, b, c}`, or `{}` when empty
fn brace_list<T: Display>(items: &[T]) -> String {
    let items: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("{{{}}}", items.join(", "))
}
