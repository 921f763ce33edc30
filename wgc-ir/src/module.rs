//! Module and Global Variables
//! 
//! Defines the top-level module structure. Functions live in slots so that
//! a `FunctionId` stays valid after other functions are erased.

use serde::{Deserialize, Serialize};
use std::fmt;
use wgc_common::{FunctionId, GlobalId, PassError};
use crate::{AddressSpace, Function, IrType, NamedMetadata, Value};

/// Linkage types for global symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Linkage {
    #[default]
    External,  // Visible to other modules
    Internal,  // Only visible within this module (static)
    Private,   // Not visible outside this module, not even in the symbol table
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Linkage::External => write!(f, "external"),
            Linkage::Internal => write!(f, "internal"),
            Linkage::Private => write!(f, "private"),
        }
    }
}

/// Global variable definition
///
/// `value_type` is the type of the stored object (and of its initializer);
/// the global itself, used as a value, is a pointer to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariable {
    pub name: String,
    pub value_type: IrType,
    pub addr_space: AddressSpace,
    pub is_constant: bool,
    pub initializer: Option<Value>,
    pub linkage: Linkage,
}

impl GlobalVariable {
    pub fn new(name: impl Into<String>, value_type: IrType, addr_space: AddressSpace) -> Self {
        Self {
            name: name.into(),
            value_type,
            addr_space,
            is_constant: false,
            initializer: None,
            linkage: Linkage::Internal,
        }
    }

    pub fn with_initializer(mut self, initializer: Value) -> Self {
        self.initializer = Some(initializer);
        self
    }

    /// Type of the global when used as a value
    pub fn pointer_type(&self) -> IrType {
        IrType::ptr(self.value_type.clone(), self.addr_space)
    }
}

/// IR Module - represents a complete compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    functions: Vec<Option<Function>>,
    pub globals: Vec<GlobalVariable>,
    pub named_metadata: Vec<NamedMetadata>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            globals: Vec::new(),
            named_metadata: Vec::new(),
        }
    }
    
    /// Append a function at the end of the module
    pub fn add_function(&mut self, function: Function) -> FunctionId {
        self.functions.push(Some(function));
        FunctionId::from(self.functions.len() - 1)
    }

    /// Remove a function; its id is never reused
    pub fn erase_function(&mut self, id: FunctionId) -> Option<Function> {
        self.functions.get_mut(id.index()).and_then(Option::take)
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id.index()).and_then(Option::as_ref)
    }

    pub fn function_mut(&mut self, id: FunctionId) -> Option<&mut Function> {
        self.functions.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Live functions in declaration order
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> + '_ {
        self.functions
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|f| (FunctionId::from(i), f)))
    }

    pub fn function_ids(&self) -> Vec<FunctionId> {
        self.functions().map(|(id, _)| id).collect()
    }

    pub fn num_functions(&self) -> usize {
        self.functions().count()
    }
    
    pub fn get_function(&self, name: &str) -> Option<FunctionId> {
        self.functions().find(|(_, f)| f.name == name).map(|(id, _)| id)
    }
    
    /// Validate every function body, see `Function::validate`
    pub fn validate(&self) -> Result<(), PassError> {
        self.functions().try_for_each(|(_, f)| f.validate())
    }
    
    pub fn add_global(&mut self, global: GlobalVariable) -> GlobalId {
        self.globals.push(global);
        GlobalId::from(self.globals.len() - 1)
    }

    pub fn global(&self, id: GlobalId) -> Option<&GlobalVariable> {
        self.globals.get(id.index())
    }

    /// Globals in declaration order
    pub fn globals(&self) -> impl Iterator<Item = (GlobalId, &GlobalVariable)> + '_ {
        self.globals.iter().enumerate().map(|(i, g)| (GlobalId::from(i), g))
    }
    
    pub fn get_global(&self, name: &str) -> Option<GlobalId> {
        self.globals().find(|(_, g)| g.name == name).map(|(id, _)| id)
    }

    pub fn named_metadata(&self, name: &str) -> Option<&NamedMetadata> {
        self.named_metadata.iter().find(|md| md.name == name)
    }

    pub fn named_metadata_mut(&mut self, name: &str) -> Option<&mut NamedMetadata> {
        self.named_metadata.iter_mut().find(|md| md.name == name)
    }

    pub fn get_or_insert_named_metadata(&mut self, name: &str) -> &mut NamedMetadata {
        let pos = match self.named_metadata.iter().position(|md| md.name == name) {
            Some(pos) => pos,
            None => {
                self.named_metadata.push(NamedMetadata::new(name));
                self.named_metadata.len() - 1
            }
        };
        &mut self.named_metadata[pos]
    }

    pub fn erase_named_metadata(&mut self, name: &str) -> Option<NamedMetadata> {
        let pos = self.named_metadata.iter().position(|md| md.name == name)?;
        Some(self.named_metadata.remove(pos))
    }

    /// Function name for diagnostics
    pub fn function_name(&self, id: FunctionId) -> String {
        self.function(id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        for (id, global) in self.globals() {
            write!(f, "@{} = {} addrspace({}) ", global.name, global.linkage, global.addr_space.number())?;
            write!(f, "{} {}", if global.is_constant { "constant" } else { "global" }, global.value_type)?;
            if let Some(init) = &global.initializer {
                write!(f, " {init}")?;
            }
            writeln!(f, "  ; {id}")?;
        }
        for (id, function) in self.functions() {
            writeln!(f)?;
            writeln!(f, "; {id}")?;
            write!(f, "{function}")?;
        }
        if !self.named_metadata.is_empty() {
            writeln!(f)?;
        }
        for md in &self.named_metadata {
            writeln!(f, "{md}")?;
        }
        Ok(())
    }
}
