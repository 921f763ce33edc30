//! IR Type System
//! 
//! Defines the type system for the IR, including integer and float types,
//! pointers qualified by an address space, arrays, vectors, structs, and
//! functions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address space of a pointer
///
/// Only `Global` and `Constant` memory is shared with the host; every other
/// space is work-group or work-item storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddressSpace {
    #[default]
    Private,
    Global,
    Local,
    Constant,
    /// Target specific numbered address space
    Other(u32),
}

impl AddressSpace {
    /// Neither global nor constant memory
    pub fn is_local_like(&self) -> bool {
        !matches!(self, AddressSpace::Global | AddressSpace::Constant)
    }

    pub fn number(&self) -> u32 {
        match self {
            AddressSpace::Private => 0,
            AddressSpace::Global => 1,
            AddressSpace::Constant => 2,
            AddressSpace::Local => 3,
            AddressSpace::Other(n) => *n,
        }
    }
}

/// IR Type system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrType {
    /// Void type
    Void,
    
    /// Integer types with bit width
    I1,
    I8,
    I16,
    I32,
    I64,

    /// Floating point types
    F32,
    F64,
    
    /// Pointer type
    Ptr {
        pointee: Box<IrType>,
        addr_space: AddressSpace,
    },
    
    /// Array type [size x element_type]
    Array { size: u64, element_type: Box<IrType> },

    /// Vector type <size x element_type>
    Vector { size: u32, element_type: Box<IrType> },
    
    /// Function type
    Function {
        return_type: Box<IrType>,
        param_types: Vec<IrType>,
        is_vararg: bool,
    },
    
    /// Struct type
    Struct {
        name: Option<String>,
        fields: Vec<IrType>,
        packed: bool,
    },
    
    /// Label type (for basic block addresses)
    Label,
}

impl IrType {
    pub fn ptr(pointee: IrType, addr_space: AddressSpace) -> Self {
        IrType::Ptr {
            pointee: Box::new(pointee),
            addr_space,
        }
    }

    pub fn array(element_type: IrType, size: u64) -> Self {
        IrType::Array {
            size,
            element_type: Box::new(element_type),
        }
    }

    /// Check if this is an integer type
    pub fn is_integer(&self) -> bool {
        matches!(self, IrType::I1 | IrType::I8 | IrType::I16 | IrType::I32 | IrType::I64)
    }
    
    /// Check if this is a pointer type
    pub fn is_pointer(&self) -> bool {
        matches!(self, IrType::Ptr { .. })
    }

    /// Address space of a pointer type
    pub fn address_space(&self) -> Option<AddressSpace> {
        match self {
            IrType::Ptr { addr_space, .. } => Some(*addr_space),
            _ => None,
        }
    }
    
    /// Get the element type for pointers, arrays and vectors
    pub fn element_type(&self) -> Option<&IrType> {
        match self {
            IrType::Ptr { pointee, .. } => Some(pointee),
            IrType::Array { element_type, .. } => Some(element_type),
            IrType::Vector { element_type, .. } => Some(element_type),
            _ => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::I1 => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I16 => write!(f, "i16"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::F32 => write!(f, "float"),
            IrType::F64 => write!(f, "double"),
            IrType::Ptr { pointee, addr_space: AddressSpace::Private } => write!(f, "{pointee}*"),
            IrType::Ptr { pointee, addr_space } => {
                write!(f, "{pointee} addrspace({})*", addr_space.number())
            }
            IrType::Array { size, element_type } => write!(f, "[{size} x {element_type}]"),
            IrType::Vector { size, element_type } => write!(f, "<{size} x {element_type}>"),
            IrType::Function { return_type, param_types, is_vararg } => {
                write!(f, "{return_type} (")?;
                for (i, param) in param_types.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{param}")?;
                }
                if *is_vararg { write!(f, ", ...")?; }
                write!(f, ")")
            }
            IrType::Struct { name: Some(name), .. } => write!(f, "%{name}"),
            IrType::Struct { name: None, fields, packed } => {
                if *packed { write!(f, "<")?; }
                write!(f, "{{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{field}")?;
                }
                write!(f, " }}")?;
                if *packed { write!(f, ">")?; }
                Ok(())
            }
            IrType::Label => write!(f, "label"),
        }
    }
}
