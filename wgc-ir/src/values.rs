//! IR Value Representations
//! 
//! Defines values that can be used as operands in IR instructions,
//! including temporaries, parameters, constants, globals, and functions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use wgc_common::{FunctionId, GlobalId, TempId};

/// IR Value - represents operands in IR instructions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Temporary variable
    Temp(TempId),

    /// Function parameter by position
    Param(u32),
    
    /// Constant integer
    Constant(i64),
    
    /// Global variable reference (its address)
    Global(GlobalId),
    
    /// Function reference
    Function(FunctionId),

    /// Array of constant values (for initializers)
    ConstantArray(Vec<i64>),

    /// Null pointer
    Null,
    
    /// Undefined value (for uninitialized variables)
    Undef,
}

/// Old value to new value mapping used when cloning function bodies
pub type ValueMap = HashMap<Value, Value>;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Temp(id) => write!(f, "%{id}"),
            Value::Param(index) => write!(f, "%arg{index}"),
            Value::Constant(val) => write!(f, "{val}"),
            Value::Global(id) => write!(f, "@{id}"),
            Value::Function(id) => write!(f, "@{id}"),
            Value::ConstantArray(values) => {
                write!(f, "[")?;
                for (i, val) in values.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{val}")?;
                }
                write!(f, "]")
            }
            Value::Null => write!(f, "null"),
            Value::Undef => write!(f, "undef"),
        }
    }
}
