//! IR Instructions
//! 
//! Defines all instruction kinds available in the IR. Barriers are a plain
//! variant of the enum so they are recognised by a match, not by a type test.

use serde::{Deserialize, Serialize};
use std::fmt;
use wgc_common::{BlockId, TempId};
use crate::{CastOp, CmpPredicate, IrBinaryOp, IrType, Value};

/// IR Instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    /// Binary operation: result = op lhs, rhs
    Binary {
        result: TempId,
        op: IrBinaryOp,
        lhs: Value,
        rhs: Value,
        result_type: IrType,
    },

    /// Integer comparison: result = icmp pred lhs, rhs
    Compare {
        result: TempId,
        pred: CmpPredicate,
        lhs: Value,
        rhs: Value,
    },
    
    /// Load from memory: result = load ptr
    Load {
        result: TempId,
        ptr: Value,
        result_type: IrType,
    },
    
    /// Store to memory: store value, ptr
    Store {
        value: Value,
        ptr: Value,
    },
    
    /// Get element pointer: result = getelementptr ptr, indices
    GetElementPtr {
        result: TempId,
        ptr: Value,
        indices: Vec<Value>,
        result_type: IrType,
    },
    
    /// Allocate stack memory: result = alloca type
    Alloca {
        result: TempId,
        alloc_type: IrType,
        result_type: IrType,
    },
    
    /// Function call: result = call func(args...)
    Call {
        result: Option<TempId>,
        function: Value,
        args: Vec<Value>,
        result_type: IrType,
    },

    /// Type conversion: result = op value to target_type
    Cast {
        result: TempId,
        op: CastOp,
        value: Value,
        target_type: IrType,
    },
    
    /// Select (ternary): result = select condition, true_value, false_value
    Select {
        result: TempId,
        condition: Value,
        true_value: Value,
        false_value: Value,
        result_type: IrType,
    },

    /// Phi node: result = phi [val1, label1], [val2, label2], ...
    Phi {
        result: TempId,
        incoming: Vec<(Value, BlockId)>,
        result_type: IrType,
    },

    /// Work-group barrier: every work-item reaches this point before any
    /// of them continues.
    Barrier,
    
    /// Return: ret value or ret void
    Return(Option<Value>),
    
    /// Unconditional branch: br label
    Branch(BlockId),
    
    /// Conditional branch: br condition, true_label, false_label
    BranchCond {
        condition: Value,
        true_label: BlockId,
        false_label: BlockId,
    },

    Unreachable,
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Return(_)
                | Instruction::Branch(_)
                | Instruction::BranchCond { .. }
                | Instruction::Unreachable
        )
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, Instruction::Phi { .. })
    }

    pub fn is_barrier(&self) -> bool {
        matches!(self, Instruction::Barrier)
    }

    /// Successor blocks of a terminator, in operand order (may repeat)
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Instruction::Branch(target) => vec![*target],
            Instruction::BranchCond { true_label, false_label, .. } => vec![*true_label, *false_label],
            _ => Vec::new(),
        }
    }

    /// Value defined by this instruction, if any
    pub fn result(&self) -> Option<TempId> {
        match self {
            Instruction::Binary { result, .. }
            | Instruction::Compare { result, .. }
            | Instruction::Load { result, .. }
            | Instruction::GetElementPtr { result, .. }
            | Instruction::Alloca { result, .. }
            | Instruction::Cast { result, .. }
            | Instruction::Select { result, .. }
            | Instruction::Phi { result, .. } => Some(*result),
            Instruction::Call { result, .. } => *result,
            _ => None,
        }
    }

    /// Visit every value operand mutably
    pub fn for_each_operand_mut(&mut self, mut f: impl FnMut(&mut Value)) {
        match self {
            Instruction::Binary { lhs, rhs, .. } | Instruction::Compare { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            Instruction::Load { ptr, .. } => f(ptr),
            Instruction::Store { value, ptr } => {
                f(value);
                f(ptr);
            }
            Instruction::GetElementPtr { ptr, indices, .. } => {
                f(ptr);
                for index in indices.iter_mut() {
                    f(index);
                }
            }
            Instruction::Call { function, args, .. } => {
                f(function);
                for arg in args.iter_mut() {
                    f(arg);
                }
            }
            Instruction::Cast { value, .. } => f(value),
            Instruction::Select { condition, true_value, false_value, .. } => {
                f(condition);
                f(true_value);
                f(false_value);
            }
            Instruction::Phi { incoming, .. } => {
                for (value, _) in incoming.iter_mut() {
                    f(value);
                }
            }
            Instruction::Return(Some(value)) => f(value),
            Instruction::BranchCond { condition, .. } => f(condition),
            Instruction::Alloca { .. }
            | Instruction::Barrier
            | Instruction::Return(None)
            | Instruction::Branch(_)
            | Instruction::Unreachable => {}
        }
    }

    /// Replace incoming block `from` with `to` in a phi node
    pub fn replace_phi_incoming_block(&mut self, from: BlockId, to: BlockId) {
        if let Instruction::Phi { incoming, .. } = self {
            for (_, label) in incoming.iter_mut() {
                if *label == from {
                    *label = to;
                }
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Binary { result, op, lhs, rhs, result_type } => {
                write!(f, "%{result} = {op} {result_type} {lhs}, {rhs}")
            }
            Instruction::Compare { result, pred, lhs, rhs } => {
                write!(f, "%{result} = icmp {pred} {lhs}, {rhs}")
            }
            Instruction::Load { result, ptr, result_type } => {
                write!(f, "%{result} = load {result_type}, {ptr}")
            }
            Instruction::Store { value, ptr } => write!(f, "store {value}, {ptr}"),
            Instruction::GetElementPtr { result, ptr, indices, result_type } => {
                write!(f, "%{result} = getelementptr {result_type} {ptr}")?;
                for index in indices {
                    write!(f, ", {index}")?;
                }
                Ok(())
            }
            Instruction::Alloca { result, alloc_type, .. } => {
                write!(f, "%{result} = alloca {alloc_type}")
            }
            Instruction::Call { result, function, args, result_type } => {
                if let Some(result) = result {
                    write!(f, "%{result} = ")?;
                }
                write!(f, "call {result_type} {function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Instruction::Cast { result, op, value, target_type } => {
                write!(f, "%{result} = {op} {value} to {target_type}")
            }
            Instruction::Select { result, condition, true_value, false_value, result_type } => {
                write!(f, "%{result} = select {condition}, {result_type} {true_value}, {result_type} {false_value}")
            }
            Instruction::Phi { result, incoming, result_type } => {
                write!(f, "%{result} = phi {result_type} ")?;
                for (i, (value, label)) in incoming.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "[{value}, %{label}]")?;
                }
                Ok(())
            }
            Instruction::Barrier => write!(f, "call void @barrier()"),
            Instruction::Return(Some(value)) => write!(f, "ret {value}"),
            Instruction::Return(None) => write!(f, "ret void"),
            Instruction::Branch(label) => write!(f, "br label %{label}"),
            Instruction::BranchCond { condition, true_label, false_label } => {
                write!(f, "br i1 {condition}, label %{true_label}, label %{false_label}")
            }
            Instruction::Unreachable => write!(f, "unreachable"),
        }
    }
}
