//! IR Builder
//! 
//! Provides utilities for constructing IR programmatically.

use wgc_common::{BlockId, PassError, TempId};
use crate::{
    CastOp, CmpPredicate, Function, Instruction, IrBinaryOp, IrType, Value,
};

/// Builder for constructing IR
pub struct IrBuilder {
    current_function: Option<Function>,
    current_block: Option<BlockId>,
    next_temp_id: TempId,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self {
            current_function: None,
            current_block: None,
            next_temp_id: 0,
        }
    }
    
    pub fn new_temp(&mut self) -> TempId {
        let temp = self.next_temp_id;
        self.next_temp_id += 1;
        temp
    }
    
    pub fn create_function(&mut self, name: impl Into<String>, return_type: IrType) -> &mut Function {
        self.next_temp_id = 0;
        self.current_block = None;
        self.current_function.insert(Function::new(name, return_type))
    }
    
    /// Add a parameter to the current function and return it as a value
    pub fn add_parameter(&mut self, name: impl Into<String>, param_type: IrType) -> Result<Value, PassError> {
        let function = self.function_mut()?;
        let index = function.add_parameter(name, param_type);
        Ok(Value::Param(index))
    }
    
    /// Create a block without moving the insertion point
    pub fn create_block(&mut self, name: impl Into<String>) -> Result<BlockId, PassError> {
        Ok(self.function_mut()?.create_block(name))
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        self.current_block = Some(block);
    }

    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }
    
    pub fn build_binary(&mut self, op: IrBinaryOp, lhs: Value, rhs: Value, result_type: IrType) -> Result<Value, PassError> {
        let result = self.new_temp();
        self.add_instruction(Instruction::Binary { result, op, lhs, rhs, result_type })?;
        Ok(Value::Temp(result))
    }

    pub fn build_compare(&mut self, pred: CmpPredicate, lhs: Value, rhs: Value) -> Result<Value, PassError> {
        let result = self.new_temp();
        self.add_instruction(Instruction::Compare { result, pred, lhs, rhs })?;
        Ok(Value::Temp(result))
    }
    
    pub fn build_load(&mut self, ptr: Value, result_type: IrType) -> Result<Value, PassError> {
        let result = self.new_temp();
        self.add_instruction(Instruction::Load { result, ptr, result_type })?;
        Ok(Value::Temp(result))
    }
    
    pub fn build_store(&mut self, value: Value, ptr: Value) -> Result<(), PassError> {
        self.add_instruction(Instruction::Store { value, ptr })
    }

    pub fn build_gep(&mut self, ptr: Value, indices: Vec<Value>, result_type: IrType) -> Result<Value, PassError> {
        let result = self.new_temp();
        self.add_instruction(Instruction::GetElementPtr { result, ptr, indices, result_type })?;
        Ok(Value::Temp(result))
    }
    
    pub fn build_alloca(&mut self, alloc_type: IrType) -> Result<Value, PassError> {
        let result = self.new_temp();
        let result_type = IrType::ptr(alloc_type.clone(), crate::AddressSpace::Private);
        self.add_instruction(Instruction::Alloca { result, alloc_type, result_type })?;
        Ok(Value::Temp(result))
    }
    
    pub fn build_call(&mut self, function: Value, args: Vec<Value>, result_type: IrType) -> Result<Option<Value>, PassError> {
        let result = if matches!(result_type, IrType::Void) {
            None
        } else {
            Some(self.new_temp())
        };
        self.add_instruction(Instruction::Call { result, function, args, result_type })?;
        Ok(result.map(Value::Temp))
    }

    pub fn build_cast(&mut self, op: CastOp, value: Value, target_type: IrType) -> Result<Value, PassError> {
        let result = self.new_temp();
        self.add_instruction(Instruction::Cast { result, op, value, target_type })?;
        Ok(Value::Temp(result))
    }

    pub fn build_phi(&mut self, incoming: Vec<(Value, BlockId)>, result_type: IrType) -> Result<Value, PassError> {
        let result = self.new_temp();
        self.add_instruction(Instruction::Phi { result, incoming, result_type })?;
        Ok(Value::Temp(result))
    }

    pub fn build_barrier(&mut self) -> Result<(), PassError> {
        self.add_instruction(Instruction::Barrier)
    }
    
    pub fn build_return(&mut self, value: Option<Value>) -> Result<(), PassError> {
        self.add_instruction(Instruction::Return(value))
    }
    
    pub fn build_branch(&mut self, label: BlockId) -> Result<(), PassError> {
        self.add_instruction(Instruction::Branch(label))
    }
    
    pub fn build_branch_cond(&mut self, condition: Value, true_label: BlockId, false_label: BlockId) -> Result<(), PassError> {
        self.add_instruction(Instruction::BranchCond { condition, true_label, false_label })
    }

    fn function_mut(&mut self) -> Result<&mut Function, PassError> {
        self.current_function
            .as_mut()
            .ok_or_else(|| PassError::invalid_ir("<builder>", "no current function"))
    }
    
    fn add_instruction(&mut self, instr: Instruction) -> Result<(), PassError> {
        let block_id = self.current_block;
        let function = self.function_mut()?;
        let Some(block_id) = block_id else {
            return Err(PassError::invalid_ir(function.name.clone(), "no current block"));
        };
        if function.get_block(block_id).is_none() {
            return Err(PassError::invalid_ir(function.name.clone(), format!("block {block_id} not found")));
        }
        function.block_mut(block_id).add_instruction(instr);
        Ok(())
    }
    
    pub fn current_block_has_terminator(&self) -> bool {
        match (&self.current_function, self.current_block) {
            (Some(function), Some(block)) => function
                .get_block(block)
                .is_some_and(|b| b.has_terminator()),
            _ => false,
        }
    }
    
    pub fn finish_function(&mut self) -> Option<Function> {
        self.current_block = None;
        self.current_function.take()
    }
}

impl Default for IrBuilder {
    fn default() -> Self {
        Self::new()
    }
}
