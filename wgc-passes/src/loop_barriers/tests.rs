use super::*;
use pretty_assertions::assert_eq;
use wgc_ir::{CmpPredicate, Instruction, IrBinaryOp, IrType, Value};

fn all_kernels(_: &Module, _: FunctionId) -> bool {
    true
}

fn run(function: Function) -> Result<(Function, bool), PassError> {
    let mut module = Module::new("m");
    let id = module.add_function(function);
    let changed = LoopBarriers::new(&all_kernels).run_on_module(&mut module)?;
    let function = module.erase_function(id).ok_or_else(|| PassError::UnknownFunction(id.to_string()))?;
    Ok((function, changed))
}

fn barrier_count(function: &Function) -> usize {
    function
        .blocks()
        .flat_map(|b| b.instructions.iter())
        .filter(|i| i.is_barrier())
        .count()
}

/// entry -> for.cond (phi, exits) -> for.body -> for.cond
fn top_tested_loop(barrier_in_body: bool) -> Function {
    let mut f = Function::new("k", IrType::Void);
    f.add_parameter("n", IrType::I32);
    let entry = f.create_block("entry");
    let header = f.create_block("for.cond");
    let body = f.create_block("for.body");
    let exit = f.create_block("for.end");

    f.block_mut(entry).add_instruction(Instruction::Branch(header));
    let h = f.block_mut(header);
    h.add_instruction(Instruction::Phi {
        result: 0,
        incoming: vec![(Value::Constant(0), entry), (Value::Temp(2), body)],
        result_type: IrType::I32,
    });
    h.add_instruction(Instruction::Compare {
        result: 1,
        pred: CmpPredicate::Slt,
        lhs: Value::Temp(0),
        rhs: Value::Param(0),
    });
    h.add_instruction(Instruction::BranchCond {
        condition: Value::Temp(1),
        true_label: body,
        false_label: exit,
    });
    let b = f.block_mut(body);
    if barrier_in_body {
        b.add_instruction(Instruction::Barrier);
    }
    b.add_instruction(Instruction::Binary {
        result: 2,
        op: IrBinaryOp::Add,
        lhs: Value::Temp(0),
        rhs: Value::Constant(1),
        result_type: IrType::I32,
    });
    b.add_instruction(Instruction::Branch(header));
    f.block_mut(exit).add_instruction(Instruction::Return(None));
    f
}

/// entry -> do.body (barrier) -> do.cond -> (do.body | do.end)
fn bottom_tested_loop() -> Function {
    let mut f = Function::new("k", IrType::Void);
    f.add_parameter("c", IrType::I1);
    let entry = f.create_block("entry");
    let body = f.create_block("do.body");
    let cond = f.create_block("do.cond");
    let exit = f.create_block("do.end");
    f.block_mut(entry).add_instruction(Instruction::Branch(body));
    f.block_mut(body).add_instruction(Instruction::Barrier);
    f.block_mut(body).add_instruction(Instruction::Branch(cond));
    f.block_mut(cond).add_instruction(Instruction::BranchCond {
        condition: Value::Param(0),
        true_label: body,
        false_label: exit,
    });
    f.block_mut(exit).add_instruction(Instruction::Return(None));
    f
}

/// entry -> header -> (a | b); a and b both branch back or exit.
/// The barrier sits in `a` only.
fn two_tailed_loop() -> Function {
    let mut f = Function::new("k", IrType::Void);
    f.add_parameter("c", IrType::I1);
    let entry = f.create_block("entry");
    let header = f.create_block("header");
    let a = f.create_block("if.then");
    let b = f.create_block("if.else");
    let exit = f.create_block("exit");
    f.block_mut(entry).add_instruction(Instruction::Branch(header));
    f.block_mut(header).add_instruction(Instruction::BranchCond {
        condition: Value::Param(0),
        true_label: a,
        false_label: b,
    });
    f.block_mut(a).add_instruction(Instruction::Barrier);
    f.block_mut(a).add_instruction(Instruction::Store {
        value: Value::Constant(1),
        ptr: Value::Null,
    });
    for tail in [a, b] {
        f.block_mut(tail).add_instruction(Instruction::BranchCond {
            condition: Value::Param(0),
            true_label: header,
            false_label: exit,
        });
    }
    f.block_mut(exit).add_instruction(Instruction::Return(None));
    f
}

#[test]
fn test_barrier_loop_gets_all_barriers() {
    let (f, changed) = run(top_tested_loop(true)).unwrap();
    assert!(changed);

    let entry = f.find_block("entry.loopbarrier").expect("preheader renamed");
    assert!(Barrier::ends_with_barrier(&f, entry));

    let header = f.find_block("for.cond.phibarrier.brexitbarrier").expect("header renamed");
    let header_instrs = &f.block(header).instructions;
    assert!(header_instrs[0].is_phi());
    assert!(header_instrs[1].is_barrier());
    assert!(Barrier::ends_with_barrier(&f, header));

    let latch = f.find_block("for.body.latchbarrier").expect("latch renamed");
    assert!(Barrier::ends_with_barrier(&f, latch));

    // original + preheader + phi + exit + latch
    assert_eq!(barrier_count(&f), 5);
    assert_eq!(f.find_block("for.end").map(|b| f.block(b).instructions.len()), Some(1));
}

#[test]
fn test_latch_that_is_exiting_gets_one_barrier() {
    let (f, changed) = run(bottom_tested_loop()).unwrap();
    assert!(changed);

    // do.body is the header without phis: no phi barrier.
    assert!(f.find_block("do.body").is_some());
    let cond = f.find_block("do.cond.brexitbarrier").expect("exiting block renamed");
    assert_eq!(f.block(cond).instructions.len(), 2);
    assert!(f.find_block("do.cond.brexitbarrier.latchbarrier").is_none());
    assert!(f.find_block("entry.loopbarrier").is_some());
    assert_eq!(barrier_count(&f), 3);
}

#[test]
fn test_multiple_latches_use_dominance() {
    let (f, changed) = run(two_tailed_loop()).unwrap();
    assert!(changed);

    assert!(f.find_block("entry.loopbarrier").is_some());
    // Two exiting blocks: no exit barrier.
    let then_block = f.find_block("if.then.latchbarrier").expect("dominated latch renamed");
    assert!(Barrier::ends_with_barrier(&f, then_block));
    // The barrier in if.then does not dominate if.else.
    let else_block = f.find_block("if.else").expect("undominated latch untouched");
    assert_eq!(f.block(else_block).instructions.len(), 1);
    assert_eq!(barrier_count(&f), 3);
}

struct EverythingDominates;

impl DominanceInfo for EverythingDominates {
    fn dominates(&self, _: BlockId, _: BlockId) -> bool {
        true
    }

    fn add_split_block(&mut self, _: BlockId, _: BlockId) {}

    fn verify(&self, _: &Function) -> Result<(), PassError> {
        Ok(())
    }
}

#[test]
fn test_multiple_latches_follow_injected_dominance() {
    let mut f = two_tailed_loop();
    let dt = DominatorTree::compute(&f);
    let mut loops = LoopInfo::compute(&f, &dt);
    let changed = process_loop(&mut f, &mut loops, 0, &mut EverythingDominates).unwrap();
    assert!(changed);
    assert!(f.find_block("if.then.latchbarrier").is_some());
    assert!(f.find_block("if.else.latchbarrier").is_some());
}

#[test]
fn test_loop_without_barrier_is_untouched() {
    let original = top_tested_loop(false);
    let (f, changed) = run(original.clone()).unwrap();
    assert!(!changed);
    assert_eq!(f, original);
}

#[test]
fn test_preheader_ending_in_barrier_is_split() {
    let mut original = top_tested_loop(false);
    let entry = original.find_block("entry").unwrap();
    Barrier::create_before_terminator(&mut original, entry).unwrap();

    let (f, changed) = run(original).unwrap();
    assert!(changed);

    let dummy = f.find_block("entry.postbarrier_dummy").expect("split block");
    assert_eq!(f.block(entry).instructions, vec![Instruction::Barrier, Instruction::Branch(dummy)]);
    let header = f.find_block("for.cond").unwrap();
    assert_eq!(f.successors(dummy), vec![header]);
    assert_eq!(f.predecessors(header)[0], dummy);
    assert_eq!(barrier_count(&f), 1);
}

#[test]
fn test_missing_preheader_is_fatal() {
    let mut f = Function::new("k", IrType::Void);
    f.add_parameter("c", IrType::I1);
    let entry = f.create_block("entry");
    let side = f.create_block("side");
    let header = f.create_block("header");
    let exit = f.create_block("exit");
    f.block_mut(entry).add_instruction(Instruction::BranchCond {
        condition: Value::Param(0),
        true_label: side,
        false_label: header,
    });
    f.block_mut(side).add_instruction(Instruction::Branch(header));
    f.block_mut(header).add_instruction(Instruction::Barrier);
    f.block_mut(header).add_instruction(Instruction::BranchCond {
        condition: Value::Param(0),
        true_label: header,
        false_label: exit,
    });
    f.block_mut(exit).add_instruction(Instruction::Return(None));

    let err = run(f).unwrap_err();
    assert!(matches!(err, PassError::NonCanonicalLoop { ref header, .. } if header == "header"));
}

#[test]
fn test_non_kernel_loops_are_skipped() {
    let mut module = Module::new("m");
    let id = module.add_function(top_tested_loop(true));
    let before = module.clone();

    let no_kernels = |_: &Module, _: FunctionId| false;
    let pass = LoopBarriers::new(&no_kernels);
    assert!(!pass.run_on_module(&mut module).unwrap());

    let function = module.function(id).unwrap();
    let mut dt = DominatorTree::compute(function);
    let mut loops = LoopInfo::compute(function, &dt);
    assert!(!pass.run_on_loop(&mut module, id, &mut loops, 0, &mut dt).unwrap());
    assert_eq!(module, before);
}

#[test]
fn test_rerun_inserts_nothing() {
    let (once, _) = run(top_tested_loop(true)).unwrap();
    let (twice, changed) = run(once.clone()).unwrap();
    assert!(!changed);
    assert_eq!(twice, once);
}

#[test]
fn test_nested_loops_propagate_to_outer_loop() {
    // entry -> outer -> inner.ph -> inner (barrier, self loop) -> outer.latch
    let mut f = Function::new("k", IrType::Void);
    f.add_parameter("c", IrType::I1);
    let entry = f.create_block("entry");
    let outer = f.create_block("outer");
    let inner = f.create_block("inner");
    let outer_latch = f.create_block("outer.latch");
    let exit = f.create_block("exit");
    f.block_mut(entry).add_instruction(Instruction::Branch(outer));
    f.block_mut(outer).add_instruction(Instruction::Branch(inner));
    f.block_mut(inner).add_instruction(Instruction::Barrier);
    f.block_mut(inner).add_instruction(Instruction::BranchCond {
        condition: Value::Param(0),
        true_label: inner,
        false_label: outer_latch,
    });
    f.block_mut(outer_latch).add_instruction(Instruction::BranchCond {
        condition: Value::Param(0),
        true_label: outer,
        false_label: exit,
    });
    f.block_mut(exit).add_instruction(Instruction::Return(None));

    let (f, changed) = run(f).unwrap();
    assert!(changed);

    // Inner loop: outer is its preheader; inner is header, latch and
    // exiting block at once and already ends with its own barrier.
    assert!(f.find_block("outer.loopbarrier").is_some());
    assert!(f.find_block("inner").is_some());
    // Outer loop: entry is the preheader, outer.latch exits and latches.
    assert!(f.find_block("entry.loopbarrier").is_some());
    assert!(f.find_block("outer.latch.brexitbarrier").is_some());
    assert_eq!(barrier_count(&f), 4);
}

#[test]
fn test_dangling_branch_is_reported() {
    let mut f = Function::new("k", IrType::Void);
    let entry = f.create_block("entry");
    f.block_mut(entry).add_instruction(Instruction::Branch(BlockId(7)));
    let err = run(f).unwrap_err();
    assert!(matches!(err, PassError::InvalidIr { .. }));
}
