use super::*;
use crate::{split_block, AddressSpace, Function, Instruction, IrType, Value};
use pretty_assertions::assert_eq;
use wgc_common::{BlockId, PassError};

fn br(function: &mut Function, from: BlockId, to: BlockId) {
    function.block_mut(from).add_instruction(Instruction::Branch(to));
}

fn cond_br(function: &mut Function, from: BlockId, t: BlockId, f: BlockId) {
    function.block_mut(from).add_instruction(Instruction::BranchCond {
        condition: Value::Param(0),
        true_label: t,
        false_label: f,
    });
}

/// entry -> outer.header -> inner.header <-> inner.body,
/// inner.header -> outer.latch -> (outer.header | exit)
fn nested_loops() -> (Function, Vec<BlockId>) {
    let mut f = Function::new("nested", IrType::Void);
    f.add_parameter("c", IrType::I1);
    let entry = f.create_block("entry");
    let outer_header = f.create_block("outer.header");
    let inner_header = f.create_block("inner.header");
    let inner_body = f.create_block("inner.body");
    let outer_latch = f.create_block("outer.latch");
    let exit = f.create_block("exit");

    br(&mut f, entry, outer_header);
    br(&mut f, outer_header, inner_header);
    cond_br(&mut f, inner_header, inner_body, outer_latch);
    br(&mut f, inner_body, inner_header);
    cond_br(&mut f, outer_latch, outer_header, exit);
    f.block_mut(exit).add_instruction(Instruction::Return(None));
    (f, vec![entry, outer_header, inner_header, inner_body, outer_latch, exit])
}

#[test]
fn test_dominators_diamond() {
    let mut f = Function::new("diamond", IrType::Void);
    f.add_parameter("c", IrType::I1);
    let entry = f.create_block("entry");
    let left = f.create_block("left");
    let right = f.create_block("right");
    let join = f.create_block("join");
    let dead = f.create_block("dead");
    cond_br(&mut f, entry, left, right);
    br(&mut f, left, join);
    br(&mut f, right, join);
    f.block_mut(join).add_instruction(Instruction::Return(None));
    br(&mut f, dead, join);

    let dt = DominatorTree::compute(&f);
    assert_eq!(dt.idom(entry), None);
    assert_eq!(dt.idom(left), Some(entry));
    assert_eq!(dt.idom(join), Some(entry));
    assert!(dt.dominates(entry, join));
    assert!(!dt.dominates(left, join));
    assert!(dt.dominates(join, join));
    assert!(!dt.is_reachable(dead));
    assert!(dt.dominates(left, dead));
    assert!(!dt.dominates(dead, join));
    assert!(dt.verify(&f).is_ok());
}

#[test]
fn test_dominator_verify_detects_stale_tree() {
    let (mut f, blocks) = nested_loops();
    let dt = DominatorTree::compute(&f);
    // Reroute entry around the outer loop: the cached tree is now stale.
    f.block_mut(blocks[0]).instructions = vec![Instruction::Branch(blocks[4])];
    let err = dt.verify(&f).unwrap_err();
    assert!(matches!(err, PassError::DominatorTreeMismatch { .. }));
}

#[test]
fn test_dominator_split_update_verifies() {
    let (mut f, blocks) = nested_loops();
    let mut dt = DominatorTree::compute(&f);
    let outer_header = blocks[1];
    f.block_mut(outer_header).instructions.insert(0, Instruction::Barrier);

    let new_block = split_block(&mut f, outer_header, 1).unwrap();
    dt.add_split_block(outer_header, new_block);
    assert_eq!(dt.idom(new_block), Some(outer_header));
    assert_eq!(dt.idom(blocks[2]), Some(new_block));
    assert!(dt.verify(&f).is_ok());
}

#[test]
fn test_loop_nest() {
    let (f, blocks) = nested_loops();
    let &[entry, outer_header, inner_header, inner_body, outer_latch, exit] = blocks.as_slice() else {
        unreachable!()
    };
    let dt = DominatorTree::compute(&f);
    let loops = LoopInfo::compute(&f, &dt);
    assert_eq!(loops.len(), 2);

    let order = loops.postorder();
    let inner = loops.get(order[0]).unwrap();
    let outer = loops.get(order[1]).unwrap();

    assert_eq!(inner.header, inner_header);
    assert_eq!(inner.blocks, vec![inner_header, inner_body]);
    assert_eq!(inner.depth, 2);
    assert_eq!(inner.parent, Some(order[1]));
    assert_eq!(inner.preheader(&f), Some(outer_header));
    assert_eq!(inner.loop_latch(&f), Some(inner_body));
    assert_eq!(inner.exiting_block(&f), Some(inner_header));

    assert_eq!(outer.header, outer_header);
    assert_eq!(outer.blocks, vec![outer_header, inner_header, inner_body, outer_latch]);
    assert_eq!(outer.depth, 1);
    assert_eq!(outer.children, vec![order[0]]);
    assert_eq!(outer.preheader(&f), Some(entry));
    assert_eq!(outer.loop_latch(&f), Some(outer_latch));
    assert_eq!(outer.exiting_block(&f), Some(outer_latch));
    assert!(!outer.contains(exit));

    assert_eq!(loops.loop_for(inner_body), Some(order[0]));
    assert_eq!(loops.loop_for(outer_latch), Some(order[1]));
    assert_eq!(loops.loop_for(exit), None);
}

#[test]
fn test_loop_with_two_latches_and_exits() {
    // header -> a | b, a -> header | exit, b -> header | exit
    let mut f = Function::new("two_latches", IrType::Void);
    f.add_parameter("c", IrType::I1);
    let entry = f.create_block("entry");
    let header = f.create_block("header");
    let a = f.create_block("a");
    let b = f.create_block("b");
    let exit = f.create_block("exit");
    br(&mut f, entry, header);
    cond_br(&mut f, header, a, b);
    cond_br(&mut f, a, header, exit);
    cond_br(&mut f, b, header, exit);
    f.block_mut(exit).add_instruction(Instruction::Return(None));

    let dt = DominatorTree::compute(&f);
    let loops = LoopInfo::compute(&f, &dt);
    let lp = loops.get(0).unwrap();
    assert_eq!(lp.latches(&f), vec![a, b]);
    assert_eq!(lp.loop_latch(&f), None);
    assert_eq!(lp.exiting_blocks(&f), vec![a, b]);
    assert_eq!(lp.exiting_block(&f), None);
    assert_eq!(lp.preheader(&f), Some(entry));
}

#[test]
fn test_loop_without_preheader() {
    // Two outside predecessors of the header.
    let mut f = Function::new("no_preheader", IrType::Void);
    f.add_parameter("c", IrType::I1);
    let entry = f.create_block("entry");
    let side = f.create_block("side");
    let header = f.create_block("header");
    let exit = f.create_block("exit");
    cond_br(&mut f, entry, side, header);
    br(&mut f, side, header);
    cond_br(&mut f, header, header, exit);
    f.block_mut(exit).add_instruction(Instruction::Return(None));

    let dt = DominatorTree::compute(&f);
    let loops = LoopInfo::compute(&f, &dt);
    let lp = loops.get(0).unwrap();
    assert_eq!(lp.blocks, vec![header]);
    assert_eq!(lp.loop_latch(&f), Some(header));
    assert_eq!(lp.loop_predecessor(&f), None);
    assert_eq!(lp.preheader(&f), None);
}

#[test]
fn test_add_block_like() {
    let (mut f, blocks) = nested_loops();
    let dt = DominatorTree::compute(&f);
    let mut loops = LoopInfo::compute(&f, &dt);
    let new_block = split_block(&mut f, blocks[1], 0).unwrap();
    loops.add_block_like(blocks[1], new_block);

    let order = loops.postorder();
    let inner = loops.get(order[0]).unwrap();
    let outer = loops.get(order[1]).unwrap();
    assert!(!inner.contains(new_block));
    assert!(outer.contains(new_block));
    assert_eq!(outer.blocks[1], new_block);
}

#[test]
fn test_data_layout_sizes() {
    let dl = TargetDataLayout::default();
    assert_eq!(dl.alloc_size(&IrType::I1), 1);
    assert_eq!(dl.alloc_size(&IrType::I32), 4);
    assert_eq!(dl.alloc_size(&IrType::array(IrType::F32, 16)), 64);
    assert_eq!(dl.alloc_size(&IrType::ptr(IrType::I8, AddressSpace::Local)), 8);
    assert_eq!(TargetDataLayout::new(4).alloc_size(&IrType::ptr(IrType::I8, AddressSpace::Local)), 4);

    let vec3 = IrType::Vector { size: 3, element_type: Box::new(IrType::F32) };
    assert_eq!(dl.alloc_size(&vec3), 16);

    let padded = IrType::Struct { name: None, fields: vec![IrType::I8, IrType::I32, IrType::I8], packed: false };
    assert_eq!(dl.alloc_size(&padded), 12);
    assert_eq!(dl.abi_alignment(&padded), 4);

    let packed = IrType::Struct { name: None, fields: vec![IrType::I8, IrType::I32, IrType::I8], packed: true };
    assert_eq!(dl.alloc_size(&packed), 6);
}
