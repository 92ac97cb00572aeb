//! End-to-end lowering tests.

use handshake_to_firrtl::fir::{Direction, Module, Statement, Type as FirType};
use handshake_to_firrtl::handshake::{ArithOp, Block, CmpPredicate, Func, FuncBuilder, Op, OpKind, Region, Type, Value};
use handshake_to_firrtl::{lower_handshake_to_firrtl, Firgen, FirgenError, PASS_DESCRIPTION, PASS_NAME};

/// Flattens the module body into the list of its statements, nested ones included.
fn statements(module: &Module) -> Vec<&Statement> {
    let mut stmts = Vec::new();
    module.body.for_each(&mut |stmt| stmts.push(stmt));
    stmts
}

/// Number of `connect` statements driving the given l-value.
fn drive_count(module: &Module, loc: &str) -> usize {
    statements(module)
        .iter()
        .filter(|stmt| matches!(stmt, Statement::Connect { loc: l, .. } if l.to_string() == loc))
        .count()
}

/// Number of register definitions in the module.
fn register_count(module: &Module) -> usize {
    statements(module).iter().filter(|stmt| matches!(stmt, Statement::DefRegister { .. })).count()
}

/// The `(instance, module)` pairs instantiated by the module.
fn instances(module: &Module) -> Vec<(String, String)> {
    statements(module)
        .iter()
        .filter_map(|stmt| match stmt {
            Statement::DefInstance { name, module } => Some((name.clone(), module.clone())),
            _ => None,
        })
        .collect()
}

fn simple_addi() -> Func {
    let mut builder = FuncBuilder::new("simple_addi");
    let a = builder.arg(Type::UInt(32));
    let b = builder.arg(Type::UInt(32));
    let r = builder.op1(OpKind::Arith(ArithOp::Add), vec![a, b], Type::UInt(32));
    builder.ret(vec![r]);
    builder.finish()
}

#[test]
fn addi_top_module_port_shape() {
    let circuit = lower_handshake_to_firrtl(&simple_addi()).unwrap();
    assert_eq!(circuit.main, "simple_addi");

    let top = circuit.find_module("simple_addi").unwrap();
    let names: Vec<&str> = top.ports.iter().map(|port| port.name.as_str()).collect();
    assert_eq!(names, ["arg0", "arg1", "arg2", "clock", "reset"]);
    assert!(top.ports.iter().all(|port| port.direction == Direction::Input));

    // Argument channels face inward, the result channel faces outward.
    for arg in ["arg0", "arg1"] {
        let fields = top.find_port(arg).unwrap().tpe.fields().unwrap();
        assert!(!fields[0].flip && fields[1].flip && !fields[2].flip);
    }
    let fields = top.find_port("arg2").unwrap().tpe.fields().unwrap();
    assert!(fields[0].flip && !fields[1].flip && fields[2].flip);

    assert_eq!(top.find_port("clock").unwrap().tpe, FirType::Clock);
    assert_eq!(top.find_port("reset").unwrap().tpe, FirType::UInt(1));
}

#[test]
fn addi_sub_module_implements_the_join_contract() {
    let circuit = lower_handshake_to_firrtl(&simple_addi()).unwrap();
    let sub = circuit.find_module("addi_2ins_1outs").unwrap();
    let text = sub.to_string();

    assert!(text.contains("arg2.data <= add(arg0.data, arg1.data)"), "{}", text);
    assert!(text.contains("node result_valid = and(arg0.valid, arg1.valid)"), "{}", text);
    assert!(text.contains("arg2.valid <= result_valid"), "{}", text);
    assert!(text.contains("node args_ready = and(arg2.ready, result_valid)"), "{}", text);
    assert!(text.contains("arg0.ready <= args_ready"), "{}", text);
    assert!(text.contains("arg1.ready <= args_ready"), "{}", text);

    // Handshake well-formedness: each input ready, output valid, and output data is
    // driven exactly once.
    assert_eq!(drive_count(sub, "arg0.ready"), 1);
    assert_eq!(drive_count(sub, "arg1.ready"), 1);
    assert_eq!(drive_count(sub, "arg2.valid"), 1);
    assert_eq!(drive_count(sub, "arg2.data"), 1);

    // Combinational purity.
    assert_eq!(register_count(sub), 0);
}

#[test]
fn addi_top_module_wires_the_instance() {
    let circuit = lower_handshake_to_firrtl(&simple_addi()).unwrap();
    let top = circuit.find_module("simple_addi").unwrap();
    let text = top.to_string();

    assert_eq!(instances(top), [("addi0".to_string(), "addi_2ins_1outs".to_string())]);
    assert!(text.contains("addi0.arg0 <= arg0"), "{}", text);
    assert!(text.contains("addi0.arg1 <= arg1"), "{}", text);
    assert!(text.contains("arg2 <= addi0.arg2"), "{}", text);

    // The return lowers into exactly one connect onto the output port.
    assert_eq!(drive_count(top, "arg2"), 1);
}

#[test]
fn equal_signatures_share_one_sub_module() {
    let mut builder = FuncBuilder::new("two_adds");
    let a = builder.arg(Type::UInt(32));
    let b = builder.arg(Type::UInt(32));
    let r0 = builder.op1(OpKind::Arith(ArithOp::Add), vec![a, b], Type::UInt(32));
    let r1 = builder.op1(OpKind::Arith(ArithOp::Add), vec![r0, b], Type::UInt(32));
    builder.ret(vec![r1]);

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    assert_eq!(circuit.modules.len(), 2, "one sub-module and the top module");

    let top = circuit.find_module("two_adds").unwrap();
    let insts = instances(top);
    assert_eq!(insts.len(), 2);
    assert!(insts.iter().all(|(_, module)| module == "addi_2ins_1outs"));
    assert_eq!(insts[0].0, "addi0");
    assert_eq!(insts[1].0, "addi1");

    // The second instance consumes the first one's result.
    assert!(top.to_string().contains("addi1.arg0 <= addi0.arg2"));
}

#[test]
fn compare_sub_module_carries_predicate_and_bit_result() {
    let mut builder = FuncBuilder::new("cmp");
    let a = builder.arg(Type::Int(32));
    let b = builder.arg(Type::Int(32));
    let r = builder.op1(OpKind::Cmp(CmpPredicate::Slt), vec![a, b], Type::Int(1));
    builder.ret(vec![r]);

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    let sub = circuit.find_module("cmpi_2ins_1outs_slt").unwrap();

    // Signless integers lower as unsigned, so the compare result is a 1-bit unsigned.
    let fields = sub.find_port("arg2").unwrap().tpe.fields().unwrap();
    assert_eq!(fields[2].tpe, FirType::UInt(1));
    assert!(sub.to_string().contains("arg2.data <= lt(arg0.data, arg1.data)"));
}

#[test]
fn fork_offers_only_once_every_consumer_is_ready() {
    let mut builder = FuncBuilder::new("fork3");
    let a = builder.arg(Type::UInt(8));
    let results =
        builder.op(OpKind::Fork, vec![a], vec![Type::UInt(8), Type::UInt(8), Type::UInt(8)]);
    builder.ret(results);

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    let sub = circuit.find_module("fork_1ins_3outs").unwrap();
    let text = sub.to_string();

    assert!(text.contains("node all_ready = and(arg3.ready, and(arg2.ready, arg1.ready))"), "{}", text);
    assert!(text.contains("arg0.ready <= all_ready"), "{}", text);
    assert!(text.contains("node result_valid = and(arg0.valid, all_ready)"), "{}", text);
    for result in ["arg1", "arg2", "arg3"] {
        assert_eq!(drive_count(sub, &format!("{}.valid", result)), 1);
        assert_eq!(drive_count(sub, &format!("{}.data", result)), 1);
    }
    assert_eq!(register_count(sub), 0);
}

#[test]
fn mux_selects_by_operand_position() {
    let mut builder = FuncBuilder::new("mux2");
    let select = builder.arg(Type::Index);
    let a = builder.arg(Type::UInt(16));
    let b = builder.arg(Type::UInt(16));
    let r = builder.op1(OpKind::Mux, vec![select, a, b], Type::UInt(16));
    builder.ret(vec![r]);

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    let sub = circuit.find_module("mux_3ins_1outs").unwrap();
    let text = sub.to_string();

    assert!(text.contains("when arg0.valid :"), "{}", text);
    assert!(text.contains("when eq(arg0.data, UInt<64>(1)) :"), "{}", text);
    assert!(text.contains("when eq(arg0.data, UInt<64>(2)) :"), "{}", text);
    assert!(text.contains("arg3.data <= arg1.data"), "{}", text);
    assert!(text.contains("arg0.ready <= and(arg1.valid, arg3.ready)"), "{}", text);
}

#[test]
fn merge_gives_priority_to_lower_inputs() {
    let mut builder = FuncBuilder::new("merge2");
    let a = builder.arg(Type::UInt(8));
    let b = builder.arg(Type::UInt(8));
    let r = builder.op1(OpKind::Merge, vec![a, b], Type::UInt(8));
    builder.ret(vec![r]);

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    let sub = circuit.find_module("merge_2ins_1outs").unwrap();
    let text = sub.to_string();

    let first = text.find("when arg0.valid :").unwrap();
    let second = text.find("when arg1.valid :").unwrap();
    assert!(first < second, "lower-indexed inputs must be tested first:\n{}", text);
    assert!(text.contains("arg2.data <= arg0.data"), "{}", text);
    assert!(text.contains("arg0.ready <= arg2.ready"), "{}", text);
}

#[test]
fn control_merge_reports_the_chosen_index() {
    let mut builder = FuncBuilder::new("cmerge");
    let a = builder.arg(Type::None);
    let b = builder.arg(Type::None);
    let results = builder.ctrl_op(OpKind::ControlMerge, vec![a, b], vec![Type::None, Type::Index]);
    builder.ret(results);

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    let sub = circuit.find_module("control_merge_2ins_2outs_ctrl").unwrap();
    let text = sub.to_string();

    assert!(text.contains("node args_ready = and(arg2.ready, arg3.ready)"), "{}", text);
    assert!(text.contains("arg3.data <= UInt<64>(0)"), "{}", text);
    assert!(text.contains("arg3.data <= UInt<64>(1)"), "{}", text);
    assert!(text.contains("arg0.ready <= args_ready"), "{}", text);
    assert!(text.contains("arg1.ready <= args_ready"), "{}", text);
    // Control-path component: the primary result carries no data.
    assert!(sub.find_port("arg2").unwrap().tpe.fields().unwrap().len() == 2);
}

#[test]
fn conditional_branch_routes_by_selector() {
    let mut builder = FuncBuilder::new("cbr");
    let select = builder.arg(Type::Int(1));
    let data = builder.arg(Type::Int(32));
    let results = builder.op(OpKind::CondBranch, vec![select, data], vec![Type::Int(32), Type::Int(32)]);
    builder.ret(results);

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    let sub = circuit.find_module("cond_br_2ins_2outs").unwrap();
    let text = sub.to_string();

    assert!(text.contains("when arg0.valid :"), "{}", text);
    assert!(text.contains("when arg0.data :"), "{}", text);
    assert!(text.contains("arg2.valid <= arg1.valid"), "{}", text);
    assert!(text.contains("arg2.data <= arg1.data"), "{}", text);
    assert!(text.contains("arg0.ready <= and(arg1.valid, arg2.ready)"), "{}", text);
    assert!(text.contains("arg3.valid <= arg1.valid"), "{}", text);
    assert!(text.contains("arg0.ready <= and(arg1.valid, arg3.ready)"), "{}", text);
}

#[test]
fn constant_fires_on_its_trigger() {
    let mut builder = FuncBuilder::new("const42");
    let trigger = builder.arg(Type::None);
    let r = builder.op1(OpKind::Constant { value: 42 }, vec![trigger], Type::UInt(32));
    builder.ret(vec![r]);

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    let sub = circuit.find_module("constant_1ins_1outs").unwrap();
    let text = sub.to_string();

    assert!(text.contains("arg1.valid <= arg0.valid"), "{}", text);
    assert!(text.contains("arg0.ready <= arg1.ready"), "{}", text);
    assert!(text.contains("arg1.data <= UInt<32>(42)"), "{}", text);
}

#[test]
fn sink_is_always_ready() {
    let mut builder = FuncBuilder::new("sink");
    let a = builder.arg(Type::UInt(8));
    builder.op(OpKind::Sink, vec![a], Vec::new());
    builder.ret(Vec::new());

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    let sub = circuit.find_module("sink_1ins_0outs").unwrap();
    let text = sub.to_string();

    assert!(text.contains("arg0.ready <= UInt<1>(1)"), "{}", text);
    // The valid and data subfields of the sunk channel are dead.
    assert!(!text.contains("arg0.valid"), "{}", text);
    assert!(!text.contains("arg0.data"), "{}", text);
}

#[test]
fn join_waits_for_every_input() {
    let mut builder = FuncBuilder::new("join2");
    let a = builder.arg(Type::None);
    let b = builder.arg(Type::None);
    let r = builder.ctrl_op(OpKind::Join, vec![a, b], vec![Type::None]);
    builder.ret(r);

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    let sub = circuit.find_module("join_2ins_1outs_ctrl").unwrap();
    let text = sub.to_string();

    assert!(text.contains("node all_valid = and(arg1.valid, arg0.valid)"), "{}", text);
    assert!(text.contains("arg2.valid <= all_valid"), "{}", text);
    assert!(text.contains("node args_ready = and(arg2.ready, all_valid)"), "{}", text);
    assert_eq!(drive_count(sub, "arg0.ready"), 1);
    assert_eq!(drive_count(sub, "arg1.ready"), 1);
}

#[test]
fn buffer_sub_module_is_clocked_but_unwired() {
    let mut builder = FuncBuilder::new("buf");
    let a = builder.arg(Type::UInt(8));
    let r = builder.op1(OpKind::Buffer { slots: 2, sequential: true }, vec![a], Type::UInt(8));
    builder.ret(vec![r]);

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    let sub = circuit.find_module("buffer_1ins_1outs_2slots_seq").unwrap();

    let names: Vec<&str> = sub.ports.iter().map(|port| port.name.as_str()).collect();
    assert_eq!(names, ["arg0", "arg1", "clock", "reset"]);
    assert!(matches!(&sub.body, Statement::Block { stmts } if stmts.is_empty()));

    let top = circuit.find_module("buf").unwrap();
    let text = top.to_string();
    assert!(text.contains("buffer0.clock <= clock"), "{}", text);
    assert!(text.contains("buffer0.reset <= reset"), "{}", text);
}

fn add(lhs: Value, rhs: Value, result: Value, typ: Type) -> Op {
    Op::new(OpKind::Arith(ArithOp::Add), vec![lhs, rhs], vec![(result, typ)])
}

/// Pipeline over `(a, b, c)` computing `x = a + b; y = a + x; z = c + x; out = y + z`,
/// split over three stages plus the return block.
fn staged_pipeline() -> Func {
    let u32t = Type::UInt(32);
    let mut builder = FuncBuilder::new("pipe");
    let a = builder.arg(u32t);
    let b = builder.arg(u32t);
    let c = builder.arg(u32t);

    let pa = builder.fresh(u32t);
    let pb = builder.fresh(u32t);
    let pc = builder.fresh(u32t);
    let x = builder.fresh(u32t);
    let y = builder.fresh(u32t);
    let z = builder.fresh(u32t);
    let out = builder.fresh(u32t);

    let region = Region::new(vec![
        Block::new(
            vec![(pa, u32t), (pb, u32t), (pc, u32t)],
            vec![add(pa, pb, x, u32t), Op::new(OpKind::Br, Vec::new(), Vec::new())],
        ),
        Block::new(
            Vec::new(),
            vec![add(pa, x, y, u32t), add(pc, x, z, u32t), Op::new(OpKind::Br, Vec::new(), Vec::new())],
        ),
        Block::new(Vec::new(), vec![add(y, z, out, u32t), Op::new(OpKind::Br, Vec::new(), Vec::new())]),
        Block::new(Vec::new(), vec![Op::new(OpKind::PipelineReturn, vec![out], Vec::new())]),
    ]);

    let result = builder.op1(OpKind::Pipeline(region), vec![a, b, c], u32t);
    builder.ret(vec![result]);
    builder.finish()
}

#[test]
fn pipeline_builds_stage_registers() {
    let circuit = lower_handshake_to_firrtl(&staged_pipeline()).unwrap();
    let sub = circuit.find_module("pipeline_3ins_1outs_0").unwrap();
    let text = sub.to_string();

    // One valid register per stage, reset to zero.
    for stage in 0..3 {
        assert!(
            text.contains(&format!("reg valid{} : UInt<1>, clock with :", stage)),
            "{}",
            text
        );
        assert!(text.contains(&format!("wire ready{} : UInt<1>", stage)), "{}", text);
    }
    assert!(!text.contains("valid3"), "{}", text);

    // Stage 0 registers `a`, `c`, and `x` for the later stages; `b` dies in stage 0.
    assert!(text.contains("reg data0_0 : UInt<32>, clock"), "{}", text);
    assert!(text.contains("reg data0_1 : UInt<32>, clock"), "{}", text);
    assert!(text.contains("reg data0_2 : UInt<32>, clock"), "{}", text);
    assert!(text.contains("reg data1_0 : UInt<32>, clock"), "{}", text);
    assert!(text.contains("reg data1_1 : UInt<32>, clock"), "{}", text);
    assert!(text.contains("reg data2_0 : UInt<32>, clock"), "{}", text);
    assert_eq!(register_count(sub), 9);

    // Stage-internal adds read same-stage defs directly and crossing values from the
    // stage registers.
    assert!(text.contains("node t0 = add(arg0.data, arg1.data)"), "{}", text);
    assert!(text.contains("node t1 = add(data0_0, data0_2)"), "{}", text);
    assert!(text.contains("node t2 = add(data0_1, data0_2)"), "{}", text);
    assert!(text.contains("node t3 = add(data1_0, data1_1)"), "{}", text);

    // The pipeline output reads the last stage's register.
    assert!(text.contains("arg3.data <= data2_0"), "{}", text);
}

#[test]
fn pipeline_flush_network_propagates_back_pressure() {
    let circuit = lower_handshake_to_firrtl(&staged_pipeline()).unwrap();
    let sub = circuit.find_module("pipeline_3ins_1outs_0").unwrap();
    let text = sub.to_string();

    assert!(text.contains("wire valid_in : UInt<1>"), "{}", text);
    assert!(text.contains("wire ready_in : UInt<1>"), "{}", text);

    // Stage 0 interfaces the inlet, stage 2 the outlet.
    assert!(text.contains("when and(ready1, valid_in) :"), "{}", text);
    assert!(text.contains("when and(ready1, not(valid_in)) :"), "{}", text);
    assert!(text.contains("when and(ready_in, valid1) :"), "{}", text);
    assert!(text.contains("ready2 <= ready_in"), "{}", text);

    // A full stage forwards the downstream ready; a bubble is always writable.
    assert!(text.contains("ready0 <= ready1"), "{}", text);
    assert!(text.contains("ready0 <= UInt<1>(1)"), "{}", text);
    assert!(text.contains("valid0 <= valid_in"), "{}", text);
    assert!(text.contains("valid1 <= valid0"), "{}", text);
    assert!(text.contains("valid0 <= UInt<1>(0)"), "{}", text);

    // Data registers refill from their source values.
    assert!(text.contains("data0_0 <= arg0.data"), "{}", text);
    assert!(text.contains("data0_1 <= arg2.data"), "{}", text);
    assert!(text.contains("data0_2 <= t0"), "{}", text);
    assert!(text.contains("data2_0 <= t3"), "{}", text);
}

#[test]
fn pipeline_instance_is_clocked() {
    let circuit = lower_handshake_to_firrtl(&staged_pipeline()).unwrap();
    let top = circuit.find_module("pipe").unwrap();
    let text = top.to_string();

    assert_eq!(instances(top), [("pipeline0".to_string(), "pipeline_3ins_1outs_0".to_string())]);
    assert!(text.contains("pipeline0.arg0 <= arg0"), "{}", text);
    assert!(text.contains("pipeline0.clock <= clock"), "{}", text);
    assert!(text.contains("pipeline0.reset <= reset"), "{}", text);
    assert!(text.contains("arg3 <= pipeline0.arg3"), "{}", text);
}

#[test]
fn multi_clock_top_module_names_its_domains() {
    let circuit = Firgen::with_num_clocks(2).gen_circuit(&simple_addi()).unwrap();
    let top = circuit.find_module("simple_addi").unwrap();
    let names: Vec<&str> = top.ports.iter().map(|port| port.name.as_str()).collect();
    assert_eq!(names, ["arg0", "arg1", "arg2", "clock0", "reset0", "clock1", "reset1"]);
}

#[test]
fn circuit_renders_as_fir_text() {
    let circuit = lower_handshake_to_firrtl(&simple_addi()).unwrap();
    let text = circuit.to_string();
    assert!(text.starts_with("circuit simple_addi :"), "{}", text);
    assert!(text.contains("module addi_2ins_1outs :"), "{}", text);
    assert!(text.contains("input arg0 : { valid : UInt<1>, flip ready : UInt<1>, data : UInt<32> }"), "{}", text);
}

#[test]
fn float_types_are_rejected() {
    let mut builder = FuncBuilder::new("bad");
    let a = builder.arg(Type::Float(32));
    builder.ret(vec![a]);

    let err = lower_handshake_to_firrtl(&builder.finish()).unwrap_err();
    assert!(matches!(err, FirgenError::UnsupportedType { .. }), "{}", err);
}

#[test]
fn misplaced_terminators_are_rejected() {
    let mut builder = FuncBuilder::new("bad");
    let a = builder.arg(Type::UInt(8));
    builder.op(OpKind::Br, Vec::new(), Vec::new());
    builder.ret(vec![a]);

    let err = lower_handshake_to_firrtl(&builder.finish()).unwrap_err();
    assert!(matches!(err, FirgenError::UnsupportedOp { .. }), "{}", err);
}

#[test]
fn pipeline_rejects_unsupported_stage_operations() {
    let u32t = Type::UInt(32);
    let mut builder = FuncBuilder::new("bad_pipe");
    let a = builder.arg(u32t);
    let pa = builder.fresh(u32t);
    let x = builder.fresh(u32t);

    let region = Region::new(vec![
        Block::new(
            vec![(pa, u32t)],
            vec![
                Op::new(OpKind::Arith(ArithOp::Mul), vec![pa, pa], vec![(x, u32t)]),
                Op::new(OpKind::Br, Vec::new(), Vec::new()),
            ],
        ),
        Block::new(Vec::new(), vec![Op::new(OpKind::PipelineReturn, vec![x], Vec::new())]),
    ]);
    let result = builder.op1(OpKind::Pipeline(region), vec![a], u32t);
    builder.ret(vec![result]);

    let err = lower_handshake_to_firrtl(&builder.finish()).unwrap_err();
    assert!(matches!(err, FirgenError::UnsupportedOp { op } if op == "muli"), "unexpected error");
}

#[test]
fn pipeline_rejects_bad_terminators() {
    let u32t = Type::UInt(32);
    let mut builder = FuncBuilder::new("bad_pipe");
    let a = builder.arg(u32t);
    let pa = builder.fresh(u32t);

    let region = Region::new(vec![Block::new(vec![(pa, u32t)], vec![Op::new(OpKind::Return, vec![pa], Vec::new())])]);
    let result = builder.op1(OpKind::Pipeline(region), vec![a], u32t);
    builder.ret(vec![result]);

    let err = lower_handshake_to_firrtl(&builder.finish()).unwrap_err();
    assert!(matches!(err, FirgenError::Malformed { .. }), "{}", err);
}

#[test]
fn port_count_violations_are_rejected() {
    let mut builder = FuncBuilder::new("bad");
    let a = builder.arg(Type::UInt(8));
    let r = builder.op1(OpKind::Arith(ArithOp::Add), vec![a], Type::UInt(8));
    builder.ret(vec![r]);

    let err = lower_handshake_to_firrtl(&builder.finish()).unwrap_err();
    assert!(matches!(err, FirgenError::Malformed { .. }), "{}", err);
}

#[test]
fn pass_metadata_is_stable() {
    assert_eq!(PASS_NAME, "lower-handshake-to-firrtl");
    assert!(!PASS_DESCRIPTION.is_empty());
}

#[test]
fn every_combinational_sub_module_is_register_free() {
    let mut builder = FuncBuilder::new("many");
    let a = builder.arg(Type::UInt(8));
    let b = builder.arg(Type::UInt(8));
    let sum = builder.op1(OpKind::Arith(ArithOp::Add), vec![a, b], Type::UInt(8));
    let forks = builder.op(OpKind::Fork, vec![sum], vec![Type::UInt(8), Type::UInt(8)]);
    let merged = builder.op1(OpKind::Merge, vec![forks[0], forks[1]], Type::UInt(8));
    builder.ret(vec![merged]);

    let circuit = lower_handshake_to_firrtl(&builder.finish()).unwrap();
    for module in &circuit.modules {
        assert_eq!(register_count(module), 0, "module `{}` must stay combinational", module.name);
    }
}
