//! Pipeline lowering.
//!
//! A `pipeline` region lowers into a dedicated sub-module. Every block of the region that
//! is not terminated by the pipeline return is one stage: it receives a valid register, a
//! ready wire, and one data register per value that later stages consume. The stage
//! registers are tied together by a flushable back-pressure network: a stage holding a
//! token advances when its successor is ready, a stage holding a bubble absorbs whatever
//! its predecessor offers.

use std::collections::{HashMap, HashSet};

use crate::fir::{self, Expression, Statement};
use crate::handshake::{ArithOp, Op, OpKind, Region, Type, Value};

use super::{data_type, extract_channels, sub_module_ports, FirgenError};

fn malformed(reason: &str) -> FirgenError { FirgenError::malformed("pipeline", reason) }

/// Resolves a value used in `block`: values defined in the same block read their defining
/// expression, values defined in an earlier stage read that stage's data register.
fn resolve(
    def_exprs: &HashMap<Value, Expression>, reg_exprs: &HashMap<Value, Expression>,
    block_of: &HashMap<Value, usize>, block: usize, value: Value,
) -> Result<Expression, FirgenError> {
    if block_of.get(&value) == Some(&block) {
        def_exprs.get(&value).cloned().ok_or_else(|| malformed("operand used before it is defined"))
    } else {
        reg_exprs
            .get(&value)
            .cloned()
            .ok_or_else(|| malformed("value crosses a stage boundary without a register"))
    }
}

/// Lowers one `pipeline` operation into its sub-module.
pub(super) fn gen_pipeline_module(
    name: String, op: &Op, region: &Region, typs: &HashMap<Value, Type>,
) -> Result<fir::Module, FirgenError> {
    let ports = sub_module_ports(op, typs, true)?;
    let channels = extract_channels(&ports);
    let num_ins = op.operands.len();

    let entry = region.blocks.first().ok_or_else(|| malformed("empty pipeline region"))?;
    if entry.args.len() != num_ins {
        return Err(malformed("entry block arguments do not match the pipeline operands"));
    }

    // Defining expression of every value, within its own block: entry block arguments read
    // the data subfields of the input ports, lowered results read their nodes.
    let mut def_exprs: HashMap<Value, Expression> = HashMap::new();
    for ((value, _), channel) in entry.args.iter().zip(&channels) {
        let (data, _) = channel.data.as_ref().ok_or_else(|| malformed("control-only pipeline input"))?;
        def_exprs.insert(*value, data.clone());
    }

    // Defining block of every value, and the set of values consumed outside it.
    let mut block_of: HashMap<Value, usize> = HashMap::new();
    for (b, block) in region.blocks.iter().enumerate() {
        for (value, _) in &block.args {
            block_of.insert(*value, b);
        }
        for inner in &block.ops {
            for (value, _) in &inner.results {
                block_of.insert(*value, b);
            }
        }
    }
    let mut crossing: HashSet<Value> = HashSet::new();
    for (b, block) in region.blocks.iter().enumerate() {
        for inner in &block.ops {
            for operand in &inner.operands {
                if block_of.get(operand).map(|def| *def != b).unwrap_or(false) {
                    crossing.insert(*operand);
                }
            }
        }
    }

    let signal = fir::Type::uint(1);
    let clock = Expression::reference("clock");
    let reset = Expression::reference("reset");

    let mut stmts: Vec<Statement> = Vec::new();
    let mut valid_regs: Vec<String> = Vec::new();
    let mut ready_wires: Vec<String> = Vec::new();
    let mut data_regs: Vec<Vec<(String, Expression)>> = Vec::new();
    let mut reg_exprs: HashMap<Value, Expression> = HashMap::new();
    let mut ret_operands: Option<&[Value]> = None;
    let mut temp_count = 0usize;

    let last_block = region.blocks.len() - 1;
    for (b, block) in region.blocks.iter().enumerate() {
        if b > 0 && !block.args.is_empty() {
            return Err(malformed("stage blocks must not take arguments"));
        }
        let terminator = block.terminator().ok_or_else(|| malformed("block without terminator"))?;
        let is_return = match terminator.kind {
            OpKind::PipelineReturn => true,
            OpKind::Br => false,
            _ => return Err(malformed("stage terminated by neither a branch nor a pipeline return")),
        };
        if is_return != (b == last_block) {
            return Err(malformed("pipeline return must terminate the last block"));
        }

        // Lower the block-internal arithmetic.
        for inner in &block.ops[..block.ops.len() - 1] {
            match &inner.kind {
                OpKind::Arith(ArithOp::Add) => {
                    if inner.operands.len() != 2 || inner.results.len() != 1 {
                        return Err(malformed("addition with unexpected operand or result count"));
                    }
                    let lhs = resolve(&def_exprs, &reg_exprs, &block_of, b, inner.operands[0])?;
                    let rhs = resolve(&def_exprs, &reg_exprs, &block_of, b, inner.operands[1])?;
                    let node = format!("t{}", temp_count);
                    temp_count += 1;
                    stmts.push(Statement::def_node(node.clone(), Expression::do_prim(fir::PrimOp::Add, vec![lhs, rhs])));
                    def_exprs.insert(inner.results[0].0, Expression::reference(node));
                }
                _ => return Err(FirgenError::UnsupportedOp { op: inner.kind.mnemonic().to_string() }),
            }
        }

        if is_return {
            if terminator.operands.len() != op.results.len() {
                return Err(malformed("pipeline return operands do not match the pipeline results"));
            }
            ret_operands = Some(terminator.operands.as_slice());
            continue;
        }

        let stage = valid_regs.len();

        // Valid register and ready wire of this stage. The ready wire stays unregistered
        // so back-pressure reaches upstream within the same cycle.
        let valid_name = format!("valid{}", stage);
        let ready_name = format!("ready{}", stage);
        stmts.push(Statement::def_reg_init(
            valid_name.clone(),
            signal.clone(),
            clock.clone(),
            reset.clone(),
            Expression::uint(1, 0),
        ));
        stmts.push(Statement::def_wire(ready_name.clone(), signal.clone()));
        valid_regs.push(valid_name);
        ready_wires.push(ready_name);

        // Stage registers for every value that crosses a stage boundary.
        let defined: Vec<(Value, Type)> = block
            .args
            .iter()
            .copied()
            .chain(block.ops.iter().flat_map(|inner| inner.results.iter().copied()))
            .collect();
        let mut regs = Vec::new();
        for (value, typ) in defined.iter().filter(|(value, _)| crossing.contains(value)) {
            let reg_name = format!("data{}_{}", stage, regs.len());
            let tpe = data_type(typ).ok_or_else(|| FirgenError::unsupported_type("pipeline", *typ))?;
            stmts.push(Statement::def_reg(reg_name.clone(), tpe, clock.clone()));
            let source = def_exprs
                .get(value)
                .cloned()
                .ok_or_else(|| malformed("stage register source is not defined"))?;
            regs.push((reg_name.clone(), source));
            reg_exprs.insert(*value, Expression::reference(reg_name));
        }
        data_regs.push(regs);
    }

    // Flushable back-pressure network. The wires stand for the not-yet-wired outer
    // handshake: the predecessor of stage 0 and the successor of the last stage.
    stmts.push(Statement::def_wire("valid_in", signal.clone()));
    stmts.push(Statement::def_wire("ready_in", signal));

    let num_stages = valid_regs.len();
    for stage in 0..num_stages {
        let valid_prev = if stage == 0 {
            Expression::reference("valid_in")
        } else {
            Expression::reference(valid_regs[stage - 1].clone())
        };
        let ready_next = if stage == num_stages - 1 {
            Expression::reference("ready_in")
        } else {
            Expression::reference(ready_wires[stage + 1].clone())
        };
        let valid_reg = Expression::reference(valid_regs[stage].clone());
        let ready_wire = Expression::reference(ready_wires[stage].clone());

        let reg_connects: Vec<Statement> = data_regs[stage]
            .iter()
            .map(|(name, source)| Statement::connect(Expression::reference(name.clone()), source.clone()))
            .collect();

        // Stage holds a token: data registers refill only when the token moves out and a
        // new one moves in; the stage drains to a bubble when nothing follows.
        let conseq = vec![
            Statement::when(Expression::and(ready_next.clone(), valid_prev.clone()), reg_connects.clone()),
            Statement::when(
                Expression::and(ready_next.clone(), Expression::not(valid_prev.clone())),
                vec![Statement::connect(valid_reg.clone(), Expression::uint(1, 0))],
            ),
            Statement::connect(ready_wire.clone(), ready_next),
        ];

        // Stage holds a bubble: its registers are free to take whatever arrives.
        let mut alt = reg_connects;
        alt.push(Statement::connect(valid_reg.clone(), valid_prev));
        alt.push(Statement::connect(ready_wire, Expression::uint(1, 1)));

        stmts.push(Statement::when_else(valid_reg, conseq, alt));
    }

    // Connect the pipeline return onto the data subfields of the output ports.
    let ret_operands = ret_operands.ok_or_else(|| malformed("pipeline region has no return"))?;
    for (k, value) in ret_operands.iter().enumerate() {
        let (data, _) = channels[num_ins + k]
            .data
            .as_ref()
            .ok_or_else(|| malformed("control-only pipeline output"))?;
        let expr = resolve(&def_exprs, &reg_exprs, &block_of, last_block, *value)?;
        stmts.push(Statement::connect(data.clone(), expr));
    }

    Ok(fir::Module { name, ports, body: Statement::block(stmts) })
}
