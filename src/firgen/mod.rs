//! Lowers handshake functions into FIRRTL circuits.
//!
//! Process of lowering:
//!
//! 1. create a FIRRTL circuit named after the function;
//! 2. create the top module: one handshaked bundle port per function argument and result,
//!    followed by the clock/reset pairs;
//! 3. for each operation of the function body:
//!    1. look up the operator signature in the sub-module cache;
//!    2. on a miss, create the sub-module, extract the valid/ready/data subfields of each
//!       port, and build the component's logic against them;
//!    3. instantiate the sub-module in the top module and wire the instance to the
//!       producers and consumers of the operation's values;
//! 4. rewrite the `return` into connects onto the output ports.
//!
//! Pipelines take a dedicated path: each `pipeline` region becomes its own sub-module,
//! never shared through the cache.

mod builders;
mod error;
mod pipeline;

use std::collections::HashMap;

use linked_hash_map::LinkedHashMap;

pub use error::FirgenError;

use crate::fir;
use crate::handshake::{Func, Op, OpKind, Region, Type, Value, INDEX_WIDTH};

/// Name under which the pass registers with a host driver.
pub const PASS_NAME: &str = "lower-handshake-to-firrtl";

/// One-line description of the pass.
pub const PASS_DESCRIPTION: &str = "lower handshake functions into FIRRTL circuits";

/// Lowers `func` into a FIRRTL circuit with a single clock domain.
pub fn lower_handshake_to_firrtl(func: &Func) -> Result<fir::Circuit, FirgenError> {
    Firgen::new().gen_circuit(func)
}

/// Subfield handles of one handshaked port, extracted once per bundle port and shared by
/// every logic builder.
#[derive(Debug, Clone)]
pub(crate) struct Channel {
    /// The `valid` subfield.
    pub(crate) valid: fir::Expression,

    /// The `ready` subfield.
    pub(crate) ready: fir::Expression,

    /// The `data` subfield and its type; absent on control-only channels.
    pub(crate) data: Option<(fir::Expression, fir::Type)>,
}

impl Channel {
    /// The data subfield, required by the calling builder.
    fn data_expr(&self, op: &str) -> Result<&fir::Expression, FirgenError> {
        self.data
            .as_ref()
            .map(|(expr, _)| expr)
            .ok_or_else(|| FirgenError::malformed(op, "expected a data-carrying channel"))
    }
}

/// Returns the FIRRTL ground type carried by a channel of the given element type, or
/// `None` if the element type has no data lowering.
pub(crate) fn data_type(typ: &Type) -> Option<fir::Type> {
    match typ {
        Type::SInt(width) => Some(fir::Type::sint(*width)),
        Type::UInt(width) => Some(fir::Type::uint(*width)),
        // Signless integers lower as unsigned. Whether a sign-cast primitive should be
        // emitted instead is unresolved.
        Type::Int(width) => Some(fir::Type::uint(*width)),
        Type::Index => Some(fir::Type::uint(INDEX_WIDTH)),
        Type::None | Type::Float(_) => None,
    }
}

/// Returns the handshake bundle type of a channel carrying `typ`, or `None` if the element
/// type is unsupported. A flipped bundle reverses the `valid` and `data` directions, the
/// producer view of a result port.
pub(crate) fn bundle_type(typ: &Type, flip: bool) -> Option<fir::Type> {
    let data = match typ {
        Type::None => None,
        _ => Some(data_type(typ)?),
    };

    let signal = fir::Type::uint(1);
    let mut fields = vec![
        fir::BundleField::new("valid", flip, signal.clone()),
        fir::BundleField::new("ready", !flip, signal),
    ];
    if let Some(data) = data {
        fields.push(fir::BundleField::new("data", flip, data));
    }

    Some(fir::Type::bundle(fields))
}

/// Extracts the `(valid, ready, data)` subfields of every bundle port; clock and reset
/// ports have no subfields and are referenced by name instead.
pub(crate) fn extract_channels(ports: &[fir::Port]) -> Vec<Channel> {
    ports
        .iter()
        .filter_map(|port| {
            let fields = port.tpe.fields()?;
            let base = fir::Expression::reference(port.name.clone());

            let mut valid = None;
            let mut ready = None;
            let mut data = None;
            for field in fields {
                let expr = fir::Expression::sub_field(base.clone(), field.name.clone());
                match field.name.as_str() {
                    "valid" => valid = Some(expr),
                    "ready" => ready = Some(expr),
                    "data" => data = Some((expr, field.tpe.clone())),
                    _ => {}
                }
            }
            Some(Channel { valid: valid?, ready: ready?, data })
        })
        .collect()
}

/// Builds the port list of a sub-module mirroring `op`: one non-flipped bundle per
/// operand, one flipped bundle per result, then clock and reset when required.
pub(crate) fn sub_module_ports(
    op: &Op, typs: &HashMap<Value, Type>, has_clock: bool,
) -> Result<Vec<fir::Port>, FirgenError> {
    let mnemonic = op.kind.mnemonic();
    let mut ports = Vec::new();

    for (i, operand) in op.operands.iter().enumerate() {
        let typ = typs
            .get(operand)
            .copied()
            .ok_or_else(|| FirgenError::malformed(mnemonic, "operand is not defined in the function"))?;
        let tpe = bundle_type(&typ, false).ok_or_else(|| FirgenError::unsupported_type(mnemonic, typ))?;
        ports.push(fir::Port::input(format!("arg{}", i), tpe));
    }

    let num_ins = op.operands.len();
    for (j, (_, typ)) in op.results.iter().enumerate() {
        let tpe = bundle_type(typ, true).ok_or_else(|| FirgenError::unsupported_type(mnemonic, *typ))?;
        ports.push(fir::Port::input(format!("arg{}", num_ins + j), tpe));
    }

    if has_clock {
        ports.push(fir::Port::input("clock", fir::Type::clock()));
        ports.push(fir::Port::input("reset", fir::Type::uint(1)));
    }

    Ok(ports)
}

/// Checks that the operand and result counts of `op` fit its operator kind; beyond this
/// and type support, no semantic validation takes place.
fn check_port_counts(op: &Op) -> Result<(), FirgenError> {
    let (ins, outs) = (op.operands.len(), op.results.len());
    let ok = match &op.kind {
        OpKind::Arith(_) | OpKind::Cmp(_) => ins == 2 && outs == 1,
        OpKind::Sink => ins == 1 && outs == 0,
        OpKind::Join | OpKind::Merge => ins >= 1 && outs == 1,
        OpKind::Mux => ins >= 2 && outs == 1,
        OpKind::ControlMerge => ins >= 1 && outs == 2,
        OpKind::Branch | OpKind::Constant { .. } | OpKind::Buffer { .. } => ins == 1 && outs == 1,
        OpKind::CondBranch => ins == 2 && outs == 2,
        OpKind::Fork | OpKind::LazyFork => ins == 1 && outs >= 1,
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(FirgenError::malformed(op.kind.mnemonic(), "unexpected operand or result count"))
    }
}

/// Records the element type of every value defined in `region`, pipelines included.
fn collect_value_types(region: &Region, typs: &mut HashMap<Value, Type>) {
    for block in &region.blocks {
        for (value, typ) in &block.args {
            typs.insert(*value, *typ);
        }
        for op in &block.ops {
            for (value, typ) in &op.results {
                typs.insert(*value, *typ);
            }
            if let OpKind::Pipeline(inner) = &op.kind {
                collect_value_types(inner, typs);
            }
        }
    }
}

/// FIRRTL generator: lowers one handshake function into a circuit containing the top
/// module plus one sub-module per distinct operator signature.
#[derive(Debug)]
pub struct Firgen {
    /// Number of clock domains of the top module.
    num_clocks: usize,

    /// Sub-modules in creation order.
    modules: Vec<fir::Module>,

    /// Sub-module cache: operator signature to index into `modules`.
    cache: LinkedHashMap<String, usize>,

    /// Number of pipelines lowered so far; pipelines are never shared through the cache.
    pipeline_count: usize,

    /// Per-mnemonic instance counters.
    inst_count: LinkedHashMap<&'static str, usize>,
}

impl Default for Firgen {
    fn default() -> Self { Self::new() }
}

impl Firgen {
    /// Creates a generator with a single clock domain.
    pub fn new() -> Self { Self::with_num_clocks(1) }

    /// Creates a generator with `num_clocks` clock domains.
    pub fn with_num_clocks(num_clocks: usize) -> Self {
        assert!(num_clocks >= 1, "a circuit needs at least one clock domain");
        Firgen {
            num_clocks,
            modules: Vec::new(),
            cache: LinkedHashMap::new(),
            pipeline_count: 0,
            inst_count: LinkedHashMap::new(),
        }
    }

    /// Lowers `func` into a FIRRTL circuit.
    pub fn gen_circuit(mut self, func: &Func) -> Result<fir::Circuit, FirgenError> {
        let entry = match func.body.blocks.as_slice() {
            [entry] => entry,
            _ => return Err(FirgenError::malformed("func", "expected a single-block body")),
        };
        if !matches!(entry.terminator().map(|op| &op.kind), Some(OpKind::Return)) {
            return Err(FirgenError::malformed("func", "expected a `return` terminator"));
        }

        let mut typs = HashMap::new();
        collect_value_types(&func.body, &mut typs);

        // Top module ports: arguments, results, then the clock/reset pairs.
        let num_ins = entry.args.len();
        let mut ports = Vec::new();
        for (i, (_, typ)) in entry.args.iter().enumerate() {
            let tpe = bundle_type(typ, false).ok_or_else(|| FirgenError::unsupported_type("func", *typ))?;
            ports.push(fir::Port::input(format!("arg{}", i), tpe));
        }
        for (j, typ) in func.results.iter().enumerate() {
            let tpe = bundle_type(typ, true).ok_or_else(|| FirgenError::unsupported_type("func", *typ))?;
            ports.push(fir::Port::input(format!("arg{}", num_ins + j), tpe));
        }
        for domain in 0..self.num_clocks {
            ports.push(fir::Port::input(self.clock_name(domain), fir::Type::clock()));
            ports.push(fir::Port::input(self.reset_name(domain), fir::Type::uint(1)));
        }

        // Every function argument reads its port.
        let mut env: HashMap<Value, fir::Expression> = HashMap::new();
        for (i, (value, _)) in entry.args.iter().enumerate() {
            env.insert(*value, fir::Expression::reference(format!("arg{}", i)));
        }

        // First walk: create (or reuse) the sub-module of every operation, and bind each
        // result value to its instance subfield. Binding everything up front lets operand
        // connects reference instances created later in the walk, which graph regions
        // permit.
        let mut insts: Vec<(usize, String, &Op)> = Vec::new();
        let mut ret: Option<&Op> = None;
        for op in &entry.ops {
            let module_idx = match &op.kind {
                OpKind::Return => {
                    ret = Some(op);
                    continue;
                }
                OpKind::Br | OpKind::PipelineReturn => {
                    return Err(FirgenError::UnsupportedOp { op: op.kind.mnemonic().to_string() })
                }
                OpKind::Pipeline(region) => {
                    let name = format!("{}_{}", op.sub_module_name(), self.pipeline_count);
                    self.pipeline_count += 1;
                    log::debug!("lowering pipeline into sub-module `{}`", name);
                    let module = pipeline::gen_pipeline_module(name, op, region, &typs)?;
                    self.modules.push(module);
                    self.modules.len() - 1
                }
                _ => self.sub_module(op, &typs)?,
            };

            let inst = self.inst_name(op.kind.mnemonic());
            for (j, (value, _)) in op.results.iter().enumerate() {
                let field = format!("arg{}", op.operands.len() + j);
                env.insert(*value, fir::Expression::sub_field(fir::Expression::reference(inst.clone()), field));
            }
            insts.push((module_idx, inst, op));
        }

        // Second walk: declare the instances, then wire each instance port in the fixed
        // order operands, results, clock, reset.
        let mut stmts: Vec<fir::Statement> = Vec::new();
        for (module_idx, inst, _) in &insts {
            stmts.push(fir::Statement::def_inst(inst.clone(), self.modules[*module_idx].name.clone()));
        }
        for (module_idx, inst, op) in &insts {
            let sub = &self.modules[*module_idx];
            let num_op_ins = op.operands.len();
            let num_args = num_op_ins + op.results.len();

            for (k, port) in sub.ports.iter().enumerate() {
                let field =
                    fir::Expression::sub_field(fir::Expression::reference(inst.clone()), port.name.clone());
                if k < num_op_ins {
                    let expr = env.get(&op.operands[k]).cloned().ok_or_else(|| {
                        FirgenError::malformed(op.kind.mnemonic(), "operand is not defined in the function")
                    })?;
                    stmts.push(fir::Statement::connect(field, expr));
                } else if k < num_args {
                    // Result subfields were bound to their values in the first walk.
                } else {
                    let domain = 0;
                    let signal =
                        if k == num_args { self.clock_name(domain) } else { self.reset_name(domain) };
                    stmts.push(fir::Statement::connect(field, fir::Expression::reference(signal)));
                }
            }
        }

        // Rewrite the return into connects onto the output ports, in argument order.
        let ret = ret.ok_or_else(|| FirgenError::malformed("func", "expected a `return` terminator"))?;
        for (k, value) in ret.operands.iter().enumerate() {
            let expr = env
                .get(value)
                .cloned()
                .ok_or_else(|| FirgenError::malformed("return", "operand is not defined in the function"))?;
            stmts.push(fir::Statement::connect(
                fir::Expression::reference(format!("arg{}", num_ins + k)),
                expr,
            ));
        }

        let top = fir::Module { name: func.name.clone(), ports, body: fir::Statement::block(stmts) };
        let mut modules = self.modules;
        modules.push(top);
        Ok(fir::Circuit { main: func.name.clone(), modules })
    }

    /// Returns the cached sub-module for `op`, building it on a cache miss.
    fn sub_module(&mut self, op: &Op, typs: &HashMap<Value, Type>) -> Result<usize, FirgenError> {
        check_port_counts(op)?;

        let name = op.sub_module_name();
        if let Some(&idx) = self.cache.get(&name) {
            log::debug!("reusing sub-module `{}`", name);
            return Ok(idx);
        }
        log::debug!("creating sub-module `{}`", name);

        let has_clock = matches!(op.kind, OpKind::Buffer { .. });
        let ports = sub_module_ports(op, typs, has_clock)?;
        let channels = extract_channels(&ports);

        let stmts = match &op.kind {
            OpKind::Arith(arith) => builders::binary((*arith).into(), op.kind.mnemonic(), &channels)?,
            OpKind::Cmp(pred) => builders::binary((*pred).into(), op.kind.mnemonic(), &channels)?,
            OpKind::Sink => builders::sink(&channels),
            OpKind::Join => builders::join(&channels),
            OpKind::Mux => builders::mux(&channels)?,
            OpKind::Merge => builders::merge(&channels),
            OpKind::ControlMerge => builders::control_merge(op.control, &channels)?,
            OpKind::Branch => builders::branch(op.control, &channels),
            OpKind::CondBranch => builders::cond_branch(op.control, &channels)?,
            OpKind::Fork | OpKind::LazyFork => builders::fork(op.control, &channels),
            OpKind::Constant { value } => builders::constant(*value, &channels)?,
            OpKind::Buffer { .. } => builders::buffer(&channels),
            OpKind::Pipeline(_) | OpKind::Return | OpKind::Br | OpKind::PipelineReturn => {
                unreachable!("handled by the driver")
            }
        };

        let idx = self.modules.len();
        self.modules.push(fir::Module { name: name.clone(), ports, body: fir::Statement::block(stmts) });
        self.cache.insert(name, idx);
        Ok(idx)
    }

    /// Allocates an instance name for a sub-module of the given operator.
    fn inst_name(&mut self, mnemonic: &'static str) -> String {
        let count = self.inst_count.entry(mnemonic).or_insert(0);
        let name = format!("{}{}", mnemonic, count);
        *count += 1;
        name
    }

    /// Name of the clock port of the given domain.
    fn clock_name(&self, domain: usize) -> String {
        if self.num_clocks == 1 {
            "clock".to_string()
        } else {
            format!("clock{}", domain)
        }
    }

    /// Name of the reset port of the given domain.
    fn reset_name(&self, domain: usize) -> String {
        if self.num_clocks == 1 {
            "reset".to_string()
        } else {
            format!("reset{}", domain)
        }
    }
}
