//! Operations.

use crate::handshake::{Region, Type, Value};

/// Binary arithmetic, logical, and shift operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// Addition.
    Add,

    /// Subtraction.
    Sub,

    /// Multiplication.
    Mul,

    /// Bitwise and.
    And,

    /// Bitwise or.
    Or,

    /// Bitwise exclusive or.
    Xor,

    /// Shift left.
    Shl,

    /// Arithmetic (signed) shift right.
    ShrS,
}

impl ArithOp {
    /// Returns the operator mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            ArithOp::Add => "addi",
            ArithOp::Sub => "subi",
            ArithOp::Mul => "muli",
            ArithOp::And => "andi",
            ArithOp::Or => "ori",
            ArithOp::Xor => "xori",
            ArithOp::Shl => "shli",
            ArithOp::ShrS => "shrsi",
        }
    }
}

/// Comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpPredicate {
    /// Equal.
    Eq,

    /// Not equal.
    Ne,

    /// Signed less than.
    Slt,

    /// Signed less than or equal.
    Sle,

    /// Signed greater than.
    Sgt,

    /// Signed greater than or equal.
    Sge,
}

impl CmpPredicate {
    /// Returns the predicate name.
    pub fn as_str(self) -> &'static str {
        match self {
            CmpPredicate::Eq => "eq",
            CmpPredicate::Ne => "ne",
            CmpPredicate::Slt => "slt",
            CmpPredicate::Sle => "sle",
            CmpPredicate::Sgt => "sgt",
            CmpPredicate::Sge => "sge",
        }
    }
}

/// Operator kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpKind {
    /// Binary arithmetic on two data channels.
    Arith(ArithOp),

    /// Comparison of two data channels.
    Cmp(CmpPredicate),

    /// Consumes every incoming token without ever blocking.
    Sink,

    /// Joins control tokens: fires once all inputs hold a token.
    Join,

    /// Routes the data input selected by the selector channel to the result.
    Mux,

    /// Merges inputs into one channel; lower-indexed inputs take priority.
    Merge,

    /// Merge that additionally reports the index of the chosen input.
    ControlMerge,

    /// Unconditional branch: passes its channel through.
    Branch,

    /// Routes the data channel to one of two results, chosen by the selector channel.
    CondBranch,

    /// Replicates one token to every result channel.
    Fork,

    /// Fork that transfers only once every consumer is ready.
    LazyFork,

    /// Emits a literal each time the trigger channel fires.
    Constant {
        /// The literal value.
        value: u64,
    },

    /// Elastic buffer decoupling its two sides.
    Buffer {
        /// Number of slots.
        slots: u64,
        /// Whether the buffer is sequential.
        sequential: bool,
    },

    /// Statically scheduled multi-stage pipeline over the nested region.
    Pipeline(Region),

    /// Function terminator.
    Return,

    /// Unconditional branch terminating a pipeline stage.
    Br,

    /// Terminator of a pipeline region; its operands are the pipeline outputs.
    PipelineReturn,
}

impl OpKind {
    /// Returns the operator mnemonic.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpKind::Arith(op) => op.mnemonic(),
            OpKind::Cmp(_) => "cmpi",
            OpKind::Sink => "sink",
            OpKind::Join => "join",
            OpKind::Mux => "mux",
            OpKind::Merge => "merge",
            OpKind::ControlMerge => "control_merge",
            OpKind::Branch => "branch",
            OpKind::CondBranch => "cond_br",
            OpKind::Fork => "fork",
            OpKind::LazyFork => "lazy_fork",
            OpKind::Constant { .. } => "constant",
            OpKind::Buffer { .. } => "buffer",
            OpKind::Pipeline(_) => "pipeline",
            OpKind::Return => "return",
            OpKind::Br => "br",
            OpKind::PipelineReturn => "pipeline_return",
        }
    }
}

/// One operation: an operator kind applied to operand values, defining result values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Op {
    /// The operator kind.
    pub kind: OpKind,

    /// Operand values, consumed over handshaked channels.
    pub operands: Vec<Value>,

    /// Result values and their channel element types.
    pub results: Vec<(Value, Type)>,

    /// Whether the component sits on the control path (the `control` attribute).
    pub control: bool,
}

impl Op {
    /// Creates a new operation with the `control` attribute unset.
    pub fn new(kind: OpKind, operands: Vec<Value>, results: Vec<(Value, Type)>) -> Self {
        Op { kind, operands, results, control: false }
    }

    /// Sets the `control` attribute.
    pub fn with_control(mut self, control: bool) -> Self {
        self.control = control;
        self
    }

    /// Constructs the operator signature: the canonical name of the FIRRTL sub-module
    /// realizing this operation. The name contains the operator mnemonic, the operand and
    /// result counts, the comparison predicate (if any), the buffer geometry (if any), and
    /// a `_ctrl` suffix for control-path components. Two operations with equal signatures
    /// share one sub-module.
    pub fn sub_module_name(&self) -> String {
        let mut name =
            format!("{}_{}ins_{}outs", self.kind.mnemonic(), self.operands.len(), self.results.len());

        if let OpKind::Cmp(pred) = &self.kind {
            name.push_str(&format!("_{}", pred.as_str()));
        }

        if let OpKind::Buffer { slots, sequential } = &self.kind {
            name.push_str(&format!("_{}slots", slots));
            if *sequential {
                name.push_str("_seq");
            }
        }

        if self.control {
            name.push_str("_ctrl");
        }

        name
    }
}
