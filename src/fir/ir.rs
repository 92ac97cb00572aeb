//! FIRRTL.
//!
//! In-memory representation of the circuits produced by the lowering. Only the items the
//! lowering emits are modeled; `Display` renders the `.fir` syntax of every node.

use std::fmt;

use itertools::Itertools;

use crate::handshake;
use crate::utils::indent;

const INDENT: usize = 2;

/// Primitive operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimOp {
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

    /// Dynamic shift left.
    Dshl,

    /// Dynamic shift right.
    Dshr,

    /// Equal to.
    Eq,

    /// Not equal to.
    Neq,

    /// Less than.
    Lt,

    /// Less than or equal to.
    Leq,

    /// Greater than.
    Gt,

    /// Greater than or equal to.
    Geq,

    /// Bitwise complement.
    Not,
}

impl PrimOp {
    /// Returns the FIRRTL mnemonic of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            PrimOp::Add => "add",
            PrimOp::Sub => "sub",
            PrimOp::Mul => "mul",
            PrimOp::And => "and",
            PrimOp::Or => "or",
            PrimOp::Xor => "xor",
            PrimOp::Dshl => "dshl",
            PrimOp::Dshr => "dshr",
            PrimOp::Eq => "eq",
            PrimOp::Neq => "neq",
            PrimOp::Lt => "lt",
            PrimOp::Leq => "leq",
            PrimOp::Gt => "gt",
            PrimOp::Geq => "geq",
            PrimOp::Not => "not",
        }
    }
}

impl fmt::Display for PrimOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl From<handshake::ArithOp> for PrimOp {
    fn from(op: handshake::ArithOp) -> Self {
        match op {
            handshake::ArithOp::Add => PrimOp::Add,
            handshake::ArithOp::Sub => PrimOp::Sub,
            handshake::ArithOp::Mul => PrimOp::Mul,
            handshake::ArithOp::And => PrimOp::And,
            handshake::ArithOp::Or => PrimOp::Or,
            handshake::ArithOp::Xor => PrimOp::Xor,
            handshake::ArithOp::Shl => PrimOp::Dshl,
            handshake::ArithOp::ShrS => PrimOp::Dshr,
        }
    }
}

impl From<handshake::CmpPredicate> for PrimOp {
    fn from(pred: handshake::CmpPredicate) -> Self {
        match pred {
            handshake::CmpPredicate::Eq => PrimOp::Eq,
            handshake::CmpPredicate::Ne => PrimOp::Neq,
            handshake::CmpPredicate::Slt => PrimOp::Lt,
            handshake::CmpPredicate::Sle => PrimOp::Leq,
            handshake::CmpPredicate::Sgt => PrimOp::Gt,
            handshake::CmpPredicate::Sge => PrimOp::Geq,
        }
    }
}

/// Field of a bundle type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleField {
    /// Name of the field.
    pub name: String,

    /// Whether the field direction is reversed relative to the enclosing bundle.
    pub flip: bool,

    /// Type of the field.
    pub tpe: Type,
}

impl BundleField {
    /// Creates a new field.
    pub fn new(name: impl Into<String>, flip: bool, tpe: Type) -> Self {
        BundleField { name: name.into(), flip, tpe }
    }
}

impl fmt::Display for BundleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.flip {
            write!(f, "flip {} : {}", self.name, self.tpe)
        } else {
            write!(f, "{} : {}", self.name, self.tpe)
        }
    }
}

/// Type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Clock type.
    Clock,

    /// Unsigned integer type.
    UInt(usize),

    /// Signed integer type.
    SInt(usize),

    /// Bundle type: named subfields, each possibly flipped.
    Bundle(Vec<BundleField>),
}

impl Type {
    /// Creates new clock type.
    #[inline]
    pub fn clock() -> Self { Type::Clock }

    /// Creates new unsigned integer type.
    #[inline]
    pub fn uint(width: usize) -> Self { Type::UInt(width) }

    /// Creates new signed integer type.
    #[inline]
    pub fn sint(width: usize) -> Self { Type::SInt(width) }

    /// Creates new bundle type.
    #[inline]
    pub fn bundle(fields: Vec<BundleField>) -> Self { Type::Bundle(fields) }

    /// Returns the bundle fields, or `None` for a ground type.
    pub fn fields(&self) -> Option<&[BundleField]> {
        match self {
            Type::Bundle(fields) => Some(fields),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Clock => write!(f, "Clock"),
            Type::UInt(width) => write!(f, "UInt<{}>", width),
            Type::SInt(width) => write!(f, "SInt<{}>", width),
            Type::Bundle(fields) => {
                write!(f, "{{ {} }}", fields.iter().map(|field| field.to_string()).join(", "))
            }
        }
    }
}

/// Expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Previously declared circuit component.
    Reference {
        /// Name of the component.
        name: String,
    },

    /// Sub-element of an expression with a bundle type.
    SubField {
        /// Input signal.
        expr: Box<Expression>,
        /// Name of the field.
        name: String,
    },

    /// Integer literal.
    Literal {
        /// Value.
        value: u64,
        /// Width.
        width: usize,
        /// Whether the literal is signed.
        signed: bool,
    },

    /// Primitive operation.
    DoPrim {
        /// Primitive operator.
        op: PrimOp,
        /// Arguments.
        args: Vec<Expression>,
    },
}

impl Expression {
    /// Reference expression.
    #[inline]
    pub fn reference(name: impl Into<String>) -> Self { Expression::Reference { name: name.into() } }

    /// Subfield expression.
    #[inline]
    pub fn sub_field(expr: Expression, name: impl Into<String>) -> Self {
        Expression::SubField { expr: Box::new(expr), name: name.into() }
    }

    /// Unsigned literal expression.
    #[inline]
    pub fn uint(width: usize, value: u64) -> Self { Expression::Literal { value, width, signed: false } }

    /// Signed literal expression.
    #[inline]
    pub fn sint(width: usize, value: u64) -> Self { Expression::Literal { value, width, signed: true } }

    /// Primitive operation.
    #[inline]
    pub fn do_prim(op: PrimOp, args: Vec<Expression>) -> Self { Expression::DoPrim { op, args } }

    /// Bitwise and operation.
    #[inline]
    pub fn and(e1: Self, e2: Self) -> Self { Expression::do_prim(PrimOp::And, vec![e1, e2]) }

    /// Bitwise complement operation.
    #[inline]
    pub fn not(e: Self) -> Self { Expression::do_prim(PrimOp::Not, vec![e]) }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Reference { name } => f.write_str(name),
            Expression::SubField { expr, name } => write!(f, "{}.{}", expr, name),
            Expression::Literal { value, width, signed } => {
                if *signed {
                    write!(f, "SInt<{}>({})", width, value)
                } else {
                    write!(f, "UInt<{}>({})", width, value)
                }
            }
            Expression::DoPrim { op, args } => {
                write!(f, "{}({})", op, args.iter().map(|arg| arg.to_string()).join(", "))
            }
        }
    }
}

/// Statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Wire definition.
    DefWire {
        /// Name of the wire.
        name: String,
        /// Type of the signal.
        tpe: Type,
    },

    /// Register definition.
    DefRegister {
        /// Name of the register.
        name: String,
        /// Type of the signal.
        tpe: Type,
        /// Clock signal.
        clock: Expression,
        /// Reset signal and initialization value, if the register resets.
        reset: Option<(Expression, Expression)>,
    },

    /// Intermediate value.
    DefNode {
        /// Name of the value.
        name: String,
        /// Value.
        value: Expression,
    },

    /// Module instantiation.
    DefInstance {
        /// Name of the instance.
        name: String,
        /// Name of the module.
        module: String,
    },

    /// Conditional statement.
    Conditionally {
        /// Predicate signal.
        pred: Expression,
        /// Then statement.
        conseq: Box<Statement>,
        /// Else statement.
        alt: Box<Statement>,
    },

    /// Block of statements.
    Block {
        /// Statements.
        stmts: Vec<Statement>,
    },

    /// Physically wired connection between two circuit components.
    Connect {
        /// L-value.
        loc: Expression,
        /// R-value.
        expr: Expression,
    },

    /// Empty statement.
    Empty,
}

impl Statement {
    /// Creates new wire definition.
    #[inline]
    pub fn def_wire(name: impl Into<String>, tpe: Type) -> Self { Statement::DefWire { name: name.into(), tpe } }

    /// Creates new register definition without a reset.
    #[inline]
    pub fn def_reg(name: impl Into<String>, tpe: Type, clock: Expression) -> Self {
        Statement::DefRegister { name: name.into(), tpe, clock, reset: None }
    }

    /// Creates new register definition resetting to `init`.
    #[inline]
    pub fn def_reg_init(
        name: impl Into<String>, tpe: Type, clock: Expression, reset: Expression, init: Expression,
    ) -> Self {
        Statement::DefRegister { name: name.into(), tpe, clock, reset: Some((reset, init)) }
    }

    /// Creates new node definition.
    #[inline]
    pub fn def_node(name: impl Into<String>, value: Expression) -> Self {
        Statement::DefNode { name: name.into(), value }
    }

    /// Creates new module instantiation.
    #[inline]
    pub fn def_inst(name: impl Into<String>, module: impl Into<String>) -> Self {
        Statement::DefInstance { name: name.into(), module: module.into() }
    }

    /// Creates new conditional statement without an else branch.
    #[inline]
    pub fn when(pred: Expression, conseq: Vec<Statement>) -> Self {
        Statement::Conditionally {
            pred,
            conseq: Box::new(Statement::block(conseq)),
            alt: Box::new(Statement::Empty),
        }
    }

    /// Creates new conditional statement with an else branch.
    #[inline]
    pub fn when_else(pred: Expression, conseq: Vec<Statement>, alt: Vec<Statement>) -> Self {
        Statement::Conditionally {
            pred,
            conseq: Box::new(Statement::block(conseq)),
            alt: Box::new(Statement::block(alt)),
        }
    }

    /// Creates new block statement.
    #[inline]
    pub fn block(stmts: Vec<Statement>) -> Self { Statement::Block { stmts } }

    /// Creates new connect statement.
    #[inline]
    pub fn connect(loc: Expression, expr: Expression) -> Self { Statement::Connect { loc, expr } }

    /// Applies `f` to this statement and, recursively, to every nested statement.
    pub fn for_each<'a>(&'a self, f: &mut dyn FnMut(&'a Statement)) {
        f(self);
        match self {
            Statement::Conditionally { conseq, alt, .. } => {
                conseq.for_each(f);
                alt.for_each(f);
            }
            Statement::Block { stmts } => {
                for stmt in stmts {
                    stmt.for_each(f);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::DefWire { name, tpe } => write!(f, "wire {} : {}", name, tpe),
            Statement::DefRegister { name, tpe, clock, reset } => match reset {
                Some((reset, init)) => write!(
                    f,
                    "reg {} : {}, {} with :\n{}",
                    name,
                    tpe,
                    clock,
                    indent(format!("reset => ({}, {})", reset, init), INDENT)
                ),
                None => write!(f, "reg {} : {}, {}", name, tpe, clock),
            },
            Statement::DefNode { name, value } => write!(f, "node {} = {}", name, value),
            Statement::DefInstance { name, module } => write!(f, "inst {} of {}", name, module),
            Statement::Conditionally { pred, conseq, alt } => {
                write!(f, "when {} :\n{}", pred, indent(conseq.to_string(), INDENT))?;
                if !matches!(**alt, Statement::Empty) {
                    write!(f, "\nelse :\n{}", indent(alt.to_string(), INDENT))?;
                }
                Ok(())
            }
            Statement::Block { stmts } => {
                if stmts.is_empty() {
                    Statement::Empty.fmt(f)
                } else {
                    f.write_str(&stmts.iter().map(|stmt| stmt.to_string()).join("\n"))
                }
            }
            Statement::Connect { loc, expr } => write!(f, "{} <= {}", loc, expr),
            Statement::Empty => f.write_str("skip"),
        }
    }
}

/// Direction of a module port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Input port.
    Input,

    /// Output port.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Port of module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    /// Name of the port.
    pub name: String,

    /// Direction of the port.
    pub direction: Direction,

    /// Type of the port.
    pub tpe: Type,
}

impl Port {
    /// Creates new input port.
    pub fn input(name: impl Into<String>, tpe: Type) -> Self {
        Port { name: name.into(), direction: Direction::Input, tpe }
    }

    /// Creates new output port.
    pub fn output(name: impl Into<String>, tpe: Type) -> Self {
        Port { name: name.into(), direction: Direction::Output, tpe }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} : {}", self.direction, self.name, self.tpe)
    }
}

/// An instantiable hardware block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Name of the module.
    pub name: String,

    /// Ports of the module.
    pub ports: Vec<Port>,

    /// Body of the module.
    pub body: Statement,
}

impl Module {
    /// Returns the port with the given name, if present.
    pub fn find_port(&self, name: &str) -> Option<&Port> { self.ports.iter().find(|port| port.name == name) }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "module {} :\n{}\n\n{}",
            self.name,
            indent(self.ports.iter().map(|port| port.to_string()).join("\n"), INDENT),
            indent(self.body.to_string(), INDENT)
        )
    }
}

/// Circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    /// Name of the circuit.
    pub main: String,

    /// Inner modules.
    pub modules: Vec<Module>,
}

impl Circuit {
    /// Returns the module with the given name, if present.
    pub fn find_module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|module| module.name == name)
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "circuit {} :\n{}\n",
            self.main,
            self.modules.iter().map(|module| indent(module.to_string(), INDENT)).join("\n")
        )
    }
}
