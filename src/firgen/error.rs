//! Lowering errors.

use thiserror::Error;

use crate::handshake;

/// Errors reported by the handshake-to-FIRRTL lowering.
///
/// The lowering performs no local recovery: the first reported error aborts the pass and
/// the circuit under construction is discarded.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum FirgenError {
    #[error("unsupported data type `{typ}` on `{op}`; supported data types: integer (signed, unsigned, signless), index, none")]
    UnsupportedType { op: String, typ: handshake::Type },

    #[error("unsupported operation `{op}`")]
    UnsupportedOp { op: String },

    #[error("malformed `{op}`: {reason}")]
    Malformed { op: String, reason: String },
}

impl FirgenError {
    /// Unsupported-type error on the given operation.
    pub(crate) fn unsupported_type(op: &str, typ: handshake::Type) -> Self {
        FirgenError::UnsupportedType { op: op.to_string(), typ }
    }

    /// Structural precondition violation on the given operation.
    pub(crate) fn malformed(op: &str, reason: &str) -> Self {
        FirgenError::Malformed { op: op.to_string(), reason: reason.to_string() }
    }
}
