//! Channel element types.

use std::fmt;

/// Width at which `index`-typed channels are lowered.
pub const INDEX_WIDTH: usize = 64;

/// Element type carried by a handshake channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    /// Signed integer of the given width.
    SInt(usize),

    /// Unsigned integer of the given width.
    UInt(usize),

    /// Signless integer of the given width.
    Int(usize),

    /// Index type, lowered at [`INDEX_WIDTH`] bits.
    Index,

    /// Control-only: the channel carries tokens without a data payload.
    None,

    /// Floating point of the given width. Not lowerable; kept so that the pass can reject it.
    Float(usize),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::SInt(width) => write!(f, "si{}", width),
            Type::UInt(width) => write!(f, "ui{}", width),
            Type::Int(width) => write!(f, "i{}", width),
            Type::Index => write!(f, "index"),
            Type::None => write!(f, "none"),
            Type::Float(width) => write!(f, "f{}", width),
        }
    }
}
