//! Handshake IR: functions of elastic components connected by valid/ready channels.

mod func;
mod op;
mod typ;

pub use func::*;
pub use op::*;
pub use typ::*;
