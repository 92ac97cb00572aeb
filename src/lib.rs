//! Lowering of handshake (elastic, valid/ready) dataflow functions into FIRRTL circuits.
//!
//! A handshake function models computation as a graph of asynchronous elastic components
//! communicating over valid/ready channels. This crate lowers one such function into a
//! synchronous FIRRTL circuit: a top module whose ports are handshaked bundles, one
//! sub-module per distinct operator signature, and an instance of the matching sub-module
//! for every operation of the function body.

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(rust_2018_idioms)]
#![deny(unused_import_braces)]
#![deny(unreachable_pub)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fir;
pub mod firgen;
pub mod handshake;
pub mod utils;

pub use firgen::{lower_handshake_to_firrtl, Firgen, FirgenError, PASS_DESCRIPTION, PASS_NAME};
pub use handshake::{Func, FuncBuilder};
