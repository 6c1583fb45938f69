//! Self-specializing execution sites for the ECMAScript `delete` operator.
//!
//! A `delete target[key]` expression is compiled to a site in an arena.
//! Each site remembers a short, ordered list of guarded specializations
//! for the operand shapes it has seen and falls back to a generic
//! implementation, for good, once it has seen more than its limit.
//! Embedder objects take part through the capability protocol in
//! [`interop`].

pub mod ast;
pub mod config;
pub mod interop;
pub mod interpreter;
pub mod specialize;
pub mod types;

pub use config::ContextOptions;
pub use interpreter::{Completion, DeleteError, Interpreter};
pub use types::JsValue;
