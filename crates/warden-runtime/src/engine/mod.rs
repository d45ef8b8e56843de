//! Execution engine
//!
//! The interpreter runs one compiled policy against one fact snapshot.

mod interpreter;

pub use interpreter::{evaluate, Interpreter};
