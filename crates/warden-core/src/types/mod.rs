//! Type system for Warden
//!
//! Literal values in policies and typed fact values share one representation.

pub mod value;

pub use value::{Value, ValueKind};
