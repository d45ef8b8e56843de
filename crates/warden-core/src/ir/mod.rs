//! Intermediate Representation (IR) for Warden
//!
//! The IR is a flat, per-clause instruction representation produced by the
//! compiler and consumed by the interpreter. It is the unit that gets
//! persisted and replayed, addressed by its content hash.

pub mod dag;
pub mod instruction;
pub mod policy_ir;

pub use dag::{ExecutionDag, ExecutionNode};
pub use instruction::Instruction;
pub use policy_ir::{ActionDescriptor, CompiledClause, IrMetadata, PolicyIr, IR_FORMAT};
