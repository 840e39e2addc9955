//! Compilation-unit driver and callgraph analysis core.
//!
//! Given a stream of finalized function and variable definitions from a front-end, this crate
//! builds an inter-procedural callgraph, decides which definitions are reachable and must be
//! emitted, drives their bodies through analysis, and schedules expansion in an order that
//! maximizes cross-call optimization quality.
//!
//! A caller supplies a [`front_end::FrontEnd`] implementation and drives the pipeline through
//! a [`context::Context`]: [`driver::finalize_function`] / [`driver::finalize_variable`] as
//! definitions arrive, [`driver::finalize_compilation_unit`] at end-of-input, and
//! [`driver::optimize`] to run inter-procedural passes and emission. See the module docs below
//! for the per-component design; `README`-level narrative lives in the repository's `DESIGN.md`.

pub mod analyzer;
pub mod context;
pub mod driver;
pub mod edge_builder;
pub mod error;
pub mod front_end;
pub mod scheduler;
pub mod store;
pub mod synthesizer;
pub mod verifier;
pub mod visibility;
pub mod walker;
pub mod worklist;

#[cfg(test)]
mod test_support;

pub use context::{Context, DriverConfig, Mode};
pub use error::{ErrorTally, IceError};
pub use front_end::{CallShape, Expr, ExprHookOutcome, FrontEnd, FunctionBody, Statement};
pub use store::{CallEdge, FunctionId, FunctionNode, InlineFailedReason, VariableId, VariableNode};
