//! Type inference and validation.
//!
//! This module infers the type of every expression and validates every
//! statement and declaration of a collected program:
//!
//! - Inferring expression types, memoized per node and guarded against re-entry
//! - Resolving annotations, aliases and array sizes to checker types
//! - Deciding compatibility, numeric promotion and cast validity
//! - Validating declarations, assignments, returns, throws and control flow
//! - Checking struct construction, match exhaustiveness and reachability
//!
//! Everything runs as free functions over one `TypeChecker` session, which
//! owns the scope tree, the diagnostics and the per-pass state.

pub mod builtins;
pub mod cache;
pub mod compat;
pub mod context;
pub mod functions;
pub mod infer;
pub mod infer_ops;
pub mod infer_postfix;
pub mod matching;
pub mod objects;
pub mod resolve;
pub mod structs;
pub mod type_checker;
pub mod validate;

#[cfg(test)]
mod tests;
