//! Compile-time evaluation used by the checker.
//!
//! The checker only needs a narrow slice of constant folding: literal
//! values for range checks, constant tuple indices, array sizes and the
//! byte size of types for `sizeof`. The [`comptime::ComptimeEvaluator`]
//! trait is that slice; [`evaluator::LiteralEvaluator`] is the default
//! implementation.

pub mod comptime;
pub mod evaluator;

#[cfg(test)]
mod tests;
