//! Lexical scopes and the symbols declared in them.
//!
//! The collector walks a parsed program once and produces a [`scope::ScopeTree`]:
//! a global scope, one scope per module and nested scopes for every struct,
//! enum, error set, function, block, loop and `catch` handler. The checker
//! only reads the tree and annotates symbols with their resolved types.

pub mod collector;
pub mod scope;

#[cfg(test)]
mod tests;
