/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure consumed by the checker
///
/// Submodules:
/// - ast: Core node definitions (programs, modules, statements, expressions)
/// - expressions: Payloads of the various expression kinds
/// - statements: Payloads of the various statement kinds
/// - types: The type algebra shared by annotations and inference
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
