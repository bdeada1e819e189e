#![allow(clippy::module_inception)]

//! Semantic analysis for the language front end.
//!
//! The crate takes a parsed [`ast::ast::Program`], builds its scope tree and
//! then infers and validates the type of every declaration, expression and
//! statement in it. Problems are collected as diagnostics rather than
//! returned, so one pass reports as many independent errors as it can.
//!
//! ```ignore
//! let mut checker = TypeChecker::new(program, CheckerOptions::default());
//! if !checker.handle() {
//!     for diagnostic in checker.diagnostics().iter() { /* ... */ }
//! }
//! ```

use std::rc::Rc;

pub mod ast;
pub mod comptime;
pub mod errors;
pub mod macros;
pub mod scope;
pub mod type_checker;

pub use type_checker::type_checker::{CheckerOptions, TypeChecker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(file: &Rc<String>, start: u32, end: u32) -> Self {
        Span {
            start: Position(start, Rc::clone(file)),
            end: Position(end, Rc::clone(file)),
        }
    }

    /// A span for nodes synthesized without source text.
    pub fn null() -> Self {
        Span {
            start: Position::null(),
            end: Position::null(),
        }
    }

    pub fn file(&self) -> &str {
        &self.start.1
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::null()
    }
}
