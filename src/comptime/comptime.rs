use std::fmt::{self, Display};

use crate::ast::{ast::Expr, types::Type};

/// A value known while checking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComptimeValue {
    Int(i128),
    Float(f64),
    Bool(bool),
}

impl ComptimeValue {
    pub fn as_int(self) -> Option<i128> {
        match self {
            ComptimeValue::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_float(self) -> Option<f64> {
        match self {
            ComptimeValue::Float(value) => Some(value),
            ComptimeValue::Int(value) => Some(value as f64),
            ComptimeValue::Bool(_) => None,
        }
    }
}

impl Display for ComptimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComptimeValue::Int(value) => write!(f, "{}", value),
            ComptimeValue::Float(value) => write!(f, "{}", value),
            ComptimeValue::Bool(value) => write!(f, "{}", value),
        }
    }
}

pub trait ComptimeEvaluator {
    /// Folds `expr` to a value. `expected` is the type the value flows into,
    /// when the caller knows it.
    fn evaluate_comptime_expression(&self, expr: &Expr, expected: Option<&Type>) -> Option<ComptimeValue>;

    fn evaluate_comptime_float(&self, expr: &Expr) -> Option<f64> {
        self.evaluate_comptime_expression(expr, None)
            .and_then(ComptimeValue::as_float)
    }

    /// Size in bytes of a resolved type.
    fn compute_type_size(&self, ty: &Type) -> Option<u64>;

    fn extract_integer_value(&self, expr: &Expr) -> Option<i128> {
        self.evaluate_comptime_expression(expr, None)
            .and_then(ComptimeValue::as_int)
    }
}
