use crate::Span;

use super::{
    ast::{Expr, Stmt},
    types::Type,
};

// LITERALS

/// Literal values as written in the source. Numeric literals keep their
/// text so the checker can judge their range against a target type.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(String),
    Float(String),
    Char(String),
    Bool(bool),
    Null,
    Undefined,
    Array(Vec<Expr>),
}

/// Parses an integer literal, honoring `0x`/`0o`/`0b` prefixes and `_`
/// separators. Returns `None` when the value does not fit in an `i128`.
pub fn parse_int_literal(text: &str) -> Option<i128> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };

    let value = if let Some(hex) = digits.strip_prefix("0x") {
        i128::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = digits.strip_prefix("0o") {
        i128::from_str_radix(oct, 8).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b") {
        i128::from_str_radix(bin, 2).ok()?
    } else {
        digits.parse::<i128>().ok()?
    };

    Some(if negative { -value } else { value })
}

// OPERATORS

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

/// Operator families; the inference rules are written per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    Assignment,
    Additive,
    Multiplicative,
    Power,
    Shift,
    Bitwise,
    Equality,
    Relational,
    Logical,
}

impl BinaryOp {
    pub fn class(self) -> OpClass {
        match self {
            BinaryOp::Assign
            | BinaryOp::AddAssign
            | BinaryOp::SubAssign
            | BinaryOp::MulAssign
            | BinaryOp::DivAssign => OpClass::Assignment,
            BinaryOp::Add | BinaryOp::Sub => OpClass::Additive,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => OpClass::Multiplicative,
            BinaryOp::Pow => OpClass::Power,
            BinaryOp::Shl | BinaryOp::Shr => OpClass::Shift,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => OpClass::Bitwise,
            BinaryOp::Eq | BinaryOp::NotEq => OpClass::Equality,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => OpClass::Relational,
            BinaryOp::And | BinaryOp::Or => OpClass::Logical,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Plus,
    Minus,
    Increment,
    Decrement,
    Not,
    BitNot,
    Reference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixExpr {
    pub op: PrefixOp,
    pub operand: Box<Expr>,
}

// POSTFIX

#[derive(Debug, Clone, PartialEq)]
pub enum Postfix {
    Call(CallExpr),
    Index(IndexExpr),
    Member(MemberExpr),
    Increment(Box<Expr>),
    Decrement(Box<Expr>),
    Deref(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub base: Box<Expr>,
    pub index: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub base: Box<Expr>,
    pub member: String,
}

// COMPOUND FORMS

/// `Name { a: 1 }` when `name` is set, `.{ a: 1 }` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpr {
    pub name: Option<String>,
    pub fields: Vec<ObjectField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AsExpr {
    pub expr: Box<Expr>,
    pub target: Type,
}

/// `left ?? right`
#[derive(Debug, Clone, PartialEq)]
pub struct OrelseExpr {
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeExpr {
    pub start: Option<Box<Expr>>,
    pub end: Option<Box<Expr>>,
    pub inclusive: bool,
}

/// `expr catch |binding| handler`
#[derive(Debug, Clone, PartialEq)]
pub struct CatchExpr {
    pub expr: Box<Expr>,
    pub binding: Option<String>,
    pub handler: Box<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfExpr {
    pub condition: Box<Expr>,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchExpr {
    pub subject: Box<Expr>,
    pub cases: Vec<MatchCase>,
    pub default: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchCase {
    pub patterns: Vec<Expr>,
    pub body: Stmt,
    pub span: Span,
}
