use std::sync::atomic::{AtomicU32, Ordering};

use crate::Span;

use super::{
    expressions::{
        AsExpr, BinaryExpr, BinaryOp, CallExpr, CatchExpr, IfExpr, IndexExpr, Literal, MatchCase,
        MatchExpr, MemberExpr, ObjectExpr, ObjectField, OrelseExpr, Postfix, PrefixExpr, PrefixOp,
        RangeExpr,
    },
    statements::{
        Block, DefStmt, EnumDef, ForStmt, FuncDef, LetStmt, StructDef, UseStmt, WhileStmt,
    },
    types::Type,
};

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a node in the tree.
///
/// Ids are unique for the lifetime of the process, so two nodes built with
/// synthesized (identical) spans never collide in caches keyed by node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    Mutable,
    Immutable,
}

impl Mutability {
    pub fn is_mutable(self) -> bool {
        self == Mutability::Mutable
    }
}

/// A whole program: every module handed to the checker in one pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub id: NodeId,
    pub name: String,
    pub path: String,
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(name: &str, body: Vec<Stmt>) -> Self {
        Module {
            id: NodeId::fresh(),
            name: name.to_string(),
            path: format!("{}.lang", name),
            body,
        }
    }
}

/// Statement node
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expression(Expr),
    Block(Block),
    Let(LetStmt),
    Def(DefStmt),
    Func(FuncDef),
    Struct(StructDef),
    Enum(EnumDef),
    Use(UseStmt),
    Return(Option<Expr>),
    Throw(Expr),
    While(WhileStmt),
    For(ForStmt),
    Break,
    Continue,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt {
            id: NodeId::fresh(),
            kind,
            span,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn expr(expression: Expr) -> Self {
        let span = expression.span.clone();
        Stmt::new(StmtKind::Expression(expression), span)
    }

    pub fn block(body: Vec<Stmt>) -> Self {
        Stmt::new(StmtKind::Block(Block::new(body)), Span::null())
    }

    pub fn let_(name: &str, mutability: Mutability, ty: Option<Type>, value: Option<Expr>) -> Self {
        Stmt::new(
            StmtKind::Let(LetStmt {
                name: name.to_string(),
                visibility: Visibility::Private,
                mutability,
                ty,
                value,
            }),
            Span::null(),
        )
    }

    pub fn def(name: &str, ty: Option<Type>, value: Expr) -> Self {
        Stmt::new(
            StmtKind::Def(DefStmt {
                name: name.to_string(),
                visibility: Visibility::Private,
                ty,
                value,
            }),
            Span::null(),
        )
    }

    pub fn func(def: FuncDef) -> Self {
        let span = def.span.clone();
        Stmt::new(StmtKind::Func(def), span)
    }

    pub fn struct_def(def: StructDef) -> Self {
        let span = def.span.clone();
        Stmt::new(StmtKind::Struct(def), span)
    }

    pub fn enum_def(def: EnumDef) -> Self {
        let span = def.span.clone();
        Stmt::new(StmtKind::Enum(def), span)
    }

    pub fn use_(module: &str, alias: Option<&str>, wildcard: bool) -> Self {
        Stmt::new(
            StmtKind::Use(UseStmt {
                module: module.to_string(),
                alias: alias.map(str::to_string),
                wildcard,
            }),
            Span::null(),
        )
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::new(StmtKind::Return(value), Span::null())
    }

    pub fn throw(value: Expr) -> Self {
        Stmt::new(StmtKind::Throw(value), Span::null())
    }

    pub fn while_(condition: Expr, body: Vec<Stmt>) -> Self {
        Stmt::new(
            StmtKind::While(WhileStmt {
                condition,
                body: Block::new(body),
            }),
            Span::null(),
        )
    }

    pub fn for_(binding: &str, iterable: Expr, body: Vec<Stmt>) -> Self {
        Stmt::new(
            StmtKind::For(ForStmt {
                binding: binding.to_string(),
                iterable,
                body: Block::new(body),
            }),
            Span::null(),
        )
    }

    pub fn break_() -> Self {
        Stmt::new(StmtKind::Break, Span::null())
    }

    pub fn continue_() -> Self {
        Stmt::new(StmtKind::Continue, Span::null())
    }
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(String),
    Paren(Box<Expr>),
    Tuple(Vec<Expr>),
    Object(ObjectExpr),
    Type(Type),
    Binary(BinaryExpr),
    Prefix(PrefixExpr),
    Postfix(Postfix),
    As(AsExpr),
    Typeof(Box<Expr>),
    Sizeof(Box<Expr>),
    Orelse(OrelseExpr),
    Range(RangeExpr),
    Try(Box<Expr>),
    Catch(CatchExpr),
    If(IfExpr),
    Match(MatchExpr),
    Unreachable,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr {
            id: NodeId::fresh(),
            kind,
            span,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    fn synth(kind: ExprKind) -> Self {
        Expr::new(kind, Span::null())
    }

    /// Strips any number of parentheses around the expression.
    pub fn unparen(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.unparen(),
            _ => self,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.unparen().kind, ExprKind::Literal(_))
    }

    pub fn is_deref(&self) -> bool {
        matches!(self.unparen().kind, ExprKind::Postfix(Postfix::Deref(_)))
    }

    pub fn ident_name(&self) -> Option<&str> {
        match &self.unparen().kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn int(text: &str) -> Self {
        Expr::synth(ExprKind::Literal(Literal::Int(text.to_string())))
    }

    pub fn float(text: &str) -> Self {
        Expr::synth(ExprKind::Literal(Literal::Float(text.to_string())))
    }

    pub fn string(text: &str) -> Self {
        Expr::synth(ExprKind::Literal(Literal::Str(text.to_string())))
    }

    pub fn char_lit(text: &str) -> Self {
        Expr::synth(ExprKind::Literal(Literal::Char(text.to_string())))
    }

    pub fn bool_lit(value: bool) -> Self {
        Expr::synth(ExprKind::Literal(Literal::Bool(value)))
    }

    pub fn null() -> Self {
        Expr::synth(ExprKind::Literal(Literal::Null))
    }

    pub fn undefined() -> Self {
        Expr::synth(ExprKind::Literal(Literal::Undefined))
    }

    pub fn array(elements: Vec<Expr>) -> Self {
        Expr::synth(ExprKind::Literal(Literal::Array(elements)))
    }

    pub fn ident(name: &str) -> Self {
        Expr::synth(ExprKind::Ident(name.to_string()))
    }

    pub fn paren(inner: Expr) -> Self {
        Expr::synth(ExprKind::Paren(Box::new(inner)))
    }

    pub fn tuple(fields: Vec<Expr>) -> Self {
        Expr::synth(ExprKind::Tuple(fields))
    }

    pub fn object(name: Option<&str>, fields: Vec<(&str, Expr)>) -> Self {
        Expr::synth(ExprKind::Object(ObjectExpr {
            name: name.map(str::to_string),
            fields: fields
                .into_iter()
                .map(|(name, value)| ObjectField {
                    name: name.to_string(),
                    span: value.span.clone(),
                    value,
                })
                .collect(),
        }))
    }

    pub fn type_expr(ty: Type) -> Self {
        Expr::synth(ExprKind::Type(ty))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::synth(ExprKind::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::binary(BinaryOp::Assign, target, value)
    }

    pub fn prefix(op: PrefixOp, operand: Expr) -> Self {
        Expr::synth(ExprKind::Prefix(PrefixExpr {
            op,
            operand: Box::new(operand),
        }))
    }

    pub fn reference(operand: Expr) -> Self {
        Expr::prefix(PrefixOp::Reference, operand)
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::synth(ExprKind::Postfix(Postfix::Call(CallExpr {
            callee: Box::new(callee),
            args,
        })))
    }

    pub fn index(base: Expr, index: Expr) -> Self {
        Expr::synth(ExprKind::Postfix(Postfix::Index(IndexExpr {
            base: Box::new(base),
            index: Box::new(index),
        })))
    }

    pub fn member(base: Expr, member: &str) -> Self {
        Expr::synth(ExprKind::Postfix(Postfix::Member(MemberExpr {
            base: Box::new(base),
            member: member.to_string(),
        })))
    }

    pub fn post_increment(operand: Expr) -> Self {
        Expr::synth(ExprKind::Postfix(Postfix::Increment(Box::new(operand))))
    }

    pub fn post_decrement(operand: Expr) -> Self {
        Expr::synth(ExprKind::Postfix(Postfix::Decrement(Box::new(operand))))
    }

    pub fn deref(operand: Expr) -> Self {
        Expr::synth(ExprKind::Postfix(Postfix::Deref(Box::new(operand))))
    }

    pub fn cast(expr: Expr, target: Type) -> Self {
        Expr::synth(ExprKind::As(AsExpr {
            expr: Box::new(expr),
            target,
        }))
    }

    pub fn typeof_(operand: Expr) -> Self {
        Expr::synth(ExprKind::Typeof(Box::new(operand)))
    }

    pub fn sizeof(operand: Expr) -> Self {
        Expr::synth(ExprKind::Sizeof(Box::new(operand)))
    }

    pub fn orelse(left: Expr, right: Expr) -> Self {
        Expr::synth(ExprKind::Orelse(OrelseExpr {
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    pub fn range(start: Option<Expr>, end: Option<Expr>) -> Self {
        Expr::synth(ExprKind::Range(RangeExpr {
            start: start.map(Box::new),
            end: end.map(Box::new),
            inclusive: false,
        }))
    }

    pub fn try_(operand: Expr) -> Self {
        Expr::synth(ExprKind::Try(Box::new(operand)))
    }

    pub fn catch(expr: Expr, binding: Option<&str>, handler: Stmt) -> Self {
        Expr::synth(ExprKind::Catch(CatchExpr {
            expr: Box::new(expr),
            binding: binding.map(str::to_string),
            handler: Box::new(handler),
        }))
    }

    pub fn if_(condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Self {
        Expr::synth(ExprKind::If(IfExpr {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        }))
    }

    pub fn match_(subject: Expr, cases: Vec<(Vec<Expr>, Stmt)>, default: Option<Stmt>) -> Self {
        Expr::synth(ExprKind::Match(MatchExpr {
            subject: Box::new(subject),
            cases: cases
                .into_iter()
                .map(|(patterns, body)| MatchCase {
                    span: body.span.clone(),
                    patterns,
                    body,
                })
                .collect(),
            default: default.map(Box::new),
        }))
    }

    pub fn unreachable() -> Self {
        Expr::synth(ExprKind::Unreachable)
    }
}
