use std::slice::Iter;

use crate::Span;

use super::{
    ast::{Expr, Mutability, NodeId, Stmt, Visibility},
    types::Type,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: NodeId,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(body: Vec<Stmt>) -> Self {
        Block {
            id: NodeId::fresh(),
            body,
            span: Span::null(),
        }
    }

    pub fn iter(&self) -> Iter<'_, Stmt> {
        self.body.iter()
    }
}

/// `let` / `const` bindings
#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub name: String,
    pub visibility: Visibility,
    pub mutability: Mutability,
    pub ty: Option<Type>,
    pub value: Option<Expr>,
}

/// `def Name = value` - comptime constants, type aliases and error sets.
///
/// When `value` is a type expression the definition denotes a type.
#[derive(Debug, Clone, PartialEq)]
pub struct DefStmt {
    pub name: String,
    pub visibility: Visibility,
    pub ty: Option<Type>,
    pub value: Expr,
}

/// The error clause of a function signature.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDecl {
    /// `!err` - any error value may be thrown.
    Any,
    /// `!FileError` - a named error set.
    Ident(String),
    /// `!error{A, B}` - an inline error set.
    Group(Vec<String>),
    /// `!selferr{A, B}` - members thrown through the implicit `selferr`.
    SelfGroup(Vec<String>),
}

/// How a function reports errors; decides the matching rule for `throw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    AnyError,
    ErrIdent,
    ErrGroup,
    SelfGroup,
}

impl ErrorDecl {
    pub fn mode(&self) -> ErrorMode {
        match self {
            ErrorDecl::Any => ErrorMode::AnyError,
            ErrorDecl::Ident(_) => ErrorMode::ErrIdent,
            ErrorDecl::Group(_) => ErrorMode::ErrGroup,
            ErrorDecl::SelfGroup(_) => ErrorMode::SelfGroup,
        }
    }

    /// The declared error type as it appears in the function's type.
    pub fn as_type(&self) -> Type {
        match self {
            ErrorDecl::Any => Type::err(),
            ErrorDecl::Ident(name) => Type::Ident(name.clone()),
            ErrorDecl::Group(members) | ErrorDecl::SelfGroup(members) => {
                Type::ErrSet(members.clone())
            }
        }
    }

    pub fn self_group(&self) -> &[String] {
        match self {
            ErrorDecl::SelfGroup(members) => members,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub visibility: Visibility,
    pub mutability: Mutability,
    pub default: Option<Expr>,
    pub span: Span,
}

impl Param {
    pub fn new(name: &str, ty: Type) -> Self {
        Param {
            name: name.to_string(),
            ty,
            visibility: Visibility::Private,
            mutability: Mutability::Immutable,
            default: None,
            span: Span::null(),
        }
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }

    pub fn mutable(mut self) -> Self {
        self.mutability = Mutability::Mutable;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub id: NodeId,
    pub name: String,
    pub visibility: Visibility,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub error: Option<ErrorDecl>,
    pub body: Block,
    pub span: Span,
}

impl FuncDef {
    pub fn new(name: &str, params: Vec<Param>, return_type: Option<Type>, body: Vec<Stmt>) -> Self {
        FuncDef {
            id: NodeId::fresh(),
            name: name.to_string(),
            visibility: Visibility::Private,
            params,
            return_type,
            error: None,
            body: Block::new(body),
            span: Span::null(),
        }
    }

    pub fn with_error(mut self, error: ErrorDecl) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn is_static(&self) -> bool {
        self.visibility == Visibility::Static
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Type,
    pub visibility: Visibility,
    pub mutability: Mutability,
    pub default: Option<Expr>,
    pub span: Span,
}

impl FieldDecl {
    pub fn new(name: &str, ty: Type) -> Self {
        FieldDecl {
            name: name.to_string(),
            ty,
            visibility: Visibility::Public,
            mutability: Mutability::Mutable,
            default: None,
            span: Span::null(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_mutability(mut self, mutability: Mutability) -> Self {
        self.mutability = mutability;
        self
    }

    pub fn with_default(mut self, default: Expr) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub id: NodeId,
    pub name: String,
    pub visibility: Visibility,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<FuncDef>,
    pub span: Span,
}

impl StructDef {
    pub fn new(name: &str, fields: Vec<FieldDecl>, methods: Vec<FuncDef>) -> Self {
        StructDef {
            id: NodeId::fresh(),
            name: name.to_string(),
            visibility: Visibility::Private,
            fields,
            methods,
            span: Span::null(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantDecl {
    pub name: String,
    pub payload: Option<Type>,
    pub span: Span,
}

impl VariantDecl {
    pub fn new(name: &str, payload: Option<Type>) -> Self {
        VariantDecl {
            name: name.to_string(),
            payload,
            span: Span::null(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub id: NodeId,
    pub name: String,
    pub visibility: Visibility,
    pub variants: Vec<VariantDecl>,
    pub methods: Vec<FuncDef>,
    pub span: Span,
}

impl EnumDef {
    pub fn new(name: &str, variants: Vec<VariantDecl>, methods: Vec<FuncDef>) -> Self {
        EnumDef {
            id: NodeId::fresh(),
            name: name.to_string(),
            visibility: Visibility::Private,
            variants,
            methods,
            span: Span::null(),
        }
    }
}

/// `use math;`, `use math as m;`, `use math.*;`
#[derive(Debug, Clone, PartialEq)]
pub struct UseStmt {
    pub module: String,
    pub alias: Option<String>,
    pub wildcard: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub binding: String,
    pub iterable: Expr,
    pub body: Block,
}
