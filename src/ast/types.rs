//! Type system definitions.
//!
//! This module defines the type algebra used both for annotations written
//! in the source and for the types the checker infers:
//!
//! - Primitive types (sized integers and floats, comptime numbers, bool, ...)
//! - Composite types (pointers, optionals, arrays, tuples, unions)
//! - Nominal types (structs, enums, error sets) carrying their member scope
//! - Function types
//!
//! `Ident` and `Paren` only appear in annotations; the checker resolves and
//! normalizes them away before comparing types.

use std::fmt::{self, Display};

use crate::scope::scope::ScopeId;

use super::ast::Expr;

/// Name given to structs and enums written inline without a declaration.
pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveType {
    Int { signed: bool, bits: u16 },
    Float { bits: u16 },
    /// An untyped integer literal. Carries the value when it is known so
    /// range checks can happen where the literal meets a concrete type.
    ComptimeInt(Option<i128>),
    ComptimeFloat,
    Bool,
    Null,
    Undefined,
    Void,
    NoReturn,
    Any,
    /// The type of types.
    Type,
    Err,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArraySize {
    Fixed(u64),
    /// A size expression not yet folded to a constant.
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructMember {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    pub members: Vec<StructMember>,
    pub scope: Option<ScopeId>,
}

impl StructType {
    pub fn is_anonymous(&self) -> bool {
        self.name == ANONYMOUS
    }

    pub fn member(&self, name: &str) -> Option<&StructMember> {
        self.members.iter().find(|member| member.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    pub name: String,
    pub payload: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub variants: Vec<EnumVariant>,
    pub scope: Option<ScopeId>,
}

impl EnumType {
    pub fn variant(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|variant| variant.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub return_type: Box<Type>,
    pub error_type: Option<Box<Type>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(PrimitiveType),
    Ident(String),
    Pointer { target: Box<Type>, mutable: bool },
    Optional(Box<Type>),
    Array { target: Box<Type>, size: Option<ArraySize>, mutable: bool },
    Tuple(Vec<Type>),
    Struct(StructType),
    Enum(EnumType),
    ErrSet(Vec<String>),
    Union(Vec<Type>),
    Function(FunctionType),
    Paren(Box<Type>),
}

impl Type {
    pub fn int(signed: bool, bits: u16) -> Type {
        Type::Primitive(PrimitiveType::Int { signed, bits })
    }

    pub fn i32() -> Type {
        Type::int(true, 32)
    }

    pub fn u8() -> Type {
        Type::int(false, 8)
    }

    pub fn usize() -> Type {
        Type::int(false, 64)
    }

    pub fn float(bits: u16) -> Type {
        Type::Primitive(PrimitiveType::Float { bits })
    }

    pub fn comptime_int(value: Option<i128>) -> Type {
        Type::Primitive(PrimitiveType::ComptimeInt(value))
    }

    pub fn comptime_float() -> Type {
        Type::Primitive(PrimitiveType::ComptimeFloat)
    }

    pub fn bool() -> Type {
        Type::Primitive(PrimitiveType::Bool)
    }

    pub fn null() -> Type {
        Type::Primitive(PrimitiveType::Null)
    }

    pub fn undefined() -> Type {
        Type::Primitive(PrimitiveType::Undefined)
    }

    pub fn void() -> Type {
        Type::Primitive(PrimitiveType::Void)
    }

    pub fn noreturn() -> Type {
        Type::Primitive(PrimitiveType::NoReturn)
    }

    pub fn any() -> Type {
        Type::Primitive(PrimitiveType::Any)
    }

    pub fn meta() -> Type {
        Type::Primitive(PrimitiveType::Type)
    }

    pub fn err() -> Type {
        Type::Primitive(PrimitiveType::Err)
    }

    pub fn ident(name: &str) -> Type {
        Type::Ident(name.to_string())
    }

    pub fn pointer(target: Type, mutable: bool) -> Type {
        Type::Pointer {
            target: Box::new(target),
            mutable,
        }
    }

    pub fn optional(target: Type) -> Type {
        Type::Optional(Box::new(target))
    }

    pub fn array(target: Type, size: Option<u64>, mutable: bool) -> Type {
        Type::Array {
            target: Box::new(target),
            size: size.map(ArraySize::Fixed),
            mutable,
        }
    }

    /// The type of a string literal of `len` bytes.
    pub fn string(len: u64) -> Type {
        Type::array(Type::u8(), Some(len), false)
    }

    pub fn paren(inner: Type) -> Type {
        Type::Paren(Box::new(inner))
    }

    pub fn function(params: Vec<Type>, return_type: Type, error_type: Option<Type>) -> Type {
        Type::Function(FunctionType {
            params,
            return_type: Box::new(return_type),
            error_type: error_type.map(Box::new),
        })
    }

    /// Strips parentheses at the top level only.
    pub fn unparen(&self) -> &Type {
        match self {
            Type::Paren(inner) => inner.unparen(),
            other => other,
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveType> {
        match self.unparen() {
            Type::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.as_primitive(),
            Some(
                PrimitiveType::Int { .. }
                    | PrimitiveType::Float { .. }
                    | PrimitiveType::ComptimeInt(_)
                    | PrimitiveType::ComptimeFloat
            )
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.as_primitive(),
            Some(PrimitiveType::Int { .. } | PrimitiveType::ComptimeInt(_))
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self.as_primitive(),
            Some(PrimitiveType::Float { .. } | PrimitiveType::ComptimeFloat)
        )
    }

    pub fn is_comptime(&self) -> bool {
        matches!(
            self.as_primitive(),
            Some(PrimitiveType::ComptimeInt(_) | PrimitiveType::ComptimeFloat)
        )
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.as_primitive(), Some(PrimitiveType::Bool))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.as_primitive(), Some(PrimitiveType::Null))
    }

    pub fn is_void(&self) -> bool {
        matches!(self.as_primitive(), Some(PrimitiveType::Void))
    }

    pub fn is_noreturn(&self) -> bool {
        matches!(self.as_primitive(), Some(PrimitiveType::NoReturn))
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.as_primitive(), Some(PrimitiveType::Type))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.unparen(), Type::Optional(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.unparen(), Type::Pointer { .. })
    }

    /// Arrays of `u8` double as strings.
    pub fn is_string_like(&self) -> bool {
        match self.unparen() {
            Type::Array { target, .. } => matches!(
                target.as_primitive(),
                Some(PrimitiveType::Int {
                    signed: false,
                    bits: 8
                })
            ),
            _ => false,
        }
    }

    /// Bit width of a sized numeric type.
    pub fn bits(&self) -> Option<u16> {
        match self.as_primitive() {
            Some(PrimitiveType::Int { bits, .. }) | Some(PrimitiveType::Float { bits }) => {
                Some(*bits)
            }
            _ => None,
        }
    }

    pub fn is_signed(&self) -> bool {
        match self.as_primitive() {
            Some(PrimitiveType::Int { signed, .. }) => *signed,
            Some(PrimitiveType::Float { .. }) | Some(PrimitiveType::ComptimeFloat) => true,
            Some(PrimitiveType::ComptimeInt(value)) => value.is_some_and(|v| v < 0),
            _ => false,
        }
    }

    /// Fixed element count of an array type, when known.
    pub fn array_len(&self) -> Option<u64> {
        match self.unparen() {
            Type::Array {
                size: Some(ArraySize::Fixed(len)),
                ..
            } => Some(*len),
            _ => None,
        }
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Int { signed: true, bits } => write!(f, "i{}", bits),
            PrimitiveType::Int { signed: false, bits } => write!(f, "u{}", bits),
            PrimitiveType::Float { bits } => write!(f, "f{}", bits),
            PrimitiveType::ComptimeInt(_) => write!(f, "comptime_int"),
            PrimitiveType::ComptimeFloat => write!(f, "comptime_float"),
            PrimitiveType::Bool => write!(f, "bool"),
            PrimitiveType::Null => write!(f, "null"),
            PrimitiveType::Undefined => write!(f, "undefined"),
            PrimitiveType::Void => write!(f, "void"),
            PrimitiveType::NoReturn => write!(f, "noreturn"),
            PrimitiveType::Any => write!(f, "any"),
            PrimitiveType::Type => write!(f, "type"),
            PrimitiveType::Err => write!(f, "err"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Type], separator: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(primitive) => write!(f, "{}", primitive),
            Type::Ident(name) => write!(f, "{}", name),
            Type::Pointer { target, mutable } => {
                if *mutable {
                    write!(f, "*{}", target)
                } else {
                    write!(f, "*const {}", target)
                }
            }
            Type::Optional(target) => write!(f, "?{}", target),
            Type::Array { target, size, .. } => match size {
                Some(ArraySize::Fixed(len)) => write!(f, "[{}]{}", len, target),
                Some(ArraySize::Expr(_)) => write!(f, "[_]{}", target),
                None => write!(f, "[]{}", target),
            },
            Type::Tuple(fields) => {
                write!(f, "(")?;
                write_list(f, fields, ", ")?;
                write!(f, ")")
            }
            Type::Struct(structure) => {
                if structure.is_anonymous() {
                    write!(f, "struct {{ ")?;
                    for (i, member) in structure.members.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}: {}", member.name, member.ty)?;
                    }
                    write!(f, " }}")
                } else {
                    write!(f, "{}", structure.name)
                }
            }
            Type::Enum(enumeration) => write!(f, "{}", enumeration.name),
            Type::ErrSet(members) => write!(f, "error{{{}}}", members.join(", ")),
            Type::Union(types) => write_list(f, types, " | "),
            Type::Function(function) => {
                write!(f, "fn(")?;
                write_list(f, &function.params, ", ")?;
                write!(f, ") {}", function.return_type)?;
                if let Some(error) = &function.error_type {
                    write!(f, " !{}", error)?;
                }
                Ok(())
            }
            Type::Paren(inner) => write!(f, "({})", inner),
        }
    }
}
