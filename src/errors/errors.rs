use std::fmt::Display;

use thiserror::Error;

use crate::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    span: Span,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, span: Span) -> Self {
        Error {
            internal_error: error_impl,
            span,
        }
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        Error::new(
            ErrorImpl::InternalError {
                message: message.into(),
            },
            span,
        )
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::CannotInferType { .. } => "CannotInferType",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::SymbolNotFound { .. } => "SymbolNotFound",
            ErrorImpl::SymbolNotAccessible { .. } => "SymbolNotAccessible",
            ErrorImpl::SymbolNotExported { .. } => "SymbolNotExported",
            ErrorImpl::DuplicateSymbol { .. } => "DuplicateSymbol",
            ErrorImpl::UndefinedIdentifier { .. } => "UndefinedIdentifier",
            ErrorImpl::UndefinedBuiltin { .. } => "UndefinedBuiltin",
            ErrorImpl::InvalidStaticAccess { .. } => "InvalidStaticAccess",
            ErrorImpl::MutabilityMismatch { .. } => "MutabilityMismatch",
            ErrorImpl::ArraySizeMismatch { .. } => "ArraySizeMismatch",
            ErrorImpl::TooFewArguments { .. } => "TooFewArguments",
            ErrorImpl::TooManyArguments { .. } => "TooManyArguments",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::MissingReturnStatement { .. } => "MissingReturnStatement",
            ErrorImpl::ReturnOutsideFunction => "ReturnOutsideFunction",
            ErrorImpl::ControlFlowOutsideLoop { .. } => "ControlFlowOutsideLoop",
            ErrorImpl::UnreachableCode => "UnreachableCode",
            ErrorImpl::ThrowWithoutErrorType { .. } => "ThrowWithoutErrorType",
            ErrorImpl::ThrowTypeMismatch { .. } => "ThrowTypeMismatch",
            ErrorImpl::ErrorMemberNotFound { .. } => "ErrorMemberNotFound",
            ErrorImpl::IndexOutOfBounds { .. } => "IndexOutOfBounds",
            ErrorImpl::InvalidTypeWidth { .. } => "InvalidTypeWidth",
            ErrorImpl::ArithmeticOverflow { .. } => "ArithmeticOverflow",
            ErrorImpl::CircularTypeDependency { .. } => "CircularTypeDependency",
            ErrorImpl::NonExhaustiveMatch { .. } => "NonExhaustiveMatch",
            ErrorImpl::MissingStructField { .. } => "MissingStructField",
            ErrorImpl::InvalidReference => "InvalidReference",
            ErrorImpl::InvalidParameterVisibility { .. } => "InvalidParameterVisibility",
            ErrorImpl::InvalidCast { .. } => "InvalidCast",
            ErrorImpl::ModuleNotFound { .. } => "ModuleNotFound",
            ErrorImpl::InternalError { .. } => "InternalError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::TypeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::SymbolNotAccessible { name } => ErrorTip::Suggestion(format!(
                "`{}` is private, mark it `pub` to use it here",
                name
            )),
            ErrorImpl::SymbolNotExported { name, module } => ErrorTip::Suggestion(format!(
                "`{}` is not public in module `{}`",
                name, module
            )),
            ErrorImpl::InvalidStaticAccess { name, .. } => ErrorTip::Suggestion(format!(
                "Access `{}` through an instance, or through the type if it is static",
                name
            )),
            ErrorImpl::ArraySizeMismatch { expected, received } => ErrorTip::Suggestion(
                format!("Expected {} elements, received {}", expected, received),
            ),
            ErrorImpl::TooFewArguments { expected, received }
            | ErrorImpl::TooManyArguments { expected, received } => ErrorTip::Suggestion(
                format!("Expected {} arguments, received {}", expected, received),
            ),
            ErrorImpl::MissingReturnStatement { function } => ErrorTip::Suggestion(format!(
                "Add a `return` to `{}` or declare its return type `void`",
                function
            )),
            ErrorImpl::ThrowWithoutErrorType { function } => ErrorTip::Suggestion(format!(
                "Declare an error type on `{}`, e.g. `!err`",
                function
            )),
            ErrorImpl::CircularTypeDependency { name } => ErrorTip::Suggestion(format!(
                "Break the cycle through `{}` with a pointer or an optional",
                name
            )),
            ErrorImpl::NonExhaustiveMatch { missing } => ErrorTip::Suggestion(format!(
                "Add cases for {} or a default case",
                missing.join(", ")
            )),
            ErrorImpl::InvalidReference => ErrorTip::Suggestion(String::from(
                "Store the value in a variable before taking its address",
            )),
            ErrorImpl::InternalError { .. } => ErrorTip::Suggestion(String::from(
                "This is a bug in the checker, not in the program",
            )),
            _ => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMismatch { expected: String, received: String },
    #[error("cannot infer type of {subject}")]
    CannotInferType { subject: String },
    #[error("unknown type {type_} found")]
    UnknownType { type_: String },
    #[error("symbol {name:?} not found")]
    SymbolNotFound { name: String },
    #[error("symbol {name:?} is not accessible here")]
    SymbolNotAccessible { name: String },
    #[error("symbol {name:?} is not exported by module {module:?}")]
    SymbolNotExported { name: String, module: String },
    #[error("symbol {name:?} already declared in this scope")]
    DuplicateSymbol { name: String },
    #[error("undefined identifier {name:?}")]
    UndefinedIdentifier { name: String },
    #[error("undefined builtin {name:?}")]
    UndefinedBuiltin { name: String },
    #[error("invalid static access to {name:?}: {detail}")]
    InvalidStaticAccess { name: String, detail: String },
    #[error("cannot assign to {name:?}: {detail}")]
    MutabilityMismatch { name: String, detail: String },
    #[error("array size mismatch: expected {expected}, received {received}")]
    ArraySizeMismatch { expected: u64, received: u64 },
    #[error("too few arguments: expected {expected}, received {received}")]
    TooFewArguments { expected: usize, received: usize },
    #[error("too many arguments: expected {expected}, received {received}")]
    TooManyArguments { expected: usize, received: usize },
    #[error("value of type {ty} is not callable")]
    NotCallable { ty: String },
    #[error("function {function:?} is missing a return statement")]
    MissingReturnStatement { function: String },
    #[error("return statement outside of a function")]
    ReturnOutsideFunction,
    #[error("{keyword} outside of a loop")]
    ControlFlowOutsideLoop { keyword: String },
    #[error("unreachable code")]
    UnreachableCode,
    #[error("function {function:?} throws but declares no error type")]
    ThrowWithoutErrorType { function: String },
    #[error("thrown error does not match: expected {expected}, received {received}")]
    ThrowTypeMismatch { expected: String, received: String },
    #[error("error {member:?} is not a member of {set}")]
    ErrorMemberNotFound { set: String, member: String },
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: i128, length: u64 },
    #[error("invalid type width in {type_}")]
    InvalidTypeWidth { type_: String },
    #[error("value {value} overflows {ty}")]
    ArithmeticOverflow { value: String, ty: String },
    #[error("type {name:?} depends on itself")]
    CircularTypeDependency { name: String },
    #[error("match is not exhaustive, missing {missing:?}")]
    NonExhaustiveMatch { missing: Vec<String> },
    #[error("struct {structure:?} is missing field {field:?}")]
    MissingStructField { structure: String, field: String },
    #[error("cannot take a reference to a value that is not stored anywhere")]
    InvalidReference,
    #[error("parameter {name:?} cannot be static or public")]
    InvalidParameterVisibility { name: String },
    #[error("cannot cast {from} to {to}")]
    InvalidCast { from: String, to: String },
    #[error("module {module:?} not found")]
    ModuleNotFound { module: String },
    #[error("internal error: {message}")]
    InternalError { message: String },
}
