use lazy_static::lazy_static;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::{ast::types::Type, errors::errors::ErrorImpl};

/// What a builtin function accepts in one argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinArg {
    Any,
    Bool,
    Integer,
    String,
    /// A type expression such as `i32`.
    Type,
}

#[derive(Debug, Clone, Copy)]
pub enum BuiltinReturn {
    Fixed(fn() -> Type),
    /// The type passed as the first argument.
    FirstArgType,
}

#[derive(Debug, Clone, Copy)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub params: &'static [BuiltinArg],
    /// Extra trailing arguments of any type are accepted.
    pub variadic: bool,
    pub returns: BuiltinReturn,
}

pub const FLOAT_WIDTHS: [u16; 5] = [16, 32, 64, 80, 128];
const MAX_INT_WIDTH: u32 = 128;

lazy_static! {
    static ref SIZED_INT: Regex = Regex::new(r"^([iu])(\d+)$").unwrap();
    static ref SIZED_FLOAT: Regex = Regex::new(r"^f(\d+)$").unwrap();

    static ref NAMED_TYPES: FxHashMap<&'static str, fn() -> Type> = {
        let mut map: FxHashMap<&'static str, fn() -> Type> = FxHashMap::default();
        map.insert("bool", Type::bool);
        map.insert("void", Type::void);
        map.insert("noreturn", Type::noreturn);
        map.insert("any", Type::any);
        map.insert("type", Type::meta);
        map.insert("err", Type::err);
        map.insert("isize", || Type::int(true, 64));
        map.insert("usize", Type::usize);
        map.insert("comptime_int", || Type::comptime_int(None));
        map.insert("comptime_float", Type::comptime_float);
        map
    };

    static ref BUILTIN_FUNCTIONS: FxHashMap<&'static str, BuiltinFunction> = {
        let mut map = FxHashMap::default();
        for function in [
            BuiltinFunction {
                name: "@print",
                params: &[],
                variadic: true,
                returns: BuiltinReturn::Fixed(Type::void),
            },
            BuiltinFunction {
                name: "@println",
                params: &[],
                variadic: true,
                returns: BuiltinReturn::Fixed(Type::void),
            },
            BuiltinFunction {
                name: "@assert",
                params: &[BuiltinArg::Bool],
                variadic: false,
                returns: BuiltinReturn::Fixed(Type::void),
            },
            BuiltinFunction {
                name: "@panic",
                params: &[BuiltinArg::String],
                variadic: false,
                returns: BuiltinReturn::Fixed(Type::noreturn),
            },
            BuiltinFunction {
                name: "@intCast",
                params: &[BuiltinArg::Type, BuiltinArg::Integer],
                variadic: false,
                returns: BuiltinReturn::FirstArgType,
            },
            BuiltinFunction {
                name: "@truncate",
                params: &[BuiltinArg::Type, BuiltinArg::Integer],
                variadic: false,
                returns: BuiltinReturn::FirstArgType,
            },
        ] {
            map.insert(function.name, function);
        }
        map
    };
}

/// Resolves a builtin type name.
///
/// `Ok(None)` means the name is not a builtin and has to be looked up as a
/// symbol. Names shaped like a sized number with a width the language does
/// not have are an error.
pub fn lookup_builtin_type(name: &str) -> Result<Option<Type>, ErrorImpl> {
    if let Some(constructor) = NAMED_TYPES.get(name) {
        return Ok(Some(constructor()));
    }

    if let Some(captures) = SIZED_INT.captures(name) {
        let signed = &captures[1] == "i";
        return match captures[2].parse::<u32>() {
            Ok(bits) if (1..=MAX_INT_WIDTH).contains(&bits) => Ok(Some(Type::int(signed, bits as u16))),
            _ => Err(ErrorImpl::InvalidTypeWidth {
                type_: name.to_string(),
            }),
        };
    }

    if let Some(captures) = SIZED_FLOAT.captures(name) {
        return match captures[1].parse::<u16>() {
            Ok(bits) if FLOAT_WIDTHS.contains(&bits) => Ok(Some(Type::float(bits))),
            _ => Err(ErrorImpl::InvalidTypeWidth {
                type_: name.to_string(),
            }),
        };
    }

    Ok(None)
}

pub fn lookup_builtin_function(name: &str) -> Option<BuiltinFunction> {
    BUILTIN_FUNCTIONS.get(name).copied()
}

pub fn is_builtin_name(name: &str) -> bool {
    name.starts_with('@')
}
