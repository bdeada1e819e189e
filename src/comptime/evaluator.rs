use tracing::trace;

use crate::ast::{
    ast::{Expr, ExprKind},
    expressions::{parse_int_literal, BinaryOp, Literal, PrefixOp},
    types::{ArraySize, PrimitiveType, Type},
};

use super::comptime::{ComptimeEvaluator, ComptimeValue};

const POINTER_SIZE: u64 = 8;
const ERROR_SIZE: u64 = 2;
/// Pointer plus length.
const SLICE_SIZE: u64 = 16;

/// Folds literals and arithmetic over literals. Anything that needs symbol
/// lookup is out of its reach and evaluates to `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralEvaluator;

impl LiteralEvaluator {
    pub fn new() -> Self {
        LiteralEvaluator
    }

    fn evaluate(&self, expr: &Expr) -> Option<ComptimeValue> {
        match &expr.kind {
            ExprKind::Literal(Literal::Int(text)) => parse_int_literal(text).map(ComptimeValue::Int),
            ExprKind::Literal(Literal::Float(text)) => text
                .replace('_', "")
                .parse::<f64>()
                .ok()
                .map(ComptimeValue::Float),
            ExprKind::Literal(Literal::Bool(value)) => Some(ComptimeValue::Bool(*value)),
            ExprKind::Literal(Literal::Char(text)) => text
                .chars()
                .next()
                .map(|c| ComptimeValue::Int(c as i128)),
            ExprKind::Paren(inner) => self.evaluate(inner),
            ExprKind::Prefix(prefix) => {
                let operand = self.evaluate(&prefix.operand)?;
                match (prefix.op, operand) {
                    (PrefixOp::Plus, value) => Some(value),
                    (PrefixOp::Minus, ComptimeValue::Int(value)) => value.checked_neg().map(ComptimeValue::Int),
                    (PrefixOp::Minus, ComptimeValue::Float(value)) => Some(ComptimeValue::Float(-value)),
                    (PrefixOp::Not, ComptimeValue::Bool(value)) => Some(ComptimeValue::Bool(!value)),
                    (PrefixOp::BitNot, ComptimeValue::Int(value)) => Some(ComptimeValue::Int(!value)),
                    _ => None,
                }
            }
            ExprKind::Binary(binary) => {
                let left = self.evaluate(&binary.left)?;
                let right = self.evaluate(&binary.right)?;
                fold_binary(binary.op, left, right)
            }
            _ => None,
        }
    }
}

fn fold_binary(op: BinaryOp, left: ComptimeValue, right: ComptimeValue) -> Option<ComptimeValue> {
    use ComptimeValue::{Bool, Float, Int};

    match (left, right) {
        (Int(a), Int(b)) => match op {
            BinaryOp::Add => a.checked_add(b).map(Int),
            BinaryOp::Sub => a.checked_sub(b).map(Int),
            BinaryOp::Mul => a.checked_mul(b).map(Int),
            BinaryOp::Div => a.checked_div(b).map(Int),
            BinaryOp::Rem => a.checked_rem(b).map(Int),
            BinaryOp::Pow => u32::try_from(b).ok().and_then(|exp| a.checked_pow(exp)).map(Int),
            BinaryOp::Shl => u32::try_from(b).ok().and_then(|shift| a.checked_shl(shift)).map(Int),
            BinaryOp::Shr => u32::try_from(b).ok().and_then(|shift| a.checked_shr(shift)).map(Int),
            BinaryOp::BitAnd => Some(Int(a & b)),
            BinaryOp::BitOr => Some(Int(a | b)),
            BinaryOp::BitXor => Some(Int(a ^ b)),
            BinaryOp::Eq => Some(Bool(a == b)),
            BinaryOp::NotEq => Some(Bool(a != b)),
            BinaryOp::Lt => Some(Bool(a < b)),
            BinaryOp::LtEq => Some(Bool(a <= b)),
            BinaryOp::Gt => Some(Bool(a > b)),
            BinaryOp::GtEq => Some(Bool(a >= b)),
            _ => None,
        },
        (Bool(a), Bool(b)) => match op {
            BinaryOp::And => Some(Bool(a && b)),
            BinaryOp::Or => Some(Bool(a || b)),
            BinaryOp::Eq => Some(Bool(a == b)),
            BinaryOp::NotEq => Some(Bool(a != b)),
            _ => None,
        },
        (left, right) => {
            let a = left.as_float()?;
            let b = right.as_float()?;
            match op {
                BinaryOp::Add => Some(Float(a + b)),
                BinaryOp::Sub => Some(Float(a - b)),
                BinaryOp::Mul => Some(Float(a * b)),
                BinaryOp::Div if b != 0.0 => Some(Float(a / b)),
                BinaryOp::Pow => Some(Float(a.powf(b))),
                BinaryOp::Lt => Some(Bool(a < b)),
                BinaryOp::LtEq => Some(Bool(a <= b)),
                BinaryOp::Gt => Some(Bool(a > b)),
                BinaryOp::GtEq => Some(Bool(a >= b)),
                _ => None,
            }
        }
    }
}

fn align_to(offset: u64, align: u64) -> u64 {
    if align == 0 {
        offset
    } else {
        offset.div_ceil(align) * align
    }
}

/// Byte size and alignment of a type laid out with natural alignment.
fn layout(ty: &Type) -> Option<(u64, u64)> {
    match ty {
        Type::Primitive(primitive) => match primitive {
            PrimitiveType::Int { bits, .. } => {
                let size = u64::from(*bits).div_ceil(8).next_power_of_two();
                Some((size, size.min(16)))
            }
            PrimitiveType::Float { bits } => {
                let size = u64::from(*bits).div_ceil(8).next_power_of_two();
                Some((size, size.min(16)))
            }
            PrimitiveType::Bool => Some((1, 1)),
            PrimitiveType::Err => Some((ERROR_SIZE, ERROR_SIZE)),
            PrimitiveType::Void
            | PrimitiveType::NoReturn
            | PrimitiveType::Null
            | PrimitiveType::Undefined => Some((0, 1)),
            PrimitiveType::ComptimeInt(_)
            | PrimitiveType::ComptimeFloat
            | PrimitiveType::Any
            | PrimitiveType::Type => None,
        },
        Type::Ident(_) => None,
        Type::Paren(inner) => layout(inner),
        Type::Pointer { .. } | Type::Function(_) => Some((POINTER_SIZE, POINTER_SIZE)),
        Type::Optional(inner) => {
            if inner.is_pointer() {
                return Some((POINTER_SIZE, POINTER_SIZE));
            }
            let (size, align) = layout(inner)?;
            let align = align.max(1);
            Some((align_to(size + 1, align), align))
        }
        Type::Array { target, size, .. } => match size {
            Some(ArraySize::Fixed(len)) => {
                let (element, align) = layout(target)?;
                Some((element.checked_mul(*len)?, align))
            }
            _ => Some((SLICE_SIZE, POINTER_SIZE)),
        },
        Type::Tuple(fields) => record_layout(fields.iter()),
        Type::Struct(structure) => record_layout(structure.members.iter().map(|member| &member.ty)),
        Type::Enum(enumeration) => {
            let tag = match enumeration.variants.len() {
                0..=256 => 1,
                257..=65536 => 2,
                _ => 4,
            };
            let mut payload = (0u64, 1u64);
            for variant in &enumeration.variants {
                if let Some(ty) = &variant.payload {
                    let (size, align) = layout(ty)?;
                    payload = (payload.0.max(size), payload.1.max(align));
                }
            }
            if payload.0 == 0 {
                return Some((tag, tag));
            }
            let align = payload.1.max(tag);
            Some((align_to(align_to(tag, payload.1) + payload.0, align), align))
        }
        Type::ErrSet(_) => Some((ERROR_SIZE, ERROR_SIZE)),
        Type::Union(types) => {
            let mut largest = (0u64, 1u64);
            for ty in types {
                let (size, align) = layout(ty)?;
                largest = (largest.0.max(size), largest.1.max(align));
            }
            Some((align_to(largest.0 + 1, largest.1), largest.1))
        }
    }
}

fn record_layout<'a>(fields: impl Iterator<Item = &'a Type>) -> Option<(u64, u64)> {
    let mut offset = 0;
    let mut max_align = 1;
    for field in fields {
        let (size, align) = layout(field)?;
        let align = align.max(1);
        offset = align_to(offset, align) + size;
        max_align = max_align.max(align);
    }
    Some((align_to(offset, max_align), max_align))
}

impl ComptimeEvaluator for LiteralEvaluator {
    fn evaluate_comptime_expression(&self, expr: &Expr, expected: Option<&Type>) -> Option<ComptimeValue> {
        let value = self.evaluate(expr)?;
        trace!(%value, "folded comptime expression");
        match (value, expected) {
            (ComptimeValue::Int(int), Some(ty)) if ty.is_float() => Some(ComptimeValue::Float(int as f64)),
            _ => Some(value),
        }
    }

    fn compute_type_size(&self, ty: &Type) -> Option<u64> {
        layout(ty).map(|(size, _)| size)
    }
}
