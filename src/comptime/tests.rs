use pretty_assertions::assert_eq;

use crate::ast::{
    ast::Expr,
    expressions::{BinaryOp, PrefixOp},
    types::{EnumType, EnumVariant, StructMember, StructType, Type},
};

use super::{
    comptime::{ComptimeEvaluator, ComptimeValue},
    evaluator::LiteralEvaluator,
};

#[test]
fn test_integer_literals() {
    let evaluator = LiteralEvaluator::new();

    assert_eq!(evaluator.extract_integer_value(&Expr::int("42")), Some(42));
    assert_eq!(evaluator.extract_integer_value(&Expr::int("0xff")), Some(255));
    assert_eq!(evaluator.extract_integer_value(&Expr::int("1_000")), Some(1000));
    assert_eq!(evaluator.extract_integer_value(&Expr::float("1.5")), None);
}

#[test]
fn test_arithmetic_folding() {
    let evaluator = LiteralEvaluator::new();
    let expr = Expr::binary(
        BinaryOp::Mul,
        Expr::paren(Expr::binary(BinaryOp::Add, Expr::int("2"), Expr::int("3"))),
        Expr::prefix(PrefixOp::Minus, Expr::int("4")),
    );

    assert_eq!(evaluator.extract_integer_value(&expr), Some(-20));
}

#[test]
fn test_division_by_zero_does_not_fold() {
    let evaluator = LiteralEvaluator::new();
    let expr = Expr::binary(BinaryOp::Div, Expr::int("1"), Expr::int("0"));

    assert_eq!(evaluator.evaluate_comptime_expression(&expr, None), None);
}

#[test]
fn test_mixed_float_folding() {
    let evaluator = LiteralEvaluator::new();
    let expr = Expr::binary(BinaryOp::Add, Expr::float("0.5"), Expr::int("2"));

    assert_eq!(evaluator.evaluate_comptime_float(&expr), Some(2.5));
    assert_eq!(
        evaluator.evaluate_comptime_expression(&Expr::int("3"), Some(&Type::float(64))),
        Some(ComptimeValue::Float(3.0))
    );
}

#[test]
fn test_identifiers_are_not_folded() {
    let evaluator = LiteralEvaluator::new();

    assert_eq!(evaluator.extract_integer_value(&Expr::ident("n")), None);
}

#[test]
fn test_primitive_sizes() {
    let evaluator = LiteralEvaluator::new();

    assert_eq!(evaluator.compute_type_size(&Type::u8()), Some(1));
    assert_eq!(evaluator.compute_type_size(&Type::i32()), Some(4));
    assert_eq!(evaluator.compute_type_size(&Type::int(false, 21)), Some(4));
    assert_eq!(evaluator.compute_type_size(&Type::float(64)), Some(8));
    assert_eq!(evaluator.compute_type_size(&Type::bool()), Some(1));
    assert_eq!(evaluator.compute_type_size(&Type::comptime_int(Some(1))), None);
}

#[test]
fn test_composite_sizes() {
    let evaluator = LiteralEvaluator::new();
    let point = Type::Struct(StructType {
        name: "Point".to_string(),
        members: vec![
            StructMember {
                name: "tag".to_string(),
                ty: Type::u8(),
            },
            StructMember {
                name: "x".to_string(),
                ty: Type::i32(),
            },
        ],
        scope: None,
    });

    assert_eq!(evaluator.compute_type_size(&point), Some(8));
    assert_eq!(evaluator.compute_type_size(&Type::array(Type::i32(), Some(3), false)), Some(12));
    assert_eq!(evaluator.compute_type_size(&Type::pointer(Type::i32(), true)), Some(8));
    assert_eq!(evaluator.compute_type_size(&Type::optional(Type::pointer(Type::u8(), false))), Some(8));
    assert_eq!(evaluator.compute_type_size(&Type::optional(Type::i32())), Some(8));
    assert_eq!(evaluator.compute_type_size(&Type::Tuple(vec![Type::u8(), Type::u8()])), Some(2));
}

#[test]
fn test_enum_sizes() {
    let evaluator = LiteralEvaluator::new();
    let plain = Type::Enum(EnumType {
        name: "Color".to_string(),
        variants: vec![
            EnumVariant {
                name: "Red".to_string(),
                payload: None,
            },
            EnumVariant {
                name: "Green".to_string(),
                payload: None,
            },
        ],
        scope: None,
    });
    let tagged = Type::Enum(EnumType {
        name: "Shape".to_string(),
        variants: vec![EnumVariant {
            name: "Circle".to_string(),
            payload: Some(Type::float(32)),
        }],
        scope: None,
    });

    assert_eq!(evaluator.compute_type_size(&plain), Some(1));
    assert_eq!(evaluator.compute_type_size(&tagged), Some(8));
}
