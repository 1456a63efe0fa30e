use chrono::{Datelike, Timelike};
use replay_model::{
    known,
    value::{DateTimeKind, Uri},
    Primitive, Value,
};

use super::{
    codegen::{char_literal, string_literal},
    error::Error,
    resolver::TypeResolver,
    types::Expression,
};

/// The source form of a simple value.
pub fn literal(resolver: &mut dyn TypeResolver, value: &Value) -> Result<Expression, Error> {
    let raw = |text: String| -> Result<Expression, Error> { Ok(Expression::Literal(text)) };

    match value {
        Value::Boolean(value) => raw(value.to_string()),
        Value::Int32(value) => raw(value.to_string()),
        Value::Int64(value) => raw(format!("{}L", value)),
        Value::UInt32(value) => raw(format!("{}U", value)),
        Value::UInt64(value) => raw(format!("{}UL", value)),
        Value::Int16(value) => Ok(narrow(resolver, Primitive::Int16, value.to_string())),
        Value::UInt16(value) => Ok(narrow(resolver, Primitive::UInt16, value.to_string())),
        Value::Byte(value) => Ok(narrow(resolver, Primitive::Byte, value.to_string())),
        Value::SByte(value) => Ok(narrow(resolver, Primitive::SByte, value.to_string())),

        Value::Single(value) => Ok(match non_finite(f64::from(*value)) {
            Some(field) => type_reference(resolver, Primitive::Single).field(field),
            None => Expression::Literal(format!("{:?}F", value)),
        }),

        Value::Double(value) => Ok(match non_finite(*value) {
            Some(field) => type_reference(resolver, Primitive::Double).field(field),
            None => Expression::Literal(format!("{:?}D", value)),
        }),

        Value::Decimal(value) => raw(format!("{}m", value.as_str())),
        Value::Char(value) => raw(char_literal(*value)),
        Value::String(value) => raw(string_literal(value)),

        Value::DateTime(value) => {
            let date = value.value;
            let mut arguments: Vec<Expression> = [
                date.year() as i64,
                date.month() as i64,
                date.day() as i64,
                date.hour() as i64,
                date.minute() as i64,
                date.second() as i64,
                (date.nanosecond() / 1_000_000) as i64,
            ]
            .iter()
            .map(|component| Expression::Literal(component.to_string()))
            .collect();

            let kind = match value.kind {
                DateTimeKind::Unspecified => None,
                DateTimeKind::Utc => Some("Utc"),
                DateTimeKind::Local => Some("Local"),
            };

            if let Some(kind) = kind {
                let ty = resolver.resolve(&known::date_time_kind());
                arguments.push(Expression::TypeReference(ty).field(kind));
            }

            Ok(Expression::New {
                ty: resolver.resolve(&known::date_time()),
                arguments,
            })
        }

        Value::TimeSpan(value) => Ok(Expression::New {
            ty: resolver.resolve(&known::primitive(Primitive::TimeSpan)),
            arguments: [
                value.days(),
                value.hours(),
                value.minutes(),
                value.seconds(),
                value.milliseconds(),
            ]
            .iter()
            .map(|component| Expression::Literal(component.to_string()))
            .collect(),
        }),

        Value::Guid(value) => Ok(Expression::New {
            ty: resolver.resolve(&known::guid()),
            arguments: vec![Expression::Literal(string_literal(
                &value.hyphenated().to_string(),
            ))],
        }),

        Value::Uri(value) => {
            let mut arguments = vec![Expression::Literal(string_literal(value.as_str()))];

            if let Uri::Relative(..) = value {
                let kind = resolver.resolve(&known::uri_kind());
                arguments.push(Expression::TypeReference(kind).field("Relative"));
            }

            Ok(Expression::New {
                ty: resolver.resolve(&known::uri()),
                arguments,
            })
        }

        Value::QualifiedName(value) => {
            let arguments = match (value.name.is_empty(), value.namespace.is_empty()) {
                (true, true) => vec![],
                (_, true) => vec![Expression::Literal(string_literal(&value.name))],
                _ => vec![
                    Expression::Literal(string_literal(&value.name)),
                    Expression::Literal(string_literal(&value.namespace)),
                ],
            };

            Ok(Expression::New {
                ty: resolver.resolve(&known::primitive(Primitive::QualifiedName)),
                arguments,
            })
        }

        Value::Enum(value) => {
            let ty = resolver.resolve(&value.ty);

            let members = value
                .members
                .iter()
                .map(|member| Expression::TypeReference(ty.clone()).field(member));

            Ok(members
                .reduce(|left, right| Expression::binary(left, "|", right))
                .unwrap_or_else(|| Expression::cast(ty.clone(), Expression::Literal("0".to_owned()))))
        }

        Value::DbNull => {
            Ok(Expression::TypeReference(resolver.resolve(&known::db_null())).field("Value"))
        }

        other => Err(Error::InvalidOperation(format!(
            "{:?} has no literal form.",
            other
        ))),
    }
}

/// Integers narrower than `int` need a cast to keep their type.
fn narrow(resolver: &mut dyn TypeResolver, primitive: Primitive, text: String) -> Expression {
    Expression::cast(
        resolver.resolve(&known::primitive(primitive)),
        Expression::Literal(text),
    )
}

fn type_reference(resolver: &mut dyn TypeResolver, primitive: Primitive) -> Expression {
    Expression::TypeReference(resolver.resolve(&known::primitive(primitive)))
}

fn non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value == f64::INFINITY {
        Some("PositiveInfinity")
    } else if value == f64::NEG_INFINITY {
        Some("NegativeInfinity")
    } else {
        None
    }
}
