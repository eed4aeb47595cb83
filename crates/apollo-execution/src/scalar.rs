use crate::error::InvalidValue;
use crate::JsonMap;
use crate::JsonValue;
use apollo_compiler::ast;
use std::sync::Arc;

/// Serialization and parsing of a scalar type
///
/// Built-in scalars `Int`, `Float`, `String`, `Boolean`, and `ID` follow the rules of the
/// [GraphQL specification](https://spec.graphql.org/October2021/#sec-Scalars).
/// A custom scalar without a registered implementation accepts and returns
/// any JSON value as-is.
pub trait Scalar: Send + Sync {
    /// [Result coercion](https://spec.graphql.org/October2021/#sec-Scalars.Result-Coercion-and-Serialization)
    /// of a non-null resolved value.
    ///
    /// Returns `None` if the value cannot be represented, which is a field error.
    fn coerce_output(&self, value: &JsonValue) -> Option<JsonValue>;

    /// [Input coercion](https://spec.graphql.org/October2021/#sec-Scalars.Input-Coercion)
    /// of a non-null value provided through variables.
    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, InvalidValue>;

    /// Input coercion of a non-null literal written in a document.
    ///
    /// Never called with a variable reference. Returns `None` for an invalid literal.
    fn parse_literal(&self, value: &ast::Value) -> Option<JsonValue>;
}

pub(crate) fn builtin(name: &str) -> Arc<dyn Scalar> {
    match name {
        "Int" => Arc::new(IntScalar),
        "Float" => Arc::new(FloatScalar),
        "String" => Arc::new(StringScalar),
        "Boolean" => Arc::new(BooleanScalar),
        "ID" => Arc::new(IdScalar),
        _ => Arc::new(CustomScalar),
    }
}

struct IntScalar;
struct FloatScalar;
struct StringScalar;
struct BooleanScalar;
struct IdScalar;
struct CustomScalar;

/// Converts to `i32` a number that has no fractional part
fn to_i32(number: f64) -> Option<i32> {
    let in_range = number >= f64::from(i32::MIN) && number <= f64::from(i32::MAX);
    (number.fract() == 0.0 && in_range).then_some(number as i32)
}

impl Scalar for IntScalar {
    fn coerce_output(&self, value: &JsonValue) -> Option<JsonValue> {
        let int = match value {
            JsonValue::Bool(value) => i32::from(*value),
            JsonValue::Number(_) => to_i32(value.as_f64()?)?,
            JsonValue::String(value) => to_i32(value.as_str().trim().parse().ok()?)?,
            _ => return None,
        };
        Some(int.into())
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, InvalidValue> {
        let Some(number) = value.as_f64() else {
            return Err(InvalidValue::with_reason(format!(
                "Int cannot represent non-integer value: < {} >.",
                display_json(value)
            )));
        };
        if number.fract() != 0.0 {
            return Err(InvalidValue::with_reason(format!(
                "Int cannot represent non-integer value: < {number} >."
            )));
        }
        to_i32(number).map(JsonValue::from).ok_or_else(|| {
            InvalidValue::with_reason(format!(
                "Int cannot represent non 32-bit signed integer value: < {number} >."
            ))
        })
    }

    fn parse_literal(&self, value: &ast::Value) -> Option<JsonValue> {
        match value {
            ast::Value::Int(int) => int.as_str().parse::<i32>().ok().map(JsonValue::from),
            _ => None,
        }
    }
}

impl Scalar for FloatScalar {
    fn coerce_output(&self, value: &JsonValue) -> Option<JsonValue> {
        let float = match value {
            JsonValue::Bool(value) => f64::from(u8::from(*value)),
            JsonValue::Number(_) => value.as_f64()?,
            JsonValue::String(value) => value.as_str().trim().parse().ok()?,
            _ => return None,
        };
        float.is_finite().then(|| float.into())
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, InvalidValue> {
        value
            .as_f64()
            .filter(|float| float.is_finite())
            .map(JsonValue::from)
            .ok_or_else(|| {
                InvalidValue::with_reason(format!(
                    "Float cannot represent non numeric value: < {} >.",
                    display_json(value)
                ))
            })
    }

    fn parse_literal(&self, value: &ast::Value) -> Option<JsonValue> {
        let float: f64 = match value {
            ast::Value::Int(int) => int.as_str().parse().ok()?,
            ast::Value::Float(float) => float.as_str().parse().ok()?,
            _ => return None,
        };
        float.is_finite().then(|| float.into())
    }
}

impl Scalar for StringScalar {
    fn coerce_output(&self, value: &JsonValue) -> Option<JsonValue> {
        match value {
            JsonValue::String(_) => Some(value.clone()),
            JsonValue::Number(number) => Some(number.to_string().into()),
            JsonValue::Bool(value) => Some(value.to_string().into()),
            _ => None,
        }
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, InvalidValue> {
        match value {
            JsonValue::String(_) => Ok(value.clone()),
            _ => Err(InvalidValue::with_reason(format!(
                "String cannot represent a non string value: < {} >.",
                display_json(value)
            ))),
        }
    }

    fn parse_literal(&self, value: &ast::Value) -> Option<JsonValue> {
        match value {
            ast::Value::String(value) => Some(value.as_str().into()),
            _ => None,
        }
    }
}

impl Scalar for BooleanScalar {
    fn coerce_output(&self, value: &JsonValue) -> Option<JsonValue> {
        match value {
            JsonValue::Bool(_) => Some(value.clone()),
            JsonValue::Number(_) => Some((value.as_f64()? != 0.0).into()),
            _ => None,
        }
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, InvalidValue> {
        match value {
            JsonValue::Bool(_) => Ok(value.clone()),
            _ => Err(InvalidValue::with_reason(format!(
                "Boolean cannot represent a non boolean value: < {} >.",
                display_json(value)
            ))),
        }
    }

    fn parse_literal(&self, value: &ast::Value) -> Option<JsonValue> {
        match value {
            ast::Value::Boolean(value) => Some((*value).into()),
            _ => None,
        }
    }
}

impl Scalar for IdScalar {
    fn coerce_output(&self, value: &JsonValue) -> Option<JsonValue> {
        match value {
            JsonValue::String(_) => Some(value.clone()),
            JsonValue::Number(number) if number.is_i64() || number.is_u64() => {
                Some(number.to_string().into())
            }
            _ => None,
        }
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, InvalidValue> {
        self.coerce_output(value).ok_or_else(|| {
            InvalidValue::with_reason(format!(
                "ID cannot represent value: < {} >.",
                display_json(value)
            ))
        })
    }

    fn parse_literal(&self, value: &ast::Value) -> Option<JsonValue> {
        match value {
            ast::Value::String(value) => Some(value.as_str().into()),
            ast::Value::Int(value) => Some(value.as_str().into()),
            _ => None,
        }
    }
}

impl Scalar for CustomScalar {
    fn coerce_output(&self, value: &JsonValue) -> Option<JsonValue> {
        Some(value.clone())
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, InvalidValue> {
        Ok(value.clone())
    }

    fn parse_literal(&self, value: &ast::Value) -> Option<JsonValue> {
        const_value_to_json(value)
    }
}

/// Converts a literal without variable references, as-is
fn const_value_to_json(value: &ast::Value) -> Option<JsonValue> {
    Some(match value {
        ast::Value::Null => JsonValue::Null,
        ast::Value::Variable(_) => return None,
        ast::Value::Enum(value) => value.as_str().into(),
        ast::Value::String(value) => value.as_str().into(),
        ast::Value::Boolean(value) => (*value).into(),
        ast::Value::Int(value) => value
            .as_str()
            .parse::<i64>()
            .map(JsonValue::from)
            .or_else(|_| value.as_str().parse::<f64>().map(JsonValue::from))
            .ok()?,
        ast::Value::Float(value) => value.as_str().parse::<f64>().ok()?.into(),
        ast::Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| const_value_to_json(item))
                .collect::<Option<_>>()?,
        ),
        ast::Value::Object(fields) => JsonValue::Object(
            fields
                .iter()
                .map(|(name, value)| Some((name.as_str().into(), const_value_to_json(value)?)))
                .collect::<Option<JsonMap>>()?,
        ),
    })
}

/// Renders a value for error messages
pub(crate) fn display_json(value: &JsonValue) -> String {
    serde_json_bytes::serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json_bytes::json;

    fn literal(source: &str) -> ast::Value {
        let document = ast::Document::parse(
            format!("query {{ f(a: {source}) }}"),
            "literal.graphql",
        )
        .unwrap();
        let ast::Definition::OperationDefinition(operation) = &document.definitions[0] else {
            panic!("expected an operation")
        };
        let ast::Selection::Field(field) = &operation.selection_set[0] else {
            panic!("expected a field")
        };
        field.arguments[0].value.as_ref().clone()
    }

    #[test]
    fn int() {
        let int = builtin("Int");
        assert_eq!(int.coerce_output(&json!(4)), Some(json!(4)));
        assert_eq!(int.coerce_output(&json!(4.0)), Some(json!(4)));
        assert_eq!(int.coerce_output(&json!(true)), Some(json!(1)));
        assert_eq!(int.coerce_output(&json!("12")), Some(json!(12)));
        assert_eq!(int.coerce_output(&json!(4.5)), None);
        assert_eq!(int.coerce_output(&json!(3_000_000_000_i64)), None);
        assert_eq!(int.coerce_output(&json!([1])), None);

        assert_eq!(int.coerce_input(&json!(7)), Ok(json!(7)));
        assert!(int.coerce_input(&json!(7.5)).is_err());
        assert!(int.coerce_input(&json!("7")).is_err());
        assert_eq!(
            int.coerce_input(&json!(2_147_483_648_i64))
                .unwrap_err()
                .reason
                .as_deref(),
            Some("Int cannot represent non 32-bit signed integer value: < 2147483648 >.")
        );

        assert_eq!(int.parse_literal(&literal("42")), Some(json!(42)));
        assert_eq!(int.parse_literal(&literal("4.2")), None);
        assert_eq!(int.parse_literal(&literal("\"42\"")), None);
    }

    #[test]
    fn float() {
        let float = builtin("Float");
        assert_eq!(float.coerce_output(&json!(1.5)), Some(json!(1.5)));
        assert_eq!(float.coerce_output(&json!("2.5")), Some(json!(2.5)));
        assert_eq!(float.coerce_output(&json!({})), None);
        assert_eq!(float.coerce_input(&json!(3)), Ok(json!(3.0)));
        assert!(float.coerce_input(&json!("3")).is_err());
        assert_eq!(float.parse_literal(&literal("3")), Some(json!(3.0)));
        assert_eq!(float.parse_literal(&literal("3.25")), Some(json!(3.25)));
        assert_eq!(float.parse_literal(&literal("true")), None);
    }

    #[test]
    fn string_boolean_and_id() {
        let string = builtin("String");
        assert_eq!(string.coerce_output(&json!(12)), Some(json!("12")));
        assert_eq!(string.coerce_output(&json!(false)), Some(json!("false")));
        assert!(string.coerce_input(&json!(12)).is_err());
        assert_eq!(string.parse_literal(&literal("\"a\"")), Some(json!("a")));

        let boolean = builtin("Boolean");
        assert_eq!(boolean.coerce_output(&json!(0)), Some(json!(false)));
        assert_eq!(boolean.coerce_input(&json!(true)), Ok(json!(true)));
        assert!(boolean.coerce_input(&json!(1)).is_err());
        assert_eq!(boolean.parse_literal(&literal("false")), Some(json!(false)));

        let id = builtin("ID");
        assert_eq!(id.coerce_output(&json!(5)), Some(json!("5")));
        assert_eq!(id.coerce_output(&json!(5.5)), None);
        assert_eq!(id.coerce_input(&json!("x")), Ok(json!("x")));
        assert_eq!(id.parse_literal(&literal("17")), Some(json!("17")));
    }

    #[test]
    fn custom_scalar_passes_values_through() {
        let custom = builtin("JSON");
        assert_eq!(
            custom.coerce_output(&json!({"a": [1]})),
            Some(json!({"a": [1]}))
        );
        assert_eq!(
            custom.parse_literal(&literal("{a: [1, \"b\", ENUM, null]}")),
            Some(json!({"a": [1, "b", "ENUM", null]}))
        );
        assert_eq!(custom.parse_literal(&literal("[$var]")), None);
    }

    /// Output coercion of an already coerced input value is the identity
    #[test]
    fn round_trip() {
        for (name, value) in [
            ("Int", json!(-3)),
            ("Float", json!(0.5)),
            ("String", json!("s")),
            ("Boolean", json!(true)),
            ("ID", json!("id")),
        ] {
            let scalar = builtin(name);
            let input = scalar.coerce_input(&value).unwrap();
            assert_eq!(scalar.coerce_output(&input), Some(value), "{name}");
        }
    }
}
