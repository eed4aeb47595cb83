use super::input::coerce_input;
use super::literal::coerce_literal;
use super::CoercionContext;
use super::LocatedError;
use crate::resolver::UserContext;
use crate::scalar::display_json;
use crate::schema::ExecutableSchema;
use crate::types::TypeRef;
use crate::JsonMap;
use crate::JsonValue;
use apollo_compiler::ast;
use apollo_compiler::executable::Operation;
use apollo_compiler::Node;
use futures::future::join_all;

/// <https://spec.graphql.org/October2021/#CoerceVariableValues()>
///
/// Variables are coerced independently and every error is reported.
/// Nullable variables that were not provided and have no default value
/// are left out of the returned map.
pub(crate) async fn coerce_variable_values(
    schema: &ExecutableSchema,
    context: &UserContext,
    operation: &Operation,
    values: &JsonMap,
) -> Result<JsonMap, Vec<LocatedError>> {
    let cx = CoercionContext {
        schema,
        variables: None,
        context,
    };
    let results = join_all(
        operation
            .variables
            .iter()
            .map(|definition| coerce_variable(cx, definition, values)),
    )
    .await;

    let mut coerced = JsonMap::new();
    let mut errors = Vec::new();
    for (definition, result) in operation.variables.iter().zip(results) {
        match result {
            Ok(Some(value)) => {
                coerced.insert(definition.name.as_str(), value);
            }
            Ok(None) => {}
            Err(variable_errors) => errors.extend(variable_errors),
        }
    }
    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

async fn coerce_variable(
    cx: CoercionContext<'_>,
    definition: &Node<ast::VariableDefinition>,
    values: &JsonMap,
) -> Result<Option<JsonValue>, Vec<LocatedError>> {
    let name = &definition.name;
    let ty = TypeRef::from(&*definition.ty);
    if !cx.schema.is_input_type(&ty) {
        let message = format!(
            "Variable < ${name} > expected value of type < {ty} > \
             which cannot be used as an input type."
        );
        return Err(vec![LocatedError::new(message, definition.ty.location())]);
    }

    let value = values.get(name.as_str());
    if value.is_none() {
        if let Some(default) = &definition.default_value {
            return match coerce_literal(cx, &ty, default).await {
                Ok(Some(value)) => Ok(Some(value)),
                Ok(None) => {
                    let message = format!(
                        "Variable < ${name} > has invalid default value < {} >.",
                        default.as_ref()
                    );
                    Err(vec![LocatedError::new(message, default.location())])
                }
                Err(error) => {
                    Err(LocatedError::from_field_error(error, definition.location()).collect())
                }
            };
        }
    }
    if ty.is_non_null() && value.map_or(true, JsonValue::is_null) {
        let message = if value.is_some() {
            format!("Variable < ${name} > of non-null type < {ty} > must not be null.")
        } else {
            format!("Variable < ${name} > of required type < {ty} > was not provided.")
        };
        return Err(vec![LocatedError::new(message, definition.location())]);
    }
    let Some(value) = value else {
        return Ok(None);
    };
    coerce_input(cx, &ty, value, None, definition.location())
        .await
        .map(Some)
        .map_err(|errors| {
            let prefix = format!(
                "Variable < ${name} > got invalid value < {} >; ",
                display_json(value)
            );
            errors
                .into_iter()
                .map(|mut error| {
                    error.message.insert_str(0, &prefix);
                    error
                })
                .collect()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use apollo_compiler::ExecutableDocument;
    use apollo_compiler::Schema;
    use futures::executor::block_on;
    use serde_json_bytes::json;

    const SDL: &str = r#"
        input Point { x: Int! y: Int }
        type Query {
          f(a: Int, b: [Int!], c: Point, d: String): Int
        }
    "#;

    fn coerce(query: &str, values: JsonValue) -> Result<JsonValue, Vec<String>> {
        let schema = Schema::parse_and_validate(SDL, "schema.graphql").unwrap();
        let schema = ExecutableSchema::builder(schema).build().unwrap();
        let document =
            ExecutableDocument::parse_and_validate(schema.schema(), query, "query.graphql")
                .unwrap();
        let operation = document.operations.get(None).unwrap();
        let JsonValue::Object(values) = values else {
            panic!("expected an object")
        };
        block_on(coerce_variable_values(&schema, &(), operation, &values))
            .map(JsonValue::Object)
            .map_err(|errors| errors.into_iter().map(|error| error.message).collect())
    }

    #[test]
    fn provided_default_and_missing() {
        let query = "query($a: Int = 1, $b: [Int!] = [2], $d: String) { f(a: $a, b: $b, d: $d) }";
        assert_eq!(coerce(query, json!({})), Ok(json!({"a": 1, "b": [2]})));
        assert_eq!(
            coerce(query, json!({"a": null, "b": 3, "d": "x"})),
            Ok(json!({"a": null, "b": [3], "d": "x"}))
        );
    }

    #[test]
    fn non_null_variables() {
        let query = "query($a: Int!, $c: Point!) { f(a: $a, c: $c) }";
        assert_eq!(
            coerce(query, json!({"c": null})),
            Err(vec![
                "Variable < $a > of required type < Int! > was not provided.".to_owned(),
                "Variable < $c > of non-null type < Point! > must not be null.".to_owned(),
            ])
        );
    }

    #[test]
    fn invalid_values_are_prefixed() {
        let query = "query($b: [Int!], $c: Point) { f(b: $b, c: $c) }";
        assert_eq!(
            coerce(query, json!({"b": [1, "2"], "c": {"y": 1, "z": 0}})),
            Err(vec![
                "Variable < $b > got invalid value < [1,\"2\"] >; \
                 Expected type < Int > at value[1]; \
                 Int cannot represent non-integer value: < \"2\" >."
                    .to_owned(),
                "Variable < $c > got invalid value < {\"y\":1,\"z\":0} >; \
                 Field < value.x > of required type < Int! > was not provided."
                    .to_owned(),
                "Variable < $c > got invalid value < {\"y\":1,\"z\":0} >; \
                 Field < z > is not defined by type < Point >."
                    .to_owned(),
            ])
        );
    }
}
