use super::literal::coerce_literal;
use super::CoercionContext;
use super::LocatedError;
use crate::directive::ArgumentParent;
use crate::directive::Next;
use crate::schema::InputValueDefinition;
use crate::JsonMap;
use crate::JsonValue;
use apollo_compiler::ast;
use apollo_compiler::Name;
use apollo_compiler::Node;
use futures::future::join_all;
use indexmap::IndexMap;

/// <https://spec.graphql.org/October2021/#CoerceArgumentValues()>
///
/// Arguments of one field selection or directive application are coerced concurrently.
/// If any of them fails, every error is returned.
pub(crate) async fn coerce_arguments(
    cx: CoercionContext<'_>,
    definitions: &IndexMap<Name, InputValueDefinition>,
    parent: ArgumentParent<'_>,
    arguments: &[Node<ast::Argument>],
) -> Result<JsonMap, Vec<LocatedError>> {
    let results = join_all(definitions.values().map(|definition| {
        let argument = arguments
            .iter()
            .find(|argument| argument.name == definition.name);
        coerce_argument(cx, definition, parent, argument)
    }))
    .await;

    let mut coerced = JsonMap::new();
    let mut errors = Vec::new();
    for (name, result) in definitions.keys().zip(results) {
        match result {
            Ok(Some(value)) => {
                coerced.insert(name.as_str(), value);
            }
            Ok(None) => {}
            Err(argument_errors) => errors.extend(argument_errors),
        }
    }
    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Returns `Ok(None)` for a nullable argument without a value nor a default value
async fn coerce_argument(
    cx: CoercionContext<'_>,
    definition: &InputValueDefinition,
    parent: ArgumentParent<'_>,
    argument: Option<&Node<ast::Argument>>,
) -> Result<Option<JsonValue>, Vec<LocatedError>> {
    let name = &definition.name;
    let ty = &definition.ty;
    let node = argument.map(|argument| &argument.value);
    let (has_value, is_null) = match node.map(|node| node.as_ref()) {
        Some(ast::Value::Variable(variable)) => match cx.variable(variable) {
            Some(value) => (true, value.is_null()),
            None => (false, false),
        },
        Some(ast::Value::Null) => (true, true),
        Some(_) => (true, false),
        None => (false, false),
    };

    let value = match (node, &definition.default_value) {
        (_, Some(default)) if !has_value => {
            match coerce_literal(cx, ty, default).await {
                Ok(Some(value)) => value,
                Ok(None) => {
                    let message = format!(
                        "Argument < {name} > has invalid default value < {} >.",
                        default.as_ref()
                    );
                    return Err(vec![LocatedError::new(message, default.location())]);
                }
                Err(error) => {
                    return Err(LocatedError::from_field_error(error, parent.location()).collect())
                }
            }
        }
        (node, _) if !has_value || is_null => {
            if !ty.is_non_null() {
                return Ok(is_null.then_some(JsonValue::Null));
            }
            let error = match node {
                Some(node) if is_null => LocatedError::new(
                    format!("Argument < {name} > of non-null type < {ty} > must not be null."),
                    node.location(),
                ),
                Some(node) => {
                    let variable = match node.as_ref() {
                        ast::Value::Variable(variable) => variable.as_str(),
                        _ => "",
                    };
                    LocatedError::new(
                        format!(
                            "Argument < {name} > of required type < {ty} > was provided \
                             the variable < ${variable} > which was not provided a runtime value."
                        ),
                        node.location(),
                    )
                }
                None => LocatedError::new(
                    format!("Argument < {name} > of required type < {ty} > was not provided."),
                    parent.location(),
                ),
            };
            return Err(vec![error]);
        }
        (None, _) => return Ok(None),
        (Some(node), _) => match node.as_ref() {
            // Variables were coerced already
            ast::Value::Variable(variable) => cx
                .variable(variable)
                .cloned()
                .unwrap_or(JsonValue::Null),
            _ => match coerce_literal(cx, ty, node).await {
                Ok(Some(value)) => value,
                Ok(None) => {
                    let message = format!(
                        "Argument < {name} > has invalid value < {} >.",
                        node.as_ref()
                    );
                    return Err(vec![LocatedError::new(message, node.location())]);
                }
                Err(error) => {
                    return Err(LocatedError::from_field_error(error, node.location()).collect())
                }
            },
        },
    };

    if definition.directives.is_empty() {
        return Ok(Some(value));
    }
    let location = argument.and_then(|argument| argument.location());
    Next::argument_execution(&definition.directives, parent, argument, cx.context)
        .run(value)
        .await
        .map(Some)
        .map_err(|error| {
            LocatedError::from_field_error(error, location.or(parent.location())).collect()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::Directive;
    use crate::error::FieldError;
    use crate::resolver::UserContext;
    use crate::schema::ExecutableSchema;
    use apollo_compiler::executable;
    use apollo_compiler::ExecutableDocument;
    use apollo_compiler::Schema;
    use futures::executor::block_on;
    use futures::future::BoxFuture;
    use serde_json_bytes::json;

    /// Doubles integer arguments
    struct Double;

    impl Directive for Double {
        fn on_argument_execution<'a>(
            &'a self,
            _directive_arguments: &'a JsonMap,
            next: Next<'a>,
            _parent: ArgumentParent<'a>,
            _argument: Option<&'a Node<ast::Argument>>,
            value: JsonValue,
            _context: &'a UserContext,
        ) -> BoxFuture<'a, Result<JsonValue, FieldError>> {
            let value = match value.as_i64() {
                Some(int) => JsonValue::from(int * 2),
                None => value,
            };
            next.run(value)
        }
    }

    const SDL: &str = r#"
        directive @double on ARGUMENT_DEFINITION
        type Query {
          f(
            a: Int
            b: Int! = 1
            c: Int!
            d: [String] = ["x"]
            e: Int @double
          ): Int
        }
    "#;

    fn coerce(query: &str, variables: JsonValue) -> Result<JsonValue, Vec<String>> {
        let schema = Schema::parse_and_validate(SDL, "schema.graphql").unwrap();
        let schema = ExecutableSchema::builder(schema)
            .directive("double", Double)
            .build()
            .unwrap();
        // Not validated: some of these arguments are invalid on purpose
        let document = ExecutableDocument::parse(schema.schema(), query, "query.graphql").unwrap();
        let operation = document.operations.get(None).unwrap();
        let executable::Selection::Field(field) = &operation.selection_set.selections[0] else {
            panic!("expected a field")
        };
        let JsonValue::Object(variables) = variables else {
            panic!("expected an object")
        };
        let cx = CoercionContext {
            schema: &schema,
            variables: Some(&variables),
            context: &(),
        };
        let definitions = &schema.get_field_by_name("Query.f").unwrap().arguments;
        let parent = ArgumentParent::Field(field);
        block_on(coerce_arguments(cx, definitions, parent, &field.arguments))
            .map(JsonValue::Object)
            .map_err(|errors| errors.into_iter().map(|error| error.message).collect())
    }

    #[test]
    fn literals_and_defaults() {
        assert_eq!(
            coerce("{ f(c: 3, d: \"y\") }", json!({})),
            Ok(json!({"b": 1, "c": 3, "d": ["y"]}))
        );
        assert_eq!(
            coerce("{ f(a: null, c: 3, e: 5) }", json!({})),
            Ok(json!({"a": null, "b": 1, "c": 3, "d": ["x"], "e": 10}))
        );
    }

    #[test]
    fn variables_and_defaults() {
        let query = "query($a: Int, $c: Int) { f(a: $a, b: $a, c: $c, e: $c) }";
        // A variable without a runtime value is like a missing argument
        assert_eq!(
            coerce(query, json!({"a": 2, "c": 4})),
            Ok(json!({"a": 2, "b": 2, "c": 4, "d": ["x"], "e": 8}))
        );
        assert_eq!(
            coerce(query, json!({"c": 4})),
            Ok(json!({"b": 1, "c": 4, "d": ["x"], "e": 8}))
        );
        assert_eq!(
            coerce(query, json!({"a": null, "c": 4})),
            Err(vec!["Argument < b > of non-null type < Int! > must not be null.".to_owned()])
        );
    }

    #[test]
    fn errors_are_aggregated() {
        assert_eq!(
            coerce("query($v: Int) { f(b: null, c: $v) }", json!({})),
            Err(vec![
                "Argument < b > of non-null type < Int! > must not be null.".to_owned(),
                "Argument < c > of required type < Int! > was provided the variable < $v > \
                 which was not provided a runtime value."
                    .to_owned(),
            ])
        );
        assert_eq!(
            coerce("{ f(a: 1) }", json!({})),
            Err(vec!["Argument < c > of required type < Int! > was not provided.".to_owned()])
        );
    }
}
