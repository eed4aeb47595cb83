//! Coercion of values written in a document: argument values and default values.
//!
//! Variable references are replaced with their (already coerced) runtime value.
//! Invalid literals are reported as `Ok(None)`, letting the caller pick the error message.
//! `Err` only comes from directive hooks.

use super::CoercionContext;
use crate::directive::Next;
use crate::error::FieldError;
use crate::schema::InputObjectDefinition;
use crate::schema::InputValueDefinition;
use crate::types::TypeDefinition;
use crate::types::TypeRef;
use crate::JsonMap;
use crate::JsonValue;
use apollo_compiler::ast;
use apollo_compiler::Name;
use apollo_compiler::Node;
use futures::future::BoxFuture;
use futures::FutureExt as _;

/// <https://spec.graphql.org/October2021/#sec-Input-Values>
pub(crate) fn coerce_literal<'a>(
    cx: CoercionContext<'a>,
    ty: &'a TypeRef,
    node: &'a Node<ast::Value>,
) -> BoxFuture<'a, Result<Option<JsonValue>, FieldError>> {
    async move {
        match ty {
            TypeRef::NonNull(inner) => {
                if node.is_null() {
                    return Ok(None);
                }
                coerce_literal(cx, inner, node).await
            }
            TypeRef::List(item_ty) => match node.as_ref() {
                ast::Value::Variable(name) => Ok(cx.variable(name).cloned()),
                ast::Value::Null => Ok(Some(JsonValue::Null)),
                ast::Value::List(items) => {
                    // Items in order: a missing variable may decide for the whole list
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        if is_missing_variable(cx, item) {
                            if item_ty.is_non_null() {
                                return Ok(None);
                            }
                            values.push(JsonValue::Null);
                            continue;
                        }
                        let Some(value) = coerce_literal(cx, item_ty, item).await? else {
                            return Ok(None);
                        };
                        values.push(value)
                    }
                    Ok(Some(JsonValue::Array(values)))
                }
                // A single item is coerced to a list of one
                _ => Ok(coerce_literal(cx, item_ty, node)
                    .await?
                    .map(|value| JsonValue::Array(vec![value]))),
            },
            TypeRef::Named(name) => coerce_named_literal(cx, name, node).await,
        }
    }
    .boxed()
}

/// Coerces the value or default value of an input object field,
/// then runs the field's own directives.
///
/// Unlike directives on input types, those run for variable references too.
pub(crate) async fn coerce_input_field_literal(
    cx: CoercionContext<'_>,
    definition: &InputValueDefinition,
    node: &Node<ast::Value>,
) -> Result<Option<JsonValue>, FieldError> {
    let Some(value) = coerce_literal(cx, &definition.ty, node).await? else {
        return Ok(None);
    };
    Next::post_input_coercion(&definition.directives, cx.context)
        .run(value)
        .await
        .map(Some)
}

pub(crate) fn is_missing_variable(cx: CoercionContext<'_>, node: &ast::Value) -> bool {
    matches!(node, ast::Value::Variable(name) if cx.variable(name).is_none())
}

async fn coerce_named_literal(
    cx: CoercionContext<'_>,
    name: &Name,
    node: &Node<ast::Value>,
) -> Result<Option<JsonValue>, FieldError> {
    let Some(definition) = cx.schema.types.get(name) else {
        return Ok(None);
    };
    let value = match (node.as_ref(), definition) {
        // Variables were coerced already, type directives do not run again
        (ast::Value::Variable(name), _) => return Ok(cx.variable(name).cloned()),
        (ast::Value::Null, _) => JsonValue::Null,
        (_, TypeDefinition::Scalar(def)) => match def.implementation.parse_literal(node) {
            Some(value) => value,
            None => return Ok(None),
        },
        (ast::Value::Enum(value), TypeDefinition::Enum(def)) => {
            let Some(enum_value) = def.values.get(value) else {
                return Ok(None);
            };
            Next::post_input_coercion(&enum_value.directives, cx.context)
                .run(value.as_str().into())
                .await?
        }
        (ast::Value::Object(fields), TypeDefinition::InputObject(def)) => {
            match coerce_input_object_literal(cx, def, fields).await? {
                Some(value) => value,
                None => return Ok(None),
            }
        }
        _ => return Ok(None),
    };
    Next::post_input_coercion(definition.directives(), cx.context)
        .run(value)
        .await
        .map(Some)
}

/// Any invalid field makes the whole object invalid
async fn coerce_input_object_literal(
    cx: CoercionContext<'_>,
    definition: &InputObjectDefinition,
    fields: &[(Name, Node<ast::Value>)],
) -> Result<Option<JsonValue>, FieldError> {
    let mut object = JsonMap::new();
    for (field_name, field_def) in &definition.fields {
        let provided = fields
            .iter()
            .find(|(name, _)| name == field_name)
            .map(|(_, value)| value)
            .filter(|value| !is_missing_variable(cx, value));
        let field_node = match (provided, &field_def.default_value) {
            (Some(value), _) => value,
            (None, Some(default)) => default,
            (None, None) if field_def.ty.is_non_null() => return Ok(None),
            (None, None) => continue,
        };
        let Some(value) = coerce_input_field_literal(cx, field_def, field_node).await? else {
            return Ok(None);
        };
        object.insert(field_name.as_str(), value);
    }
    Ok(Some(JsonValue::Object(object)))
}
