//! Coercion of runtime values, such as the JSON values of variables.
//!
//! Unlike literal coercion this reports every problem found in the value,
//! with its path inside the value.

use super::coercion_error;
use super::index_elements;
use super::literal::coerce_input_field_literal;
use super::render_input_path;
use super::CoercionContext;
use super::LocatedError;
use crate::directive::Next;
use crate::error::FieldError;
use crate::response::LinkedPath;
use crate::response::LinkedPathElement;
use crate::schema::EnumDefinition;
use crate::schema::InputObjectDefinition;
use crate::schema::InputValueDefinition;
use crate::types::TypeDefinition;
use crate::types::TypeRef;
use crate::JsonMap;
use crate::JsonValue;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::response::ResponseDataPathSegment;
use futures::future::join_all;
use futures::future::BoxFuture;
use futures::FutureExt as _;

/// <https://spec.graphql.org/October2021/#sec-Input-Values>
///
/// Every error is located at `location`, the variable definition.
pub(crate) fn coerce_input<'a>(
    cx: CoercionContext<'a>,
    ty: &'a TypeRef,
    value: &'a JsonValue,
    path: LinkedPath<'a>,
    location: Option<SourceSpan>,
) -> BoxFuture<'a, Result<JsonValue, Vec<LocatedError>>> {
    async move {
        match ty {
            TypeRef::NonNull(inner) => {
                if value.is_null() {
                    let message = format!("Expected non-nullable type < {ty} > not to be null");
                    return Err(vec![coercion_error(&message, path, None, location)]);
                }
                coerce_input(cx, inner, value, path, location).await
            }
            TypeRef::List(item_ty) => match value {
                JsonValue::Null => Ok(JsonValue::Null),
                JsonValue::Array(items) => {
                    let elements = index_elements(items.len(), path);
                    let results = join_all(items.iter().zip(&elements).map(|(item, element)| {
                        coerce_input(cx, item_ty, item, Some(element), location)
                    }))
                    .await;
                    let mut values = Vec::with_capacity(items.len());
                    let mut errors = Vec::new();
                    for result in results {
                        match result {
                            Ok(value) => values.push(value),
                            Err(item_errors) => errors.extend(item_errors),
                        }
                    }
                    if errors.is_empty() {
                        Ok(JsonValue::Array(values))
                    } else {
                        Err(errors)
                    }
                }
                // A single item is coerced to a list of one
                _ => coerce_input(cx, item_ty, value, path, location)
                    .await
                    .map(|value| JsonValue::Array(vec![value])),
            },
            TypeRef::Named(name) => {
                let Some(definition) = cx.schema.types.get(name) else {
                    let message = format!("Expected type < {name} >");
                    return Err(vec![coercion_error(&message, path, None, location)]);
                };
                let value = if value.is_null() {
                    JsonValue::Null
                } else {
                    match definition {
                        TypeDefinition::Scalar(def) => {
                            def.implementation.coerce_input(value).map_err(|error| {
                                let message = format!("Expected type < {name} >");
                                let reason = error.reason.as_deref();
                                vec![coercion_error(&message, path, reason, location)]
                            })?
                        }
                        TypeDefinition::Enum(def) => {
                            coerce_enum_input(cx, def, value, path, location).await?
                        }
                        TypeDefinition::InputObject(def) => {
                            coerce_input_object(cx, def, value, path, location).await?
                        }
                        _ => {
                            let message = format!("Expected type < {name} >");
                            return Err(vec![coercion_error(&message, path, None, location)]);
                        }
                    }
                };
                Next::post_input_coercion(definition.directives(), cx.context)
                    .run(value)
                    .await
                    .map_err(|error| hook_errors(error, path, location))
            }
        }
    }
    .boxed()
}

/// Coerces the value of one input object field, falling back to its default value.
///
/// Returns `Ok(None)` for a nullable field that was not provided.
pub(crate) async fn coerce_input_field(
    cx: CoercionContext<'_>,
    definition: &InputValueDefinition,
    value: Option<&JsonValue>,
    path: LinkedPath<'_>,
    location: Option<SourceSpan>,
) -> Result<Option<JsonValue>, Vec<LocatedError>> {
    let Some(value) = value else {
        if let Some(default) = &definition.default_value {
            return match coerce_input_field_literal(cx, definition, default).await {
                Ok(Some(value)) => Ok(Some(value)),
                Ok(None) => {
                    let message = format!("Expected type < {} >", definition.ty);
                    Err(vec![coercion_error(&message, path, None, location)])
                }
                Err(error) => Err(hook_errors(error, path, location)),
            };
        }
        if definition.ty.is_non_null() {
            let message = format!(
                "Field < {} > of required type < {} > was not provided.",
                render_input_path(path),
                definition.ty
            );
            return Err(vec![LocatedError::new(message, location)]);
        }
        return Ok(None);
    };
    let value = coerce_input(cx, &definition.ty, value, path, location).await?;
    Next::post_input_coercion(&definition.directives, cx.context)
        .run(value)
        .await
        .map(Some)
        .map_err(|error| hook_errors(error, path, location))
}

async fn coerce_enum_input(
    cx: CoercionContext<'_>,
    definition: &EnumDefinition,
    value: &JsonValue,
    path: LinkedPath<'_>,
    location: Option<SourceSpan>,
) -> Result<JsonValue, Vec<LocatedError>> {
    let message = format!("Expected type < {} >", definition.name);
    let Some(enum_value) = value
        .as_str()
        .and_then(|name| definition.values.get(name))
    else {
        return Err(vec![coercion_error(&message, path, None, location)]);
    };
    Next::post_input_coercion(&enum_value.directives, cx.context)
        .run(enum_value.name.as_str().into())
        .await
        .map_err(|error| {
            error
                .into_errors()
                .map(|error| coercion_error(&message, path, Some(&error.message), location))
                .collect()
        })
}

async fn coerce_input_object(
    cx: CoercionContext<'_>,
    definition: &InputObjectDefinition,
    value: &JsonValue,
    path: LinkedPath<'_>,
    location: Option<SourceSpan>,
) -> Result<JsonValue, Vec<LocatedError>> {
    let Some(object) = value.as_object() else {
        let message = format!("Expected type < {} > to be an object", definition.name);
        return Err(vec![coercion_error(&message, path, None, location)]);
    };
    let elements: Vec<_> = definition
        .fields
        .keys()
        .map(|name| LinkedPathElement {
            element: ResponseDataPathSegment::Field(name.clone()),
            next: path,
        })
        .collect();
    let results = join_all(definition.fields.values().zip(&elements).map(
        |(field_definition, element)| {
            let field_value = object.get(field_definition.name.as_str());
            coerce_input_field(cx, field_definition, field_value, Some(element), location)
        },
    ))
    .await;

    let mut coerced = JsonMap::new();
    let mut errors = Vec::new();
    for (name, result) in definition.fields.keys().zip(results) {
        match result {
            Ok(Some(value)) => {
                coerced.insert(name.as_str(), value);
            }
            Ok(None) => {}
            Err(field_errors) => errors.extend(field_errors),
        }
    }
    for key in object.keys() {
        if !definition.fields.contains_key(key.as_str()) {
            let message = format!(
                "Field < {} > is not defined by type < {} >",
                key.as_str(),
                definition.name
            );
            errors.push(coercion_error(&message, path, None, location))
        }
    }
    if errors.is_empty() {
        Ok(JsonValue::Object(coerced))
    } else {
        Err(errors)
    }
}

/// Errors of a directive hook, located at the coerced value
fn hook_errors(
    error: FieldError,
    path: LinkedPath<'_>,
    location: Option<SourceSpan>,
) -> Vec<LocatedError> {
    error
        .into_errors()
        .map(|error| {
            let mut located = coercion_error(&error.message, path, None, location);
            located.extensions = error.extensions;
            located
        })
        .collect()
}
