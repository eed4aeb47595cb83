use super::index_elements;
use crate::directive::Next;
use crate::error::FieldError;
use crate::execution::engine::execute_selection_set;
use crate::execution::engine::try_nullify;
use crate::execution::engine::ExecutionContext;
use crate::execution::engine::ExecutionMode;
use crate::execution::engine::PropagateNull;
use crate::resolver::default_resolve_type;
use crate::resolver::ResolveInfo;
use crate::response::LinkedPath;
use crate::schema::EnumDefinition;
use crate::types::TypeDefinition;
use crate::types::TypeRef;
use crate::JsonValue;
use apollo_compiler::response::GraphQLError;
use futures::future::join_all;
use futures::future::BoxFuture;
use futures::FutureExt as _;

/// <https://spec.graphql.org/October2021/#CompleteValue()>
///
/// Returns `Err` for a field error being propagated upwards to find a nullable place
pub(crate) fn complete_value<'a>(
    ctx: &'a ExecutionContext<'a>,
    errors: &'a mut Vec<GraphQLError>,
    path: LinkedPath<'a>,
    ty: &'a TypeRef,
    info: &'a ResolveInfo<'a>,
    value: JsonValue,
) -> BoxFuture<'a, Result<JsonValue, PropagateNull>> {
    async move {
        let parent_type = &info.parent_type.name;
        let field_name = info.field_name();
        macro_rules! field_error {
            ($($arg: tt)+) => {
                {
                    let error = FieldError::new(format!($($arg)+));
                    ctx.push_field_error(errors, error, path, info.fields);
                    return Err(PropagateNull);
                }
            };
        }
        let name = match ty {
            TypeRef::NonNull(inner) => {
                if value.is_null() {
                    field_error!(
                        "Cannot return null for non-nullable field {parent_type}.{field_name}."
                    )
                }
                let completed = complete_value(ctx, errors, path, inner, info, value).await?;
                // Custom scalars may still coerce to null
                if completed.is_null() {
                    field_error!(
                        "Cannot return null for non-nullable field {parent_type}.{field_name}."
                    )
                }
                return Ok(completed);
            }
            _ if value.is_null() => return Ok(JsonValue::Null),
            TypeRef::List(item_ty) => {
                let JsonValue::Array(items) = value else {
                    field_error!(
                        "Expected Iterable, but did not find one for field \
                         {parent_type}.{field_name}."
                    )
                };
                let elements = index_elements(items.len(), path);
                let futures = items.into_iter().zip(&elements).map(|(item, element)| async move {
                    let mut item_errors = Vec::new();
                    let result =
                        complete_value(ctx, &mut item_errors, Some(element), item_ty, info, item)
                            .await;
                    // On field error, try to nullify that item
                    (try_nullify(item_ty, result), item_errors)
                });
                let mut completed_list = Vec::with_capacity(elements.len());
                let mut propagate = false;
                for (result, mut item_errors) in join_all(futures).await {
                    errors.append(&mut item_errors);
                    match result {
                        Ok(item) => completed_list.push(item),
                        Err(PropagateNull) => propagate = true,
                    }
                }
                // A non-null item could not be nullified, try to nullify the list
                if propagate {
                    return Err(PropagateNull);
                }
                return Ok(JsonValue::Array(completed_list));
            }
            TypeRef::Named(name) => name,
        };

        let Some(definition) = ctx.schema.types.get(name) else {
            field_error!("Undefined type {name}")
        };
        let object_type = match definition {
            TypeDefinition::Scalar(def) => match def.implementation.coerce_output(&value) {
                Some(value) => return Ok(value),
                None => field_error!(
                    "Expected value of type {name} but received {}.",
                    json_kind(&value)
                ),
            },
            TypeDefinition::Enum(def) => {
                // https://spec.graphql.org/October2021/#sec-Enums.Result-Coercion
                if value
                    .as_str()
                    .is_some_and(|value| def.values.contains_key(value))
                {
                    return Ok(value);
                }
                field_error!(
                    "Expected value of type {name} but received {}.",
                    json_kind(&value)
                )
            }
            TypeDefinition::InputObject(_) => {
                field_error!("Field with input object type {name}")
            }
            TypeDefinition::Object(def) => def,
            TypeDefinition::Interface(_) | TypeDefinition::Union(_) => {
                let runtime_type = match &info.field_definition.type_resolver {
                    Some(type_resolver) => {
                        type_resolver.resolve_type(&value, ctx.context, info, name)
                    }
                    None => default_resolve_type(&value),
                };
                let Some(object_type) = runtime_type
                    .as_deref()
                    .and_then(|runtime_type| ctx.schema.get_object(runtime_type))
                else {
                    field_error!(
                        "Abstract type {name} must resolve to an Object type at runtime \
                         for field {parent_type}.{field_name} with value {}, received \"{}\". \
                         Either the {name} type should provide a \"resolveType\" function \
                         or each possible type should provide an \"isTypeOf\" function.",
                        json_kind(&value),
                        runtime_type.as_deref().unwrap_or("null"),
                    )
                };
                if !ctx.schema.is_possible_type(name, &object_type.name) {
                    field_error!(
                        "Runtime Object type < {} > is not a possible type for < {name} >.",
                        object_type.name
                    )
                }
                object_type
            }
        };
        let selection_sets = info
            .fields
            .iter()
            .map(|field| &field.selection_set)
            .collect();
        // Only top-level fields of a mutation are executed sequentially
        execute_selection_set(
            ctx,
            errors,
            path,
            ExecutionMode::Normal,
            object_type,
            &value,
            selection_sets,
        )
        .await
        .map(JsonValue::Object)
    }
    .boxed()
}

/// Runs `on_pre_output_coercion` hooks of the named type of the field on a resolved value.
///
/// For enum types, hooks of the matching enum value run first, then those of the type,
/// on every item of a list.
pub(crate) async fn apply_pre_output_coercion(
    ctx: &ExecutionContext<'_>,
    info: &ResolveInfo<'_>,
    ty: &TypeRef,
    value: JsonValue,
) -> Result<JsonValue, FieldError> {
    match ctx.schema.types.get(ty.named_type()) {
        Some(TypeDefinition::Enum(def)) => enum_pre_output_coercion(ctx, info, def, ty, value).await,
        Some(definition) => {
            Next::pre_output_coercion(definition.directives(), ctx.context, info)
                .run(value)
                .await
        }
        None => Ok(value),
    }
}

fn enum_pre_output_coercion<'a>(
    ctx: &'a ExecutionContext<'a>,
    info: &'a ResolveInfo<'a>,
    definition: &'a EnumDefinition,
    ty: &'a TypeRef,
    value: JsonValue,
) -> BoxFuture<'a, Result<JsonValue, FieldError>> {
    async move {
        match (ty.nullable(), value) {
            (TypeRef::List(item_ty), JsonValue::Array(items)) => {
                let results = join_all(
                    items
                        .into_iter()
                        .map(|item| enum_pre_output_coercion(ctx, info, definition, item_ty, item)),
                )
                .await;
                let mut values = Vec::with_capacity(results.len());
                let mut errors = Vec::new();
                for result in results {
                    match result {
                        Ok(value) => values.push(value),
                        Err(error) => errors.push(error),
                    }
                }
                match FieldError::aggregate(errors) {
                    Some(error) => Err(error),
                    None => Ok(JsonValue::Array(values)),
                }
            }
            (_, value) => {
                let enum_value = value.as_str().and_then(|name| definition.values.get(name));
                let value = match enum_value {
                    Some(enum_value) => {
                        Next::pre_output_coercion(&enum_value.directives, ctx.context, info)
                            .run(value)
                            .await?
                    }
                    None => value,
                };
                Next::pre_output_coercion(&definition.directives, ctx.context, info)
                    .run(value)
                    .await
            }
        }
    }
    .boxed()
}

/// How a value is described in error messages
fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}
