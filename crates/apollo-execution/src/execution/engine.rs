use crate::coercion::arguments::coerce_arguments;
use crate::coercion::output::apply_pre_output_coercion;
use crate::coercion::output::complete_value;
use crate::coercion::CoercionContext;
use crate::coercion::LocatedError;
use crate::directive::ArgumentParent;
use crate::directive::DirectiveInstance;
use crate::directive::NextResolver;
use crate::error::FieldError;
use crate::resolver::ResolveInfo;
use crate::resolver::UserContext;
use crate::response::field_error;
use crate::response::LinkedPath;
use crate::response::LinkedPathElement;
use crate::schema::ExecutableSchema;
use crate::schema::FieldDefinition;
use crate::schema::ObjectDefinition;
use crate::types::TypeDefinition;
use crate::types::TypeRef;
use crate::JsonMap;
use crate::JsonValue;
use apollo_compiler::ast;
use apollo_compiler::executable;
use apollo_compiler::executable::Operation;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;
use apollo_compiler::response::GraphQLError;
use apollo_compiler::response::ResponseDataPathSegment;
use apollo_compiler::validation::Valid;
use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::Node;
use futures::future::join_all;
use futures::future::BoxFuture;
use futures::FutureExt as _;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::collections::HashSet;

/// <https://spec.graphql.org/October2021/#sec-Normal-and-Serial-Execution>
#[derive(Debug, Copy, Clone)]
pub(crate) enum ExecutionMode {
    /// Allowed to resolve fields in any order, including concurrently
    Normal,
    /// Top-level fields of a mutation operation must be executed in order
    Sequential,
}

/// Return in `Err` when a field error occurred at some non-nullable place
///
/// <https://spec.graphql.org/October2021/#sec-Handling-Field-Errors>
#[derive(Debug)]
pub(crate) struct PropagateNull;

/// Everything about the current request that stays the same for every field
pub(crate) struct ExecutionContext<'a> {
    pub(crate) schema: &'a ExecutableSchema,
    pub(crate) document: &'a Valid<ExecutableDocument>,
    pub(crate) operation: &'a Operation,
    pub(crate) variable_values: &'a JsonMap,
    pub(crate) root_value: &'a JsonValue,
    pub(crate) context: &'a UserContext,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn coercion_context(&self) -> CoercionContext<'a> {
        CoercionContext {
            schema: self.schema,
            variables: Some(self.variable_values),
            context: self.context,
        }
    }

    /// Converts an error returned by a resolver or directive hook,
    /// located at every field selection of a response key.
    pub(crate) fn push_field_error(
        &self,
        errors: &mut Vec<GraphQLError>,
        error: FieldError,
        path: LinkedPath<'_>,
        fields: &[&Node<executable::Field>],
    ) {
        for error in error.into_errors() {
            let locations = fields.iter().map(|field| field.location());
            let mut graphql_error =
                field_error(error.message, path, locations, &self.document.sources);
            graphql_error.extensions = error.extensions;
            tracing::trace!(
                error = %graphql_error.message,
                path = ?graphql_error.path,
                "field error"
            );
            errors.push(graphql_error)
        }
    }

    fn push_located_errors(
        &self,
        errors: &mut Vec<GraphQLError>,
        located: Vec<LocatedError>,
        path: LinkedPath<'_>,
    ) {
        for error in located {
            let error = error.into_graphql_error(path, &self.document.sources);
            tracing::trace!(
                error = %error.message,
                path = ?error.path,
                "argument coercion error"
            );
            errors.push(error)
        }
    }
}

/// <https://spec.graphql.org/October2021/#ExecuteSelectionSet()>
///
/// `selection_sets` has more than one item when fields with the same response key are merged.
/// Errors of each field are appended in the order fields are selected,
/// not in the order they complete.
pub(crate) fn execute_selection_set<'a>(
    ctx: &'a ExecutionContext<'a>,
    errors: &'a mut Vec<GraphQLError>,
    path: LinkedPath<'a>,
    mode: ExecutionMode,
    object_type: &'a ObjectDefinition,
    object_value: &'a JsonValue,
    selection_sets: Vec<&'a SelectionSet>,
) -> BoxFuture<'a, Result<JsonMap, PropagateNull>> {
    async move {
        let mut grouped_field_set = IndexMap::new();
        collect_fields(
            ctx,
            object_type,
            selection_sets
                .iter()
                .copied()
                .flat_map(|selection_set: &'a SelectionSet| &selection_set.selections),
            &mut HashSet::new(),
            &mut grouped_field_set,
        );

        let futures = grouped_field_set
            .iter()
            .filter_map(|(&response_key, fields)| {
                // Indexing should not panic: `collect_fields` only creates a `Vec` to push to it
                let field_name = &fields[0].name;
                let field_def = object_type.fields.get(field_name);
                if field_def.is_none() && !field_name.starts_with("__") {
                    // Undefined field: validation should have caught this
                    return None;
                }
                Some(async move {
                    let mut errors = Vec::new();
                    let field_path = LinkedPathElement {
                        element: ResponseDataPathSegment::Field(response_key.clone()),
                        next: path,
                    };
                    let result = match field_def {
                        Some(field_def) => {
                            execute_field(
                                ctx,
                                &mut errors,
                                Some(&field_path),
                                object_type,
                                object_value,
                                field_def,
                                fields,
                            )
                            .await
                        }
                        None => execute_meta_field(
                            ctx,
                            &mut errors,
                            Some(&field_path),
                            object_type,
                            fields,
                        ),
                    };
                    (response_key, result, errors)
                })
            });

        let mut response_map = JsonMap::with_capacity(grouped_field_set.len());
        match mode {
            ExecutionMode::Normal => {
                // `join_all` executes fields concurrently but preserves their ordering
                let mut propagate = false;
                for (response_key, result, mut field_errors) in join_all(futures).await {
                    errors.append(&mut field_errors);
                    match result {
                        Ok(value) => {
                            response_map.insert(response_key.as_str(), value);
                        }
                        Err(PropagateNull) => propagate = true,
                    }
                }
                if propagate {
                    return Err(PropagateNull);
                }
            }
            ExecutionMode::Sequential => {
                // Only start executing one field after the previous one is finished
                for future in futures {
                    let (response_key, result, mut field_errors) = future.await;
                    errors.append(&mut field_errors);
                    response_map.insert(response_key.as_str(), result?);
                }
            }
        }
        Ok(response_map)
    }
    .boxed()
}

/// <https://spec.graphql.org/October2021/#CollectFields()>
fn collect_fields<'a>(
    ctx: &ExecutionContext<'a>,
    object_type: &ObjectDefinition,
    selections: impl IntoIterator<Item = &'a Selection>,
    visited_fragments: &mut HashSet<&'a Name>,
    grouped_fields: &mut IndexMap<&'a Name, Vec<&'a Node<executable::Field>>>,
) {
    for selection in selections {
        if eval_if_arg(selection, "skip", ctx.variable_values).unwrap_or(false)
            || !eval_if_arg(selection, "include", ctx.variable_values).unwrap_or(true)
        {
            continue;
        }
        match selection {
            Selection::Field(field) => grouped_fields
                .entry(field.response_key())
                .or_default()
                .push(field),
            Selection::FragmentSpread(spread) => {
                let new = visited_fragments.insert(&spread.fragment_name);
                if !new {
                    continue;
                }
                let Some(fragment) = ctx.document.fragments.get(&spread.fragment_name) else {
                    continue;
                };
                if !does_fragment_type_apply(ctx.schema, object_type, fragment.type_condition()) {
                    continue;
                }
                collect_fields(
                    ctx,
                    object_type,
                    &fragment.selection_set.selections,
                    visited_fragments,
                    grouped_fields,
                )
            }
            Selection::InlineFragment(inline) => {
                if let Some(condition) = &inline.type_condition {
                    if !does_fragment_type_apply(ctx.schema, object_type, condition) {
                        continue;
                    }
                }
                collect_fields(
                    ctx,
                    object_type,
                    &inline.selection_set.selections,
                    visited_fragments,
                    grouped_fields,
                )
            }
        }
    }
}

/// <https://spec.graphql.org/October2021/#DoesFragmentTypeApply()>
fn does_fragment_type_apply(
    schema: &ExecutableSchema,
    object_type: &ObjectDefinition,
    fragment_type: &Name,
) -> bool {
    match schema.types.get(fragment_type) {
        Some(TypeDefinition::Object(_)) => *fragment_type == object_type.name,
        Some(TypeDefinition::Interface(_)) => object_type.interfaces.contains(fragment_type),
        Some(TypeDefinition::Union(def)) => def.members.contains(&object_type.name),
        // Undefined or not an output type: validation should have caught this
        _ => false,
    }
}

fn eval_if_arg(
    selection: &Selection,
    directive_name: &str,
    variable_values: &JsonMap,
) -> Option<bool> {
    match selection
        .directives()
        .get(directive_name)?
        .specified_argument_by_name("if")?
        .as_ref()
    {
        ast::Value::Boolean(value) => Some(*value),
        ast::Value::Variable(var) => variable_values.get(var.as_str())?.as_bool(),
        _ => None,
    }
}

/// <https://spec.graphql.org/October2021/#ExecuteField()>
async fn execute_field(
    ctx: &ExecutionContext<'_>,
    errors: &mut Vec<GraphQLError>,
    path: LinkedPath<'_>,
    object_type: &ObjectDefinition,
    object_value: &JsonValue,
    field_def: &FieldDefinition,
    fields: &[&Node<executable::Field>],
) -> Result<JsonValue, PropagateNull> {
    let info = ResolveInfo {
        ctx,
        field_definition: field_def,
        fields,
        parent_type: object_type,
        path,
    };
    let cx = ctx.coercion_context();
    let field = fields[0];
    let arguments = coerce_arguments(
        cx,
        &field_def.arguments,
        ArgumentParent::Field(field),
        &field.arguments,
    )
    .await;
    let query_directives = query_directive_instances(cx, fields).await;
    let (arguments, query_directives) = match (arguments, query_directives) {
        (Ok(arguments), Ok(query_directives)) => (arguments, query_directives),
        (arguments, query_directives) => {
            let located = arguments
                .err()
                .into_iter()
                .chain(query_directives.err())
                .flatten()
                .collect();
            ctx.push_located_errors(errors, located, path);
            return try_nullify(&field_def.ty, Err(PropagateNull));
        }
    };

    // Directives of the query wrap those of the field definition
    let chain = if query_directives.is_empty() {
        Cow::Borrowed(field_def.directives.as_slice())
    } else {
        let mut chain = query_directives;
        chain.extend(field_def.directives.iter().cloned());
        Cow::Owned(chain)
    };
    let resolved = NextResolver::new(&chain, &*field_def.resolver, ctx.context, &info)
        .run(object_value, arguments)
        .await;
    let resolved = match resolved {
        Ok(value) => apply_pre_output_coercion(ctx, &info, &field_def.ty, value).await,
        Err(error) => Err(error),
    };
    let completed = match resolved {
        Ok(value) => complete_value(ctx, errors, path, &field_def.ty, &info, value).await,
        Err(error) => {
            ctx.push_field_error(errors, error, path, fields);
            Err(PropagateNull)
        }
    };
    try_nullify(&field_def.ty, completed)
}

/// Implemented directives written on the field selections, `@skip` and `@include` aside,
/// with their arguments coerced against the variables of this request.
async fn query_directive_instances(
    cx: CoercionContext<'_>,
    fields: &[&Node<executable::Field>],
) -> Result<Vec<DirectiveInstance>, Vec<LocatedError>> {
    let mut instances = Vec::new();
    let mut errors = Vec::new();
    for directive in fields.iter().flat_map(|field| field.directives.iter()) {
        if matches!(directive.name.as_str(), "skip" | "include") {
            continue;
        }
        let Some(definition) = cx.schema.directive_definitions.get(&directive.name) else {
            continue;
        };
        let Some(implementation) = &definition.implementation else {
            continue;
        };
        match coerce_arguments(
            cx,
            &definition.arguments,
            ArgumentParent::Directive(directive),
            &directive.arguments,
        )
        .await
        {
            Ok(arguments) => instances.push(DirectiveInstance {
                name: directive.name.clone(),
                arguments,
                implementation: implementation.clone(),
            }),
            Err(directive_errors) => errors.extend(directive_errors),
        }
    }
    if errors.is_empty() {
        Ok(instances)
    } else {
        Err(errors)
    }
}

/// `__typename` of any object type.
/// Schema introspection is not supported: `__schema` and `__type` are field errors.
fn execute_meta_field(
    ctx: &ExecutionContext<'_>,
    errors: &mut Vec<GraphQLError>,
    path: LinkedPath<'_>,
    object_type: &ObjectDefinition,
    fields: &[&Node<executable::Field>],
) -> Result<JsonValue, PropagateNull> {
    let field_name = &fields[0].name;
    if field_name == "__typename" {
        return Ok(object_type.name.as_str().into());
    }
    let error = FieldError::new(format!(
        "Introspection field {field_name} is not supported."
    ));
    ctx.push_field_error(errors, error, path, fields);
    // `__schema: __Schema!` is non-null, `__type: __Type` is nullable
    if field_name == "__schema" {
        Err(PropagateNull)
    } else {
        Ok(JsonValue::Null)
    }
}

/// Try to insert a propagated null if possible, or keep propagating it.
///
/// <https://spec.graphql.org/October2021/#sec-Handling-Field-Errors>
pub(crate) fn try_nullify(
    ty: &TypeRef,
    result: Result<JsonValue, PropagateNull>,
) -> Result<JsonValue, PropagateNull> {
    match result {
        Ok(json) => Ok(json),
        Err(PropagateNull) => {
            if ty.is_non_null() {
                Err(PropagateNull)
            } else {
                Ok(JsonValue::Null)
            }
        }
    }
}
