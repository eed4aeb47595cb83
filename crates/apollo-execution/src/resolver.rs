use crate::error::FieldError;
use crate::execution::engine::ExecutionContext;
use crate::response::path_to_vec;
use crate::response::LinkedPath;
use crate::schema::ExecutableSchema;
use crate::schema::FieldDefinition;
use crate::schema::ObjectDefinition;
use crate::types::TypeRef;
use crate::JsonMap;
use crate::JsonValue;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::executable;
use apollo_compiler::executable::Operation;
use apollo_compiler::response::ResponseDataPathSegment;
use apollo_compiler::validation::Valid;
use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::Node;
use futures::future::BoxFuture;
use futures::FutureExt as _;
use std::any::Any;

/// Request-scoped data shared with every resolver and directive hook.
///
/// Use [`downcast_ref`][Any::downcast_ref] to access the value passed to
/// [`Execution::context`][crate::Execution::context]. Defaults to `()`.
pub type UserContext = dyn Any + Send + Sync;

/// Resolves the value of one field of an object
///
/// `source` is the value of the parent object: the result of the parent field's resolver,
/// or the root value for fields of a root operation type.
/// `arguments` are coerced according to the argument definitions.
///
/// Fields without a registered resolver use the default resolver,
/// which returns the entry of `source` whose key is the field name.
pub trait Resolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        source: &'a JsonValue,
        arguments: &'a JsonMap,
        context: &'a UserContext,
        info: &'a ResolveInfo<'a>,
    ) -> BoxFuture<'a, Result<JsonValue, FieldError>>;
}

/// Selects the concrete object type of a value resolved for an interface or union type.
///
/// Returns the name of an object type, which must be a possible type of `abstract_type`.
/// The default reads the `__typename` key of the value.
pub trait TypeResolver: Send + Sync {
    fn resolve_type(
        &self,
        value: &JsonValue,
        context: &UserContext,
        info: &ResolveInfo<'_>,
        abstract_type: &str,
    ) -> Option<String>;
}

impl<F> TypeResolver for F
where
    F: Fn(&JsonValue, &UserContext, &ResolveInfo<'_>, &str) -> Option<String> + Send + Sync,
{
    fn resolve_type(
        &self,
        value: &JsonValue,
        context: &UserContext,
        info: &ResolveInfo<'_>,
        abstract_type: &str,
    ) -> Option<String> {
        self(value, context, info, abstract_type)
    }
}

/// A [`Resolver`] calling a synchronous closure, see [`resolver_fn`]
pub struct ResolverFn<F>(F);

/// A [`Resolver`] calling a closure that returns a future, see [`async_resolver_fn`]
pub struct AsyncResolverFn<F>(F);

/// Makes a [`Resolver`] from a synchronous closure
///
/// ```
/// use apollo_execution::resolver_fn;
/// use apollo_execution::JsonValue;
///
/// let hello = resolver_fn(|_source, arguments, _context, _info| {
///     let name = arguments["name"].as_str().unwrap_or("World");
///     Ok(JsonValue::from(format!("Hello {name}!")))
/// });
/// # let _ = hello;
/// ```
pub fn resolver_fn<F>(f: F) -> ResolverFn<F>
where
    F: Fn(&JsonValue, &JsonMap, &UserContext, &ResolveInfo<'_>) -> Result<JsonValue, FieldError>
        + Send
        + Sync,
{
    ResolverFn(f)
}

/// Makes a [`Resolver`] from a closure returning a boxed future
pub fn async_resolver_fn<F>(f: F) -> AsyncResolverFn<F>
where
    F: for<'a> Fn(
            &'a JsonValue,
            &'a JsonMap,
            &'a UserContext,
            &'a ResolveInfo<'a>,
        ) -> BoxFuture<'a, Result<JsonValue, FieldError>>
        + Send
        + Sync,
{
    AsyncResolverFn(f)
}

impl<F> Resolver for ResolverFn<F>
where
    F: Fn(&JsonValue, &JsonMap, &UserContext, &ResolveInfo<'_>) -> Result<JsonValue, FieldError>
        + Send
        + Sync,
{
    fn resolve<'a>(
        &'a self,
        source: &'a JsonValue,
        arguments: &'a JsonMap,
        context: &'a UserContext,
        info: &'a ResolveInfo<'a>,
    ) -> BoxFuture<'a, Result<JsonValue, FieldError>> {
        futures::future::ready((self.0)(source, arguments, context, info)).boxed()
    }
}

impl<F> Resolver for AsyncResolverFn<F>
where
    F: for<'a> Fn(
            &'a JsonValue,
            &'a JsonMap,
            &'a UserContext,
            &'a ResolveInfo<'a>,
        ) -> BoxFuture<'a, Result<JsonValue, FieldError>>
        + Send
        + Sync,
{
    fn resolve<'a>(
        &'a self,
        source: &'a JsonValue,
        arguments: &'a JsonMap,
        context: &'a UserContext,
        info: &'a ResolveInfo<'a>,
    ) -> BoxFuture<'a, Result<JsonValue, FieldError>> {
        (self.0)(source, arguments, context, info)
    }
}

/// Returns the entry of the source object named like the field (not its alias), or null
pub(crate) struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve<'a>(
        &'a self,
        source: &'a JsonValue,
        _arguments: &'a JsonMap,
        _context: &'a UserContext,
        info: &'a ResolveInfo<'a>,
    ) -> BoxFuture<'a, Result<JsonValue, FieldError>> {
        let value = source
            .as_object()
            .and_then(|object| object.get(info.field_name().as_str()))
            .cloned()
            .unwrap_or(JsonValue::Null);
        futures::future::ready(Ok(value)).boxed()
    }
}

pub(crate) fn default_resolve_type(value: &JsonValue) -> Option<String> {
    value
        .as_object()?
        .get("__typename")?
        .as_str()
        .map(ToOwned::to_owned)
}

/// Information about the field being resolved,
/// passed to resolvers, type resolvers, and directive hooks.
pub struct ResolveInfo<'a> {
    pub(crate) ctx: &'a ExecutionContext<'a>,
    pub(crate) field_definition: &'a FieldDefinition,
    pub(crate) fields: &'a [&'a Node<executable::Field>],
    pub(crate) parent_type: &'a ObjectDefinition,
    pub(crate) path: LinkedPath<'a>,
}

impl<'a> ResolveInfo<'a> {
    /// The name of the field being resolved
    pub fn field_name(&self) -> &'a Name {
        &self.field_definition.name
    }

    pub fn field_definition(&self) -> &'a FieldDefinition {
        self.field_definition
    }

    /// The field selections being resolved.
    ///
    /// There is always at least one, but there may be more in case of
    /// [field merging](https://spec.graphql.org/October2021/#sec-Field-Selection-Merging).
    pub fn field_selections(&self) -> &'a [&'a Node<executable::Field>] {
        self.fields
    }

    pub fn return_type(&self) -> &'a TypeRef {
        &self.field_definition.ty
    }

    /// The object type the field belongs to
    pub fn parent_type(&self) -> &'a ObjectDefinition {
        self.parent_type
    }

    /// Path of the field in response data
    pub fn path(&self) -> Vec<ResponseDataPathSegment> {
        path_to_vec(self.path)
    }

    pub fn schema(&self) -> &'a ExecutableSchema {
        self.ctx.schema
    }

    pub fn document(&self) -> &'a Valid<ExecutableDocument> {
        self.ctx.document
    }

    pub fn operation(&self) -> &'a Operation {
        self.ctx.operation
    }

    pub fn fragments(&self) -> &'a IndexMap<Name, Node<executable::Fragment>> {
        &self.ctx.document.fragments
    }

    /// Coerced values of the operation's variables
    pub fn variable_values(&self) -> &'a JsonMap {
        self.ctx.variable_values
    }

    pub fn root_value(&self) -> &'a JsonValue {
        self.ctx.root_value
    }
}
