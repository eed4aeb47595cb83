//! GraphQL [execution](https://spec.graphql.org/October2021/#sec-Execution)
//! over an [`apollo_compiler`] schema, with asynchronous resolvers and directive hooks.
//!
//! Start with [`ExecutableSchema::builder`] to register resolvers, custom scalars
//! and directive implementations, then [`SchemaBuilder::build`] the schema once.
//! Each request is then configured with [`Execution::new`] and run with
//! [`execute`][Execution::execute] or [`execute_sync`][Execution::execute_sync].
//!
//! Runtime values are JSON: resolvers receive and return [`JsonValue`],
//! coerced arguments and variables are [`JsonMap`].
//! Enum values are represented as JSON strings.
//!
//! Directives declared in the schema can hook into execution
//! by implementing the [`Directive`] trait:
//!
//! * [`Directive::on_argument_execution`] after an argument was coerced
//! * [`Directive::on_post_input_coercion`] after an input value was coerced
//! * [`Directive::on_pre_output_coercion`] before a resolved value is serialized
//! * [`Directive::on_field_execution`] around the resolver of a field

mod coercion;
mod directive;
mod error;
mod execution;
mod resolver;
mod response;
mod scalar;
mod schema;
mod types;

pub use self::directive::ArgumentParent;
pub use self::directive::Directive;
pub use self::directive::Next;
pub use self::directive::NextResolver;
pub use self::error::BuildError;
pub use self::error::FieldError;
pub use self::error::InvalidValue;
pub use self::error::RequestError;
pub use self::execution::Execution;
pub use self::resolver::async_resolver_fn;
pub use self::resolver::resolver_fn;
pub use self::resolver::AsyncResolverFn;
pub use self::resolver::ResolveInfo;
pub use self::resolver::Resolver;
pub use self::resolver::ResolverFn;
pub use self::resolver::TypeResolver;
pub use self::resolver::UserContext;
pub use self::response::Response;
pub use self::scalar::Scalar;
pub use self::schema::DirectiveDefinition;
pub use self::schema::EnumDefinition;
pub use self::schema::EnumValueDefinition;
pub use self::schema::ExecutableSchema;
pub use self::schema::FieldDefinition;
pub use self::schema::InputObjectDefinition;
pub use self::schema::InputValueDefinition;
pub use self::schema::InterfaceDefinition;
pub use self::schema::ObjectDefinition;
pub use self::schema::ScalarDefinition;
pub use self::schema::SchemaBuilder;
pub use self::schema::UnionDefinition;
pub use self::types::TypeDefinition;
pub use self::types::TypeRef;
pub use apollo_compiler::response::GraphQLError;
pub use apollo_compiler::response::JsonMap;
pub use apollo_compiler::response::JsonValue;
pub use apollo_compiler::response::ResponseDataPathSegment;
