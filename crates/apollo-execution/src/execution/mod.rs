//! Configuration and entry point of a request execution

use crate::coercion::variables::coerce_variable_values;
use crate::error::RequestError;
use crate::resolver::UserContext;
use crate::response::Response;
use crate::schema::ExecutableSchema;
use crate::JsonMap;
use crate::JsonValue;
use apollo_compiler::executable::Operation;
use apollo_compiler::executable::OperationType;
use apollo_compiler::response::GraphQLError;
use apollo_compiler::validation::Valid;
use apollo_compiler::ExecutableDocument;

pub(crate) mod engine;

use self::engine::execute_selection_set;
use self::engine::ExecutionContext;
use self::engine::ExecutionMode;
use self::engine::PropagateNull;

/// Builder for configuring the execution of one request
///
/// ```
/// use apollo_compiler::ExecutableDocument;
/// use apollo_compiler::Schema;
/// use apollo_execution::resolver_fn;
/// use apollo_execution::Execution;
/// use apollo_execution::ExecutableSchema;
/// use apollo_execution::JsonValue;
///
/// let sdl = "type Query { hello(name: String = \"World\"): String }";
/// let schema = Schema::parse_and_validate(sdl, "schema.graphql").unwrap();
/// let schema = ExecutableSchema::builder(schema)
///     .resolver(
///         "Query.hello",
///         resolver_fn(|_source, arguments, _context, _info| {
///             let name = arguments["name"].as_str().unwrap_or_default();
///             Ok(JsonValue::from(format!("Hello {name}!")))
///         }),
///     )
///     .build()
///     .unwrap();
///
/// let query = "{ hello(name: \"Ferris\") }";
/// let document =
///     ExecutableDocument::parse_and_validate(schema.schema(), query, "query.graphql").unwrap();
/// let response = Execution::new(&schema, &document).execute_sync();
/// assert!(response.errors.is_empty());
/// assert_eq!(response.data.unwrap()["hello"], "Hello Ferris!");
/// ```
pub struct Execution<'a> {
    schema: &'a ExecutableSchema,
    document: &'a Valid<ExecutableDocument>,
    operation: Option<&'a Operation>,
    variable_values: Option<&'a JsonMap>,
    root_value: Option<&'a JsonValue>,
    context: Option<&'a UserContext>,
}

impl<'a> Execution<'a> {
    /// `document` is expected to have been validated against the schema of `schema`
    pub fn new(schema: &'a ExecutableSchema, document: &'a Valid<ExecutableDocument>) -> Self {
        Self {
            schema,
            document,
            operation: None,
            variable_values: None,
            root_value: None,
            context: None,
        }
    }

    /// Executes this operation of the document.
    /// Cannot be combined with [`operation_name`][Self::operation_name].
    pub fn operation(mut self, operation: &'a Operation) -> Self {
        assert!(self.operation.is_none(), "operation already selected");
        self.operation = Some(operation);
        self
    }

    /// Picks the operation of the document to execute by its name.
    /// Cannot be combined with [`operation`][Self::operation].
    ///
    /// With `None`, or if no operation is picked at all,
    /// the document must contain a single operation.
    pub fn operation_name(mut self, operation_name: Option<&str>) -> Result<Self, RequestError> {
        assert!(self.operation.is_none(), "operation already selected");
        self.operation = Some(get_operation(self.document, operation_name)?);
        Ok(self)
    }

    /// Provides the raw values of the request's variables, as found in a JSON request.
    ///
    /// They are coerced according to the variable definitions of the operation
    /// before execution starts. If not called, an empty map is assumed.
    pub fn variable_values(mut self, variable_values: &'a JsonMap) -> Self {
        assert!(
            self.variable_values.is_none(),
            "variable values already provided"
        );
        self.variable_values = Some(variable_values);
        self
    }

    /// The source value of root fields. Defaults to null.
    pub fn root_value(mut self, root_value: &'a JsonValue) -> Self {
        assert!(self.root_value.is_none(), "root value already provided");
        self.root_value = Some(root_value);
        self
    }

    /// Request-scoped data passed to every resolver and directive hook. Defaults to `()`.
    pub fn context(mut self, context: &'a UserContext) -> Self {
        assert!(self.context.is_none(), "context already provided");
        self.context = Some(context);
        self
    }

    /// Executes with a single-threaded executor, blocking until every resolver is done
    pub fn execute_sync(&self) -> Response {
        futures::executor::block_on(self.execute())
    }

    /// <https://spec.graphql.org/October2021/#ExecuteRequest()>
    ///
    /// Request errors are returned as a response with `"data": null`.
    pub async fn execute(&self) -> Response {
        match self.execute_common().await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(errors = error.errors.len(), "request rejected");
                error.into_response()
            }
        }
    }

    async fn execute_common(&self) -> Result<Response, RequestError> {
        let operation = match self.operation {
            Some(operation) => operation,
            None => get_operation(self.document, None)?,
        };
        let mode = match operation.operation_type {
            OperationType::Mutation => ExecutionMode::Sequential,
            OperationType::Query | OperationType::Subscription => ExecutionMode::Normal,
        };
        let root_type_name = self.schema.schema.root_operation(operation.operation_type);
        let Some(root_type) = root_type_name.and_then(|name| self.schema.get_object(name))
        else {
            let message = match operation.operation_type {
                OperationType::Query => "Schema is not configured for queries.",
                OperationType::Mutation => "Schema is not configured for mutations.",
                OperationType::Subscription => "Schema is not configured for subscriptions.",
            };
            let error = GraphQLError::new(message, None, &self.document.sources);
            return Err(RequestError::new(vec![error]));
        };

        let context = self.context.unwrap_or(&());
        let empty = JsonMap::new();
        let variable_values = coerce_variable_values(
            self.schema,
            context,
            operation,
            self.variable_values.unwrap_or(&empty),
        )
        .await
        .map_err(|errors| {
            tracing::debug!(errors = errors.len(), "invalid variable values");
            RequestError::new(
                errors
                    .into_iter()
                    .map(|error| error.into_graphql_error(None, &self.document.sources))
                    .collect(),
            )
        })?;

        let null = JsonValue::Null;
        let ctx = ExecutionContext {
            schema: self.schema,
            document: self.document,
            operation,
            variable_values: &variable_values,
            root_value: self.root_value.unwrap_or(&null),
            context,
        };
        let mut errors = Vec::new();
        let result = execute_selection_set(
            &ctx,
            &mut errors,
            None,
            mode,
            root_type,
            ctx.root_value,
            vec![&operation.selection_set],
        )
        .await;
        // A field error on a non-null field propagated all the way to the root
        // makes the JSON response contain `"data": null`
        let data = match result {
            Ok(data) => Some(data),
            Err(PropagateNull) => None,
        };
        Ok(Response {
            errors,
            data,
            extensions: JsonMap::new(),
        })
    }
}

/// <https://spec.graphql.org/October2021/#GetOperation()>
fn get_operation<'doc>(
    document: &'doc Valid<ExecutableDocument>,
    operation_name: Option<&str>,
) -> Result<&'doc Operation, RequestError> {
    document
        .operations
        .get(operation_name)
        .map(|operation| &**operation)
        .map_err(|_| {
            let message = match operation_name {
                Some(name) => format!("Unknown operation named \"{name}\"."),
                None => "Must provide operation name if query contains multiple operations."
                    .to_owned(),
            };
            RequestError::new(vec![GraphQLError::new(message, None, &document.sources)])
        })
}
