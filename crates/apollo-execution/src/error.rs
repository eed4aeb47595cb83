use crate::response::Response;
use crate::JsonMap;
use crate::JsonValue;
use apollo_compiler::response::GraphQLError;

/// An error returned by a resolver, a directive hook, or a type resolver.
///
/// At the field boundary it becomes a [field error] located at the field being executed.
/// Several errors can travel together with [`FieldError::aggregate`],
/// each of them is then reported separately.
///
/// [field error]: https://spec.graphql.org/October2021/#sec-Errors.Field-errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    pub message: String,

    /// Copied to [`GraphQLError::extensions`]
    pub extensions: JsonMap,

    others: Vec<FieldError>,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: JsonMap::new(),
            others: Vec::new(),
        }
    }

    pub fn with_extension(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.extensions.insert(key, value.into());
        self
    }

    /// Combines several errors into one, for example the errors of concurrent operations.
    ///
    /// Returns `None` if `errors` is empty.
    pub fn aggregate(errors: impl IntoIterator<Item = FieldError>) -> Option<Self> {
        let mut errors = errors.into_iter().flat_map(FieldError::into_errors);
        let mut first = errors.next()?;
        first.others.extend(errors);
        Some(first)
    }

    /// This error followed by those aggregated into it
    pub fn errors(&self) -> impl Iterator<Item = &FieldError> {
        std::iter::once(self).chain(&self.others)
    }

    pub(crate) fn into_errors(mut self) -> impl Iterator<Item = FieldError> {
        let others = std::mem::take(&mut self.others);
        std::iter::once(self).chain(others)
    }
}

impl From<String> for FieldError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&'_ str> for FieldError {
    fn from(message: &'_ str) -> Self {
        Self::new(message)
    }
}

/// Returned by a [`Scalar`][crate::Scalar] for an input value it cannot represent
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{}", .reason.as_deref().unwrap_or("invalid scalar value"))]
pub struct InvalidValue {
    /// Appended to the coercion error message, if any
    pub reason: Option<String>,
}

impl InvalidValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

/// A [request error](https://spec.graphql.org/October2021/#sec-Errors.Request-errors):
/// execution did not start.
///
/// This happens when the operation cannot be selected, or when variable values
/// cannot be coerced, in which case every invalid variable gets its own error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", .errors.first().map_or("request error", |error| error.message.as_str()))]
pub struct RequestError {
    pub(crate) errors: Vec<GraphQLError>,
}

impl RequestError {
    pub(crate) fn new(errors: Vec<GraphQLError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[GraphQLError] {
        &self.errors
    }

    /// A response with `"data": null` and these errors
    pub fn into_response(self) -> Response {
        Response {
            errors: self.errors,
            data: None,
            extensions: JsonMap::new(),
        }
    }
}

/// Returned by [`SchemaBuilder::build`][crate::SchemaBuilder::build]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("`{coordinate}` is not a field coordinate of the form `Type.field`")]
    InvalidCoordinate { coordinate: String },

    #[error("resolver registered for `{coordinate}`, which is not a field of an object type")]
    UndefinedField { coordinate: String },

    #[error("type resolver registered for `{coordinate}` whose type `{ty}` is not abstract")]
    NotAbstract { coordinate: String, ty: String },

    #[error("scalar implementation registered for `{name}`, which is not a scalar type")]
    UndefinedScalar { name: String },

    #[error("implementation registered for directive `@{name}`, which is not defined")]
    UndefinedDirective { name: String },

    #[error("invalid arguments for `@{directive}` on `{location}`: {message}")]
    DirectiveArguments {
        directive: String,
        location: String,
        message: String,
    },
}
