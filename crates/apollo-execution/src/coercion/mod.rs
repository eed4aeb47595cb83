//! Input coercion of literals, variables, and arguments,
//! and completion of resolved values.

use crate::error::FieldError;
use crate::resolver::UserContext;
use crate::response::LinkedPath;
use crate::response::LinkedPathElement;
use crate::schema::ExecutableSchema;
use crate::JsonMap;
use crate::JsonValue;
use apollo_compiler::parser::SourceMap;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::response::GraphQLError;
use apollo_compiler::response::ResponseDataPathSegment;
use std::fmt::Write;

pub(crate) mod arguments;
pub(crate) mod input;
pub(crate) mod literal;
pub(crate) mod output;
pub(crate) mod variables;

/// What input coercion needs to know about the current request
#[derive(Clone, Copy)]
pub(crate) struct CoercionContext<'a> {
    pub(crate) schema: &'a ExecutableSchema,
    /// Coerced variable values, `None` outside of an operation
    pub(crate) variables: Option<&'a JsonMap>,
    pub(crate) context: &'a UserContext,
}

impl<'a> CoercionContext<'a> {
    /// Returns `None` if the variable was not provided a runtime value
    pub(crate) fn variable(&self, name: &str) -> Option<&'a JsonValue> {
        self.variables?.get(name)
    }
}

/// An error of input coercion, not yet placed in a response
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocatedError {
    pub(crate) message: String,
    pub(crate) locations: Vec<SourceSpan>,
    pub(crate) extensions: JsonMap,
}

impl LocatedError {
    pub(crate) fn new(message: impl Into<String>, location: Option<SourceSpan>) -> Self {
        Self {
            message: message.into(),
            locations: location.into_iter().collect(),
            extensions: JsonMap::new(),
        }
    }

    /// Unpacks an aggregated error
    pub(crate) fn from_field_error(
        error: FieldError,
        location: Option<SourceSpan>,
    ) -> impl Iterator<Item = Self> {
        error.into_errors().map(move |error| Self {
            message: error.message,
            locations: location.into_iter().collect(),
            extensions: error.extensions,
        })
    }

    pub(crate) fn into_graphql_error(
        self,
        path: LinkedPath<'_>,
        sources: &SourceMap,
    ) -> GraphQLError {
        let locations = self.locations.into_iter().map(Some);
        let mut error = crate::response::field_error(self.message, path, locations, sources);
        error.extensions = self.extensions;
        error
    }
}

/// Formats `message`, followed by the path if not at the root of the value,
/// and by `sub_message` if any.
pub(crate) fn coercion_error(
    message: &str,
    path: LinkedPath<'_>,
    sub_message: Option<&str>,
    location: Option<SourceSpan>,
) -> LocatedError {
    let mut message = message.to_owned();
    if path.is_some() {
        let _ = write!(message, " at {}", render_input_path(path));
    }
    match sub_message {
        Some(sub_message) => {
            let _ = write!(message, "; {sub_message}");
        }
        None => message.push('.'),
    }
    LocatedError::new(message, location)
}

/// Renders a path within an input value, such as `value.items[2].name`
pub(crate) fn render_input_path(path: LinkedPath<'_>) -> String {
    let mut rendered = String::from("value");
    for segment in crate::response::path_to_vec(path) {
        match segment {
            ResponseDataPathSegment::Field(name) => {
                let _ = write!(rendered, ".{name}");
            }
            ResponseDataPathSegment::ListIndex(index) => {
                let _ = write!(rendered, "[{index}]");
            }
        }
    }
    rendered
}

/// Path elements for every item of a list
pub(crate) fn index_elements(len: usize, parent: LinkedPath<'_>) -> Vec<LinkedPathElement<'_>> {
    (0..len)
        .map(|index| LinkedPathElement {
            element: ResponseDataPathSegment::ListIndex(index),
            next: parent,
        })
        .collect()
}
