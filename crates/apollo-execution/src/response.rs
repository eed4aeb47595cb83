use crate::JsonMap;
use apollo_compiler::parser::SourceMap;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::response::GraphQLError;
use apollo_compiler::response::ResponseDataPathSegment;
use serde::Serialize;

/// <https://spec.graphql.org/October2021/#sec-Response-Format>
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    // <https://spec.graphql.org/October2021/#note-6f005> suggests serializing this first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,

    /// None/null if a field error was propagated all the way to the root,
    /// or if execution did not start because of a request error
    pub data: Option<JsonMap>,

    /// Left empty by the engine, for callers to fill
    #[serde(skip_serializing_if = "JsonMap::is_empty")]
    pub extensions: JsonMap,
}

pub(crate) type LinkedPath<'a> = Option<&'a LinkedPathElement<'a>>;

/// A path into response data (or into an input value),
/// linked through the call stack from the innermost element.
pub(crate) struct LinkedPathElement<'a> {
    pub(crate) element: ResponseDataPathSegment,
    pub(crate) next: LinkedPath<'a>,
}

pub(crate) fn path_to_vec(mut link: LinkedPath<'_>) -> Vec<ResponseDataPathSegment> {
    let mut path = Vec::new();
    while let Some(node) = link {
        path.push(node.element.clone());
        link = node.next;
    }
    path.reverse();
    path
}

pub(crate) fn field_error(
    message: impl Into<String>,
    path: LinkedPath<'_>,
    locations: impl IntoIterator<Item = Option<SourceSpan>>,
    sources: &SourceMap,
) -> GraphQLError {
    let mut error = GraphQLError::new(message, None, sources);
    error.locations = locations
        .into_iter()
        .flatten()
        .filter_map(|location| location.line_column(sources))
        .collect();
    error.path = path_to_vec(path);
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use apollo_compiler::name;

    #[test]
    fn linked_path_is_reversed() {
        let root = LinkedPathElement {
            element: ResponseDataPathSegment::Field(name!("pets")),
            next: None,
        };
        let item = LinkedPathElement {
            element: ResponseDataPathSegment::ListIndex(1),
            next: Some(&root),
        };
        let leaf = LinkedPathElement {
            element: ResponseDataPathSegment::Field(name!("name")),
            next: Some(&item),
        };
        assert_eq!(
            path_to_vec(Some(&leaf)),
            [
                ResponseDataPathSegment::Field(name!("pets")),
                ResponseDataPathSegment::ListIndex(1),
                ResponseDataPathSegment::Field(name!("name")),
            ]
        );
        assert!(path_to_vec(None).is_empty());
    }
}
