use apollo_compiler::ast;
use apollo_compiler::validation::Valid;
use apollo_compiler::ExecutableDocument;
use apollo_compiler::Schema;
use apollo_execution::async_resolver_fn;
use apollo_execution::resolver_fn;
use apollo_execution::ExecutableSchema;
use apollo_execution::Execution;
use apollo_execution::FieldError;
use apollo_execution::InvalidValue;
use apollo_execution::JsonValue;
use apollo_execution::Response;
use apollo_execution::Scalar;
use expect_test::expect;
use futures::FutureExt;
use pretty_assertions::assert_eq;
use serde_json_bytes::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::Context;
use std::task::Poll;

const SDL: &str = r#"
    scalar Blank

    type Query {
      hello(name: String = "World"): String
      n: Int!
      maybe: Int
      nested: Nested
      list: [Int!]
      strictList: [Int!]!
      looseList: [Int]
      blank: Blank!
      fail: String
      failMany: String
      slowFail: String
      add(a: Int!, b: Int!): Int
      count(n: Int): Int
      pets: [Pet]
      pet: Pet
    }

    type Nested {
      a: Int!
      b: Int
      nested: Nested
    }

    interface Pet {
      name: String
    }

    type Dog implements Pet {
      name: String
      barks: Boolean
    }

    type Cat implements Pet {
      name: String
      lives: Int
    }

    type Mutation {
      push(value: Int!): [Int!]!
      failing: Int!
    }
"#;

/// Pending once before completing, to let other futures make progress
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Serializes every value to null
struct Blank;

impl Scalar for Blank {
    fn coerce_output(&self, _value: &JsonValue) -> Option<JsonValue> {
        Some(JsonValue::Null)
    }

    fn coerce_input(&self, value: &JsonValue) -> Result<JsonValue, InvalidValue> {
        Ok(value.clone())
    }

    fn parse_literal(&self, _value: &ast::Value) -> Option<JsonValue> {
        None
    }
}

fn schema() -> ExecutableSchema {
    let schema = Schema::parse_and_validate(SDL, "schema.graphql").unwrap();
    ExecutableSchema::builder(schema)
        .scalar("Blank", Blank)
        .resolver(
            "Query.hello",
            resolver_fn(|_, arguments, _, _| {
                let name = arguments["name"].as_str().unwrap_or_default();
                Ok(format!("Hello {name}!").into())
            }),
        )
        .resolver(
            "Query.fail",
            resolver_fn(|_, _, _, _| Err(FieldError::new("boom").with_extension("code", "BOOM"))),
        )
        .resolver(
            "Query.failMany",
            resolver_fn(|_, _, _, _| {
                let errors = [FieldError::new("first"), FieldError::new("second")];
                Err(FieldError::aggregate(errors).unwrap())
            }),
        )
        .resolver(
            "Query.slowFail",
            async_resolver_fn(|_, _, _, _| {
                async {
                    for _ in 0..3 {
                        YieldOnce(false).await
                    }
                    Err::<JsonValue, _>(FieldError::new("slow"))
                }
                .boxed()
            }),
        )
        .resolver(
            "Mutation.push",
            resolver_fn(|_, arguments, context, _| {
                let log = context.downcast_ref::<Mutex<Vec<i64>>>().unwrap();
                let mut log = log.lock().unwrap();
                log.push(arguments["value"].as_i64().unwrap());
                Ok(JsonValue::Array(log.iter().map(|&v| v.into()).collect()))
            }),
        )
        .resolver(
            "Mutation.failing",
            resolver_fn(|_, _, _, _| Err("nope".into())),
        )
        .build()
        .unwrap()
}

fn execute(schema: &ExecutableSchema, query: &str, root_value: JsonValue) -> Response {
    let document =
        ExecutableDocument::parse_and_validate(schema.schema(), query, "query.graphql").unwrap();
    Execution::new(schema, &document)
        .root_value(&root_value)
        .execute_sync()
}

fn to_json(response: &Response) -> String {
    serde_json::to_string_pretty(response).unwrap()
}

/// Message and path of each error, in response order
fn errors(response: &Response) -> Vec<serde_json::Value> {
    response
        .errors
        .iter()
        .map(|error| serde_json::json!({"message": error.message, "path": error.path}))
        .collect()
}

fn data(response: &Response) -> Option<JsonValue> {
    response.data.clone().map(JsonValue::Object)
}

#[test]
fn non_null_field_nulls_the_response() {
    let schema = schema();
    let response = execute(&schema, "{ maybe n }", json!({"maybe": 1}));
    let expected = expect!([r#"
        {
          "errors": [
            {
              "message": "Cannot return null for non-nullable field Query.n.",
              "locations": [
                {
                  "line": 1,
                  "column": 9
                }
              ],
              "path": [
                "n"
              ]
            }
          ],
          "data": null
        }"#]);
    expected.assert_eq(&to_json(&response));
}

#[test]
fn null_bubbles_to_nearest_nullable_ancestor() {
    let schema = schema();
    let root = json!({"nested": {"a": 1, "nested": {"b": 2}}});
    let response = execute(&schema, "{ nested { a nested { a b } } }", root);
    let expected = expect!([r#"
        {
          "errors": [
            {
              "message": "Cannot return null for non-nullable field Nested.a.",
              "locations": [
                {
                  "line": 1,
                  "column": 23
                }
              ],
              "path": [
                "nested",
                "nested",
                "a"
              ]
            }
          ],
          "data": {
            "nested": {
              "a": 1,
              "nested": null
            }
          }
        }"#]);
    expected.assert_eq(&to_json(&response));
}

#[test]
fn list_items() {
    let schema = schema();
    let root = json!({"list": [1, null, 3], "strictList": [1, null]});

    // The nullable list absorbs the error of its non-null item
    let response = execute(&schema, "{ list maybe }", root.clone());
    assert_eq!(data(&response), Some(json!({"list": null, "maybe": null})));
    assert_eq!(
        errors(&response),
        [serde_json::json!({
            "message": "Cannot return null for non-nullable field Query.list.",
            "path": ["list", 1],
        })]
    );

    let response = execute(&schema, "{ strictList maybe }", root);
    assert_eq!(data(&response), None);
    assert_eq!(
        errors(&response),
        [serde_json::json!({
            "message": "Cannot return null for non-nullable field Query.strictList.",
            "path": ["strictList", 1],
        })]
    );

    // Items of a nullable item type fail on their own
    let response = execute(&schema, "{ looseList }", json!({"looseList": [1, "x", 3]}));
    assert_eq!(data(&response), Some(json!({"looseList": [1, null, 3]})));
    assert_eq!(
        errors(&response),
        [serde_json::json!({
            "message": "Expected value of type Int but received string.",
            "path": ["looseList", 1],
        })]
    );

    let response = execute(&schema, "{ list }", json!({"list": 7}));
    assert_eq!(data(&response), Some(json!({"list": null})));
    assert_eq!(
        errors(&response),
        [serde_json::json!({
            "message": "Expected Iterable, but did not find one for field Query.list.",
            "path": ["list"],
        })]
    );
}

#[test]
fn scalar_serialized_to_null_in_non_null_field() {
    let schema = schema();
    let response = execute(&schema, "{ blank maybe }", json!({"blank": "x", "maybe": 1}));
    assert_eq!(data(&response), None);
    assert_eq!(
        errors(&response),
        [serde_json::json!({
            "message": "Cannot return null for non-nullable field Query.blank.",
            "path": ["blank"],
        })]
    );
}

#[test]
fn resolver_errors_keep_extensions() {
    let schema = schema();
    let response = execute(&schema, "{ fail hello }", json!(null));
    let expected = expect!([r#"
        {
          "errors": [
            {
              "message": "boom",
              "locations": [
                {
                  "line": 1,
                  "column": 3
                }
              ],
              "path": [
                "fail"
              ],
              "extensions": {
                "code": "BOOM"
              }
            }
          ],
          "data": {
            "fail": null,
            "hello": "Hello World!"
          }
        }"#]);
    expected.assert_eq(&to_json(&response));
}

#[test]
fn errors_follow_selection_order() {
    let schema = schema();
    // `slowFail` completes last but is selected first
    let response = execute(&schema, "{ s: slowFail b: failMany a: fail }", json!(null));
    assert_eq!(data(&response), Some(json!({"s": null, "b": null, "a": null})));
    assert_eq!(
        errors(&response),
        [
            serde_json::json!({"message": "slow", "path": ["s"]}),
            serde_json::json!({"message": "first", "path": ["b"]}),
            serde_json::json!({"message": "second", "path": ["b"]}),
            serde_json::json!({"message": "boom", "path": ["a"]}),
        ]
    );
}

#[test]
fn argument_errors_are_all_reported() {
    let schema = schema();
    // Not validated: both required arguments are missing
    let document = ExecutableDocument::parse(schema.schema(), "{ add hello }", "query.graphql")
        .unwrap();
    let document = Valid::assume_valid(document);
    let response = Execution::new(&schema, &document).execute_sync();
    assert_eq!(
        data(&response),
        Some(json!({"add": null, "hello": "Hello World!"}))
    );
    assert_eq!(
        errors(&response),
        [
            serde_json::json!({
                "message": "Argument < a > of required type < Int! > was not provided.",
                "path": ["add"],
            }),
            serde_json::json!({
                "message": "Argument < b > of required type < Int! > was not provided.",
                "path": ["add"],
            }),
        ]
    );
    assert_eq!(response.errors[0].locations, response.errors[1].locations);
}

#[test]
fn mutation_fields_run_in_order() {
    let schema = schema();
    let query = "mutation { a: push(value: 1) b: push(value: 2) }";
    let document =
        ExecutableDocument::parse_and_validate(schema.schema(), query, "query.graphql").unwrap();
    let log = Mutex::new(Vec::<i64>::new());
    let response = Execution::new(&schema, &document)
        .context(&log)
        .execute_sync();
    assert_eq!(data(&response), Some(json!({"a": [1], "b": [1, 2]})));

    // A non-null failure stops the following top-level fields
    let query = "mutation { a: failing b: push(value: 3) }";
    let document =
        ExecutableDocument::parse_and_validate(schema.schema(), query, "query.graphql").unwrap();
    let log = Mutex::new(Vec::<i64>::new());
    let response = Execution::new(&schema, &document)
        .context(&log)
        .execute_sync();
    assert_eq!(data(&response), None);
    assert_eq!(
        errors(&response),
        [serde_json::json!({"message": "nope", "path": ["a"]})]
    );
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn skip_and_include() {
    let schema = schema();
    let query = r#"
        query($skip: Boolean!) {
          a: hello @skip(if: $skip)
          b: hello @include(if: false)
          c: hello(name: "c") @include(if: true)
          d: hello @skip(if: false)
          ... on Query @skip(if: true) {
            e: hello
          }
          ...F
          ...F
        }

        fragment F on Query {
          f: hello(name: "f")
        }
    "#;
    let document =
        ExecutableDocument::parse_and_validate(schema.schema(), query, "query.graphql").unwrap();
    let variables = json!({"skip": true});
    let response = Execution::new(&schema, &document)
        .variable_values(variables.as_object().unwrap())
        .execute_sync();
    assert!(response.errors.is_empty());
    assert_eq!(
        data(&response),
        Some(json!({"c": "Hello c!", "d": "Hello World!", "f": "Hello f!"}))
    );
}

#[test]
fn abstract_types() {
    let schema = schema();
    let root = json!({
        "pets": [
            {"__typename": "Dog", "name": "Rex", "barks": true},
            {"__typename": "Cat", "name": "Tom", "lives": 9},
        ],
        "pet": {"__typename": "Nested", "name": "Nemo"},
    });
    let query = "{ pets { __typename name ... on Dog { barks } ... on Cat { lives } } }";
    let response = execute(&schema, query, root.clone());
    assert!(response.errors.is_empty());
    assert_eq!(
        data(&response),
        Some(json!({
            "pets": [
                {"__typename": "Dog", "name": "Rex", "barks": true},
                {"__typename": "Cat", "name": "Tom", "lives": 9},
            ]
        }))
    );

    let response = execute(&schema, "{ pet { name } }", root);
    assert_eq!(data(&response), Some(json!({"pet": null})));
    assert_eq!(
        errors(&response),
        [serde_json::json!({
            "message": "Runtime Object type < Nested > is not a possible type for < Pet >.",
            "path": ["pet"],
        })]
    );
}

#[test]
fn type_resolver() {
    let sdl = r#"
        type Query { search: [SearchResult!] }
        type Dog { name: String barks: Boolean }
        type Cat { name: String }
        union SearchResult = Dog | Cat
    "#;
    let schema = Schema::parse_and_validate(sdl, "schema.graphql").unwrap();
    let schema = ExecutableSchema::builder(schema)
        .type_resolver("Query.search", |value, _, _, _| {
            let is_dog = value.as_object()?.get("barks").is_some();
            Some(if is_dog { "Dog" } else { "Cat" }.to_owned())
        })
        .build()
        .unwrap();
    let root = json!({"search": [{"name": "Rex", "barks": false}, {"name": "Tom"}]});
    let query = "{ search { __typename ... on Dog { name barks } ... on Cat { name } } }";
    let response = execute(&schema, query, root);
    assert!(response.errors.is_empty());
    assert_eq!(
        data(&response),
        Some(json!({
            "search": [
                {"__typename": "Dog", "name": "Rex", "barks": false},
                {"__typename": "Cat", "name": "Tom"},
            ]
        }))
    );
}

#[test]
fn meta_fields() {
    let schema = schema();
    let response = execute(
        &schema,
        "{ __typename nested { __typename } }",
        json!({"nested": {}}),
    );
    assert!(response.errors.is_empty());
    assert_eq!(
        data(&response),
        Some(json!({"__typename": "Query", "nested": {"__typename": "Nested"}}))
    );

    let response = execute(&schema, "{ __type(name: \"Pet\") { name } maybe }", json!(null));
    assert_eq!(data(&response), Some(json!({"__type": null, "maybe": null})));
    assert_eq!(
        errors(&response),
        [serde_json::json!({
            "message": "Introspection field __type is not supported.",
            "path": ["__type"],
        })]
    );
}

#[test]
fn operation_selection() {
    let schema = schema();
    let query = "query First { maybe } query Second { hello }";
    let document =
        ExecutableDocument::parse_and_validate(schema.schema(), query, "query.graphql").unwrap();

    let error = Execution::new(&schema, &document)
        .operation_name(None)
        .err()
        .unwrap();
    assert_eq!(
        error.errors()[0].message,
        "Must provide operation name if query contains multiple operations."
    );
    let error = Execution::new(&schema, &document)
        .operation_name(Some("Third"))
        .err()
        .unwrap();
    assert_eq!(error.to_string(), "Unknown operation named \"Third\".");

    // Without a selected operation the request error is in the response
    let response = Execution::new(&schema, &document).execute_sync();
    assert_eq!(data(&response), None);
    assert_eq!(response.errors.len(), 1);

    let response = Execution::new(&schema, &document)
        .operation_name(Some("Second"))
        .unwrap()
        .execute_sync();
    assert_eq!(data(&response), Some(json!({"hello": "Hello World!"})));
}

#[test]
fn invalid_variables_reject_the_request() {
    let schema = schema();
    let response = execute(&schema, "query($n: Int!) { count(n: $n) }", json!(null));
    let expected = expect!([r#"
        {
          "errors": [
            {
              "message": "Variable < $n > of required type < Int! > was not provided.",
              "locations": [
                {
                  "line": 1,
                  "column": 7
                }
              ]
            }
          ],
          "data": null
        }"#]);
    expected.assert_eq(&to_json(&response));
}
