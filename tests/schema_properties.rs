//! Behavioral properties of the schema algebra
//!
//! Exercises the interpreted path end to end through the public prelude.

use fast_schema::prelude::*;
use fast_schema::schema::UnknownKeys;
use serde_json::{json, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn key(k: &str) -> PathSegment {
    PathSegment::Key(k.to_string())
}

fn shapes() -> impl Schema {
    discriminated_union(
        "type",
        vec![
            object()
                .field("type", literal("circle"))
                .field("radius", number().positive())
                .boxed(),
            object()
                .field("type", literal("rectangle"))
                .field("width", number().positive())
                .field("height", number().positive())
                .boxed(),
        ],
    )
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_validated_output_revalidates_to_itself() {
    init_tracing();

    let cases: Vec<(SchemaRef, Value)> = vec![
        (string().min_length(2).email().boxed(), json!("ann@example.com")),
        (number().int().min(0.0).boxed(), json!(42)),
        (
            object()
                .field("name", string())
                .field("role", enumeration(["admin", "guest"]).default("guest"))
                .field("tags", array(string()).unique())
                .boxed(),
            json!({"name": "ann", "tags": ["a", "b"], "extra": true}),
        ),
        (record(boolean()).boxed(), json!({"a": true, "b": false})),
        (
            union(vec![string().boxed(), number().boxed()]).boxed(),
            json!(7),
        ),
        (shapes().boxed(), json!({"type": "circle", "radius": 2, "note": "x"})),
        (null().nullable().boxed(), Value::Null),
    ];

    for (schema, value) in cases {
        let once = schema.validate(&value).unwrap();
        let twice = schema.validate(&once).unwrap();
        assert_eq!(once, twice, "not idempotent for {}", value);
    }
}

// =============================================================================
// Aggregation
// =============================================================================

#[test]
fn test_object_reports_every_missing_field() {
    let schema = object().field("a", string()).field("b", number());
    let err = schema.validate(&json!({})).unwrap_err();

    assert_eq!(err.len(), 2);
    assert_eq!(err.issues()[0].path, vec![key("a")]);
    assert_eq!(err.issues()[1].path, vec![key("b")]);
    assert!(err.issues().iter().all(|i| i.code == IssueCode::Required));
}

#[test]
fn test_nested_paths_run_root_to_leaf() {
    let schema = object().field(
        "users",
        array(object().field("email", string().email())),
    );
    let err = schema
        .validate(&json!({"users": [{"email": "a@b.co"}, {"email": "nope"}]}))
        .unwrap_err();

    assert_eq!(err.len(), 1);
    assert_eq!(
        err.first().path,
        vec![key("users"), PathSegment::Index(1), key("email")]
    );
    assert_eq!(err.first().path_string(), "users[1].email");
}

#[test]
fn test_array_bounds_fail_fast() {
    let schema = array(number()).max_items(1);
    let err = schema.validate(&json!(["x", "y"])).unwrap_err();

    assert_eq!(err.len(), 1);
    assert_eq!(err.first().code, IssueCode::TooBig);
}

// =============================================================================
// Combinator symmetry
// =============================================================================

#[test]
fn test_checks_resolve_through_wrappers() {
    let outer = string().optional().min_length(3);
    let inner = string().min_length(3).optional();

    assert_eq!(outer.validate_input(None).unwrap(), None);
    assert_eq!(inner.validate_input(None).unwrap(), None);

    let outer_err = outer.validate(&json!("ab")).unwrap_err();
    let inner_err = inner.validate(&json!("ab")).unwrap_err();
    assert_eq!(outer_err, inner_err);
    assert_eq!(outer_err.first().code, IssueCode::TooSmall);

    assert_eq!(
        outer.definition().canonical_json(),
        inner.definition().canonical_json()
    );
}

#[test]
fn test_numeric_checks_through_nullable_and_catch() {
    let schema = number().nullable().int().catch(0);
    assert_eq!(schema.validate(&json!(null)).unwrap(), Value::Null);
    assert_eq!(schema.validate(&json!(1.5)).unwrap(), json!(0));

    let chained = number().catch(-1).max(10.0);
    assert_eq!(chained.validate(&json!(11)).unwrap(), json!(-1));
}

#[test]
fn test_default_only_fills_absent() {
    let schema = object().field("n", number().default(5));
    assert_eq!(schema.validate(&json!({})).unwrap(), json!({"n": 5}));
    assert!(schema.validate(&json!({"n": null})).is_err());
}

// =============================================================================
// Discriminated union
// =============================================================================

#[test]
fn test_discriminated_union_selects_by_tag() {
    let schema = shapes();

    let circle = schema
        .validate(&json!({"type": "circle", "radius": 5}))
        .unwrap();
    assert_eq!(circle, json!({"type": "circle", "radius": 5}));

    let err = schema
        .validate(&json!({"type": "rectangle", "width": 2}))
        .unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.first().path, vec![key("height")]);
}

#[test]
fn test_discriminated_union_unknown_tag_is_one_issue() {
    let err = shapes()
        .validate(&json!({"type": "triangle", "radius": 5}))
        .unwrap_err();

    assert_eq!(err.len(), 1);
    assert_eq!(err.first().code, IssueCode::InvalidUnionDiscriminator);
    assert_eq!(err.first().path, vec![key("type")]);
}

// =============================================================================
// Intersection
// =============================================================================

#[test]
fn test_intersection_requires_both_constraints_on_shared_key() {
    let schema = intersection(
        object().field("k", number().min(0.0)),
        object()
            .field("k", number().max(10.0).transform(|v| json!(v.as_f64().unwrap() * 2.0)))
            .passthrough(),
    );

    assert!(schema.validate(&json!({"k": -1})).is_err());
    assert!(schema.validate(&json!({"k": 11})).is_err());

    let merged = schema.validate(&json!({"k": 4, "other": "x"})).unwrap();
    assert_eq!(merged["k"], json!(8.0));
    assert_eq!(merged["other"], json!("x"));
}

#[test]
fn test_intersection_of_disjoint_primitives_fails() {
    let err = intersection(string(), number())
        .validate(&json!("x"))
        .unwrap_err();
    assert_eq!(err.first().code, IssueCode::InvalidType);
}

// =============================================================================
// Callbacks
// =============================================================================

#[test]
fn test_refine_panic_becomes_unknown_error() {
    let schema = string().refine(|_| panic!("boom"), "never");
    let result = schema.safe_validate(&json!("x"));

    assert!(!result.success);
    assert_eq!(result.errors[0].code, IssueCode::UnknownError);
}

#[test]
fn test_async_refine_on_sync_path_is_flagged() {
    let schema = string().refine_async(|_| async { true }, "never");
    assert!(schema.is_async());

    let err = schema.validate(&json!("x")).unwrap_err();
    assert_eq!(err.first().code, IssueCode::AsyncInSync);
}

#[tokio::test]
async fn test_async_refine_runs_on_async_path() {
    let schema = object().field(
        "name",
        string().refine_async(|v| async move { v != json!("taken") }, "Name is taken"),
    );

    assert!(schema.validate_async(&json!({"name": "free"})).await.is_ok());
    let err = schema
        .validate_async(&json!({"name": "taken"}))
        .await
        .unwrap_err();
    assert_eq!(err.first().code, IssueCode::Custom);
    assert_eq!(err.first().message, "Name is taken");
    assert_eq!(err.first().path, vec![key("name")]);
}

#[test]
fn test_conditional_labels_branch() {
    let schema = conditional(
        |input| input.map_or(false, Value::is_string),
        string().min_length(3),
        number(),
    );

    assert!(schema.validate(&json!("abc")).is_ok());
    assert!(schema.validate(&json!(1)).is_ok());

    let err = schema.validate(&json!("ab")).unwrap_err();
    assert!(err.first().message.starts_with("Condition met: "));
    let err = schema.validate(&json!(true)).unwrap_err();
    assert!(err.first().message.starts_with("Condition not met: "));
}

#[test]
fn test_strict_object_rejects_unknown_keys() {
    let schema = object().field("a", number()).strict();
    assert_eq!(schema.unknown_keys(), UnknownKeys::Strict);

    let err = schema.validate(&json!({"a": 1, "b": 2})).unwrap_err();
    assert_eq!(err.first().code, IssueCode::UnrecognizedKeys);
}

#[test]
fn test_parse_into_typed_value() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct User {
        name: String,
        age: u32,
    }

    let schema = object()
        .field("name", string().trim())
        .field("age", integer().nonnegative());
    let user: User = schema.parse_into(&json!({"name": "  ann ", "age": 3})).unwrap();
    assert_eq!(
        user,
        User {
            name: "ann".to_string(),
            age: 3
        }
    );
}
