//! Tests for pagination module

use super::*;
use crate::auth::AuthConfig;
use crate::error::Error;
use crate::http::{EngineConfig, RequestEngine};
use crate::types::JsonObject;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::instrument::WithSubscriber;
use tracing_subscriber::layer::SubscriberExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLIENTS_QUERY: &str = "query Clients($first: Int!, $after: String) { \
    business { clients(first: $first, after: $after) { \
    edges { node { id } } pageInfo { hasNextPage endCursor } } } }";

/// Collects the message of every WARN event
#[derive(Clone, Default)]
struct WarningCapture {
    warnings: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarningCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.warnings.lock().unwrap().push(visitor.0);
        }
    }
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

fn ids(range: std::ops::Range<usize>) -> Vec<Value> {
    range.map(|i| json!({"id": format!("client-{i}")})).collect()
}

fn page(nodes: &[Value], end_cursor: Option<&str>) -> Value {
    let edges: Vec<Value> = nodes.iter().map(|n| json!({"node": n})).collect();
    json!({
        "data": {
            "business": {
                "clients": {
                    "edges": edges,
                    "pageInfo": {
                        "hasNextPage": end_cursor.is_some(),
                        "endCursor": end_cursor
                    }
                }
            }
        }
    })
}

async fn mount_page(server: &MockServer, after: Value, body: Value) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({"variables": {"after": after}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

fn walker() -> PaginationWalker {
    let config = EngineConfig::builder()
        .backoff(Duration::from_millis(1), Duration::from_millis(5))
        .build();
    PaginationWalker::new(RequestEngine::new(config, AuthConfig::None).unwrap())
}

fn endpoint(server: &MockServer) -> String {
    format!("{}/graphql", server.uri())
}

// ============================================================================
// Path Resolution Tests
// ============================================================================

#[test]
fn test_resolve_path_nested() {
    let data = json!({"a": {"b": {"c": 1}}, "list": [{"x": "first"}, {"x": "second"}]});

    assert_eq!(resolve_path(&data, "a.b.c"), Some(&json!(1)));
    assert_eq!(resolve_path(&data, "list.1.x"), Some(&json!("second")));
    assert_eq!(resolve_path(&data, ""), Some(&data));
    assert_eq!(resolve_path(&data, "a.missing"), None);
    assert_eq!(resolve_path(&data, "list.9"), None);
    assert_eq!(resolve_path(&data, "a.b.c.d"), None);
}

#[test]
fn test_extract_connection_edges() {
    let data = json!({
        "shop": {"orders": {
            "edges": [{"node": {"id": 1}}, {"node": {"id": 2}}],
            "pageInfo": {"hasNextPage": true, "endCursor": "abc"}
        }}
    });

    let connection = extract_connection(&data, "shop.orders").unwrap();
    assert_eq!(connection.items, vec![json!({"id": 1}), json!({"id": 2})]);
    assert_eq!(
        connection.page_info,
        Some(PageInfo {
            has_next_page: true,
            end_cursor: Some("abc".to_string())
        })
    );
}

#[test]
fn test_extract_connection_nodes_without_page_info() {
    let data = json!({"users": {"nodes": [{"id": "u1"}]}});
    let connection = extract_connection(&data, "users").unwrap();
    assert_eq!(connection.items, vec![json!({"id": "u1"})]);
    assert!(connection.page_info.is_none());
}

#[test]
fn test_extract_connection_flat_items() {
    let data = json!({
        "clients": {
            "items": [{"id": "c1"}, {"id": "c2"}],
            "pageInfo": {"hasNextPage": true, "endCursor": "c2"}
        },
        "bad": {"items": "c1"}
    });

    let connection = extract_connection(&data, "clients").unwrap();
    assert_eq!(connection.items, vec![json!({"id": "c1"}), json!({"id": "c2"})]);
    assert_eq!(
        connection.page_info,
        Some(PageInfo {
            has_next_page: true,
            end_cursor: Some("c2".to_string()),
        })
    );

    let err = extract_connection(&data, "bad").unwrap_err();
    assert!(matches!(err, Error::Shape { ref path, .. } if path == "bad.items"));
}

#[test]
fn test_extract_connection_shape_errors() {
    let data = json!({
        "scalar": 5,
        "empty": {},
        "bad_edges": {"edges": {"node": 1}},
        "no_node": {"edges": [{"cursor": "x"}]},
        "bad_info": {"edges": [], "pageInfo": {"hasNextPage": "yes"}}
    });

    for path in ["missing", "scalar", "empty", "bad_edges", "no_node", "bad_info"] {
        let err = extract_connection(&data, path).unwrap_err();
        assert!(
            matches!(err, Error::Shape { .. }),
            "expected shape error for '{path}', got {err:?}"
        );
    }
}

// ============================================================================
// State Tests
// ============================================================================

#[test]
fn test_state_variables_merge_extra() {
    let mut extra = JsonObject::new();
    extra.insert("businessId".to_string(), json!("biz-1"));
    extra.insert("first".to_string(), json!(999));

    let options = PaginationOptions::new().page_size(25);
    let mut state = PaginationState::new();

    let vars = state.variables(&extra, &options);
    assert_eq!(vars["businessId"], json!("biz-1"));
    assert_eq!(vars["first"], json!(25));
    assert_eq!(vars["after"], Value::Null);

    state.cursor = Some("c1".to_string());
    assert_eq!(state.variables(&extra, &options)["after"], json!("c1"));
}

#[test]
fn test_state_record_page() {
    let mut state = PaginationState::new();

    let next = state
        .record_page(
            Connection {
                items: ids(0..2),
                page_info: Some(PageInfo {
                    has_next_page: true,
                    end_cursor: Some("c1".to_string()),
                }),
            },
            "clients",
        )
        .unwrap();
    assert_eq!(
        next,
        NextPage::Continue {
            cursor: "c1".to_string()
        }
    );
    assert_eq!(state.cursor.as_deref(), Some("c1"));

    let next = state
        .record_page(
            Connection {
                items: ids(2..3),
                page_info: None,
            },
            "clients",
        )
        .unwrap();
    assert!(next.is_done());
    assert_eq!(state.pages, 2);
    assert_eq!(state.items, ids(0..3));
}

#[test]
fn test_state_rejects_missing_end_cursor() {
    let mut state = PaginationState::new();
    let err = state
        .record_page(
            Connection {
                items: vec![],
                page_info: Some(PageInfo {
                    has_next_page: true,
                    end_cursor: None,
                }),
            },
            "clients",
        )
        .unwrap_err();
    assert!(matches!(err, Error::Shape { path, .. } if path == "clients.pageInfo"));
}

#[test]
fn test_options_defaults_and_validation() {
    let options = PaginationOptions::default();
    assert_eq!(options.page_size, 100);
    assert_eq!(options.max_pages, 100);
    assert_eq!(options.page_size_variable, "first");
    assert_eq!(options.cursor_variable, "after");
    assert!(options.validate().is_ok());

    assert!(PaginationOptions::new().page_size(0).validate().is_err());
    assert!(PaginationOptions::new().max_pages(0).validate().is_err());
}

// ============================================================================
// Walker Tests
// ============================================================================

#[tokio::test]
async fn test_three_pages_collected_in_order() {
    let server = MockServer::start().await;

    mount_page(&server, Value::Null, page(&ids(0..100), Some("c1"))).await;
    mount_page(&server, json!("c1"), page(&ids(100..200), Some("c2"))).await;
    mount_page(&server, json!("c2"), page(&ids(200..237), None)).await;

    let result = walker()
        .fetch_all_pages(
            &endpoint(&server),
            CLIENTS_QUERY,
            "business.clients",
            &JsonObject::new(),
            &PaginationOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.len(), 237);
    assert_eq!(result.pages, 3);
    assert!(!result.truncated);
    assert_eq!(result.items, ids(0..237));
}

#[tokio::test]
async fn test_safety_valve_truncates_without_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&ids(0..10), Some("more"))))
        .expect(5)
        .mount(&server)
        .await;

    let capture = WarningCapture::default();
    let warnings = capture.warnings.clone();
    let subscriber = tracing_subscriber::registry().with(capture);

    let options = PaginationOptions::new().page_size(10).max_pages(5);
    let result = walker()
        .fetch_all_pages(
            &endpoint(&server),
            CLIENTS_QUERY,
            "business.clients",
            &JsonObject::new(),
            &options,
        )
        .with_subscriber(subscriber)
        .await
        .unwrap();

    assert_eq!(result.len(), 50);
    assert_eq!(result.pages, 5);
    assert!(result.truncated);

    let captured = warnings.lock().unwrap();
    assert_eq!(captured.len(), 1, "expected one warning, got: {:?}", *captured);
    assert!(captured[0].contains("max_pages"), "{}", captured[0]);
    assert!(captured[0].contains("business.clients"), "{}", captured[0]);
}

#[tokio::test]
async fn test_last_allowed_page_completing_is_not_truncated() {
    let server = MockServer::start().await;

    mount_page(&server, Value::Null, page(&ids(0..2), Some("c1"))).await;
    mount_page(&server, json!("c1"), page(&ids(2..3), None)).await;

    let capture = WarningCapture::default();
    let warnings = capture.warnings.clone();

    let result = walker()
        .fetch_all_pages(
            &endpoint(&server),
            CLIENTS_QUERY,
            "business.clients",
            &JsonObject::new(),
            &PaginationOptions::new().max_pages(2),
        )
        .with_subscriber(tracing_subscriber::registry().with(capture))
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert!(!result.truncated);
    assert!(warnings.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_application_error_aborts_and_discards() {
    let server = MockServer::start().await;

    mount_page(&server, Value::Null, page(&ids(0..100), Some("c1"))).await;
    mount_page(
        &server,
        json!("c1"),
        json!({
            "data": null,
            "errors": [{"message": "Not authorized to access clients"}]
        }),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({"variables": {"after": "c2"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&ids(200..237), None)))
        .expect(0)
        .mount(&server)
        .await;

    let err = walker()
        .fetch_all_pages(
            &endpoint(&server),
            CLIENTS_QUERY,
            "business.clients",
            &JsonObject::new(),
            &PaginationOptions::default(),
        )
        .await
        .unwrap_err();

    match err {
        Error::Application { errors } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].message, "Not authorized to access clients");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_mid_walk_is_transparent() {
    let server = MockServer::start().await;

    mount_page(&server, Value::Null, page(&ids(0..3), Some("c1"))).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({"variables": {"after": "c1"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "API limit exceeded. Wait 2ms and try again."}]
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    mount_page(&server, json!("c1"), page(&ids(3..5), None)).await;

    let result = walker()
        .fetch_all_pages(
            &endpoint(&server),
            CLIENTS_QUERY,
            "business.clients",
            &JsonObject::new(),
            &PaginationOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.items, ids(0..5));
    assert_eq!(result.pages, 2);
}

#[tokio::test]
async fn test_unresolvable_collection_path_is_shape_error() {
    let server = MockServer::start().await;
    mount_page(&server, Value::Null, page(&ids(0..1), None)).await;

    let err = walker()
        .fetch_all_pages(
            &endpoint(&server),
            CLIENTS_QUERY,
            "business.appointments",
            &JsonObject::new(),
            &PaginationOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Shape { path, .. } if path == "business.appointments"));
}

#[tokio::test]
async fn test_missing_page_info_stops_after_one_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"locations": {"edges": [{"node": {"id": "loc-1"}}]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = walker()
        .fetch_all_pages(
            &endpoint(&server),
            "query { locations { edges { node { id } } } }",
            "locations",
            &JsonObject::new(),
            &PaginationOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.items, vec![json!({"id": "loc-1"})]);
    assert!(!result.truncated);
}

#[tokio::test]
async fn test_extra_and_renamed_variables_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_partial_json(json!({
            "variables": {"locationId": "loc-9", "limit": 20, "cursor": null}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&ids(0..1), None)))
        .expect(1)
        .mount(&server)
        .await;

    let mut extra = JsonObject::new();
    extra.insert("locationId".to_string(), json!("loc-9"));

    let options = PaginationOptions::new()
        .page_size(20)
        .variables("limit", "cursor");
    let result = walker()
        .fetch_all_pages(
            &endpoint(&server),
            CLIENTS_QUERY,
            "business.clients",
            &extra,
            &options,
        )
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn test_fetch_collections_keeps_request_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"categories": {"nodes": [{"name": "Hair"}, {"name": "Nails"}]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"items": {"nodes": [{"sku": "A"}]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let queries = vec![
        CollectionQuery::new(
            format!("{}/categories", server.uri()),
            "query { categories { nodes { name } } }",
            "categories",
        ),
        CollectionQuery::new(
            format!("{}/items", server.uri()),
            "query { items { nodes { sku } } }",
            "items",
        ),
    ];

    let results = walker().fetch_collections(&queries, 2).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].items, vec![json!({"name": "Hair"}), json!({"name": "Nails"})]);
    assert_eq!(results[1].items, vec![json!({"sku": "A"})]);
}

#[tokio::test]
async fn test_fetch_collections_fails_on_first_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"things": {"nodes": []}}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let queries = vec![
        CollectionQuery::new(format!("{}/ok", server.uri()), "{ things }", "things"),
        CollectionQuery::new(format!("{}/broken", server.uri()), "{ things }", "things"),
    ];

    let err = walker().fetch_collections(&queries, 4).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 403, .. }));
}
