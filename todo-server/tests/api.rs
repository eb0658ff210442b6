use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use rstest::rstest;
use serde_json::{Value, json};
use todo_core::{Database, Task};
use tower::ServiceExt;

async fn app() -> Router {
    todo_server::router(Database::in_memory().await.unwrap())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn create(app: &Router, body: Value) -> Task {
    let (status, value) = send(app, Method::POST, "/api/todos", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_value(value).unwrap()
}

fn texts(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["text"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn create_then_get_returns_defaults() {
    let app = app().await;

    let (status, value) = send(
        &app,
        Method::POST,
        "/api/todos",
        Some(json!({ "text": "Buy milk" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(value["text"], "Buy milk");
    assert_eq!(value["completed"], false);
    assert_eq!(value["priority"], "none");
    assert_eq!(value["due_date"], Value::Null);
    assert_eq!(value["order_index"], 1);

    let id = value["id"].as_i64().unwrap();
    let (status, fetched) = send(&app, Method::GET, &format!("/api/todos/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, value);
}

#[rstest]
#[case(json!({}))]
#[case(json!({ "text": "" }))]
#[case(json!({ "priority": "high" }))]
#[tokio::test]
async fn create_without_text_is_rejected(#[case] body: Value) {
    let app = app().await;

    let (status, value) = send(&app, Method::POST, "/api/todos", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["error"], "Text is required");

    let (_, list) = send(&app, Method::GET, "/api/todos", None).await;
    assert_eq!(list, json!([]));
}

#[rstest]
#[case(json!({ "text": "x", "priority": "urgent" }))]
#[case(json!({ "text": "x", "due_date": "next tuesday" }))]
#[case(json!({ "text": 42 }))]
#[tokio::test]
async fn malformed_create_bodies_are_bad_requests(#[case] body: Value) {
    let app = app().await;

    let (status, value) = send(&app, Method::POST, "/api/todos", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].is_string());
}

#[tokio::test]
async fn update_applies_partial_fields() {
    let app = app().await;
    let task = create(
        &app,
        json!({ "text": "call mom", "priority": "mid", "due_date": "2026-11-01" }),
    )
    .await;

    let (status, value) = send(
        &app,
        Method::PUT,
        &format!("/api/todos/{}", task.id),
        Some(json!({ "completed": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["completed"], true);
    assert_eq!(value["text"], "call mom");
    assert_eq!(value["priority"], "mid");
    assert_eq!(value["due_date"], "2026-11-01");

    let (_, value) = send(
        &app,
        Method::PUT,
        &format!("/api/todos/{}", task.id),
        Some(json!({ "due_date": null, "priority": "high" })),
    )
    .await;
    assert_eq!(value["due_date"], Value::Null);
    assert_eq!(value["priority"], "high");
    assert_eq!(value["completed"], true);
}

#[tokio::test]
async fn update_of_missing_todo_is_not_found() {
    let app = app().await;

    let (status, value) = send(
        &app,
        Method::PUT,
        "/api/todos/42",
        Some(json!({ "completed": true })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(value, json!({ "error": "Todo not found" }));
}

#[tokio::test]
async fn non_numeric_id_is_a_bad_request() {
    let app = app().await;

    let (status, value) = send(&app, Method::DELETE, "/api/todos/abc", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].is_string());
}

#[tokio::test]
async fn list_honours_sort_by() {
    let app = app().await;
    create(&app, json!({ "text": "plain" })).await;
    create(&app, json!({ "text": "later", "due_date": "2026-12-01" })).await;
    create(&app, json!({ "text": "urgent", "priority": "high" })).await;
    create(
        &app,
        json!({ "text": "sooner", "priority": "low", "due_date": "2026-10-20" }),
    )
    .await;

    let (_, value) = send(&app, Method::GET, "/api/todos", None).await;
    assert_eq!(texts(&value), vec!["plain", "later", "urgent", "sooner"]);

    let (_, value) = send(&app, Method::GET, "/api/todos?sortBy=priority", None).await;
    assert_eq!(texts(&value), vec!["urgent", "sooner", "plain", "later"]);

    let (_, value) = send(&app, Method::GET, "/api/todos?sortBy=dueDate", None).await;
    assert_eq!(texts(&value), vec!["sooner", "later", "plain", "urgent"]);

    let (_, value) = send(&app, Method::GET, "/api/todos?sortBy=bogus", None).await;
    assert_eq!(texts(&value), vec!["plain", "later", "urgent", "sooner"]);
}

#[rstest]
#[case("/api/todos?sortBy=priority&sortBy=dueDate")]
#[case("/api/todos?sortBy=%zz")]
#[tokio::test]
async fn unreadable_sort_query_falls_back_to_default(#[case] uri: &str) {
    let app = app().await;
    create(&app, json!({ "text": "plain" })).await;
    create(&app, json!({ "text": "urgent", "priority": "high" })).await;

    let (status, value) = send(&app, Method::GET, uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(texts(&value), vec!["plain", "urgent"]);
}

#[tokio::test]
async fn reorder_sets_positions() {
    let app = app().await;
    let a = create(&app, json!({ "text": "a" })).await;
    let b = create(&app, json!({ "text": "b" })).await;
    let c = create(&app, json!({ "text": "c" })).await;

    let (status, value) = send(
        &app,
        Method::POST,
        "/api/todos/reorder",
        Some(json!({ "todos": [{ "id": b.id }, { "id": c.id }, { "id": a.id }] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["message"], "Todos reordered successfully");

    let (_, value) = send(&app, Method::GET, "/api/todos", None).await;
    assert_eq!(texts(&value), vec!["b", "c", "a"]);
    let indexes: Vec<i64> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["order_index"].as_i64().unwrap())
        .collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[rstest]
#[case(json!({}))]
#[case(json!({ "todos": "a,b" }))]
#[case(json!({ "todos": [1, 2] }))]
#[tokio::test]
async fn reorder_requires_an_array_of_ids(#[case] body: Value) {
    let app = app().await;

    let (status, value) = send(&app, Method::POST, "/api/todos/reorder", Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["error"], "Todos array is required");
}

#[tokio::test]
async fn delete_removes_the_todo_once() {
    let app = app().await;
    let task = create(&app, json!({ "text": "temporary" })).await;
    let uri = format!("/api/todos/{}", task.id);

    let (status, value) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["message"], "Todo deleted successfully");

    let (_, list) = send(&app, Method::GET, "/api/todos", None).await;
    assert_eq!(list, json!([]));

    let (status, value) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(value["error"], "Todo not found");
}
