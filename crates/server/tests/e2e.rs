use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use service::errors::ServiceError;
use service::storage::{GroupStore, MemoryGroupStore};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use server::routes;
use server::state::AppState;

struct TestApp {
    base_url: String,
}

/// Store whose every operation fails like an unreachable Redis.
struct FailingStore;

fn store_down() -> ServiceError {
    ServiceError::Store(redis::RedisError::from(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    )))
}

#[async_trait]
impl GroupStore for FailingStore {
    async fn put(&self, _group: &str, _id: &str, _value: &str) -> Result<(), ServiceError> {
        Err(store_down())
    }

    async fn remove(&self, _group: &str, _id: &str) -> Result<u64, ServiceError> {
        Err(store_down())
    }

    async fn list(&self, _group: &str) -> Result<HashMap<String, String>, ServiceError> {
        Err(store_down())
    }
}

async fn start_server() -> anyhow::Result<TestApp> {
    start_server_with(Arc::new(MemoryGroupStore::new())).await
}

async fn start_server_with(store: Arc<dyn GroupStore>) -> anyhow::Result<TestApp> {
    let state = AppState::new(store);
    let app: Router = routes::build_router(state, CorsLayer::very_permissive());

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

impl TestApp {
    async fn set(&self, body: Value) -> anyhow::Result<(HttpStatusCode, Value)> {
        let res = client().post(format!("{}/set", self.base_url)).json(&body).send().await?;
        Ok((res.status(), res.json().await?))
    }

    async fn del(&self, body: Value) -> anyhow::Result<(HttpStatusCode, Value)> {
        let res = client().delete(format!("{}/del", self.base_url)).json(&body).send().await?;
        Ok((res.status(), res.json().await?))
    }

    async fn list(&self, group: &str) -> anyhow::Result<(HttpStatusCode, Value)> {
        let res = client()
            .get(format!("{}/list", self.base_url))
            .query(&[("group", group)])
            .send()
            .await?;
        Ok((res.status(), res.json().await?))
    }
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_set_then_list_round_trip() -> anyhow::Result<()> {
    let app = start_server().await?;

    let (status, body) = app.set(json!({"group": "g", "value": {"x": 1}})).await?;
    assert_eq!(status, HttpStatusCode::CREATED);
    assert_eq!(body, json!({"code": 0, "msg": "success"}));

    let (status, body) = app.list("g").await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["msg"], "success");
    assert_eq!(body["group"], "g");
    let values = body["values"].as_object().expect("values object");
    assert_eq!(values.len(), 1);
    let (id, value) = values.iter().next().expect("one entry");
    assert_eq!(id, "27958648a9e57fcd66ae5e31ff3359e9");
    assert_eq!(value, &json!({"x": 1}));
    Ok(())
}

#[tokio::test]
async fn e2e_upsert_is_idempotent_across_key_order() -> anyhow::Result<()> {
    let app = start_server().await?;
    let raw_a = r#"{"group":"g","value":{"a":1,"b":2}}"#;
    let raw_b = r#"{"group":"g","value":{"b":2,"a":1}}"#;
    for raw in [raw_a, raw_b, raw_a] {
        let res = client()
            .post(format!("{}/set", app.base_url))
            .header("content-type", "application/json")
            .body(raw)
            .send()
            .await?;
        assert_eq!(res.status(), HttpStatusCode::CREATED);
    }

    let (_, body) = app.list("g").await?;
    let values = body["values"].as_object().expect("values object");
    assert_eq!(values.len(), 1);
    assert_eq!(values.get("8aacdb17187e6acf2b175d4aa08d7213"), Some(&json!({"a": 1, "b": 2})));
    Ok(())
}

#[tokio::test]
async fn e2e_delete_then_list_is_empty() -> anyhow::Result<()> {
    let app = start_server().await?;
    app.set(json!({"group": "g", "value": [1, 2, 3]})).await?;
    let (_, body) = app.list("g").await?;
    let id = body["values"].as_object().and_then(|m| m.keys().next().cloned()).expect("item id");

    let (status, body) = app.del(json!({"group": "g", "value_id": id})).await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body, json!({"code": 0, "msg": "success"}));

    let (status, body) = app.list("g").await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["values"], json!({}));
    Ok(())
}

#[tokio::test]
async fn e2e_set_missing_value_is_bad_request() -> anyhow::Result<()> {
    let app = start_server().await?;
    for body in [json!({"group": "g"}), json!({"group": "g", "value": null}), json!({"group": "", "value": 1}), json!({"value": 1})] {
        let (status, resp) = app.set(body).await?;
        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(resp, json!({"code": -1, "msg": "missing group or value"}));
    }
    Ok(())
}

#[tokio::test]
async fn e2e_set_malformed_body_is_bad_request() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client()
        .post(format!("{}/set", app.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], -1);
    Ok(())
}

#[tokio::test]
async fn e2e_delete_unknown_is_not_found() -> anyhow::Result<()> {
    let app = start_server().await?;
    app.set(json!({"group": "g", "value": "kept"})).await?;

    let (status, body) = app.del(json!({"group": "g", "value_id": "0123456789abcdef0123456789abcdef"})).await?;
    assert_eq!(status, HttpStatusCode::NOT_FOUND);
    assert_eq!(body, json!({"code": -1, "msg": "value not found in group g"}));

    let (_, body) = app.list("g").await?;
    assert_eq!(body["values"].as_object().map(|m| m.len()), Some(1));
    Ok(())
}

#[tokio::test]
async fn e2e_delete_missing_fields_is_bad_request() -> anyhow::Result<()> {
    let app = start_server().await?;
    for body in [json!({"group": "g"}), json!({"value_id": "abc"}), json!({"group": "g", "value_id": null})] {
        let (status, resp) = app.del(body).await?;
        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(resp, json!({"code": -1, "msg": "missing group or value_id"}));
    }
    Ok(())
}

#[tokio::test]
async fn e2e_list_without_group_is_bad_request() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client().get(format!("{}/list", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?, json!({"code": -1, "msg": "missing group"}));

    let (status, _) = app.list("").await?;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn e2e_groups_are_isolated() -> anyhow::Result<()> {
    let app = start_server().await?;
    app.set(json!({"group": "a", "value": {"only": "a"}})).await?;

    let (status, body) = app.list("b").await?;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["group"], "b");
    assert_eq!(body["values"], json!({}));
    Ok(())
}

#[tokio::test]
async fn e2e_cors_allows_any_origin() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client()
        .get(format!("{}/list", app.base_url))
        .query(&[("group", "g")])
        .header("origin", "https://elsewhere.example")
        .send()
        .await?;
    assert!(res.headers().contains_key("access-control-allow-origin"));
    Ok(())
}

#[tokio::test]
async fn e2e_store_failure_is_internal_error() -> anyhow::Result<()> {
    let app = start_server_with(Arc::new(FailingStore)).await?;
    let expected = json!({"code": -1, "msg": "internal server error"});

    let (status, body) = app.set(json!({"group": "g", "value": {"x": 1}})).await?;
    assert_eq!(status, HttpStatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, expected);

    let (status, body) = app.del(json!({"group": "g", "value_id": "27958648a9e57fcd66ae5e31ff3359e9"})).await?;
    assert_eq!(status, HttpStatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, expected);

    let (status, body) = app.list("g").await?;
    assert_eq!(status, HttpStatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, expected);
    Ok(())
}

#[tokio::test]
async fn e2e_validation_runs_before_store() -> anyhow::Result<()> {
    let app = start_server_with(Arc::new(FailingStore)).await?;
    let (status, body) = app.set(json!({"group": "g"})).await?;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"code": -1, "msg": "missing group or value"}));
    Ok(())
}
