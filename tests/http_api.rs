//! End-to-end tests of the REST surface over the in-memory store.

#![allow(clippy::panic, missing_docs)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use mplus_archive::api::build_app;
use mplus_archive::app_state::AppState;
use mplus_archive::domain::{LogType, NewLogEntry};
use mplus_archive::persistence::Storage;
use mplus_archive::persistence::memory::MemoryStore;

fn app() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(Arc::clone(&store) as Arc<dyn Storage>);
    (store, build_app(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    let Ok(request) = request else {
        panic!("request build failed");
    };
    let Ok(response) = app.clone().oneshot(request).await else {
        panic!("router call failed");
    };
    let status = response.status();
    let Ok(collected) = response.into_body().collect().await else {
        panic!("body read failed");
    };
    let bytes = collected.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn profile(name: &str, realm: &str, score: f64) -> Value {
    json!({
        "name": name,
        "realm": realm,
        "region": "eu",
        "class": "Mage",
        "last_crawled_at": "2024-03-01T08:00:00Z",
        "mythic_plus_scores_by_season": [{"season": "current", "scores": {"all": score}}]
    })
}

#[tokio::test]
async fn archive_lookup_and_delete_round_trip() {
    let (_, app) = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/characters",
        Some(profile("Thrall", "draenor", 3000.5)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Character archived successfully");

    let (status, body) = send(&app, Method::GET, "/api/v1/characters/eu/draenor/Thrall", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 3000.5);
    assert_eq!(body["raw_data"], profile("Thrall", "draenor", 3000.5));
    assert_eq!(body["last_crawled_at"], "2024-03-01T08:00:00Z");

    let (status, _) = send(&app, Method::DELETE, "/api/v1/characters/eu/draenor/Thrall", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/v1/characters/eu/draenor/Thrall", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Character not found in local archive");
}

#[tokio::test]
async fn reupsert_overwrites_payload_but_keeps_created_at() {
    let (_, app) = app();
    let _ = send(&app, Method::POST, "/api/v1/characters", Some(profile("Jaina", "kazzak", 1.0))).await;
    let (_, before) = send(&app, Method::GET, "/api/v1/characters/eu/kazzak/Jaina", None).await;

    let _ = send(&app, Method::POST, "/api/v1/characters", Some(profile("Jaina", "kazzak", 2.0))).await;
    let (_, after) = send(&app, Method::GET, "/api/v1/characters/eu/kazzak/Jaina", None).await;

    assert_eq!(after["score"], 2.0);
    assert_eq!(after["created_at"], before["created_at"]);
    assert_eq!(after["id"], before["id"]);

    let (_, all) = send(&app, Method::GET, "/api/v1/characters", None).await;
    assert_eq!(all.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn archive_requires_name_and_realm() {
    let (store, app) = app();
    for body in [json!({"realm": "kazzak"}), json!({"name": "A"}), json!("nope")] {
        let (status, body) = send(&app, Method::POST, "/api/v1/characters", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid character data");
    }
    assert_eq!(store.character_count().await, 0);
}

#[tokio::test]
async fn missing_region_defaults_to_eu() {
    let (_, app) = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/characters",
        Some(json!({"name": "Sylvanas", "realm": "silvermoon"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&app, Method::GET, "/api/v1/characters/eu/silvermoon/Sylvanas", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 0.0);
}

#[tokio::test]
async fn delete_of_unknown_character_is_404() {
    let (_, app) = app();
    let (status, body) = send(&app, Method::DELETE, "/api/v1/characters/us/area-52/Nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Character not found in archive");

    let (status, _) = send(&app, Method::GET, "/api/v1/characters/xx/area-52/Nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lookup_matches_region_exactly_as_stored() {
    let (store, app) = app();
    let _ = send(&app, Method::POST, "/api/v1/characters", Some(profile("Thrall", "draenor", 1.0))).await;
    let _ = store
        .insert_raw_character("Anduin", "draenor", "EU", Some(json!({"name": "Anduin"})), Utc::now())
        .await;

    let (status, _) = send(&app, Method::GET, "/api/v1/characters/EU/draenor/Thrall", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, "/api/v1/characters/eu/draenor/Anduin", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, "/api/v1/characters/EU/draenor/Anduin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["region"], "EU");

    let (status, _) = send(&app, Method::DELETE, "/api/v1/characters/EU/draenor/Anduin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.character_count().await, 1);
}

#[tokio::test]
async fn listing_repairs_legacy_rows_and_nulls_garbage() {
    let (store, app) = app();
    let old = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
    let older = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
    let _ = store
        .insert_raw_character("Legacy", "kazzak", "eu", Some(json!("{\"a\":1}")), old)
        .await;
    let _ = store
        .insert_raw_character("Garbage", "kazzak", "eu", Some(json!("[1,2]")), older)
        .await;
    let _ = send(&app, Method::POST, "/api/v1/characters", Some(profile("Fresh", "kazzak", 5.0))).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/characters", None).await;
    assert_eq!(status, StatusCode::OK);
    let Some(rows) = body.as_array() else {
        panic!("expected array");
    };
    let names: Vec<&str> = rows.iter().filter_map(|r| r["name"].as_str()).collect();
    assert_eq!(names, ["Fresh", "Legacy", "Garbage"]);
    assert_eq!(rows.get(1).map(|r| r["raw_data"].clone()), Some(json!({"a": 1})));
    assert_eq!(rows.get(2).map(|r| r["raw_data"].clone()), Some(Value::Null));

    let (_, logs) = send(&app, Method::GET, "/api/v1/logs", None).await;
    let logged = logs
        .as_array()
        .is_some_and(|l| l.iter().any(|e| e["log_type"] == "ERROR"));
    assert!(logged, "the unparseable row must be reported to the log");
}

#[tokio::test]
async fn log_post_validates_and_records() {
    let (_, app) = app();
    let (status, body) = send(&app, Method::POST, "/api/v1/logs", Some(json!({"message": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing type or message");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/logs",
        Some(json!({"type": "ERROR", "message": "client crash", "stack": "at App.vue:12", "details": {"route": "/stats"}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::GET, "/api/v1/logs", None).await;
    assert_eq!(status, StatusCode::OK);
    let Some(first) = body.as_array().and_then(|a| a.first()) else {
        panic!("log entry missing");
    };
    assert_eq!(first["log_type"], "ERROR");
    assert_eq!(first["stack"], "at App.vue:12");
    assert_eq!(first["details"], json!({"route": "/stats"}));
}

#[tokio::test]
async fn log_query_honours_inclusive_range_and_cap() {
    let (store, app) = app();
    for day in 1..=31 {
        for hour in [0, 6, 12, 18, 23] {
            let Some(ts) = Utc.with_ymd_and_hms(2024, 1, day, hour, 30, 0).single() else {
                panic!("invalid fixture date");
            };
            let _ = store
                .insert_log_at(&NewLogEntry::new(LogType::Info, format!("{day}/{hour}")), ts)
                .await;
        }
    }
    for (y, m, d) in [(2023, 12, 31), (2024, 2, 1)] {
        let Some(ts) = Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).single() else {
            panic!("invalid fixture date");
        };
        let _ = store
            .insert_log_at(&NewLogEntry::new(LogType::Warning, "outside"), ts)
            .await;
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/logs?from=2024-01-01&to=2024-01-31", None).await;
    assert_eq!(status, StatusCode::OK);
    let Some(entries) = body.as_array() else {
        panic!("expected array");
    };
    assert_eq!(entries.len(), 100);
    assert!(entries.iter().all(|e| e["message"] != "outside"));
    assert_eq!(entries.first().map(|e| e["message"].clone()), Some(json!("31/23")));
    let stamps: Vec<&str> = entries.iter().filter_map(|e| e["created_at"].as_str()).collect();
    assert!(stamps.windows(2).all(|w| matches!(w, [a, b] if a >= b)));

    let (status, _) = send(&app, Method::GET, "/api/v1/logs?from=not-a-date", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_identical_archives_produce_one_row() {
    let (store, app) = app();
    let mut handles = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            send(&app, Method::POST, "/api/v1/characters", Some(profile("Race", "kazzak", f64::from(i)))).await
        }));
    }
    for handle in handles {
        let Ok((status, _)) = handle.await else {
            panic!("task panicked");
        };
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(store.character_count().await, 1);
}

#[tokio::test]
async fn storage_outage_surfaces_generic_500() {
    let (store, app) = app();
    store.close().await;
    let (status, body) = send(&app, Method::POST, "/api/v1/characters", Some(profile("A", "b", 1.0))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal storage error");

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["storage"], "down");

    let (status, _) = send(&app, Method::POST, "/api/v1/logs", Some(json!({"type": "INFO", "message": "m"}))).await;
    assert_eq!(status, StatusCode::CREATED);
}
