// SPDX-FileCopyrightText: 2026 Flowline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process tests for the gateway routes.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use flowline_core::DeliveryStatus;
use flowline_gateway::{router, GatewayState};
use flowline_queue::{QueueTracker, TrackerOptions};
use flowline_test_utils::{admit_request, ManualClock};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> (Router, Arc<QueueTracker>) {
    let tracker = Arc::new(QueueTracker::with_clock(
        TrackerOptions::default(),
        Arc::new(ManualClock::new()),
    ));
    let app = router(GatewayState::new(tracker.clone(), "flowline-test"));
    (app, tracker)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn admission_body(index: u32) -> Value {
    json!({
        "flowId": "f1",
        "flowName": "Welcome",
        "instanceId": "i1",
        "instanceName": "Main",
        "recipientNumber": "5511999999999",
        "messageIndex": index,
        "totalMessages": 3
    })
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _tracker) = app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "flowline-test");
    assert_eq!(body["schedulerRunning"], false);
}

#[tokio::test]
async fn empty_queue_snapshot() {
    let (app, _tracker) = app();
    let response = app.oneshot(get("/v1/queue")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["activeQueues"], 0);
    assert_eq!(body["totalMessagesQueued"], 0);
    assert_eq!(body["processingSpeed"], 0.0);
    assert_eq!(body["queuedFlows"], json!([]));
}

#[tokio::test]
async fn admission_creates_then_merges() {
    let (app, tracker) = app();

    let created = app
        .clone()
        .oneshot(json_request(Method::POST, "/v1/queue/entries", admission_body(0)))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let first = body_json(created).await;
    assert_eq!(first["status"], "pending");

    let merged = app
        .clone()
        .oneshot(json_request(Method::POST, "/v1/queue/entries", admission_body(1)))
        .await
        .unwrap();
    assert_eq!(merged.status(), StatusCode::OK);
    let second = body_json(merged).await;
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["messageIndex"], 1);

    let snapshot = body_json(app.oneshot(get("/v1/queue")).await.unwrap()).await;
    assert_eq!(snapshot["activeQueues"], 1);
    assert_eq!(snapshot["totalMessagesQueued"], 2);
    assert_eq!(tracker.len(), 1);
}

#[tokio::test]
async fn merge_without_names_or_index_keeps_them() {
    let (app, _tracker) = app();

    let created = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/v1/queue/entries",
            json!({
                "flowId": "f1",
                "flowName": "Welcome",
                "instanceId": "i1",
                "instanceName": "Main",
                "recipientNumber": "5511999999999",
                "messageIndex": 3,
                "totalMessages": 5
            }),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let merged = app
        .oneshot(json_request(
            Method::POST,
            "/v1/queue/entries",
            json!({
                "flowId": "f1",
                "instanceId": "i1",
                "recipientNumber": "5511999999999",
                "totalMessages": 5,
                "status": "sending"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(merged.status(), StatusCode::OK);
    let body = body_json(merged).await;
    assert_eq!(body["flowName"], "Welcome");
    assert_eq!(body["instanceName"], "Main");
    assert_eq!(body["messageIndex"], 3);
    assert_eq!(body["status"], "sending");
}

#[tokio::test]
async fn malformed_admission_is_rejected() {
    let (app, tracker) = app();
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/v1/queue/entries",
            json!({"flowId": "f1"}),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert!(tracker.is_empty());
}

#[tokio::test]
async fn status_update_round_trip() {
    let (app, tracker) = app();
    let id = tracker.admit(admit_request("f1", "1", 3)).entry.id;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/v1/queue/entries/{id}/status"),
            json!({"status": "sent", "messageIndex": 3}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "sent");
    assert_eq!(body["messageIndex"], 3);

    // A finished entry is returned unchanged.
    let response = app
        .oneshot(json_request(
            Method::PUT,
            &format!("/v1/queue/entries/{id}/status"),
            json!({"status": "pending"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "sent");
    assert_eq!(tracker.get(&id).unwrap().status, DeliveryStatus::Sent);
}

#[tokio::test]
async fn status_update_for_unknown_entry_is_404() {
    let (app, _tracker) = app();
    let response = app
        .oneshot(json_request(
            Method::PUT,
            "/v1/queue/entries/missing/status",
            json!({"status": "sent"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn delete_removes_once() {
    let (app, tracker) = app();
    let id = tracker.admit(admit_request("f1", "1", 1)).entry.id;
    let uri = format!("/v1/queue/entries/{id}");

    let delete = |uri: String| {
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(delete(uri.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(tracker.is_empty());

    let response = app.oneshot(delete(uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn event_stream_carries_queue_changes() {
    let (app, tracker) = app();
    let response = app.oneshot(get("/v1/queue/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    // The subscription exists once the handler has run.
    let id = tracker.admit(admit_request("f1", "1", 1)).entry.id;
    tracker.remove(&id);

    let mut body = response.into_body().into_data_stream();
    let mut received = String::new();
    while !received.contains("event: flow-removed") {
        let chunk = tokio::time::timeout(Duration::from_secs(5), body.next())
            .await
            .expect("event within timeout")
            .expect("stream still open")
            .unwrap();
        received.push_str(&String::from_utf8_lossy(&chunk));
    }

    let added = received.find("event: flow-added").unwrap();
    let removed = received.find("event: flow-removed").unwrap();
    assert!(added < removed);
    assert!(received.contains(id.as_str()));
}
