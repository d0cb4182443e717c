use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use server::{ServerState, router};

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    router(ServerState::new(engine))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header("x-member-id", user);
    }
    let request = match body {
        Some(body) => request
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_trip(app: &Router) -> String {
    let (status, fund) = send(
        app,
        "POST",
        "/funds",
        Some("an"),
        Some(json!({
            "name": "Đà Lạt trip",
            "display_name": "An",
            "members": [
                { "id": "binh", "display_name": "Bình" },
                { "id": "chi", "display_name": "Chi" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    fund["id"].as_str().unwrap().to_string()
}

fn dinner(amount: &str) -> Value {
    json!({
        "description": "Dinner",
        "amount": amount,
        "split": { "strategy": "even", "participants": ["an", "binh", "chi"] }
    })
}

#[tokio::test]
async fn requests_without_member_header_are_rejected() {
    let app = app().await;
    let (status, _) = send(&app, "GET", "/funds", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_and_list_funds() {
    let app = app().await;
    let fund_id = create_trip(&app).await;

    let (status, body) = send(&app, "GET", "/funds", Some("binh"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["funds"][0]["id"], fund_id);
    assert_eq!(body["funds"][0]["currency"], "VND");
    assert_eq!(body["funds"][0]["members"].as_array().unwrap().len(), 3);

    let (status, _) = send(
        &app,
        "POST",
        "/funds",
        Some("an"),
        Some(json!({ "name": "đà lạt TRIP", "display_name": "An" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn outsiders_get_not_found() {
    let app = app().await;
    let fund_id = create_trip(&app).await;

    let (status, _) = send(&app, "GET", &format!("/funds/{fund_id}/balances"), Some("eve"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn appended_transaction_moves_balances() {
    let app = app().await;
    let fund_id = create_trip(&app).await;

    let (status, created) = send(
        &app,
        "POST",
        &format!("/funds/{fund_id}/transactions"),
        Some("an"),
        Some(dinner("100000")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["transaction"]["total_minor"], 100_000);
    assert_eq!(created["transaction"]["split_kind"], "even");

    let (status, body) = send(&app, "GET", &format!("/funds/{fund_id}/balances"), Some("chi"), None).await;
    assert_eq!(status, StatusCode::OK);
    let amounts: Vec<(String, i64)> = body["balances"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| (b["member_id"].as_str().unwrap().to_string(), b["amount_minor"].as_i64().unwrap()))
        .collect();
    assert_eq!(
        amounts,
        vec![
            ("an".to_string(), 66_666),
            ("binh".to_string(), -33_333),
            ("chi".to_string(), -33_333),
        ]
    );

    let (status, body) = send(&app, "GET", &format!("/funds/{fund_id}/settlement"), Some("an"), None).await;
    assert_eq!(status, StatusCode::OK);
    let transfers = body["transfers"].as_array().unwrap();
    assert_eq!(transfers.len(), 2);
    assert!(transfers.iter().all(|t| t["to"] == "an"));
}

#[tokio::test]
async fn rejected_submission_lists_every_issue() {
    let app = app().await;
    let fund_id = create_trip(&app).await;

    let mut body = dinner("0");
    body["description"] = json!("");
    let (status, body) = send(
        &app,
        "POST",
        &format!("/funds/{fund_id}/transactions"),
        Some("an"),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let fields: Vec<&str> = body["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"description"));
    assert!(fields.contains(&"amount"));

    let (_, page) = send(&app, "GET", &format!("/funds/{fund_id}/transactions"), Some("an"), None).await;
    assert!(page["transactions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn preview_reports_without_storing() {
    let app = app().await;
    let fund_id = create_trip(&app).await;

    let body = json!({
        "description": "Hotel",
        "amount": "1000000",
        "split": {
            "strategy": "percentage",
            "shares": [
                { "member_id": "an", "percent": "33.34" },
                { "member_id": "binh", "percent": "33.33" },
                { "member_id": "chi", "percent": "33.33" }
            ]
        }
    });
    let (status, draft) = send(
        &app,
        "POST",
        &format!("/funds/{fund_id}/transactions/preview"),
        Some("an"),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["acceptable"], true);
    assert_eq!(draft["split_kind"], "percentage");
    let sum: i64 = draft["splits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["amount_minor"].as_i64().unwrap())
        .sum();
    assert_eq!(sum, 0);

    let (_, page) = send(&app, "GET", &format!("/funds/{fund_id}/transactions"), Some("an"), None).await;
    assert!(page["transactions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn quick_parse_returns_a_draft() {
    let app = app().await;
    let fund_id = create_trip(&app).await;

    let (status, draft) = send(
        &app,
        "POST",
        &format!("/funds/{fund_id}/transactions/parse"),
        Some("an"),
        Some(json!({ "text": "I paid 90k for coffee with Bình and Chi" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(draft["total_minor"], 90_000);
    assert_eq!(draft["paid_by"], "an");
    assert_eq!(draft["split_kind"], "ai_derived");
    assert_eq!(draft["acceptable"], true);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/funds/{fund_id}/transactions/parse"),
        Some("an"),
        Some(json!({ "text": "hello there" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn voided_transaction_stops_counting() {
    let app = app().await;
    let fund_id = create_trip(&app).await;

    let (_, created) = send(
        &app,
        "POST",
        &format!("/funds/{fund_id}/transactions"),
        Some("an"),
        Some(dinner("90000")),
    )
    .await;
    let tx_id = created["transaction"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/funds/{fund_id}/transactions/{tx_id}/void"),
        Some("chi"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, voided) = send(
        &app,
        "POST",
        &format!("/funds/{fund_id}/transactions/{tx_id}/void"),
        Some("an"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voided["voided"], true);

    let (_, body) = send(&app, "GET", &format!("/funds/{fund_id}/balances"), Some("an"), None).await;
    assert!(
        body["balances"]
            .as_array()
            .unwrap()
            .iter()
            .all(|b| b["amount_minor"] == 0)
    );
}

#[tokio::test]
async fn transactions_are_paginated() {
    let app = app().await;
    let fund_id = create_trip(&app).await;
    for amount in ["30000", "60000", "90000"] {
        let (status, _) = send(
            &app,
            "POST",
            &format!("/funds/{fund_id}/transactions"),
            Some("an"),
            Some(dinner(amount)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, first) = send(
        &app,
        "GET",
        &format!("/funds/{fund_id}/transactions?limit=2"),
        Some("binh"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["transactions"].as_array().unwrap().len(), 2);
    let cursor = first["next_cursor"].as_str().unwrap().to_string();

    let (status, second) = send(
        &app,
        "GET",
        &format!("/funds/{fund_id}/transactions?limit=2&cursor={cursor}"),
        Some("binh"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["transactions"].as_array().unwrap().len(), 1);
    assert!(second["next_cursor"].is_null());

    let (status, _) = send(
        &app,
        "GET",
        &format!("/funds/{fund_id}/transactions?cursor=not-a-cursor"),
        Some("binh"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn member_management() {
    let app = app().await;
    let fund_id = create_trip(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/funds/{fund_id}/members"),
        Some("binh"),
        Some(json!({ "id": "dung", "display_name": "Dũng" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, member) = send(
        &app,
        "POST",
        &format!("/funds/{fund_id}/members"),
        Some("an"),
        Some(json!({ "id": "dung", "display_name": "Dũng" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["display_name"], "Dũng");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/funds/{fund_id}/members/dung"),
        Some("dung"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", &format!("/funds/{fund_id}/members"), Some("an"), None).await;
    assert_eq!(body["members"].as_array().unwrap().len(), 3);

    let (status, _) = send(&app, "DELETE", &format!("/funds/{fund_id}"), Some("an"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn malformed_transaction_id_gets_json_error() {
    let app = app().await;
    let fund_id = create_trip(&app).await;

    for (method, uri) in [
        ("GET", format!("/funds/{fund_id}/transactions/not-a-uuid")),
        ("POST", format!("/funds/{fund_id}/transactions/not-a-uuid/void")),
    ] {
        let (status, body) = send(&app, method, &uri, Some("an"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .contains("invalid transaction id")
        );
    }
}
