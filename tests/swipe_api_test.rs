use std::env;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

use marketplace_backend::dto::listing_dto::CreateListingPayload;
use marketplace_backend::models::listing::ListingKind;
use marketplace_backend::store::{MemoryStore, SharedStore};

async fn setup_app() -> (Router, marketplace_backend::AppState) {
    dotenvy::dotenv().ok();
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("STORE_BACKEND", "memory");
    env::set_var("PUBLIC_RPS", "1000");
    env::set_var("API_RPS", "1000");
    env::set_var("WELCOME_GRANT_POINTS", "0");
    // A sibling test in this binary may have initialized it already.
    marketplace_backend::config::init_config().ok();

    let store: SharedStore = Arc::new(MemoryStore::new());
    let state = marketplace_backend::AppState::new(store);

    let app = Router::new()
        .route(
            "/api/swipe/session",
            get(marketplace_backend::routes::swipe::current_state)
                .post(marketplace_backend::routes::swipe::start_session),
        )
        .route(
            "/api/swipe/gesture",
            post(marketplace_backend::routes::swipe::gesture),
        )
        .route(
            "/api/swipe/act",
            post(marketplace_backend::routes::swipe::act),
        )
        .route(
            "/api/swipe/undo",
            post(marketplace_backend::routes::swipe::undo),
        )
        .route(
            "/api/swipe/fullscreen",
            post(marketplace_backend::routes::swipe::toggle_fullscreen),
        )
        .route(
            "/api/actions/:category",
            get(marketplace_backend::routes::swipe::list_actioned_listings),
        )
        .route(
            "/api/actions/:category/:id",
            delete(marketplace_backend::routes::swipe::remove_action),
        )
        .route(
            "/api/points/summary",
            get(marketplace_backend::routes::points::get_summary),
        )
        .route(
            "/api/applications",
            get(marketplace_backend::routes::applications::list_my_applications),
        )
        .route(
            "/api/notifications",
            get(marketplace_backend::routes::notifications::poll_notifications),
        )
        .layer(axum::middleware::from_fn(
            marketplace_backend::middleware::auth::require_bearer_auth,
        ))
        .with_state(state.clone());

    (app, state)
}

fn seeker_token() -> String {
    marketplace_backend::utils::token::issue_token(
        Uuid::new_v4(),
        "seeker",
        chrono::Duration::hours(1),
    )
    .expect("token")
}

async fn seed_listing(
    state: &marketplace_backend::AppState,
    title: &str,
    minimum_points: i64,
) -> Uuid {
    let listing = state
        .listings_service
        .create(
            Uuid::new_v4(),
            CreateListingPayload {
                kind: ListingKind::Job,
                title: title.to_string(),
                company: "Acme".to_string(),
                location: "Remote".to_string(),
                category: None,
                experience_level: None,
                education_level: None,
                salary_from: None,
                salary_to: None,
                description: None,
                minimum_points: Some(minimum_points),
                requires_application: None,
                status: Some("published".to_string()),
            },
        )
        .await
        .expect("seed listing");
    listing.id
}

async fn send_get(app: &Router, uri: &str, token: &str) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn send_post(
    app: &Router,
    uri: &str,
    token: &str,
    body: JsonValue,
) -> (StatusCode, JsonValue) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test(start_paused = true)]
async fn swipe_right_commits_after_the_undo_window() {
    let (app, state) = setup_app().await;
    let first = seed_listing(&state, "Backend Engineer", 0).await;
    seed_listing(&state, "Data Analyst", 0).await;
    let token = seeker_token();

    let (status, session) = send_post(&app, "/api/swipe/session", &token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["phase"], "idle");
    assert_eq!(session["total"], 2);
    assert_eq!(session["index"], 0);
    assert_eq!(session["current"]["title"], "Backend Engineer");

    // A short drag snaps back without doing anything.
    let (status, outcome) =
        send_post(&app, "/api/swipe/gesture", &token, json!({"dx": 60.0, "dy": 5.0})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["accepted"], false);
    assert_eq!(outcome["state"]["phase"], "idle");

    let (_, outcome) =
        send_post(&app, "/api/swipe/gesture", &token, json!({"dx": 160.0, "dy": 8.0})).await;
    assert_eq!(outcome["accepted"], true);
    assert_eq!(outcome["state"]["phase"], "settling");
    assert_eq!(outcome["state"]["index"], 1);
    assert_eq!(outcome["state"]["pending"]["action"], "applied");
    assert_eq!(outcome["state"]["pending"]["listing_id"], first.to_string());

    // More gestures while one action is settling are dropped.
    let (_, outcome) =
        send_post(&app, "/api/swipe/gesture", &token, json!({"dx": -200.0, "dy": 0.0})).await;
    assert_eq!(outcome["accepted"], false);

    tokio::time::advance(std::time::Duration::from_millis(4001)).await;

    let (_, session) = send_get(&app, "/api/swipe/session", &token).await;
    assert_eq!(session["phase"], "idle");
    assert_eq!(session["index"], 1);
    assert_eq!(session["current"]["title"], "Data Analyst");

    let (_, summary) = send_get(&app, "/api/points/summary", &token).await;
    assert_eq!(summary["earned"], 10);
    assert_eq!(summary["spent"], 0);
    assert_eq!(summary["balance"], 10);

    let (_, applications) = send_get(&app, "/api/applications", &token).await;
    assert_eq!(applications.as_array().unwrap().len(), 1);

    let (_, shelf) = send_get(&app, "/api/actions/applied", &token).await;
    assert_eq!(shelf["items"].as_array().unwrap().len(), 1);
    assert_eq!(shelf["items"][0]["id"], first.to_string());
}

#[tokio::test(start_paused = true)]
async fn undo_within_the_window_restores_the_card() {
    let (app, state) = setup_app().await;
    let listing = seed_listing(&state, "Backend Engineer", 0).await;
    let token = seeker_token();

    send_post(&app, "/api/swipe/session", &token, json!({})).await;
    let (_, outcome) =
        send_post(&app, "/api/swipe/gesture", &token, json!({"dx": 140.0, "dy": -20.0})).await;
    assert_eq!(outcome["state"]["phase"], "settling");

    tokio::time::advance(std::time::Duration::from_millis(1000)).await;

    let (status, outcome) = send_post(&app, "/api/swipe/undo", &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["accepted"], true);
    assert_eq!(outcome["state"]["phase"], "idle");
    assert_eq!(outcome["state"]["index"], 0);
    assert_eq!(outcome["state"]["current"]["id"], listing.to_string());

    // The cancelled timer must not fire later.
    tokio::time::advance(std::time::Duration::from_millis(6000)).await;

    let (_, summary) = send_get(&app, "/api/points/summary", &token).await;
    assert_eq!(summary["earned"], 0);
    assert_eq!(summary["balance"], 0);

    let (_, applications) = send_get(&app, "/api/applications", &token).await;
    assert!(applications.as_array().unwrap().is_empty());

    let (_, shelf) = send_get(&app, "/api/actions/applied", &token).await;
    assert!(shelf["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn apply_needs_the_listing_minimum_points() {
    let (app, state) = setup_app().await;
    seed_listing(&state, "Senior Architect", 25).await;
    let token = seeker_token();

    send_post(&app, "/api/swipe/session", &token, json!({})).await;
    let (status, outcome) =
        send_post(&app, "/api/swipe/gesture", &token, json!({"dx": 200.0, "dy": 0.0})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["accepted"], false);
    let notice = outcome["notice"].as_str().unwrap();
    assert!(notice.contains("25"), "notice was: {}", notice);
    assert_eq!(outcome["state"]["phase"], "idle");
    assert_eq!(outcome["state"]["index"], 0);

    let (_, summary) = send_get(&app, "/api/points/summary", &token).await;
    assert_eq!(summary["earned"], 0);
    assert_eq!(summary["spent"], 0);

    let (_, notifications) = send_get(&app, "/api/notifications?unread=true", &token).await;
    let items = notifications.as_array().unwrap();
    assert!(!items.is_empty());
    assert_eq!(items[0]["severity"], "warning");
}

#[tokio::test(start_paused = true)]
async fn saving_keeps_the_card_in_the_queue() {
    let (app, state) = setup_app().await;
    let saved = seed_listing(&state, "Backend Engineer", 0).await;
    seed_listing(&state, "Data Analyst", 0).await;
    let token = seeker_token();

    send_post(&app, "/api/swipe/session", &token, json!({})).await;
    let (_, outcome) =
        send_post(&app, "/api/swipe/act", &token, json!({"action": "saved"})).await;
    assert_eq!(outcome["accepted"], true);
    assert_eq!(outcome["state"]["pending"]["action"], "saved");

    tokio::time::advance(std::time::Duration::from_millis(4001)).await;

    // Polling the session settles the expired action.
    let (_, session) = send_get(&app, "/api/swipe/session", &token).await;
    assert_eq!(session["phase"], "idle");

    let (_, shelf) = send_get(&app, "/api/actions/saved", &token).await;
    assert_eq!(shelf["items"].as_array().unwrap().len(), 1);

    // A saved listing is not excluded from a rebuilt queue.
    let (_, session) = send_post(&app, "/api/swipe/session", &token, json!({})).await;
    assert_eq!(session["total"], 2);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/actions/saved/{}", saved))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let (_, shelf) = send_get(&app, "/api/actions/saved", &token).await;
    assert!(shelf["items"].as_array().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn blocking_excludes_the_listing_from_future_queues() {
    let (app, state) = setup_app().await;
    seed_listing(&state, "Backend Engineer", 0).await;
    let kept = seed_listing(&state, "Data Analyst", 0).await;
    let token = seeker_token();

    send_post(&app, "/api/swipe/session", &token, json!({})).await;
    let (_, outcome) =
        send_post(&app, "/api/swipe/gesture", &token, json!({"dx": 10.0, "dy": 180.0})).await;
    assert_eq!(outcome["state"]["pending"]["action"], "blocked");

    tokio::time::advance(std::time::Duration::from_millis(4001)).await;

    let (_, session) = send_post(&app, "/api/swipe/session", &token, json!({})).await;
    assert_eq!(session["total"], 1);
    assert_eq!(session["current"]["id"], kept.to_string());
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let (app, _state) = setup_app().await;

    let req = Request::builder()
        .method("GET")
        .uri("/api/swipe/session")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("GET")
        .uri("/api/swipe/session")
        .header("authorization", "Basic abc")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("GET")
        .uri("/api/swipe/session")
        .header("authorization", "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
