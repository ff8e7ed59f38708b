//! Tests for the REST routes, driven in-process.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use tempfile::{NamedTempFile, TempDir};
use tower::ServiceExt;

use tictactoe_api::{
    AppState, ChannelTaskQueue, GameRepository, GameService, MemoryCache, ReminderJob,
    SpoolMailer, router,
};

struct TestApp {
    _db: NamedTempFile,
    spool: TempDir,
    app: Router,
}

fn setup() -> TestApp {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let repository = GameRepository::new(db_path).expect("Failed to create repository");
    repository.run_migrations().expect("Migrations failed");

    let (tasks, _receiver) = ChannelTaskQueue::new();
    let service = GameService::with_rng(
        repository.clone(),
        Arc::new(MemoryCache::new()),
        Arc::new(tasks),
        StdRng::seed_from_u64(11),
    );

    let spool = tempfile::tempdir().expect("Failed to create spool dir");
    let mailer = SpoolMailer::new(spool.path().to_path_buf()).expect("Spool failed");
    let reminders = ReminderJob::new(
        repository,
        Arc::new(mailer),
        "noreply@tictactoe.local".to_string(),
        "http://localhost:3000".to_string(),
    );

    let app = router(AppState::new(Arc::new(service), Arc::new(reminders)));
    TestApp {
        _db: db_file,
        spool,
        app,
    }
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Bad request");

    let response = app.clone().oneshot(request).await.expect("Router failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Body failed")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };
    (status, value)
}

async fn new_game(app: &Router, user_name: &str) -> String {
    let (status, _) = call(app, Method::POST, "/user", Some(json!({"user_name": user_name}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, game) = call(app, Method::POST, "/game", Some(json!({"user_name": user_name}))).await;
    assert_eq!(status, StatusCode::OK);
    game["urlsafe_key"].as_str().expect("Key missing").to_string()
}

#[tokio::test]
async fn test_create_user_and_conflict() {
    let t = setup();
    let body = json!({"user_name": "alice", "email": "alice@example.com"});
    let (status, reply) = call(&t.app, Method::POST, "/user", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], "User alice created!");

    let (status, reply) = call(&t.app, Method::POST, "/user", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(reply["error"], "A User with that name already exists!");
}

#[tokio::test]
async fn test_game_flow() {
    let t = setup();
    let key = new_game(&t.app, "bob").await;

    let (status, game) = call(&t.app, Method::GET, &format!("/game/{key}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["state"], "---------");
    assert_eq!(game["turn"], "human");
    assert_eq!(game["message"], "Time to make a move!");

    let (status, game) = call(
        &t.app,
        Method::PUT,
        &format!("/game/{key}"),
        Some(json!({"move": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["state"], "----O----");
    assert_eq!(game["message"], "AI's turn");

    let (status, game) = call(&t.app, Method::PUT, &format!("/game/{key}/random"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["message"], "Your turn");
    assert_eq!(game["move_count"], 2);

    let (status, history) = call(&t.app, Method::GET, &format!("/game/{key}/history"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(history["items"][1]["player"], "AIPlayer");

    let (status, games) = call(&t.app, Method::GET, "/user/bob/games/active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(games["items"][0]["urlsafe_key"], key.as_str());
}

#[tokio::test]
async fn test_error_statuses() {
    let t = setup();
    let key = new_game(&t.app, "carol").await;

    let (status, reply) = call(
        &t.app,
        Method::PUT,
        &format!("/game/{key}"),
        Some(json!({"move": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(reply["error"].as_str().unwrap().starts_with("Invalid Move"));

    let (status, _) = call(&t.app, Method::GET, "/game/user-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&t.app, Method::GET, "/game/not-a-key", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, reply) = call(&t.app, Method::GET, "/game/game-999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reply["error"], "Game not found!");

    let (status, reply) = call(&t.app, Method::POST, "/game", Some(json!({"user_name": "ghost"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reply["error"], "A User with that name does not exist!");
}

#[tokio::test]
async fn test_cancel_game() {
    let t = setup();
    let key = new_game(&t.app, "dave").await;

    let (status, reply) = call(&t.app, Method::DELETE, &format!("/game/{key}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], "Game Deleted");

    let (status, _) = call(&t.app, Method::GET, &format!("/game/{key}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_active_games_task_and_listing() {
    let t = setup();
    new_game(&t.app, "erin").await;

    let (status, body) = call(&t.app, Method::POST, "/tasks/cache_active_games", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, reply) = call(&t.app, Method::GET, "/games/active_games", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], "The number of active game(s) is 1");
}

#[tokio::test]
async fn test_scores_and_ranking_start_empty() {
    let t = setup();
    new_game(&t.app, "finn").await;

    let (status, scores) = call(&t.app, Method::GET, "/scores", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scores["items"], json!([]));

    let (status, scores) = call(&t.app, Method::GET, "/scores/user/finn", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(scores["items"], json!([]));

    let (status, ranking) = call(&t.app, Method::GET, "/ranking", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ranking["items"][0]["name"], "finn");
    assert_eq!(ranking["items"][0]["ranking_score"], 0);
}

#[tokio::test]
async fn test_reminder_cron_spools_mail() {
    let t = setup();
    let body = json!({"user_name": "gina", "email": "gina@example.com"});
    call(&t.app, Method::POST, "/user", Some(body)).await;
    call(&t.app, Method::POST, "/game", Some(json!({"user_name": "gina"}))).await;

    let (status, _) = call(&t.app, Method::GET, "/crons/send_reminder", None).await;
    assert_eq!(status, StatusCode::OK);

    let spooled: Vec<_> = std::fs::read_dir(t.spool.path())
        .expect("Spool unreadable")
        .collect();
    assert_eq!(spooled.len(), 1);
}

#[tokio::test]
async fn test_bad_bodies_get_json_errors() {
    let t = setup();
    let key = new_game(&t.app, "hana").await;
    let uri = format!("/game/{key}");

    for body in [json!({}), json!({"move": "four"}), json!({"move": 1.5})] {
        let (status, reply) = call(&t.app, Method::PUT, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(reply["error"].is_string());
    }

    let (status, reply) = call(&t.app, Method::POST, "/user", Some(json!({"name": "ivy"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply["error"].is_string());

    // Not JSON at all, and no content type.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/game")
        .body(Body::from("user_name=hana"))
        .expect("Bad request");
    let response = t.app.clone().oneshot(request).await.expect("Router failed");
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Body failed")
        .to_bytes();
    let reply: Value = serde_json::from_slice(&bytes).expect("Body is not JSON");
    assert!(reply["error"].is_string());

    // The game is untouched.
    let (_, game) = call(&t.app, Method::GET, &uri, None).await;
    assert_eq!(game["move_count"], 0);
}

#[tokio::test]
async fn test_malformed_json_syntax_is_bad_request() {
    let t = setup();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/user")
        .header("content-type", "application/json")
        .body(Body::from("{\"user_name\": "))
        .expect("Bad request");
    let response = t.app.clone().oneshot(request).await.expect("Router failed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Body failed")
        .to_bytes();
    let reply: Value = serde_json::from_slice(&bytes).expect("Body is not JSON");
    assert!(reply["error"].is_string());
}
