//! HTTP surface of the game service.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Serialize;
use tower::ServiceBuilder;
use tracing::{error, info, instrument, warn};

use crate::error::ServiceError;
use crate::forms::{
    CreateUserRequest, GameForm, GameForms, MakeMoveRequest, MoveRecordForms, NewGameRequest,
    ScoreForms, StringMessage, UserForms,
};
use crate::reminders::ReminderJob;
use crate::service::GameService;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    service: Arc<GameService>,
    reminders: Arc<ReminderJob>,
}

impl AppState {
    /// Bundles the facade and the reminder job.
    pub fn new(service: Arc<GameService>, reminders: Arc<ReminderJob>) -> Self {
        Self { service, reminders }
    }
}

/// Error answered to an HTTP client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::InvalidMove(_) | ServiceError::MalformedReference(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Database(e) => {
                error!(error = %e, "Database failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match err {
            // Store details stay in the log.
            ServiceError::Database(_) => "Internal error".to_string(),
            other => other.to_string(),
        };
        Self { status, message }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, reason = %self.message, "Request failed");
        (
            self.status,
            Json(serde_json::json!({"error": self.message})),
        )
            .into_response()
    }
}

/// Runs a blocking facade call off the async executor.
async fn blocking<T, F>(state: &AppState, call: F) -> Result<Json<T>, ApiError>
where
    T: Serialize + Send + 'static,
    F: FnOnce(&GameService) -> Result<T, ServiceError> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    let result = tokio::task::spawn_blocking(move || call(service.as_ref()))
        .await
        .map_err(|e| {
            error!(error = %e, "Blocking task failed");
            ApiError::internal("Internal error")
        })?;
    Ok(Json(result?))
}

/// Builds the router with every API route and request logging.
#[instrument(skip(state))]
pub fn router(state: AppState) -> Router {
    info!("Building HTTP router");
    Router::new()
        .route("/user", post(create_user))
        .route("/user/{user_name}/games/active", get(user_active_games))
        .route("/game", post(new_game))
        .route("/game/{key}", get(get_game).put(make_move))
        .route("/game/{key}/cancel", delete(cancel_game))
        .route("/game/{key}/random", put(random_move))
        .route("/game/{key}/history", get(game_history))
        .route("/games/active_games", get(active_games))
        .route("/scores", get(scores))
        .route("/scores/user/{user_name}", get(user_scores))
        .route("/ranking", get(ranking))
        .route("/tasks/cache_active_games", post(cache_active_games))
        .route("/crons/send_reminder", get(send_reminders))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

#[instrument(skip_all)]
async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<StringMessage>, ApiError> {
    let Json(request) = payload?;
    info!(user_name = %request.user_name, "Creating user");
    blocking(&state, move |service| {
        service.create_user(&request.user_name, request.email)
    })
    .await
}

#[instrument(skip_all)]
async fn new_game(
    State(state): State<AppState>,
    payload: Result<Json<NewGameRequest>, JsonRejection>,
) -> Result<Json<GameForm>, ApiError> {
    let Json(request) = payload?;
    info!(user_name = %request.user_name, "Starting game");
    blocking(&state, move |service| service.new_game(&request.user_name)).await
}

#[instrument(skip(state))]
async fn get_game(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GameForm>, ApiError> {
    blocking(&state, move |service| service.get_game(&key)).await
}

#[instrument(skip(state))]
async fn user_active_games(
    State(state): State<AppState>,
    Path(user_name): Path<String>,
) -> Result<Json<GameForms>, ApiError> {
    blocking(&state, move |service| service.user_active_games(&user_name)).await
}

#[instrument(skip(state))]
async fn cancel_game(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<StringMessage>, ApiError> {
    blocking(&state, move |service| service.cancel_game(&key)).await
}

#[instrument(skip(state, payload))]
async fn make_move(
    State(state): State<AppState>,
    Path(key): Path<String>,
    payload: Result<Json<MakeMoveRequest>, JsonRejection>,
) -> Result<Json<GameForm>, ApiError> {
    let Json(request) = payload?;
    info!(position = request.position, "Move requested");
    blocking(&state, move |service| service.make_move(&key, request.position)).await
}

#[instrument(skip(state))]
async fn random_move(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GameForm>, ApiError> {
    blocking(&state, move |service| service.random_move(&key)).await
}

#[instrument(skip(state))]
async fn game_history(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MoveRecordForms>, ApiError> {
    blocking(&state, move |service| service.game_history(&key)).await
}

#[instrument(skip(state))]
async fn active_games(State(state): State<AppState>) -> Result<Json<StringMessage>, ApiError> {
    blocking(&state, |service| Ok(service.active_games())).await
}

#[instrument(skip(state))]
async fn scores(State(state): State<AppState>) -> Result<Json<ScoreForms>, ApiError> {
    blocking(&state, |service| service.scores()).await
}

#[instrument(skip(state))]
async fn user_scores(
    State(state): State<AppState>,
    Path(user_name): Path<String>,
) -> Result<Json<ScoreForms>, ApiError> {
    blocking(&state, move |service| service.user_scores(&user_name)).await
}

#[instrument(skip(state))]
async fn ranking(State(state): State<AppState>) -> Result<Json<UserForms>, ApiError> {
    blocking(&state, |service| service.ranking()).await
}

#[instrument(skip(state))]
async fn cache_active_games(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let count = blocking(&state, |service| service.cache_active_games()).await?;
    info!(count = count.0, "Active games cached");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
async fn send_reminders(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let job = Arc::clone(&state.reminders);
    let sent = tokio::task::spawn_blocking(move || job.run())
        .await
        .map_err(|e| {
            error!(error = %e, "Reminder task failed");
            ApiError::internal("Internal error")
        })?
        .map_err(ServiceError::from)?;
    info!(sent, "Reminder run finished");
    Ok(StatusCode::OK)
}
