mod health;
mod leaderboard;
mod progression;
mod questions;
mod references;
mod rounds;
mod sessions;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", health::router())
        .route(
            "/api/sessions",
            post(sessions::create_session).fallback(fallback_handler),
        )
        .route(
            "/api/questions/random",
            get(questions::random_question).fallback(fallback_handler),
        )
        .route(
            "/api/references/distractors",
            get(references::distractors).fallback(fallback_handler),
        )
        .route(
            "/api/rounds",
            post(rounds::submit_round).fallback(fallback_handler),
        )
        .route(
            "/api/progression/me",
            get(progression::me).fallback(fallback_handler),
        )
        .nest("/api/leaderboard", leaderboard::router())
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found").into_response()
}
