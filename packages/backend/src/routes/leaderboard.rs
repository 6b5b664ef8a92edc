use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::auth::authenticate;
use crate::response::{ok, AppError};
use crate::services::leaderboard::{self, DEFAULT_LEADERBOARD_LIMIT};
use crate::state::AppState;

const MAX_LEADERBOARD_LIMIT: usize = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(top))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

async fn top(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .clamp(1, MAX_LEADERBOARD_LIMIT);
    let entries = leaderboard::leaderboard(state.store(), limit).await?;
    Ok(ok(entries))
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let learner_id = authenticate(state.store(), &headers).await?;
    let rank = leaderboard::learner_rank(state.store(), &learner_id).await?;
    Ok(ok(rank))
}
