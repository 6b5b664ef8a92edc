use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::auth::authenticate;
use crate::response::{ok, AppError};
use crate::services::round::{evaluate_round, RoundInput};
use crate::state::AppState;

pub(super) async fn submit_round(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RoundInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let learner_id = authenticate(state.store(), &headers).await?;
    let Json(input) = body.map_err(|e| AppError::validation(e.body_text()))?;

    let outcome = evaluate_round(state.store(), &learner_id, &input, Utc::now()).await?;
    Ok(ok(outcome))
}
