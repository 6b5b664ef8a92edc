use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use crate::auth::authenticate;
use crate::response::{ok, AppError};
use crate::services::progression::get_learner_progression;
use crate::state::AppState;

pub(super) async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let learner_id = authenticate(state.store(), &headers).await?;
    let progress = get_learner_progression(state.store(), &learner_id).await?;
    Ok(ok(progress))
}
