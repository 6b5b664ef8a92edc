use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::auth::authenticate;
use crate::response::{ok, AppError};
use crate::services::reference::{reference_distractors, DEFAULT_DISTRACTORS};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DistractorQuery {
    item_id: String,
    count: Option<usize>,
    translation_id: Option<String>,
}

pub(super) async fn distractors(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<DistractorQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    authenticate(state.store(), &headers).await?;
    let Query(query) = query.map_err(|e| AppError::validation(e.body_text()))?;

    let translation_id = query
        .translation_id
        .unwrap_or_else(|| state.config().default_translation.clone());
    let mut rng = StdRng::from_entropy();
    let references = reference_distractors(
        state.store(),
        state.content(),
        &query.item_id,
        &translation_id,
        query.count.unwrap_or(DEFAULT_DISTRACTORS),
        &mut rng,
    )
    .await?;

    Ok(ok(references))
}
