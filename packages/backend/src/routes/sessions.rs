use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::auth::authenticate;
use crate::response::{ok, AppError};
use crate::services::session::compose_session;
use crate::state::AppState;
use crate::store::{ItemFilters, TestamentFilter};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SessionRequest {
    testament: Option<TestamentFilter>,
    book_ids: Option<Vec<u32>>,
    translation_id: Option<String>,
    count: Option<usize>,
}

/// Filters with the configured translation filled in when absent
pub(super) fn item_filters(
    state: &AppState,
    testament: Option<TestamentFilter>,
    book_ids: Option<Vec<u32>>,
    translation_id: Option<String>,
) -> ItemFilters {
    ItemFilters {
        testament: testament.unwrap_or_default(),
        book_ids: book_ids.unwrap_or_default(),
        translation_id: translation_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| state.config().default_translation.clone()),
    }
}

pub(super) async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let learner_id = authenticate(state.store(), &headers).await?;
    let Json(request) = body.map_err(|e| AppError::validation(e.body_text()))?;

    let config = state.config();
    let count = request.count.unwrap_or(config.default_session_size);
    if count == 0 || count > config.max_session_size {
        return Err(AppError::validation(format!(
            "count must be between 1 and {}",
            config.max_session_size
        )));
    }

    let filters = item_filters(
        &state,
        request.testament,
        request.book_ids,
        request.translation_id,
    );
    let mut rng = StdRng::from_entropy();
    let session = compose_session(
        state.store(),
        state.content(),
        &learner_id,
        &filters,
        count,
        Utc::now(),
        &mut rng,
    )
    .await?;

    Ok(ok(session))
}
