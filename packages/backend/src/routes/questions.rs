use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use super::sessions::item_filters;
use crate::auth::authenticate;
use crate::response::{ok, AppError};
use crate::services::session;
use crate::state::AppState;
use crate::store::TestamentFilter;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RandomQuestionQuery {
    testament: Option<String>,
    /// Comma-separated book ids
    book_ids: Option<String>,
    translation_id: Option<String>,
    exclude_question_id: Option<String>,
}

fn parse_book_ids(raw: &str) -> Result<Vec<u32>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| AppError::validation(format!("invalid book id: {part}")))
        })
        .collect()
}

pub(super) async fn random_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<RandomQuestionQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let learner_id = authenticate(state.store(), &headers).await?;
    let Query(query) = query.map_err(|e| AppError::validation(e.body_text()))?;

    let testament = query
        .testament
        .as_deref()
        .map(|raw| {
            TestamentFilter::from_str(raw)
                .ok_or_else(|| AppError::validation(format!("invalid testament: {raw}")))
        })
        .transpose()?;
    let book_ids = query.book_ids.as_deref().map(parse_book_ids).transpose()?;

    let filters = item_filters(&state, testament, book_ids, query.translation_id);
    let mut rng = StdRng::from_entropy();
    let question = session::random_question(
        state.store(),
        state.content(),
        &learner_id,
        &filters,
        query.exclude_question_id.as_deref(),
        &mut rng,
    )
    .await?;

    Ok(ok(question))
}
