use learnbible_algo::LevelProgress;

use super::ServiceError;
use crate::store::{LearnerProgression, RecordStore};

/// Current totals of a learner, with progress inside the level
pub async fn get_learner_progression(
    store: &dyn RecordStore,
    learner_id: &str,
) -> Result<LevelProgress, ServiceError> {
    let progression = store
        .find_progression(learner_id)
        .await?
        .unwrap_or_else(|| LearnerProgression::initial(learner_id));

    Ok(LevelProgress::of(progression.xp, progression.level))
}
