use serde::Serialize;

use super::ServiceError;
use crate::store::RecordStore;

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub learner_id: String,
    pub username: String,
    pub xp: u64,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerRank {
    /// 0 when the learner has never been awarded XP
    pub rank: u64,
    pub xp: u64,
    pub level: u32,
}

pub async fn leaderboard(
    store: &dyn RecordStore,
    limit: usize,
) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let standings = store.leaderboard(limit).await?;
    Ok(standings
        .into_iter()
        .enumerate()
        .map(|(i, s)| LeaderboardEntry {
            rank: i as u64 + 1,
            learner_id: s.learner_id,
            username: s.username,
            xp: s.xp,
            level: s.level,
        })
        .collect())
}

pub async fn learner_rank(
    store: &dyn RecordStore,
    learner_id: &str,
) -> Result<LearnerRank, ServiceError> {
    let Some(progression) = store.find_progression(learner_id).await? else {
        return Ok(LearnerRank {
            rank: 0,
            xp: 0,
            level: 1,
        });
    };

    let ahead = store
        .count_ranked_above(progression.level, progression.xp)
        .await?;
    Ok(LearnerRank {
        rank: ahead + 1,
        xp: progression.xp,
        level: progression.level,
    })
}
