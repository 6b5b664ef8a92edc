//! Round evaluation
//!
//! A submitted round runs two independent steps: [`maybe_award_xp`] (skipped
//! for suspiciously fast rounds) and [`always_update_mastery`] (runs for every
//! round, keyed on full correctness). Rewards can be withheld without ever
//! corrupting the review schedule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use learnbible_algo::{
    apply_xp, score_round, streak_milestone, GameMode, MemoryState, RoundAnswers, RoundScore,
    StreakMilestone, XpApplied, DEFAULT_DIFFICULTY,
};

use super::ServiceError;
use crate::store::{
    AnswerPayload, Attempt, LearnerItemState, LearnerProgression, Question, RecordStore,
};

/// Client submission for one completed round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundInput {
    pub question_id: String,
    pub item_id: String,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub incorrect_count: u32,
    #[serde(default)]
    pub all_correct: bool,
    pub response_time_ms: Option<u64>,
    /// Consecutive fully-correct rounds before this one
    #[serde(default)]
    pub streak: u32,
    /// Absent for clients without mode selection
    pub mode: Option<GameMode>,
    /// Absent when no reference phase was played
    pub reference_correct: Option<bool>,
    /// Typed words per blank; when present on a BLANKS question the server
    /// grades them and ignores the submitted counts
    pub blank_answers: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundOutcome {
    pub xp_gained: u64,
    pub new_xp: u64,
    pub new_level: u32,
    pub leveled_up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<StreakMilestone>,
}

/// Upper bound on blanks a single verse round can carry
pub const MAX_BLANKS_PER_ROUND: u32 = 50;

impl RoundInput {
    fn validate(&self) -> Result<(), ServiceError> {
        if self.question_id.trim().is_empty() {
            return Err(ServiceError::validation("questionId is required"));
        }
        if self.item_id.trim().is_empty() {
            return Err(ServiceError::validation("itemId is required"));
        }
        let blanks = self.correct_count.saturating_add(self.incorrect_count);
        let typed = self.blank_answers.as_ref().map_or(0, Vec::len);
        if blanks > MAX_BLANKS_PER_ROUND || typed > MAX_BLANKS_PER_ROUND as usize {
            return Err(ServiceError::validation(format!(
                "a round has at most {MAX_BLANKS_PER_ROUND} blanks"
            )));
        }
        Ok(())
    }

    /// Scoring inputs, graded server-side when the question allows it
    pub fn answers(&self, question: Option<&Question>) -> RoundAnswers {
        let mut answers = RoundAnswers {
            correct_count: self.correct_count,
            incorrect_count: self.incorrect_count,
            all_blanks_correct: self.all_correct,
            reference_correct: self.reference_correct,
            mode: self.mode,
            streak_before: self.streak,
            response_time_ms: self.response_time_ms,
        };

        let (Some(submitted), Some(question)) = (&self.blank_answers, question) else {
            return answers;
        };
        match AnswerPayload::parse(question) {
            Ok(AnswerPayload::Blanks(blanks)) => {
                let grade = blanks.grade(submitted);
                answers.correct_count = grade.correct_count;
                answers.incorrect_count = grade.incorrect_count;
                answers.all_blanks_correct = grade.all_correct;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "cannot grade blanks, using submitted counts");
            }
        }
        answers
    }
}

/// Applies the round's XP to the learner's totals. Suspicious rounds leave
/// the totals untouched and nothing is written.
pub async fn maybe_award_xp(
    store: &dyn RecordStore,
    learner_id: &str,
    score: &RoundScore,
) -> Result<XpApplied, ServiceError> {
    let current = store
        .find_progression(learner_id)
        .await?
        .unwrap_or_else(|| LearnerProgression::initial(learner_id));

    if score.suspicious {
        tracing::debug!(learner_id = %learner_id, "suspicious round, xp withheld");
        return Ok(XpApplied {
            new_xp: current.xp,
            new_level: current.level,
            leveled_up: false,
        });
    }

    let applied = apply_xp(current.xp, current.level, score.xp);
    store
        .upsert_progression(&LearnerProgression {
            learner_id: learner_id.to_string(),
            xp: applied.new_xp,
            level: applied.new_level,
        })
        .await?;

    Ok(applied)
}

/// Logs the attempt and moves the item's memory state forward. Runs for every
/// round regardless of reward.
pub async fn always_update_mastery(
    store: &dyn RecordStore,
    learner_id: &str,
    input: &RoundInput,
    question: Option<&Question>,
    fully_correct: bool,
    now: DateTime<Utc>,
) -> Result<LearnerItemState, ServiceError> {
    let difficulty = question.map_or(DEFAULT_DIFFICULTY, |q| q.difficulty);

    let attempt = Attempt {
        id: Uuid::new_v4().to_string(),
        learner_id: learner_id.to_string(),
        item_id: input.item_id.clone(),
        question_id: input.question_id.clone(),
        is_correct: fully_correct,
        response_time_ms: input.response_time_ms,
        created_at: now,
    };
    let (_, prior) = tokio::try_join!(
        store.insert_attempt(&attempt),
        store.find_state(learner_id, &input.item_id),
    )?;

    let introduced_at = prior.as_ref().map_or(now, |s| s.introduced_at);
    let memory = prior.as_ref().map_or_else(MemoryState::unseen, LearnerItemState::memory);
    let state = LearnerItemState::from_review(
        learner_id,
        &input.item_id,
        introduced_at,
        memory.review(fully_correct, difficulty, now),
    );
    store.upsert_state(&state).await?;

    Ok(state)
}

pub async fn evaluate_round(
    store: &dyn RecordStore,
    learner_id: &str,
    input: &RoundInput,
    now: DateTime<Utc>,
) -> Result<RoundOutcome, ServiceError> {
    input.validate()?;

    let (item, question) = tokio::try_join!(
        store.find_item(&input.item_id),
        store.find_question(&input.question_id),
    )?;
    if item.is_none() {
        return Err(ServiceError::validation(format!(
            "unknown item: {}",
            input.item_id
        )));
    }
    if let Some(q) = &question {
        if q.item_id != input.item_id {
            return Err(ServiceError::validation("question does not belong to item"));
        }
    } else {
        tracing::debug!(question_id = %input.question_id, "round for unknown question");
    }

    let score = score_round(&input.answers(question.as_ref()));

    let applied = maybe_award_xp(store, learner_id, &score).await?;
    let state = always_update_mastery(
        store,
        learner_id,
        input,
        question.as_ref(),
        score.fully_correct,
        now,
    )
    .await?;

    let milestone = if score.fully_correct {
        streak_milestone(input.streak.saturating_add(1))
    } else {
        None
    };

    tracing::debug!(
        learner_id = %learner_id,
        item_id = %input.item_id,
        xp = score.xp,
        fully_correct = score.fully_correct,
        mastery = state.mastery,
        next_due_at = %state.next_due_at,
        "round evaluated"
    );

    Ok(RoundOutcome {
        xp_gained: if score.suspicious { 0 } else { score.xp },
        new_xp: applied.new_xp,
        new_level: applied.new_level,
        leveled_up: applied.leveled_up,
        milestone,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::QuestionKind;
    use serde_json::json;

    fn blanks_question() -> Question {
        Question {
            id: "q1".to_string(),
            item_id: "jhn-3-16".to_string(),
            kind: QuestionKind::Blanks,
            translation_id: "NIV".to_string(),
            answer_json: json!({ "word_indices": [1, 4], "answers": ["God", "loved"] }),
            difficulty: 400,
            active: true,
            created_at: Utc::now(),
        }
    }

    fn input() -> RoundInput {
        RoundInput {
            question_id: "q1".to_string(),
            item_id: "jhn-3-16".to_string(),
            correct_count: 2,
            all_correct: true,
            mode: Some(GameMode::Medium),
            ..RoundInput::default()
        }
    }

    #[test]
    fn test_submitted_counts_used_without_blank_answers() {
        let answers = input().answers(Some(&blanks_question()));
        assert_eq!(answers.correct_count, 2);
        assert!(answers.all_blanks_correct);
    }

    #[test]
    fn test_blank_answers_override_submitted_counts() {
        let round = RoundInput {
            blank_answers: Some(vec!["god".to_string(), "hated".to_string()]),
            ..input()
        };
        let answers = round.answers(Some(&blanks_question()));
        assert_eq!(answers.correct_count, 1);
        assert_eq!(answers.incorrect_count, 1);
        assert!(!answers.all_blanks_correct);
    }

    #[test]
    fn test_blank_answers_ignored_without_question() {
        let round = RoundInput {
            blank_answers: Some(vec!["nope".to_string()]),
            ..input()
        };
        let answers = round.answers(None);
        assert_eq!(answers.correct_count, 2);
    }

    #[test]
    fn test_input_validation() {
        let round = RoundInput { question_id: " ".to_string(), ..input() };
        assert!(matches!(round.validate(), Err(ServiceError::Validation(_))));
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_oversized_counts_rejected() {
        let round = RoundInput { correct_count: 429_496_730, ..input() };
        assert!(matches!(round.validate(), Err(ServiceError::Validation(_))));

        let round = RoundInput { correct_count: 30, incorrect_count: 21, ..input() };
        assert!(matches!(round.validate(), Err(ServiceError::Validation(_))));

        let round = RoundInput {
            blank_answers: Some(vec!["x".to_string(); 51]),
            ..input()
        };
        assert!(matches!(round.validate(), Err(ServiceError::Validation(_))));

        let round = RoundInput { correct_count: 50, incorrect_count: 0, ..input() };
        assert!(round.validate().is_ok());
    }

    #[test]
    fn test_round_input_deserializes_camel_case_with_defaults() {
        let round: RoundInput = serde_json::from_value(json!({
            "questionId": "q1",
            "itemId": "jhn-3-16",
            "allCorrect": true,
            "responseTimeMs": 4000,
            "mode": "hard",
            "referenceCorrect": true
        }))
        .unwrap();
        assert_eq!(round.mode, Some(GameMode::Hard));
        assert_eq!(round.correct_count, 0);
        assert_eq!(round.streak, 0);
        assert_eq!(round.response_time_ms, Some(4000));
        assert!(round.blank_answers.is_none());

        let round: RoundInput =
            serde_json::from_value(json!({ "questionId": "q1", "itemId": "jhn-3-16" })).unwrap();
        assert!(round.mode.is_none());
    }
}
