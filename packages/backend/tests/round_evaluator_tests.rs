mod common;

use chrono::Duration;

use learnbible_algo::{GameMode, StreakMilestone, MASTERY_THRESHOLD};
use learnbible_backend::services::round::{evaluate_round, RoundInput};
use learnbible_backend::services::ServiceError;
use learnbible_backend::store::{LearnerProgression, RecordStore, StoreError};

use common::{item_id, now, question_id, seeded_store, ALICE};

fn round(rank: u32) -> RoundInput {
    RoundInput {
        question_id: question_id(rank),
        item_id: item_id(rank),
        correct_count: 2,
        incorrect_count: 0,
        all_correct: true,
        response_time_ms: Some(4000),
        streak: 2,
        mode: Some(GameMode::Medium),
        reference_correct: Some(true),
        blank_answers: None,
    }
}

const EPSILON: f64 = 1e-9;

// ==================== Reward and schedule ====================

#[tokio::test]
async fn test_correct_medium_round() {
    let store = seeded_store().await;

    let outcome = evaluate_round(&*store, ALICE, &round(1), now()).await.unwrap();

    assert_eq!(outcome.xp_gained, 40);
    assert_eq!(outcome.new_xp, 40);
    assert_eq!(outcome.new_level, 1);
    assert!(!outcome.leveled_up);
    assert_eq!(outcome.milestone, Some(StreakMilestone::Cute));

    let state = store.find_state(ALICE, &item_id(1)).await.unwrap().unwrap();
    assert!((state.mastery - 0.1).abs() < EPSILON);
    assert_eq!(state.correct_streak, 1);
    assert_eq!(state.lapse_count, 0);
    assert_eq!(state.introduced_at, now());
    assert_eq!(state.last_seen_at, Some(now()));
    assert_eq!(state.next_due_at, now() + Duration::days(3));

    let progression = store.find_progression(ALICE).await.unwrap().unwrap();
    assert_eq!(progression.xp, 40);
    assert_eq!(progression.level, 1);

    let attempts = store.attempts_of(ALICE);
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].is_correct);
    assert_eq!(attempts[0].question_id, question_id(1));
    assert_eq!(attempts[0].response_time_ms, Some(4000));
}

#[tokio::test]
async fn test_second_correct_answer_climbs_the_ladder() {
    let store = seeded_store().await;

    evaluate_round(&*store, ALICE, &round(1), now()).await.unwrap();
    let later = now() + Duration::days(3);
    evaluate_round(&*store, ALICE, &round(1), later).await.unwrap();

    let state = store.find_state(ALICE, &item_id(1)).await.unwrap().unwrap();
    assert_eq!(state.correct_streak, 2);
    assert!((state.mastery - 0.19).abs() < EPSILON);
    assert_eq!(state.introduced_at, now());
    assert_eq!(state.next_due_at, later + Duration::days(7));
    assert_eq!(store.count_attempts(ALICE, &item_id(1)).await.unwrap(), 2);
}

#[tokio::test]
async fn test_incorrect_reference_is_a_lapse() {
    let store = seeded_store().await;
    let input = RoundInput {
        reference_correct: Some(false),
        ..round(3)
    };

    let outcome = evaluate_round(&*store, ALICE, &input, now()).await.unwrap();

    // blanks still pay out: 2×10 + 5
    assert_eq!(outcome.xp_gained, 25);
    assert!(outcome.milestone.is_none());

    let state = store.find_state(ALICE, &item_id(3)).await.unwrap().unwrap();
    assert_eq!(state.mastery, 0.0);
    assert_eq!(state.correct_streak, 0);
    assert_eq!(state.lapse_count, 1);
    assert_eq!(state.next_due_at, now() + Duration::minutes(10));
    assert!(!store.attempts_of(ALICE)[0].is_correct);
}

#[tokio::test]
async fn test_multi_level_jump_and_milestone() {
    let store = seeded_store().await;
    store
        .upsert_progression(&LearnerProgression {
            learner_id: ALICE.to_string(),
            xp: 190,
            level: 1,
        })
        .await
        .unwrap();
    let input = RoundInput {
        correct_count: 3,
        streak: 9,
        mode: Some(GameMode::Hard),
        ..round(2)
    };

    let outcome = evaluate_round(&*store, ALICE, &input, now()).await.unwrap();

    // (30 + 5 + 15 streak + 15 reference) × 1.5 = 97.5
    assert_eq!(outcome.xp_gained, 98);
    assert_eq!(outcome.new_xp, 288);
    assert_eq!(outcome.new_level, 2);
    assert!(outcome.leveled_up);
    assert_eq!(outcome.milestone, Some(StreakMilestone::Crazy));
}

#[tokio::test]
async fn test_easy_mode_ignores_reference() {
    let store = seeded_store().await;
    let input = RoundInput {
        streak: 0,
        mode: Some(GameMode::Easy),
        ..round(4)
    };

    let outcome = evaluate_round(&*store, ALICE, &input, now()).await.unwrap();

    assert_eq!(outcome.xp_gained, 13);
    let state = store.find_state(ALICE, &item_id(4)).await.unwrap().unwrap();
    assert_eq!(state.correct_streak, 1);
}

#[tokio::test]
async fn test_round_without_mode_needs_no_reference() {
    let store = seeded_store().await;
    let input = RoundInput {
        streak: 0,
        mode: None,
        reference_correct: None,
        ..round(8)
    };

    let outcome = evaluate_round(&*store, ALICE, &input, now()).await.unwrap();

    // scored as medium without the reference bonus: 2×10 + 5
    assert_eq!(outcome.xp_gained, 25);
    assert_eq!(outcome.milestone, Some(StreakMilestone::Cute));
    let state = store.find_state(ALICE, &item_id(8)).await.unwrap().unwrap();
    assert_eq!(state.correct_streak, 1);
    assert_eq!(state.lapse_count, 0);
    assert_eq!(state.next_due_at, now() + Duration::days(3));
    assert!(store.attempts_of(ALICE)[0].is_correct);
}

// ==================== Anti-cheat ====================

#[tokio::test]
async fn test_suspicious_round_still_updates_mastery() {
    let store = seeded_store().await;
    let input = RoundInput {
        response_time_ms: Some(900),
        ..round(5)
    };

    let outcome = evaluate_round(&*store, ALICE, &input, now()).await.unwrap();

    assert_eq!(outcome.xp_gained, 0);
    assert_eq!(outcome.new_xp, 0);
    assert_eq!(outcome.new_level, 1);
    assert!(!outcome.leveled_up);
    assert!(store.find_progression(ALICE).await.unwrap().is_none());

    let state = store.find_state(ALICE, &item_id(5)).await.unwrap().unwrap();
    assert_eq!(state.correct_streak, 1);
    assert_eq!(state.next_due_at, now() + Duration::days(3));
    assert_eq!(store.attempts_of(ALICE).len(), 1);
}

// ==================== Server-side grading ====================

#[tokio::test]
async fn test_blank_answers_are_graded_by_server() {
    let store = seeded_store().await;
    let input = RoundInput {
        streak: 0,
        blank_answers: Some(vec!["Beginning".to_string(), "Godd".to_string()]),
        ..round(6)
    };

    let outcome = evaluate_round(&*store, ALICE, &input, now()).await.unwrap();

    // 10 + 2 + 15 reference, no all-correct bonus
    assert_eq!(outcome.xp_gained, 27);
    let state = store.find_state(ALICE, &item_id(6)).await.unwrap().unwrap();
    assert_eq!(state.lapse_count, 1);
    assert_eq!(state.correct_streak, 0);
}

// ==================== Edge cases ====================

#[tokio::test]
async fn test_unknown_question_uses_default_difficulty() {
    let store = seeded_store().await;
    let input = RoundInput {
        question_id: "q-retired".to_string(),
        ..round(7)
    };

    let outcome = evaluate_round(&*store, ALICE, &input, now()).await.unwrap();

    assert_eq!(outcome.xp_gained, 40);
    let state = store.find_state(ALICE, &item_id(7)).await.unwrap().unwrap();
    assert_eq!(state.next_due_at, now() + Duration::days(3));
}

#[tokio::test]
async fn test_question_item_mismatch_is_rejected() {
    let store = seeded_store().await;
    let input = RoundInput {
        item_id: item_id(2),
        ..round(1)
    };

    let err = evaluate_round(&*store, ALICE, &input, now()).await.unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(store.attempts_of(ALICE).is_empty());
}

#[tokio::test]
async fn test_round_for_item_outside_catalog_is_rejected() {
    let store = seeded_store().await;

    for n in 0..15 {
        let input = RoundInput {
            question_id: format!("q-phantom-{}", n % 5),
            item_id: format!("phantom-{}", n % 5),
            mode: Some(GameMode::Easy),
            ..round(1)
        };
        let err = evaluate_round(&*store, ALICE, &input, now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    assert!(store.find_state(ALICE, "phantom-0").await.unwrap().is_none());
    assert!(store.attempts_of(ALICE).is_empty());
    assert!(store.find_progression(ALICE).await.unwrap().is_none());
    assert_eq!(store.count_mastered(ALICE, MASTERY_THRESHOLD).await.unwrap(), 0);
}

#[tokio::test]
async fn test_oversized_blank_counts_are_rejected() {
    let store = seeded_store().await;
    let input = RoundInput {
        correct_count: 429_496_730,
        ..round(1)
    };

    let err = evaluate_round(&*store, ALICE, &input, now()).await.unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(store.attempts_of(ALICE).is_empty());
}

#[tokio::test]
async fn test_missing_ids_are_rejected() {
    let store = seeded_store().await;
    let input = RoundInput {
        item_id: String::new(),
        ..round(1)
    };

    let err = evaluate_round(&*store, ALICE, &input, now()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_store_failure_is_surfaced() {
    let store = seeded_store().await;
    store.set_available(false);

    let err = evaluate_round(&*store, ALICE, &round(1), now()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Store(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn test_learners_are_isolated() {
    let store = seeded_store().await;

    evaluate_round(&*store, ALICE, &round(1), now()).await.unwrap();

    assert!(store.find_state(common::BOB, &item_id(1)).await.unwrap().is_none());
    assert!(store.find_progression(common::BOB).await.unwrap().is_none());
}
