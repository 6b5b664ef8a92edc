use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use learnbible_algo::{MemoryState, Ranked, ReviewedState, NEAR_DUE_WINDOW_HOURS};

// ========== Catalog ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Testament {
    #[serde(rename = "OT")]
    Old,
    #[serde(rename = "NT")]
    New,
}

impl Testament {
    pub fn as_str(&self) -> &'static str {
        match self {
            Testament::Old => "OT",
            Testament::New => "NT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "OT" | "ot" => Some(Testament::Old),
            "NT" | "nt" => Some(Testament::New),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestamentFilter {
    #[serde(rename = "OT")]
    Old,
    #[serde(rename = "NT")]
    New,
    #[default]
    #[serde(rename = "BOTH")]
    Both,
}

impl TestamentFilter {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "OT" | "ot" => Some(TestamentFilter::Old),
            "NT" | "nt" => Some(TestamentFilter::New),
            "BOTH" | "both" => Some(TestamentFilter::Both),
            _ => None,
        }
    }

    pub fn testament(&self) -> Option<Testament> {
        match self {
            TestamentFilter::Old => Some(Testament::Old),
            TestamentFilter::New => Some(Testament::New),
            TestamentFilter::Both => None,
        }
    }
}

/// Testament / book subset plus the translation questions must be in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilters {
    #[serde(default)]
    pub testament: TestamentFilter,
    /// Empty means every book
    #[serde(default)]
    pub book_ids: Vec<u32>,
    pub translation_id: String,
}

impl ItemFilters {
    pub fn all_books(translation_id: impl Into<String>) -> Self {
        Self {
            testament: TestamentFilter::Both,
            book_ids: Vec::new(),
            translation_id: translation_id.into(),
        }
    }

    /// Whether an item belongs to the filtered universe (translation is
    /// applied later, at question resolution)
    pub fn matches(&self, item: &Item) -> bool {
        let testament_ok = self
            .testament
            .testament()
            .map_or(true, |t| t == item.testament);
        let book_ok = self.book_ids.is_empty() || self.book_ids.contains(&item.book_id);
        testament_ok && book_ok
    }
}

/// A memorizable verse with its unlock rank and global difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub book_id: u32,
    pub book_name: String,
    pub testament: Testament,
    pub chapter: u32,
    pub verse: u32,
    pub global_rank: u32,
    pub global_difficulty: u32,
    pub released: bool,
}

impl Item {
    pub fn reference(&self) -> String {
        format!("{} {}:{}", self.book_name, self.chapter, self.verse)
    }
}

impl Ranked for Item {
    fn global_rank(&self) -> u32 {
        self.global_rank
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKind {
    Blanks,
    MatchRef,
    Who,
    Where,
    Timeline,
    Mcq,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Blanks => "BLANKS",
            QuestionKind::MatchRef => "MATCH_REF",
            QuestionKind::Who => "WHO",
            QuestionKind::Where => "WHERE",
            QuestionKind::Timeline => "TIMELINE",
            QuestionKind::Mcq => "MCQ",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "BLANKS" => Some(QuestionKind::Blanks),
            "MATCH_REF" => Some(QuestionKind::MatchRef),
            "WHO" => Some(QuestionKind::Who),
            "WHERE" => Some(QuestionKind::Where),
            "TIMELINE" => Some(QuestionKind::Timeline),
            "MCQ" => Some(QuestionKind::Mcq),
            _ => None,
        }
    }
}

/// Authored question; `answer_json` is kept raw and only mapped to a playable
/// payload at resolution time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub item_id: String,
    pub kind: QuestionKind,
    pub translation_id: String,
    pub answer_json: serde_json::Value,
    pub difficulty: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// ========== Learner State ==========

/// One row per (learner, item) once the learner has attempted the item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerItemState {
    pub learner_id: String,
    pub item_id: String,
    pub mastery: f64,
    pub correct_streak: u32,
    pub lapse_count: u32,
    pub introduced_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub next_due_at: DateTime<Utc>,
}

impl LearnerItemState {
    pub fn memory(&self) -> MemoryState {
        MemoryState {
            mastery: self.mastery,
            correct_streak: self.correct_streak,
            lapse_count: self.lapse_count,
        }
    }

    pub fn from_review(
        learner_id: &str,
        item_id: &str,
        introduced_at: DateTime<Utc>,
        reviewed: ReviewedState,
    ) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            item_id: item_id.to_string(),
            mastery: reviewed.mastery,
            correct_streak: reviewed.correct_streak,
            lapse_count: reviewed.lapse_count,
            introduced_at,
            last_seen_at: Some(reviewed.last_seen_at),
            next_due_at: reviewed.next_due_at,
        }
    }
}

/// Append-only log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub learner_id: String,
    pub item_id: String,
    pub question_id: String,
    pub is_correct: bool,
    pub response_time_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProgression {
    pub learner_id: String,
    pub xp: u64,
    pub level: u32,
}

impl LearnerProgression {
    /// Totals of a learner who has not been awarded anything yet
    pub fn initial(learner_id: &str) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            xp: 0,
            level: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Learner {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerStanding {
    pub learner_id: String,
    pub username: String,
    pub xp: u64,
    pub level: u32,
}

// ========== Queries ==========

/// Half-open due-date window `(after, until]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    pub after: Option<DateTime<Utc>>,
    pub until: DateTime<Utc>,
}

impl DueWindow {
    /// Everything scheduled at or before `now`
    pub fn due(now: DateTime<Utc>) -> Self {
        Self {
            after: None,
            until: now,
        }
    }

    /// Scheduled after `now` but within the next 24 hours
    pub fn near_due(now: DateTime<Utc>) -> Self {
        Self {
            after: Some(now),
            until: now + Duration::hours(NEAR_DUE_WINDOW_HOURS),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.after.map_or(true, |after| at > after) && at <= self.until
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(book_id: u32, testament: Testament) -> Item {
        Item {
            id: "v1".to_string(),
            book_id,
            book_name: "John".to_string(),
            testament,
            chapter: 3,
            verse: 16,
            global_rank: 1,
            global_difficulty: 300,
            released: true,
        }
    }

    #[test]
    fn test_filters_match_testament_and_books() {
        let nt = item(43, Testament::New);
        let mut filters = ItemFilters::all_books("NIV");
        assert!(filters.matches(&nt));

        filters.testament = TestamentFilter::Old;
        assert!(!filters.matches(&nt));

        filters.testament = TestamentFilter::New;
        filters.book_ids = vec![40, 41];
        assert!(!filters.matches(&nt));
        filters.book_ids.push(43);
        assert!(filters.matches(&nt));
    }

    #[test]
    fn test_item_reference() {
        assert_eq!(item(43, Testament::New).reference(), "John 3:16");
    }

    #[test]
    fn test_due_windows_are_disjoint() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let due = DueWindow::due(now);
        let near = DueWindow::near_due(now);

        assert!(due.contains(now));
        assert!(!near.contains(now));
        assert!(near.contains(now + Duration::hours(24)));
        assert!(!near.contains(now + Duration::hours(25)));
        assert!(due.contains(now - Duration::days(30)));
    }

    #[test]
    fn test_question_kind_wire_names() {
        let json = serde_json::to_string(&QuestionKind::MatchRef).unwrap();
        assert_eq!(json, "\"MATCH_REF\"");
        assert_eq!(QuestionKind::from_str("BLANKS"), Some(QuestionKind::Blanks));
        assert_eq!(QuestionKind::from_str("ESSAY"), None);
    }
}
