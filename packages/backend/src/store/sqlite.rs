use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use thiserror::Error;

use super::{
    Attempt, ContentProvider, DueWindow, Item, ItemFilters, Learner, LearnerItemState,
    LearnerProgression, LearnerStanding, Question, QuestionError, QuestionKind, RecordStore,
    StoreError, Testament,
};

/// Bound parameters per `IN (...)` chunk; well under SQLite's variable limit
const MAX_IN_BINDS: usize = 500;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS "learners" (
    "id" TEXT PRIMARY KEY,
    "username" TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS "sessions" (
    "tokenHash" TEXT PRIMARY KEY,
    "learnerId" TEXT NOT NULL REFERENCES "learners"("id")
);

CREATE TABLE IF NOT EXISTS "items" (
    "id" TEXT PRIMARY KEY,
    "bookId" INTEGER NOT NULL,
    "bookName" TEXT NOT NULL,
    "testament" TEXT NOT NULL CHECK ("testament" IN ('OT', 'NT')),
    "chapter" INTEGER NOT NULL,
    "verse" INTEGER NOT NULL,
    "globalRank" INTEGER NOT NULL UNIQUE,
    "globalDifficulty" INTEGER NOT NULL DEFAULT 500,
    "released" INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS "verse_texts" (
    "itemId" TEXT NOT NULL REFERENCES "items"("id"),
    "translationId" TEXT NOT NULL,
    "text" TEXT NOT NULL,
    PRIMARY KEY ("itemId", "translationId")
);

CREATE TABLE IF NOT EXISTS "questions" (
    "id" TEXT PRIMARY KEY,
    "itemId" TEXT NOT NULL REFERENCES "items"("id"),
    "kind" TEXT NOT NULL,
    "translationId" TEXT NOT NULL,
    "answerJson" TEXT NOT NULL,
    "difficulty" INTEGER NOT NULL DEFAULT 500,
    "active" INTEGER NOT NULL DEFAULT 1,
    "createdAt" INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS "questions_item_translation_idx"
    ON "questions" ("itemId", "translationId");

CREATE TABLE IF NOT EXISTS "learner_item_states" (
    "learnerId" TEXT NOT NULL,
    "itemId" TEXT NOT NULL REFERENCES "items"("id"),
    "mastery" REAL NOT NULL DEFAULT 0,
    "correctStreak" INTEGER NOT NULL DEFAULT 0,
    "lapseCount" INTEGER NOT NULL DEFAULT 0,
    "introducedAt" INTEGER NOT NULL,
    "lastSeenAt" INTEGER,
    "nextDueAt" INTEGER NOT NULL,
    PRIMARY KEY ("learnerId", "itemId")
);

CREATE INDEX IF NOT EXISTS "learner_item_states_due_idx"
    ON "learner_item_states" ("learnerId", "nextDueAt");

CREATE TABLE IF NOT EXISTS "attempts" (
    "id" TEXT PRIMARY KEY,
    "learnerId" TEXT NOT NULL,
    "itemId" TEXT NOT NULL REFERENCES "items"("id"),
    "questionId" TEXT NOT NULL,
    "isCorrect" INTEGER NOT NULL,
    "responseTimeMs" INTEGER,
    "createdAt" INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS "attempts_learner_item_idx"
    ON "attempts" ("learnerId", "itemId");

CREATE TABLE IF NOT EXISTS "learner_progressions" (
    "learnerId" TEXT PRIMARY KEY,
    "xp" INTEGER NOT NULL DEFAULT 0,
    "level" INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS "learner_progressions_rank_idx"
    ON "learner_progressions" ("level" DESC, "xp" DESC);
"#;

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Splits a SQL script on top-level `;`, ignoring semicolons inside quotes
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' if !in_double_quote => in_single_quote = !in_single_quote,
            '"' if !in_single_quote => in_double_quote = !in_double_quote,
            ';' if !in_single_quote && !in_double_quote => {
                let stmt = current.trim();
                if !stmt.is_empty() {
                    statements.push(stmt.to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self, DbInitError> {
        if let Some(parent) = database_file(database_url).and_then(|p| p.parent()) {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates missing tables and indexes; safe to run on every start
    pub async fn migrate(&self) -> Result<(), DbInitError> {
        for statement in split_sql_statements(SCHEMA_SQL) {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        tracing::debug!("sqlite schema ensured");
        Ok(())
    }
}

fn database_file(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next()?;
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(Path::new(path))
}

// ==================== Row mapping ====================

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {ms}")))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u32(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} out of range: {value}")))
}

fn to_u64(value: i64, column: &str) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} out of range: {value}")))
}

fn item_from_row(row: &SqliteRow) -> Result<Item, StoreError> {
    let testament: String = row.try_get("testament")?;
    Ok(Item {
        id: row.try_get("id")?,
        book_id: to_u32(row.try_get("bookId")?, "bookId")?,
        book_name: row.try_get("bookName")?,
        testament: Testament::from_str(&testament)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown testament: {testament}")))?,
        chapter: to_u32(row.try_get("chapter")?, "chapter")?,
        verse: to_u32(row.try_get("verse")?, "verse")?,
        global_rank: to_u32(row.try_get("globalRank")?, "globalRank")?,
        global_difficulty: to_u32(row.try_get("globalDifficulty")?, "globalDifficulty")?,
        released: row.try_get("released")?,
    })
}

/// `None` for rows whose kind or payload text cannot be read; those are
/// unplayable and skipped
fn question_from_row(row: &SqliteRow) -> Result<Option<Question>, StoreError> {
    let id: String = row.try_get("id")?;
    let kind_raw: String = row.try_get("kind")?;
    let Some(kind) = QuestionKind::from_str(&kind_raw) else {
        let err = QuestionError::UnknownKind(kind_raw);
        tracing::warn!(question_id = %id, error = %err, "skipping question");
        return Ok(None);
    };
    let answer_raw: String = row.try_get("answerJson")?;
    let answer_json = match serde_json::from_str(&answer_raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(question_id = %id, error = %err, "skipping question with invalid answer json");
            return Ok(None);
        }
    };

    Ok(Some(Question {
        id,
        item_id: row.try_get("itemId")?,
        kind,
        translation_id: row.try_get("translationId")?,
        answer_json,
        difficulty: to_u32(row.try_get("difficulty")?, "difficulty")?,
        active: row.try_get("active")?,
        created_at: from_millis(row.try_get("createdAt")?)?,
    }))
}

fn state_from_row(row: &SqliteRow) -> Result<LearnerItemState, StoreError> {
    let last_seen: Option<i64> = row.try_get("lastSeenAt")?;
    Ok(LearnerItemState {
        learner_id: row.try_get("learnerId")?,
        item_id: row.try_get("itemId")?,
        mastery: row.try_get("mastery")?,
        correct_streak: to_u32(row.try_get("correctStreak")?, "correctStreak")?,
        lapse_count: to_u32(row.try_get("lapseCount")?, "lapseCount")?,
        introduced_at: from_millis(row.try_get("introducedAt")?)?,
        last_seen_at: last_seen.map(from_millis).transpose()?,
        next_due_at: from_millis(row.try_get("nextDueAt")?)?,
    })
}

fn progression_from_row(row: &SqliteRow) -> Result<LearnerProgression, StoreError> {
    Ok(LearnerProgression {
        learner_id: row.try_get("learnerId")?,
        xp: to_u64(row.try_get("xp")?, "xp")?,
        level: to_u32(row.try_get("level")?, "level")?,
    })
}

const QUESTION_COLUMNS: &str = r#""id", "itemId", "kind", "translationId", "answerJson", "difficulty", "active", "createdAt""#;

const STATE_COLUMNS: &str = r#""learnerId", "itemId", "mastery", "correctStreak", "lapseCount", "introducedAt", "lastSeenAt", "nextDueAt""#;

#[async_trait]
impl RecordStore for SqliteStore {
    async fn find_items(&self, filters: &ItemFilters) -> Result<Vec<Item>, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT "id", "bookId", "bookName", "testament", "chapter", "verse",
                      "globalRank", "globalDifficulty", "released"
               FROM "items" WHERE 1 = 1"#,
        );
        if let Some(testament) = filters.testament.testament() {
            qb.push(r#" AND "testament" = "#);
            qb.push_bind(testament.as_str());
        }
        if !filters.book_ids.is_empty() {
            qb.push(r#" AND "bookId" IN ("#);
            {
                let mut separated = qb.separated(", ");
                for book_id in &filters.book_ids {
                    separated.push_bind(i64::from(*book_id));
                }
                separated.push_unseparated(")");
            }
        }
        qb.push(r#" ORDER BY "globalRank" ASC, "id" ASC"#);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn find_item(&self, item_id: &str) -> Result<Option<Item>, StoreError> {
        let row = sqlx::query(
            r#"SELECT "id", "bookId", "bookName", "testament", "chapter", "verse",
                      "globalRank", "globalDifficulty", "released"
               FROM "items" WHERE "id" = ?"#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn find_question(&self, question_id: &str) -> Result<Option<Question>, StoreError> {
        let sql = format!(r#"SELECT {QUESTION_COLUMNS} FROM "questions" WHERE "id" = ?"#);
        let row = sqlx::query(&sql)
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => question_from_row(&row),
            None => Ok(None),
        }
    }

    async fn find_questions(
        &self,
        item_ids: &[String],
        translation_id: &str,
        kind: Option<QuestionKind>,
    ) -> Result<Vec<Question>, StoreError> {
        let mut questions = Vec::new();

        for chunk in item_ids.chunks(MAX_IN_BINDS) {
            let mut qb = QueryBuilder::<Sqlite>::new(format!(
                r#"SELECT {QUESTION_COLUMNS} FROM "questions" WHERE "active" = 1 AND "translationId" = "#
            ));
            qb.push_bind(translation_id);
            if let Some(kind) = kind {
                qb.push(r#" AND "kind" = "#);
                qb.push_bind(kind.as_str());
            }
            qb.push(r#" AND "itemId" IN ("#);
            {
                let mut separated = qb.separated(", ");
                for id in chunk {
                    separated.push_bind(id.as_str());
                }
                separated.push_unseparated(")");
            }

            let rows = qb.build().fetch_all(&self.pool).await?;
            for row in &rows {
                if let Some(question) = question_from_row(row)? {
                    questions.push(question);
                }
            }
        }

        questions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(questions)
    }

    async fn find_state(
        &self,
        learner_id: &str,
        item_id: &str,
    ) -> Result<Option<LearnerItemState>, StoreError> {
        let sql = format!(
            r#"SELECT {STATE_COLUMNS} FROM "learner_item_states" WHERE "learnerId" = ? AND "itemId" = ?"#
        );
        let row = sqlx::query(&sql)
            .bind(learner_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(state_from_row).transpose()
    }

    async fn find_due_states(
        &self,
        learner_id: &str,
        item_ids: &[String],
        window: DueWindow,
        limit: usize,
    ) -> Result<Vec<LearnerItemState>, StoreError> {
        if limit == 0 || item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            r#"SELECT {STATE_COLUMNS} FROM "learner_item_states" WHERE "learnerId" = "#
        ));
        qb.push_bind(learner_id);
        if let Some(after) = window.after {
            qb.push(r#" AND "nextDueAt" > "#);
            qb.push_bind(to_millis(after));
        }
        qb.push(r#" AND "nextDueAt" <= "#);
        qb.push_bind(to_millis(window.until));
        qb.push(r#" ORDER BY "nextDueAt" ASC, "itemId" ASC"#);

        // The learner's own history is small; the filter universe may not be,
        // so membership is checked here instead of binding every item id.
        let wanted: HashSet<&str> = item_ids.iter().map(String::as_str).collect();
        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut states = Vec::new();
        for row in &rows {
            let state = state_from_row(row)?;
            if wanted.contains(state.item_id.as_str()) {
                states.push(state);
                if states.len() >= limit {
                    break;
                }
            }
        }
        Ok(states)
    }

    async fn started_item_ids(
        &self,
        learner_id: &str,
        item_ids: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        let rows = sqlx::query(r#"SELECT "itemId" FROM "learner_item_states" WHERE "learnerId" = ?"#)
            .bind(learner_id)
            .fetch_all(&self.pool)
            .await?;
        let wanted: HashSet<&str> = item_ids.iter().map(String::as_str).collect();
        let mut started = HashSet::new();
        for row in &rows {
            let item_id: String = row.try_get("itemId")?;
            if wanted.contains(item_id.as_str()) {
                started.insert(item_id);
            }
        }
        Ok(started)
    }

    async fn count_mastered(&self, learner_id: &str, threshold: f64) -> Result<u32, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM "learner_item_states" s
            JOIN "items" i ON i."id" = s."itemId"
            WHERE s."learnerId" = ? AND s."mastery" >= ?
            "#,
        )
        .bind(learner_id)
        .bind(threshold)
        .fetch_one(&self.pool)
        .await?;
        to_u32(count, "count")
    }

    async fn upsert_state(&self, state: &LearnerItemState) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "learner_item_states"
                ("learnerId", "itemId", "mastery", "correctStreak", "lapseCount",
                 "introducedAt", "lastSeenAt", "nextDueAt")
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT ("learnerId", "itemId") DO UPDATE SET
                "mastery" = excluded."mastery",
                "correctStreak" = excluded."correctStreak",
                "lapseCount" = excluded."lapseCount",
                "lastSeenAt" = excluded."lastSeenAt",
                "nextDueAt" = excluded."nextDueAt"
            "#,
        )
        .bind(&state.learner_id)
        .bind(&state.item_id)
        .bind(state.mastery)
        .bind(i64::from(state.correct_streak))
        .bind(i64::from(state.lapse_count))
        .bind(to_millis(state.introduced_at))
        .bind(state.last_seen_at.map(to_millis))
        .bind(to_millis(state.next_due_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "attempts"
                ("id", "learnerId", "itemId", "questionId", "isCorrect", "responseTimeMs", "createdAt")
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&attempt.id)
        .bind(&attempt.learner_id)
        .bind(&attempt.item_id)
        .bind(&attempt.question_id)
        .bind(attempt.is_correct)
        .bind(attempt.response_time_ms.map(to_i64))
        .bind(to_millis(attempt.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_attempts(&self, learner_id: &str, item_id: &str) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM "attempts" WHERE "learnerId" = ? AND "itemId" = ?"#,
        )
        .bind(learner_id)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;
        to_u64(count, "count")
    }

    async fn find_progression(
        &self,
        learner_id: &str,
    ) -> Result<Option<LearnerProgression>, StoreError> {
        let row = sqlx::query(
            r#"SELECT "learnerId", "xp", "level" FROM "learner_progressions" WHERE "learnerId" = ?"#,
        )
        .bind(learner_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(progression_from_row).transpose()
    }

    async fn upsert_progression(
        &self,
        progression: &LearnerProgression,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "learner_progressions" ("learnerId", "xp", "level")
            VALUES (?, ?, ?)
            ON CONFLICT ("learnerId") DO UPDATE SET
                "xp" = excluded."xp",
                "level" = excluded."level"
            "#,
        )
        .bind(&progression.learner_id)
        .bind(to_i64(progression.xp))
        .bind(i64::from(progression.level))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LearnerStanding>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT p."learnerId", COALESCE(l."username", p."learnerId") AS "username",
                   p."xp", p."level"
            FROM "learner_progressions" p
            LEFT JOIN "learners" l ON l."id" = p."learnerId"
            ORDER BY p."level" DESC, p."xp" DESC, p."learnerId" ASC
            LIMIT ?
            "#,
        )
        .bind(to_i64(limit as u64))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<LearnerStanding, StoreError> {
                Ok(LearnerStanding {
                    learner_id: row.try_get("learnerId")?,
                    username: row.try_get("username")?,
                    xp: to_u64(row.try_get("xp")?, "xp")?,
                    level: to_u32(row.try_get("level")?, "level")?,
                })
            })
            .collect()
    }

    async fn count_ranked_above(&self, level: u32, xp: u64) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM "learner_progressions"
            WHERE "level" > ? OR ("level" = ? AND "xp" > ?)
            "#,
        )
        .bind(i64::from(level))
        .bind(i64::from(level))
        .bind(to_i64(xp))
        .fetch_one(&self.pool)
        .await?;
        to_u64(count, "count")
    }

    async fn find_learner_by_session(
        &self,
        token_hash: &str,
    ) -> Result<Option<String>, StoreError> {
        let learner_id: Option<String> =
            sqlx::query_scalar(r#"SELECT "learnerId" FROM "sessions" WHERE "tokenHash" = ?"#)
                .bind(token_hash)
                .fetch_optional(&self.pool)
                .await?;
        Ok(learner_id)
    }

    async fn insert_learner(&self, learner: &Learner) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "learners" ("id", "username") VALUES (?, ?)
            ON CONFLICT ("id") DO UPDATE SET "username" = excluded."username"
            "#,
        )
        .bind(&learner.id)
        .bind(&learner.username)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_session(&self, token_hash: &str, learner_id: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "sessions" ("tokenHash", "learnerId") VALUES (?, ?)
            ON CONFLICT ("tokenHash") DO UPDATE SET "learnerId" = excluded."learnerId"
            "#,
        )
        .bind(token_hash)
        .bind(learner_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_item(&self, item: &Item) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "items"
                ("id", "bookId", "bookName", "testament", "chapter", "verse",
                 "globalRank", "globalDifficulty", "released")
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT ("id") DO UPDATE SET
                "bookId" = excluded."bookId",
                "bookName" = excluded."bookName",
                "testament" = excluded."testament",
                "chapter" = excluded."chapter",
                "verse" = excluded."verse",
                "globalRank" = excluded."globalRank",
                "globalDifficulty" = excluded."globalDifficulty",
                "released" = excluded."released"
            "#,
        )
        .bind(&item.id)
        .bind(i64::from(item.book_id))
        .bind(&item.book_name)
        .bind(item.testament.as_str())
        .bind(i64::from(item.chapter))
        .bind(i64::from(item.verse))
        .bind(i64::from(item.global_rank))
        .bind(i64::from(item.global_difficulty))
        .bind(item.released)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_question(&self, question: &Question) -> Result<(), StoreError> {
        let answer_json = serde_json::to_string(&question.answer_json)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO "questions"
                ("id", "itemId", "kind", "translationId", "answerJson", "difficulty", "active", "createdAt")
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT ("id") DO UPDATE SET
                "itemId" = excluded."itemId",
                "kind" = excluded."kind",
                "translationId" = excluded."translationId",
                "answerJson" = excluded."answerJson",
                "difficulty" = excluded."difficulty",
                "active" = excluded."active"
            "#,
        )
        .bind(&question.id)
        .bind(&question.item_id)
        .bind(question.kind.as_str())
        .bind(&question.translation_id)
        .bind(answer_json)
        .bind(i64::from(question.difficulty))
        .bind(question.active)
        .bind(to_millis(question.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_verse_text(
        &self,
        item_id: &str,
        translation_id: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "verse_texts" ("itemId", "translationId", "text") VALUES (?, ?, ?)
            ON CONFLICT ("itemId", "translationId") DO UPDATE SET "text" = excluded."text"
            "#,
        )
        .bind(item_id)
        .bind(translation_id)
        .bind(text)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ContentProvider for SqliteStore {
    async fn verse_text(
        &self,
        item_id: &str,
        translation_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let text: Option<String> = sqlx::query_scalar(
            r#"SELECT "text" FROM "verse_texts" WHERE "itemId" = ? AND "translationId" = ?"#,
        )
        .bind(item_id)
        .bind(translation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(text)
    }
}
