use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{CoachError, Result};
use crate::models::{Difficulty, PerformanceRecord, Progress, ReviewItem};
use crate::scheduler::{convert_score_to_quality, SpacedRepetitionScheduler};

const PROGRESS_COLUMNS: &str = r#"
    user_id, topic_id, topic_name, mastery_level, time_spent_minutes,
    ease_factor, interval_days, repetition_count, next_review, last_review, last_studied
"#;

/// SQLite store for per-user progress, review state and graded answers.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                topic_id TEXT NOT NULL,
                topic_name TEXT NOT NULL,
                mastery_level REAL NOT NULL DEFAULT 0,
                time_spent_minutes INTEGER NOT NULL DEFAULT 0,
                ease_factor REAL NOT NULL DEFAULT 2.5,
                interval_days INTEGER NOT NULL DEFAULT 1,
                repetition_count INTEGER NOT NULL DEFAULT 0,
                next_review TEXT,
                last_review TEXT,
                last_studied TEXT,
                UNIQUE (user_id, topic_id)
            );

            -- Every SM-2 grading applied to a progress row
            CREATE TABLE IF NOT EXISTS review_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                topic_id TEXT NOT NULL,
                quality INTEGER NOT NULL CHECK(quality BETWEEN 0 AND 5),
                reviewed_at TEXT NOT NULL
            );

            -- Graded answers, append-only
            CREATE TABLE IF NOT EXISTS performance_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                topic_id TEXT NOT NULL,
                concept TEXT NOT NULL,
                correct INTEGER NOT NULL,
                difficulty TEXT NOT NULL CHECK(difficulty IN ('easy', 'medium', 'hard')),
                time_taken_seconds INTEGER NOT NULL DEFAULT 0,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_progress_user ON progress(user_id);
            CREATE INDEX IF NOT EXISTS idx_review_history_user ON review_history(user_id);
            CREATE INDEX IF NOT EXISTS idx_performance_user ON performance_records(user_id);
            CREATE INDEX IF NOT EXISTS idx_performance_topic ON performance_records(topic_id);
            "#,
        )?;

        debug!("database schema ready");
        Ok(())
    }

    // Progress operations
    pub fn get_progress(&self, user_id: i64, topic_id: &str) -> Result<Option<Progress>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM progress WHERE user_id = ?1 AND topic_id = ?2",
            PROGRESS_COLUMNS
        ))?;

        match stmt.query_row(params![user_id, topic_id], progress_from_row) {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_progress(&self, user_id: i64) -> Result<Vec<Progress>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM progress WHERE user_id = ?1 ORDER BY topic_id",
            PROGRESS_COLUMNS
        ))?;

        let rows = stmt.query_map(params![user_id], progress_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Review state of every tracked topic, for feeding the scheduler.
    pub fn review_items(&self, user_id: i64) -> Result<Vec<ReviewItem>> {
        Ok(self
            .list_progress(user_id)?
            .into_iter()
            .map(|p| p.review)
            .collect())
    }

    /// Inserts or replaces the row for `(progress.user_id, topic)`.
    pub fn save_progress(&self, progress: &Progress) -> Result<()> {
        let review = &progress.review;
        self.conn.execute(
            r#"
            INSERT INTO progress (
                user_id, topic_id, topic_name, mastery_level, time_spent_minutes,
                ease_factor, interval_days, repetition_count, next_review, last_review, last_studied
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT (user_id, topic_id) DO UPDATE SET
                topic_name = excluded.topic_name,
                mastery_level = excluded.mastery_level,
                time_spent_minutes = excluded.time_spent_minutes,
                ease_factor = excluded.ease_factor,
                interval_days = excluded.interval_days,
                repetition_count = excluded.repetition_count,
                next_review = excluded.next_review,
                last_review = excluded.last_review,
                last_studied = excluded.last_studied
            "#,
            params![
                progress.user_id,
                review.topic_id,
                review.topic_name,
                progress.mastery_level,
                progress.time_spent_minutes,
                review.ease_factor,
                review.interval_days,
                review.repetition_count,
                review.next_review_date.map(|d| d.to_rfc3339()),
                review.last_review_date.map(|d| d.to_rfc3339()),
                progress.last_studied.map(|d| d.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Records a study session: sets mastery, adds time and reschedules the
    /// topic with the quality derived from the new mastery.
    pub fn record_study(
        &self,
        user_id: i64,
        topic_id: &str,
        topic_name: &str,
        mastery_level: f64,
        minutes: i64,
        now: DateTime<Utc>,
    ) -> Result<Progress> {
        if !(0.0..=100.0).contains(&mastery_level) {
            return Err(CoachError::invalid(format!(
                "mastery level must be between 0 and 100, got {}",
                mastery_level
            )));
        }
        if minutes < 0 {
            return Err(CoachError::invalid(format!(
                "minutes studied cannot be negative, got {}",
                minutes
            )));
        }

        let mut progress = self
            .get_progress(user_id, topic_id)?
            .unwrap_or_else(|| Progress::new(user_id, topic_id, topic_name));
        progress.mastery_level = mastery_level;
        progress.time_spent_minutes += minutes;
        progress.last_studied = Some(now);

        let quality = convert_score_to_quality(mastery_level);
        self.apply_review(progress, quality, now)
    }

    /// Grades one recall of a topic directly with an SM-2 quality.
    pub fn record_review(
        &self,
        user_id: i64,
        topic_id: &str,
        topic_name: &str,
        quality: u8,
        now: DateTime<Utc>,
    ) -> Result<Progress> {
        let progress = self
            .get_progress(user_id, topic_id)?
            .unwrap_or_else(|| Progress::new(user_id, topic_id, topic_name));
        self.apply_review(progress, quality, now)
    }

    fn apply_review(&self, mut progress: Progress, quality: u8, now: DateTime<Utc>) -> Result<Progress> {
        progress.review =
            SpacedRepetitionScheduler::new().calculate_next_review_at(&progress.review, quality, now)?;

        // progress and its history row land together or not at all
        let tx = self.conn.unchecked_transaction()?;
        self.save_progress(&progress)?;
        tx.execute(
            "INSERT INTO review_history (user_id, topic_id, quality, reviewed_at) VALUES (?1, ?2, ?3, ?4)",
            params![progress.user_id, progress.topic_id(), quality, now.to_rfc3339()],
        )?;
        tx.commit()?;

        info!(
            user_id = progress.user_id,
            topic_id = progress.topic_id(),
            quality,
            interval_days = progress.review.interval_days,
            "review recorded"
        );
        Ok(progress)
    }

    /// Ids of topics whose mastery meets `threshold`, sorted.
    pub fn completed_topic_ids(&self, user_id: i64, threshold: f64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT topic_id FROM progress WHERE user_id = ?1 AND mastery_level >= ?2 ORDER BY topic_id",
        )?;
        let rows = stmt.query_map(params![user_id, threshold], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    // Performance operations
    pub fn record_performance(&self, user_id: i64, record: &PerformanceRecord) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO performance_records
                (user_id, topic_id, concept, correct, difficulty, time_taken_seconds, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                user_id,
                record.topic_id,
                record.concept,
                record.correct,
                record.difficulty.as_str(),
                record.time_taken_seconds,
                record.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All graded answers for a user, oldest first.
    pub fn list_performance(&self, user_id: i64) -> Result<Vec<PerformanceRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT topic_id, concept, correct, difficulty, time_taken_seconds, recorded_at
            FROM performance_records
            WHERE user_id = ?1
            ORDER BY recorded_at ASC, id ASC
            "#,
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            let difficulty_str: String = row.get(3)?;
            let difficulty = Difficulty::from_str(&difficulty_str).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    Type::Text,
                    format!("unknown difficulty '{}'", difficulty_str).into(),
                )
            })?;
            Ok(PerformanceRecord {
                topic_id: row.get(0)?,
                concept: row.get(1)?,
                correct: row.get(2)?,
                difficulty,
                time_taken_seconds: row.get(4)?,
                timestamp: parse_timestamp(row, 5)?.ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(5, Type::Null, "missing timestamp".into())
                })?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_stats(&self, user_id: i64, completion_threshold: f64, now: DateTime<Utc>) -> Result<Stats> {
        let (tracked_topics, avg_mastery, minutes_studied): (i64, f64, i64) = self.conn.query_row(
            r#"
            SELECT COUNT(*), COALESCE(AVG(mastery_level), 0), COALESCE(SUM(time_spent_minutes), 0)
            FROM progress WHERE user_id = ?1
            "#,
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let completed: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM progress WHERE user_id = ?1 AND mastery_level >= ?2",
            params![user_id, completion_threshold],
            |row| row.get(0),
        )?;

        let total_reviews: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM review_history WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        let (total_answers, correct_answers): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(correct), 0) FROM performance_records WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        // next_review is stored as text, so compare in Rust rather than SQL
        let due_now = self
            .review_items(user_id)?
            .iter()
            .filter(|item| item.is_due_at(now))
            .count() as i64;

        Ok(Stats {
            tracked_topics,
            completed,
            total_reviews,
            total_answers,
            correct_answers,
            due_now,
            avg_mastery,
            minutes_studied,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub tracked_topics: i64,
    pub completed: i64,
    pub total_reviews: i64,
    pub total_answers: i64,
    pub correct_answers: i64,
    pub due_now: i64,
    pub avg_mastery: f64,
    pub minutes_studied: i64,
}

fn progress_from_row(row: &Row) -> rusqlite::Result<Progress> {
    Ok(Progress {
        user_id: row.get(0)?,
        mastery_level: row.get(3)?,
        time_spent_minutes: row.get(4)?,
        last_studied: parse_timestamp(row, 10)?,
        review: ReviewItem {
            topic_id: row.get(1)?,
            topic_name: row.get(2)?,
            ease_factor: row.get(5)?,
            interval_days: row.get(6)?,
            repetition_count: row.get(7)?,
            next_review_date: parse_timestamp(row, 8)?,
            last_review_date: parse_timestamp(row, 9)?,
        },
    })
}

fn parse_timestamp(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}
