use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;

use crate::models::content::ContentRecord;
use crate::models::progress::{ProgressStatus, UserProgressRecord};
use crate::models::quiz::QuizAttemptRecord;
use crate::models::session::ReadingSessionRecord;
use crate::models::ReadingLevel;

/// Scalar aggregates derived from one user's collections.
///
/// Inputs are taken as-is: numeric ranges are enforced by the write path,
/// not re-validated here, and rows referencing deleted content still count
/// wherever no join is needed (a completed row for a removed story is still
/// a completion).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressAggregates {
    pub completed_count: u32,
    pub eligible_content_count: u32,
    pub overall_progress_percent: f64,
    pub total_words_read: u64,
    pub total_reading_time_seconds: u64,
    pub attempt_count: u32,
    pub average_quiz_score: f64,
    pub perfect_quiz_count: u32,
    pub session_count: u32,
}

impl ProgressAggregates {
    pub fn compute(
        level: ReadingLevel,
        content: &[ContentRecord],
        progress: &[UserProgressRecord],
        attempts: &[QuizAttemptRecord],
        sessions: &[ReadingSessionRecord],
    ) -> Self {
        let completed_count = progress
            .iter()
            .filter(|row| row.status == ProgressStatus::Completed)
            .count() as u32;

        let eligible_content_count = content
            .iter()
            .filter(|item| item.difficulty == level)
            .count() as u32;

        // Zero eligible content yields 0%, never NaN.
        let overall_progress_percent = if eligible_content_count > 0 {
            f64::from(completed_count) / f64::from(eligible_content_count) * 100.0
        } else {
            0.0
        };

        let total_words_read = sessions
            .iter()
            .map(|session| u64::from(session.words_read))
            .sum();
        let total_reading_time_seconds = sessions
            .iter()
            .map(|session| u64::from(session.session_duration_seconds))
            .sum();

        let attempt_count = attempts.len() as u32;
        let average_quiz_score = if attempt_count > 0 {
            attempts.iter().map(|attempt| attempt.score).sum::<f64>()
                / f64::from(attempt_count)
        } else {
            0.0
        };

        // Exact equality: a 99.99 score is not a perfect quiz.
        let perfect_quiz_count = attempts
            .iter()
            .filter(|attempt| attempt.score == 100.0)
            .count() as u32;

        Self {
            completed_count,
            eligible_content_count,
            overall_progress_percent,
            total_words_read,
            total_reading_time_seconds,
            attempt_count,
            average_quiz_score,
            perfect_quiz_count,
            session_count: sessions.len() as u32,
        }
    }
}

/// Completion percentage per content id, built once per evaluation.
///
/// The store keeps at most one progress row per (user, content); should that
/// invariant ever be violated, the first row in input order wins so repeated
/// evaluations stay deterministic.
pub fn completion_by_content(progress: &[UserProgressRecord]) -> HashMap<ObjectId, f64> {
    let mut map = HashMap::with_capacity(progress.len());
    for row in progress {
        map.entry(row.content_id)
            .or_insert(row.completion_percentage);
    }
    map
}

/// Completion for a single content unit; missing progress reads as 0%.
pub fn completion_for(map: &HashMap<ObjectId, f64>, content_id: &ObjectId) -> f64 {
    map.get(content_id).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mongodb::bson::DateTime as BsonDateTime;

    fn content(difficulty: ReadingLevel) -> ContentRecord {
        ContentRecord {
            id: ObjectId::new(),
            title: "Fixture".to_string(),
            body: "Fixture body".to_string(),
            content_type: crate::models::content::ContentType::Story,
            difficulty,
            order_index: 0,
            created_at: BsonDateTime::now(),
            updated_at: BsonDateTime::now(),
        }
    }

    fn progress(content_id: ObjectId, status: ProgressStatus, pct: f64) -> UserProgressRecord {
        UserProgressRecord {
            id: None,
            user_id: ObjectId::new(),
            content_id,
            status,
            completion_percentage: pct,
            time_spent_seconds: 0,
            last_accessed: Utc::now(),
        }
    }

    fn attempt(score: f64) -> QuizAttemptRecord {
        QuizAttemptRecord {
            id: None,
            user_id: ObjectId::new(),
            quiz_id: ObjectId::new(),
            score,
            total_questions: 5,
            correct_answers: 0,
            time_taken_seconds: 60,
            completed_at: Utc::now(),
        }
    }

    fn session(words: u32, seconds: u32) -> ReadingSessionRecord {
        ReadingSessionRecord {
            id: None,
            user_id: ObjectId::new(),
            content_id: ObjectId::new(),
            words_read: words,
            session_duration_seconds: seconds,
            reading_accuracy: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    #[test]
    fn empty_inputs_yield_zeroes() {
        let aggregates =
            ProgressAggregates::compute(ReadingLevel::Beginner, &[], &[], &[], &[]);
        assert_eq!(aggregates.completed_count, 0);
        assert_eq!(aggregates.overall_progress_percent, 0.0);
        assert_eq!(aggregates.average_quiz_score, 0.0);
        assert_eq!(aggregates.total_words_read, 0);
        assert_eq!(aggregates.total_reading_time_seconds, 0);
        assert!(!aggregates.overall_progress_percent.is_nan());
    }

    #[test]
    fn single_completed_beginner_story_is_full_progress() {
        let item = content(ReadingLevel::Beginner);
        let rows = vec![progress(item.id, ProgressStatus::Completed, 100.0)];

        let aggregates =
            ProgressAggregates::compute(ReadingLevel::Beginner, &[item], &rows, &[], &[]);
        assert_eq!(aggregates.completed_count, 1);
        assert_eq!(aggregates.eligible_content_count, 1);
        assert_eq!(aggregates.overall_progress_percent, 100.0);
    }

    #[test]
    fn no_eligible_content_gives_zero_percent_despite_completions() {
        let rows = vec![progress(ObjectId::new(), ProgressStatus::Completed, 100.0)];
        let aggregates =
            ProgressAggregates::compute(ReadingLevel::Beginner, &[], &rows, &[], &[]);
        assert_eq!(aggregates.eligible_content_count, 0);
        assert_eq!(aggregates.completed_count, 1);
        assert_eq!(aggregates.overall_progress_percent, 0.0);
    }

    #[test]
    fn orphaned_progress_rows_still_count_as_completions() {
        // Progress referencing content that no longer exists in the catalog.
        let item = content(ReadingLevel::Beginner);
        let rows = vec![
            progress(item.id, ProgressStatus::Completed, 100.0),
            progress(ObjectId::new(), ProgressStatus::Completed, 100.0),
        ];

        let aggregates =
            ProgressAggregates::compute(ReadingLevel::Beginner, &[item], &rows, &[], &[]);
        assert_eq!(aggregates.completed_count, 2);
        assert_eq!(aggregates.eligible_content_count, 1);
    }

    #[test]
    fn content_outside_user_level_is_not_eligible() {
        let items = vec![
            content(ReadingLevel::Beginner),
            content(ReadingLevel::Advanced),
            content(ReadingLevel::Advanced),
        ];
        let aggregates =
            ProgressAggregates::compute(ReadingLevel::Advanced, &items, &[], &[], &[]);
        assert_eq!(aggregates.eligible_content_count, 2);
    }

    #[test]
    fn average_spans_all_attempts_and_perfect_is_exact() {
        let attempts = vec![attempt(100.0), attempt(80.0), attempt(99.99)];
        let aggregates =
            ProgressAggregates::compute(ReadingLevel::Beginner, &[], &[], &attempts, &[]);
        assert!((aggregates.average_quiz_score - 93.33).abs() < 0.01);
        assert_eq!(aggregates.perfect_quiz_count, 1);
        assert_eq!(aggregates.attempt_count, 3);
    }

    #[test]
    fn session_totals_sum_words_and_seconds() {
        let sessions = vec![session(60, 900), session(60, 900)];
        let aggregates =
            ProgressAggregates::compute(ReadingLevel::Beginner, &[], &[], &[], &sessions);
        assert_eq!(aggregates.total_words_read, 120);
        assert_eq!(aggregates.total_reading_time_seconds, 1800);
        assert_eq!(aggregates.session_count, 2);
    }

    #[test]
    fn compute_is_idempotent() {
        let item = content(ReadingLevel::Beginner);
        let rows = vec![progress(item.id, ProgressStatus::Completed, 100.0)];
        let attempts = vec![attempt(100.0), attempt(80.0)];
        let sessions = vec![session(60, 900)];

        let content_slice = [item];
        let first = ProgressAggregates::compute(
            ReadingLevel::Beginner,
            &content_slice,
            &rows,
            &attempts,
            &sessions,
        );
        let second = ProgressAggregates::compute(
            ReadingLevel::Beginner,
            &content_slice,
            &rows,
            &attempts,
            &sessions,
        );
        assert_eq!(first, second);
    }

    #[test]
    fn completion_lookup_prefers_first_row_on_duplicates() {
        let content_id = ObjectId::new();
        let rows = vec![
            progress(content_id, ProgressStatus::InProgress, 40.0),
            progress(content_id, ProgressStatus::Completed, 100.0),
        ];

        let map = completion_by_content(&rows);
        assert_eq!(completion_for(&map, &content_id), 40.0);
    }

    #[test]
    fn completion_lookup_defaults_to_zero() {
        let map = completion_by_content(&[]);
        assert_eq!(completion_for(&map, &ObjectId::new()), 0.0);
    }
}
