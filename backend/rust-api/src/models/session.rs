use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// In-flight reading session, staged in Redis under
/// `reading_session:{id}` until the client finishes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveReadingSession {
    pub id: String,
    pub user_id: String,
    pub content_id: String,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Finished reading session, persisted to the "reading_sessions"
/// collection. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingSessionRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub content_id: ObjectId,
    pub words_read: u32,
    pub session_duration_seconds: u32,
    #[serde(default)]
    pub reading_accuracy: Option<f64>,
    #[serde(rename = "startedAt", with = "super::bson_datetime_as_chrono")]
    pub started_at: DateTime<Utc>,
    #[serde(
        rename = "endedAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "super::bson_datetime_as_chrono_option"
    )]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartSessionRequest {
    #[validate(length(min = 1))]
    pub content_id: String,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub content_id: String,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FinishSessionRequest {
    pub words_read: u32,
    /// Wall-clock reading time reported by the player; when absent the
    /// server uses the elapsed time since the session started.
    #[serde(default)]
    pub session_duration_seconds: Option<u32>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0))]
    pub reading_accuracy: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: String,
    pub content_id: String,
    pub words_read: u32,
    pub session_duration_seconds: u32,
    pub reading_accuracy: Option<f64>,
    pub started_at: String,
    pub ended_at: Option<String>,
}

impl SessionView {
    pub fn from_record(record: &ReadingSessionRecord) -> Self {
        Self {
            id: record.id.map(|id| id.to_hex()).unwrap_or_default(),
            content_id: record.content_id.to_hex(),
            words_read: record.words_read,
            session_duration_seconds: record.session_duration_seconds,
            reading_accuracy: record.reading_accuracy,
            started_at: record.started_at.to_rfc3339(),
            ended_at: record.ended_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_record_round_trips_through_bson() {
        let record = ReadingSessionRecord {
            id: None,
            user_id: ObjectId::new(),
            content_id: ObjectId::new(),
            words_read: 120,
            session_duration_seconds: 300,
            reading_accuracy: Some(94.5),
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
        };

        let document = mongodb::bson::to_document(&record).expect("serialize");
        let parsed: ReadingSessionRecord =
            mongodb::bson::from_document(document).expect("deserialize");
        assert_eq!(parsed.words_read, 120);
        assert_eq!(parsed.reading_accuracy, Some(94.5));
    }

    #[test]
    fn finish_request_rejects_accuracy_above_hundred() {
        let request = FinishSessionRequest {
            words_read: 50,
            session_duration_seconds: Some(60),
            reading_accuracy: Some(101.0),
        };
        assert!(request.validate().is_err());
    }
}
