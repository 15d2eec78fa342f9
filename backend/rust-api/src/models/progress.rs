use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }
}

/// Per-(user, content) progress row ("user_progress" collection).
///
/// At most one document per pair: the write path upserts on
/// `{user_id, content_id}`, so a row is created on first interaction and
/// mutated in place afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProgressRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub content_id: ObjectId,
    pub status: ProgressStatus,
    pub completion_percentage: f64,
    pub time_spent_seconds: u32,
    #[serde(rename = "lastAccessed", with = "super::bson_datetime_as_chrono")]
    pub last_accessed: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProgressRequest {
    pub status: ProgressStatus,
    #[validate(range(min = 0.0, max = 100.0))]
    pub completion_percentage: f64,
    /// Cumulative time on this content, replacing the stored value.
    pub time_spent_seconds: u32,
}

#[derive(Debug, Serialize)]
pub struct ProgressView {
    pub content_id: String,
    pub status: ProgressStatus,
    pub completion_percentage: f64,
    pub time_spent_seconds: u32,
    pub last_accessed: String,
}

impl ProgressView {
    pub fn from_record(record: &UserProgressRecord) -> Self {
        Self {
            content_id: record.content_id.to_hex(),
            status: record.status,
            completion_percentage: record.completion_percentage,
            time_spent_seconds: record.time_spent_seconds,
            last_accessed: record.last_accessed.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn progress_status_uses_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&ProgressStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::from_str::<ProgressStatus>("\"not_started\"").unwrap(),
            ProgressStatus::NotStarted
        );
    }

    #[test]
    fn update_request_rejects_percentage_above_hundred() {
        let request = UpdateProgressRequest {
            status: ProgressStatus::InProgress,
            completion_percentage: 120.0,
            time_spent_seconds: 30,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn progress_record_deserializes_from_document() {
        let user_id = ObjectId::new();
        let content_id = ObjectId::new();
        let document = doc! {
            "user_id": user_id,
            "content_id": content_id,
            "status": "completed",
            "completion_percentage": 100.0,
            "time_spent_seconds": 240,
            "lastAccessed": mongodb::bson::DateTime::now(),
        };

        let parsed: UserProgressRecord =
            mongodb::bson::from_document(document).expect("progress should deserialize");
        assert_eq!(parsed.status, ProgressStatus::Completed);
        assert_eq!(parsed.completion_percentage, 100.0);
        assert!(parsed.id.is_none());
    }
}
