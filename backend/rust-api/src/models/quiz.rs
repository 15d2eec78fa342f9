use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Quiz attached to a content unit ("quizzes" collection). One quiz per
/// content unit; questions live in their own collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content_id: ObjectId,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub quiz_id: ObjectId,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: u32,
    pub order_index: i32,
}

/// One quiz submission ("quiz_attempts" collection). Append-only: every
/// attempt is retained, the average on the dashboard spans all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttemptRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub quiz_id: ObjectId,
    pub score: f64,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub time_taken_seconds: u32,
    #[serde(rename = "completedAt", with = "super::bson_datetime_as_chrono")]
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
}

impl QuizSummary {
    pub fn from_record(record: &QuizRecord) -> Self {
        Self {
            id: record.id.to_hex(),
            title: record.title.clone(),
        }
    }
}

/// Question as served to the client: the correct option never leaves the
/// server before an attempt is graded.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub order_index: i32,
}

impl QuestionView {
    pub fn from_record(record: &QuestionRecord) -> Self {
        Self {
            id: record.id.to_hex(),
            prompt: record.prompt.clone(),
            options: record.options.clone(),
            order_index: record.order_index,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuizDetail {
    pub id: String,
    pub content_id: String,
    pub title: String,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    /// Chosen option index per question, in question order.
    #[validate(length(min = 1))]
    pub answers: Vec<u32>,
    pub time_taken_seconds: u32,
}

#[derive(Debug, Serialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub chosen_option: u32,
    pub correct_option: u32,
    pub correct: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitAttemptResponse {
    pub attempt_id: String,
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub results: Vec<QuestionResult>,
}

#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub id: String,
    pub quiz_id: String,
    pub score: f64,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub time_taken_seconds: u32,
    pub completed_at: String,
}

impl AttemptView {
    pub fn from_record(record: &QuizAttemptRecord) -> Self {
        Self {
            id: record.id.map(|id| id.to_hex()).unwrap_or_default(),
            quiz_id: record.quiz_id.to_hex(),
            score: record.score,
            total_questions: record.total_questions,
            correct_answers: record.correct_answers,
            time_taken_seconds: record.time_taken_seconds,
            completed_at: record.completed_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn attempt_record_round_trips_through_bson() {
        let record = QuizAttemptRecord {
            id: Some(ObjectId::new()),
            user_id: ObjectId::new(),
            quiz_id: ObjectId::new(),
            score: 80.0,
            total_questions: 5,
            correct_answers: 4,
            time_taken_seconds: 92,
            completed_at: Utc::now(),
        };

        let document = mongodb::bson::to_document(&record).expect("serialize");
        let parsed: QuizAttemptRecord =
            mongodb::bson::from_document(document).expect("deserialize");
        assert_eq!(parsed.score, 80.0);
        assert_eq!(parsed.correct_answers, 4);
    }

    #[test]
    fn question_view_hides_correct_option() {
        let record = QuestionRecord {
            id: ObjectId::new(),
            quiz_id: ObjectId::new(),
            prompt: "Who found the seed?".to_string(),
            options: vec!["The hen".to_string(), "The cat".to_string()],
            correct_option: 0,
            order_index: 0,
        };

        let view = QuestionView::from_record(&record);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("correct_option").is_none());
        assert_eq!(json["options"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn submit_attempt_requires_answers() {
        let request = SubmitAttemptRequest {
            answers: vec![],
            time_taken_seconds: 10,
        };
        assert!(validator::Validate::validate(&request).is_err());
    }

    #[test]
    fn quiz_record_deserializes_from_document() {
        let quiz_id = ObjectId::new();
        let content_id = ObjectId::new();
        let document = doc! {
            "_id": quiz_id,
            "content_id": content_id,
            "title": "Story check",
        };
        let parsed: QuizRecord = mongodb::bson::from_document(document).expect("quiz");
        assert_eq!(parsed.id, quiz_id);
        assert_eq!(parsed.content_id, content_id);
    }
}
