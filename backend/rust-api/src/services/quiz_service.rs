use anyhow::{anyhow, Context};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::metrics::QUIZ_ATTEMPTS_TOTAL;
use crate::models::quiz::{
    AttemptView, QuestionRecord, QuestionResult, QuestionView, QuizAttemptRecord, QuizDetail,
    QuizRecord, SubmitAttemptRequest, SubmitAttemptResponse,
};
use crate::services::ServiceError;

pub struct QuizService {
    mongo: Database,
}

impl QuizService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Quiz with its questions, answers stripped.
    pub async fn get_quiz_for_content(
        &self,
        content_id: &ObjectId,
    ) -> Result<QuizDetail, ServiceError> {
        let quizzes = self.mongo.collection::<QuizRecord>("quizzes");
        let quiz = quizzes
            .find_one(doc! { "content_id": content_id })
            .await
            .context("Failed to query quiz")?
            .ok_or_else(|| ServiceError::not_found("No quiz for this content"))?;

        let questions = self.load_questions(&quiz.id).await?;

        Ok(QuizDetail {
            id: quiz.id.to_hex(),
            content_id: quiz.content_id.to_hex(),
            title: quiz.title,
            questions: questions.iter().map(QuestionView::from_record).collect(),
        })
    }

    /// Grades a submission against the stored questions and appends an
    /// immutable attempt. Attempts are never deduplicated or overwritten.
    pub async fn submit_attempt(
        &self,
        user_id: &ObjectId,
        quiz_id: &ObjectId,
        req: &SubmitAttemptRequest,
    ) -> Result<SubmitAttemptResponse, ServiceError> {
        let quizzes = self.mongo.collection::<QuizRecord>("quizzes");
        let quiz = quizzes
            .find_one(doc! { "_id": quiz_id })
            .await
            .context("Failed to query quiz")?
            .ok_or_else(|| ServiceError::not_found("Quiz not found"))?;

        let questions = self.load_questions(&quiz.id).await?;
        if questions.is_empty() {
            return Err(ServiceError::invalid_input("Quiz has no questions"));
        }
        if req.answers.len() != questions.len() {
            return Err(ServiceError::invalid_input(format!(
                "Expected {} answers, got {}",
                questions.len(),
                req.answers.len()
            )));
        }

        let results: Vec<QuestionResult> = questions
            .iter()
            .zip(req.answers.iter())
            .map(|(question, &chosen)| QuestionResult {
                question_id: question.id.to_hex(),
                chosen_option: chosen,
                correct_option: question.correct_option,
                correct: chosen == question.correct_option,
            })
            .collect();

        let correct_answers = results.iter().filter(|r| r.correct).count() as u32;
        let total_questions = questions.len() as u32;
        let score = f64::from(correct_answers) / f64::from(total_questions) * 100.0;

        let attempt = QuizAttemptRecord {
            id: None,
            user_id: *user_id,
            quiz_id: *quiz_id,
            score,
            total_questions,
            correct_answers,
            time_taken_seconds: req.time_taken_seconds,
            completed_at: Utc::now(),
        };

        let attempts = self
            .mongo
            .collection::<QuizAttemptRecord>("quiz_attempts");
        let insert_result = attempts
            .insert_one(&attempt)
            .await
            .context("Failed to insert quiz attempt")?;
        let attempt_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted attempt ID"))?;

        let perfect = if score == 100.0 { "true" } else { "false" };
        QUIZ_ATTEMPTS_TOTAL.with_label_values(&[perfect]).inc();

        tracing::info!(
            "Quiz attempt recorded: user={} quiz={} score={:.1}",
            user_id.to_hex(),
            quiz_id.to_hex(),
            score
        );

        Ok(SubmitAttemptResponse {
            attempt_id: attempt_id.to_hex(),
            score,
            correct_answers,
            total_questions,
            results,
        })
    }

    pub async fn list_attempts_for_quiz(
        &self,
        user_id: &ObjectId,
        quiz_id: &ObjectId,
    ) -> Result<Vec<AttemptView>, ServiceError> {
        let attempts = self
            .mongo
            .collection::<QuizAttemptRecord>("quiz_attempts");
        let records: Vec<QuizAttemptRecord> = attempts
            .find(doc! { "user_id": user_id, "quiz_id": quiz_id })
            .sort(doc! { "completedAt": -1 })
            .await
            .context("Failed to query attempts")?
            .try_collect()
            .await
            .context("Attempt cursor failure")?;

        Ok(records.iter().map(AttemptView::from_record).collect())
    }

    /// All attempts for one user, used by the stats fan-out.
    pub async fn load_attempts(
        &self,
        user_id: &ObjectId,
    ) -> Result<Vec<QuizAttemptRecord>, ServiceError> {
        let attempts = self
            .mongo
            .collection::<QuizAttemptRecord>("quiz_attempts");
        let cursor = attempts
            .find(doc! { "user_id": user_id })
            .await
            .context("Failed to query attempts")?;
        Ok(cursor
            .try_collect()
            .await
            .context("Attempt cursor failure")?)
    }

    async fn load_questions(
        &self,
        quiz_id: &ObjectId,
    ) -> Result<Vec<QuestionRecord>, ServiceError> {
        let questions = self.mongo.collection::<QuestionRecord>("questions");
        let records: Vec<QuestionRecord> = questions
            .find(doc! { "quiz_id": quiz_id })
            .sort(doc! { "order_index": 1 })
            .await
            .context("Failed to query questions")?
            .try_collect()
            .await
            .context("Question cursor failure")?;
        Ok(records)
    }
}
