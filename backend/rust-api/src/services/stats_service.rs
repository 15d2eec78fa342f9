use std::collections::HashMap;

use anyhow::Context;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;
use redis::aio::ConnectionManager;
use serde::Serialize;

use crate::models::user::User;
use crate::models::ReadingLevel;
use crate::services::{
    content_service::ContentService, progress_service::ProgressService,
    quiz_service::QuizService, session_service::SessionService, ServiceError,
};
use crate::stats::{
    self, completion_by_content, evaluate_achievements, Achievement, ProgressAggregates,
};

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub level: ReadingLevel,
    pub completed_count: u32,
    pub eligible_content_count: u32,
    pub overall_progress_percent: u32,
    pub total_words_read: u64,
    pub total_reading_time_seconds: u64,
    pub total_reading_time_display: String,
    pub average_quiz_score: f64,
    pub attempt_count: u32,
    pub perfect_quiz_count: u32,
    pub session_count: u32,
    /// Completion percentage keyed by content id (hex); content the user
    /// never touched is simply absent and reads as 0 on the client.
    pub content_progress: HashMap<String, f64>,
}

#[derive(Debug, Serialize)]
pub struct AchievementsResponse {
    pub achievements: Vec<Achievement>,
    pub unlocked_count: usize,
    pub total_count: usize,
}

pub struct StatsService {
    mongo: Database,
    redis: ConnectionManager,
}

impl StatsService {
    pub fn new(mongo: Database, redis: ConnectionManager) -> Self {
        Self { mongo, redis }
    }

    pub async fn dashboard(&self, user_id: &ObjectId) -> Result<DashboardResponse, ServiceError> {
        let (level, aggregates, progress) = self.load_and_aggregate(user_id).await?;

        let content_progress = completion_by_content(&progress)
            .into_iter()
            .map(|(content_id, pct)| (content_id.to_hex(), pct))
            .collect();

        Ok(DashboardResponse {
            level,
            completed_count: aggregates.completed_count,
            eligible_content_count: aggregates.eligible_content_count,
            overall_progress_percent: stats::format::rounded_percent(
                aggregates.overall_progress_percent,
            ),
            total_words_read: aggregates.total_words_read,
            total_reading_time_seconds: aggregates.total_reading_time_seconds,
            total_reading_time_display: stats::format::format_reading_time(
                aggregates.total_reading_time_seconds,
            ),
            average_quiz_score: aggregates.average_quiz_score,
            attempt_count: aggregates.attempt_count,
            perfect_quiz_count: aggregates.perfect_quiz_count,
            session_count: aggregates.session_count,
            content_progress,
        })
    }

    pub async fn achievements(
        &self,
        user_id: &ObjectId,
    ) -> Result<AchievementsResponse, ServiceError> {
        let (_, aggregates, _) = self.load_and_aggregate(user_id).await?;

        let achievements = evaluate_achievements(&aggregates);
        let unlocked_count = achievements.iter().filter(|a| a.unlocked).count();

        Ok(AchievementsResponse {
            achievements,
            unlocked_count,
            // Always the fixed catalog size, never a filtered count.
            total_count: stats::CATALOG_SIZE,
        })
    }

    /// Fan-out fetch of everything the pure core needs. All five loads run
    /// concurrently and all must succeed before aggregation; there are no
    /// partial results.
    async fn load_and_aggregate(
        &self,
        user_id: &ObjectId,
    ) -> Result<
        (
            ReadingLevel,
            ProgressAggregates,
            Vec<crate::models::progress::UserProgressRecord>,
        ),
        ServiceError,
    > {
        let content_service = ContentService::new(self.mongo.clone());
        let progress_service = ProgressService::new(self.mongo.clone());
        let quiz_service = QuizService::new(self.mongo.clone());
        let session_service = SessionService::new(self.mongo.clone(), self.redis.clone());

        let (user, catalog, progress, attempts, sessions) = tokio::try_join!(
            self.load_user(user_id),
            content_service.load_catalog(),
            progress_service.load_progress(user_id),
            quiz_service.load_attempts(user_id),
            session_service.load_sessions(user_id),
        )?;

        let aggregates = ProgressAggregates::compute(
            user.level, &catalog, &progress, &attempts, &sessions,
        );

        Ok((user.level, aggregates, progress))
    }

    async fn load_user(&self, user_id: &ObjectId) -> Result<User, ServiceError> {
        let users = self.mongo.collection::<User>("users");
        users
            .find_one(doc! { "_id": user_id })
            .await
            .context("Failed to query user")?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }
}
