use anyhow::{anyhow, Context};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;
use redis::aio::ConnectionManager;
use uuid::Uuid;

use crate::metrics::{
    track_cache_operation, READING_SESSIONS_ACTIVE, READING_SESSIONS_TOTAL, WORDS_READ_TOTAL,
};
use crate::models::session::{
    ActiveReadingSession, FinishSessionRequest, ReadingSessionRecord, SessionView,
    StartSessionRequest, StartSessionResponse,
};
use crate::services::ServiceError;

// Active sessions expire from Redis if the player never finishes them.
const SESSION_TTL_SECONDS: i64 = 7200;

pub struct SessionService {
    mongo: Database,
    redis: ConnectionManager,
}

impl SessionService {
    pub fn new(mongo: Database, redis: ConnectionManager) -> Self {
        Self { mongo, redis }
    }

    /// Stages a new session in Redis. Nothing is persisted to Mongo until
    /// the client finishes; abandoned sessions simply expire.
    pub async fn start_session(
        &self,
        user_id: &ObjectId,
        req: &StartSessionRequest,
    ) -> Result<StartSessionResponse, ServiceError> {
        let content_id = ObjectId::parse_str(&req.content_id)
            .map_err(|_| ServiceError::invalid_input("Invalid content_id"))?;

        // Verify the content exists before handing out a session.
        let content_collection = self
            .mongo
            .collection::<mongodb::bson::Document>("content");
        content_collection
            .find_one(doc! { "_id": content_id })
            .await
            .context("Failed to query content")?
            .ok_or_else(|| ServiceError::not_found("Content not found"))?;

        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + chrono::Duration::seconds(SESSION_TTL_SECONDS);

        let session = ActiveReadingSession {
            id: session_id.clone(),
            user_id: user_id.to_hex(),
            content_id: content_id.to_hex(),
            started_at: now,
            expires_at,
        };

        let mut conn = self.redis.clone();
        let session_key = format!("reading_session:{}", session_id);
        let session_json =
            serde_json::to_string(&session).context("Failed to serialize session")?;

        track_cache_operation("setex", async {
            redis::cmd("SETEX")
                .arg(&session_key)
                .arg(SESSION_TTL_SECONDS)
                .arg(session_json)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to save session to Redis")
        })
        .await?;

        READING_SESSIONS_TOTAL.with_label_values(&["started"]).inc();
        READING_SESSIONS_ACTIVE.inc();

        tracing::info!(
            "Reading session started: {} for user: {}",
            session_id,
            user_id.to_hex()
        );

        Ok(StartSessionResponse {
            session_id,
            content_id: content_id.to_hex(),
            started_at: now,
            expires_at,
        })
    }

    /// Persists the finished session to Mongo and drops the Redis key. The
    /// stored record is append-only; it is never updated afterwards.
    pub async fn finish_session(
        &self,
        user_id: &ObjectId,
        session_id: &str,
        req: &FinishSessionRequest,
    ) -> Result<SessionView, ServiceError> {
        let session = self.get_active_session(session_id).await?;

        if session.user_id != user_id.to_hex() {
            return Err(ServiceError::not_found("Session not found"));
        }

        let content_id = ObjectId::parse_str(&session.content_id)
            .map_err(|_| anyhow!("Stored session has invalid content_id"))?;

        let now = Utc::now();
        let elapsed = (now - session.started_at).num_seconds().max(0) as u32;
        let duration = req.session_duration_seconds.unwrap_or(elapsed);

        let record = ReadingSessionRecord {
            id: None,
            user_id: *user_id,
            content_id,
            words_read: req.words_read,
            session_duration_seconds: duration,
            reading_accuracy: req.reading_accuracy,
            started_at: session.started_at,
            ended_at: Some(now),
        };

        let sessions = self
            .mongo
            .collection::<ReadingSessionRecord>("reading_sessions");
        let insert_result = sessions
            .insert_one(&record)
            .await
            .context("Failed to insert reading session")?;
        let record_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted session ID"))?;

        let mut conn = self.redis.clone();
        let session_key = format!("reading_session:{}", session_id);
        track_cache_operation("del", async {
            redis::cmd("DEL")
                .arg(&session_key)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to delete session from Redis")
        })
        .await?;

        READING_SESSIONS_TOTAL
            .with_label_values(&["finished"])
            .inc();
        READING_SESSIONS_ACTIVE.dec();
        WORDS_READ_TOTAL.inc_by(u64::from(req.words_read));

        tracing::info!(
            "Reading session finished: {} ({} words in {}s)",
            session_id,
            req.words_read,
            duration
        );

        let mut stored = record;
        stored.id = Some(record_id);
        Ok(SessionView::from_record(&stored))
    }

    pub async fn list_sessions(
        &self,
        user_id: &ObjectId,
    ) -> Result<Vec<SessionView>, ServiceError> {
        let records = self.load_sessions(user_id).await?;
        Ok(records.iter().map(SessionView::from_record).collect())
    }

    /// All persisted sessions for one user, used by the stats fan-out.
    pub async fn load_sessions(
        &self,
        user_id: &ObjectId,
    ) -> Result<Vec<ReadingSessionRecord>, ServiceError> {
        let sessions = self
            .mongo
            .collection::<ReadingSessionRecord>("reading_sessions");
        let cursor = sessions
            .find(doc! { "user_id": user_id })
            .sort(doc! { "startedAt": -1 })
            .await
            .context("Failed to query reading sessions")?;
        Ok(cursor
            .try_collect()
            .await
            .context("Session cursor failure")?)
    }

    async fn get_active_session(
        &self,
        session_id: &str,
    ) -> Result<ActiveReadingSession, ServiceError> {
        let mut conn = self.redis.clone();
        let session_key = format!("reading_session:{}", session_id);

        let session_json: Option<String> = redis::cmd("GET")
            .arg(&session_key)
            .query_async(&mut conn)
            .await
            .context("Failed to read session from Redis")?;

        let session_json = session_json
            .ok_or_else(|| ServiceError::not_found("Session not found or expired"))?;

        Ok(serde_json::from_str(&session_json).context("Failed to parse stored session")?)
    }
}
