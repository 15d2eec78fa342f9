use anyhow::Context;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;

use crate::metrics::PROGRESS_UPDATES_TOTAL;
use crate::models::progress::{ProgressView, UpdateProgressRequest, UserProgressRecord};
use crate::services::ServiceError;
use crate::utils::time::chrono_to_bson;

pub struct ProgressService {
    mongo: Database,
}

impl ProgressService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn list_progress(
        &self,
        user_id: &ObjectId,
    ) -> Result<Vec<ProgressView>, ServiceError> {
        let rows = self.load_progress(user_id).await?;
        Ok(rows.iter().map(ProgressView::from_record).collect())
    }

    pub async fn load_progress(
        &self,
        user_id: &ObjectId,
    ) -> Result<Vec<UserProgressRecord>, ServiceError> {
        let collection = self
            .mongo
            .collection::<UserProgressRecord>("user_progress");
        let cursor = collection
            .find(doc! { "user_id": user_id })
            .await
            .context("Failed to query progress")?;
        Ok(cursor
            .try_collect()
            .await
            .context("Progress cursor failure")?)
    }

    /// Creates the row on first interaction, mutates it in place afterwards.
    /// The upsert on `{user_id, content_id}` is what keeps the one-row-per-
    /// pair invariant.
    pub async fn upsert_progress(
        &self,
        user_id: &ObjectId,
        content_id: &ObjectId,
        req: &UpdateProgressRequest,
    ) -> Result<ProgressView, ServiceError> {
        let collection = self
            .mongo
            .collection::<UserProgressRecord>("user_progress");

        let now = Utc::now();
        let filter = doc! { "user_id": user_id, "content_id": content_id };
        let update = doc! {
            "$set": {
                "status": req.status.as_str(),
                "completion_percentage": req.completion_percentage,
                "time_spent_seconds": req.time_spent_seconds as i64,
                "lastAccessed": chrono_to_bson(now),
            },
            "$setOnInsert": {
                "user_id": user_id,
                "content_id": content_id,
            }
        };

        collection
            .update_one(filter.clone(), update)
            .upsert(true)
            .await
            .context("Failed to upsert progress")?;

        PROGRESS_UPDATES_TOTAL
            .with_label_values(&[req.status.as_str()])
            .inc();

        let record = collection
            .find_one(filter)
            .await
            .context("Failed to reload progress")?
            .ok_or_else(|| ServiceError::not_found("Progress row missing after upsert"))?;

        tracing::info!(
            "Progress updated: user={} content={} status={}",
            user_id.to_hex(),
            content_id.to_hex(),
            req.status.as_str()
        );

        Ok(ProgressView::from_record(&record))
    }
}
