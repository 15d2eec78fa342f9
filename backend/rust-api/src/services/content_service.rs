use anyhow::Context;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::Database;
use std::str::FromStr;

use crate::models::content::{
    ContentDetail, ContentListQuery, ContentRecord, ContentSummary, ContentType, WordRecord,
};
use crate::models::quiz::{QuizRecord, QuizSummary};
use crate::models::ReadingLevel;
use crate::services::ServiceError;

pub struct ContentService {
    mongo: Database,
}

impl ContentService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Catalog listing, sorted by curriculum order. `default_level` is the
    /// caller's own level and applies when the query names no difficulty.
    pub async fn list_content(
        &self,
        query: &ContentListQuery,
        default_level: ReadingLevel,
    ) -> Result<Vec<ContentSummary>, ServiceError> {
        let mut filter = Document::new();

        let difficulty = match &query.difficulty {
            Some(raw) => ReadingLevel::from_str(raw).map_err(ServiceError::invalid_input)?,
            None => default_level,
        };
        filter.insert("difficulty", difficulty.as_str());

        if let Some(raw) = &query.content_type {
            let content_type =
                ContentType::from_str(raw).map_err(ServiceError::invalid_input)?;
            filter.insert("content_type", content_type.as_str());
        }

        let collection = self.mongo.collection::<ContentRecord>("content");
        let cursor = collection
            .find(filter)
            .sort(doc! { "order_index": 1 })
            .await
            .context("Failed to query content")?;

        let records: Vec<ContentRecord> = cursor
            .try_collect()
            .await
            .context("Content cursor failure")?;

        Ok(records.iter().map(ContentSummary::from_record).collect())
    }

    /// Full catalog across all difficulties, used by the stats fan-out.
    pub async fn load_catalog(&self) -> Result<Vec<ContentRecord>, ServiceError> {
        let collection = self.mongo.collection::<ContentRecord>("content");
        let cursor = collection
            .find(doc! {})
            .await
            .context("Failed to query content catalog")?;
        Ok(cursor
            .try_collect()
            .await
            .context("Content catalog cursor failure")?)
    }

    pub async fn get_content_detail(
        &self,
        content_id: &ObjectId,
    ) -> Result<ContentDetail, ServiceError> {
        let record = self.load_content(content_id).await?;

        let words_collection = self.mongo.collection::<WordRecord>("words");
        let words: Vec<WordRecord> = words_collection
            .find(doc! { "content_id": content_id })
            .sort(doc! { "order_index": 1 })
            .await
            .context("Failed to query words")?
            .try_collect()
            .await
            .context("Word cursor failure")?;

        let quizzes = self.mongo.collection::<QuizRecord>("quizzes");
        let quiz = quizzes
            .find_one(doc! { "content_id": content_id })
            .await
            .context("Failed to query quiz")?
            .map(|record| QuizSummary::from_record(&record));

        Ok(ContentDetail::from_parts(&record, &words, quiz))
    }

    pub async fn load_content(
        &self,
        content_id: &ObjectId,
    ) -> Result<ContentRecord, ServiceError> {
        let collection = self.mongo.collection::<ContentRecord>("content");
        collection
            .find_one(doc! { "_id": content_id })
            .await
            .context("Failed to query content")?
            .ok_or_else(|| ServiceError::not_found("Content not found"))
    }
}
