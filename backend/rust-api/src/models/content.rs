use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ReadingLevel;
use crate::utils::time::bson_to_iso;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Word,
    Sentence,
    Story,
    Poem,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Word => "word",
            ContentType::Sentence => "sentence",
            ContentType::Story => "story",
            ContentType::Poem => "poem",
        }
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "word" => Ok(ContentType::Word),
            "sentence" => Ok(ContentType::Sentence),
            "story" => Ok(ContentType::Story),
            "poem" => Ok(ContentType::Poem),
            _ => Err(format!("Invalid content type: {}", value)),
        }
    }
}

/// A unit of reading material stored in the "content" collection.
///
/// `order_index` defines the curriculum order within a difficulty; listings
/// are always sorted by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub body: String,
    pub content_type: ContentType,
    pub difficulty: ReadingLevel,
    pub order_index: i32,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: mongodb::bson::DateTime,
    #[serde(rename = "updatedAt", alias = "updated_at")]
    pub updated_at: mongodb::bson::DateTime,
}

/// One word of a content unit, stored in the "words" collection. The reading
/// player highlights these in `order_index` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content_id: ObjectId,
    pub text: String,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
    pub order_index: i32,
}

#[derive(Debug, Serialize)]
pub struct ContentSummary {
    pub id: String,
    pub title: String,
    pub content_type: ContentType,
    pub difficulty: ReadingLevel,
    pub order_index: i32,
}

impl ContentSummary {
    pub fn from_record(record: &ContentRecord) -> Self {
        Self {
            id: record.id.to_hex(),
            title: record.title.clone(),
            content_type: record.content_type,
            difficulty: record.difficulty,
            order_index: record.order_index,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WordView {
    pub id: String,
    pub text: String,
    pub phonetic: Option<String>,
    pub definition: Option<String>,
    pub order_index: i32,
}

impl WordView {
    pub fn from_record(record: &WordRecord) -> Self {
        Self {
            id: record.id.to_hex(),
            text: record.text.clone(),
            phonetic: record.phonetic.clone(),
            definition: record.definition.clone(),
            order_index: record.order_index,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContentDetail {
    pub id: String,
    pub title: String,
    pub body: String,
    pub content_type: ContentType,
    pub difficulty: ReadingLevel,
    pub order_index: i32,
    pub words: Vec<WordView>,
    pub quiz: Option<super::quiz::QuizSummary>,
    pub created_at: String,
    pub updated_at: String,
}

impl ContentDetail {
    pub fn from_parts(
        record: &ContentRecord,
        words: &[WordRecord],
        quiz: Option<super::quiz::QuizSummary>,
    ) -> Self {
        Self {
            id: record.id.to_hex(),
            title: record.title.clone(),
            body: record.body.clone(),
            content_type: record.content_type,
            difficulty: record.difficulty,
            order_index: record.order_index,
            words: words.iter().map(WordView::from_record).collect(),
            quiz,
            created_at: bson_to_iso(&record.created_at),
            updated_at: bson_to_iso(&record.updated_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentListQuery {
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, DateTime as BsonDateTime};

    #[test]
    fn content_record_accepts_snake_case_timestamps() {
        let content_id = ObjectId::new();
        let now = BsonDateTime::now();
        let document = doc! {
            "_id": content_id,
            "title": "The Red Hen",
            "body": "The little red hen found a seed.",
            "content_type": "story",
            "difficulty": "beginner",
            "order_index": 3,
            "created_at": now,
            "updated_at": now,
        };

        let parsed: ContentRecord =
            mongodb::bson::from_document(document).expect("content should deserialize");
        assert_eq!(parsed.id, content_id);
        assert_eq!(parsed.content_type, ContentType::Story);
        assert_eq!(parsed.difficulty, ReadingLevel::Beginner);
        assert_eq!(parsed.order_index, 3);
    }

    #[test]
    fn content_type_round_trip() {
        for content_type in [
            ContentType::Word,
            ContentType::Sentence,
            ContentType::Story,
            ContentType::Poem,
        ] {
            assert_eq!(
                ContentType::from_str(content_type.as_str()).unwrap(),
                content_type
            );
        }
    }
}
