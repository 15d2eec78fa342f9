use anyhow::{Context, Result};
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    Database,
};

use crate::models::content::ContentType;
use crate::models::ReadingLevel;

struct SeedContent {
    title: &'static str,
    body: &'static str,
    content_type: ContentType,
    difficulty: ReadingLevel,
    order_index: i32,
    quiz: Option<SeedQuiz>,
}

struct SeedQuiz {
    title: &'static str,
    questions: &'static [SeedQuestion],
}

struct SeedQuestion {
    prompt: &'static str,
    options: &'static [&'static str],
    correct_option: u32,
}

const STARTER_CATALOG: &[SeedContent] = &[
    SeedContent {
        title: "Cat",
        body: "cat",
        content_type: ContentType::Word,
        difficulty: ReadingLevel::Beginner,
        order_index: 0,
        quiz: None,
    },
    SeedContent {
        title: "The cat sat",
        body: "The cat sat on the mat.",
        content_type: ContentType::Sentence,
        difficulty: ReadingLevel::Beginner,
        order_index: 1,
        quiz: None,
    },
    SeedContent {
        title: "The Little Red Hen",
        body: "The little red hen found a seed. She planted it all by herself. \
               The seed grew into tall golden wheat. The hen baked warm bread \
               and shared it with her chicks.",
        content_type: ContentType::Story,
        difficulty: ReadingLevel::Beginner,
        order_index: 2,
        quiz: Some(SeedQuiz {
            title: "The Little Red Hen quiz",
            questions: &[
                SeedQuestion {
                    prompt: "What did the hen find?",
                    options: &["A seed", "A stone", "A worm"],
                    correct_option: 0,
                },
                SeedQuestion {
                    prompt: "What did the hen bake?",
                    options: &["A cake", "Bread", "Cookies"],
                    correct_option: 1,
                },
            ],
        }),
    },
    SeedContent {
        title: "Rain on the Roof",
        body: "Pitter patter on the roof, raindrops dance without a hoof. \
               Puddles gather in the lane, I love a rainy day again.",
        content_type: ContentType::Poem,
        difficulty: ReadingLevel::Beginner,
        order_index: 3,
        quiz: None,
    },
    SeedContent {
        title: "The Lost Kite",
        body: "Maya flew her kite on a windy hill. A gust pulled the string \
               from her hand and the kite sailed over the trees. She followed \
               it to the river, where a fisherman caught it with his net and \
               handed it back with a smile.",
        content_type: ContentType::Story,
        difficulty: ReadingLevel::Intermediate,
        order_index: 0,
        quiz: Some(SeedQuiz {
            title: "The Lost Kite quiz",
            questions: &[
                SeedQuestion {
                    prompt: "Where did Maya fly her kite?",
                    options: &["On a windy hill", "At the beach", "In the yard"],
                    correct_option: 0,
                },
                SeedQuestion {
                    prompt: "Who caught the kite?",
                    options: &["A teacher", "Her brother", "A fisherman"],
                    correct_option: 2,
                },
            ],
        }),
    },
    SeedContent {
        title: "The Clockmaker's Secret",
        body: "In a narrow shop at the edge of town, an old clockmaker kept a \
               clock that ran backwards. Visitors swore that while it ticked, \
               their worries unwound with it. Nobody ever learned how it \
               worked, and the clockmaker never told.",
        content_type: ContentType::Story,
        difficulty: ReadingLevel::Advanced,
        order_index: 0,
        quiz: Some(SeedQuiz {
            title: "The Clockmaker's Secret quiz",
            questions: &[SeedQuestion {
                prompt: "What was unusual about the clock?",
                options: &["It had no hands", "It ran backwards", "It was silent"],
                correct_option: 1,
            }],
        }),
    },
];

/// Seeds a starter catalog on first boot so a fresh install has something
/// to read. A non-empty content collection is left untouched.
pub async fn bootstrap(mongo: &Database) -> Result<()> {
    let content = mongo.collection::<Document>("content");

    let existing = content
        .count_documents(doc! {})
        .await
        .context("Failed to count content")?;
    if existing > 0 {
        tracing::debug!("Content collection already populated, skipping seed");
        return Ok(());
    }

    let words = mongo.collection::<Document>("words");
    let quizzes = mongo.collection::<Document>("quizzes");
    let questions = mongo.collection::<Document>("questions");

    for seed in STARTER_CATALOG {
        let content_id = ObjectId::new();
        let now = mongodb::bson::DateTime::now();

        content
            .insert_one(doc! {
                "_id": content_id,
                "title": seed.title,
                "body": seed.body,
                "content_type": seed.content_type.as_str(),
                "difficulty": seed.difficulty.as_str(),
                "order_index": seed.order_index,
                "createdAt": now,
                "updatedAt": now,
            })
            .await
            .context("Failed to seed content")?;

        let word_docs: Vec<Document> = seed
            .body
            .split_whitespace()
            .map(|raw| raw.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .enumerate()
            .map(|(index, word)| {
                doc! {
                    "_id": ObjectId::new(),
                    "content_id": content_id,
                    "text": word,
                    "phonetic": Bson::Null,
                    "definition": Bson::Null,
                    "order_index": index as i32,
                }
            })
            .collect();
        if !word_docs.is_empty() {
            words
                .insert_many(word_docs)
                .await
                .context("Failed to seed words")?;
        }

        if let Some(quiz) = &seed.quiz {
            let quiz_id = ObjectId::new();
            quizzes
                .insert_one(doc! {
                    "_id": quiz_id,
                    "content_id": content_id,
                    "title": quiz.title,
                })
                .await
                .context("Failed to seed quiz")?;

            let question_docs: Vec<Document> = quiz
                .questions
                .iter()
                .enumerate()
                .map(|(index, question)| {
                    doc! {
                        "_id": ObjectId::new(),
                        "quiz_id": quiz_id,
                        "prompt": question.prompt,
                        "options": question.options.iter().map(|o| Bson::String((*o).to_string())).collect::<Vec<Bson>>(),
                        "correct_option": question.correct_option as i32,
                        "order_index": index as i32,
                    }
                })
                .collect();
            questions
                .insert_many(question_docs)
                .await
                .context("Failed to seed questions")?;
        }
    }

    tracing::info!(
        "Seeded starter catalog with {} content units",
        STARTER_CATALOG.len()
    );
    Ok(())
}
