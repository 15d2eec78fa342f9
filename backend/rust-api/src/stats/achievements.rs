use serde::Serialize;

use super::aggregates::ProgressAggregates;

// Unlock thresholds. Product-chosen constants; keep the values, tune only
// with product direction.
const STORY_MASTER_TARGET: u64 = 5;
const READING_CHAMPION_TARGET: u64 = 10;
const WORD_EXPLORER_TARGET: u64 = 100;
const WORD_COLLECTOR_TARGET: u64 = 500;
const WORD_MASTER_TARGET: u64 = 1000;
const QUICK_READER_SECONDS: u64 = 1800;
const DEDICATED_READER_SECONDS: u64 = 7200;
const QUIZ_EXPERT_MIN_AVERAGE: f64 = 80.0;
const QUIZ_MASTER_TARGET: u64 = 3;
const LEVEL_UP_COMPLETIONS: u64 = 8;
const LEVEL_UP_MIN_AVERAGE: f64 = 75.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Reading,
    Vocabulary,
    Dedication,
    Quiz,
    Milestone,
}

impl AchievementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementCategory::Reading => "reading",
            AchievementCategory::Vocabulary => "vocabulary",
            AchievementCategory::Dedication => "dedication",
            AchievementCategory::Quiz => "quiz",
            AchievementCategory::Milestone => "milestone",
        }
    }
}

/// Raw counter an achievement tracks progress against.
#[derive(Debug, Clone, Copy)]
enum Metric {
    CompletedContent,
    WordsRead,
    ReadingTimeSeconds,
    QuizAttempts,
    PerfectQuizzes,
    ReadingSessions,
}

impl Metric {
    fn value(&self, aggregates: &ProgressAggregates) -> u64 {
        match self {
            Metric::CompletedContent => u64::from(aggregates.completed_count),
            Metric::WordsRead => aggregates.total_words_read,
            Metric::ReadingTimeSeconds => aggregates.total_reading_time_seconds,
            Metric::QuizAttempts => u64::from(aggregates.attempt_count),
            Metric::PerfectQuizzes => u64::from(aggregates.perfect_quiz_count),
            Metric::ReadingSessions => u64::from(aggregates.session_count),
        }
    }
}

/// Unlock condition, evaluated against the aggregates. Total: no variant
/// can fail, empty inputs simply miss their thresholds.
#[derive(Debug, Clone, Copy)]
enum Condition {
    MetricAtLeast(Metric, u64),
    /// Average quiz score threshold, gated on at least one attempt so an
    /// empty history never reads as a scored average.
    AverageScoreAtLeast(f64),
    /// Completions and average score together (level-up readiness).
    CompletionsAndAverage(u64, f64),
}

impl Condition {
    fn holds(&self, aggregates: &ProgressAggregates) -> bool {
        match self {
            Condition::MetricAtLeast(metric, target) => metric.value(aggregates) >= *target,
            Condition::AverageScoreAtLeast(minimum) => {
                aggregates.attempt_count >= 1 && aggregates.average_quiz_score >= *minimum
            }
            Condition::CompletionsAndAverage(completions, minimum) => {
                u64::from(aggregates.completed_count) >= *completions
                    && aggregates.average_quiz_score >= *minimum
            }
        }
    }
}

/// One entry of the fixed achievement catalog. A plain record, not a trait
/// object: the whole catalog is a static table evaluated with matches.
struct AchievementRule {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    category: AchievementCategory,
    condition: Condition,
    /// Progress bar definition: metric and its cap. Binary achievements
    /// have none.
    progress: Option<(Metric, u64)>,
}

/// The catalog, in definition order. Definition order is the final
/// tie-break for display sorting, so the order here is part of the
/// contract.
static CATALOG: [AchievementRule; 14] = [
    AchievementRule {
        id: "first_story",
        title: "First Story",
        description: "Finish your first piece of reading",
        category: AchievementCategory::Reading,
        condition: Condition::MetricAtLeast(Metric::CompletedContent, 1),
        progress: None,
    },
    AchievementRule {
        id: "story_master",
        title: "Story Master",
        description: "Finish 5 pieces of reading",
        category: AchievementCategory::Reading,
        condition: Condition::MetricAtLeast(Metric::CompletedContent, STORY_MASTER_TARGET),
        progress: Some((Metric::CompletedContent, STORY_MASTER_TARGET)),
    },
    AchievementRule {
        id: "reading_champion",
        title: "Reading Champion",
        description: "Finish 10 pieces of reading",
        category: AchievementCategory::Reading,
        condition: Condition::MetricAtLeast(Metric::CompletedContent, READING_CHAMPION_TARGET),
        progress: Some((Metric::CompletedContent, READING_CHAMPION_TARGET)),
    },
    AchievementRule {
        id: "word_explorer",
        title: "Word Explorer",
        description: "Read 100 words",
        category: AchievementCategory::Vocabulary,
        condition: Condition::MetricAtLeast(Metric::WordsRead, WORD_EXPLORER_TARGET),
        progress: Some((Metric::WordsRead, WORD_EXPLORER_TARGET)),
    },
    AchievementRule {
        id: "word_collector",
        title: "Word Collector",
        description: "Read 500 words",
        category: AchievementCategory::Vocabulary,
        condition: Condition::MetricAtLeast(Metric::WordsRead, WORD_COLLECTOR_TARGET),
        progress: Some((Metric::WordsRead, WORD_COLLECTOR_TARGET)),
    },
    AchievementRule {
        id: "word_master",
        title: "Word Master",
        description: "Read 1000 words",
        category: AchievementCategory::Vocabulary,
        condition: Condition::MetricAtLeast(Metric::WordsRead, WORD_MASTER_TARGET),
        progress: Some((Metric::WordsRead, WORD_MASTER_TARGET)),
    },
    AchievementRule {
        id: "quick_reader",
        title: "Quick Reader",
        description: "Spend 30 minutes reading",
        category: AchievementCategory::Dedication,
        condition: Condition::MetricAtLeast(Metric::ReadingTimeSeconds, QUICK_READER_SECONDS),
        progress: Some((Metric::ReadingTimeSeconds, QUICK_READER_SECONDS)),
    },
    AchievementRule {
        id: "dedicated_reader",
        title: "Dedicated Reader",
        description: "Spend 2 hours reading",
        category: AchievementCategory::Dedication,
        condition: Condition::MetricAtLeast(Metric::ReadingTimeSeconds, DEDICATED_READER_SECONDS),
        progress: Some((Metric::ReadingTimeSeconds, DEDICATED_READER_SECONDS)),
    },
    AchievementRule {
        id: "quiz_rookie",
        title: "Quiz Rookie",
        description: "Take your first quiz",
        category: AchievementCategory::Quiz,
        condition: Condition::MetricAtLeast(Metric::QuizAttempts, 1),
        progress: None,
    },
    AchievementRule {
        id: "quiz_expert",
        title: "Quiz Expert",
        description: "Keep an average quiz score of 80 or better",
        category: AchievementCategory::Quiz,
        condition: Condition::AverageScoreAtLeast(QUIZ_EXPERT_MIN_AVERAGE),
        progress: None,
    },
    AchievementRule {
        id: "perfect_score",
        title: "Perfect Score",
        description: "Score 100 on a quiz",
        category: AchievementCategory::Quiz,
        condition: Condition::MetricAtLeast(Metric::PerfectQuizzes, 1),
        progress: None,
    },
    AchievementRule {
        id: "quiz_master",
        title: "Quiz Master",
        description: "Score 100 on 3 quizzes",
        category: AchievementCategory::Quiz,
        condition: Condition::MetricAtLeast(Metric::PerfectQuizzes, QUIZ_MASTER_TARGET),
        progress: Some((Metric::PerfectQuizzes, QUIZ_MASTER_TARGET)),
    },
    AchievementRule {
        id: "getting_started",
        title: "Getting Started",
        description: "Finish your first reading session",
        category: AchievementCategory::Milestone,
        condition: Condition::MetricAtLeast(Metric::ReadingSessions, 1),
        progress: None,
    },
    AchievementRule {
        id: "level_up_ready",
        title: "Ready to Level Up",
        description: "Finish 8 readings with an average quiz score of 75 or better",
        category: AchievementCategory::Milestone,
        condition: Condition::CompletionsAndAverage(LEVEL_UP_COMPLETIONS, LEVEL_UP_MIN_AVERAGE),
        progress: None,
    },
];

/// Catalog size is fixed; unlock ratios always use this denominator, never
/// the count of whatever subset a screen happens to display.
pub const CATALOG_SIZE: usize = 14;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: AchievementCategory,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_progress: Option<u64>,
}

/// Evaluates the full catalog and returns it in display order: unlocked
/// before locked, then category name, then catalog order. The sort is
/// stable so repeated evaluations render identically.
pub fn evaluate_achievements(aggregates: &ProgressAggregates) -> Vec<Achievement> {
    let mut achievements: Vec<Achievement> = CATALOG
        .iter()
        .map(|rule| {
            let (progress, max_progress) = match rule.progress {
                Some((metric, max)) => {
                    // Clamp: progress never exceeds its cap.
                    (Some(metric.value(aggregates).min(max)), Some(max))
                }
                None => (None, None),
            };

            Achievement {
                id: rule.id,
                title: rule.title,
                description: rule.description,
                category: rule.category,
                unlocked: rule.condition.holds(aggregates),
                progress,
                max_progress,
            }
        })
        .collect();

    achievements.sort_by(|a, b| {
        b.unlocked
            .cmp(&a.unlocked)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });

    achievements
}
