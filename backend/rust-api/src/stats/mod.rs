//! Pure progress/achievement derivation.
//!
//! Everything in this module is synchronous and side-effect free: the
//! services fetch the per-user collections from MongoDB, hand them over, and
//! get back scalar aggregates and the evaluated achievement catalog. Nothing
//! here is persisted; the results are recomputed from scratch on every call.

pub mod achievements;
pub mod aggregates;
pub mod format;

pub use achievements::{evaluate_achievements, Achievement, AchievementCategory, CATALOG_SIZE};
pub use aggregates::{completion_by_content, ProgressAggregates};
