use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod content;
pub mod progress;
pub mod quiz;
pub mod session;
pub mod user;

/// Reading proficiency level, shared by users and content.
///
/// A user only "sees" content whose difficulty matches their own level;
/// the dashboard progress percentage is computed against that slice of the
/// catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReadingLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl ReadingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingLevel::Beginner => "beginner",
            ReadingLevel::Intermediate => "intermediate",
            ReadingLevel::Advanced => "advanced",
        }
    }
}

impl FromStr for ReadingLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "beginner" => Ok(ReadingLevel::Beginner),
            "intermediate" => Ok(ReadingLevel::Intermediate),
            "advanced" => Ok(ReadingLevel::Advanced),
            _ => Err(format!("Invalid reading level: {}", value)),
        }
    }
}

// Serde converters for chrono::DateTime <-> mongodb::bson::DateTime
pub(crate) mod bson_datetime_as_chrono {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bson_dt = bson::DateTime::from_millis(date.timestamp_millis());
        bson_dt.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bson_dt = bson::DateTime::deserialize(deserializer)?;
        DateTime::from_timestamp_millis(bson_dt.timestamp_millis())
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
    }
}

pub(crate) mod bson_datetime_as_chrono_option {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                let bson_dt = bson::DateTime::from_millis(d.timestamp_millis());
                serializer.serialize_some(&bson_dt)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt_bson_dt: Option<bson::DateTime> = Option::deserialize(deserializer)?;
        Ok(opt_bson_dt
            .and_then(|bson_dt| DateTime::from_timestamp_millis(bson_dt.timestamp_millis())))
    }
}

#[cfg(test)]
mod tests {
    use super::ReadingLevel;
    use std::str::FromStr;

    #[test]
    fn reading_level_round_trip() {
        for level in [
            ReadingLevel::Beginner,
            ReadingLevel::Intermediate,
            ReadingLevel::Advanced,
        ] {
            assert_eq!(ReadingLevel::from_str(level.as_str()).unwrap(), level);
        }
    }

    #[test]
    fn reading_level_defaults_to_beginner() {
        assert_eq!(ReadingLevel::default(), ReadingLevel::Beginner);
    }

    #[test]
    fn reading_level_rejects_unknown() {
        assert!(ReadingLevel::from_str("expert").is_err());
    }
}
