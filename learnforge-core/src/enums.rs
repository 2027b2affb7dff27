//! Enum types for LearnForge

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error when parsing a string that is not a member of one of the enumerations below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumParseError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for EnumParseError {}

/// Which learning material the caller wants generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Summary, key points, flashcards and quiz.
    #[default]
    Lesson,
    Flashcards,
    Quiz,
}

impl OutputMode {
    pub const ALL: [OutputMode; 3] = [OutputMode::Lesson, OutputMode::Flashcards, OutputMode::Quiz];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Lesson => "lesson",
            OutputMode::Flashcards => "flashcards",
            OutputMode::Quiz => "quiz",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = EnumParseError;

    /// Wire values are matched exactly; `"Lesson"` is not a mode.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lesson" => Ok(OutputMode::Lesson),
            "flashcards" => Ok(OutputMode::Flashcards),
            "quiz" => Ok(OutputMode::Quiz),
            _ => Err(EnumParseError {
                kind: "mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Difficulty tag forwarded to the generation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [
        DifficultyLevel::Beginner,
        DifficultyLevel::Intermediate,
        DifficultyLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(DifficultyLevel::Beginner),
            "intermediate" => Ok(DifficultyLevel::Intermediate),
            "advanced" => Ok(DifficultyLevel::Advanced),
            _ => Err(EnumParseError {
                kind: "level",
                value: s.to_string(),
            }),
        }
    }
}

/// Where a topic label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TopicSource {
    /// Supplied by the caller.
    User,
    /// Inferred by the generation provider.
    #[default]
    Inferred,
}

impl TopicSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicSource::User => "user",
            TopicSource::Inferred => "inferred",
        }
    }

    /// Coerce a provider-declared provenance. Anything other than the two
    /// exact wire values becomes `Inferred`.
    pub fn from_provider(value: &str) -> Self {
        match value {
            "user" => TopicSource::User,
            _ => TopicSource::Inferred,
        }
    }
}

impl fmt::Display for TopicSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicSource {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(TopicSource::User),
            "inferred" => Ok(TopicSource::Inferred),
            _ => Err(EnumParseError {
                kind: "topic source",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_round_trips_through_str() {
        for mode in OutputMode::ALL {
            assert_eq!(mode.as_str().parse::<OutputMode>(), Ok(mode));
        }
        assert_eq!(OutputMode::default(), OutputMode::Lesson);
    }

    #[test]
    fn test_output_mode_rejects_case_variants() {
        assert!("Lesson".parse::<OutputMode>().is_err());
        assert!("essay".parse::<OutputMode>().is_err());
        let err = "essay".parse::<OutputMode>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid mode: essay");
    }

    #[test]
    fn test_difficulty_level_parse() {
        for level in DifficultyLevel::ALL {
            assert_eq!(level.to_string().parse::<DifficultyLevel>(), Ok(level));
        }
        assert!("expert".parse::<DifficultyLevel>().is_err());
    }

    #[test]
    fn test_topic_source_coercion() {
        assert_eq!(TopicSource::from_provider("user"), TopicSource::User);
        assert_eq!(TopicSource::from_provider("inferred"), TopicSource::Inferred);
        assert_eq!(TopicSource::from_provider("USER"), TopicSource::Inferred);
        assert_eq!(TopicSource::from_provider(""), TopicSource::Inferred);
        assert_eq!(TopicSource::from_provider("guess"), TopicSource::Inferred);
    }

    #[test]
    fn test_serde_uses_lowercase_wire_values() {
        let json = serde_json::to_string(&OutputMode::Flashcards).unwrap();
        assert_eq!(json, "\"flashcards\"");
        let source: TopicSource = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(source, TopicSource::User);
    }
}
