//! Request validation.

use crate::{
    DifficultyLevel, GenerationRequest, OutputMode, ValidatedRequest, ValidationError,
};

/// Language used when the caller does not name one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Treat empty and whitespace-only optional fields as absent.
///
/// Present values are returned untouched: enumerations must match exactly
/// and idempotency keys are hashed byte for byte.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Validate a raw request and apply defaults.
///
/// Runs before any external call. Text must contain something other than
/// whitespace; `mode` and `level` must be exact members of their enumerations.
pub fn validate_request(request: &GenerationRequest) -> Result<ValidatedRequest, ValidationError> {
    if request.text.trim().is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "text".to_string(),
        });
    }

    let mode = match present(request.mode.as_deref()) {
        Some(raw) => raw
            .parse::<OutputMode>()
            .map_err(|_| ValidationError::InvalidValue {
                field: "mode".to_string(),
                value: raw.to_string(),
                reason: "must be one of: lesson, flashcards, quiz".to_string(),
            })?,
        None => OutputMode::default(),
    };

    let level = match present(request.level.as_deref()) {
        Some(raw) => Some(raw.parse::<DifficultyLevel>().map_err(|_| {
            ValidationError::InvalidValue {
                field: "level".to_string(),
                value: raw.to_string(),
                reason: "must be one of: beginner, intermediate, advanced".to_string(),
            }
        })?),
        None => None,
    };

    Ok(ValidatedRequest {
        text: request.text.clone(),
        mode,
        topic: present(request.topic.as_deref()).map(str::to_string),
        level,
        language: present(request.language.as_deref())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string(),
        idempotency_key: present(request.idempotency_key.as_deref()).map(str::to_string),
    })
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_modes_outside_enumeration_are_rejected(mode in "[a-zA-Z]{1,12}") {
            prop_assume!(!["lesson", "flashcards", "quiz"].contains(&mode.as_str()));
            let result = validate_request(&GenerationRequest::new("text").with_mode(mode));
            prop_assert!(result.is_err());
        }

        #[test]
        fn prop_nonblank_text_with_valid_mode_passes(
            text in "[a-zA-Z][a-zA-Z .]{0,80}",
            mode_idx in 0usize..3,
        ) {
            let mode = OutputMode::ALL[mode_idx];
            let validated = validate_request(&GenerationRequest::new(text.clone()).with_mode(mode.as_str()));
            prop_assert!(validated.is_ok());
            let validated = validated.unwrap();
            prop_assert_eq!(validated.mode, mode);
            prop_assert_eq!(validated.text, text);
        }
    }
}
