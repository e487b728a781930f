//! Common validation utilities.

use validator::ValidationError;

/// Maximum distance accepted for a candidate snapshot (half the earth's circumference).
const MAX_DISTANCE_KM: f64 = 20_037.5;

/// Maximum length of a single profile prompt answer.
const MAX_PROMPT_LENGTH: usize = 1_000;

/// Validates that a ratio (response rate, profile completion) is within 0 to 1.
pub fn validate_unit_interval(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("unit_interval");
        err.message = Some("Value must be between 0 and 1".into());
        Err(err)
    }
}

/// Validates that a distance in kilometers is finite, non-negative and plausible.
pub fn validate_distance_km(distance: f64) -> Result<(), ValidationError> {
    if distance.is_finite() && (0.0..=MAX_DISTANCE_KM).contains(&distance) {
        Ok(())
    } else {
        let mut err = ValidationError::new("distance_range");
        err.message = Some("Distance must be between 0 and 20037.5 km".into());
        Err(err)
    }
}

/// Validates a list of prompt answers: no blank entries, bounded length.
pub fn validate_prompts(prompts: &[String]) -> Result<(), ValidationError> {
    if prompts.iter().any(|p| p.trim().is_empty()) {
        let mut err = ValidationError::new("prompt_blank");
        err.message = Some("Prompt answers must not be blank".into());
        return Err(err);
    }
    if prompts.iter().any(|p| p.chars().count() > MAX_PROMPT_LENGTH) {
        let mut err = ValidationError::new("prompt_length");
        err.message = Some("Prompt answers must be at most 1000 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a list of lifestyle labels: each non-blank, at most 64 characters.
pub fn validate_labels(labels: &[String]) -> Result<(), ValidationError> {
    let invalid = labels.iter().any(|label| {
        let trimmed = label.trim();
        trimmed.is_empty() || trimmed.chars().count() > 64
    });
    if invalid {
        let mut err = ValidationError::new("label_format");
        err.message = Some("Labels must be 1-64 non-blank characters".into());
        Err(err)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_unit_interval() {
        assert!(validate_unit_interval(0.0).is_ok());
        assert!(validate_unit_interval(0.5).is_ok());
        assert!(validate_unit_interval(1.0).is_ok());
        assert!(validate_unit_interval(-0.01).is_err());
        assert!(validate_unit_interval(1.01).is_err());
        assert!(validate_unit_interval(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_distance_km() {
        assert!(validate_distance_km(0.0).is_ok());
        assert!(validate_distance_km(12.5).is_ok());
        assert!(validate_distance_km(-1.0).is_err());
        assert!(validate_distance_km(f64::INFINITY).is_err());
        assert!(validate_distance_km(50_000.0).is_err());
    }

    #[test]
    fn test_validate_prompts() {
        assert!(validate_prompts(&[]).is_ok());
        assert!(validate_prompts(&["I love hiking".to_string()]).is_ok());
        assert!(validate_prompts(&["   ".to_string()]).is_err());
        assert!(validate_prompts(&["x".repeat(1001)]).is_err());
    }

    #[test]
    fn test_validate_labels() {
        assert!(validate_labels(&["climbing".to_string()]).is_ok());
        assert!(validate_labels(&[]).is_ok());
        assert!(validate_labels(&["".to_string()]).is_err());
        assert!(validate_labels(&["ok".to_string(), "  ".to_string()]).is_err());
        assert!(validate_labels(&["a".repeat(65)]).is_err());
    }

    #[test]
    fn test_error_messages_are_set() {
        let err = validate_unit_interval(2.0).unwrap_err();
        assert_eq!(err.code, "unit_interval");
        assert!(err.message.is_some());
    }
}
