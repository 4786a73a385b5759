//! Validation for catalog entries before they reach a store.

use super::models::NewModel;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Field '{field}' is required but was empty")]
    EmptyField { field: &'static str },
    #[error("Field '{field}' must be between 0 and 5, got {value}")]
    RatingOutOfRange { field: &'static str, value: f64 },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

pub fn validate_new_model(model: &NewModel) -> ValidationResult<()> {
    if model.name.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "name" });
    }
    if model.description.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            field: "description",
        });
    }
    if model.provider_model_id.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "modelId" });
    }
    Ok(())
}

pub fn validate_rating(rating: f64) -> ValidationResult<()> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(ValidationError::RatingOutOfRange {
            field: "rating",
            value: rating,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::models::{ModelCategory, Provider};

    fn make_valid_model() -> NewModel {
        NewModel {
            name: "Kod Yardımcısı".to_string(),
            description: "Kod yazmaya yardım eder".to_string(),
            image_url: None,
            category: ModelCategory::Code,
            provider: Provider::Gemini,
            provider_model_id: "gemini-1.5-flash".to_string(),
            is_active: true,
            capabilities: vec![],
            examples: vec![],
            child_friendly: false,
            elderly_friendly: false,
            complexity: None,
        }
    }

    #[test]
    fn test_validate_model_valid() {
        assert!(validate_new_model(&make_valid_model()).is_ok());
    }

    #[test]
    fn test_validate_model_whitespace_name() {
        let mut model = make_valid_model();
        model.name = "   ".to_string();
        assert_eq!(
            validate_new_model(&model),
            Err(ValidationError::EmptyField { field: "name" })
        );
    }

    #[test]
    fn test_validate_model_empty_provider_id() {
        let mut model = make_valid_model();
        model.provider_model_id = String::new();
        assert_eq!(
            validate_new_model(&model),
            Err(ValidationError::EmptyField { field: "modelId" })
        );
    }

    #[test]
    fn test_validate_rating_bounds() {
        assert!(validate_rating(0.0).is_ok());
        assert!(validate_rating(5.0).is_ok());
        assert!(validate_rating(5.1).is_err());
        assert!(validate_rating(-0.1).is_err());
    }
}
