//! Validation of submitted capture forms.
//!
//! Every failing field is reported, so a form can be re-rendered with all of
//! its errors at once.

use super::models::CaptureForm;
use super::trait_def::CaptureStore;
use anyhow::Result;
use serde_json::{Map, Value};
use std::fmt;

pub const MAX_TEXT_LENGTH: usize = 254;
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField {
        field: &'static str,
    },
    MissingField {
        field: &'static str,
    },
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    NotFinite {
        field: &'static str,
    },
    NegativeValue {
        field: &'static str,
        value: f64,
    },
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    ForeignKeyViolation {
        field: &'static str,
        entity_type: &'static str,
        id: i64,
    },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::MissingField { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::NotFinite { field }
            | ValidationError::NegativeValue { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::ForeignKeyViolation { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField { field } => {
                write!(f, "Field '{}' is required but was empty", field)
            }
            ValidationError::MissingField { field } => {
                write!(f, "Field '{}' is required", field)
            }
            ValidationError::TooLong { field, max, actual } => write!(
                f,
                "Field '{}' must be at most {} characters, got {}",
                field, max, actual
            ),
            ValidationError::NotFinite { field } => {
                write!(f, "Field '{}' must be a finite number", field)
            }
            ValidationError::NegativeValue { field, value } => {
                write!(f, "Field '{}' must be non-negative, got {}", field, value)
            }
            ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "Field '{}' must be between {} and {}, got {}",
                field, min, max, value
            ),
            ValidationError::ForeignKeyViolation {
                entity_type, id, ..
            } => {
                write!(f, "Referenced {} '{}' does not exist", entity_type, id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// All the errors found in one form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors(pub Vec<ValidationError>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `{"field": ["message", ...]}`, the shape the form templates expect.
    pub fn to_json(&self) -> Value {
        let mut by_field = Map::new();
        for error in &self.0 {
            let messages = by_field
                .entry(error.field())
                .or_insert_with(|| Value::Array(vec![]));
            if let Value::Array(messages) = messages {
                messages.push(Value::String(error.to_string()));
            }
        }
        Value::Object(by_field)
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

fn check_text(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: &str,
    required: bool,
) {
    if required && value.trim().is_empty() {
        errors.push(ValidationError::EmptyField { field });
    }
    let length = value.chars().count();
    if length > MAX_TEXT_LENGTH {
        errors.push(ValidationError::TooLong {
            field,
            max: MAX_TEXT_LENGTH,
            actual: length,
        });
    }
}

/// Field checks that need no store access.
pub fn validate_capture_fields(form: &CaptureForm) -> FormErrors {
    let mut errors = Vec::new();

    check_text(&mut errors, "name", &form.name, true);
    if form.description.trim().is_empty() {
        errors.push(ValidationError::EmptyField {
            field: "description",
        });
    }
    if let Some(sku) = &form.sku {
        check_text(&mut errors, "sku", sku, false);
    }

    match form.price {
        None => errors.push(ValidationError::MissingField { field: "price" }),
        Some(price) if !price.is_finite() => {
            errors.push(ValidationError::NotFinite { field: "price" })
        }
        Some(price) if price < 0.0 => errors.push(ValidationError::NegativeValue {
            field: "price",
            value: price,
        }),
        Some(_) => {}
    }

    if let Some(rating) = form.rating {
        if !rating.is_finite() {
            errors.push(ValidationError::NotFinite { field: "rating" });
        } else if !(0.0..=MAX_RATING).contains(&rating) {
            errors.push(ValidationError::OutOfRange {
                field: "rating",
                value: rating,
                min: 0.0,
                max: MAX_RATING,
            });
        }
    }

    FormErrors(errors)
}

/// Full form validation, including the artist reference.
pub fn validate_capture_form(store: &dyn CaptureStore, form: &CaptureForm) -> Result<FormErrors> {
    let mut errors = validate_capture_fields(form);
    if let Some(artist_id) = form.artist_id {
        if store.get_artist(artist_id)?.is_none() {
            errors.0.push(ValidationError::ForeignKeyViolation {
                field: "artist_id",
                entity_type: "artist",
                id: artist_id,
            });
        }
    }
    Ok(errors)
}
