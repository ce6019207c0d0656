use bigdecimal::BigDecimal;
use std::fmt;

pub const TITLE_MAX_LEN: usize = 200;
pub const CURRENCY_CODE_LEN: usize = 3;
pub const REASON_MAX_LEN: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_positive_amount(amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    Ok(())
}

/// ISO-4217 style code: three uppercase ASCII letters.
pub fn validate_currency(currency: &str) -> ValidationResult {
    if currency.len() != CURRENCY_CODE_LEN || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            "currency",
            "must be a three-letter uppercase code",
        ));
    }

    Ok(())
}

/// Title of a payment request, sanitized and bounded.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = sanitize_string(title);
    validate_required("title", &title)?;
    validate_max_len("title", &title, TITLE_MAX_LEN)?;
    Ok(title)
}

pub fn validate_reason(reason: &str) -> Result<String, ValidationError> {
    let reason = sanitize_string(reason);
    validate_required("reason", &reason)?;
    validate_max_len("reason", &reason, REASON_MAX_LEN)?;
    Ok(reason)
}
