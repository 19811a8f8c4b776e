//! Field-level checks shared by entities and services.
use crate::errors::ModelError;

/// Non-blank text of at most `max` characters.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::Validation(format!("{field} is required")));
    }
    optional_text(field, value, max)
}

pub fn optional_text(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.chars().count() > max {
        return Err(ModelError::Validation(format!("{field} must be at most {max} characters")));
    }
    Ok(())
}

pub fn in_range(field: &str, value: i32, min: i32, max: i32) -> Result<(), ModelError> {
    if !(min..=max).contains(&value) {
        return Err(ModelError::Validation(format!("{field} must be between {min} and {max}")));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ModelError> {
    let v = value.trim();
    match v.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => optional_text("admin_email", v, 255),
        _ => Err(ModelError::Validation("invalid email".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_blank_and_long() {
        assert!(required_text("title", "  ", 10).is_err());
        assert!(required_text("title", &"x".repeat(11), 10).is_err());
        assert!(required_text("title", &"é".repeat(10), 10).is_ok());
    }

    #[test]
    fn email_needs_both_sides() {
        assert!(email("ops@acme.io").is_ok());
        assert!(email("@acme.io").is_err());
        assert!(email("ops@").is_err());
        assert!(email("ops").is_err());
    }

    #[test]
    fn range_is_inclusive() {
        assert!(in_range("likelihood", 1, 1, 5).is_ok());
        assert!(in_range("likelihood", 5, 1, 5).is_ok());
        assert!(in_range("likelihood", 6, 1, 5).is_err());
    }
}
