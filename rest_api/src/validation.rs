// rest_api/src/validation.rs
//! Boundary validation helpers. Business logic downstream assumes these
//! checks already ran, so every handler that accepts client input calls
//! into here before touching storage.

use crate::ApiError;

/// Trims and rejects empty/whitespace-only values.
pub fn non_blank(value: &str, label: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{label} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Minimum bar for staff passwords: at least 8 characters, one digit and
/// one special character.
pub fn password_strength(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::Validation(
            "Password must contain at least one digit".into(),
        ));
    }
    if !password.chars().any(|c| "!@#$%^&*(),.?\":{}|<>".contains(c)) {
        return Err(ApiError::Validation(
            "Password must contain at least one special character".into(),
        ));
    }
    Ok(())
}

/// Just enough of an email check to catch obvious typos.
pub fn email_shape(email: &str) -> Result<String, ApiError> {
    let trimmed = email.trim();
    let valid = trimmed
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(ApiError::Validation("Invalid email address".into()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rules() {
        assert!(password_strength("Ab1!").is_err()); // too short
        assert!(password_strength("abcdefgh!").is_err()); // no digit
        assert!(password_strength("abcdefg1").is_err()); // no special
        assert!(password_strength("Str0ng!Pass").is_ok());
    }

    #[test]
    fn blank_values_rejected() {
        assert!(non_blank("", "Name").is_err());
        assert!(non_blank("   ", "Name").is_err());
        assert_eq!(non_blank("  ok  ", "Name").unwrap(), "ok");
    }

    #[test]
    fn email_shapes() {
        assert!(email_shape("nope").is_err());
        assert!(email_shape("a@b").is_err());
        assert_eq!(email_shape(" a@b.co ").unwrap(), "a@b.co");
    }
}
