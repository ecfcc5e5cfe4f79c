use crate::shared::{DomainError, DomainResult};

/// Reject empty / whitespace-only identifiers.
pub fn require_non_empty(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Phone numbers are digits with an optional leading `+`.
pub fn validate_phone(phone: &str) -> DomainResult<()> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.len() < 6 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(DomainError::Validation(format!("invalid phone number: {}", phone)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_rules() {
        assert!(validate_phone("+50499887766").is_ok());
        assert!(validate_phone("99887766").is_ok());
        assert!(validate_phone("12ab45").is_err());
        assert!(validate_phone("+1").is_err());
    }

    #[test]
    fn empty_values_are_rejected() {
        assert!(require_non_empty("location", "  ").is_err());
        assert!(require_non_empty("location", "Gate A").is_ok());
    }
}
