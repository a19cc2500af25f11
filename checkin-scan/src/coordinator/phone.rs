//! Phone number validation for manual lookup

use crate::error::CheckinError;
use checkin_common::config::ScanConfig;

/// Accepted phone shape: optional leading `+`, then `min..=max` digits
///
/// Whitespace anywhere in the input is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhoneRule {
    pub min_digits: usize,
    pub max_digits: usize,
}

impl PhoneRule {
    pub fn new(min_digits: usize, max_digits: usize) -> Self {
        Self {
            min_digits,
            max_digits,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.phone_min_digits, config.phone_max_digits)
    }

    pub fn message(&self) -> String {
        format!(
            "Enter a valid phone number ({}–{} digits, optional leading +).",
            self.min_digits, self.max_digits
        )
    }

    /// Normalize and validate; returns the number as it will be queried
    pub fn validate(&self, input: &str) -> Result<String, CheckinError> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let digits = compact.strip_prefix('+').unwrap_or(&compact);

        let valid = !digits.is_empty()
            && digits.chars().all(|c| c.is_ascii_digit())
            && (self.min_digits..=self.max_digits).contains(&digits.len());

        if valid {
            Ok(compact)
        } else {
            Err(CheckinError::Validation(self.message()))
        }
    }
}

impl Default for PhoneRule {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let rule = PhoneRule::default();
        assert!(rule.validate("987654321").is_err());
        assert_eq!(rule.validate("9876543210").unwrap(), "9876543210");
        assert_eq!(rule.validate("+919876543210").unwrap(), "+919876543210");
        assert!(rule.validate("12345").is_err());
    }

    #[test]
    fn test_whitespace_is_stripped() {
        let rule = PhoneRule::default();
        assert_eq!(rule.validate(" 98765 43210 ").unwrap(), "9876543210");
        assert_eq!(rule.validate("+91 98765 43210").unwrap(), "+919876543210");
    }

    #[test]
    fn test_rejects_non_digits() {
        let rule = PhoneRule::default();
        assert!(rule.validate("").is_err());
        assert!(rule.validate("+").is_err());
        assert!(rule.validate("98765-43210").is_err());
        assert!(rule.validate("++9876543210").is_err());
        assert!(rule.validate("98765432１0").is_err());
        assert!(rule.validate("9876543210+").is_err());
    }

    #[test]
    fn test_upper_bound() {
        let rule = PhoneRule::default();
        assert!(rule.validate("123456789012345").is_ok());
        assert!(rule.validate("1234567890123456").is_err());
    }

    #[test]
    fn test_validation_error_carries_bounds() {
        let rule = PhoneRule::new(6, 15);
        assert!(rule.validate("123456").is_ok());

        let err = rule.validate("12345").unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
        assert_eq!(
            err.to_string(),
            "Enter a valid phone number (6–15 digits, optional leading +)."
        );
    }
}
