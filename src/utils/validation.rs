use crate::error::{PortalError, Result};

/// Trims a required text field, rejecting blanks.
pub fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortalError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Blank optional text becomes `None`.
pub fn optional_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn validate_time_order<T: PartialOrd>(start: T, end: T) -> Result<()> {
    if end <= start {
        return Err(PortalError::validation("End time must be after start time"));
    }
    Ok(())
}

pub fn validate_capacity(capacity: i64) -> Result<()> {
    if capacity < 1 {
        return Err(PortalError::validation("Capacity must be at least 1"));
    }
    Ok(())
}

pub const MAX_LOAN_DAYS: i64 = 365;

pub fn validate_loan_days(days: i64) -> Result<()> {
    if !(1..=MAX_LOAN_DAYS).contains(&days) {
        return Err(PortalError::validation(format!(
            "Due days must be between 1 and {MAX_LOAN_DAYS}"
        )));
    }
    Ok(())
}

pub const MAX_COPIES: u32 = 100;

pub fn validate_copies(copies: u32) -> Result<()> {
    if !(1..=MAX_COPIES).contains(&copies) {
        return Err(PortalError::validation(format!(
            "Copies must be between 1 and {MAX_COPIES}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn required_fields_are_trimmed() {
        assert_eq!(require("handle", "  S001 ").unwrap(), "S001");
        let err = require("handle", "   ").unwrap_err();
        assert_eq!(err.to_string(), "handle is required");
    }

    #[test]
    fn blank_optional_text_is_dropped() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" thesis ")), Some("thesis"));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn end_must_follow_start() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        assert!(validate_time_order(nine, ten).is_ok());
        assert!(validate_time_order(ten, nine).is_err());
        assert!(validate_time_order(nine, nine).is_err());
    }

    #[test]
    fn numeric_bounds() {
        assert!(validate_capacity(0).is_err());
        assert!(validate_capacity(40).is_ok());
        assert!(validate_loan_days(0).is_err());
        assert!(validate_loan_days(7).is_ok());
        assert!(validate_loan_days(MAX_LOAN_DAYS).is_ok());
        assert!(validate_loan_days(MAX_LOAN_DAYS + 1).is_err());
        assert!(validate_loan_days(i64::MAX).is_err());
        assert!(validate_copies(0).is_err());
        assert!(validate_copies(MAX_COPIES).is_ok());
        assert!(validate_copies(u32::MAX).is_err());
    }
}
