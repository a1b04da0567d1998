use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::AppError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Length bounds counted in characters, both inclusive.
pub fn check_len(field: &str, value: &str, min: usize, max: Option<usize>) -> Result<(), AppError> {
    let n = value.chars().count();
    if n < min {
        return Err(AppError::validation(format!(
            "{field} must be at least {min} characters"
        )));
    }
    if let Some(max) = max {
        if n > max {
            return Err(AppError::validation(format!(
                "{field} must be at most {max} characters"
            )));
        }
    }
    Ok(())
}

pub fn check_email(email: &str) -> Result<(), AppError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AppError::validation("email_address is not a valid email"))
    }
}

pub fn check_phone(phone: &str) -> Result<(), AppError> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        Err(AppError::validation("phone_number is not a valid phone number"))
    }
}

/// "mARY ann" -> "Mary Ann"
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("alice@x.com"));
        assert!(!is_valid_email("alice@x"));
        assert!(!is_valid_email("alice x@y.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn phone_format() {
        assert!(is_valid_phone("+1 555-123-4567"));
        assert!(is_valid_phone("5551234"));
        assert!(!is_valid_phone("call me"));
        assert!(!is_valid_phone("123"));
    }

    #[test]
    fn length_bounds_are_inclusive_and_count_chars() {
        assert!(check_len("username", "abcdef", 6, Some(20)).is_ok());
        assert!(check_len("username", "abcde", 6, Some(20)).is_err());
        assert!(check_len("title", "ééééé", 5, Some(5)).is_ok());
        assert!(check_len("password", &"x".repeat(200), 6, None).is_ok());
    }

    #[test]
    fn title_cases_each_word() {
        assert_eq!(title_case("mARY ann"), "Mary Ann");
        assert_eq!(title_case("o'neil"), "O'neil");
    }
}
