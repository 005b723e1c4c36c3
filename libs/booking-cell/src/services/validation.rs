// libs/booking-cell/src/services/validation.rs
use regex::Regex;

use crate::models::{BookAppointmentRequest, BookingError, BookingValidationRules, ValidatedBooking};

pub struct BookingValidator {
    rules: BookingValidationRules,
    name_pattern: Regex,
    phone_pattern: Regex,
    script_pattern: Regex,
}

impl BookingValidator {
    pub fn new(rules: BookingValidationRules) -> Self {
        let name_pattern = Regex::new(r"^[A-Za-z\s]{2,}$")
            .expect("name pattern is a valid regex");
        let phone_pattern = Regex::new(r"^\(?([0-9]{3})\)?[-. ]?([0-9]{3})[-. ]?([0-9]{4})$")
            .expect("phone pattern is a valid regex");
        let script_pattern = Regex::new(r"(?i)javascript:")
            .expect("script pattern is a valid regex");

        Self {
            rules,
            name_pattern,
            phone_pattern,
            script_pattern,
        }
    }

    pub fn with_default_rules() -> Self {
        Self::new(BookingValidationRules::default())
    }

    /// Strips angle brackets and quotes, removes `javascript:` substrings
    /// case-insensitively, and trims surrounding whitespace.
    pub fn sanitize_text(&self, input: &str) -> String {
        let stripped: String = input
            .chars()
            .filter(|c| !matches!(c, '<' | '>' | '\'' | '"'))
            .collect();

        self.script_pattern.replace_all(&stripped, "").trim().to_string()
    }

    pub fn validate_name(&self, name: &str) -> bool {
        self.name_pattern.is_match(name.trim())
    }

    pub fn validate_phone(&self, phone: &str) -> bool {
        self.phone_pattern.is_match(phone.trim())
    }

    /// Formats a phone number toward the `(NNN) NNN-NNNN` pattern. Exactly
    /// ten digits format fully; shorter inputs get best-effort grouping so a
    /// partially-typed value still renders sensibly.
    pub fn format_phone(phone: &str) -> String {
        let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

        match digits.len() {
            6..=10 => format!("({}) {}-{}", &digits[0..3], &digits[3..6], &digits[6..]),
            3..=5 => format!("({}) {}", &digits[0..3], &digits[3..]),
            1..=2 => format!("({}", digits),
            _ => phone.to_string(),
        }
    }

    /// Runs the full submission check: sanitize every free-text field, then
    /// apply the per-field rules. The first failing field wins; each failure
    /// carries its own user-facing message and nothing is persisted.
    pub fn validate(&self, request: &BookAppointmentRequest) -> Result<ValidatedBooking, BookingError> {
        let name = self.sanitize_text(&request.name);
        let phone = self.sanitize_text(&Self::format_phone(&request.phone));
        let car_model = self.sanitize_text(&request.car_model);
        let message = request
            .message
            .as_deref()
            .map(|m| self.sanitize_text(m))
            .unwrap_or_default();

        if car_model.is_empty() {
            return Err(BookingError::CarModelMissing);
        }
        if car_model.chars().count() > self.rules.max_car_model_chars {
            return Err(BookingError::CarModelTooLong(self.rules.max_car_model_chars));
        }
        if !self.validate_name(&name) {
            return Err(BookingError::InvalidName);
        }
        if !self.validate_phone(&phone) {
            return Err(BookingError::InvalidPhone);
        }
        if message.chars().count() > self.rules.max_message_chars {
            return Err(BookingError::MessageTooLong(self.rules.max_message_chars));
        }

        Ok(ValidatedBooking {
            name,
            phone,
            car_model,
            message: if message.is_empty() { None } else { Some(message) },
        })
    }
}
