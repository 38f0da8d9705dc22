use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_config::ClaimProtocol;
use shared_models::scheduling::{clock_time, parse_date, BookingRecord};

// ==============================================================================
// REQUESTS & RESPONSES
// ==============================================================================

/// Body of a booking submission. Missing fields arrive as empty strings and
/// fail validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitBookingRequest {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub slot_id: String,
    pub protocol: ClaimProtocol,
    pub booking: BookingRecord,
}

// ==============================================================================
// SELECTION
// ==============================================================================

/// The date and start time a patient picked. Either part may still be
/// missing; the coordinator refuses to claim until both are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingSelection {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl BookingSelection {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date: Some(date),
            time: Some(time),
        }
    }

    /// Blank input means "not chosen"; anything else must parse.
    pub fn parse(date: &str, time: &str) -> Result<Self, BookingError> {
        let date = match date.trim() {
            "" => None,
            raw => Some(parse_date(raw).ok_or_else(|| {
                BookingError::Validation(format!("Invalid appointment date: {}", raw))
            })?),
        };
        let time = match time.trim() {
            "" => None,
            raw => Some(clock_time::parse(raw).ok_or_else(|| {
                BookingError::Validation(format!("Invalid appointment time: {}", raw))
            })?),
        };

        Ok(Self { date, time })
    }

    pub fn is_complete(&self) -> bool {
        self.date.is_some() && self.time.is_some()
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

/// Everything a booking attempt can end in besides success. Raw store
/// errors never leave the coordinator; `Store` keeps the detail for logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("The selected appointment is no longer available")]
    Unavailable,

    #[error("Booking failed, please try again later")]
    Store(String),
}

impl BookingError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn blank_parts_are_missing_not_invalid() {
        let selection = BookingSelection::parse("", " ").unwrap();
        assert_eq!(selection, BookingSelection::default());
        assert!(!selection.is_complete());
    }

    #[test]
    fn accepts_both_time_formats() {
        let short = BookingSelection::parse("2024-06-01", "10:00").unwrap();
        let long = BookingSelection::parse("2024-06-01", "10:00:00").unwrap();
        assert_eq!(short, long);
        assert!(short.is_complete());
    }

    #[test]
    fn garbage_is_a_validation_error() {
        assert_matches!(BookingSelection::parse("01/06/2024", "10:00"), Err(BookingError::Validation(_)));
        assert_matches!(BookingSelection::parse("2024-06-01", "noon"), Err(BookingError::Validation(_)));
    }

    #[test]
    fn store_error_message_is_generic() {
        let error = BookingError::Store("connection reset by peer".to_string());
        assert_eq!(error.to_string(), "Booking failed, please try again later");
        assert!(error.is_retryable());
        assert!(!BookingError::Unavailable.is_retryable());
    }
}
