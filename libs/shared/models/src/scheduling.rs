use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ==============================================================================
// SLOTS
// ==============================================================================

/// One bookable time window of one doctor. Created out-of-band by doctor
/// tooling; the booking flow only ever flips `is_booked` to true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub start_time: NaiveTime,
    #[serde(with = "clock_time")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub is_booked: bool,
}

impl Slot {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn matches(&self, date: NaiveDate, start_time: NaiveTime) -> bool {
        self.date == date && self.start_time == start_time
    }
}

// ==============================================================================
// BOOKING RECORDS
// ==============================================================================

/// Confirmed appointment. `date`/`time` and the patient fields are copied at
/// claim time and never re-read from the slot or the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: String,
    pub doctor_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub time: NaiveTime,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBookingRecord {
    pub doctor_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub time: NaiveTime,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewBookingRecord {
    pub fn into_record(self, id: String) -> BookingRecord {
        BookingRecord {
            id,
            doctor_id: self.doctor_id,
            user_id: self.user_id,
            date: self.date,
            time: self.time,
            patient_name: self.patient_name,
            patient_email: self.patient_email,
            created_at: self.created_at,
        }
    }
}

// ==============================================================================
// DOCTORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub governorate: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub review: f64,
}

// ==============================================================================
// WIRE FORMATS
// ==============================================================================

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Time-of-day codec. Slot documents carry `HH:MM`; Postgres `time`
/// columns come back as `HH:MM:SS`. Both decode to the same value.
/// Encoding drops the seconds only when they are zero, so every encoded
/// value decodes back to the exact time it came from.
pub mod clock_time {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        let raw = raw.trim();
        NaiveTime::parse_from_str(raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
    }

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(time))
    }

    pub fn format(time: &NaiveTime) -> String {
        if time.second() == 0 {
            time.format("%H:%M").to_string()
        } else {
            time.format("%H:%M:%S").to_string()
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time of day: {}", raw)))
    }
}
