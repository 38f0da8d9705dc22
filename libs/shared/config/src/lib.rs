use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_STORE_TIMEOUT_SECS: u64 = 15;
const DEFAULT_PORT: u16 = 3000;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// How the booking coordinator flips a slot to booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimProtocol {
    /// Compare-and-set on `is_booked`; a lost race fails the claim.
    #[default]
    Conditional,
    /// Unconditional flag write after a re-fetch. Allows double booking
    /// under concurrent claims; kept for compatibility only.
    Legacy,
}

impl fmt::Display for ClaimProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimProtocol::Conditional => write!(f, "conditional"),
            ClaimProtocol::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for ClaimProtocol {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "conditional" | "cas" => Ok(ClaimProtocol::Conditional),
            "legacy" => Ok(ClaimProtocol::Legacy),
            other => Err(format!("unknown claim protocol: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub store_timeout_secs: u64,
    pub claim_protocol: ClaimProtocol,
    /// Clinic time zone as minutes east of UTC. Slot dates and times are
    /// clinic-local; `None` falls back to the server's local zone.
    pub clinic_utc_offset_minutes: Option<i32>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            store_timeout_secs: parse_or_default("STORE_TIMEOUT_SECS", DEFAULT_STORE_TIMEOUT_SECS),
            claim_protocol: parse_or_default("CLAIM_PROTOCOL", ClaimProtocol::default()),
            clinic_utc_offset_minutes: env::var("CLINIC_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|raw| {
                    let parsed = parse_offset_minutes(&raw);
                    if parsed.is_none() {
                        warn!("CLINIC_UTC_OFFSET_MINUTES has invalid value {:?}, using server local time", raw);
                    }
                    parsed
                }),
            port: parse_or_default("PORT", DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if config.clinic_utc_offset_minutes.is_none() {
            warn!("CLINIC_UTC_OFFSET_MINUTES not set, past slots are cut off in server local time");
        }

        if config.claim_protocol == ClaimProtocol::Legacy {
            warn!("CLAIM_PROTOCOL=legacy: concurrent claims on one slot may double-book");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn clinic_offset(&self) -> Option<FixedOffset> {
        self.clinic_utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes * 60))
    }
}

/// Minutes east of UTC, e.g. `120` or `-300`. Real zones stay within 14 hours.
pub fn parse_offset_minutes(raw: &str) -> Option<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|minutes| minutes.abs() <= MAX_OFFSET_MINUTES)
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: FromStr + fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_protocol_parses_known_values() {
        assert_eq!("conditional".parse::<ClaimProtocol>(), Ok(ClaimProtocol::Conditional));
        assert_eq!(" Legacy ".parse::<ClaimProtocol>(), Ok(ClaimProtocol::Legacy));
        assert!("optimistic".parse::<ClaimProtocol>().is_err());
    }

    #[test]
    fn offset_minutes_parse_within_range() {
        assert_eq!(parse_offset_minutes("120"), Some(120));
        assert_eq!(parse_offset_minutes(" -300 "), Some(-300));
        assert_eq!(parse_offset_minutes("+02:00"), None);
        assert_eq!(parse_offset_minutes("1500"), None);
    }

    #[test]
    fn clinic_offset_converts_minutes() {
        let config = AppConfig {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            store_timeout_secs: 1,
            claim_protocol: ClaimProtocol::Conditional,
            clinic_utc_offset_minutes: Some(120),
            port: 0,
        };
        assert_eq!(config.clinic_offset(), FixedOffset::east_opt(7200));

        let unset = AppConfig {
            clinic_utc_offset_minutes: None,
            ..config
        };
        assert_eq!(unset.clinic_offset(), None);
    }

    #[test]
    fn default_protocol_is_conditional() {
        assert_eq!(ClaimProtocol::default(), ClaimProtocol::Conditional);
    }
}
