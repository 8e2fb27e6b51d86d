//! Built-in string formats

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Named string format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFormat {
    Email,
    Url,
    Uuid,
    /// RFC 3339 timestamp
    DateTime,
    /// `YYYY-MM-DD`
    Date,
    /// `HH:MM:SS[.fraction]`
    Time,
    Ipv4,
    /// Full or `::`-compressed notation
    Ipv6,
    Hostname,
}

struct FormatPatterns {
    email: Regex,
    url: Regex,
    uuid: Regex,
    time: Regex,
    hostname: Regex,
}

fn patterns() -> Option<&'static FormatPatterns> {
    static PATTERNS: OnceLock<Option<FormatPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(FormatPatterns {
                email: Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok()?,
                url: Regex::new(r"^https?://[^\s/$.?#][^\s]*$").ok()?,
                uuid: Regex::new(
                    r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
                )
                .ok()?,
                time: Regex::new(r"^[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]{1,9})?$").ok()?,
                hostname: Regex::new(
                    r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
                )
                .ok()?,
            })
        })
        .as_ref()
}

impl StringFormat {
    pub fn name(&self) -> &'static str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Url => "url",
            StringFormat::Uuid => "uuid",
            StringFormat::DateTime => "datetime",
            StringFormat::Date => "date",
            StringFormat::Time => "time",
            StringFormat::Ipv4 => "ipv4",
            StringFormat::Ipv6 => "ipv6",
            StringFormat::Hostname => "hostname",
        }
    }

    /// Whether `s` is a valid instance of this format
    pub fn matches(&self, s: &str) -> bool {
        match self {
            StringFormat::DateTime => DateTime::parse_from_rfc3339(s).is_ok(),
            StringFormat::Date => {
                s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
            }
            StringFormat::Time => {
                let Some(p) = patterns() else { return false };
                p.time.is_match(s)
                    && s.get(..8)
                        .is_some_and(|hms| NaiveTime::parse_from_str(hms, "%H:%M:%S").is_ok())
            }
            StringFormat::Ipv4 => s.parse::<Ipv4Addr>().is_ok(),
            StringFormat::Ipv6 => s.parse::<Ipv6Addr>().is_ok(),
            StringFormat::Email => patterns().is_some_and(|p| p.email.is_match(s)),
            StringFormat::Url => patterns().is_some_and(|p| p.url.is_match(s)),
            StringFormat::Uuid => patterns().is_some_and(|p| p.uuid.is_match(s)),
            StringFormat::Hostname => {
                s.len() <= 253 && patterns().is_some_and(|p| p.hostname.is_match(s))
            }
        }
    }
}
