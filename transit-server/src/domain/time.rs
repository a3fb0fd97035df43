//! Service-day times.
//!
//! Timetables express times as an offset from midnight of the service day.
//! Trips that run past midnight keep counting (`25:10` is ten past one the
//! next morning), so a plain `NaiveTime` cannot represent them.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Latest hour accepted when parsing; long overnight trips stay well below.
const MAX_HOURS: i32 = 47;

/// Seconds since midnight of the service day.
///
/// # Examples
///
/// ```
/// use transit_server::domain::ServiceTime;
///
/// let t = ServiceTime::parse("08:15").unwrap();
/// assert_eq!(t.seconds(), 8 * 3600 + 15 * 60);
///
/// // Past-midnight times keep counting
/// let late = ServiceTime::parse("25:10:30").unwrap();
/// assert_eq!(late.to_string(), "25:10:30");
///
/// assert!(ServiceTime::parse("8:15").is_err());
/// assert!(ServiceTime::parse("08:60").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceTime(i32);

impl ServiceTime {
    /// Create a time from seconds since midnight.
    pub const fn from_seconds(seconds: i32) -> Self {
        Self(seconds)
    }

    /// Create a time from hours, minutes and seconds.
    pub const fn hms(hours: i32, minutes: i32, seconds: i32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Parse `HH:MM` or `HH:MM:SS`.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();

        if bytes.len() != 5 && bytes.len() != 8 {
            return Err(TimeError::new("expected HH:MM or HH:MM:SS format"));
        }
        if bytes[2] != b':' || (bytes.len() == 8 && bytes[5] != b':') {
            return Err(TimeError::new("expected ':' separators"));
        }

        let hours =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hours > MAX_HOURS {
            return Err(TimeError::new("hour out of range"));
        }

        let minutes = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let seconds = if bytes.len() == 8 {
            let s = parse_two_digits(&bytes[6..8])
                .ok_or_else(|| TimeError::new("invalid second digits"))?;
            if s > 59 {
                return Err(TimeError::new("second must be 0-59"));
            }
            s
        } else {
            0
        };

        Ok(Self::hms(hours, minutes, seconds))
    }

    /// Seconds since midnight.
    pub fn seconds(&self) -> i32 {
        self.0
    }

    /// Signed number of seconds from `other` to `self`, saturating.
    pub fn seconds_since(&self, other: ServiceTime) -> i32 {
        self.0.saturating_sub(other.0)
    }
}

// Offsets come from feed data, so arithmetic saturates instead of wrapping.
impl Add<i32> for ServiceTime {
    type Output = Self;

    fn add(self, rhs: i32) -> Self::Output {
        ServiceTime(self.0.saturating_add(rhs))
    }
}

impl Sub<i32> for ServiceTime {
    type Output = Self;

    fn sub(self, rhs: i32) -> Self::Output {
        ServiceTime(self.0.saturating_sub(rhs))
    }
}

impl fmt::Display for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let total = self.0.unsigned_abs();
        let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
        if s == 0 {
            write!(f, "{sign}{h:02}:{m:02}")
        } else {
            write!(f, "{sign}{h:02}:{m:02}:{s:02}")
        }
    }
}

impl Serialize for ServiceTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ServiceTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ServiceTime::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse two ASCII digit bytes.
fn parse_two_digits(bytes: &[u8]) -> Option<i32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some((d1 * 10 + d2) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hh_mm() {
        assert_eq!(ServiceTime::parse("00:00").unwrap().seconds(), 0);
        assert_eq!(ServiceTime::parse("23:59").unwrap().seconds(), 86_340);
        assert_eq!(ServiceTime::parse("10:30").unwrap(), ServiceTime::hms(10, 30, 0));
    }

    #[test]
    fn parse_hh_mm_ss() {
        assert_eq!(
            ServiceTime::parse("10:30:15").unwrap(),
            ServiceTime::hms(10, 30, 15)
        );
    }

    #[test]
    fn parse_past_midnight() {
        assert_eq!(ServiceTime::parse("24:05").unwrap().seconds(), 86_700);
        assert!(ServiceTime::parse("47:59").is_ok());
        assert!(ServiceTime::parse("48:00").is_err());
    }

    #[test]
    fn reject_invalid_formats() {
        assert!(ServiceTime::parse("").is_err());
        assert!(ServiceTime::parse("1030").is_err());
        assert!(ServiceTime::parse("10-30").is_err());
        assert!(ServiceTime::parse("10:3a").is_err());
        assert!(ServiceTime::parse("10:30:60").is_err());
        assert!(ServiceTime::parse("10:30:1").is_err());
    }

    #[test]
    fn arithmetic_saturates() {
        let t = ServiceTime::hms(10, 0, 0);
        assert_eq!(t + i32::MAX, ServiceTime::from_seconds(i32::MAX));
        assert_eq!(t - i32::MAX, ServiceTime::from_seconds(36_000 - i32::MAX));
        assert_eq!(ServiceTime::from_seconds(i32::MIN) - 1, ServiceTime::from_seconds(i32::MIN));
        assert_eq!(
            ServiceTime::from_seconds(i32::MAX).seconds_since(ServiceTime::from_seconds(-1)),
            i32::MAX
        );
        assert_eq!((t + 90).seconds_since(t), 90);
    }

    #[test]
    fn display() {
        assert_eq!(ServiceTime::hms(9, 5, 0).to_string(), "09:05");
        assert_eq!(ServiceTime::hms(9, 5, 7).to_string(), "09:05:07");
        assert_eq!(ServiceTime::from_seconds(-60).to_string(), "-00:01");
        assert!(ServiceTime::from_seconds(i32::MIN).to_string().starts_with('-'));
    }

    #[test]
    fn arithmetic() {
        let t = ServiceTime::hms(10, 0, 0);
        assert_eq!((t + 120).to_string(), "10:02");
        assert_eq!((t - 60).to_string(), "09:59");
        assert_eq!((t + 300).seconds_since(t), 300);
        assert_eq!(t.seconds_since(t + 300), -300);
    }

    #[test]
    fn serde_uses_text_form() {
        let t = ServiceTime::hms(7, 45, 0);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"07:45\"");
        let back: ServiceTime = serde_json::from_str("\"07:45\"").unwrap();
        assert_eq!(back, t);
    }
}
