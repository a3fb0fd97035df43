//! Validity windows.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A half-open period `[from, to)` during which an entity version applies.
///
/// A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidityWindow {
    #[serde(default)]
    pub from: Option<NaiveDateTime>,
    #[serde(default)]
    pub to: Option<NaiveDateTime>,
}

impl ValidityWindow {
    pub fn new(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Self {
        Self { from, to }
    }

    /// A window that is always valid.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether the window has ended at `timestamp`.
    pub fn has_ended(&self, timestamp: NaiveDateTime) -> bool {
        self.to.is_some_and(|to| to <= timestamp)
    }

    /// Whether the window has begun at `timestamp`.
    pub fn has_started(&self, timestamp: NaiveDateTime) -> bool {
        self.from.is_none_or(|from| from <= timestamp)
    }

    /// Whether `timestamp` lies inside the window.
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.has_started(timestamp) && !self.has_ended(timestamp)
    }
}

/// Something carrying validity windows.
pub trait Validity {
    fn validity(&self) -> &[ValidityWindow];
}

impl<T: Validity + ?Sized> Validity for &T {
    fn validity(&self) -> &[ValidityWindow] {
        (**self).validity()
    }
}

/// Whether an entity with these windows is valid at `timestamp`.
///
/// No windows at all means always valid.
pub fn is_valid_at(windows: &[ValidityWindow], timestamp: NaiveDateTime) -> bool {
    windows.is_empty() || windows.iter().any(|w| w.contains(timestamp))
}

/// The first point in time, at or after `timestamp`, at which the windows
/// are in effect.
///
/// Each window is classified as past, current or future. Past windows are
/// skipped; a current window returns `timestamp` at once; otherwise the
/// earliest future start is returned. An empty list, or a list holding only
/// past windows, returns `timestamp` unchanged.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use transit_server::version::{first_valid_date_time, ValidityWindow};
///
/// let at = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let now = at(10);
///
/// assert_eq!(first_valid_date_time(&[], now), now);
///
/// let future = ValidityWindow::new(Some(at(20)), Some(at(25)));
/// assert_eq!(first_valid_date_time(&[future], now), at(20));
///
/// let current = ValidityWindow::new(None, Some(at(12)));
/// assert_eq!(first_valid_date_time(&[future, current], now), now);
/// ```
pub fn first_valid_date_time(
    windows: &[ValidityWindow],
    timestamp: NaiveDateTime,
) -> NaiveDateTime {
    let mut first_future: Option<NaiveDateTime> = None;

    for window in windows {
        if window.has_ended(timestamp) {
            continue;
        }

        match window.from {
            Some(from) if from > timestamp => {
                if first_future.is_none_or(|first| from < first) {
                    first_future = Some(from);
                }
            }
            _ => return timestamp,
        }
    }

    first_future.unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn empty_windows_are_always_valid() {
        let now = at(10, 12);
        assert_eq!(first_valid_date_time(&[], now), now);
        assert!(is_valid_at(&[], now));
    }

    #[test]
    fn expired_window_is_ignored() {
        let t0 = at(10, 12);
        let expired = ValidityWindow::new(None, Some(t0 - Duration::seconds(1)));

        assert_eq!(first_valid_date_time(&[expired], t0), t0);
        let later = at(11, 8);
        assert_eq!(first_valid_date_time(&[expired], later), later);
        assert!(!is_valid_at(&[expired], t0));
    }

    #[test]
    fn future_window_returns_its_start() {
        let now = at(10, 12);
        let w = ValidityWindow::new(Some(at(15, 0)), Some(at(20, 0)));
        assert_eq!(first_valid_date_time(&[w], now), at(15, 0));
        assert!(!is_valid_at(&[w], now));
    }

    #[test]
    fn earliest_future_start_wins() {
        let now = at(10, 12);
        let windows = [
            ValidityWindow::new(Some(at(20, 0)), None),
            ValidityWindow::new(Some(at(14, 0)), Some(at(16, 0))),
            ValidityWindow::new(Some(at(18, 0)), None),
        ];
        assert_eq!(first_valid_date_time(&windows, now), at(14, 0));
    }

    #[test]
    fn current_window_short_circuits() {
        let now = at(10, 12);
        let windows = [
            ValidityWindow::new(Some(at(14, 0)), None),
            ValidityWindow::new(Some(at(1, 0)), Some(at(30, 0))),
            ValidityWindow::new(None, Some(at(2, 0))),
        ];
        assert_eq!(first_valid_date_time(&windows, now), now);
        assert!(is_valid_at(&windows, now));
    }

    #[test]
    fn open_start_is_current() {
        let now = at(10, 12);
        let w = ValidityWindow::new(None, None);
        assert_eq!(first_valid_date_time(&[w], now), now);
        assert!(w.contains(now));
    }

    #[test]
    fn window_is_half_open() {
        let w = ValidityWindow::new(Some(at(10, 0)), Some(at(11, 0)));
        assert!(w.contains(at(10, 0)));
        assert!(w.contains(at(10, 23)));
        assert!(!w.contains(at(11, 0)));
        assert!(!w.contains(at(9, 23)));
    }

    #[test]
    fn window_starting_exactly_now_is_current() {
        let now = at(10, 12);
        let w = ValidityWindow::new(Some(now), Some(at(11, 0)));
        assert_eq!(first_valid_date_time(&[w], now), now);
    }

    #[test]
    fn deserializes_with_missing_bounds() {
        let w: ValidityWindow = serde_json::from_str(r#"{"from": "2024-05-10T00:00:00"}"#).unwrap();
        assert_eq!(w.from, Some(at(10, 0)));
        assert_eq!(w.to, None);
    }
}
