//! Transfer constraints from static rule feeds.

use serde::{Deserialize, Serialize};

/// Longest minimum transfer time or maximum wait a constraint may carry
/// (seconds).
pub const MAX_CONSTRAINT_SECS: i32 = 86_400;

/// A constraint duration outside `0..=MAX_CONSTRAINT_SECS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{field} of {seconds}s is outside 0..={max}", max = MAX_CONSTRAINT_SECS)]
pub struct ConstraintError {
    pub field: &'static str,
    pub seconds: i32,
}

/// Rider preference for a transfer, lowest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TransferPriority {
    /// The transfer may not be made.
    NotAllowed,
    #[default]
    Allowed,
    Recommended,
    Preferred,
}

/// Rule-based override of the default transfer logic.
///
/// A constraint is *facilitated* when the rider is guaranteed to make the
/// connection (the target waits, or the rider stays on the same vehicle);
/// the default minimum transfer time is then waived.
///
/// # Examples
///
/// ```
/// use transit_server::constrained::TransferConstraint;
///
/// let guaranteed = TransferConstraint::regular().guaranteed();
/// assert!(guaranteed.is_facilitated());
///
/// let slow = TransferConstraint::regular().with_min_transfer_time(300);
/// assert!(!slow.is_facilitated());
/// assert!(!slow.is_regular());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConstraint {
    pub priority: TransferPriority,
    pub stay_seated: bool,
    pub guaranteed: bool,
    /// Overrides the default minimum transfer time (seconds).
    pub min_transfer_time: Option<i32>,
    /// Longest the rider is expected to wait for the target (seconds).
    pub max_wait_time: Option<i32>,
}

impl TransferConstraint {
    /// A constraint that changes nothing.
    pub fn regular() -> Self {
        Self::default()
    }

    /// A constraint forbidding the transfer.
    pub fn not_allowed() -> Self {
        Self {
            priority: TransferPriority::NotAllowed,
            ..Self::default()
        }
    }

    pub fn guaranteed(mut self) -> Self {
        self.guaranteed = true;
        self
    }

    pub fn stay_seated(mut self) -> Self {
        self.stay_seated = true;
        self
    }

    pub fn with_priority(mut self, priority: TransferPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_min_transfer_time(mut self, seconds: i32) -> Self {
        self.min_transfer_time = Some(seconds);
        self
    }

    pub fn with_max_wait_time(mut self, seconds: i32) -> Self {
        self.max_wait_time = Some(seconds);
        self
    }

    /// Whether the connection is guaranteed regardless of slack.
    pub fn is_facilitated(&self) -> bool {
        self.stay_seated || self.guaranteed
    }

    pub fn is_not_allowed(&self) -> bool {
        self.priority == TransferPriority::NotAllowed
    }

    /// Check that both durations are within range.
    pub fn validate(&self) -> Result<(), ConstraintError> {
        for (field, value) in [
            ("min_transfer_time", self.min_transfer_time),
            ("max_wait_time", self.max_wait_time),
        ] {
            if let Some(seconds) = value.filter(|s| !(0..=MAX_CONSTRAINT_SECS).contains(s)) {
                return Err(ConstraintError { field, seconds });
            }
        }
        Ok(())
    }

    /// Whether the constraint overrides nothing beyond priority.
    pub fn is_regular(&self) -> bool {
        !self.is_not_allowed()
            && !self.is_facilitated()
            && self.min_transfer_time.is_none()
            && self.max_wait_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_constraint() {
        let c = TransferConstraint::regular();
        assert!(c.is_regular());
        assert!(!c.is_facilitated());
        assert!(!c.is_not_allowed());
        assert_eq!(c.priority, TransferPriority::Allowed);
    }

    #[test]
    fn priority_alone_is_still_regular() {
        let c = TransferConstraint::regular().with_priority(TransferPriority::Preferred);
        assert!(c.is_regular());
    }

    #[test]
    fn facilitated_variants() {
        assert!(TransferConstraint::regular().guaranteed().is_facilitated());
        assert!(TransferConstraint::regular().stay_seated().is_facilitated());
        assert!(!TransferConstraint::regular().with_max_wait_time(60).is_facilitated());
    }

    #[test]
    fn not_allowed() {
        let c = TransferConstraint::not_allowed();
        assert!(c.is_not_allowed());
        assert!(!c.is_regular());
    }

    #[test]
    fn priority_ordering() {
        assert!(TransferPriority::NotAllowed < TransferPriority::Allowed);
        assert!(TransferPriority::Recommended < TransferPriority::Preferred);
    }

    #[test]
    fn durations_are_range_checked() {
        assert!(TransferConstraint::regular().validate().is_ok());
        assert!(
            TransferConstraint::regular()
                .with_min_transfer_time(MAX_CONSTRAINT_SECS)
                .with_max_wait_time(0)
                .validate()
                .is_ok()
        );

        let err = TransferConstraint::regular()
            .with_min_transfer_time(i32::MAX)
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "min_transfer_time");
        assert_eq!(err.seconds, i32::MAX);

        let err = TransferConstraint::regular()
            .with_max_wait_time(-1)
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "max_wait_time");
    }

    #[test]
    fn deserialize_with_defaults() {
        let c: TransferConstraint =
            serde_json::from_str(r#"{"guaranteed": true, "max_wait_time": 180}"#).unwrap();
        assert!(c.guaranteed);
        assert!(!c.stay_seated);
        assert_eq!(c.max_wait_time, Some(180));
        assert_eq!(c.priority, TransferPriority::Allowed);

        let forbidden: TransferConstraint =
            serde_json::from_str(r#"{"priority": "not_allowed"}"#).unwrap();
        assert!(forbidden.is_not_allowed());
    }
}
