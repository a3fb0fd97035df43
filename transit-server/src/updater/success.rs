//! Successful realtime mutations.

use serde::Serialize;

/// Something odd about a mutation that was still applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningType {
    /// An added trip referenced stops the network does not know; they were
    /// dropped.
    UnknownStopsRemovedFromAddedTrip,
    /// The trip was already cancelled or deleted.
    NoOpCancellation,
}

/// An applied mutation, with any warnings raised along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSuccess {
    pub warnings: Vec<WarningType>,
}

impl UpdateSuccess {
    pub fn no_warnings() -> Self {
        Self::default()
    }

    pub fn of_warnings(warnings: impl IntoIterator<Item = WarningType>) -> Self {
        Self {
            warnings: warnings.into_iter().collect(),
        }
    }

    pub fn add_warnings(mut self, warnings: impl IntoIterator<Item = WarningType>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}
