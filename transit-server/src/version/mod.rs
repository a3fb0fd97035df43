//! Version resolution for schedule entities.
//!
//! The same logical trip, line or calendar can arrive several times from
//! overlapping feed files, each copy tagged with a version and a set of
//! validity windows. This module picks the authoritative copy for a point
//! in time.
//!
//! Everything here is a total, side-effect free function; it is safe to call
//! from any number of query threads.

mod tag;
mod validity;

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use tag::{
    UNKNOWN_VERSION, VersionTag, Versioned, comparing_version, latest_version_in,
    latest_versioned_element_in, resolve_version,
};
pub use validity::{Validity, ValidityWindow, first_valid_date_time, is_valid_at};

/// A feed entity together with its version tag and validity windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedEntity<T> {
    pub version: VersionTag,
    #[serde(default)]
    pub validity: Vec<ValidityWindow>,
    pub value: T,
}

impl<T> VersionedEntity<T> {
    pub fn new(version: impl Into<VersionTag>, value: T) -> Self {
        Self {
            version: version.into(),
            validity: Vec::new(),
            value,
        }
    }

    pub fn with_validity(mut self, window: ValidityWindow) -> Self {
        self.validity.push(window);
        self
    }
}

impl<T> Versioned for VersionedEntity<T> {
    fn version_tag(&self) -> &VersionTag {
        &self.version
    }
}

impl<T> Validity for VersionedEntity<T> {
    fn validity(&self) -> &[ValidityWindow] {
        &self.validity
    }
}

/// Pick the active version among competing versions of one identity.
///
/// Only versions valid at `timestamp` compete; among them the latest version
/// wins, the first one encountered on a tie.
pub fn select_active<E, I>(versions: I, timestamp: NaiveDateTime) -> Option<E>
where
    E: Versioned + Validity,
    I: IntoIterator<Item = E>,
{
    latest_versioned_element_in(
        versions
            .into_iter()
            .filter(|e| is_valid_at(e.validity(), timestamp)),
    )
}

/// Resolve the active version of every identity in `entities`.
///
/// `key` extracts the logical identity. Identities with no version valid at
/// `timestamp` are left out of the result.
pub fn resolve_active_set<'a, E, K, F>(
    entities: &'a [E],
    timestamp: NaiveDateTime,
    key: F,
) -> BTreeMap<K, &'a E>
where
    E: Versioned + Validity,
    K: Ord + Clone + std::fmt::Debug,
    F: Fn(&E) -> K,
{
    let mut by_identity: BTreeMap<K, Vec<&'a E>> = BTreeMap::new();
    for entity in entities {
        by_identity.entry(key(entity)).or_default().push(entity);
    }

    let mut active = BTreeMap::new();
    for (identity, versions) in by_identity {
        match select_active(versions, timestamp) {
            Some(entity) => {
                active.insert(identity, entity);
            }
            None => {
                debug!(?identity, %timestamp, "No version valid at timestamp");
            }
        }
    }

    active
}
