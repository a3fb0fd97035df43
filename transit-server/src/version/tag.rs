//! Version tags and version ordering.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Resolved version of an entity whose tag is the sentinel `"any"`.
///
/// Lower than every real version, so a real version always wins.
pub const UNKNOWN_VERSION: i32 = -1;

/// Sentinel tag meaning "version unknown".
const ANY: &str = "any";

/// Longest digit run kept when salvaging a version from a malformed tag.
const MAX_VERSION_DIGITS: usize = 8;

/// Resolve a raw version tag to an integer.
///
/// Never fails: this runs inside sort comparators.
///
/// - `"any"` resolves to [`UNKNOWN_VERSION`]
/// - a tag that parses as an integer resolves to that integer
/// - otherwise every non-digit is stripped and the first 8 remaining digits
///   are parsed; no digits at all resolves to `0`
///
/// # Examples
///
/// ```
/// use transit_server::version::{resolve_version, UNKNOWN_VERSION};
///
/// assert_eq!(resolve_version("any"), UNKNOWN_VERSION);
/// assert_eq!(resolve_version("42"), 42);
/// assert_eq!(resolve_version("v3.1"), 31);
/// assert_eq!(resolve_version("draft"), 0);
/// assert_eq!(resolve_version("2024-01-15T10:00"), 20240115);
/// ```
pub fn resolve_version(tag: &str) -> i32 {
    if tag == ANY {
        return UNKNOWN_VERSION;
    }

    if let Ok(version) = tag.parse::<i32>() {
        return version;
    }

    // At most 8 digits, so the fold cannot overflow an i32
    tag.bytes()
        .filter(u8::is_ascii_digit)
        .take(MAX_VERSION_DIGITS)
        .fold(0, |acc, digit| acc * 10 + i32::from(digit - b'0'))
}

/// The raw version tag of a versioned entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The sentinel "unknown version" tag.
    pub fn any() -> Self {
        Self(ANY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve this tag; see [`resolve_version`].
    pub fn resolve(&self) -> i32 {
        resolve_version(&self.0)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A schedule object that may exist in several competing versions.
pub trait Versioned {
    fn version_tag(&self) -> &VersionTag;

    /// Resolved integer version.
    fn version(&self) -> i32 {
        self.version_tag().resolve()
    }
}

impl<T: Versioned + ?Sized> Versioned for &T {
    fn version_tag(&self) -> &VersionTag {
        (**self).version_tag()
    }
}

/// Comparator ordering entities by resolved version.
pub fn comparing_version<E: Versioned>() -> impl Fn(&E, &E) -> Ordering {
    |a, b| a.version().cmp(&b.version())
}

/// Maximum resolved version in `entities`, or [`UNKNOWN_VERSION`] if empty.
pub fn latest_version_in<E, I>(entities: I) -> i32
where
    E: Versioned,
    I: IntoIterator<Item = E>,
{
    entities
        .into_iter()
        .map(|e| e.version())
        .max()
        .unwrap_or(UNKNOWN_VERSION)
}

/// The entity with the maximum resolved version.
///
/// On equal versions the first one encountered is kept. Empty input yields
/// `None`.
pub fn latest_versioned_element_in<E, I>(entities: I) -> Option<E>
where
    E: Versioned,
    I: IntoIterator<Item = E>,
{
    let mut best: Option<(i32, E)> = None;

    for entity in entities {
        let version = entity.version();
        match &best {
            Some((best_version, _)) if version <= *best_version => {}
            _ => best = Some((version, entity)),
        }
    }

    best.map(|(_, entity)| entity)
}
