//! Feed-scoped identifiers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid feed-scoped id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid feed-scoped id: {reason}")]
pub struct InvalidFeedScopedId {
    reason: &'static str,
}

/// Identity of a transit entity within a feed namespace.
///
/// Two feeds may both define a stop called `1234`; the feed id keeps them
/// apart. The text form is `FEED:ID`, split on the first colon, so the local
/// part may itself contain colons.
///
/// # Examples
///
/// ```
/// use transit_server::domain::FeedScopedId;
///
/// let id = FeedScopedId::parse("RB:NSR:Quay:7").unwrap();
/// assert_eq!(id.feed_id(), "RB");
/// assert_eq!(id.id(), "NSR:Quay:7");
/// assert_eq!(id.to_string(), "RB:NSR:Quay:7");
///
/// assert!(FeedScopedId::parse("no-separator").is_err());
/// assert!(FeedScopedId::parse(":empty-feed").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedScopedId {
    feed_id: String,
    id: String,
}

impl FeedScopedId {
    /// Create an id from its two parts.
    pub fn new(
        feed_id: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<Self, InvalidFeedScopedId> {
        let feed_id = feed_id.into();
        let id = id.into();

        if feed_id.is_empty() {
            return Err(InvalidFeedScopedId {
                reason: "feed id cannot be empty",
            });
        }
        if feed_id.contains(':') {
            return Err(InvalidFeedScopedId {
                reason: "feed id cannot contain ':'",
            });
        }
        if id.is_empty() {
            return Err(InvalidFeedScopedId {
                reason: "id cannot be empty",
            });
        }

        Ok(Self { feed_id, id })
    }

    /// Parse the `FEED:ID` text form.
    pub fn parse(s: &str) -> Result<Self, InvalidFeedScopedId> {
        let (feed_id, id) = s.split_once(':').ok_or(InvalidFeedScopedId {
            reason: "expected FEED:ID",
        })?;
        Self::new(feed_id, id)
    }

    /// The feed namespace.
    pub fn feed_id(&self) -> &str {
        &self.feed_id
    }

    /// The id local to the feed.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for FeedScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedScopedId({}:{})", self.feed_id, self.id)
    }
}

impl fmt::Display for FeedScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.feed_id, self.id)
    }
}

impl Serialize for FeedScopedId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FeedScopedId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FeedScopedId::parse(&s).map_err(serde::de::Error::custom)
    }
}
