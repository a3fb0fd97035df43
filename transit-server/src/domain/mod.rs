//! Domain types for the transit network.
//!
//! This module contains the core model types that represent validated
//! schedule data. All types enforce their invariants at construction
//! time, so code that receives these types can trust their validity.

mod error;
mod id;
mod realtime_state;
mod stop;
mod time;
mod trip;

pub use error::DomainError;
pub use id::{FeedScopedId, InvalidFeedScopedId};
pub use realtime_state::RealTimeState;
pub use stop::{Stop, StopIndex, WgsCoordinate};
pub use time::{ServiceTime, TimeError};
pub use trip::{StopTime, StopTimeKey, Trip};
