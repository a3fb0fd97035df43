//! Web layer for the transit server.
//!
//! A small JSON surface for operators: network and transfer inspection, the
//! live timetable, and realtime update submission.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
