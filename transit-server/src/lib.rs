//! Transit journey-planning server.
//!
//! Resolves versioned feed entities, builds the stop-to-stop transfer
//! index, answers constrained-transfer lookups, and applies realtime
//! updates to a live timetable while summarizing each batch.

pub mod config;
pub mod constrained;
pub mod domain;
pub mod network;
pub mod transfer;
pub mod updater;
pub mod version;
pub mod web;
