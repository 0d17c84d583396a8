//! API layer for LeaveFlow
//!
//! HTTP handlers for sessions, leave requests and the admin dashboard.
//! Everything is mounted under `/api` by [`AppState::configure`].

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;
pub mod state;

pub use state::{json_config, path_config, AppState, SessionSettings};
