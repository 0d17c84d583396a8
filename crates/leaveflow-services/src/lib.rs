//! Business logic services for LeaveFlow
//!
//! Services receive their collaborators (the `LeaveStore` backend and the
//! `Notifier`) at construction and are shared behind `Arc` by the HTTP layer.
//!
//! # Services
//!
//! - `ledger` - Day-span and balance arithmetic
//! - `LeaveService` - Create, edit and delete leave requests
//! - `StatsService` - Admin dashboard aggregation
//! - `AccountService` - Login, registration, password changes, startup accounts
//! - `notifier` - Slack and log notifiers plus detached dispatch

pub mod account_service;
pub mod ledger;
pub mod leave_service;
pub mod notifier;
pub mod stats;

pub use account_service::{AccountService, Registration};
pub use leave_service::{Caller, LeaveChanges, LeaveService};
pub use notifier::{dispatch, notifier_from_config, LogNotifier, SlackNotifier};
pub use stats::{compute_admin_stats, AdminStats, StatsService};
