//! Domain models for LeaveFlow
//!
//! This module contains the core domain models used throughout the application.

pub mod leave;
pub mod user;

pub use leave::{LeaveNotification, LeaveRequest, LeaveRequestWithOwner, LeaveStatus, NewLeaveRequest};
pub use user::{NewUser, User, UserInfo, UserRole};
