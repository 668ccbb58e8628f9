//! Nutribase Client - backend access and editing sessions.
//!
//! Talks to the Nutribase REST backend and drives the workflows in
//! `nutribase-core` against it.
//!
//! # Modules
//!
//! - [`api`] - Typed HTTP client for users, preferences and maintenance
//! - [`persistence`] - Background save queue for preference writes
//! - [`session`] - A signed-in user's card editing session
//! - [`admin`] - User listing and administration
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod config;
pub mod error;
pub mod persistence;
pub mod session;

pub use admin::{AdminError, AdminPanel, ApprovalAction, UserQuery, UserRow};
pub use api::{ApiClient, StatusPayload};
pub use config::{ApiConfig, ClientConfig, ConfigError};
pub use error::ApiError;
pub use persistence::{SaveConfig, SaveQueue, SyncStatus};
pub use session::{Session, SessionError, SessionOptions};
