//! Nutribase Core - card preferences, undo history and role policy.
//!
//! This crate is shared by the API client and the CLI:
//! - `client` - HTTP access to the Nutribase backend and editing sessions
//! - `cli` - Operator command-line tool
//!
//! # Architecture
//!
//! The core crate contains only types, rules and state machines - no I/O,
//! no HTTP, no async runtime. Persistence is reached through the
//! [`store::PreferenceSink`] trait, implemented by the client crate.
//!
//! # Modules
//!
//! - [`types`] - Emails, roles, users, nutrient selections and preferences
//! - [`policy`] - Role-based capability checks
//! - [`defaults`] - Default card nutrients and the nutrient catalog
//! - [`history`] - Bounded undo history
//! - [`store`] - Preference store and its persistence seam
//! - [`workflow`] - The card editing state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod defaults;
pub mod history;
pub mod policy;
pub mod store;
pub mod types;
pub mod workflow;

pub use defaults::{DEFAULT_CARD_NUTRIENTS, NutrientCatalog, default_card_nutrients};
pub use history::{DEFAULT_UNDO_DEPTH, UndoHistory};
pub use store::{PreferenceSink, PreferenceStore, SaveRequest};
pub use types::*;
pub use workflow::{CardEditor, EditError, EditState};
