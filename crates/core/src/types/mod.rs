//! Domain types for Nutribase.
//!
//! Type-safe wrappers for users, roles and card preferences.

pub mod email;
pub mod nutrient;
pub mod preferences;
pub mod role;
pub mod user;

pub use email::{Email, EmailError};
pub use nutrient::NutrientSelection;
pub use preferences::{CardNutrients, PreferenceError, Preferences};
pub use role::{Role, UnknownRoleError, role_to_string};
pub use user::User;
