//! Nutrient selections shown on a food card.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A nutrient the user chose to display on food cards.
///
/// Identity is [`name`](Self::name); the label is presentation only and may
/// change (for example when localized) without making it a different
/// nutrient. `PartialEq` is structural, use [`same_nutrient`](Self::same_nutrient)
/// for identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NutrientSelection {
    /// Stable identifier, e.g. `kcal`.
    pub name: String,
    /// Display name, e.g. `Calories`.
    pub label: String,
}

impl NutrientSelection {
    /// Create a selection from a name and a label.
    #[must_use]
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }

    /// Whether both selections refer to the same nutrient.
    #[must_use]
    pub fn same_nutrient(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for NutrientSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.name)
    }
}
