//! Built-in nutrient lists.

use crate::types::{CardNutrients, NutrientSelection};

/// Nutrients shown on a card until the user customizes it, in order.
pub const DEFAULT_CARD_NUTRIENTS: &[(&str, &str)] = &[
    ("kcal", "Calories"),
    ("protein", "Protein"),
    ("fat", "Fat"),
    ("carbohydrate", "Carbohydrate"),
    ("sugars", "Sugars"),
    ("fibre", "Fibre"),
];

/// Nutrients offered as replacements beyond the defaults.
const EXTRA_CATALOG_NUTRIENTS: &[(&str, &str)] = &[
    ("saturatedFat", "Saturated Fat"),
    ("sodium", "Sodium"),
    ("salt", "Salt"),
    ("cholesterol", "Cholesterol"),
    ("calcium", "Calcium"),
    ("iron", "Iron"),
    ("potassium", "Potassium"),
    ("vitaminC", "Vitamin C"),
    ("vitaminD", "Vitamin D"),
    ("water", "Water"),
];

/// The default card nutrient list.
#[must_use]
pub fn default_card_nutrients() -> CardNutrients {
    CardNutrients::dedup(
        DEFAULT_CARD_NUTRIENTS
            .iter()
            .map(|(name, label)| NutrientSelection::new(*name, *label))
            .collect(),
    )
}

/// Every nutrient a card can display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NutrientCatalog(Vec<NutrientSelection>);

impl NutrientCatalog {
    /// A catalog over the given nutrients. Repeated names keep the first entry.
    #[must_use]
    pub fn new(nutrients: Vec<NutrientSelection>) -> Self {
        Self(CardNutrients::dedup(nutrients).into())
    }

    /// Look up a nutrient by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&NutrientSelection> {
        self.0.iter().find(|n| n.name == name)
    }

    /// Catalog nutrients not already on `card`, in catalog order.
    #[must_use]
    pub fn candidates(&self, card: &CardNutrients) -> Vec<NutrientSelection> {
        self.0
            .iter()
            .filter(|n| !card.contains(&n.name))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NutrientSelection> {
        self.0.iter()
    }
}

impl Default for NutrientCatalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_CARD_NUTRIENTS
                .iter()
                .chain(EXTRA_CATALOG_NUTRIENTS)
                .map(|(name, label)| NutrientSelection::new(*name, *label))
                .collect(),
        )
    }
}
