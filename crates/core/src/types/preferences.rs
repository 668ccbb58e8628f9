//! Per-user card preferences.

use serde::{Deserialize, Serialize};

use super::nutrient::NutrientSelection;
use crate::defaults::default_card_nutrients;

/// Errors raised when building or editing a card nutrient list.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PreferenceError {
    /// The same nutrient name appears twice.
    #[error("nutrient '{0}' is already on the card")]
    DuplicateNutrient(String),
    /// The named nutrient is not on the card.
    #[error("nutrient '{0}' is not on the card")]
    UnknownNutrient(String),
}

/// The ordered nutrient list displayed on food cards.
///
/// Order is display order. Names are unique within the list; the
/// constructors enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<NutrientSelection>", into = "Vec<NutrientSelection>")]
pub struct CardNutrients(Vec<NutrientSelection>);

impl CardNutrients {
    /// Build a list, rejecting repeated names.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError::DuplicateNutrient`] naming the first repeat.
    pub fn new(selections: Vec<NutrientSelection>) -> Result<Self, PreferenceError> {
        for (i, selection) in selections.iter().enumerate() {
            if selections
                .iter()
                .take(i)
                .any(|earlier| earlier.same_nutrient(selection))
            {
                return Err(PreferenceError::DuplicateNutrient(selection.name.clone()));
            }
        }
        Ok(Self(selections))
    }

    /// Build a list keeping only the first occurrence of each name.
    #[must_use]
    pub fn dedup(selections: Vec<NutrientSelection>) -> Self {
        let mut kept: Vec<NutrientSelection> = Vec::with_capacity(selections.len());
        for selection in selections {
            if !kept.iter().any(|k| k.same_nutrient(&selection)) {
                kept.push(selection);
            }
        }
        Self(kept)
    }

    /// The selections in display order.
    #[must_use]
    pub fn as_slice(&self) -> &[NutrientSelection] {
        &self.0
    }

    /// Iterate selections in display order.
    pub fn iter(&self) -> std::slice::Iter<'_, NutrientSelection> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index of the nutrient with this name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|s| s.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Return a copy with the entry named `target` swapped for `replacement`
    /// at the same position.
    ///
    /// Replacing a nutrient with itself (for instance to refresh its label)
    /// is allowed.
    ///
    /// # Errors
    ///
    /// - [`PreferenceError::UnknownNutrient`] if `target` is not on the card
    /// - [`PreferenceError::DuplicateNutrient`] if `replacement` is already
    ///   shown at another position
    pub fn replace(
        &self,
        target: &str,
        replacement: NutrientSelection,
    ) -> Result<Self, PreferenceError> {
        let index = self
            .position(target)
            .ok_or_else(|| PreferenceError::UnknownNutrient(target.to_owned()))?;
        if let Some(existing) = self.position(&replacement.name)
            && existing != index
        {
            return Err(PreferenceError::DuplicateNutrient(replacement.name));
        }

        let mut next = self.0.clone();
        if let Some(slot) = next.get_mut(index) {
            *slot = replacement;
        }
        Ok(Self(next))
    }
}

impl Default for CardNutrients {
    fn default() -> Self {
        default_card_nutrients()
    }
}

impl TryFrom<Vec<NutrientSelection>> for CardNutrients {
    type Error = PreferenceError;

    fn try_from(value: Vec<NutrientSelection>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CardNutrients> for Vec<NutrientSelection> {
    fn from(cards: CardNutrients) -> Self {
        cards.0
    }
}

impl<'a> IntoIterator for &'a CardNutrients {
    type Item = &'a NutrientSelection;
    type IntoIter = std::slice::Iter<'a, NutrientSelection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A user's stored preferences.
///
/// Only the card nutrients are interpreted here. Any other fields the
/// backend keeps on the preference document are carried in `extra` and
/// written back untouched on save.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Nutrients shown on food cards, in display order.
    #[serde(rename = "cardNutrients", default)]
    pub card_nutrients: CardNutrients,
    /// Fields owned by other parts of the application.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Preferences {
    /// Preferences holding only the given card nutrients.
    #[must_use]
    pub fn new(card_nutrients: CardNutrients) -> Self {
        Self {
            card_nutrients,
            extra: serde_json::Map::new(),
        }
    }

    /// Copy of these preferences with the card nutrients replaced.
    #[must_use]
    pub fn with_card_nutrients(&self, card_nutrients: CardNutrients) -> Self {
        Self {
            card_nutrients,
            extra: self.extra.clone(),
        }
    }

    /// Whether the card shows exactly the default nutrients, labels included.
    #[must_use]
    pub fn has_default_cards(&self) -> bool {
        self.card_nutrients == default_card_nutrients()
    }
}
