//! Card nutrient editing: substitute, reset and undo.
//!
//! A [`CardEditor`] belongs to one editing session. It drives the
//! [`PreferenceStore`] and keeps the [`UndoHistory`] of what each commit
//! replaced.
//!
//! ```text
//! Idle --select_target--> SelectingReplacement --confirm--> Committing --> Idle
//!                          |        ^
//!                          +cancel--+ (select_target again re-targets)
//! ```
//!
//! `reset` and `undo` are only accepted from `Idle`.

use crate::defaults::{NutrientCatalog, default_card_nutrients};
use crate::history::UndoHistory;
use crate::store::{PreferenceSink, PreferenceStore};
use crate::types::{CardNutrients, NutrientSelection, PreferenceError, Preferences};

/// Rejected editing actions. None of them change state or history.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Preferences have not been loaded yet.
    #[error("preferences are still loading")]
    NotLoaded,
    /// The nutrient is not on the card.
    #[error("nutrient '{0}' is not on the card")]
    UnknownNutrient(String),
    /// A replacement was confirmed without choosing what to replace.
    #[error("no nutrient selected for replacement")]
    NoTargetSelected,
    /// The replacement is already shown elsewhere on the card.
    #[error("nutrient '{0}' is already on the card")]
    DuplicateNutrient(String),
    /// The card already shows the default nutrients.
    #[error("card already shows the default nutrients")]
    AlreadyDefault,
    /// There is nothing to undo.
    #[error("nothing to undo")]
    HistoryEmpty,
    /// A replacement is being chosen; finish or cancel it first.
    #[error("a nutrient replacement is in progress")]
    Busy,
}

impl From<PreferenceError> for EditError {
    fn from(err: PreferenceError) -> Self {
        match err {
            PreferenceError::DuplicateNutrient(name) => Self::DuplicateNutrient(name),
            PreferenceError::UnknownNutrient(name) => Self::UnknownNutrient(name),
        }
    }
}

/// Where the editor is in the substitution flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    /// The selection surface is open for `target`.
    SelectingReplacement { target: String },
    /// The substitution of `target` is being written.
    Committing { target: String },
}

/// Editing controller for one session's card nutrients.
#[derive(Debug, Clone, Default)]
pub struct CardEditor {
    state: EditState,
    history: UndoHistory,
}

impl CardEditor {
    /// An idle editor with an empty history of the given depth.
    #[must_use]
    pub fn new(undo_depth: usize) -> Self {
        Self {
            state: EditState::Idle,
            history: UndoHistory::new(undo_depth),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &EditState {
        &self.state
    }

    #[must_use]
    pub const fn history(&self) -> &UndoHistory {
        &self.history
    }

    /// The nutrient currently chosen for replacement.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match &self.state {
            EditState::Idle => None,
            EditState::SelectingReplacement { target } | EditState::Committing { target } => {
                Some(target)
            }
        }
    }

    /// Whether the undo affordance should be offered.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.state == EditState::Idle && self.history.can_undo()
    }

    /// Whether the reset affordance should be offered: loaded, idle and not
    /// already showing the defaults.
    #[must_use]
    pub fn can_reset<S: PreferenceSink>(&self, store: &PreferenceStore<S>) -> bool {
        self.state == EditState::Idle && store.get().is_some_and(|p| !p.has_default_cards())
    }

    /// Open the selection surface for the displayed nutrient `name`.
    ///
    /// Choosing another nutrient while the surface is open re-targets it.
    ///
    /// # Errors
    ///
    /// [`EditError::NotLoaded`] or [`EditError::UnknownNutrient`].
    pub fn select_target<S: PreferenceSink>(
        &mut self,
        store: &PreferenceStore<S>,
        name: &str,
    ) -> Result<(), EditError> {
        let cards = current_cards(store)?;
        if !cards.contains(name) {
            return Err(EditError::UnknownNutrient(name.to_owned()));
        }
        self.state = EditState::SelectingReplacement {
            target: name.to_owned(),
        };
        Ok(())
    }

    /// Replacement choices for the open selection: catalog nutrients not
    /// already on the card.
    ///
    /// # Errors
    ///
    /// [`EditError::NotLoaded`] or [`EditError::NoTargetSelected`].
    pub fn candidates<S: PreferenceSink>(
        &self,
        store: &PreferenceStore<S>,
        catalog: &NutrientCatalog,
    ) -> Result<Vec<NutrientSelection>, EditError> {
        let cards = current_cards(store)?;
        if !matches!(self.state, EditState::SelectingReplacement { .. }) {
            return Err(EditError::NoTargetSelected);
        }
        Ok(catalog.candidates(cards))
    }

    /// Close the selection surface without changing anything.
    pub fn cancel(&mut self) {
        self.state = EditState::Idle;
    }

    /// Substitute the selected nutrient with `replacement`, keeping its
    /// position, and record the previous list for undo.
    ///
    /// Returns the version of the dispatched save.
    ///
    /// # Errors
    ///
    /// [`EditError::NoTargetSelected`] when no selection is open,
    /// [`EditError::DuplicateNutrient`] when `replacement` is already shown
    /// elsewhere. The selection stays open on error.
    pub fn confirm_replacement<S: PreferenceSink>(
        &mut self,
        store: &mut PreferenceStore<S>,
        replacement: NutrientSelection,
    ) -> Result<u64, EditError> {
        let EditState::SelectingReplacement { target } = std::mem::take(&mut self.state) else {
            return Err(EditError::NoTargetSelected);
        };
        self.state = EditState::Committing {
            target: target.clone(),
        };

        let result = build_replacement(store, &target, replacement);
        let (previous, next) = match result {
            Ok(pair) => pair,
            Err(err) => {
                self.state = EditState::SelectingReplacement { target };
                return Err(err);
            }
        };

        let version = store.set(next);
        self.history.push(previous);
        self.state = EditState::Idle;
        Ok(version)
    }

    /// Write the default nutrients and record the previous list for undo.
    ///
    /// # Errors
    ///
    /// [`EditError::Busy`], [`EditError::NotLoaded`] or
    /// [`EditError::AlreadyDefault`].
    pub fn reset<S: PreferenceSink>(
        &mut self,
        store: &mut PreferenceStore<S>,
    ) -> Result<u64, EditError> {
        self.ensure_idle()?;
        let current = store.get().ok_or(EditError::NotLoaded)?;
        if current.has_default_cards() {
            return Err(EditError::AlreadyDefault);
        }

        let previous = current.card_nutrients.clone();
        let next = current.with_card_nutrients(default_card_nutrients());
        let version = store.set(next);
        self.history.push(previous);
        Ok(version)
    }

    /// Restore the most recent snapshot. Undo is not itself recorded.
    ///
    /// # Errors
    ///
    /// [`EditError::Busy`], [`EditError::NotLoaded`] or
    /// [`EditError::HistoryEmpty`].
    pub fn undo<S: PreferenceSink>(
        &mut self,
        store: &mut PreferenceStore<S>,
    ) -> Result<u64, EditError> {
        self.ensure_idle()?;
        let current = store.get().ok_or(EditError::NotLoaded)?;
        let next = self
            .history
            .pop()
            .map(|snapshot| current.with_card_nutrients(snapshot))
            .ok_or(EditError::HistoryEmpty)?;
        Ok(store.set(next))
    }

    /// Drop all recorded snapshots and close any open selection.
    pub fn clear(&mut self) {
        self.history.clear();
        self.state = EditState::Idle;
    }

    fn ensure_idle(&self) -> Result<(), EditError> {
        if self.state == EditState::Idle {
            Ok(())
        } else {
            Err(EditError::Busy)
        }
    }
}

fn current_cards<S: PreferenceSink>(
    store: &PreferenceStore<S>,
) -> Result<&CardNutrients, EditError> {
    store
        .get()
        .map(|p| &p.card_nutrients)
        .ok_or(EditError::NotLoaded)
}

fn build_replacement<S: PreferenceSink>(
    store: &PreferenceStore<S>,
    target: &str,
    replacement: NutrientSelection,
) -> Result<(CardNutrients, Preferences), EditError> {
    let current = store.get().ok_or(EditError::NotLoaded)?;
    let cards = current.card_nutrients.replace(target, replacement)?;
    Ok((
        current.card_nutrients.clone(),
        current.with_card_nutrients(cards),
    ))
}
