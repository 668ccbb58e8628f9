//! In-memory holder for the signed-in user's preferences.
//!
//! The store never talks to the network itself. Every [`PreferenceStore::set`]
//! hands a [`SaveRequest`] to a [`PreferenceSink`], which is expected to
//! persist it in the background and return immediately.

use crate::types::{Email, Preferences};

/// A versioned request to persist a user's preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    /// Whose preferences these are.
    pub email: Email,
    /// Strictly increasing per store; later sets carry larger versions.
    pub version: u64,
    /// The full preference document to store.
    pub preferences: Preferences,
}

/// Destination for preference saves.
///
/// `dispatch` must not block: the editing flow treats persistence as
/// fire-and-forget and learns about failures some other way.
pub trait PreferenceSink {
    fn dispatch(&self, request: SaveRequest);
}

impl<T: PreferenceSink + ?Sized> PreferenceSink for &T {
    fn dispatch(&self, request: SaveRequest) {
        (**self).dispatch(request);
    }
}

impl<T: PreferenceSink + ?Sized> PreferenceSink for std::sync::Arc<T> {
    fn dispatch(&self, request: SaveRequest) {
        (**self).dispatch(request);
    }
}

/// Current preferences of one user for one session.
#[derive(Debug)]
pub struct PreferenceStore<S> {
    owner: Email,
    current: Option<Preferences>,
    version: u64,
    sink: S,
}

impl<S: PreferenceSink> PreferenceStore<S> {
    /// An empty store for `owner`; [`get`](Self::get) is `None` until loaded.
    pub const fn new(owner: Email, sink: S) -> Self {
        Self {
            owner,
            current: None,
            version: 0,
            sink,
        }
    }

    #[must_use]
    pub const fn owner(&self) -> &Email {
        &self.owner
    }

    /// Current preferences, or `None` while still loading.
    #[must_use]
    pub const fn get(&self) -> Option<&Preferences> {
        self.current.as_ref()
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Install preferences fetched from the backend. Nothing is persisted.
    pub fn load(&mut self, preferences: Preferences) {
        self.current = Some(preferences);
    }

    /// Replace the preferences wholesale and dispatch a save.
    ///
    /// Returns the version stamped on the save request.
    pub fn set(&mut self, preferences: Preferences) -> u64 {
        self.version += 1;
        self.current = Some(preferences.clone());
        self.sink.dispatch(SaveRequest {
            email: self.owner.clone(),
            version: self.version,
            preferences,
        });
        self.version
    }

    /// Version of the most recent [`set`](Self::set), 0 if none yet.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Tear the store down, handing back its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;
    use crate::types::{CardNutrients, NutrientSelection};

    fn owner() -> Email {
        Email::parse("cook@example.com").unwrap()
    }

    #[test]
    fn test_get_is_none_until_loaded() {
        let sink = RecordingSink::default();
        let mut store = PreferenceStore::new(owner(), &sink);
        assert!(store.get().is_none());

        store.load(Preferences::default());
        assert!(store.is_loaded());
        assert!(sink.0.borrow().is_empty());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_set_dispatches_increasing_versions() {
        let sink = RecordingSink::default();
        let mut store = PreferenceStore::new(owner(), &sink);
        let first = Preferences::new(
            CardNutrients::new(vec![NutrientSelection::new("kcal", "Calories")]).unwrap(),
        );
        let second = Preferences::default();

        assert_eq!(store.set(first.clone()), 1);
        assert_eq!(store.set(second.clone()), 2);
        assert_eq!(store.get(), Some(&second));

        let sent = sink.0.borrow();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].version, 1);
        assert_eq!(sent[0].preferences, first);
        assert_eq!(sent[1].email, owner());
    }
}
