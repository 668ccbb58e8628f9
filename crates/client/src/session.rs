//! Card-preference editing sessions.
//!
//! A [`Session`] is the explicit application state of one signed-in user:
//! their directory record, their preferences and the card editor with its
//! undo history. It is created by [`Session::open`] and torn down by
//! [`Session::close`]; nothing in it outlives the session.

use nutribase_core::policy::{self, AccessStatus};
use nutribase_core::{
    CardEditor, DEFAULT_UNDO_DEPTH, EditError, Email, NutrientCatalog, NutrientSelection,
    PreferenceStore, Preferences, User,
};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::persistence::{SaveConfig, SaveQueue, SyncStatus};

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The directory has no user with this email.
    #[error("User not found: {0}")]
    UserNotFound(Email),

    /// The user exists but an admin has not approved them yet.
    #[error("Waiting for an Admin Approval: {0}")]
    NotApproved(Email),

    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The editing action was rejected.
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Knobs for a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Undo snapshots kept.
    pub undo_depth: usize,
    /// Save retry policy.
    pub save: SaveConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            undo_depth: DEFAULT_UNDO_DEPTH,
            save: SaveConfig::default(),
        }
    }
}

/// One user's editing session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    api: ApiClient,
    user: User,
    store: PreferenceStore<SaveQueue>,
    editor: CardEditor,
    catalog: NutrientCatalog,
}

impl Session {
    /// Load the user and their preferences and start the save queue.
    ///
    /// Users who never saved preferences start from the defaults; those are
    /// not written back until the first edit.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UserNotFound` for unknown emails,
    /// `SessionError::NotApproved` for accounts awaiting approval and
    /// `SessionError::Api` if either fetch fails.
    #[instrument(skip(api, options), fields(email = %email))]
    pub async fn open(
        api: ApiClient,
        email: Email,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let user = match api.get_user(&email).await {
            Ok(user) => user,
            Err(ApiError::NotFound(_)) => {
                warn!("User not found");
                return Err(SessionError::UserNotFound(email));
            }
            Err(e) => return Err(e.into()),
        };
        if !policy::may_act(&user) {
            warn!("User is awaiting approval");
            return Err(SessionError::NotApproved(user.email));
        }
        let preferences = api.get_preferences(&user.email).await?.unwrap_or_default();

        let queue = SaveQueue::spawn(api.clone(), options.save);
        let mut store = PreferenceStore::new(user.email.clone(), queue);
        store.load(preferences);

        let id = Uuid::new_v4();
        info!(session = %id, role = %user.role, approved = user.approved, "Session opened");

        Ok(Self {
            id,
            api,
            user,
            store,
            editor: CardEditor::new(options.undo_depth),
            catalog: NutrientCatalog::default(),
        })
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    /// What the navigation bar shows for this session.
    #[must_use]
    pub fn access_status(&self) -> AccessStatus {
        policy::access_status(Some(&self.user), false)
    }

    #[must_use]
    pub const fn preferences(&self) -> Option<&Preferences> {
        self.store.get()
    }

    #[must_use]
    pub const fn editor(&self) -> &CardEditor {
        &self.editor
    }

    #[must_use]
    pub const fn catalog(&self) -> &NutrientCatalog {
        &self.catalog
    }

    /// Use a different nutrient catalog for replacement candidates.
    #[must_use]
    pub fn with_catalog(mut self, catalog: NutrientCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Choose a displayed nutrient to replace and list the alternatives.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Edit` if the nutrient is not on the card.
    pub fn select(&mut self, name: &str) -> Result<Vec<NutrientSelection>, SessionError> {
        self.editor.select_target(&self.store, name)?;
        Ok(self.editor.candidates(&self.store, &self.catalog)?)
    }

    /// Alternatives for the nutrient currently selected.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Edit` when nothing is selected.
    pub fn candidates(&self) -> Result<Vec<NutrientSelection>, SessionError> {
        Ok(self.editor.candidates(&self.store, &self.catalog)?)
    }

    /// Replace the selected nutrient.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Edit` if nothing is selected or the
    /// replacement is already on the card.
    pub fn replace(&mut self, replacement: NutrientSelection) -> Result<u64, SessionError> {
        let version = self.editor.confirm_replacement(&mut self.store, replacement)?;
        info!(session = %self.id, version, "Card nutrient replaced");
        Ok(version)
    }

    /// Replace the selected nutrient with a catalog entry looked up by name.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Edit` if the catalog does not know `name` or
    /// the replacement is rejected.
    pub fn replace_with(&mut self, name: &str) -> Result<u64, SessionError> {
        let replacement = self
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| EditError::UnknownNutrient(name.to_owned()))?;
        self.replace(replacement)
    }

    /// Close the selection without changes.
    pub fn cancel(&mut self) {
        self.editor.cancel();
    }

    /// Restore the default card nutrients.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Edit` if the card already shows the defaults.
    pub fn reset(&mut self) -> Result<u64, SessionError> {
        let version = self.editor.reset(&mut self.store)?;
        info!(session = %self.id, version, "Card nutrients reset");
        Ok(version)
    }

    /// Undo the most recent replacement or reset.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Edit` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<u64, SessionError> {
        let version = self.editor.undo(&mut self.store)?;
        info!(session = %self.id, version, "Card edit undone");
        Ok(version)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    #[must_use]
    pub fn can_reset(&self) -> bool {
        self.editor.can_reset(&self.store)
    }

    /// Outcome of the newest save.
    #[must_use]
    pub fn sync_status(&self) -> SyncStatus {
        self.store.sink().status()
    }

    /// Wait for the newest save to succeed or give up.
    pub async fn wait_for_sync(&self) -> SyncStatus {
        self.store.sink().settled().await
    }

    /// Replace local preferences with what the backend has stored.
    ///
    /// Used after a failed save. The undo history is dropped since it no
    /// longer describes the stored state, and a failed status is cleared
    /// because local and stored preferences agree again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Api` if the fetch fails.
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn reconcile(&mut self) -> Result<(), SessionError> {
        let stored = self
            .api
            .get_preferences(&self.user.email)
            .await?
            .unwrap_or_default();
        self.store.load(stored);
        self.editor.clear();
        self.store.sink().mark_reconciled(self.store.version());
        info!("Preferences reconciled with backend");
        Ok(())
    }

    /// End the session after outstanding saves finish.
    pub async fn close(self) -> SyncStatus {
        let id = self.id;
        let status = self.store.into_sink().shutdown().await;
        info!(session = %id, status = ?status, "Session closed");
        status
    }
}
