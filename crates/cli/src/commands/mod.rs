//! Command implementations and the context they share.

pub mod maintenance;
pub mod prefs;
pub mod users;

use nutribase_client::{
    AdminError, AdminPanel, ApiClient, ApiError, ClientConfig, ConfigError, Session, SessionError,
    UserQuery,
};
use nutribase_core::{Email, EmailError, User};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// Neither `--as` nor `NUTRIBASE_USER_EMAIL` was given.
    #[error("No acting user: pass --as <email> or set NUTRIBASE_USER_EMAIL")]
    NoActingUser,

    #[error("Invalid email {0}: {1}")]
    InvalidEmail(String, EmailError),

    #[error("Unknown user: {0}")]
    UnknownUser(Email),

    /// The backend did not store the last preference change.
    #[error("Preference save failed: {0}")]
    SaveFailed(String),

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and client shared by every command.
pub struct Context {
    pub config: ClientConfig,
    pub api: ApiClient,
    acting_as: Option<String>,
}

impl Context {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns error if configuration is missing or the client fails to build.
    pub fn load(acting_as: Option<String>) -> Result<Self, CommandError> {
        let config = ClientConfig::from_env()?;
        let api = ApiClient::new(&config.api)?;
        Ok(Self {
            config,
            api,
            acting_as,
        })
    }

    /// The acting user's email, `--as` first.
    pub fn actor_email(&self) -> Result<Email, CommandError> {
        match &self.acting_as {
            Some(raw) => parse_email(raw),
            None => self
                .config
                .user_email
                .clone()
                .ok_or(CommandError::NoActingUser),
        }
    }

    /// Fetch the acting user's directory record.
    pub async fn actor(&self) -> Result<User, CommandError> {
        let email = self.actor_email()?;
        match self.api.get_user(&email).await {
            Ok(user) => Ok(user),
            Err(ApiError::NotFound(_)) => Err(CommandError::UnknownUser(email)),
            Err(e) => Err(e.into()),
        }
    }

    /// Admin panel for the acting user, listing `query`.
    pub async fn admin_panel(&self, query: UserQuery) -> Result<AdminPanel, CommandError> {
        let actor = self.actor().await?;
        Ok(AdminPanel::open(
            self.api.clone(),
            actor,
            query,
            self.config.enable_update_db,
        )
        .await?)
    }

    /// Editing session for the acting user.
    pub async fn session(&self) -> Result<Session, CommandError> {
        let email = self.actor_email()?;
        Ok(Session::open(self.api.clone(), email, self.config.session_options()).await?)
    }
}

pub fn parse_email(raw: &str) -> Result<Email, CommandError> {
    Email::parse(raw).map_err(|e| CommandError::InvalidEmail(raw.to_owned(), e))
}
