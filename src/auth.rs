//! Local session storage. The backend issues the token; we only keep it.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::{ApiError, StoreError};
use crate::model::User;
use crate::settings::config_dir;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Self {
        Self::new(config_dir().join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current session, or `None` when absent, tokenless or unreadable.
    pub fn session(&self) -> Option<Session> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<Session>(&content) {
            Ok(s) if !s.access_token.trim().is_empty() => Some(s),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring malformed session file");
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.session().map(|s| s.access_token)
    }

    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(session).map_err(|e| StoreError::parse(&self.path, e))?;
        fs::write(&self.path, json).map_err(|e| StoreError::io(&self.path, e))
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    /// Gate for protected pages.
    pub fn require(&self) -> Result<Session> {
        match self.session() {
            Some(s) => Ok(s),
            None => bail!("No hay sesión activa. Ejecute `arepas login` para ingresar."),
        }
    }
}

/// Exchanges credentials for a token and stores it.
pub fn sign_in(api: &ApiClient, store: &SessionStore, email: &str, password: &str) -> Result<Session> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        bail!("Ingrese correo y contraseña");
    }
    debug!(%email, "signing in");
    let resp = api.login(email, password).map_err(|e| {
        let msg = match &e {
            ApiError::Unauthorized(_) | ApiError::Status { .. } => e.user_message("Error de autenticación"),
            _ => "Error de autenticación".to_string(),
        };
        warn!(error = %e, "login failed");
        anyhow::anyhow!(msg)
    })?;
    let session = Session {
        access_token: resp.access_token,
        user: resp.user,
    };
    store.save(&session)?;
    info!(user = %session.user.email, "session stored");
    Ok(session)
}

pub fn sign_out(store: &SessionStore) -> Result<(), StoreError> {
    store.clear()?;
    info!("session cleared");
    Ok(())
}
