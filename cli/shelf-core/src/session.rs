//! The local, unverified user session.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::{CredentialVerifier, Credentials, MIN_PASSWORD_LEN, Registration};
use crate::{SerializeError, serialize_atomically, traceable_path};

pub const SESSION_FILE_NAME: &str = "session.json";

/// The currently "logged in" user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Reserved for a personal book list, always empty for now
    #[serde(default)]
    pub books: Vec<String>,
}

impl SessionRecord {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: None,
            email: None,
            books: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not read session file {}", .0.display())]
    Read(PathBuf, #[source] std::io::Error),
    #[error("could not parse session file {}", .0.display())]
    Parse(PathBuf, #[source] serde_json::Error),
    #[error("could not write session file")]
    Write(#[source] SerializeError),
    #[error("could not remove session file {}", .0.display())]
    Remove(PathBuf, #[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("please fill in all fields")]
    EmptyFields,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters long")]
    PasswordTooShort,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A place a [SessionRecord] can be kept.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<SessionRecord>, StorageError>;
    fn save(&self, record: &SessionRecord) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Durable storage: a JSON file that survives restarts.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at [SESSION_FILE_NAME] inside `data_dir`
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(SESSION_FILE_NAME))
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<SessionRecord>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Read(self.path.clone(), e)),
        };
        let record = serde_json::from_str(&contents)
            .map_err(|e| StorageError::Parse(self.path.clone(), e))?;
        Ok(Some(record))
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StorageError> {
        debug!(path = traceable_path(&self.path), "writing session");
        serialize_atomically(record, &self.path).map_err(StorageError::Write)
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Remove(self.path.clone(), e)),
        }
    }
}

/// Ephemeral storage: lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: Mutex<Option<SessionRecord>>,
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<SessionRecord>, StorageError> {
        Ok(self.record.lock().expect("session storage poisoned").clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StorageError> {
        *self.record.lock().expect("session storage poisoned") = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.record.lock().expect("session storage poisoned") = None;
        Ok(())
    }
}

/// Holds the current [SessionRecord] and mirrors it into storage.
///
/// Logging in or registering never contacts an authority,
/// the session only toggles what the UI offers.
pub struct SessionStore {
    current: Option<SessionRecord>,
    durable: Box<dyn SessionStorage>,
    ephemeral: Box<dyn SessionStorage>,
    verifier: Box<dyn CredentialVerifier>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store, restoring a session previously saved to `durable`.
    ///
    /// An unreadable session file is treated as no session.
    pub fn open(
        durable: impl SessionStorage + 'static,
        ephemeral: impl SessionStorage + 'static,
        verifier: impl CredentialVerifier + 'static,
    ) -> Self {
        let current = match durable.load() {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable session");
                None
            },
        };
        debug!(restored = current.is_some(), "opened session store");

        Self {
            current,
            durable: Box::new(durable),
            ephemeral: Box::new(ephemeral),
            verifier: Box::new(verifier),
        }
    }

    /// Start a session for `username`.
    ///
    /// With `remember` the session is written to durable storage,
    /// otherwise it only lasts as long as the process.
    pub fn login(
        &mut self,
        username: &str,
        password: &str,
        remember: bool,
    ) -> Result<&SessionRecord, SessionError> {
        let username = username.trim();
        self.verifier.verify(Credentials { username, password })?;

        let record = SessionRecord::new(username);
        if remember {
            self.durable.save(&record)?;
        } else {
            self.ephemeral.save(&record)?;
        }
        debug!(username, remember, "logged in");

        Ok(self.current.insert(record))
    }

    /// Validate a registration and start a remembered session for it.
    pub fn register(&mut self, registration: &Registration) -> Result<&SessionRecord, SessionError> {
        registration.validate()?;
        let username = registration.username.trim();
        self.verifier.verify(Credentials {
            username,
            password: &registration.password,
        })?;

        let record = SessionRecord {
            name: Some(registration.name.trim().to_string()),
            email: Some(registration.email.trim().to_string()),
            ..SessionRecord::new(username)
        };
        self.durable.save(&record)?;
        debug!(username, "registered");

        Ok(self.current.insert(record))
    }

    /// End the session and remove it from both storage tiers.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.current = None;
        let durable = self.durable.clear();
        let ephemeral = self.ephemeral.clear();
        durable.and(ephemeral)?;
        debug!("logged out");
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&SessionRecord> {
        self.current.as_ref()
    }
}
