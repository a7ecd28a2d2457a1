//! Read-only access to the user's bearer token.
//!
//! The token is written by whatever logs the user in; this crate only ever
//! reads it, and reads it again on every request so a refreshed token is
//! picked up without rebuilding the client.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use secrecy::SecretString;

/// Key under which the bearer token is stored.
pub const TOKEN_KEY: &str = "token";

/// Source of the bearer token attached to authenticated requests.
pub trait TokenStore: Send + Sync {
    /// Returns the current token, or `None` when no user is logged in.
    fn token(&self) -> Option<SecretString>;
}

/// Token store holding a fixed value.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    token: Option<SecretString>,
}

impl MemoryTokenStore {
    /// Creates a store that always returns `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(SecretString::from(token.into())),
        }
    }

    /// Creates a store with no token.
    #[must_use]
    pub const fn empty() -> Self {
        Self { token: None }
    }
}

impl fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTokenStore")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<SecretString> {
        self.token.clone()
    }
}

/// Token store backed by a file named [`TOKEN_KEY`] inside a directory.
///
/// Surrounding whitespace is trimmed. A missing, unreadable or empty file
/// means there is no token.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store reading `<dir>/token`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_KEY),
        }
    }

    /// Creates a store reading an explicit file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store in the default location, `<data dir>/faircompute/token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    pub fn default_location() -> io::Result<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "Failed to determine data directory",
                )
            })?
            .join("faircompute");

        Ok(Self::in_dir(dir))
    }

    /// Path of the token file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Option<SecretString> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    debug!("Token file {} is empty", self.path.display());
                    None
                } else {
                    Some(SecretString::from(token.to_string()))
                }
            }
            Err(e) => {
                debug!("No token read from {}: {e}", self.path.display());
                None
            }
        }
    }
}
