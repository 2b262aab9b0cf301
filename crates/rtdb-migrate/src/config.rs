//! Configuration types for rtdb-migrate.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::http::validate_url;

/// File name of the snapshot when none is configured.
pub const DEFAULT_SNAPSHOT_FILE: &str = "db.json";

/// Main migration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Snapshot path. Relative paths resolve against the config file's directory.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    /// Firebase Authentication settings.
    pub identity: IdentityConfig,
    /// Realtime Database settings.
    pub store: StoreConfig,
    /// Migration options.
    #[serde(default)]
    pub options: MigrationOptions,
}

/// Firebase Authentication (identity toolkit) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Identity toolkit base URL.
    #[serde(default = "default_identity_url")]
    pub url: String,
    /// Firebase project id owning the accounts.
    pub project_id: String,
    /// OAuth2 access token with Firebase Auth admin scope.
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Realtime Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database URL, e.g. `https://<project>-default-rtdb.firebaseio.com`.
    pub database_url: String,
    /// OAuth2 access token sent as the `access_token` query parameter.
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Migration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Dry run mode (no remote calls).
    #[serde(default)]
    pub dry_run: bool,
    /// Role written for users whose record has none.
    #[serde(default = "default_role")]
    pub default_role: String,
    /// Show progress bars.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            default_role: default_role(),
            show_progress: true,
        }
    }
}

fn default_identity_url() -> String {
    "https://identitytoolkit.googleapis.com".to_string()
}

fn default_role() -> String {
    "user".to_string()
}

fn default_true() -> bool {
    true
}

/// `db.json` next to the running executable, or in the working directory
/// when the executable path is unknown.
#[must_use]
pub fn default_snapshot_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_SNAPSHOT_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_FILE))
}

impl MigrationConfig {
    /// Load configuration from a YAML file.
    ///
    /// A relative `snapshot` path is rewritten to be relative to the file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&content)?;

        if let (Some(snapshot), Some(dir)) = (&config.snapshot, path.parent()) {
            if snapshot.is_relative() {
                config.snapshot = Some(dir.join(snapshot));
            }
        }

        Ok(config)
    }

    /// Fills unset access tokens with a shared token, typically from the
    /// environment.
    pub fn apply_access_token(&mut self, token: Option<&str>) {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return;
        };
        if self.identity.access_token.is_none() {
            self.identity.access_token = Some(token.to_string());
        }
        if self.store.access_token.is_none() {
            self.store.access_token = Some(token.to_string());
        }
    }

    /// The snapshot path to load.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.snapshot.clone().unwrap_or_else(default_snapshot_path)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.identity.project_id.trim().is_empty() {
            return Err(crate::error::Error::Config(
                "identity.project_id cannot be empty".to_string(),
            ));
        }
        if self.options.default_role.is_empty() {
            return Err(crate::error::Error::Config(
                "options.default_role cannot be empty".to_string(),
            ));
        }
        validate_url(&self.identity.url)?;
        validate_url(&self.store.database_url)?;
        Ok(())
    }
}
