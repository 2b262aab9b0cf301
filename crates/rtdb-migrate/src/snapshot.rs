//! Snapshot loading and record shapes.
//!
//! A snapshot is one JSON document holding four optional arrays: `users`,
//! `posts`, `requests` and `chat`. It is loaded whole; a missing or malformed
//! file is fatal for the run.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{Error, Result};

/// The complete input document migrated in one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// User records, migrated into auth accounts plus `users/<uid>`.
    #[serde(default, deserialize_with = "nullable_seq")]
    pub users: Vec<Value>,
    /// Posts, copied to `posts/<id>`.
    #[serde(default, deserialize_with = "nullable_seq")]
    pub posts: Vec<Value>,
    /// Requests, copied to `requests/<id>`.
    #[serde(default, deserialize_with = "nullable_seq")]
    pub requests: Vec<Value>,
    /// Chat messages, copied to `chat/<id>`.
    #[serde(default, deserialize_with = "nullable_seq")]
    pub chat: Vec<Value>,
}

/// `null` and absent both mean "no records".
fn nullable_seq<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Snapshot {
    /// Loads a snapshot from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotLoad`] if the file cannot be opened or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let load_err = |reason: String| Error::SnapshotLoad {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
        let root: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| load_err(format!("invalid JSON: {}", e)))?;
        let snapshot = Self::from_value(root).map_err(|e| load_err(e.to_string()))?;

        let summary = snapshot.summary();
        info!("Loaded snapshot {}", path.display());
        info!("- {} users", summary.users);
        info!("- {} posts", summary.posts);
        info!("- {} requests", summary.requests);
        info!("- {} chat messages", summary.chat);

        Ok(snapshot)
    }

    /// Parses a snapshot from an in-memory JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not JSON, the root is `null`, or a
    /// collection is not an array.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        Self::from_value(root)
    }

    fn from_value(root: Value) -> Result<Self> {
        match root {
            Value::Null => Err(Error::Config("snapshot root is null".to_string())),
            Value::Object(_) => Ok(serde_json::from_value(root)?),
            _ => {
                warn!("Snapshot root is not an object, no collections to migrate");
                Ok(Self::default())
            }
        }
    }

    /// Record counts per collection.
    #[must_use]
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            users: self.users.len(),
            posts: self.posts.len(),
            requests: self.requests.len(),
            chat: self.chat.len(),
        }
    }
}

/// Record counts per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    /// Number of user records.
    pub users: usize,
    /// Number of posts.
    pub posts: usize,
    /// Number of requests.
    pub requests: usize,
    /// Number of chat messages.
    pub chat: usize,
}

impl fmt::Display for SnapshotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   Users:         {}", self.users)?;
        writeln!(f, "   Posts:         {}", self.posts)?;
        writeln!(f, "   Requests:      {}", self.requests)?;
        write!(f, "   Chat messages: {}", self.chat)
    }
}

/// The fields of an input user record the migration reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Login email, always non-empty.
    pub email: String,
    /// Display name, empty when absent.
    pub name: String,
    /// Role, `None` when absent so the caller can apply its default.
    pub role: Option<String>,
}

impl UserRecord {
    /// Reads a user record, returning `None` when it has no usable email.
    ///
    /// Non-string and empty values count as absent.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Some(Self {
            email: field("email")?,
            name: field("name").unwrap_or_default(),
            role: field("role"),
        })
    }
}

/// The record written to `users/<uid>` for a migrated user.
///
/// Deliberately has no password field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigratedUser {
    /// Uid assigned by the identity provider.
    pub uid: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role.
    pub role: String,
    /// Migration time in milliseconds since the Unix epoch.
    pub created_at: i64,
    /// Provenance flag, always true.
    pub migrated: bool,
}

impl MigratedUser {
    /// Builds the output record for a freshly created identity.
    #[must_use]
    pub fn new(uid: String, user: UserRecord, default_role: &str) -> Self {
        Self {
            uid,
            email: user.email,
            name: user.name,
            role: user.role.unwrap_or_else(|| default_role.to_string()),
            created_at: chrono::Utc::now().timestamp_millis(),
            migrated: true,
        }
    }
}

/// Extracts the storage key of a post, request or chat record.
///
/// Strings are used as-is and numbers as their decimal form. Anything else,
/// including a missing or empty `id`, is an [`Error::MissingKey`].
pub fn record_key(record: &Value, collection: &str) -> Result<String> {
    let missing = || Error::MissingKey {
        collection: collection.to_string(),
    };

    match record.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(missing()),
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
