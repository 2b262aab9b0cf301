//! Keyed-store collaborator.
//!
//! Records are written to `<collection>/<key>`. The [`RealtimeDatabaseClient`]
//! does this with a `PUT` against the Firebase Realtime Database REST API, so
//! writing the same key twice leaves the last value.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::http::{create_http_client, handle_http_error, validate_url, Service};

/// Longest key the Realtime Database accepts, in bytes.
pub const MAX_KEY_BYTES: usize = 768;

/// Trait for keyed stores.
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Store name used in logs.
    fn store_name(&self) -> &'static str;

    /// Writes `value` at `<collection>/<key>`, replacing whatever was there.
    async fn write(&self, collection: &str, key: &str, value: &Value) -> Result<()>;
}

/// Checks that `key` is a legal Realtime Database key.
pub fn validate_key(key: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("key is empty"));
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(invalid("key is longer than 768 bytes"));
    }
    if let Some(c) = key
        .chars()
        .find(|c| matches!(c, '.' | '$' | '#' | '[' | ']' | '/') || c.is_ascii_control())
    {
        return Err(invalid(&format!("contains forbidden character {:?}", c)));
    }
    Ok(())
}

/// Firebase Realtime Database REST client.
pub struct RealtimeDatabaseClient {
    config: StoreConfig,
    client: Client,
}

impl RealtimeDatabaseClient {
    /// Creates a new client with the shared HTTP client settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database URL is invalid.
    pub fn new(config: StoreConfig) -> Result<Self> {
        validate_url(&config.database_url)?;
        Ok(Self {
            config,
            client: create_http_client(),
        })
    }

    /// Builds `{database_url}/{collection}/{key}.json`, percent-encoding the
    /// segments and appending the access token when configured.
    fn build_url(&self, collection: &str, key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.database_url)
            .map_err(|e| Error::Config(format!("Invalid database URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|()| Error::Config("Database URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(collection)
            .push(&format!("{}.json", key));

        if let Some(token) = &self.config.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }

        Ok(url)
    }
}

#[async_trait]
impl KeyedStore for RealtimeDatabaseClient {
    fn store_name(&self) -> &'static str {
        "realtime_database"
    }

    async fn write(&self, collection: &str, key: &str, value: &Value) -> Result<()> {
        validate_key(key)?;
        let url = self.build_url(collection, key)?;

        debug!("PUT {}/{}", collection, key);

        let response = self
            .client
            .put(url)
            .json(value)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(handle_http_error(status.as_u16(), &body, Service::Store));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
