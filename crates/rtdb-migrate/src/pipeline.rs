//! Migration pipeline orchestration.
//!
//! Collections run strictly in the order users, posts, requests, chat, and
//! records inside a collection run one at a time. A failing record is logged,
//! recorded in the report and skipped; nothing is retried or rolled back.

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{MigrationConfig, MigrationOptions};
use crate::error::{Error, Result};
use crate::identity::{FirebaseAuthClient, Identity, IdentityProvider, NewAccount};
use crate::snapshot::{record_key, MigratedUser, Snapshot, UserRecord};
use crate::store::{validate_key, KeyedStore, RealtimeDatabaseClient};

/// The four collections of a snapshot, in migration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// Users, migrated to auth accounts plus `users/<uid>`.
    Users,
    /// Posts.
    Posts,
    /// Requests.
    Requests,
    /// Chat messages.
    Chat,
}

impl Collection {
    /// All collections in migration order.
    pub const ALL: [Self; 4] = [Self::Users, Self::Posts, Self::Requests, Self::Chat];

    /// Remote collection path.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Posts => "posts",
            Self::Requests => "requests",
            Self::Chat => "chat",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Users => "Users",
            Self::Posts => "Posts",
            Self::Requests => "Requests",
            Self::Chat => "Chat messages",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record that could not be migrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Email for users, id (or `#<index>` when there is none) otherwise.
    pub record: String,
    /// Error message.
    pub error: String,
    /// Uid of an auth account created before a later step failed.
    pub orphaned_uid: Option<String>,
}

/// Outcome of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    /// Which collection.
    pub collection: Collection,
    /// Records in the snapshot.
    pub total: usize,
    /// Records written (or, in a dry run, that would be written).
    pub migrated: usize,
    /// Users skipped for lack of an email.
    pub skipped: usize,
    /// Per-record failures, in snapshot order.
    pub failures: Vec<RecordFailure>,
}

impl CollectionReport {
    fn new(collection: Collection, total: usize) -> Self {
        Self {
            collection,
            total,
            migrated: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, record: String, error: &Error, orphaned_uid: Option<String>) {
        self.failures.push(RecordFailure {
            record,
            error: error.to_string(),
            orphaned_uid,
        });
    }

    /// Number of failed records.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// User results.
    pub users: CollectionReport,
    /// Post results.
    pub posts: CollectionReport,
    /// Request results.
    pub requests: CollectionReport,
    /// Chat results.
    pub chat: CollectionReport,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Duration in seconds.
    pub duration_secs: f64,
}

impl MigrationReport {
    /// Reports in migration order.
    #[must_use]
    pub fn collections(&self) -> [&CollectionReport; 4] {
        [&self.users, &self.posts, &self.requests, &self.chat]
    }

    /// Records written across all collections.
    #[must_use]
    pub fn total_migrated(&self) -> usize {
        self.collections().iter().map(|c| c.migrated).sum()
    }

    /// Records failed across all collections.
    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.collections().iter().map(|c| c.failed()).sum()
    }

    /// Whether any record failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.total_failed() > 0
    }

    /// Calculate throughput (records per second).
    #[must_use]
    pub fn throughput(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.total_migrated() as f64 / self.duration_secs
        } else {
            0.0
        }
    }
}

/// Migration pipeline.
pub struct Pipeline {
    options: MigrationOptions,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn KeyedStore>,
}

impl Pipeline {
    /// Create a pipeline over explicit collaborators.
    #[must_use]
    pub fn new(
        options: MigrationOptions,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn KeyedStore>,
    ) -> Self {
        Self {
            options,
            identity,
            store,
        }
    }

    /// Create a pipeline talking to Firebase as configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a client cannot be created.
    pub fn from_config(config: &MigrationConfig) -> Result<Self> {
        let identity = FirebaseAuthClient::new(config.identity.clone())?;
        let store = RealtimeDatabaseClient::new(config.store.clone())?;

        Ok(Self::new(
            config.options.clone(),
            Arc::new(identity),
            Arc::new(store),
        ))
    }

    /// Load the snapshot at `path` and migrate it.
    ///
    /// # Errors
    ///
    /// Returns an error only if the snapshot cannot be loaded; record-level
    /// failures are reported in the returned [`MigrationReport`].
    pub async fn run_from_path(&self, path: &Path) -> Result<MigrationReport> {
        let snapshot = Snapshot::load(path)?;
        Ok(self.run(&snapshot).await)
    }

    /// Migrate every collection of `snapshot`.
    pub async fn run(&self, snapshot: &Snapshot) -> MigrationReport {
        let start = std::time::Instant::now();

        info!(
            "Starting migration via {} -> {}",
            self.identity.provider_name(),
            self.store.store_name()
        );
        if self.options.dry_run {
            info!("Dry run mode - no remote calls will be made");
        }

        let users = self.migrate_users(&snapshot.users).await;
        let posts = self.copy_collection(Collection::Posts, &snapshot.posts).await;
        let requests = self
            .copy_collection(Collection::Requests, &snapshot.requests)
            .await;
        let chat = self.copy_collection(Collection::Chat, &snapshot.chat).await;

        let report = MigrationReport {
            users,
            posts,
            requests,
            chat,
            dry_run: self.options.dry_run,
            duration_secs: start.elapsed().as_secs_f64(),
        };

        info!(
            "Migration complete: {} migrated, {} failed in {:.2}s",
            report.total_migrated(),
            report.total_failed(),
            report.duration_secs
        );

        report
    }

    async fn migrate_users(&self, users: &[Value]) -> CollectionReport {
        let mut report = CollectionReport::new(Collection::Users, users.len());
        let progress = self.progress_bar(Collection::Users, users.len());

        info!("Migrating users...");

        for value in users {
            progress.inc(1);

            let Some(user) = UserRecord::from_value(value) else {
                report.skipped += 1;
                continue;
            };
            let email = user.email.clone();

            if self.options.dry_run {
                report.migrated += 1;
                continue;
            }

            let account = NewAccount::with_temporary_password(&email);
            let identity = match self.identity.create_account(&account).await {
                Ok(identity) => identity,
                Err(e) => {
                    warn!("Failed user {}: {}", email, e);
                    report.fail(email, &e, None);
                    continue;
                }
            };

            match self.complete_user(&identity, user).await {
                Ok(()) => {
                    report.migrated += 1;
                    info!("Migrated user: {}", email);
                }
                Err(e) => {
                    warn!(
                        "Failed user {}: {} (auth account {} has no data record)",
                        email, e, identity.uid
                    );
                    report.fail(email, &e, Some(identity.uid));
                }
            }
        }

        progress.finish_and_clear();
        info!("{} migrated: {}", Collection::Users.label(), report.migrated);
        report
    }

    /// Steps after account creation: reset link, then the data record.
    async fn complete_user(&self, identity: &Identity, user: UserRecord) -> Result<()> {
        // The provider emails the reset link; the artifact is not kept.
        self.identity.issue_password_reset(&user.email).await?;

        let record = MigratedUser::new(identity.uid.clone(), user, &self.options.default_role);
        let value = serde_json::to_value(&record)?;

        self.store
            .write(Collection::Users.as_str(), &identity.uid, &value)
            .await
    }

    async fn copy_collection(&self, collection: Collection, records: &[Value]) -> CollectionReport {
        let mut report = CollectionReport::new(collection, records.len());
        let progress = self.progress_bar(collection, records.len());

        info!("Migrating {}...", collection.label().to_lowercase());

        for (index, record) in records.iter().enumerate() {
            progress.inc(1);

            let key = match record_key(record, collection.as_str()) {
                Ok(key) => key,
                Err(e) => {
                    warn!("{} error #{}: {}", collection.label(), index, e);
                    report.fail(format!("#{}", index), &e, None);
                    continue;
                }
            };

            match self.copy_record(collection, &key, record).await {
                Ok(()) => report.migrated += 1,
                Err(e) => {
                    warn!("{} error {}: {}", collection.label(), key, e);
                    report.fail(key, &e, None);
                }
            }
        }

        progress.finish_and_clear();
        info!("{} migrated: {}", collection.label(), report.migrated);
        report
    }

    async fn copy_record(&self, collection: Collection, key: &str, record: &Value) -> Result<()> {
        validate_key(key)?;
        if self.options.dry_run {
            return Ok(());
        }
        self.store.write(collection.as_str(), key, record).await
    }

    fn progress_bar(&self, collection: Collection, total: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        create_progress_bar(total as u64, collection.label())
    }
}

fn create_progress_bar(total: u64, label: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(total);

    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:<14} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(label);

    pb
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
