// Migration tool - pedantic lints relaxed for CLI ergonomics
#![allow(clippy::pedantic)]

//! # rtdb-migrate
//!
//! `rtdb-migrate` is a CLI tool and library that imports a local JSON
//! snapshot into Firebase Realtime Database and Firebase Authentication.
//!
//! ## What gets migrated
//!
//! | Collection | Destination | Notes |
//! |------------|-------------|-------|
//! | `users` | auth account + `users/<uid>` | temporary password, reset email sent |
//! | `posts` | `posts/<id>` | copied verbatim |
//! | `requests` | `requests/<id>` | copied verbatim |
//! | `chat` | `chat/<id>` | copied verbatim |
//!
//! Collections run in that order, one record at a time. A record that fails
//! is logged and skipped; only a snapshot that cannot be loaded fails the run.
//! Re-running creates duplicate auth accounts, so a partially failed run is
//! best fixed by hand.
//!
//! ## Quick Start
//!
//! ```bash
//! rtdb-migrate init --output migration.yaml
//! rtdb-migrate run --config migration.yaml --dry-run
//! FIREBASE_ACCESS_TOKEN=$(gcloud auth print-access-token) \
//!     rtdb-migrate run --config migration.yaml
//! ```
//!
//! ## Library use
//!
//! The collaborators are traits, so the pipeline runs against anything that
//! implements [`IdentityProvider`] and [`KeyedStore`]:
//!
//! ```no_run
//! # async fn demo(
//! #     identity: std::sync::Arc<dyn rtdb_migrate::IdentityProvider>,
//! #     store: std::sync::Arc<dyn rtdb_migrate::KeyedStore>,
//! # ) -> rtdb_migrate::Result<()> {
//! use rtdb_migrate::{MigrationOptions, Pipeline};
//!
//! let pipeline = Pipeline::new(MigrationOptions::default(), identity, store);
//! let report = pipeline.run_from_path("db.json".as_ref()).await?;
//! println!("{} records migrated", report.total_migrated());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod pipeline;
pub mod snapshot;
pub mod store;

pub use config::{IdentityConfig, MigrationConfig, MigrationOptions, StoreConfig};
pub use error::{Error, Result};
pub use identity::{FirebaseAuthClient, Identity, IdentityProvider, NewAccount, ResetArtifact};
pub use pipeline::{Collection, CollectionReport, MigrationReport, Pipeline, RecordFailure};
pub use snapshot::{MigratedUser, Snapshot, SnapshotSummary, UserRecord};
pub use store::{KeyedStore, RealtimeDatabaseClient};
