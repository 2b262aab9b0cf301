//! rtdb-migrate CLI
//!
//! CLI tool for migrating a JSON snapshot into Firebase.
//! Pedantic lints relaxed for CLI ergonomics.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rtdb_migrate::config::default_snapshot_path;
use rtdb_migrate::{MigrationConfig, MigrationReport, Pipeline, Snapshot};

/// Exit code when `--fail-on-record-errors` is set and a record failed.
const EXIT_RECORD_ERRORS: i32 = 2;

#[derive(Parser)]
#[command(name = "rtdb-migrate")]
#[command(version)]
#[command(about = "Migrate a JSON snapshot into Firebase Realtime Database and Auth", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run migration from config file
    Run {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Validate configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },

    /// Show record counts of a snapshot without migrating it
    Inspect {
        /// Snapshot path (default: db.json next to the executable)
        #[arg(short, long, value_name = "PATH", env = "RTDB_MIGRATE_SNAPSHOT")]
        snapshot: Option<PathBuf>,
    },

    /// Generate example configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "migration.yaml")]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Snapshot path override
    #[arg(short, long, value_name = "PATH", env = "RTDB_MIGRATE_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Dry run mode (no remote calls)
    #[arg(long)]
    dry_run: bool,

    /// OAuth2 access token used where the config has none
    #[arg(long, env = "FIREBASE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Exit with status 2 if any record failed
    #[arg(long)]
    fail_on_record_errors: bool,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Some(Commands::Run { config, run }) => {
            run_migration(&config, run).await?;
        }
        Some(Commands::Validate { config }) => {
            validate_config(&config)?;
        }
        Some(Commands::Inspect { snapshot }) => {
            inspect_snapshot(&snapshot.unwrap_or_else(default_snapshot_path))?;
        }
        Some(Commands::Init { output }) => {
            generate_config(&output)?;
        }
        None => {
            // Default: run migration if config provided
            if let Some(config) = cli.config {
                run_migration(&config, cli.run).await?;
            } else {
                eprintln!("Usage: rtdb-migrate --config <FILE> or rtdb-migrate <COMMAND>");
                eprintln!("Try 'rtdb-migrate --help' for more information.");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_migration(config_path: &Path, args: RunArgs) -> anyhow::Result<()> {
    info!("Loading configuration from {:?}", config_path);

    let mut config = MigrationConfig::from_file(config_path)?;

    if let Some(snapshot) = args.snapshot {
        config.snapshot = Some(snapshot);
    }
    if args.dry_run {
        config.options.dry_run = true;
    }
    if args.no_progress {
        config.options.show_progress = false;
    }
    config.apply_access_token(args.access_token.as_deref());

    config.validate()?;

    let pipeline = Pipeline::from_config(&config)?;
    let report = pipeline.run_from_path(&config.snapshot_path()).await?;

    print_report(&report);

    if args.fail_on_record_errors && report.has_failures() {
        std::process::exit(EXIT_RECORD_ERRORS);
    }

    Ok(())
}

fn print_report(report: &MigrationReport) {
    if report.dry_run {
        println!("\n✅ Dry Run Complete! (nothing was written)");
    } else {
        println!("\n✅ Migration Complete!");
    }

    for collection in report.collections() {
        println!(
            "   {:<9} {} migrated, {} skipped, {} failed",
            format!("{}:", collection.collection),
            collection.migrated,
            collection.skipped,
            collection.failed()
        );
    }
    println!("   Duration:  {:.2}s", report.duration_secs);
    println!("   Throughput: {:.0} records/sec", report.throughput());

    if report.has_failures() {
        println!("\n⚠️  Failed records:");
        for collection in report.collections() {
            for failure in &collection.failures {
                match &failure.orphaned_uid {
                    Some(uid) => println!(
                        "   {} {}: {} (auth account {} created without data record)",
                        collection.collection, failure.record, failure.error, uid
                    ),
                    None => println!(
                        "   {} {}: {}",
                        collection.collection, failure.record, failure.error
                    ),
                }
            }
        }
    }
}

fn validate_config(config_path: &Path) -> anyhow::Result<()> {
    info!("Validating configuration from {:?}", config_path);

    let config = MigrationConfig::from_file(config_path)?;
    config.validate()?;

    println!("✅ Configuration is valid!");
    println!("   Project:  {}", config.identity.project_id);
    println!("   Database: {}", config.store.database_url);
    println!("   Snapshot: {}", config.snapshot_path().display());

    Ok(())
}

fn inspect_snapshot(path: &Path) -> anyhow::Result<()> {
    let snapshot = Snapshot::load(path)?;

    println!("\n📊 Snapshot: {}", path.display());
    println!("{}", snapshot.summary());

    Ok(())
}

fn generate_config(output: &Path) -> anyhow::Result<()> {
    std::fs::write(output, CONFIG_TEMPLATE)?;
    println!("✅ Generated configuration: {:?}", output);
    println!(
        "   Edit the file and run: rtdb-migrate run --config {:?} --dry-run",
        output
    );

    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"# rtdb-migrate configuration
# Relative snapshot paths resolve against this file's directory.
snapshot: db.json

identity:
  # url: https://identitytoolkit.googleapis.com
  project_id: your-project-id
  # access_token: set FIREBASE_ACCESS_TOKEN instead of committing a token

store:
  database_url: https://your-project-id-default-rtdb.firebaseio.com
  # access_token: set FIREBASE_ACCESS_TOKEN instead of committing a token

options:
  dry_run: false
  default_role: user
  show_progress: true
"#;
