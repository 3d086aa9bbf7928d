use std::path::PathBuf;

use clap::{Parser, Subcommand};

use axum_base::config::AppConfig;
use axum_base::db::schema::Dialect;
use axum_base::db::{migrations, seed, Database};
use axum_base::observability::init_logging;

const ADMIN_PASSWORD_ENV: &str = "APP_ADMIN_PASSWORD";

#[derive(Parser)]
#[command(name = "base-cli")]
#[command(about = "Management CLI for axum-base: migrations, seeding, configuration", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schema migrations
    Migrate {
        /// Migrations directory, defaults to migrations/<dialect>
        #[arg(long)]
        dir: Option<PathBuf>,

        #[command(subcommand)]
        command: MigrateCommand,
    },
    /// Insert demo actors, addresses, movies and the admin user
    Seed {
        /// Password of the admin user (falls back to APP_ADMIN_PASSWORD)
        #[arg(long)]
        admin_password: Option<String>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum MigrateCommand {
    /// Create the migrations directory with a baseline revision
    Init,
    /// Write a new revision
    Revision {
        /// Revision message
        #[arg(short, long)]
        message: String,
        /// Diff the models against the live database
        #[arg(long)]
        autogenerate: bool,
    },
    /// Apply pending revisions
    Upgrade {
        #[arg(default_value = "head")]
        target: String,
    },
    /// Revert revisions newer than the given version
    Downgrade { version: i64 },
    /// List revisions and whether they are applied
    History,
    /// Show the newest applied revision
    Current,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration with secrets redacted
    Show,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let _log_guard = init_logging(&config.observability, None);

    match cli.command {
        Commands::Migrate { dir, command } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(config.database.migrations_path()));
            run_migrate(&config, dir, command).await?;
        }
        Commands::Seed { admin_password } => {
            let password = admin_password
                .or_else(|| std::env::var(ADMIN_PASSWORD_ENV).ok())
                .filter(|p| !p.is_empty())
                .ok_or("admin password required: pass --admin-password or set APP_ADMIN_PASSWORD")?;

            let db = Database::connect(&config.database).await?;
            db.init_schema().await?;
            let summary = seed::seed_data(&db, &password).await?;
            db.close().await;

            println!(
                "Seeded {} actors, {} addresses, {} movies, {} links, {} users",
                summary.actors, summary.addresses, summary.movies, summary.links, summary.users
            );
        }
        Commands::Config {
            command: ConfigCommand::Show,
        } => {
            print!("{}", config.to_redacted_toml()?);
        }
    }

    Ok(())
}

async fn run_migrate(
    config: &AppConfig,
    dir: PathBuf,
    command: MigrateCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        MigrateCommand::Init => {
            let files = migrations::init(&dir, Dialect::from_url(&config.database.url))?;
            println!("Created {}", files.up.display());
            println!("Created {}", files.down.display());
        }
        MigrateCommand::Revision {
            message,
            autogenerate,
        } => {
            let files = if autogenerate {
                let db = Database::connect(&config.database).await?;
                let files = migrations::revision(&dir, &message, Some(&db)).await?;
                db.close().await;
                files
            } else {
                migrations::revision(&dir, &message, None).await?
            };
            println!("Created {}", files.up.display());
            println!("Created {}", files.down.display());
        }
        MigrateCommand::Upgrade { target } => {
            let db = Database::connect(&config.database).await?;
            migrations::upgrade(&db, &dir, &target).await?;
            db.close().await;
            println!("Upgraded to {}", target);
        }
        MigrateCommand::Downgrade { version } => {
            let db = Database::connect(&config.database).await?;
            migrations::downgrade(&db, &dir, version).await?;
            db.close().await;
            println!("Downgraded to {}", version);
        }
        MigrateCommand::History => {
            let db = Database::connect(&config.database).await?;
            let revisions = migrations::history(&db, &dir).await?;
            db.close().await;

            if revisions.is_empty() {
                println!("No revisions in {}", dir.display());
            }
            for revision in revisions {
                let marker = if revision.applied { "applied" } else { "pending" };
                println!("{} {:<8} {}", revision.version, marker, revision.description);
            }
        }
        MigrateCommand::Current => {
            let db = Database::connect(&config.database).await?;
            let current = migrations::current(&db, &dir).await?;
            db.close().await;

            match current {
                Some(version) => println!("{}", version),
                None => println!("No revision applied"),
            }
        }
    }
    Ok(())
}
