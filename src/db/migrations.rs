//! Versioned schema migrations.
//!
//! # Layout
//! ```text
//! migrations/<dialect>/<YYYYMMDDHHMMSS>_<slug>.up.sql
//! migrations/<dialect>/<YYYYMMDDHHMMSS>_<slug>.down.sql
//! ```
//!
//! History is kept by the sqlx migrator in `_sqlx_migrations`.
//!
//! # Commands
//! - `init`: baseline revision rendered from the table registry
//! - `revision`: empty pair, or a diff against the live database with `autogenerate`
//! - `upgrade`: apply everything pending (target `head`)
//! - `downgrade`: revert down to a version
//! - `history`: every known revision and whether it is applied

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use sqlx::migrate::{Migrate, MigrateError, Migrator};
use thiserror::Error;

use crate::db::schema::{self, Dialect, LiveSchema, SchemaChange, TABLES};
use crate::db::{Database, DatabaseError};

const VERSION_FORMAT: &str = "%Y%m%d%H%M%S";
const SQLX_HISTORY_TABLE: &str = "_sqlx_migrations";

/// Errors raised by migration commands.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Migrations already initialized in {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("Unsupported upgrade target '{0}' (only 'head' is supported)")]
    UnsupportedTarget(String),

    #[error("Migration message must contain at least one letter or digit")]
    EmptyMessage,

    #[error("Migration failed: {0}")]
    Migrate(#[from] MigrateError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for MigrationError {
    fn from(e: sqlx::Error) -> Self {
        MigrationError::Database(DatabaseError::Sqlx(e))
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> MigrationError + '_ {
    move |source| MigrationError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Files written by `init` or `revision`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionFiles {
    pub version: i64,
    pub up: PathBuf,
    pub down: PathBuf,
}

/// One entry of `history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
}

/// Turn a free-form message into a file name slug.
pub fn slugify(message: &str) -> String {
    let mut slug = String::with_capacity(message.len());
    let mut pending_sep = false;
    for ch in message.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// Versions already present in `dir`.
fn existing_versions(dir: &Path) -> Result<BTreeSet<i64>, MigrationError> {
    let mut versions = BTreeSet::new();
    if !dir.exists() {
        return Ok(versions);
    }
    for entry in fs::read_dir(dir).map_err(io_err(dir))? {
        let entry = entry.map_err(io_err(dir))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.ends_with(".sql") {
            continue;
        }
        if let Some(version) = name.split('_').next().and_then(|v| v.parse::<i64>().ok()) {
            versions.insert(version);
        }
    }
    Ok(versions)
}

/// Timestamp version, bumped past the newest existing one.
fn next_version(dir: &Path) -> Result<i64, MigrationError> {
    let now: i64 = Utc::now()
        .format(VERSION_FORMAT)
        .to_string()
        .parse()
        .unwrap_or_default();
    let newest = existing_versions(dir)?.last().copied();

    Ok(match newest {
        Some(latest) if latest >= now => bump_version(latest),
        _ => now,
    })
}

/// Next second after `version`, keeping the timestamp shape valid.
fn bump_version(version: i64) -> i64 {
    NaiveDateTime::parse_from_str(&version.to_string(), VERSION_FORMAT)
        .ok()
        .and_then(|ts| ts.checked_add_signed(chrono::Duration::seconds(1)))
        .and_then(|ts| ts.format(VERSION_FORMAT).to_string().parse().ok())
        .unwrap_or(version + 1)
}

fn write_pair(
    dir: &Path,
    version: i64,
    slug: &str,
    up: &str,
    down: &str,
) -> Result<RevisionFiles, MigrationError> {
    fs::create_dir_all(dir).map_err(io_err(dir))?;
    let up_path = dir.join(format!("{}_{}.up.sql", version, slug));
    let down_path = dir.join(format!("{}_{}.down.sql", version, slug));
    fs::write(&up_path, up).map_err(io_err(&up_path))?;
    fs::write(&down_path, down).map_err(io_err(&down_path))?;

    tracing::info!(version, up = %up_path.display(), "Revision written");
    Ok(RevisionFiles {
        version,
        up: up_path,
        down: down_path,
    })
}

fn render_statements(statements: &[String]) -> String {
    let mut out = String::new();
    for statement in statements {
        out.push_str(statement);
        out.push_str(";\n\n");
    }
    out
}

/// Create the migrations directory with a baseline of every registered table.
pub fn init(dir: &Path, dialect: Dialect) -> Result<RevisionFiles, MigrationError> {
    if !existing_versions(dir)?.is_empty() {
        return Err(MigrationError::AlreadyInitialized(dir.to_path_buf()));
    }

    let up: Vec<String> = TABLES
        .iter()
        .map(|t| t.create_sql(dialect, true))
        .collect();
    let down: Vec<String> = TABLES.iter().rev().map(|t| t.drop_sql()).collect();

    let version = next_version(dir)?;
    write_pair(
        dir,
        version,
        "baseline",
        &format!("-- Baseline schema\n\n{}", render_statements(&up)),
        &render_statements(&down),
    )
}

/// Write a new revision.
///
/// With `db`, the up file holds the statements needed to bring that database
/// to the registered model; without it both files are empty placeholders.
pub async fn revision(
    dir: &Path,
    message: &str,
    db: Option<&Database>,
) -> Result<RevisionFiles, MigrationError> {
    let slug = slugify(message);
    if slug.is_empty() {
        return Err(MigrationError::EmptyMessage);
    }

    let (up, down) = match db {
        None => (
            format!("-- {}\n", message),
            format!("-- Revert: {}\n", message),
        ),
        Some(db) => {
            let live = introspect(db).await?;
            let changes = schema::diff(&live);
            autogenerated_sql(message, &changes, db.dialect())
        }
    };

    let version = next_version(dir)?;
    write_pair(dir, version, &slug, &up, &down)
}

fn autogenerated_sql(message: &str, changes: &[SchemaChange], dialect: Dialect) -> (String, String) {
    if changes.is_empty() {
        return (
            format!("-- {}\n-- No schema changes detected\n", message),
            format!("-- Revert: {}\n", message),
        );
    }

    let up: Vec<String> = changes.iter().map(|c| c.up_sql(dialect)).collect();
    let down: Vec<String> = changes.iter().rev().map(SchemaChange::down_sql).collect();
    (
        format!("-- {}\n-- Autogenerated, review before applying\n\n{}", message, render_statements(&up)),
        format!("-- Revert: {}\n\n{}", message, render_statements(&down)),
    )
}

/// Tables and columns currently present in the database.
pub async fn introspect(db: &Database) -> Result<LiveSchema, MigrationError> {
    let mut live: LiveSchema = BTreeMap::new();

    match db.dialect() {
        Dialect::Postgres => {
            let schema = db.config().effective_schema().unwrap_or("public").to_string();
            let rows: Vec<(String, String)> = sqlx::query_as(
                "SELECT table_name::text, column_name::text FROM information_schema.columns \
                 WHERE table_schema = $1",
            )
            .bind(schema)
            .fetch_all(db.pool())
            .await?;
            for (table, column) in rows {
                live.entry(table).or_default().insert(column);
            }
        }
        Dialect::Sqlite => {
            let tables: Vec<String> = sqlx::query_scalar(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            )
            .fetch_all(db.pool())
            .await?;
            for table in tables {
                let columns: Vec<String> =
                    sqlx::query_scalar("SELECT name FROM pragma_table_info($1)")
                        .bind(table.clone())
                        .fetch_all(db.pool())
                        .await?;
                live.insert(table, columns.into_iter().collect());
            }
        }
    }

    live.remove(SQLX_HISTORY_TABLE);
    Ok(live)
}

async fn migrator(dir: &Path) -> Result<Migrator, MigrationError> {
    Ok(Migrator::new(dir).await?)
}

/// Apply every pending migration. Only `head` is accepted as target.
pub async fn upgrade(db: &Database, dir: &Path, target: &str) -> Result<(), MigrationError> {
    if target != "head" {
        return Err(MigrationError::UnsupportedTarget(target.to_string()));
    }

    db.ensure_schema().await?;
    let migrator = migrator(dir).await?;
    migrator.run(db.pool()).await?;

    tracing::info!(dir = %dir.display(), "Database upgraded to head");
    Ok(())
}

/// Revert applied migrations newer than `target`.
pub async fn downgrade(db: &Database, dir: &Path, target: i64) -> Result<(), MigrationError> {
    let migrator = migrator(dir).await?;
    migrator.undo(db.pool(), target).await?;

    tracing::info!(target, "Database downgraded");
    Ok(())
}

/// Every revision in `dir` with its applied state.
pub async fn history(db: &Database, dir: &Path) -> Result<Vec<RevisionStatus>, MigrationError> {
    db.ensure_schema().await?;
    let migrator = migrator(dir).await?;

    let mut conn = db.pool().acquire().await?;
    conn.ensure_migrations_table().await?;
    let applied: BTreeSet<i64> = conn
        .list_applied_migrations()
        .await?
        .into_iter()
        .map(|m| m.version)
        .collect();

    Ok(migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| RevisionStatus {
            version: m.version,
            description: m.description.to_string(),
            applied: applied.contains(&m.version),
        })
        .collect())
}

/// Newest applied version, if any.
pub async fn current(db: &Database, dir: &Path) -> Result<Option<i64>, MigrationError> {
    Ok(history(db, dir)
        .await?
        .into_iter()
        .filter(|r| r.applied)
        .map(|r| r.version)
        .max())
}
