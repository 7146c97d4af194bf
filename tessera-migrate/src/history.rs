//! Migration history store.
//!
//! The migrations directory is the only durable record of migration history.
//! Each migration lives in its own folder named `<YYYYMMDDHHMMSS>_<slug>`
//! containing a `migration.sql` script:
//!
//! ```text
//! migrations/
//!   migration_lock.toml
//!   20240101120000_init/
//!     migration.sql
//!   20240102083000_add_posts/
//!     migration.sql
//! ```
//!
//! New entries are written into a dot-prefixed temporary folder and renamed
//! into place, so an interrupted write never shows up in [`MigrationHistoryStore::list_entries`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::engine::types::MigrationDirectory;
use crate::error::{MigrateResult, MigrationError};

/// Script file inside every migration folder.
pub const MIGRATION_SCRIPT_FILENAME: &str = "migration.sql";

/// Lock file at the root of the migrations directory.
pub const LOCK_FILE_NAME: &str = "migration_lock.toml";

/// Timestamp format of migration ids.
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const TIMESTAMP_LEN: usize = 14;

/// Maximum byte length of the slug part of an id.
const MAX_SLUG_LEN: usize = 200;

const LOCK_FILE_HEADER: &str = "# Please do not edit this file manually\n\
                                # It should be added in your version-control system (e.g., Git)\n";

/// One migration folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationEntry {
    /// Folder name, e.g. `20240101120000_init`.
    pub id: String,
    /// Slug part of the id.
    pub name: String,
    /// Folder path; empty until the entry is written.
    pub path: PathBuf,
    /// Content of `migration.sql`.
    pub script: String,
    /// SHA-256 of the script, hex encoded.
    pub checksum: String,
}

impl MigrationEntry {
    /// Create an entry that has not been written yet.
    pub fn new(id: impl Into<String>, script: impl Into<String>) -> Self {
        let id = id.into();
        let script = script.into();
        let name = id
            .split_once('_')
            .map(|(_, name)| name.to_string())
            .unwrap_or_default();
        let checksum = compute_checksum(&script);

        Self {
            id,
            name,
            path: PathBuf::new(),
            script,
            checksum,
        }
    }

    /// Set the path for this entry.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Timestamp encoded in the id.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.id)
    }

    /// The engine's view of this entry.
    pub fn to_directory(&self) -> MigrationDirectory {
        MigrationDirectory {
            id: self.id.clone(),
            path: self.path.display().to_string(),
            script: self.script.clone(),
        }
    }
}

/// Content of `migration_lock.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationLock {
    /// Provider the history was written for.
    pub provider: String,
}

/// Reader/writer for the migrations directory.
#[derive(Debug, Clone)]
pub struct MigrationHistoryStore {
    migrations_dir: PathBuf,
}

impl MigrationHistoryStore {
    /// Create a store rooted at `migrations_dir`.
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }

    /// Get the migrations directory.
    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Ensure the migrations directory exists.
    pub async fn ensure_dir(&self) -> MigrateResult<()> {
        tokio::fs::create_dir_all(&self.migrations_dir).await?;
        Ok(())
    }

    /// List all entries, sorted by id ascending.
    pub async fn list_entries(&self) -> MigrateResult<Vec<MigrationEntry>> {
        let mut paths = Vec::new();

        if !self.migrations_dir.exists() {
            return Ok(Vec::new());
        }

        let mut dir = tokio::fs::read_dir(&self.migrations_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if is_migration_dir(&path) {
                paths.push(path);
            }
        }

        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(id) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let script = tokio::fs::read_to_string(path.join(MIGRATION_SCRIPT_FILENAME)).await?;
            entries.push(MigrationEntry::new(id, script).with_path(&path));
        }

        debug!(count = entries.len(), dir = %self.migrations_dir.display(), "listed migrations");
        Ok(entries)
    }

    /// Write a new entry.
    ///
    /// The script is written to `.tmp-<id>/migration.sql` first and the
    /// folder is renamed to `<id>` afterwards.
    pub async fn append(&self, entry: MigrationEntry) -> MigrateResult<MigrationEntry> {
        parse_migration_name(&entry.id)?;
        self.ensure_dir().await?;

        let target = self.migrations_dir.join(&entry.id);
        if tokio::fs::try_exists(&target).await? {
            return Err(MigrationError::invalid_migration(format!(
                "migration `{}` already exists",
                entry.id
            )));
        }

        let staging = self.migrations_dir.join(format!(".tmp-{}", entry.id));
        if tokio::fs::try_exists(&staging).await? {
            warn!(path = %staging.display(), "removing stale staging directory");
            tokio::fs::remove_dir_all(&staging).await?;
        }

        tokio::fs::create_dir_all(&staging).await?;
        let written = async {
            tokio::fs::write(staging.join(MIGRATION_SCRIPT_FILENAME), &entry.script).await?;
            tokio::fs::rename(&staging, &target).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(e.into());
        }

        debug!(migration_id = %entry.id, "migration written");
        Ok(entry.with_path(target))
    }

    /// Read `migration_lock.toml`, if present.
    pub async fn read_lock(&self) -> MigrateResult<Option<MigrationLock>> {
        match self.lock_contents().await? {
            Some(content) => {
                let lock = toml::from_str(&content).map_err(|e| {
                    MigrationError::invalid_migration(format!("{LOCK_FILE_NAME}: {e}"))
                })?;
                Ok(Some(lock))
            }
            None => Ok(None),
        }
    }

    /// Raw content of `migration_lock.toml`, if present.
    pub async fn lock_contents(&self) -> MigrateResult<Option<String>> {
        let path = self.migrations_dir.join(LOCK_FILE_NAME);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `migration_lock.toml` for `provider`.
    pub async fn write_lock(&self, provider: &str) -> MigrateResult<()> {
        let body = toml::to_string(&MigrationLock {
            provider: provider.to_string(),
        })
        .map_err(|e| MigrationError::other(e.to_string()))?;

        self.ensure_dir().await?;
        tokio::fs::write(
            self.migrations_dir.join(LOCK_FILE_NAME),
            format!("{LOCK_FILE_HEADER}{body}"),
        )
        .await?;
        Ok(())
    }
}

/// Build an id from a migration name and a timestamp.
pub fn id_for(name: &str, timestamp: DateTime<Utc>) -> String {
    format!("{}_{}", timestamp.format(TIMESTAMP_FORMAT), slugify(name))
}

/// Id for a new entry that sorts after every existing one.
///
/// When `now` is not later than the newest entry, the newest timestamp plus
/// one second is used instead.
pub fn next_id(existing: &[MigrationEntry], name: &str, now: DateTime<Utc>) -> String {
    let now = now.with_nanosecond(0).unwrap_or(now);
    let newest = existing.iter().filter_map(MigrationEntry::timestamp).max();

    let timestamp = match newest {
        Some(newest) if now <= newest => newest + Duration::seconds(1),
        _ => now,
    };
    id_for(name, timestamp)
}

/// Lowercase `name`, turning runs of other characters into a single `_`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }

    let mut slug = slug.trim_matches('_').to_string();
    if slug.len() > MAX_SLUG_LEN {
        let mut end = MAX_SLUG_LEN;
        while !slug.is_char_boundary(end) {
            end -= 1;
        }
        slug.truncate(end);
    }
    slug
}

/// Compute the checksum of a migration script.
pub fn compute_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Split a folder name into (timestamp, name).
fn parse_migration_name(dir_name: &str) -> MigrateResult<(&str, &str)> {
    let (timestamp, name) = dir_name.split_once('_').ok_or_else(|| {
        MigrationError::invalid_migration(format!("invalid migration name format: {dir_name}"))
    })?;

    if timestamp.len() != TIMESTAMP_LEN || !timestamp.chars().all(|c| c.is_ascii_digit()) {
        return Err(MigrationError::invalid_migration(format!(
            "invalid migration id (expected timestamp): {dir_name}"
        )));
    }

    Ok((timestamp, name))
}

fn parse_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let (timestamp, _) = parse_migration_name(id).ok()?;
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .ok()
        .map(|t| t.and_utc())
}

/// Check if a path is a migration directory.
fn is_migration_dir(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') || !path.is_dir() {
        return false;
    }

    parse_migration_name(name).is_ok() && path.join(MIGRATION_SCRIPT_FILENAME).is_file()
}
