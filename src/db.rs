use std::fs::{create_dir_all, remove_file};
use std::path::Path;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use tracing::info;

use crate::persistence::Persistence;
use crate::repository::SqliteStore;

pub fn open(db_path: &Path) -> Result<Persistence<SqliteStore>> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            create_dir_all(parent)
                .with_context(|| format!("Unable to create {}", parent.display()))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Unable to open database {}", db_path.display()))?;

    Ok(Persistence::new(SqliteStore::new(conn)?))
}

pub fn drop(db_path: &Path) -> Result<()> {
    info!(path = %db_path.display(), "Removing database");

    if !db_path.exists() {
        bail!("Database does not exist");
    }

    remove_file(db_path).context("Unable to drop database")?;
    info!("Database has been dropped");
    Ok(())
}
