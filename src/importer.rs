//! Full replacement of the recipient list from an uploaded contact file.
//!
//! The file is parsed completely before the store is touched. The delete and
//! every insert then run in one transaction, so a failed import leaves the
//! previous list in place.

use std::io;
use std::path::Path;

use rocket_db_pools::sqlx::{self, PgPool};
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::models::Contact;
use crate::store::is_unique_violation;
use crate::store::recipients::{delete_all_recipients, insert_recipient};
use crate::tabular::{TabularError, TabularFormat};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid contact file: {0}")]
    Format(#[from] TabularError),
    #[error("email '{0}' appears more than once in the import")]
    DuplicateEmail(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Row counts for one completed import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    /// Recipients that were present before the import.
    pub removed: u64,
    /// Recipients written from the file.
    pub inserted: usize,
}

/// Reserve a uniquely named file in `dir` to hold an upload while it is parsed.
///
/// The file is deleted when the returned handle drops, on success and on
/// every error path alike.
pub fn stage_upload(dir: &Path) -> io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("recipients-")
        .suffix(".upload")
        .tempfile_in(dir)
}

/// Parse the contact file at `path` and replace the recipient list with it.
pub async fn import_file(
    pool: &PgPool,
    path: &Path,
    format: TabularFormat,
) -> Result<ImportStats, ImportError> {
    let bytes = tokio::fs::read(path).await.map_err(TabularError::from)?;
    let contacts = format.read_contacts(bytes.as_slice())?;
    log::debug!("parsed {} contacts from {}", contacts.len(), path.display());

    replace_recipients(pool, &contacts).await
}

/// Delete every recipient and insert `contacts` in their place.
///
/// A repeated email fails the whole replacement with
/// [`ImportError::DuplicateEmail`]; nothing is skipped or merged.
pub async fn replace_recipients(
    pool: &PgPool,
    contacts: &[Contact],
) -> Result<ImportStats, ImportError> {
    let mut tx = pool.begin().await?;

    let removed = delete_all_recipients(&mut *tx).await?;

    for contact in contacts {
        insert_recipient(&mut *tx, contact)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    ImportError::DuplicateEmail(contact.email.clone())
                } else {
                    ImportError::Database(err)
                }
            })?;
    }

    tx.commit().await?;

    let stats = ImportStats {
        removed,
        inserted: contacts.len(),
    };
    log::info!(
        "recipient list replaced: {} removed, {} imported",
        stats.removed,
        stats.inserted
    );
    Ok(stats)
}
