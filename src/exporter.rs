//! Download of the exclusion list as a contact file.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use rocket_db_pools::sqlx::{self, PgPool};
use thiserror::Error;

use crate::models::Contact;
use crate::store::exclusions::list_excluded;
use crate::tabular::{TabularError, TabularFormat};

/// Attachment stem for the exclusion export.
pub const EXPORT_STEM: &str = "excluidos";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Format(#[from] TabularError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A rendered export ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub rows: usize,
    pub contents: Vec<u8>,
}

/// Write every excluded recipient, in insertion order, to a transient file in
/// `dir` and return its contents. The transient file is gone once this returns.
pub async fn export_excluded(
    pool: &PgPool,
    dir: &Path,
    format: TabularFormat,
) -> Result<ExportFile, ExportError> {
    let contacts: Vec<Contact> = list_excluded(pool)
        .await?
        .into_iter()
        .map(Contact::from)
        .collect();

    let dir = dir.to_path_buf();
    let (rows, contents) = tokio::task::spawn_blocking(move || -> Result<_, ExportError> {
        let mut file = tempfile::Builder::new()
            .prefix("excluidos-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile_in(&dir)?;

        let rows = format.write_contacts(file.as_file_mut(), &contacts)?;

        let mut contents = Vec::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_end(&mut contents)?;
        Ok((rows, contents))
    })
    .await
    .map_err(|err| io::Error::other(format!("export task failed: {err}")))??;

    log::info!("exported {} excluded recipients", rows);

    Ok(ExportFile {
        file_name: format.file_name(EXPORT_STEM),
        rows,
        contents,
    })
}
