//! Delimiter-separated contact files.
//!
//! Imports and exports share one layout: a header row naming the `Nome` and
//! `Email` columns (exact, case-sensitive) followed by one contact per row.
//! Extra columns in an uploaded file are ignored and column order is free.
//! Rows may carry more fields than the header; a row too short to reach the
//! `Nome` or `Email` column is an error.

use std::io::{Read, Write};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use thiserror::Error;

use crate::models::Contact;

pub const NAME_COLUMN: &str = "Nome";
pub const EMAIL_COLUMN: &str = "Email";

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("unreadable header row: {0}")]
    Header(csv::Error),
    #[error("malformed row at line {line}: {source}")]
    MalformedRow {
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error("row at line {line} has no value for column '{column}'")]
    MissingField { line: u64, column: &'static str },
    #[error("failed to write contact file: {0}")]
    Write(csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Field delimiter and naming for contact files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabularFormat {
    pub delimiter: u8,
}

impl Default for TabularFormat {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl TabularFormat {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// File extension used for exported attachments.
    pub fn extension(&self) -> &'static str {
        match self.delimiter {
            b'\t' => "tsv",
            _ => "csv",
        }
    }

    /// Attachment name for an export with the given stem, e.g. `excluidos.csv`.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.extension())
    }

    /// Parse every contact row from `input`.
    ///
    /// Fails on the first row that does not fit the header; nothing is
    /// returned for earlier rows in that case.
    pub fn read_contacts<R: Read>(&self, input: R) -> Result<Vec<Contact>, TabularError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(input);

        let headers = reader.headers().map_err(TabularError::Header)?.clone();
        let name_idx = column_index(&headers, NAME_COLUMN)?;
        let email_idx = column_index(&headers, EMAIL_COLUMN)?;

        let mut contacts = Vec::new();
        for (index, result) in reader.records().enumerate() {
            // Header occupies line 1.
            let fallback_line = index as u64 + 2;
            let record = result.map_err(|source| {
                let line = source
                    .position()
                    .map(|pos| pos.line())
                    .unwrap_or(fallback_line);
                TabularError::MalformedRow { line, source }
            })?;
            let line = record
                .position()
                .map(|pos| pos.line())
                .unwrap_or(fallback_line);

            let name = field(&record, name_idx, NAME_COLUMN, line)?;
            let email = field(&record, email_idx, EMAIL_COLUMN, line)?;
            contacts.push(Contact::new(name, email));
        }

        Ok(contacts)
    }

    /// Write the header followed by one row per contact. An empty iterator
    /// still produces the header row.
    pub fn write_contacts<'a, W, I>(&self, output: W, contacts: I) -> Result<usize, TabularError>
    where
        W: Write,
        I: IntoIterator<Item = &'a Contact>,
    {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(output);

        writer
            .write_record([NAME_COLUMN, EMAIL_COLUMN])
            .map_err(TabularError::Write)?;

        let mut rows = 0;
        for contact in contacts {
            writer
                .write_record([contact.name.as_str(), contact.email.as_str()])
                .map_err(TabularError::Write)?;
            rows += 1;
        }

        writer.flush()?;
        Ok(rows)
    }
}

fn column_index(headers: &StringRecord, column: &'static str) -> Result<usize, TabularError> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or(TabularError::MissingColumn(column))
}

fn field(
    record: &StringRecord,
    index: usize,
    column: &'static str,
    line: u64,
) -> Result<String, TabularError> {
    record
        .get(index)
        .map(str::to_string)
        .ok_or(TabularError::MissingField { line, column })
}
