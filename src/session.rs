use encoding_rs::Encoding;
use log::info;

use crate::{
    clean::Cleaner,
    error::{InsightsError, Result},
    export,
    frame::CleanTable,
    loader,
};

#[derive(Debug, Clone)]
struct Upload {
    file_name: String,
    table: CleanTable,
}

/// Holds the cleaned table for one user session.
///
/// Only [`Session::upload`] and [`Session::replace`] write the slot; readers
/// go through [`Session::require`] and get
/// [`InsightsError::PreconditionFailed`] while nothing has been uploaded.
#[derive(Debug, Clone, Default)]
pub struct Session {
    cleaner: Cleaner,
    current: Option<Upload>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cleaner(cleaner: Cleaner) -> Self {
        Self {
            cleaner,
            current: None,
        }
    }

    /// Loads and cleans `bytes`, replacing the held table on success. A
    /// failed upload leaves the previous table in place.
    pub fn upload(
        &mut self,
        bytes: &[u8],
        file_name: &str,
        encoding: &'static Encoding,
    ) -> Result<&CleanTable> {
        let raw = loader::load(bytes, file_name, encoding)?;
        let cleaned = self.cleaner.clean(&raw);
        info!(
            "Cleaned '{}': {} row(s) kept of {}",
            file_name,
            cleaned.row_count(),
            raw.row_count()
        );
        Ok(self.replace(file_name, cleaned))
    }

    pub fn replace(&mut self, file_name: &str, table: CleanTable) -> &CleanTable {
        let upload = self.current.insert(Upload {
            file_name: file_name.to_string(),
            table,
        });
        &upload.table
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn table(&self) -> Option<&CleanTable> {
        self.current.as_ref().map(|upload| &upload.table)
    }

    pub fn require(&self) -> Result<&CleanTable> {
        self.table().ok_or_else(|| {
            InsightsError::PreconditionFailed(
                "no cleaned table in this session; upload a file first".to_string(),
            )
        })
    }

    pub fn source_name(&self) -> Option<&str> {
        self.current
            .as_ref()
            .map(|upload| upload.file_name.as_str())
    }

    pub fn cleaned_file_name(&self) -> Option<String> {
        self.source_name().map(export::cleaned_file_name)
    }
}
