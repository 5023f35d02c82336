//! CSV sink implementation
//!
//! Keeps three independently-open CSV writers, one per record kind, and
//! serializes each record onto its stream as it arrives.

use crate::config::OutputConfig;
use crate::model::Record;
use crate::output::traits::{RecordSink, SinkError, SinkResult};
use csv::Writer;
use std::fs::File;
use std::path::Path;

/// CSV-backed record sink with one file per record kind
pub struct CsvSink {
    collections: Writer<File>,
    repositories: Writer<File>,
    files: Writer<File>,
}

impl CsvSink {
    /// Opens the three output streams, creating parent directories as needed
    ///
    /// # Arguments
    ///
    /// * `config` - Output paths for the three CSV files
    pub fn open(config: &OutputConfig) -> SinkResult<Self> {
        Ok(Self {
            collections: open_writer(&config.collections_path)?,
            repositories: open_writer(&config.repositories_path)?,
            files: open_writer(&config.files_path)?,
        })
    }
}

fn open_writer(path: &str) -> SinkResult<Writer<File>> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Writer::from_writer(file))
}

impl RecordSink for CsvSink {
    fn emit(&mut self, record: &Record) -> SinkResult<()> {
        match record {
            Record::Collection(r) => self.collections.serialize(r)?,
            Record::Repository(r) => self.repositories.serialize(r)?,
            Record::File(r) => self.files.serialize(r)?,
        }
        Ok(())
    }

    fn close(&mut self) -> SinkResult<()> {
        self.collections.flush().map_err(SinkError::Io)?;
        self.repositories.flush().map_err(SinkError::Io)?;
        self.files.flush().map_err(SinkError::Io)?;
        Ok(())
    }
}
