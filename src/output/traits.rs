//! Sink trait and error types
//!
//! A sink routes each emitted record to the typed output stream matching its
//! kind. Sink failures are the one fatal error class in the crawler: partial
//! or corrupted output is worse than an aborted crawl.

use crate::model::Record;
use thiserror::Error;

/// Errors that can occur while writing records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Routes emitted records to typed output streams
///
/// Records may arrive in any order; implementations are responsible for
/// durable serialization. `close` is called exactly once at crawl end.
pub trait RecordSink: Send {
    /// Writes one record to the stream matching its kind
    fn emit(&mut self, record: &Record) -> SinkResult<()>;

    /// Flushes and finalizes all streams
    fn close(&mut self) -> SinkResult<()>;
}
