//! Output handling: typed record sinks
//!
//! The sink router exposes one output stream per record kind. The default
//! implementation writes CSV files, mirroring the downstream import format.

mod csv_output;
mod traits;

pub use csv_output::CsvSink;
pub use traits::{RecordSink, SinkError, SinkResult};
