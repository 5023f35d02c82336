//! Core crawl data model
//!
//! Immutable values passed between the engine, handlers, and sinks:
//! - [`Task`]: a unit of pending fetch work tagged with its node kind
//! - [`Context`]: parent linkage threaded from a task to its descendants
//! - [`Record`]: an emitted output value routed to a typed CSV stream

mod record;
mod task;

pub use record::{CollectionRecord, FileRecord, Record, RepositoryRecord};
pub use task::{canonical_url, page_number, url_for_page, Context, NodeKind, Task};
