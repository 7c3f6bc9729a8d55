//! Drain engine: configuration, Drip API access, persistence and the export pipeline.
mod config;
mod convert;
mod export;
mod fetch;
mod persist;
mod types;

pub use config::{
    ConfigError, Configuration, CONFIG_FILENAME, DEFAULT_API_URL, DEFAULT_STATUS,
};
pub use convert::Html2MdConverter;
pub use export::{export_broadcasts, run};
pub use fetch::{BroadcastSource, DripClient, FetchSettings};
pub use persist::{ensure_output_dir, write_document, AtomicFileWriter, PersistError};
pub use types::{
    BroadcastOutcome, ExportError, ExportSummary, FailureKind, FetchError, SkipReason,
    WriteOutcome,
};
