// Logward Library - Core functionality behind the logward CLI
//
// Three independent tools share this crate: an access-log aggregator, a log
// archiver and a one-shot system snapshot. Each takes an explicit settings
// struct resolved from config file, environment and command-line flags.

pub mod aggregate;
pub mod archive;
pub mod config;
pub mod input;
pub mod logging;
pub mod output;
pub mod snapshot;
pub mod utils;

pub use aggregate::{aggregate_file, AccessAnalyzer, AccessRecord, AccessSummary, AggregateSettings};
pub use archive::{
    run_archive, ArchiveError, ArchiveFailure, ArchiveFormat, ArchiveReport, ArchiveSettings,
    CandidateFile, SelectionFilter,
};
pub use config::{ConfigManager, LogwardConfig};
pub use input::read_log_file;
pub use logging::init_logging;
pub use output::{OutputFormat, OutputWriter};
pub use snapshot::{collect_snapshot, ProcessRow, SnapshotSettings, SystemSnapshot};
