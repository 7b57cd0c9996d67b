//! Whole-store export and import.

mod delivery;
mod export;
mod import;
mod snapshot;

pub use delivery::{BackupSink, BackupSource, FileSink, FileSource, MemorySink, MemorySource};
pub use export::{build_snapshot, export_all_data, ExportSummary};
pub use import::{import_all_data, ImportPhase, ImportSummary, Importer};
pub use snapshot::{ParsedSnapshot, Snapshot};
