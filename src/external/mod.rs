//! External change detection
//!
//! Loaded resources keep a snapshot of their file (modification time and raw
//! bytes). Testing for external changes compares the current file against the
//! snapshot, reading contents only when the modification time moved.

pub mod record;
pub mod report;
pub mod store;

pub use record::ExternalChangeRecord;
pub use report::{ExternalChange, ExternalChangeReport, ResourceReport, ResourceState};
pub use store::{DiskSnapshot, ResourceId, ResourceStore};
