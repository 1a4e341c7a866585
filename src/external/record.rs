//! Disk snapshots of loaded resources
//!
//! A resource gets a snapshot when it is loaded and a fresh one when it is
//! saved or reloaded. Resources that were never loaded have no snapshot and
//! are never compared. A resource loaded from a missing file is stamped as
//! absent.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::report::ExternalChange;
use super::store::{DiskSnapshot, ResourceId, ResourceStore};

#[derive(Debug, Default)]
pub struct ExternalChangeRecord {
    snapshots: BTreeMap<ResourceId, DiskSnapshot>,
}

impl ExternalChangeRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stamp(&mut self, resource: ResourceId, snapshot: DiskSnapshot) {
        trace!("Stamped {resource} at {:?}", snapshot.modified);
        self.snapshots.insert(resource, snapshot);
    }

    pub fn forget(&mut self, resource: &ResourceId) -> Option<DiskSnapshot> {
        self.snapshots.remove(resource)
    }

    pub fn snapshot(&self, resource: &ResourceId) -> Option<&DiskSnapshot> {
        self.snapshots.get(resource)
    }

    pub fn tracked(&self) -> impl Iterator<Item = &ResourceId> {
        self.snapshots.keys()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Compare `resource` against its snapshot. `None` when it is not tracked.
    ///
    /// The contents are only read when the modification time moved, and a
    /// new time with identical bytes still counts as unchanged.
    pub fn compare(&self, store: &dyn ResourceStore, resource: &ResourceId) -> Option<ExternalChange> {
        let snapshot = self.snapshots.get(resource)?;
        let missing = if snapshot.is_absent() {
            ExternalChange::Unchanged
        } else {
            ExternalChange::DeletedOnDisk
        };
        let change = match store.modification_time(resource) {
            Err(error) => ExternalChange::Unreadable {
                reason: error.to_string(),
            },
            Ok(None) => missing,
            Ok(Some(modified)) if Some(modified) == snapshot.modified => ExternalChange::Unchanged,
            Ok(Some(_)) => match store.read(resource) {
                Err(error) => ExternalChange::Unreadable {
                    reason: error.to_string(),
                },
                Ok(None) => missing,
                Ok(Some(contents)) if !snapshot.is_absent() && contents == snapshot.contents => {
                    debug!("{resource} was touched but its contents are unchanged");
                    ExternalChange::Unchanged
                }
                Ok(Some(_)) => ExternalChange::ModifiedOnDisk,
            },
        };
        Some(change)
    }
}
