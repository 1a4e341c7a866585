//! Results of an external change test

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::store::ResourceId;

/// How a tracked resource compares to its snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExternalChange {
    Unchanged,
    ModifiedOnDisk,
    DeletedOnDisk,
    /// The file exists but could not be stat'ed or read
    Unreadable { reason: String },
}

impl ExternalChange {
    pub fn is_change(&self) -> bool {
        matches!(self, Self::ModifiedOnDisk | Self::DeletedOnDisk)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReport {
    pub change: ExternalChange,
    /// The in-memory object has unsaved edits
    pub modified_in_memory: bool,
}

impl ResourceReport {
    /// Changed both on disk and in memory. Nothing is applied automatically;
    /// the caller decides whether to reload and lose the in-memory edits.
    pub fn is_conflict(&self) -> bool {
        self.modified_in_memory && self.change.is_change()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalChangeReport {
    pub checked_at: DateTime<Utc>,
    pub resources: BTreeMap<ResourceId, ResourceReport>,
    /// Glyphs present on disk that the font does not know about
    pub added_glyphs: Vec<String>,
    /// Set when `glyphs/contents.plist` could not be read. Added glyphs are
    /// not looked for in that case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<ExternalChange>,
}

impl Default for ExternalChangeReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalChangeReport {
    pub fn new() -> Self {
        Self {
            checked_at: Utc::now(),
            resources: BTreeMap::new(),
            added_glyphs: Vec::new(),
            contents: None,
        }
    }

    pub fn get(&self, resource: &ResourceId) -> Option<&ResourceReport> {
        self.resources.get(resource)
    }

    pub fn change(&self, resource: &ResourceId) -> Option<&ExternalChange> {
        self.get(resource).map(|report| &report.change)
    }

    pub fn changed(&self) -> Vec<&ResourceId> {
        self.resources
            .iter()
            .filter(|(_, report)| report.change.is_change())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn conflicts(&self) -> Vec<&ResourceId> {
        self.resources
            .iter()
            .filter(|(_, report)| report.is_conflict())
            .map(|(id, _)| id)
            .collect()
    }

    /// Modified on disk with no in-memory edits to lose
    pub fn reloadable(&self) -> Vec<&ResourceId> {
        self.resources
            .iter()
            .filter(|(_, report)| {
                report.change == ExternalChange::ModifiedOnDisk && !report.modified_in_memory
            })
            .map(|(id, _)| id)
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        !self.added_glyphs.is_empty() || self.resources.values().any(|r| r.change.is_change())
    }
}

/// Where a resource stands relative to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceState {
    Unloaded,
    Unmodified,
    Modified,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(change: ExternalChange, modified_in_memory: bool) -> ResourceReport {
        ResourceReport {
            change,
            modified_in_memory,
        }
    }

    #[test]
    fn conflicts_and_reloadable_are_disjoint() {
        let mut report = ExternalChangeReport::new();
        report
            .resources
            .insert(ResourceId::Kerning, entry(ExternalChange::ModifiedOnDisk, true));
        report
            .resources
            .insert(ResourceId::Groups, entry(ExternalChange::ModifiedOnDisk, false));
        report
            .resources
            .insert(ResourceId::Info, entry(ExternalChange::Unchanged, true));

        assert_eq!(report.conflicts(), vec![&ResourceId::Kerning]);
        assert_eq!(report.reloadable(), vec![&ResourceId::Groups]);
        assert_eq!(report.changed().len(), 2);
        assert!(report.has_changes());
    }

    #[test]
    fn json_shape() {
        let mut report = ExternalChangeReport::new();
        report.resources.insert(
            ResourceId::glyph("A"),
            entry(
                ExternalChange::Unreadable {
                    reason: "denied".into(),
                },
                false,
            ),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["resources"]["glyph:A"]["change"]["kind"], "unreadable");
        assert_eq!(json["resources"]["glyph:A"]["modifiedInMemory"], false);
        assert!(json["addedGlyphs"].as_array().unwrap().is_empty());
    }
}
