//! UFO directory access
//!
//! Font level files are read one at a time so each can be loaded lazily and
//! snapshotted for external change detection. Whole-font writes go through
//! norad.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::core::errors::{Error, FileContext, Result};
use crate::external::{DiskSnapshot, ResourceId, ResourceStore};
use crate::objects::groups::GroupMap;
use crate::objects::kerning::NestedKerning;

const GLYPHS_DIR: &str = "glyphs";
const CONTENTS: &str = "contents.plist";

/// A UFO on disk, default layer only
#[derive(Debug)]
pub struct UfoDirectory {
    root: PathBuf,
    /// glyph name -> file name, as listed in `glyphs/contents.plist`
    contents: RefCell<BTreeMap<String, String>>,
}

impl UfoDirectory {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not a UFO directory"))
                .with_file_context("open", &root);
        }
        let contents = read_contents(&root).with_file_context("read", root.join(GLYPHS_DIR).join(CONTENTS))?;
        debug!("Opened {} with {} glyphs", root.display(), contents.len());
        Ok(Self {
            root,
            contents: RefCell::new(contents),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resource_path(&self, resource: &ResourceId) -> Option<PathBuf> {
        match resource {
            ResourceId::Glyph(name) => self
                .contents
                .borrow()
                .get(name)
                .map(|file| self.root.join(GLYPHS_DIR).join(file)),
            other => other.file_name().map(|file| self.root.join(file)),
        }
    }

    /// Glyph names as of the last refresh
    pub fn glyph_names_on_disk(&self) -> Vec<String> {
        self.contents.borrow().keys().cloned().collect()
    }

    pub fn has_glyph_on_disk(&self, name: &str) -> bool {
        self.contents.borrow().contains_key(name)
    }

    /// Re-read `glyphs/contents.plist`
    pub fn refresh_contents(&self) -> io::Result<()> {
        *self.contents.borrow_mut() = read_contents(&self.root)?;
        Ok(())
    }

    /// Snapshot a resource, `None` when its file does not exist
    pub fn snapshot(&self, resource: &ResourceId) -> Result<Option<DiskSnapshot>> {
        let path = self.resource_path(resource).unwrap_or_else(|| self.root.clone());
        DiskSnapshot::capture(self, resource).with_file_context("read", path)
    }

    pub fn parse_info(&self, bytes: &[u8]) -> Result<norad::FontInfo> {
        plist::from_bytes(bytes).with_file_context("parse", self.root.join("fontinfo.plist"))
    }

    pub fn parse_kerning(&self, bytes: &[u8]) -> Result<NestedKerning> {
        plist::from_bytes(bytes).with_file_context("parse", self.root.join("kerning.plist"))
    }

    pub fn parse_groups(&self, bytes: &[u8]) -> Result<GroupMap> {
        plist::from_bytes(bytes).with_file_context("parse", self.root.join("groups.plist"))
    }

    pub fn parse_features(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).with_file_context("parse", self.root.join("features.fea"))
    }

    pub fn parse_lib(&self, bytes: &[u8]) -> Result<plist::Dictionary> {
        plist::from_bytes(bytes).with_file_context("parse", self.root.join("lib.plist"))
    }

    pub fn load_glyph(&self, name: &str) -> Result<norad::Glyph> {
        let path = self
            .resource_path(&ResourceId::glyph(name))
            .ok_or_else(|| Error::MissingGlyph(name.to_string()))?;
        norad::Glyph::load(&path).with_file_context("load", &path)
    }
}

fn read_contents(root: &Path) -> io::Result<BTreeMap<String, String>> {
    let path = root.join(GLYPHS_DIR).join(CONTENTS);
    match fs::read(&path) {
        Ok(bytes) => plist::from_bytes(&bytes)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(error) => Err(error),
    }
}

fn not_found_as_none<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

impl ResourceStore for UfoDirectory {
    fn modification_time(&self, resource: &ResourceId) -> io::Result<Option<SystemTime>> {
        let Some(path) = self.resource_path(resource) else {
            return Ok(None);
        };
        not_found_as_none(fs::metadata(path).and_then(|metadata| metadata.modified()))
    }

    fn read(&self, resource: &ResourceId) -> io::Result<Option<Vec<u8>>> {
        let Some(path) = self.resource_path(resource) else {
            return Ok(None);
        };
        not_found_as_none(fs::read(path))
    }

    fn glyph_names(&self) -> io::Result<Vec<String>> {
        self.refresh_contents()?;
        Ok(self.glyph_names_on_disk())
    }
}
