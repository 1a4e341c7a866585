//! Tracked on-disk resources
//!
//! The detector never parses anything. It only needs a modification time and
//! the raw bytes of each resource, which a [`ResourceStore`] provides.

use std::fmt;
use std::io;
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Serialize, Serializer};

use crate::core::errors::Error;

/// A file-backed part of a font
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceId {
    Info,
    Groups,
    Kerning,
    Features,
    Lib,
    Glyph(String),
}

impl ResourceId {
    /// The font level resources, in the order they are reported
    pub const FONT_LEVEL: [ResourceId; 5] = [
        ResourceId::Info,
        ResourceId::Groups,
        ResourceId::Kerning,
        ResourceId::Features,
        ResourceId::Lib,
    ];

    pub fn glyph(name: impl Into<String>) -> Self {
        Self::Glyph(name.into())
    }

    /// File name inside the UFO for font level resources
    pub fn file_name(&self) -> Option<&'static str> {
        match self {
            Self::Info => Some("fontinfo.plist"),
            Self::Groups => Some("groups.plist"),
            Self::Kerning => Some("kerning.plist"),
            Self::Features => Some("features.fea"),
            Self::Lib => Some("lib.plist"),
            Self::Glyph(_) => None,
        }
    }

    pub fn glyph_name(&self) -> Option<&str> {
        match self {
            Self::Glyph(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Groups => f.write_str("groups"),
            Self::Kerning => f.write_str("kerning"),
            Self::Features => f.write_str("features"),
            Self::Lib => f.write_str("lib"),
            Self::Glyph(name) => write!(f, "glyph:{name}"),
        }
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "groups" => Ok(Self::Groups),
            "kerning" => Ok(Self::Kerning),
            "features" => Ok(Self::Features),
            "lib" => Ok(Self::Lib),
            other => match other.strip_prefix("glyph:") {
                Some(name) if !name.is_empty() => Ok(Self::Glyph(name.to_string())),
                _ => Err(Error::InvalidName(other.to_string())),
            },
        }
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What a resource looked like on disk when it was last loaded or saved.
/// A resource that was loaded while its file did not exist has an absent
/// snapshot, so the file showing up later is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskSnapshot {
    pub modified: Option<SystemTime>,
    pub contents: Vec<u8>,
}

impl DiskSnapshot {
    pub fn new(modified: SystemTime, contents: Vec<u8>) -> Self {
        Self {
            modified: Some(modified),
            contents,
        }
    }

    pub fn absent() -> Self {
        Self {
            modified: None,
            contents: Vec::new(),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.modified.is_none()
    }

    /// Read the current state of `resource`. `None` when it does not exist.
    pub fn capture(store: &dyn ResourceStore, resource: &ResourceId) -> io::Result<Option<Self>> {
        let Some(modified) = store.modification_time(resource)? else {
            return Ok(None);
        };
        Ok(store
            .read(resource)?
            .map(|contents| Self::new(modified, contents)))
    }
}

/// Access to the raw on-disk state of a font's resources
pub trait ResourceStore {
    /// `Ok(None)` when the resource does not exist
    fn modification_time(&self, resource: &ResourceId) -> io::Result<Option<SystemTime>>;

    /// `Ok(None)` when the resource does not exist
    fn read(&self, resource: &ResourceId) -> io::Result<Option<Vec<u8>>>;

    /// Names of the glyphs currently present on disk
    fn glyph_names(&self) -> io::Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_ids_parse_back() {
        for id in ResourceId::FONT_LEVEL {
            assert_eq!(id.to_string().parse::<ResourceId>().unwrap(), id);
        }
        let glyph: ResourceId = "glyph:A.alt".parse().unwrap();
        assert_eq!(glyph.glyph_name(), Some("A.alt"));
        assert!("glyph:".parse::<ResourceId>().is_err());
        assert!("layers".parse::<ResourceId>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&ResourceId::glyph("B")).unwrap();
        assert_eq!(json, "\"glyph:B\"");
    }
}
