//! Error types shared by the object graph
//!
//! Configuration mistakes (duplicate registrations, unknown factories) and
//! runtime failures (observer callbacks, representation factories, UFO I/O)
//! all surface as [`Error`]. Application callbacks themselves return
//! `anyhow::Result` and get wrapped on the way out.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::notifications::ObjectId;

/// Result alias used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The exact observer registration already exists and the center is strict
    #[error("observer {observer} is already registered as '{selector}' for '{event}'")]
    DuplicateRegistration {
        observer: ObjectId,
        selector: String,
        event: String,
        poster: Option<ObjectId>,
    },

    /// A different factory already owns this representation name
    #[error("a different representation factory is already registered as '{0}'")]
    DuplicateFactoryName(String),

    #[error("no representation factory named '{name}' for {kind}")]
    UnknownRepresentation { kind: &'static str, name: String },

    #[error("representation '{name}' is not a {expected}")]
    RepresentationType { name: String, expected: &'static str },

    #[error("representation '{0}' was requested while it is being computed")]
    RepresentationCycle(String),

    #[error("representation factory '{name}' failed")]
    Factory {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// Raised after every observer has been given the notification
    #[error("{failed} of {delivered} observers failed while handling '{event}'")]
    ObserverFailed {
        event: String,
        failed: usize,
        delivered: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("notifications for {0} were released more often than they were held")]
    UnbalancedRelease(String),

    #[error("notifications for {0} were enabled more often than they were disabled")]
    UnbalancedEnable(String),

    #[error("{kind} is not attached to a notification center")]
    NoDispatcher { kind: &'static str },

    #[error("invalid point: {0}")]
    InvalidPoint(String),

    #[error("point index {index} is out of range for a contour with {len} points")]
    PointIndex { index: usize, len: usize },

    #[error("contour index {index} is out of range for a glyph with {len} contours")]
    ContourIndex { index: usize, len: usize },

    #[error("a glyph named '{0}' already exists")]
    DuplicateGlyphName(String),

    #[error("no glyph named '{0}'")]
    MissingGlyph(String),

    #[error("'{0}' is not a valid UFO name")]
    InvalidName(String),

    #[error("the font has no path on disk - use save_as first")]
    NotOnDisk,

    #[error("failed to {action} {}", .path.display())]
    Ufo {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Attach the file operation and path to a lower level error
pub trait FileContext<T> {
    fn with_file_context(self, action: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T, E> FileContext<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn with_file_context(self, action: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|source| Error::Ufo {
            action,
            path: path.as_ref().to_path_buf(),
            source: source.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_context_keeps_source() {
        let failed: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let error = failed
            .with_file_context("read", "/tmp/Test.ufo/kerning.plist")
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "failed to read /tmp/Test.ufo/kerning.plist"
        );
        let source = std::error::Error::source(&error).expect("source should be kept");
        assert_eq!(source.to_string(), "denied");
    }
}
