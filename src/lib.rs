//! Bezy objects
//!
//! Observable font objects for the Bezy font editor: a notification center,
//! dirty tracking through the object graph, cached representations, and
//! detection of changes made to the UFO by other programs.
pub mod core;
pub mod data;
pub mod external;
pub mod geometry;
pub mod logging;
pub mod notifications;
pub mod objects;
pub mod representations;

pub use crate::core::errors::{Error, Result};
pub use external::{ExternalChange, ExternalChangeReport, ResourceId};
pub use notifications::{Notification, NotificationCenter, ObjectId, Observer};
pub use objects::{Font, FontOptions, Glyph, Observable};
pub use representations::{Parameters, RepresentationRegistry};
