//! Observable font objects
//!
//! The object graph: a [`Font`] owns its font level resources and glyphs, a
//! [`Glyph`] owns its contours. Every object embeds an [`ObjectBase`] and
//! implements [`Observable`].

pub mod base;
pub mod component;
pub mod contour;
pub mod features;
pub mod font;
pub mod font_lib;
pub mod glyph;
pub mod groups;
pub mod info;
pub mod kerning;
pub mod point;

pub use base::{ObjectBase, Observable, DESTROY_REPRESENTATIONS};
pub use component::Component;
pub use contour::Contour;
pub use features::Features;
pub use font::{Font, FontOptions};
pub use font_lib::FontLib;
pub use glyph::Glyph;
pub use groups::Groups;
pub use info::Info;
pub use kerning::Kerning;
pub use point::{UfoPoint, UfoPointType};
