//! Component references
//!
//! Components are plain values held by their glyph; replacing or editing
//! them goes through the glyph.

use kurbo::Affine;
use serde::{Deserialize, Serialize};

/// A reference to another glyph drawn with an affine transform
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub base_glyph: String,
    /// `[xx, xy, yx, yy, dx, dy]` in UFO order
    pub transform: [f64; 6],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl Component {
    pub const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

    pub fn new(base_glyph: impl Into<String>) -> Self {
        Self {
            base_glyph: base_glyph.into(),
            transform: Self::IDENTITY,
            identifier: None,
        }
    }

    pub fn with_offset(mut self, dx: f64, dy: f64) -> Self {
        self.transform[4] = dx;
        self.transform[5] = dy;
        self
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.transform[4] += dx;
        self.transform[5] += dy;
    }

    pub fn affine(&self) -> Affine {
        Affine::new(self.transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn offset_and_translate() {
        let mut component = Component::new("acutecomb").with_offset(100.0, 500.0);
        component.translate(10.0, -20.0);
        assert_eq!(component.transform, [1.0, 0.0, 0.0, 1.0, 110.0, 480.0]);
        assert_eq!(component.affine() * Point::ORIGIN, Point::new(110.0, 480.0));
    }
}
