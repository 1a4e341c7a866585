//! UFO point data
//!
//! Points are plain values owned by their contour. Edits go through the
//! contour so that it can post its change notification.

use serde::{Deserialize, Serialize};

use crate::core::errors::{Error, Result};

/// UFO point type enumeration
/// Maps directly to the UFO specification point types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UfoPointType {
    /// First point in an open contour
    #[serde(rename = "move")]
    Move,
    /// Draws straight line from previous point
    #[serde(rename = "line")]
    Line,
    /// Part of curve segment (control point)
    #[serde(rename = "offcurve")]
    OffCurve,
    /// Draws cubic Bézier curve
    #[serde(rename = "curve")]
    Curve,
    /// Draws quadratic curve
    #[serde(rename = "qcurve")]
    QCurve,
}

impl UfoPointType {
    /// Check if this point type is on-curve (not a control point)
    pub fn is_on_curve(&self) -> bool {
        !matches!(self, UfoPointType::OffCurve)
    }

    /// Check if this point type can have the smooth attribute
    pub fn can_be_smooth(&self) -> bool {
        self.is_on_curve()
    }
}

/// A single contour point
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UfoPoint {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub point_type: UfoPointType,
    /// Only meaningful for on-curve points
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub smooth: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unique identifier within the glyph
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl UfoPoint {
    pub fn new(x: f64, y: f64, point_type: UfoPointType) -> Self {
        Self {
            x,
            y,
            point_type,
            smooth: false,
            name: None,
            identifier: None,
        }
    }

    /// Create a move point (first point in contour)
    pub fn move_to(x: f64, y: f64) -> Self {
        Self::new(x, y, UfoPointType::Move)
    }

    pub fn line_to(x: f64, y: f64) -> Self {
        Self::new(x, y, UfoPointType::Line)
    }

    pub fn off_curve(x: f64, y: f64) -> Self {
        Self::new(x, y, UfoPointType::OffCurve)
    }

    pub fn curve_to(x: f64, y: f64) -> Self {
        Self::new(x, y, UfoPointType::Curve)
    }

    pub fn qcurve_to(x: f64, y: f64) -> Self {
        Self::new(x, y, UfoPointType::QCurve)
    }

    /// Set the smooth flag (ignored for off-curve points)
    pub fn with_smooth(mut self, smooth: bool) -> Self {
        if self.point_type.can_be_smooth() {
            self.smooth = smooth;
        }
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_identifier<S: Into<String>>(mut self, identifier: S) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn is_on_curve(&self) -> bool {
        self.point_type.is_on_curve()
    }

    pub fn is_smooth(&self) -> bool {
        self.smooth && self.is_on_curve()
    }

    pub fn position(&self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Validate point according to UFO constraints
    pub fn validate(&self) -> Result<()> {
        if self.smooth && !self.point_type.can_be_smooth() {
            return Err(Error::InvalidPoint(
                "smooth can only be set on on-curve points".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ufo_point_creation() {
        let point = UfoPoint::new(100.0, 200.0, UfoPointType::Line);
        assert_eq!(point.x, 100.0);
        assert_eq!(point.y, 200.0);
        assert_eq!(point.point_type, UfoPointType::Line);
        assert!(point.is_on_curve());
    }

    #[test]
    fn test_smooth_flag_validation() {
        let mut point = UfoPoint::line_to(100.0, 200.0).with_smooth(true);
        assert!(point.validate().is_ok());
        assert!(point.is_smooth());

        point.point_type = UfoPointType::OffCurve;
        assert!(point.validate().is_err());
        assert!(!point.is_smooth());

        // the builder refuses to mark control points smooth
        assert!(!UfoPoint::off_curve(0.0, 0.0).with_smooth(true).smooth);
    }

    #[test]
    fn test_builder_pattern() {
        let point = UfoPoint::curve_to(50.0, 75.0)
            .with_name("anchor_top")
            .with_identifier("point_001")
            .with_smooth(true);

        assert_eq!(point.name, Some("anchor_top".to_string()));
        assert_eq!(point.identifier, Some("point_001".to_string()));
        assert!(point.smooth);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_value(UfoPoint::qcurve_to(1.0, 2.0)).unwrap();
        assert_eq!(json, serde_json::json!({ "x": 1.0, "y": 2.0, "type": "qcurve" }));
    }
}
