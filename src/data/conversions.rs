//! UFO format conversion utilities
//!
//! Conversion between the observable object graph and norad's UFO types.
//! Loading goes through `replace_*` methods that post nothing; writing
//! patches existing norad glyphs so data this crate does not model (anchors,
//! guidelines, glyph libs) survives a save.

use std::rc::Rc;

use norad::{AffineTransform, ContourPoint, Identifier, Name, PointType};

use crate::core::errors::{Error, Result};
use crate::objects::groups::GroupMap;
use crate::objects::kerning::NestedKerning;
use crate::objects::{Component, Contour, Glyph, UfoPoint, UfoPointType};

/// Parse a glyph, group or kerning name
pub fn parse_name(name: &str) -> Result<Name> {
    name.parse::<Name>()
        .map_err(|_| Error::InvalidName(name.to_string()))
}

fn parse_identifier(identifier: Option<&String>) -> Option<Identifier> {
    identifier.and_then(|identifier| Identifier::new(identifier).ok())
}

impl UfoPointType {
    pub fn from_norad_point_type(norad_type: &PointType) -> Self {
        match norad_type {
            PointType::Move => UfoPointType::Move,
            PointType::Line => UfoPointType::Line,
            PointType::OffCurve => UfoPointType::OffCurve,
            PointType::Curve => UfoPointType::Curve,
            PointType::QCurve => UfoPointType::QCurve,
        }
    }

    pub fn to_norad_point_type(&self) -> PointType {
        match self {
            UfoPointType::Move => PointType::Move,
            UfoPointType::Line => PointType::Line,
            UfoPointType::OffCurve => PointType::OffCurve,
            UfoPointType::Curve => PointType::Curve,
            UfoPointType::QCurve => PointType::QCurve,
        }
    }
}

impl UfoPoint {
    pub fn from_norad_point(norad_point: &ContourPoint) -> Self {
        Self {
            x: norad_point.x,
            y: norad_point.y,
            point_type: UfoPointType::from_norad_point_type(&norad_point.typ),
            smooth: norad_point.smooth,
            name: norad_point.name.as_ref().map(|name| name.to_string()),
            identifier: norad_point
                .identifier()
                .map(|identifier| identifier.as_str().to_string()),
        }
    }

    /// Point names that are not valid UFO names are dropped
    pub fn to_norad_point(&self) -> ContourPoint {
        ContourPoint::new(
            self.x,
            self.y,
            self.point_type.to_norad_point_type(),
            self.smooth,
            self.name.as_deref().and_then(|name| parse_name(name).ok()),
            parse_identifier(self.identifier.as_ref()),
        )
    }
}

impl Contour {
    pub fn from_norad_contour(norad_contour: &norad::Contour) -> Rc<Self> {
        let points = norad_contour
            .points
            .iter()
            .map(UfoPoint::from_norad_point)
            .collect();
        let identifier = norad_contour
            .identifier()
            .map(|identifier| identifier.as_str().to_string());
        Contour::with_identifier(points, identifier)
    }

    pub fn to_norad_contour(&self) -> norad::Contour {
        let points = self.with_points(|points| points.iter().map(UfoPoint::to_norad_point).collect());
        norad::Contour::new(points, parse_identifier(self.identifier().as_ref()))
    }
}

impl Component {
    pub fn from_norad_component(norad_component: &norad::Component) -> Self {
        let transform = &norad_component.transform;
        Self {
            base_glyph: norad_component.base.to_string(),
            transform: [
                transform.x_scale,
                transform.xy_scale,
                transform.yx_scale,
                transform.y_scale,
                transform.x_offset,
                transform.y_offset,
            ],
            identifier: norad_component
                .identifier()
                .map(|identifier| identifier.as_str().to_string()),
        }
    }

    pub fn to_norad_component(&self) -> Result<norad::Component> {
        let transform = AffineTransform {
            x_scale: self.transform[0],
            xy_scale: self.transform[1],
            yx_scale: self.transform[2],
            y_scale: self.transform[3],
            x_offset: self.transform[4],
            y_offset: self.transform[5],
        };
        Ok(norad::Component::new(
            parse_name(&self.base_glyph)?,
            transform,
            parse_identifier(self.identifier.as_ref()),
        ))
    }
}

impl Glyph {
    /// Build a detached glyph from norad data. Nothing is posted and the
    /// glyph starts clean.
    pub fn from_norad_glyph(name: &str, norad_glyph: &norad::Glyph) -> Result<Rc<Self>> {
        let glyph = Glyph::new(name);
        glyph.load_norad_glyph(norad_glyph)?;
        Ok(glyph)
    }

    /// Replace this glyph's data with `norad_glyph` without posting
    pub(crate) fn load_norad_glyph(&self, norad_glyph: &norad::Glyph) -> Result<()> {
        let contours = norad_glyph
            .contours
            .iter()
            .map(Contour::from_norad_contour)
            .collect();
        let components = norad_glyph
            .components
            .iter()
            .map(Component::from_norad_component)
            .collect();
        self.replace_data(
            norad_glyph.width,
            norad_glyph.height,
            norad_glyph.codepoints.iter().collect(),
            contours,
            components,
        )?;
        self.mark_clean();
        Ok(())
    }

    pub fn to_norad_glyph(&self) -> Result<norad::Glyph> {
        let mut norad_glyph = norad::Glyph::new(&self.name());
        self.write_into(&mut norad_glyph)?;
        Ok(norad_glyph)
    }

    /// Overwrite the parts of `norad_glyph` this crate models
    pub(crate) fn write_into(&self, norad_glyph: &mut norad::Glyph) -> Result<()> {
        norad_glyph.width = self.width();
        norad_glyph.height = self.height();
        norad_glyph.codepoints = Default::default();
        for codepoint in self.unicodes() {
            norad_glyph.codepoints.insert(codepoint);
        }
        norad_glyph.contours = self
            .contours()
            .iter()
            .map(|contour| contour.to_norad_contour())
            .collect();
        norad_glyph.components = self
            .components()
            .iter()
            .map(Component::to_norad_component)
            .collect::<Result<_>>()?;
        Ok(())
    }
}

pub fn kerning_to_norad(kerning: &NestedKerning) -> Result<norad::Kerning> {
    kerning
        .iter()
        .map(|(first, seconds)| {
            let seconds = seconds
                .iter()
                .map(|(second, value)| Ok((parse_name(second)?, *value)))
                .collect::<Result<_>>()?;
            Ok((parse_name(first)?, seconds))
        })
        .collect()
}

pub fn groups_to_norad(groups: &GroupMap) -> Result<norad::Groups> {
    groups
        .iter()
        .map(|(name, members)| {
            let members = members
                .iter()
                .map(|member| parse_name(member))
                .collect::<Result<_>>()?;
            Ok((parse_name(name)?, members))
        })
        .collect()
}
