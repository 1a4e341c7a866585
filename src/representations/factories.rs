//! Built-in geometry representations
//!
//! Glyph level representations are computed from the glyph's own contours.
//! Components are left out since they depend on other glyphs, whose changes
//! do not reach this glyph's cache.

use kurbo::{BezPath, Point, Rect, Shape};

use super::parameters::Parameters;
use super::registry::RepresentationRegistry;
use crate::core::errors::Result;
use crate::geometry::outline;
use crate::objects::{Contour, Glyph, Observable};

/// Default flattening tolerance in font units
pub const DEFAULT_TOLERANCE: f64 = 0.25;

pub(crate) fn register_builtin_factories(registry: &RepresentationRegistry) -> Result<()> {
    registry.add_representation_factory::<Contour, _, _>("contour.bezpath", contour_bezpath)?;
    registry.add_representation_factory::<Contour, _, _>("contour.bounds", contour_bounds)?;
    registry.add_representation_factory::<Contour, _, _>(
        "contour.control_point_bounds",
        contour_control_point_bounds,
    )?;
    registry.add_representation_factory::<Contour, _, _>("contour.area", contour_area)?;
    registry.add_representation_factory::<Contour, _, _>("contour.clockwise", contour_clockwise)?;
    registry.add_representation_factory::<Contour, _, _>("contour.flattened", contour_flattened)?;

    registry.add_representation_factory::<Glyph, _, _>("glyph.bezpaths", glyph_bezpaths)?;
    registry.add_representation_factory::<Glyph, _, _>("glyph.bounds", glyph_bounds)?;
    registry.add_representation_factory::<Glyph, _, _>(
        "glyph.control_point_bounds",
        glyph_control_point_bounds,
    )?;
    registry.add_representation_factory::<Glyph, _, _>("glyph.area", glyph_area)?;
    Ok(())
}

fn contour_bezpath(
    contour: &Contour,
    _context: Option<&dyn Observable>,
    _parameters: &Parameters,
) -> anyhow::Result<BezPath> {
    Ok(contour.with_points(outline::to_bezpath))
}

fn contour_bounds(
    contour: &Contour,
    _context: Option<&dyn Observable>,
    _parameters: &Parameters,
) -> anyhow::Result<Option<Rect>> {
    if contour.is_empty() {
        return Ok(None);
    }
    Ok(Some(contour.with_points(outline::to_bezpath).bounding_box()))
}

fn contour_control_point_bounds(
    contour: &Contour,
    _context: Option<&dyn Observable>,
    _parameters: &Parameters,
) -> anyhow::Result<Option<Rect>> {
    Ok(contour.with_points(outline::control_bounds))
}

fn contour_area(
    contour: &Contour,
    _context: Option<&dyn Observable>,
    _parameters: &Parameters,
) -> anyhow::Result<f64> {
    if !contour.is_closed() {
        return Ok(0.0);
    }
    Ok(contour.with_points(outline::to_bezpath).area().abs())
}

fn contour_clockwise(
    contour: &Contour,
    _context: Option<&dyn Observable>,
    _parameters: &Parameters,
) -> anyhow::Result<bool> {
    Ok(contour.with_points(outline::is_clockwise))
}

fn contour_flattened(
    contour: &Contour,
    _context: Option<&dyn Observable>,
    parameters: &Parameters,
) -> anyhow::Result<Vec<Point>> {
    let tolerance = parameters.f64_or("tolerance", DEFAULT_TOLERANCE);
    if !(tolerance > 0.0) {
        anyhow::bail!("tolerance must be positive, got {tolerance}");
    }
    let path = contour.with_points(outline::to_bezpath);
    let mut points = Vec::new();
    kurbo::flatten(path.iter(), tolerance, |element| match element {
        kurbo::PathEl::MoveTo(point) | kurbo::PathEl::LineTo(point) => points.push(point),
        _ => {}
    });
    Ok(points)
}

fn glyph_bezpaths(
    glyph: &Glyph,
    _context: Option<&dyn Observable>,
    _parameters: &Parameters,
) -> anyhow::Result<Vec<BezPath>> {
    Ok(glyph
        .contours()
        .iter()
        .map(|contour| contour.with_points(outline::to_bezpath))
        .collect())
}

fn union(bounds: impl Iterator<Item = Rect>) -> Option<Rect> {
    bounds.reduce(|total, rect| total.union(rect))
}

fn glyph_bounds(
    glyph: &Glyph,
    _context: Option<&dyn Observable>,
    _parameters: &Parameters,
) -> anyhow::Result<Option<Rect>> {
    Ok(union(
        glyph
            .contours()
            .iter()
            .filter(|contour| !contour.is_empty())
            .map(|contour| contour.with_points(outline::to_bezpath).bounding_box()),
    ))
}

fn glyph_control_point_bounds(
    glyph: &Glyph,
    _context: Option<&dyn Observable>,
    _parameters: &Parameters,
) -> anyhow::Result<Option<Rect>> {
    Ok(union(
        glyph
            .contours()
            .iter()
            .filter_map(|contour| contour.with_points(outline::control_bounds)),
    ))
}

/// Net area: counters wound against the outer contour subtract
fn glyph_area(
    glyph: &Glyph,
    _context: Option<&dyn Observable>,
    _parameters: &Parameters,
) -> anyhow::Result<f64> {
    let total: f64 = glyph
        .contours()
        .iter()
        .filter(|contour| contour.is_closed())
        .map(|contour| contour.with_points(outline::to_bezpath).area())
        .sum();
    Ok(total.abs())
}
