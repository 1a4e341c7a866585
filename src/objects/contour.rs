//! Contour object
//!
//! Owns its points. Every edit ends by marking the contour dirty, which posts
//! `Contour.Changed` and marks the glyph above it dirty.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use kurbo::{BezPath, Rect};

use super::base::{ObjectBase, Observable};
use super::point::{UfoPoint, UfoPointType};
use crate::core::errors::{Error, Result};
use crate::geometry::outline;
use crate::representations::Parameters;

pub struct Contour {
    base: ObjectBase,
    points: RefCell<Vec<UfoPoint>>,
    identifier: RefCell<Option<String>>,
}

impl Contour {
    pub fn new(points: Vec<UfoPoint>) -> Rc<Self> {
        Self::with_identifier(points, None)
    }

    pub fn with_identifier(points: Vec<UfoPoint>, identifier: Option<String>) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| Self {
            base: ObjectBase::new("Contour", this.clone()),
            points: RefCell::new(points),
            identifier: RefCell::new(identifier),
        })
    }

    pub fn identifier(&self) -> Option<String> {
        self.identifier.borrow().clone()
    }

    pub fn set_identifier(&self, identifier: Option<String>) -> Result<()> {
        *self.identifier.borrow_mut() = identifier;
        self.set_dirty(true)
    }

    /// Copy of the points
    pub fn points(&self) -> Vec<UfoPoint> {
        self.points.borrow().clone()
    }

    /// Borrow the points for the duration of `f`. `f` must not edit this
    /// contour.
    pub fn with_points<R>(&self, f: impl FnOnce(&[UfoPoint]) -> R) -> R {
        f(&self.points.borrow())
    }

    pub fn point(&self, index: usize) -> Option<UfoPoint> {
        self.points.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.points.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.borrow().is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.with_points(outline::is_closed)
    }

    /// Apply `edit` to the points, then mark the contour dirty. The borrow
    /// is released before any notification goes out.
    fn edit_points<R>(&self, edit: impl FnOnce(&mut Vec<UfoPoint>) -> Result<R>) -> Result<R> {
        let result = edit(&mut self.points.borrow_mut())?;
        self.set_dirty(true)?;
        Ok(result)
    }

    pub fn append_point(&self, point: UfoPoint) -> Result<()> {
        point.validate()?;
        self.edit_points(|points| {
            points.push(point);
            Ok(())
        })
    }

    pub fn insert_point(&self, index: usize, point: UfoPoint) -> Result<()> {
        point.validate()?;
        self.edit_points(|points| {
            if index > points.len() {
                return Err(Error::PointIndex {
                    index,
                    len: points.len(),
                });
            }
            points.insert(index, point);
            Ok(())
        })
    }

    pub fn set_point(&self, index: usize, point: UfoPoint) -> Result<()> {
        point.validate()?;
        self.edit_points(|points| {
            let len = points.len();
            let slot = points
                .get_mut(index)
                .ok_or(Error::PointIndex { index, len })?;
            *slot = point;
            Ok(())
        })
    }

    pub fn remove_point(&self, index: usize) -> Result<UfoPoint> {
        self.edit_points(|points| {
            if index >= points.len() {
                return Err(Error::PointIndex {
                    index,
                    len: points.len(),
                });
            }
            Ok(points.remove(index))
        })
    }

    pub fn set_points(&self, replacement: Vec<UfoPoint>) -> Result<()> {
        replacement.iter().try_for_each(UfoPoint::validate)?;
        self.edit_points(|points| {
            *points = replacement;
            Ok(())
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.set_points(Vec::new())
    }

    pub fn move_by(&self, dx: f64, dy: f64) -> Result<()> {
        self.edit_points(|points| {
            points.iter_mut().for_each(|point| point.translate(dx, dy));
            Ok(())
        })
    }

    /// Reverse the drawing direction
    pub fn reverse(&self) -> Result<()> {
        self.edit_points(|points| {
            *points = outline::reversed(points);
            Ok(())
        })
    }

    /// Open the contour at its first point, or close it
    pub fn set_closed(&self, closed: bool) -> Result<()> {
        if self.is_closed() == closed || self.is_empty() {
            return Ok(());
        }
        self.edit_points(|points| {
            points[0].point_type = if closed {
                UfoPointType::Line
            } else {
                UfoPointType::Move
            };
            Ok(())
        })
    }

    /// Winding direction through the `contour.clockwise` representation
    pub fn clockwise(&self) -> Result<bool> {
        let clockwise = self.get_representation::<bool>("contour.clockwise", &Parameters::new())?;
        Ok(*clockwise)
    }

    pub fn set_clockwise(&self, clockwise: bool) -> Result<()> {
        if self.with_points(outline::is_clockwise) == clockwise {
            return Ok(());
        }
        self.reverse()
    }

    pub fn bezpath(&self) -> Result<Rc<BezPath>> {
        self.get_representation("contour.bezpath", &Parameters::new())
    }

    pub fn bounds(&self) -> Result<Option<Rect>> {
        let bounds = self.get_representation::<Option<Rect>>("contour.bounds", &Parameters::new())?;
        Ok(*bounds)
    }

    pub fn control_point_bounds(&self) -> Result<Option<Rect>> {
        let bounds = self
            .get_representation::<Option<Rect>>("contour.control_point_bounds", &Parameters::new())?;
        Ok(*bounds)
    }

    pub fn area(&self) -> Result<f64> {
        let area = self.get_representation::<f64>("contour.area", &Parameters::new())?;
        Ok(*area)
    }
}

impl Observable for Contour {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for Contour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contour")
            .field("id", &self.base.id())
            .field("points", &self.points.borrow().len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::NotificationCenter;
    use std::cell::Cell;

    fn triangle() -> Rc<Contour> {
        Contour::new(vec![
            UfoPoint::line_to(0.0, 0.0),
            UfoPoint::line_to(50.0, 100.0),
            UfoPoint::line_to(100.0, 0.0),
        ])
    }

    #[test]
    fn edits_post_changed() {
        let center = Rc::new(NotificationCenter::new());
        let contour = triangle();
        contour.set_dispatcher(Some(&center)).unwrap();

        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        contour
            .add_observer(contour.id(), "count", "Contour.Changed", move |_| {
                seen.set(seen.get() + 1);
                Ok(())
            })
            .unwrap();

        contour.append_point(UfoPoint::line_to(0.0, 50.0)).unwrap();
        contour.move_by(10.0, 0.0).unwrap();
        contour.remove_point(3).unwrap();
        assert_eq!(count.get(), 3);
        assert!(contour.is_dirty());
        assert_eq!(contour.point(0), Some(UfoPoint::line_to(10.0, 0.0)));
    }

    #[test]
    fn out_of_range_edits_fail_without_posting() {
        let contour = triangle();
        let error = contour.set_point(7, UfoPoint::line_to(0.0, 0.0)).unwrap_err();
        assert!(matches!(error, Error::PointIndex { index: 7, len: 3 }));
        assert!(contour.insert_point(4, UfoPoint::line_to(0.0, 0.0)).is_err());
        assert!(!contour.is_dirty());
    }

    #[test]
    fn smooth_control_points_are_rejected() {
        let contour = triangle();
        let mut control = UfoPoint::off_curve(25.0, 50.0);
        control.smooth = true;
        assert!(matches!(
            contour.append_point(control.clone()),
            Err(Error::InvalidPoint(_))
        ));
        assert!(contour.set_points(vec![UfoPoint::line_to(0.0, 0.0), control]).is_err());
        assert_eq!(contour.len(), 3);
        assert!(!contour.is_dirty());
    }

    #[test]
    fn open_and_close() {
        let contour = triangle();
        assert!(contour.is_closed());
        contour.set_closed(false).unwrap();
        assert!(!contour.is_closed());
        assert_eq!(contour.point(0).map(|point| point.point_type), Some(UfoPointType::Move));
        contour.set_closed(true).unwrap();
        assert!(contour.is_closed());
    }

    #[test]
    fn set_clockwise_reverses_only_when_needed() {
        let contour = triangle();
        let before = contour.points();
        contour.set_clockwise(true).unwrap();
        assert_eq!(contour.points(), before);
        contour.set_clockwise(false).unwrap();
        assert_ne!(contour.points(), before);
        assert!(!contour.with_points(outline::is_clockwise));
    }
}
