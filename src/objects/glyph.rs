//! Glyph object
//!
//! A glyph owns its contours and components. Contours are observable
//! children; components are plain values.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use kurbo::{BezPath, Rect};
use serde_json::Value;

use super::base::{adopt, detach, hold_all, ObjectBase, Observable};
use super::component::Component;
use super::contour::Contour;
use super::font::Font;
use crate::core::errors::{Error, Result};
use crate::notifications::user_info;
use crate::representations::Parameters;

pub const NAME_CHANGED: &str = "Glyph.NameChanged";
pub const UNICODES_CHANGED: &str = "Glyph.UnicodesChanged";
pub const WIDTH_CHANGED: &str = "Glyph.WidthChanged";

pub struct Glyph {
    base: ObjectBase,
    name: RefCell<String>,
    width: Cell<f64>,
    height: Cell<f64>,
    unicodes: RefCell<Vec<char>>,
    contours: RefCell<Vec<Rc<Contour>>>,
    components: RefCell<Vec<Component>>,
}

impl Glyph {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| Self {
            base: ObjectBase::new("Glyph", this.clone()),
            name: RefCell::new(name.into()),
            width: Cell::new(0.0),
            height: Cell::new(0.0),
            unicodes: RefCell::new(Vec::new()),
            contours: RefCell::new(Vec::new()),
            components: RefCell::new(Vec::new()),
        })
    }

    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    /// Rename the glyph. Fails when the containing font already has a glyph
    /// called `name`; otherwise the font is rekeyed before anything is posted.
    pub fn set_name(&self, name: &str) -> Result<()> {
        let old = self.name();
        if old == name {
            return Ok(());
        }
        let parent = self.parent();
        let font = parent
            .as_ref()
            .and_then(|font| font.as_any().downcast_ref::<Font>());
        if let Some(font) = font {
            font.validate_new_glyph_name(name)?;
        }
        *self.name.borrow_mut() = name.to_string();
        if let Some(font) = font {
            font.rekey_glyph(&old, name);
        }
        let posted = self.post_notification(
            NAME_CHANGED,
            Some(user_info([("oldValue", old), ("newValue", name.to_string())])),
        );
        let dirtied = self.set_dirty(true);
        posted.and(dirtied)
    }

    pub fn width(&self) -> f64 {
        self.width.get()
    }

    pub fn set_width(&self, width: f64) -> Result<()> {
        let old = self.width.replace(width);
        if old == width {
            return Ok(());
        }
        let posted = self.post_notification(
            WIDTH_CHANGED,
            Some(user_info([("oldValue", old), ("newValue", width)])),
        );
        posted.and(self.set_dirty(true))
    }

    pub fn height(&self) -> f64 {
        self.height.get()
    }

    pub fn set_height(&self, height: f64) -> Result<()> {
        if self.height.replace(height) == height {
            return Ok(());
        }
        self.set_dirty(true)
    }

    pub fn unicodes(&self) -> Vec<char> {
        self.unicodes.borrow().clone()
    }

    /// The primary code point
    pub fn unicode(&self) -> Option<char> {
        self.unicodes.borrow().first().copied()
    }

    pub fn set_unicodes(&self, unicodes: Vec<char>) -> Result<()> {
        let old = self.unicodes.replace(unicodes.clone());
        if old == unicodes {
            return Ok(());
        }
        let as_hex = |chars: &[char]| -> Value {
            chars
                .iter()
                .map(|c| Value::from(format!("{:04X}", *c as u32)))
                .collect()
        };
        let posted = self.post_notification(
            UNICODES_CHANGED,
            Some(user_info([("oldValue", as_hex(&old)), ("newValue", as_hex(&unicodes))])),
        );
        posted.and(self.set_dirty(true))
    }

    pub fn contours(&self) -> Vec<Rc<Contour>> {
        self.contours.borrow().clone()
    }

    pub fn contour(&self, index: usize) -> Option<Rc<Contour>> {
        self.contours.borrow().get(index).cloned()
    }

    pub fn contour_count(&self) -> usize {
        self.contours.borrow().len()
    }

    pub fn append_contour(&self, contour: Rc<Contour>) -> Result<()> {
        let index = self.contour_count();
        self.insert_contour(index, contour)
    }

    pub fn insert_contour(&self, index: usize, contour: Rc<Contour>) -> Result<()> {
        let len = self.contour_count();
        if index > len {
            return Err(Error::ContourIndex { index, len });
        }
        adopt(self, contour.as_ref())?;
        self.contours.borrow_mut().insert(index, contour);
        self.set_dirty(true)
    }

    pub fn remove_contour(&self, index: usize) -> Result<Rc<Contour>> {
        let len = self.contour_count();
        if index >= len {
            return Err(Error::ContourIndex { index, len });
        }
        let contour = self.contours.borrow_mut().remove(index);
        detach(contour.as_ref())?;
        self.set_dirty(true)?;
        Ok(contour)
    }

    pub fn clear_contours(&self) -> Result<()> {
        let removed = std::mem::take(&mut *self.contours.borrow_mut());
        for contour in &removed {
            detach(contour.as_ref())?;
        }
        self.set_dirty(true)
    }

    pub fn components(&self) -> Vec<Component> {
        self.components.borrow().clone()
    }

    pub fn append_component(&self, component: Component) -> Result<()> {
        self.components.borrow_mut().push(component);
        self.set_dirty(true)
    }

    pub fn remove_component(&self, index: usize) -> Result<Option<Component>> {
        let removed = {
            let mut components = self.components.borrow_mut();
            (index < components.len()).then(|| components.remove(index))
        };
        if removed.is_some() {
            self.set_dirty(true)?;
        }
        Ok(removed)
    }

    pub fn set_components(&self, components: Vec<Component>) -> Result<()> {
        *self.components.borrow_mut() = components;
        self.set_dirty(true)
    }

    /// Move every contour and component. Observers see one notification per
    /// changed object.
    pub fn move_by(&self, dx: f64, dy: f64) -> Result<()> {
        hold_all(self, || {
            for contour in self.contours() {
                contour.move_by(dx, dy)?;
            }
            for component in self.components.borrow_mut().iter_mut() {
                component.translate(dx, dy);
            }
            self.set_dirty(true)
        })
    }

    /// Replace the outline and metrics without posting anything. Used when
    /// glyph data is (re)loaded from disk.
    pub(crate) fn replace_data(
        &self,
        width: f64,
        height: f64,
        unicodes: Vec<char>,
        contours: Vec<Rc<Contour>>,
        components: Vec<Component>,
    ) -> Result<()> {
        self.width.set(width);
        self.height.set(height);
        *self.unicodes.borrow_mut() = unicodes;
        *self.components.borrow_mut() = components;
        let previous = std::mem::take(&mut *self.contours.borrow_mut());
        for contour in &previous {
            detach(contour.as_ref())?;
        }
        for contour in &contours {
            adopt(self, contour.as_ref())?;
            contour.base().set_dirty_flag(false);
        }
        *self.contours.borrow_mut() = contours;
        self.base().representations().clear();
        Ok(())
    }

    pub(crate) fn mark_clean(&self) {
        self.base().set_dirty_flag(false);
        for contour in self.contours() {
            contour.base().set_dirty_flag(false);
        }
    }

    pub fn bezpaths(&self) -> Result<Rc<Vec<BezPath>>> {
        self.get_representation("glyph.bezpaths", &Parameters::new())
    }

    pub fn bounds(&self) -> Result<Option<Rect>> {
        let bounds = self.get_representation::<Option<Rect>>("glyph.bounds", &Parameters::new())?;
        Ok(*bounds)
    }

    pub fn control_point_bounds(&self) -> Result<Option<Rect>> {
        let bounds = self
            .get_representation::<Option<Rect>>("glyph.control_point_bounds", &Parameters::new())?;
        Ok(*bounds)
    }

    pub fn area(&self) -> Result<f64> {
        let area = self.get_representation::<f64>("glyph.area", &Parameters::new())?;
        Ok(*area)
    }
}

impl Observable for Glyph {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn children(&self) -> Vec<Rc<dyn Observable>> {
        self.contours()
            .into_iter()
            .map(|contour| contour as Rc<dyn Observable>)
            .collect()
    }
}

impl std::fmt::Debug for Glyph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Glyph")
            .field("name", &*self.name.borrow())
            .field("width", &self.width.get())
            .field("contours", &self.contour_count())
            .field("components", &self.components.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{Notification, NotificationCenter};
    use crate::objects::point::UfoPoint;

    fn square(size: f64) -> Rc<Contour> {
        Contour::new(vec![
            UfoPoint::line_to(0.0, 0.0),
            UfoPoint::line_to(0.0, size),
            UfoPoint::line_to(size, size),
            UfoPoint::line_to(size, 0.0),
        ])
    }

    fn attached_glyph() -> (Rc<NotificationCenter>, Rc<Glyph>) {
        let center = Rc::new(NotificationCenter::new());
        let glyph = Glyph::new("A");
        glyph.set_dispatcher(Some(&center)).unwrap();
        (center, glyph)
    }

    fn record(glyph: &Glyph, event: &str) -> Rc<RefCell<Vec<Notification>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        glyph
            .add_observer(glyph.id(), event, event, move |notification| {
                sink.borrow_mut().push(notification.clone());
                Ok(())
            })
            .unwrap();
        log
    }

    #[test]
    fn contour_edits_reach_the_glyph() {
        let (_center, glyph) = attached_glyph();
        let contour = square(100.0);
        glyph.append_contour(Rc::clone(&contour)).unwrap();
        glyph.base().set_dirty_flag(false);
        let changes = record(&glyph, "Glyph.Changed");

        contour.move_by(5.0, 5.0).unwrap();
        assert!(glyph.is_dirty());
        assert_eq!(changes.borrow().len(), 1);
        assert_eq!(contour.dispatcher().map(|c| Rc::as_ptr(&c)), glyph.dispatcher().map(|c| Rc::as_ptr(&c)));
    }

    #[test]
    fn width_change_carries_old_and_new_value() {
        let (_center, glyph) = attached_glyph();
        let widths = record(&glyph, WIDTH_CHANGED);
        glyph.set_width(500.0).unwrap();
        glyph.set_width(500.0).unwrap();

        let widths = widths.borrow();
        assert_eq!(widths.len(), 1);
        assert_eq!(widths[0].get("oldValue"), Some(&Value::from(0.0)));
        assert_eq!(widths[0].get("newValue"), Some(&Value::from(500.0)));
    }

    #[test]
    fn unicodes_are_reported_as_hex() {
        let (_center, glyph) = attached_glyph();
        let unicodes = record(&glyph, UNICODES_CHANGED);
        glyph.set_unicodes(vec!['A', 'a']).unwrap();
        assert_eq!(glyph.unicode(), Some('A'));
        assert_eq!(
            unicodes.borrow()[0].get("newValue"),
            Some(&serde_json::json!(["0041", "0061"]))
        );
    }

    #[test]
    fn move_by_is_one_notification_per_object() {
        let (_center, glyph) = attached_glyph();
        glyph.append_contour(square(10.0)).unwrap();
        glyph.append_contour(square(20.0)).unwrap();
        glyph.append_component(Component::new("B")).unwrap();
        let changes = record(&glyph, "Glyph.Changed");

        glyph.move_by(10.0, 0.0).unwrap();
        assert_eq!(changes.borrow().len(), 1);
        assert_eq!(glyph.components()[0].transform[4], 10.0);
        assert_eq!(glyph.contour(1).and_then(|c| c.point(0)), Some(UfoPoint::line_to(10.0, 0.0)));
    }

    #[test]
    fn removed_contour_is_detached() {
        let (center, glyph) = attached_glyph();
        glyph.append_contour(square(10.0)).unwrap();
        let removed = glyph.remove_contour(0).unwrap();
        assert!(removed.parent().is_none());
        assert!(removed.dispatcher().is_none());
        assert!(!center.has_observer(removed.id(), "Contour.Changed", Some(removed.id())));
        assert!(matches!(
            glyph.remove_contour(0),
            Err(Error::ContourIndex { index: 0, len: 0 })
        ));
    }

    #[test]
    fn bounds_follow_outline_edits() {
        let (_center, glyph) = attached_glyph();
        let contour = square(100.0);
        glyph.append_contour(Rc::clone(&contour)).unwrap();
        assert_eq!(glyph.bounds().unwrap(), Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert!(glyph.has_cached_representation("glyph.bounds", &Parameters::new()));

        contour.move_by(50.0, 0.0).unwrap();
        assert!(!glyph.has_cached_representation("glyph.bounds", &Parameters::new()));
        assert_eq!(glyph.bounds().unwrap(), Some(Rect::new(50.0, 0.0, 150.0, 100.0)));
    }
}
