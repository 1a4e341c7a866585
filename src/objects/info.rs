//! Font info
//!
//! Wraps norad's `FontInfo` so fields this crate never touches survive a
//! load/save cycle. Common fields get accessors; anything else is edited
//! through [`Info::update`].

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use norad::fontinfo::NonNegativeIntegerOrFloat;

use super::base::{ObjectBase, Observable};
use crate::core::errors::Result;

pub struct Info {
    base: ObjectBase,
    data: RefCell<norad::FontInfo>,
}

impl Info {
    pub fn new(data: norad::FontInfo) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| Self {
            base: ObjectBase::new("Info", this.clone()),
            data: RefCell::new(data),
        })
    }

    /// Copy of the underlying record
    pub fn data(&self) -> norad::FontInfo {
        self.data.borrow().clone()
    }

    /// Edit the record in place and mark the info dirty if anything changed
    pub fn update(&self, edit: impl FnOnce(&mut norad::FontInfo)) -> Result<()> {
        let changed = {
            let mut data = self.data.borrow_mut();
            let before = data.clone();
            edit(&mut data);
            *data != before
        };
        if changed {
            self.set_dirty(true)?;
        }
        Ok(())
    }

    pub fn family_name(&self) -> Option<String> {
        self.data.borrow().family_name.clone()
    }

    pub fn set_family_name(&self, name: Option<String>) -> Result<()> {
        self.update(|info| info.family_name = name)
    }

    pub fn style_name(&self) -> Option<String> {
        self.data.borrow().style_name.clone()
    }

    pub fn set_style_name(&self, name: Option<String>) -> Result<()> {
        self.update(|info| info.style_name = name)
    }

    /// "Family Style", or `None` when neither is set
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<String> = [self.family_name(), self.style_name()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    pub fn units_per_em(&self) -> Option<f64> {
        self.data
            .borrow()
            .units_per_em
            .and_then(|value| value.to_string().parse().ok())
    }

    /// Negative values are ignored, as UFO requires a non-negative UPM
    pub fn set_units_per_em(&self, units_per_em: f64) -> Result<()> {
        match NonNegativeIntegerOrFloat::new(units_per_em) {
            Some(value) => self.update(|info| info.units_per_em = Some(value)),
            None => Ok(()),
        }
    }

    pub fn ascender(&self) -> Option<f64> {
        self.data.borrow().ascender
    }

    pub fn set_ascender(&self, ascender: Option<f64>) -> Result<()> {
        self.update(|info| info.ascender = ascender)
    }

    pub fn descender(&self) -> Option<f64> {
        self.data.borrow().descender
    }

    pub fn set_descender(&self, descender: Option<f64>) -> Result<()> {
        self.update(|info| info.descender = descender)
    }

    pub fn x_height(&self) -> Option<f64> {
        self.data.borrow().x_height
    }

    pub fn cap_height(&self) -> Option<f64> {
        self.data.borrow().cap_height
    }

    pub(crate) fn replace(&self, data: norad::FontInfo) {
        *self.data.borrow_mut() = data;
        self.base.representations().clear();
    }
}

impl Observable for Info {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
