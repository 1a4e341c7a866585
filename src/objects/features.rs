//! OpenType feature source

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::base::{ObjectBase, Observable};
use crate::core::errors::Result;

pub const TEXT_CHANGED: &str = "Features.TextChanged";

pub struct Features {
    base: ObjectBase,
    text: RefCell<String>,
}

impl Features {
    pub fn new(text: impl Into<String>) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| Self {
            base: ObjectBase::new("Features", this.clone()),
            text: RefCell::new(text.into()),
        })
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn set_text(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        if *self.text.borrow() == text {
            return Ok(());
        }
        *self.text.borrow_mut() = text;
        self.post_notification(TEXT_CHANGED, None)
            .and(self.set_dirty(true))
    }

    pub fn is_empty(&self) -> bool {
        self.text.borrow().is_empty()
    }

    pub(crate) fn replace(&self, text: String) {
        *self.text.borrow_mut() = text;
        self.base.representations().clear();
    }
}

impl Observable for Features {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
