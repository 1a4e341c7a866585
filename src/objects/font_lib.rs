//! Font level lib dictionary

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::base::{ObjectBase, Observable};
use crate::core::errors::Result;
use crate::notifications::user_info;

pub const VALUE_SET: &str = "Lib.ValueSet";

pub struct FontLib {
    base: ObjectBase,
    values: RefCell<plist::Dictionary>,
}

impl FontLib {
    pub fn new(values: plist::Dictionary) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| Self {
            base: ObjectBase::new("Lib", this.clone()),
            values: RefCell::new(values),
        })
    }

    pub fn get(&self, key: &str) -> Option<plist::Value> {
        self.values.borrow().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<plist::Value>) -> Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value.into());
        self.post_notification(VALUE_SET, Some(user_info([("key", key)])))
            .and(self.set_dirty(true))
    }

    pub fn remove(&self, key: &str) -> Result<Option<plist::Value>> {
        let removed = self.values.borrow_mut().remove(key);
        if removed.is_some() {
            self.set_dirty(true)?;
        }
        Ok(removed)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    pub fn to_dictionary(&self) -> plist::Dictionary {
        self.values.borrow().clone()
    }

    pub(crate) fn replace(&self, values: plist::Dictionary) {
        *self.values.borrow_mut() = values;
        self.base.representations().clear();
    }
}

impl Observable for FontLib {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
