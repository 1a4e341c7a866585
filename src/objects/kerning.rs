//! Kerning pairs

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use super::base::{ObjectBase, Observable};
use crate::core::errors::Result;
use crate::notifications::user_info;

pub const PAIR_SET: &str = "Kerning.PairSet";
pub const PAIR_DELETED: &str = "Kerning.PairDeleted";

/// `first -> second -> value`, the kerning.plist layout
pub type NestedKerning = BTreeMap<String, BTreeMap<String, f64>>;

pub struct Kerning {
    base: ObjectBase,
    pairs: RefCell<BTreeMap<(String, String), f64>>,
}

impl Kerning {
    pub fn new() -> Rc<Self> {
        Self::from_nested(NestedKerning::new())
    }

    pub fn from_nested(nested: NestedKerning) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| Self {
            base: ObjectBase::new("Kerning", this.clone()),
            pairs: RefCell::new(flatten(nested)),
        })
    }

    pub fn get(&self, first: &str, second: &str) -> Option<f64> {
        self.pairs
            .borrow()
            .get(&(first.to_string(), second.to_string()))
            .copied()
    }

    pub fn set(&self, first: &str, second: &str, value: f64) -> Result<()> {
        let old = self
            .pairs
            .borrow_mut()
            .insert((first.to_string(), second.to_string()), value);
        if old == Some(value) {
            return Ok(());
        }
        let mut info = user_info([("first", first), ("second", second)]);
        info.insert("oldValue".into(), old.into());
        info.insert("newValue".into(), value.into());
        let posted = self.post_notification(PAIR_SET, Some(info));
        posted.and(self.set_dirty(true))
    }

    pub fn remove(&self, first: &str, second: &str) -> Result<Option<f64>> {
        let removed = self
            .pairs
            .borrow_mut()
            .remove(&(first.to_string(), second.to_string()));
        if let Some(value) = removed {
            let mut info = user_info([("first", first), ("second", second)]);
            info.insert("oldValue".into(), value.into());
            self.post_notification(PAIR_DELETED, Some(info))
                .and(self.set_dirty(true))?;
        }
        Ok(removed)
    }

    pub fn clear(&self) -> Result<()> {
        if self.pairs.borrow().is_empty() {
            return Ok(());
        }
        self.pairs.borrow_mut().clear();
        self.set_dirty(true)
    }

    pub fn pairs(&self) -> Vec<((String, String), f64)> {
        self.pairs
            .borrow()
            .iter()
            .map(|(pair, value)| (pair.clone(), *value))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.borrow().is_empty()
    }

    pub fn to_nested(&self) -> NestedKerning {
        let mut nested = NestedKerning::new();
        for ((first, second), value) in self.pairs.borrow().iter() {
            nested
                .entry(first.clone())
                .or_default()
                .insert(second.clone(), *value);
        }
        nested
    }

    /// Swap in data read from disk without posting
    pub(crate) fn replace(&self, nested: NestedKerning) {
        *self.pairs.borrow_mut() = flatten(nested);
        self.base.representations().clear();
    }
}

fn flatten(nested: NestedKerning) -> BTreeMap<(String, String), f64> {
    nested
        .into_iter()
        .flat_map(|(first, seconds)| {
            seconds
                .into_iter()
                .map(move |(second, value)| ((first.clone(), second), value))
        })
        .collect()
}

impl Observable for Kerning {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
