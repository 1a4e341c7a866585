//! Glyph groups

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde_json::Value;

use super::base::{ObjectBase, Observable};
use crate::core::errors::Result;
use crate::notifications::user_info;

pub const GROUP_SET: &str = "Groups.GroupSet";

pub type GroupMap = BTreeMap<String, Vec<String>>;

pub struct Groups {
    base: ObjectBase,
    groups: RefCell<GroupMap>,
}

impl Groups {
    pub fn new() -> Rc<Self> {
        Self::from_map(GroupMap::new())
    }

    pub fn from_map(groups: GroupMap) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| Self {
            base: ObjectBase::new("Groups", this.clone()),
            groups: RefCell::new(groups),
        })
    }

    pub fn get(&self, name: &str) -> Option<Vec<String>> {
        self.groups.borrow().get(name).cloned()
    }

    pub fn set(&self, name: &str, members: Vec<String>) -> Result<()> {
        let new_value: Value = members.iter().map(|member| Value::from(member.as_str())).collect();
        let old = self.groups.borrow_mut().insert(name.to_string(), members);
        let mut info = user_info([("name", name)]);
        info.insert("newValue".into(), new_value);
        if let Some(old) = old {
            info.insert("oldValue".into(), old.into());
        }
        self.post_notification(GROUP_SET, Some(info))
            .and(self.set_dirty(true))
    }

    pub fn remove(&self, name: &str) -> Result<Option<Vec<String>>> {
        let removed = self.groups.borrow_mut().remove(name);
        if removed.is_some() {
            self.set_dirty(true)?;
        }
        Ok(removed)
    }

    pub fn names(&self) -> Vec<String> {
        self.groups.borrow().keys().cloned().collect()
    }

    /// Groups that list `glyph` as a member
    pub fn groups_containing(&self, glyph: &str) -> Vec<String> {
        self.groups
            .borrow()
            .iter()
            .filter(|(_, members)| members.iter().any(|member| member == glyph))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.borrow().is_empty()
    }

    pub fn to_map(&self) -> GroupMap {
        self.groups.borrow().clone()
    }

    pub(crate) fn replace(&self, groups: GroupMap) {
        *self.groups.borrow_mut() = groups;
        self.base.representations().clear();
    }
}

impl Observable for Groups {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
