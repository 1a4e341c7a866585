//! Font object
//!
//! The font owns the notification center for its object graph and everything
//! loaded from its UFO. Font level resources and glyphs are read lazily, on
//! first access, and every read is snapshotted so external edits to the same
//! files can be detected later. Saving writes the loaded data over the full
//! UFO through norad.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::base::{adopt, detach, hold_all, ObjectBase, Observable};
use super::features::Features;
use super::font_lib::FontLib;
use super::glyph::Glyph;
use super::groups::{GroupMap, Groups};
use super::info::Info;
use super::kerning::{Kerning, NestedKerning};
use crate::core::errors::{Error, FileContext, Result};
use crate::data::conversions::{groups_to_norad, kerning_to_norad, parse_name};
use crate::data::UfoDirectory;
use crate::external::{
    DiskSnapshot, ExternalChange, ExternalChangeRecord, ExternalChangeReport, ResourceId,
    ResourceReport, ResourceState, ResourceStore,
};
use crate::notifications::{user_info, NotificationCenter};
use crate::representations::RepresentationRegistry;

pub const GLYPH_ADDED: &str = "Font.GlyphAdded";
pub const GLYPH_DELETED: &str = "Font.GlyphDeleted";
pub const RELOADED_GLYPHS: &str = "Font.ReloadedGlyphs";

/// Library side configuration for a font's object graph
#[derive(Debug, Clone, Default)]
pub struct FontOptions {
    /// Reject duplicate observer registrations instead of ignoring them
    pub strict_registration: bool,
    /// Resources loaded right away when the font is opened
    pub preload: Vec<ResourceId>,
    /// Factory registry for the graph, the shared one when `None`
    pub registry: Option<Arc<RepresentationRegistry>>,
}

pub struct Font {
    base: ObjectBase,
    center: Rc<NotificationCenter>,
    path: RefCell<Option<PathBuf>>,
    store: RefCell<Option<Rc<UfoDirectory>>>,
    info: RefCell<Option<Rc<Info>>>,
    kerning: RefCell<Option<Rc<Kerning>>>,
    groups: RefCell<Option<Rc<Groups>>>,
    features: RefCell<Option<Rc<Features>>>,
    lib: RefCell<Option<Rc<FontLib>>>,
    glyphs: RefCell<BTreeMap<String, Rc<Glyph>>>,
    /// On disk, not read yet
    unloaded: RefCell<BTreeSet<String>>,
    /// Glyph files to delete on the next save, with their last known state
    scheduled_deletions: RefCell<BTreeMap<String, Option<DiskSnapshot>>>,
    record: RefCell<ExternalChangeRecord>,
}

impl Font {
    /// An empty font that is not on disk yet
    pub fn new() -> Result<Rc<Self>> {
        Self::with_options(FontOptions::default())
    }

    pub fn with_options(options: FontOptions) -> Result<Rc<Self>> {
        let font = Self::build(&options, None)?;
        font.info()?;
        Ok(font)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Rc<Self>> {
        Self::open_with(path, FontOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: FontOptions) -> Result<Rc<Self>> {
        let store = UfoDirectory::open(path)?;
        let font = Self::build(&options, Some(Rc::new(store)))?;
        font.info()?;
        for resource in &options.preload {
            font.load_resource(resource)?;
        }
        info!(
            "Opened {} ({} glyphs)",
            font.path().unwrap_or_default().display(),
            font.glyph_count()
        );
        Ok(font)
    }

    fn build(options: &FontOptions, store: Option<Rc<UfoDirectory>>) -> Result<Rc<Self>> {
        let center = Rc::new(NotificationCenter::with_strict_registration(
            options.strict_registration,
        ));
        let unloaded = store
            .as_ref()
            .map(|store| store.glyph_names_on_disk().into_iter().collect())
            .unwrap_or_default();
        let font = Rc::new_cyclic(|this: &Weak<Self>| Self {
            base: ObjectBase::new("Font", this.clone()),
            center,
            path: RefCell::new(store.as_ref().map(|store| store.root().to_path_buf())),
            store: RefCell::new(store),
            info: RefCell::new(None),
            kerning: RefCell::new(None),
            groups: RefCell::new(None),
            features: RefCell::new(None),
            lib: RefCell::new(None),
            glyphs: RefCell::new(BTreeMap::new()),
            unloaded: RefCell::new(unloaded),
            scheduled_deletions: RefCell::new(BTreeMap::new()),
            record: RefCell::new(ExternalChangeRecord::new()),
        });
        if let Some(registry) = &options.registry {
            font.set_representation_registry(Arc::clone(registry));
        }
        font.set_dispatcher(Some(&font.center))?;
        Ok(font)
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.path.borrow().clone()
    }

    pub fn notification_center(&self) -> Rc<NotificationCenter> {
        Rc::clone(&self.center)
    }

    fn store(&self) -> Option<Rc<UfoDirectory>> {
        self.store.borrow().clone()
    }

    fn require_store(&self) -> Result<Rc<UfoDirectory>> {
        self.store().ok_or(Error::NotOnDisk)
    }

    /// Read a resource and stamp it. `None` when the font is not on disk or
    /// the file does not exist, in which case it is stamped as absent.
    fn read_resource(&self, resource: &ResourceId) -> Result<Option<(Rc<UfoDirectory>, Vec<u8>)>> {
        let Some(store) = self.store() else {
            return Ok(None);
        };
        match store.snapshot(resource)? {
            Some(snapshot) => {
                let contents = snapshot.contents.clone();
                self.record.borrow_mut().stamp(resource.clone(), snapshot);
                Ok(Some((store, contents)))
            }
            None => {
                self.record
                    .borrow_mut()
                    .stamp(resource.clone(), DiskSnapshot::absent());
                Ok(None)
            }
        }
    }

    /// Attach a freshly loaded child without marking anything dirty
    fn attach(&self, child: &dyn Observable) -> Result<()> {
        adopt(self, child)?;
        child.base().set_dirty_flag(false);
        Ok(())
    }

    fn lazy<T: Observable>(
        &self,
        slot: &RefCell<Option<Rc<T>>>,
        resource: ResourceId,
        build: impl FnOnce(Option<(&UfoDirectory, &[u8])>) -> Result<Rc<T>>,
    ) -> Result<Rc<T>> {
        if let Some(loaded) = slot.borrow().as_ref() {
            return Ok(Rc::clone(loaded));
        }
        let read = self.read_resource(&resource)?;
        let object = build(read.as_ref().map(|(store, bytes)| (store.as_ref(), bytes.as_slice())))?;
        self.attach(object.as_ref())?;
        debug!("Loaded {resource}");
        *slot.borrow_mut() = Some(Rc::clone(&object));
        Ok(object)
    }

    pub fn info(&self) -> Result<Rc<Info>> {
        self.lazy(&self.info, ResourceId::Info, |read| {
            let data = match read {
                Some((store, bytes)) => store.parse_info(bytes)?,
                None => norad::FontInfo::default(),
            };
            Ok(Info::new(data))
        })
    }

    pub fn kerning(&self) -> Result<Rc<Kerning>> {
        self.lazy(&self.kerning, ResourceId::Kerning, |read| {
            let nested = match read {
                Some((store, bytes)) => store.parse_kerning(bytes)?,
                None => NestedKerning::new(),
            };
            Ok(Kerning::from_nested(nested))
        })
    }

    pub fn groups(&self) -> Result<Rc<Groups>> {
        self.lazy(&self.groups, ResourceId::Groups, |read| {
            let groups = match read {
                Some((store, bytes)) => store.parse_groups(bytes)?,
                None => GroupMap::new(),
            };
            Ok(Groups::from_map(groups))
        })
    }

    pub fn features(&self) -> Result<Rc<Features>> {
        self.lazy(&self.features, ResourceId::Features, |read| {
            let text = match read {
                Some((store, bytes)) => store.parse_features(bytes)?,
                None => String::new(),
            };
            Ok(Features::new(text))
        })
    }

    pub fn lib(&self) -> Result<Rc<FontLib>> {
        self.lazy(&self.lib, ResourceId::Lib, |read| {
            let values = match read {
                Some((store, bytes)) => store.parse_lib(bytes)?,
                None => plist::Dictionary::new(),
            };
            Ok(FontLib::new(values))
        })
    }

    /// Load any resource by id
    pub fn load_resource(&self, resource: &ResourceId) -> Result<()> {
        match resource {
            ResourceId::Info => self.info().map(drop),
            ResourceId::Kerning => self.kerning().map(drop),
            ResourceId::Groups => self.groups().map(drop),
            ResourceId::Features => self.features().map(drop),
            ResourceId::Lib => self.lib().map(drop),
            ResourceId::Glyph(name) => match self.glyph(name)? {
                Some(_) => Ok(()),
                None => Err(Error::MissingGlyph(name.clone())),
            },
        }
    }

    fn loaded_object(&self, resource: &ResourceId) -> Option<Rc<dyn Observable>> {
        fn erase<T: Observable>(slot: &RefCell<Option<Rc<T>>>) -> Option<Rc<dyn Observable>> {
            slot.borrow()
                .as_ref()
                .map(|object| Rc::clone(object) as Rc<dyn Observable>)
        }
        match resource {
            ResourceId::Info => erase(&self.info),
            ResourceId::Kerning => erase(&self.kerning),
            ResourceId::Groups => erase(&self.groups),
            ResourceId::Features => erase(&self.features),
            ResourceId::Lib => erase(&self.lib),
            ResourceId::Glyph(name) => self
                .glyphs
                .borrow()
                .get(name)
                .map(|glyph| Rc::clone(glyph) as Rc<dyn Observable>),
        }
    }

    pub fn resource_state(&self, resource: &ResourceId) -> ResourceState {
        match self.loaded_object(resource) {
            None => ResourceState::Unloaded,
            Some(object) if object.is_dirty() => ResourceState::Modified,
            Some(_) => ResourceState::Unmodified,
        }
    }

    // Glyphs

    /// The glyph called `name`, read from disk on first access
    pub fn glyph(&self, name: &str) -> Result<Option<Rc<Glyph>>> {
        if let Some(glyph) = self.glyphs.borrow().get(name) {
            return Ok(Some(Rc::clone(glyph)));
        }
        if !self.unloaded.borrow().contains(name) {
            return Ok(None);
        }
        let store = self.require_store()?;
        let glyph = self.read_glyph(&store, name)?;
        self.unloaded.borrow_mut().remove(name);
        self.attach_glyph(&glyph)?;
        debug!("Loaded glyph '{name}'");
        Ok(Some(glyph))
    }

    fn read_glyph(&self, store: &UfoDirectory, name: &str) -> Result<Rc<Glyph>> {
        let resource = ResourceId::glyph(name);
        let snapshot = store
            .snapshot(&resource)?
            .ok_or_else(|| Error::MissingGlyph(name.to_string()))?;
        let glyph = Glyph::from_norad_glyph(name, &store.load_glyph(name)?)?;
        self.record.borrow_mut().stamp(resource, snapshot);
        Ok(glyph)
    }

    fn attach_glyph(&self, glyph: &Rc<Glyph>) -> Result<()> {
        adopt(self, glyph.as_ref())?;
        glyph.mark_clean();
        self.glyphs
            .borrow_mut()
            .insert(glyph.name(), Rc::clone(glyph));
        Ok(())
    }

    /// Every glyph name, loaded or not, in sorted order
    pub fn glyph_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.unloaded.borrow().clone();
        names.extend(self.glyphs.borrow().keys().cloned());
        names.into_iter().collect()
    }

    pub fn loaded_glyph_names(&self) -> Vec<String> {
        self.glyphs.borrow().keys().cloned().collect()
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.borrow().len() + self.unloaded.borrow().len()
    }

    pub fn has_glyph(&self, name: &str) -> bool {
        self.glyphs.borrow().contains_key(name) || self.unloaded.borrow().contains(name)
    }

    /// Fails when `name` is not a valid UFO name or is already taken
    pub fn validate_new_glyph_name(&self, name: &str) -> Result<()> {
        parse_name(name)?;
        if self.has_glyph(name) {
            return Err(Error::DuplicateGlyphName(name.to_string()));
        }
        Ok(())
    }

    pub fn new_glyph(&self, name: &str) -> Result<Rc<Glyph>> {
        self.validate_new_glyph_name(name)?;
        let glyph = Glyph::new(name);
        self.attach_glyph(&glyph)?;
        glyph.base().set_dirty_flag(true);
        self.glyph_added(name)?;
        Ok(glyph)
    }

    /// Add `glyph` under its own name, replacing any glyph with that name
    pub fn insert_glyph(&self, glyph: Rc<Glyph>) -> Result<()> {
        let name = glyph.name();
        parse_name(&name)?;
        let replaced = self.glyphs.borrow_mut().remove(&name);
        if let Some(replaced) = replaced {
            detach(replaced.as_ref())?;
        }
        self.unloaded.borrow_mut().remove(&name);
        adopt(self, glyph.as_ref())?;
        self.glyphs.borrow_mut().insert(name.clone(), Rc::clone(&glyph));
        glyph.base().set_dirty_flag(true);
        self.glyph_added(&name)
    }

    fn glyph_added(&self, name: &str) -> Result<()> {
        let posted = self.post_notification(GLYPH_ADDED, Some(user_info([("name", name)])));
        posted.and(self.set_dirty(true))
    }

    /// Remove a glyph. Its file is deleted on the next save.
    pub fn remove_glyph(&self, name: &str) -> Result<()> {
        let removed = self.glyphs.borrow_mut().remove(name);
        let was_unloaded = self.unloaded.borrow_mut().remove(name);
        if removed.is_none() && !was_unloaded {
            return Err(Error::MissingGlyph(name.to_string()));
        }
        if let Some(glyph) = &removed {
            detach(glyph.as_ref())?;
        }
        self.schedule_deletion(name);
        let posted = self.post_notification(GLYPH_DELETED, Some(user_info([("name", name)])));
        posted.and(self.set_dirty(true))
    }

    fn schedule_deletion(&self, name: &str) {
        let Some(store) = self.store() else {
            return;
        };
        if !store.has_glyph_on_disk(name) {
            return;
        }
        let resource = ResourceId::glyph(name);
        let snapshot = match self.record.borrow_mut().forget(&resource) {
            Some(snapshot) => Some(snapshot),
            None => store.snapshot(&resource).unwrap_or_else(|error| {
                warn!("Could not snapshot '{name}' before deleting it: {error}");
                None
            }),
        };
        self.scheduled_deletions
            .borrow_mut()
            .insert(name.to_string(), snapshot);
    }

    /// Move a renamed glyph to its new key. Called by [`Glyph::set_name`]
    /// after the new name was validated.
    pub(crate) fn rekey_glyph(&self, old: &str, new: &str) {
        let glyph = self.glyphs.borrow_mut().remove(old);
        if let Some(glyph) = glyph {
            self.glyphs.borrow_mut().insert(new.to_string(), glyph);
        }
        self.schedule_deletion(old);
        debug!("Renamed glyph '{old}' to '{new}'");
    }

    // External changes

    fn is_modified_in_memory(&self, resource: &ResourceId) -> bool {
        self.resource_state(resource) == ResourceState::Modified
    }

    /// Compare every loaded resource against its file.
    ///
    /// Nothing is reloaded. Resources edited both in memory and on disk are
    /// reported with `modified_in_memory` set, and the caller decides.
    pub fn test_for_external_changes(&self) -> Result<ExternalChangeReport> {
        let store = self.require_store()?;
        let mut report = ExternalChangeReport::new();
        // Tracked glyphs keep resolving through the last good contents.plist
        let on_disk = match store.glyph_names() {
            Ok(names) => Some(names),
            Err(error) => {
                warn!("Could not read the glyph list of {}: {error}", store.root().display());
                report.contents = Some(ExternalChange::Unreadable {
                    reason: error.to_string(),
                });
                None
            }
        };

        let record = self.record.borrow();
        for resource in record.tracked() {
            let Some(change) = record.compare(store.as_ref(), resource) else {
                continue;
            };
            let entry = ResourceReport {
                change,
                modified_in_memory: self.is_modified_in_memory(resource),
            };
            if entry.is_conflict() {
                warn!("{resource} changed on disk and has unsaved edits");
            }
            report.resources.insert(resource.clone(), entry);
        }
        drop(record);

        let scheduled = self.scheduled_deletions.borrow();
        for name in on_disk.into_iter().flatten() {
            if self.has_glyph(&name) {
                continue;
            }
            let added = match scheduled.get(&name) {
                None => true,
                Some(None) => false,
                Some(Some(snapshot)) => {
                    let resource = ResourceId::glyph(name.as_str());
                    match store.modification_time(&resource) {
                        Ok(Some(modified)) if Some(modified) == snapshot.modified => false,
                        _ => !matches!(
                            store.read(&resource),
                            Ok(Some(contents)) if contents == snapshot.contents
                        ),
                    }
                }
            };
            if added {
                report.added_glyphs.push(name);
            }
        }
        debug!(
            "External change test: {} changed, {} added",
            report.changed().len(),
            report.added_glyphs.len()
        );
        Ok(report)
    }

    fn reread(&self, resource: &ResourceId) -> Result<Option<(Rc<UfoDirectory>, Vec<u8>)>> {
        self.require_store()?;
        self.read_resource(resource)
    }

    /// Post `Changed` for a reloaded object and leave it clean
    fn reloaded(&self, object: &dyn Observable) -> Result<()> {
        object.base().set_dirty_flag(false);
        object.destroy_all_representations();
        object.post_notification(&object.change_notification_name(), None)
    }

    pub fn reload_info(&self) -> Result<()> {
        let loaded = self.info.borrow().clone();
        let Some(info) = loaded else {
            return self.info().map(drop);
        };
        let data = match self.reread(&ResourceId::Info)? {
            Some((store, bytes)) => store.parse_info(&bytes)?,
            None => norad::FontInfo::default(),
        };
        info.replace(data);
        self.reloaded(info.as_ref())
    }

    pub fn reload_kerning(&self) -> Result<()> {
        let loaded = self.kerning.borrow().clone();
        let Some(kerning) = loaded else {
            return self.kerning().map(drop);
        };
        let nested = match self.reread(&ResourceId::Kerning)? {
            Some((store, bytes)) => store.parse_kerning(&bytes)?,
            None => NestedKerning::new(),
        };
        kerning.replace(nested);
        self.reloaded(kerning.as_ref())
    }

    pub fn reload_groups(&self) -> Result<()> {
        let loaded = self.groups.borrow().clone();
        let Some(groups) = loaded else {
            return self.groups().map(drop);
        };
        let map = match self.reread(&ResourceId::Groups)? {
            Some((store, bytes)) => store.parse_groups(&bytes)?,
            None => GroupMap::new(),
        };
        groups.replace(map);
        self.reloaded(groups.as_ref())
    }

    pub fn reload_features(&self) -> Result<()> {
        let loaded = self.features.borrow().clone();
        let Some(features) = loaded else {
            return self.features().map(drop);
        };
        let text = match self.reread(&ResourceId::Features)? {
            Some((store, bytes)) => store.parse_features(&bytes)?,
            None => String::new(),
        };
        features.replace(text);
        self.reloaded(features.as_ref())
    }

    pub fn reload_lib(&self) -> Result<()> {
        let loaded = self.lib.borrow().clone();
        let Some(lib) = loaded else {
            return self.lib().map(drop);
        };
        let values = match self.reread(&ResourceId::Lib)? {
            Some((store, bytes)) => store.parse_lib(&bytes)?,
            None => plist::Dictionary::new(),
        };
        lib.replace(values);
        self.reloaded(lib.as_ref())
    }

    /// Re-read loaded glyphs from disk. Glyphs that were never loaded are
    /// skipped since there is nothing in memory to refresh.
    pub fn reload_glyphs(&self, names: &[String]) -> Result<()> {
        let store = self.require_store()?;
        store.refresh_contents().with_file_context("read", store.root().join("glyphs"))?;
        hold_all(self, || {
            let mut reloaded = Vec::new();
            for name in names {
                let Some(glyph) = self.glyphs.borrow().get(name).cloned() else {
                    continue;
                };
                let resource = ResourceId::glyph(name.as_str());
                let snapshot = store
                    .snapshot(&resource)?
                    .ok_or_else(|| Error::MissingGlyph(name.clone()))?;
                glyph.load_norad_glyph(&store.load_glyph(name)?)?;
                self.record.borrow_mut().stamp(resource, snapshot);
                self.reloaded(glyph.as_ref())?;
                reloaded.push(Value::from(name.as_str()));
            }
            if reloaded.is_empty() {
                return Ok(());
            }
            self.post_notification(RELOADED_GLYPHS, Some(user_info([("glyphNames", reloaded)])))
        })
    }

    /// Reload any resource by id
    pub fn reload(&self, resource: &ResourceId) -> Result<()> {
        match resource {
            ResourceId::Info => self.reload_info(),
            ResourceId::Kerning => self.reload_kerning(),
            ResourceId::Groups => self.reload_groups(),
            ResourceId::Features => self.reload_features(),
            ResourceId::Lib => self.reload_lib(),
            ResourceId::Glyph(name) => self.reload_glyphs(std::slice::from_ref(name)),
        }
    }

    // Saving

    pub fn save(&self) -> Result<()> {
        let path = self.path().ok_or(Error::NotOnDisk)?;
        self.save_as(path)
    }

    /// Write the font to `path`, which becomes the font's path.
    ///
    /// Unloaded data is carried over from the current UFO, so saving to a
    /// new location produces a complete copy.
    pub fn save_as(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        let mut ufo = match self.store() {
            Some(store) => norad::Font::load(store.root()).with_file_context("load", store.root())?,
            None => norad::Font::new(),
        };
        self.write_into(&mut ufo)?;
        ufo.save(&path).with_file_context("save", &path)?;

        let store = Rc::new(UfoDirectory::open(&path)?);
        *self.path.borrow_mut() = Some(path.clone());
        *self.store.borrow_mut() = Some(Rc::clone(&store));
        self.scheduled_deletions.borrow_mut().clear();
        let loaded: BTreeSet<String> = self.glyphs.borrow().keys().cloned().collect();
        *self.unloaded.borrow_mut() = store
            .glyph_names_on_disk()
            .into_iter()
            .filter(|name| !loaded.contains(name))
            .collect();
        self.restamp(&store)?;
        self.mark_clean();
        info!("Saved {}", path.display());
        Ok(())
    }

    fn write_into(&self, ufo: &mut norad::Font) -> Result<()> {
        if let Some(info) = self.info.borrow().as_ref() {
            ufo.font_info = info.data();
        }
        if let Some(kerning) = self.kerning.borrow().as_ref() {
            ufo.kerning = kerning_to_norad(&kerning.to_nested())?;
        }
        if let Some(groups) = self.groups.borrow().as_ref() {
            ufo.groups = groups_to_norad(&groups.to_map())?;
        }
        if let Some(features) = self.features.borrow().as_ref() {
            ufo.features = features.text();
        }
        if let Some(lib) = self.lib.borrow().as_ref() {
            ufo.lib = lib.to_dictionary();
        }

        let layer = ufo.default_layer_mut();
        for name in self.scheduled_deletions.borrow().keys() {
            layer.remove_glyph(name);
        }
        for (name, glyph) in self.glyphs.borrow().iter() {
            match layer.get_glyph_mut(name) {
                Some(existing) => glyph.write_into(existing)?,
                None => layer.insert_glyph(glyph.to_norad_glyph()?),
            }
        }
        Ok(())
    }

    fn restamp(&self, store: &UfoDirectory) -> Result<()> {
        let mut loaded: Vec<ResourceId> = ResourceId::FONT_LEVEL
            .into_iter()
            .filter(|resource| self.loaded_object(resource).is_some())
            .collect();
        loaded.extend(self.loaded_glyph_names().into_iter().map(ResourceId::Glyph));

        let mut record = self.record.borrow_mut();
        record.clear();
        for resource in loaded {
            match store.snapshot(&resource)? {
                Some(snapshot) => record.stamp(resource, snapshot),
                None if resource.glyph_name().is_none() => record.stamp(resource, DiskSnapshot::absent()),
                None => {}
            }
        }
        Ok(())
    }

    fn mark_clean(&self) {
        self.base.set_dirty_flag(false);
        for resource in ResourceId::FONT_LEVEL {
            if let Some(object) = self.loaded_object(&resource) {
                object.base().set_dirty_flag(false);
            }
        }
        for glyph in self.glyphs.borrow().values() {
            glyph.mark_clean();
        }
    }
}

impl Observable for Font {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn children(&self) -> Vec<Rc<dyn Observable>> {
        let mut children: Vec<Rc<dyn Observable>> = ResourceId::FONT_LEVEL
            .iter()
            .filter_map(|resource| self.loaded_object(resource))
            .collect();
        children.extend(
            self.glyphs
                .borrow()
                .values()
                .map(|glyph| Rc::clone(glyph) as Rc<dyn Observable>),
        );
        children
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("path", &*self.path.borrow())
            .field("glyphs", &self.glyph_count())
            .field("loaded_glyphs", &self.glyphs.borrow().len())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
