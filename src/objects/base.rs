//! Observable object base
//!
//! Every object in the font graph embeds an [`ObjectBase`] and implements
//! [`Observable`]. The base carries the object's identity, a weak link to its
//! notification center and parent, the dirty flag and the representation
//! cache. Everything else is provided by the trait.
//!
//! Ownership runs downwards only: a font owns its glyphs, a glyph owns its
//! contours. Children refer back to their parent through a `Weak` handle, so
//! a dropped parent simply reads as "no parent".

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::errors::{Error, Result};
use crate::notifications::{Notification, NotificationCenter, ObjectId, Observer, UserInfo};
use crate::representations::{Parameters, RepresentationCache, RepresentationKey, RepresentationRegistry};

/// Selector used for the cache's own subscriptions
pub const DESTROY_REPRESENTATIONS: &str = "destroy_representations";

/// State shared by every observable object
pub struct ObjectBase {
    id: ObjectId,
    kind: &'static str,
    this: Weak<dyn Observable>,
    dispatcher: RefCell<Weak<NotificationCenter>>,
    parent: RefCell<Option<Weak<dyn Observable>>>,
    dirty: Cell<bool>,
    representations: Rc<RepresentationCache>,
    registry: RefCell<Option<Arc<RepresentationRegistry>>>,
}

impl ObjectBase {
    /// `this` is the weak handle of the object embedding the base, usually
    /// obtained through `Rc::new_cyclic`.
    pub fn new(kind: &'static str, this: Weak<dyn Observable>) -> Self {
        Self {
            id: ObjectId::next(),
            kind,
            this,
            dispatcher: RefCell::new(Weak::new()),
            parent: RefCell::new(None),
            dirty: Cell::new(false),
            representations: Rc::new(RepresentationCache::new()),
            registry: RefCell::new(None),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Weak handle to the owning object, handed to children as their parent
    pub fn handle(&self) -> Weak<dyn Observable> {
        self.this.clone()
    }

    pub fn representations(&self) -> &RepresentationCache {
        &self.representations
    }

    /// Set the dirty flag without posting anything. Used after loading and
    /// saving, and for freshly created objects.
    pub(crate) fn set_dirty_flag(&self, dirty: bool) {
        self.dirty.set(dirty);
    }

    fn own_dispatcher(&self) -> Option<Rc<NotificationCenter>> {
        self.dispatcher.borrow().upgrade()
    }
}

impl Drop for ObjectBase {
    fn drop(&mut self) {
        if let Some(center) = self.own_dispatcher() {
            center.purge(self.id);
        }
    }
}

impl std::fmt::Debug for ObjectBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBase")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("dirty", &self.dirty.get())
            .field("representations", &self.representations.len())
            .finish()
    }
}

/// Subscribe the cache of `base` to `notification` posted by its owner
fn subscribe_cache(base: &ObjectBase, center: &NotificationCenter, notification: &str) -> Result<()> {
    if !base.representations.mark_subscribed(notification) {
        return Ok(());
    }
    let cache = Rc::downgrade(&base.representations);
    center.add_observer(
        base.id,
        DESTROY_REPRESENTATIONS,
        notification,
        Some(base.id),
        move |notification| {
            if let Some(cache) = cache.upgrade() {
                cache.invalidate(notification.name());
            }
            Ok(())
        },
    )
}

/// An object participating in the observable font graph
pub trait Observable: Any {
    fn base(&self) -> &ObjectBase;

    fn as_any(&self) -> &dyn Any;

    /// Observable children, visited when the notification center changes
    fn children(&self) -> Vec<Rc<dyn Observable>> {
        Vec::new()
    }

    fn id(&self) -> ObjectId {
        self.base().id
    }

    /// Type name used as notification prefix, e.g. `"Glyph"`
    fn kind(&self) -> &'static str {
        self.base().kind
    }

    fn notification_name(&self, event: &str) -> String {
        format!("{}.{event}", self.kind())
    }

    fn change_notification_name(&self) -> String {
        self.notification_name("Changed")
    }

    /// The notification center in effect: the object's own, or the nearest
    /// ancestor's.
    fn dispatcher(&self) -> Option<Rc<NotificationCenter>> {
        self.base()
            .own_dispatcher()
            .or_else(|| self.parent()?.dispatcher())
    }

    /// Move this object (and its children) to another notification center.
    ///
    /// The object's own subscriptions on the previous center are removed and
    /// its cached representations are dropped.
    fn set_dispatcher(&self, center: Option<&Rc<NotificationCenter>>) -> Result<()> {
        let base = self.base();
        if let Some(previous) = base.own_dispatcher() {
            previous.remove_observer(base.id, None, Some(base.id));
        }
        *base.dispatcher.borrow_mut() = center.map(Rc::downgrade).unwrap_or_default();
        base.representations.clear();
        base.representations.reset_subscriptions();
        if let Some(center) = center {
            subscribe_cache(base, center, &self.change_notification_name())?;
        }
        for child in self.children() {
            child.set_dispatcher(center)?;
        }
        Ok(())
    }

    fn parent(&self) -> Option<Rc<dyn Observable>> {
        self.base().parent.borrow().as_ref()?.upgrade()
    }

    /// Set or clear the non-owning parent link. Posts nothing.
    fn set_parent(&self, parent: Option<Weak<dyn Observable>>) {
        *self.base().parent.borrow_mut() = parent;
    }

    fn is_dirty(&self) -> bool {
        self.base().dirty.get()
    }

    /// Marking an object dirty posts its `Changed` notification and marks the
    /// parent chain dirty as well. Clearing the flag posts nothing.
    ///
    /// The parent is marked even when an observer of this object fails; the
    /// first error is returned.
    fn set_dirty(&self, dirty: bool) -> Result<()> {
        self.base().dirty.set(dirty);
        if !dirty {
            return Ok(());
        }
        let posted = self.post_notification(&self.change_notification_name(), None);
        let propagated = match self.parent() {
            Some(parent) => parent.set_dirty(true),
            None => Ok(()),
        };
        posted.and(propagated)
    }

    /// Post `name` with this object as poster.
    ///
    /// Cached representations destroyed by `name` are evicted first, even
    /// when notifications are held, so nothing stale can be read while the
    /// notification waits in a queue.
    fn post_notification(&self, name: &str, user_info: Option<UserInfo>) -> Result<()> {
        self.base().representations.invalidate(name);
        match self.dispatcher() {
            Some(center) => center.post_notification(name, self.id(), user_info),
            None => Ok(()),
        }
    }

    fn require_dispatcher(&self) -> Result<Rc<NotificationCenter>> {
        self.dispatcher()
            .ok_or(Error::NoDispatcher { kind: self.kind() })
    }

    /// Observe `event` posted by this object
    fn add_observer<F>(&self, observer: ObjectId, selector: &str, event: &str, callback: F) -> Result<()>
    where
        F: Fn(&Notification) -> anyhow::Result<()> + 'static,
        Self: Sized,
    {
        let center = self.require_dispatcher()?;
        center.add_observer(observer, selector, event, Some(self.id()), callback)
    }

    /// Register an [`Observer`] for `event` posted by this object
    fn add_observer_object<O>(&self, observer: &Rc<O>, selector: &str, event: &str) -> Result<()>
    where
        O: Observer + 'static,
        Self: Sized,
    {
        let center = self.require_dispatcher()?;
        center.add_observer_object(observer, selector, event, Some(self.id()))
    }

    fn remove_observer(&self, observer: ObjectId, event: Option<&str>) -> usize {
        match self.dispatcher() {
            Some(center) => center.remove_observer(observer, event, Some(self.id())),
            None => 0,
        }
    }

    fn has_observer(&self, observer: ObjectId, event: &str) -> bool {
        self.dispatcher()
            .is_some_and(|center| center.has_observer(observer, event, Some(self.id())))
    }

    fn hold_notifications(&self) -> Result<()> {
        self.require_dispatcher()?
            .hold_notifications(Some(self.id()));
        Ok(())
    }

    fn release_held_notifications(&self) -> Result<()> {
        self.require_dispatcher()?
            .release_held_notifications(Some(self.id()))
    }

    fn disable_notifications(&self) -> Result<()> {
        self.require_dispatcher()?
            .disable_notifications(Some(self.id()));
        Ok(())
    }

    fn enable_notifications(&self) -> Result<()> {
        self.require_dispatcher()?
            .enable_notifications(Some(self.id()))
    }

    /// Run `f` with this object's notifications held. Without a notification
    /// center `f` simply runs.
    fn batch<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R>
    where
        Self: Sized,
    {
        match self.dispatcher() {
            Some(center) => center.batch(Some(self.id()), f),
            None => f(),
        }
    }

    /// The factory registry in effect: the object's own, the nearest
    /// ancestor's, or the shared default.
    fn representation_registry(&self) -> Arc<RepresentationRegistry> {
        if let Some(registry) = self.base().registry.borrow().as_ref() {
            return Arc::clone(registry);
        }
        match self.parent() {
            Some(parent) => parent.representation_registry(),
            None => RepresentationRegistry::shared(),
        }
    }

    fn set_representation_registry(&self, registry: Arc<RepresentationRegistry>) {
        *self.base().registry.borrow_mut() = Some(registry);
        self.base().representations.clear();
    }

    /// Cached representation `name`, computed on a miss.
    ///
    /// The factory receives the object, its parent as context, and the
    /// parameters. Failures are not cached.
    fn representation(&self, name: &str, parameters: &Parameters) -> Result<Rc<dyn Any>> {
        let base = self.base();
        let key = RepresentationKey::new(name, parameters.clone());
        if let Some(value) = base.representations.get(&key) {
            return Ok(value);
        }

        let registry = self.representation_registry();
        let Some(factory) = registry.lookup(Any::type_id(self.as_any()), name) else {
            return Err(Error::UnknownRepresentation {
                kind: self.kind(),
                name: name.to_string(),
            });
        };
        let destroyed_by: Arc<[String]> = match &factory.destructive_notifications {
            Some(notifications) => Arc::clone(notifications),
            None => Arc::from(vec![self.change_notification_name()]),
        };

        base.representations.begin(&key, Arc::clone(&destroyed_by))?;
        debug!("Computing {} representation {key}", self.kind());
        let context = self.parent();
        let computed = (factory.compute)(self.as_any(), context.as_deref(), parameters);

        match computed {
            Ok(value) => {
                base.representations.finish(&key, Some(Rc::clone(&value)));
                if let Some(center) = self.dispatcher() {
                    for notification in destroyed_by.iter() {
                        subscribe_cache(base, &center, notification)?;
                    }
                }
                Ok(value)
            }
            Err(source) => {
                base.representations.finish(&key, None);
                warn!("Representation factory '{name}' failed for {}: {source:#}", self.kind());
                Err(Error::Factory {
                    name: name.to_string(),
                    source,
                })
            }
        }
    }

    /// Typed access to [`representation`](Self::representation)
    fn get_representation<T: 'static>(&self, name: &str, parameters: &Parameters) -> Result<Rc<T>>
    where
        Self: Sized,
    {
        self.representation(name, parameters)?
            .downcast::<T>()
            .map_err(|_| Error::RepresentationType {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    fn has_cached_representation(&self, name: &str, parameters: &Parameters) -> bool {
        self.base()
            .representations
            .contains(&RepresentationKey::new(name, parameters.clone()))
    }

    fn representation_keys(&self) -> Vec<RepresentationKey> {
        self.base().representations.keys()
    }

    /// Evict one entry, every entry called `name`, or everything when `name`
    /// is `None`.
    fn destroy_representation(&self, name: Option<&str>, parameters: Option<&Parameters>) -> usize {
        self.base().representations.remove(name, parameters)
    }

    fn destroy_all_representations(&self) -> usize {
        self.base().representations.clear()
    }
}

/// Attach `child` below `parent`: set the parent link and move the child to
/// the parent's notification center.
pub(crate) fn adopt(parent: &dyn Observable, child: &dyn Observable) -> Result<()> {
    child.set_parent(Some(parent.base().handle()));
    child.set_dispatcher(parent.dispatcher().as_ref())
}

/// Detach `child` from its parent and notification center
pub(crate) fn detach(child: &dyn Observable) -> Result<()> {
    child.set_dispatcher(None)?;
    child.set_parent(None);
    Ok(())
}

/// Hold every notification on `object`'s center while `f` runs, so that a
/// compound edit reaches observers as one notification per object.
pub(crate) fn hold_all<R>(object: &dyn Observable, f: impl FnOnce() -> Result<R>) -> Result<R> {
    match object.dispatcher() {
        Some(center) => center.batch(None, f),
        None => f(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Contour, Glyph, Kerning};

    #[test]
    fn handle_refers_to_the_embedding_object() {
        let glyph = Glyph::new("a");
        let kerning = Kerning::new();
        let handle = glyph.base().handle();
        assert_eq!(handle.upgrade().map(|object| object.id()), Some(glyph.id()));
        assert_eq!(kerning.base().handle().upgrade().map(|object| object.kind()), Some("Kerning"));

        let contour = Contour::new(Vec::new());
        adopt(glyph.as_ref(), contour.as_ref()).unwrap();
        assert_eq!(contour.parent().map(|parent| parent.id()), Some(glyph.id()));

        drop(glyph);
        assert!(handle.upgrade().is_none());
        assert!(contour.parent().is_none());
    }
}
