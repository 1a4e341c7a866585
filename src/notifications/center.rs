//! Notification center
//!
//! Routes named events from posters to registered observers. Registrations
//! are keyed by event name and then by poster filter, so a post only looks at
//! the two buckets that can match it (the exact poster and the wildcard).
//!
//! Delivery is synchronous and depth-first. The matching registrations are
//! snapshotted before the first callback runs, which makes it safe for
//! callbacks to post, add or remove observers while a delivery is running.
//! No borrow of the registry is held while user code executes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::notification::{Notification, ObjectId, Observer, UserInfo};
use crate::core::errors::{Error, Result};

/// Callback stored with a registration
pub type ObserverCallback = Rc<dyn Fn(&Notification) -> anyhow::Result<()>>;

#[derive(Clone)]
struct Registration {
    /// Global registration order, used to merge the poster and wildcard buckets
    seq: u64,
    observer: ObjectId,
    selector: String,
    callback: ObserverCallback,
}

#[derive(Default)]
struct HeldQueue {
    count: usize,
    pending: Vec<Notification>,
}

#[derive(Default)]
struct Registry {
    next_seq: u64,
    events: HashMap<String, HashMap<Option<ObjectId>, Vec<Registration>>>,
    holds: HashMap<Option<ObjectId>, HeldQueue>,
    disabled: HashMap<Option<ObjectId>, usize>,
}

impl Registry {
    fn matching(&self, event: &str, poster: ObjectId) -> Vec<Registration> {
        let Some(by_poster) = self.events.get(event) else {
            return Vec::new();
        };
        let mut matched: Vec<Registration> = by_poster
            .get(&Some(poster))
            .into_iter()
            .chain(by_poster.get(&None))
            .flatten()
            .cloned()
            .collect();
        matched.sort_by_key(|registration| registration.seq);
        matched
    }

    fn is_disabled(&self, poster: ObjectId) -> bool {
        self.disabled.contains_key(&Some(poster)) || self.disabled.contains_key(&None)
    }

    /// The most specific hold covering `poster`
    fn hold_queue(&mut self, poster: ObjectId) -> Option<&mut HeldQueue> {
        if self.holds.contains_key(&Some(poster)) {
            self.holds.get_mut(&Some(poster))
        } else {
            self.holds.get_mut(&None)
        }
    }

    /// Remove matching registrations and hand them back so they are dropped
    /// after the registry borrow ends.
    fn remove_where(
        &mut self,
        event: Option<&str>,
        matches: impl Fn(Option<ObjectId>, &Registration) -> bool,
    ) -> Vec<Registration> {
        let mut removed = Vec::new();
        for (name, by_poster) in self.events.iter_mut() {
            if event.is_some_and(|event| event != name) {
                continue;
            }
            for (filter, registrations) in by_poster.iter_mut() {
                registrations.retain(|registration| {
                    if matches(*filter, registration) {
                        removed.push(registration.clone());
                        false
                    } else {
                        true
                    }
                });
            }
            by_poster.retain(|_, registrations| !registrations.is_empty());
        }
        self.events.retain(|_, by_poster| !by_poster.is_empty());
        removed
    }
}

fn describe(poster: Option<ObjectId>) -> String {
    match poster {
        Some(poster) => poster.to_string(),
        None => "all posters".to_string(),
    }
}

/// Registry routing notifications from posters to observers
///
/// Usually owned by a top-level container (a font) and shared with the
/// objects below it through weak references.
#[derive(Default)]
pub struct NotificationCenter {
    registry: RefCell<Registry>,
    strict: bool,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A center that rejects duplicate registrations instead of ignoring them
    pub fn strict() -> Self {
        Self::with_strict_registration(true)
    }

    pub fn with_strict_registration(strict: bool) -> Self {
        Self {
            registry: RefCell::default(),
            strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Register `callback` for `event` posted by `poster` (or by anyone when
    /// `poster` is `None`).
    ///
    /// Registering the same `(observer, selector, event, poster)` again is a
    /// no-op, or a [`Error::DuplicateRegistration`] on a strict center.
    pub fn add_observer<F>(
        &self,
        observer: ObjectId,
        selector: &str,
        event: &str,
        poster: Option<ObjectId>,
        callback: F,
    ) -> Result<()>
    where
        F: Fn(&Notification) -> anyhow::Result<()> + 'static,
    {
        self.register(observer, selector, event, poster, Rc::new(callback))
    }

    /// Register an [`Observer`] by weak reference. Notifications are routed to
    /// `handle_notification` with `selector`; once the observer is dropped its
    /// registration is skipped.
    pub fn add_observer_object<O>(
        &self,
        observer: &Rc<O>,
        selector: &str,
        event: &str,
        poster: Option<ObjectId>,
    ) -> Result<()>
    where
        O: Observer + 'static,
    {
        let handle = Rc::downgrade(observer);
        let routed_selector = selector.to_string();
        let callback: ObserverCallback = Rc::new(move |notification: &Notification| {
            match handle.upgrade() {
                Some(observer) => observer.handle_notification(&routed_selector, notification),
                None => Ok(()),
            }
        });
        self.register(observer.observer_id(), selector, event, poster, callback)
    }

    fn register(
        &self,
        observer: ObjectId,
        selector: &str,
        event: &str,
        poster: Option<ObjectId>,
        callback: ObserverCallback,
    ) -> Result<()> {
        let mut registry = self.registry.borrow_mut();
        let seq = registry.next_seq;
        registry.next_seq += 1;
        let bucket = registry
            .events
            .entry(event.to_string())
            .or_default()
            .entry(poster)
            .or_default();

        let exists = bucket
            .iter()
            .any(|registration| registration.observer == observer && registration.selector == selector);
        if exists {
            if self.strict {
                return Err(Error::DuplicateRegistration {
                    observer,
                    selector: selector.to_string(),
                    event: event.to_string(),
                    poster,
                });
            }
            trace!("{observer} already observes '{event}' from {}", describe(poster));
            return Ok(());
        }

        bucket.push(Registration {
            seq,
            observer,
            selector: selector.to_string(),
            callback,
        });
        trace!("{observer} observes '{event}' from {} as '{selector}'", describe(poster));
        Ok(())
    }

    /// Remove registrations of `observer`. `None` for `event` or `poster`
    /// matches any value. Removing nothing is not an error.
    pub fn remove_observer(
        &self,
        observer: ObjectId,
        event: Option<&str>,
        poster: Option<ObjectId>,
    ) -> usize {
        let removed = self.registry.borrow_mut().remove_where(event, |filter, registration| {
            registration.observer == observer && (poster.is_none() || filter == poster)
        });
        removed.len()
    }

    /// Whether `observer` is registered for `event` with exactly this poster filter
    pub fn has_observer(&self, observer: ObjectId, event: &str, poster: Option<ObjectId>) -> bool {
        self.registry
            .borrow()
            .events
            .get(event)
            .and_then(|by_poster| by_poster.get(&poster))
            .is_some_and(|registrations| {
                registrations
                    .iter()
                    .any(|registration| registration.observer == observer)
            })
    }

    /// Total number of registrations
    pub fn observer_count(&self) -> usize {
        self.registry
            .borrow()
            .events
            .values()
            .flat_map(|by_poster| by_poster.values())
            .map(Vec::len)
            .sum()
    }

    /// Forget everything registered by or about `object`, including pending
    /// held notifications it posted under its own hold.
    pub fn purge(&self, object: ObjectId) -> usize {
        let (removed, held) = {
            let mut registry = self.registry.borrow_mut();
            let removed = registry.remove_where(None, |filter, registration| {
                registration.observer == object || filter == Some(object)
            });
            registry.disabled.remove(&Some(object));
            let held = registry.holds.remove(&Some(object));
            (removed, held)
        };
        if !removed.is_empty() {
            debug!("Purged {} registrations for {object}", removed.len());
        }
        drop(held);
        removed.len()
    }

    /// Deliver `event` from `poster` to every matching observer, in
    /// registration order.
    ///
    /// Every observer is attempted even if an earlier one fails; the first
    /// failure is returned afterwards as [`Error::ObserverFailed`].
    pub fn post_notification(
        &self,
        event: &str,
        poster: ObjectId,
        user_info: Option<UserInfo>,
    ) -> Result<()> {
        let snapshot = {
            let mut registry = self.registry.borrow_mut();
            if registry.is_disabled(poster) {
                trace!("'{event}' from {poster} dropped, notifications disabled");
                return Ok(());
            }
            if let Some(queue) = registry.hold_queue(poster) {
                let notification = Notification::new(event, poster, user_info);
                if !queue
                    .pending
                    .iter()
                    .any(|pending| pending.same_event(&notification))
                {
                    queue.pending.push(notification);
                }
                return Ok(());
            }
            registry.matching(event, poster)
        };

        if snapshot.is_empty() {
            return Ok(());
        }
        let notification = Notification::new(event, poster, user_info);
        self.deliver(&notification, snapshot)
    }

    fn deliver(&self, notification: &Notification, snapshot: Vec<Registration>) -> Result<()> {
        let delivered = snapshot.len();
        let mut failures = Vec::new();
        for registration in snapshot {
            trace!(
                "{notification} -> {} '{}'",
                registration.observer,
                registration.selector
            );
            if let Err(error) = (registration.callback)(notification) {
                warn!(
                    "Observer {} '{}' failed handling {notification}: {error:#}",
                    registration.observer, registration.selector
                );
                failures.push(error);
            }
        }

        let failed = failures.len();
        match failures.into_iter().next() {
            None => Ok(()),
            Some(source) => Err(Error::ObserverFailed {
                event: notification.name().to_string(),
                failed,
                delivered,
                source,
            }),
        }
    }

    /// Queue notifications from `poster` (or from everyone) instead of
    /// delivering them. Holds nest; see [`release_held_notifications`].
    ///
    /// [`release_held_notifications`]: Self::release_held_notifications
    pub fn hold_notifications(&self, poster: Option<ObjectId>) {
        let mut registry = self.registry.borrow_mut();
        registry.holds.entry(poster).or_default().count += 1;
    }

    /// Undo one [`hold_notifications`](Self::hold_notifications). When the
    /// last hold for `poster` is released, each distinct `(event, poster)`
    /// that was queued is posted once, in first-queued order.
    pub fn release_held_notifications(&self, poster: Option<ObjectId>) -> Result<()> {
        let pending = {
            let mut registry = self.registry.borrow_mut();
            let Some(queue) = registry.holds.get_mut(&poster) else {
                return Err(Error::UnbalancedRelease(describe(poster)));
            };
            queue.count -= 1;
            if queue.count > 0 {
                return Ok(());
            }
            registry
                .holds
                .remove(&poster)
                .map(|queue| queue.pending)
                .unwrap_or_default()
        };

        if !pending.is_empty() {
            debug!(
                "Releasing {} held notifications for {}",
                pending.len(),
                describe(poster)
            );
        }
        let mut first_error = None;
        for notification in pending {
            let posted = self.post_notification(
                notification.name(),
                notification.poster(),
                notification.user_info().cloned(),
            );
            if let Err(error) = posted {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn are_notifications_held(&self, poster: Option<ObjectId>) -> bool {
        self.registry.borrow().holds.contains_key(&poster)
    }

    /// Drop notifications from `poster` (or from everyone) until enabled again
    pub fn disable_notifications(&self, poster: Option<ObjectId>) {
        *self.registry.borrow_mut().disabled.entry(poster).or_default() += 1;
    }

    pub fn enable_notifications(&self, poster: Option<ObjectId>) -> Result<()> {
        let mut registry = self.registry.borrow_mut();
        let Some(count) = registry.disabled.get_mut(&poster) else {
            return Err(Error::UnbalancedEnable(describe(poster)));
        };
        *count -= 1;
        if *count == 0 {
            registry.disabled.remove(&poster);
        }
        Ok(())
    }

    pub fn are_notifications_disabled(&self, poster: Option<ObjectId>) -> bool {
        self.registry.borrow().disabled.contains_key(&poster)
    }

    /// Run `f` with notifications from `poster` held, then release them.
    ///
    /// The error from `f` wins over an error raised while releasing.
    pub fn batch<R>(&self, poster: Option<ObjectId>, f: impl FnOnce() -> Result<R>) -> Result<R> {
        self.hold_notifications(poster);
        let outcome = f();
        let released = self.release_held_notifications(poster);
        let value = outcome?;
        released?;
        Ok(value)
    }
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("NotificationCenter")
            .field("events", &registry.events.len())
            .field("holds", &registry.holds.len())
            .field("disabled", &registry.disabled.len())
            .field("strict", &self.strict)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::user_info;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<String>>>;

    fn record(log: &Log, tag: &str) -> impl Fn(&Notification) -> anyhow::Result<()> + 'static {
        let log = Rc::clone(log);
        let tag = tag.to_string();
        move |notification| {
            log.borrow_mut().push(format!("{tag}:{}", notification.name()));
            Ok(())
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.borrow().clone()
    }

    #[test]
    fn delivers_only_matching_event_and_poster() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let observer = ObjectId::next();
        let glyph = ObjectId::next();
        let other = ObjectId::next();

        center
            .add_observer(observer, "record", "Glyph.Changed", Some(glyph), record(&log, "a"))
            .unwrap();

        center.post_notification("Glyph.Changed", glyph, None).unwrap();
        center.post_notification("Glyph.Changed", other, None).unwrap();
        center.post_notification("Glyph.NameChanged", glyph, None).unwrap();

        assert_eq!(entries(&log), vec!["a:Glyph.Changed"]);
    }

    #[test]
    fn wildcard_poster_and_registration_order() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let glyph = ObjectId::next();

        center
            .add_observer(ObjectId::next(), "any", "Glyph.Changed", None, record(&log, "any"))
            .unwrap();
        center
            .add_observer(ObjectId::next(), "one", "Glyph.Changed", Some(glyph), record(&log, "one"))
            .unwrap();
        center
            .add_observer(ObjectId::next(), "late", "Glyph.Changed", None, record(&log, "late"))
            .unwrap();

        center.post_notification("Glyph.Changed", glyph, None).unwrap();
        assert_eq!(
            entries(&log),
            vec!["any:Glyph.Changed", "one:Glyph.Changed", "late:Glyph.Changed"]
        );

        log.borrow_mut().clear();
        center
            .post_notification("Glyph.Changed", ObjectId::next(), None)
            .unwrap();
        assert_eq!(entries(&log), vec!["any:Glyph.Changed", "late:Glyph.Changed"]);
    }

    #[test]
    fn registration_is_idempotent() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let observer = ObjectId::next();
        let poster = ObjectId::next();

        for _ in 0..3 {
            center
                .add_observer(observer, "record", "Font.Changed", Some(poster), record(&log, "a"))
                .unwrap();
        }
        assert_eq!(center.observer_count(), 1);

        center.post_notification("Font.Changed", poster, None).unwrap();
        assert_eq!(entries(&log).len(), 1);
    }

    #[test]
    fn different_selectors_are_separate_registrations() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let observer = ObjectId::next();
        let poster = ObjectId::next();

        center
            .add_observer(observer, "first", "Font.Changed", Some(poster), record(&log, "first"))
            .unwrap();
        center
            .add_observer(observer, "second", "Font.Changed", Some(poster), record(&log, "second"))
            .unwrap();

        center.post_notification("Font.Changed", poster, None).unwrap();
        assert_eq!(entries(&log), vec!["first:Font.Changed", "second:Font.Changed"]);
    }

    #[test]
    fn strict_center_rejects_duplicates() {
        let center = NotificationCenter::strict();
        let observer = ObjectId::next();
        let poster = ObjectId::next();

        center
            .add_observer(observer, "record", "Font.Changed", Some(poster), |_| Ok(()))
            .unwrap();
        let error = center
            .add_observer(observer, "record", "Font.Changed", Some(poster), |_| Ok(()))
            .unwrap_err();
        assert!(matches!(error, Error::DuplicateRegistration { .. }));
        assert_eq!(center.observer_count(), 1);
    }

    #[test]
    fn remove_and_has_observer() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let observer = ObjectId::next();
        let poster = ObjectId::next();

        center
            .add_observer(observer, "record", "Glyph.Changed", Some(poster), record(&log, "a"))
            .unwrap();
        center
            .add_observer(observer, "record", "Glyph.NameChanged", None, record(&log, "a"))
            .unwrap();

        assert!(center.has_observer(observer, "Glyph.Changed", Some(poster)));
        assert!(!center.has_observer(observer, "Glyph.Changed", None));
        assert!(center.has_observer(observer, "Glyph.NameChanged", None));

        assert_eq!(center.remove_observer(observer, Some("Glyph.Changed"), None), 1);
        assert!(!center.has_observer(observer, "Glyph.Changed", Some(poster)));
        assert!(center.has_observer(observer, "Glyph.NameChanged", None));

        // removing something that is not registered is a no-op
        assert_eq!(center.remove_observer(observer, Some("Glyph.Changed"), None), 0);
        assert_eq!(center.remove_observer(ObjectId::next(), None, None), 0);

        assert_eq!(center.remove_observer(observer, None, None), 1);
        assert_eq!(center.observer_count(), 0);
    }

    #[test]
    fn removal_during_delivery_uses_snapshot() {
        let center = Rc::new(NotificationCenter::new());
        let log = Log::default();
        let remover = ObjectId::next();
        let victim = ObjectId::next();
        let poster = ObjectId::next();

        let weak_center = Rc::downgrade(&center);
        center
            .add_observer(remover, "remove", "Contour.Changed", Some(poster), move |_| {
                if let Some(center) = weak_center.upgrade() {
                    center.remove_observer(victim, None, None);
                }
                Ok(())
            })
            .unwrap();
        center
            .add_observer(victim, "record", "Contour.Changed", Some(poster), record(&log, "victim"))
            .unwrap();
        center
            .add_observer(victim, "record", "Contour.PointsChanged", Some(poster), record(&log, "victim"))
            .unwrap();

        // the victim was part of the snapshot for this post
        center.post_notification("Contour.Changed", poster, None).unwrap();
        assert_eq!(entries(&log), vec!["victim:Contour.Changed"]);

        // but nothing afterwards
        center.post_notification("Contour.PointsChanged", poster, None).unwrap();
        center.post_notification("Contour.Changed", poster, None).unwrap();
        assert_eq!(entries(&log), vec!["victim:Contour.Changed"]);
    }

    #[test]
    fn observers_added_during_delivery_wait_for_next_post() {
        let center = Rc::new(NotificationCenter::new());
        let log = Log::default();
        let poster = ObjectId::next();
        let late = ObjectId::next();

        let weak_center = Rc::downgrade(&center);
        let late_log = Rc::clone(&log);
        center
            .add_observer(ObjectId::next(), "add", "Glyph.Changed", Some(poster), move |_| {
                if let Some(center) = weak_center.upgrade() {
                    center.add_observer(late, "record", "Glyph.Changed", Some(poster), record(&late_log, "late"))?;
                }
                Ok(())
            })
            .unwrap();

        center.post_notification("Glyph.Changed", poster, None).unwrap();
        assert!(entries(&log).is_empty());

        center.post_notification("Glyph.Changed", poster, None).unwrap();
        assert_eq!(entries(&log), vec!["late:Glyph.Changed"]);
    }

    #[test]
    fn reentrant_posts_are_depth_first() {
        let center = Rc::new(NotificationCenter::new());
        let log = Log::default();
        let contour = ObjectId::next();
        let glyph = ObjectId::next();

        let weak_center = Rc::downgrade(&center);
        let inner_log = Rc::clone(&log);
        center
            .add_observer(ObjectId::next(), "propagate", "Contour.Changed", Some(contour), move |_| {
                if let Some(center) = weak_center.upgrade() {
                    center.post_notification("Glyph.Changed", glyph, None)?;
                }
                inner_log.borrow_mut().push("propagated".to_string());
                Ok(())
            })
            .unwrap();
        center
            .add_observer(ObjectId::next(), "record", "Glyph.Changed", Some(glyph), record(&log, "glyph"))
            .unwrap();
        center
            .add_observer(ObjectId::next(), "record", "Contour.Changed", Some(contour), record(&log, "contour"))
            .unwrap();

        center.post_notification("Contour.Changed", contour, None).unwrap();
        assert_eq!(
            entries(&log),
            vec!["glyph:Glyph.Changed", "propagated", "contour:Contour.Changed"]
        );
    }

    #[test]
    fn failing_observer_does_not_stop_fan_out() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let poster = ObjectId::next();

        center
            .add_observer(ObjectId::next(), "fail", "Lib.Changed", Some(poster), |_| {
                anyhow::bail!("observer exploded")
            })
            .unwrap();
        center
            .add_observer(ObjectId::next(), "record", "Lib.Changed", Some(poster), record(&log, "b"))
            .unwrap();

        let error = center.post_notification("Lib.Changed", poster, None).unwrap_err();
        match error {
            Error::ObserverFailed {
                event,
                failed,
                delivered,
                source,
            } => {
                assert_eq!(event, "Lib.Changed");
                assert_eq!(failed, 1);
                assert_eq!(delivered, 2);
                assert_eq!(source.to_string(), "observer exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(entries(&log), vec!["b:Lib.Changed"]);
    }

    #[test]
    fn held_notifications_are_coalesced() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let poster = ObjectId::next();
        let observer = ObjectId::next();

        center
            .add_observer(observer, "record", "Contour.Changed", Some(poster), record(&log, "a"))
            .unwrap();
        center
            .add_observer(observer, "record", "Contour.PointsChanged", Some(poster), record(&log, "a"))
            .unwrap();

        center.hold_notifications(Some(poster));
        center.post_notification("Contour.PointsChanged", poster, None).unwrap();
        for _ in 0..3 {
            center.post_notification("Contour.Changed", poster, None).unwrap();
        }
        assert!(center.are_notifications_held(Some(poster)));
        assert!(entries(&log).is_empty());

        center.release_held_notifications(Some(poster)).unwrap();
        assert!(!center.are_notifications_held(Some(poster)));
        assert_eq!(
            entries(&log),
            vec!["a:Contour.PointsChanged", "a:Contour.Changed"]
        );
    }

    #[test]
    fn nested_holds_are_reference_counted() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let poster = ObjectId::next();

        center
            .add_observer(ObjectId::next(), "record", "Glyph.Changed", Some(poster), record(&log, "a"))
            .unwrap();

        center.hold_notifications(Some(poster));
        center.hold_notifications(Some(poster));
        center.post_notification("Glyph.Changed", poster, None).unwrap();

        center.release_held_notifications(Some(poster)).unwrap();
        assert!(entries(&log).is_empty());

        center.release_held_notifications(Some(poster)).unwrap();
        assert_eq!(entries(&log), vec!["a:Glyph.Changed"]);

        let error = center.release_held_notifications(Some(poster)).unwrap_err();
        assert!(matches!(error, Error::UnbalancedRelease(_)));
    }

    #[test]
    fn poster_hold_leaves_other_posters_alone() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let held = ObjectId::next();
        let free = ObjectId::next();

        center
            .add_observer(ObjectId::next(), "record", "Glyph.Changed", None, record(&log, "a"))
            .unwrap();

        center.hold_notifications(Some(held));
        center.post_notification("Glyph.Changed", held, None).unwrap();
        center.post_notification("Glyph.Changed", free, None).unwrap();
        assert_eq!(entries(&log).len(), 1);

        center.release_held_notifications(Some(held)).unwrap();
        assert_eq!(entries(&log).len(), 2);
    }

    #[test]
    fn global_hold_queues_every_poster() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let first = ObjectId::next();
        let second = ObjectId::next();

        center
            .add_observer(ObjectId::next(), "record", "Glyph.Changed", None, record(&log, "a"))
            .unwrap();

        center.hold_notifications(None);
        center.post_notification("Glyph.Changed", first, None).unwrap();
        center.post_notification("Glyph.Changed", second, None).unwrap();
        center.post_notification("Glyph.Changed", first, None).unwrap();
        assert!(entries(&log).is_empty());

        center.release_held_notifications(None).unwrap();
        assert_eq!(entries(&log).len(), 2);
    }

    #[test]
    fn released_poster_hold_falls_into_outer_global_hold() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let poster = ObjectId::next();

        center
            .add_observer(ObjectId::next(), "record", "Glyph.Changed", None, record(&log, "a"))
            .unwrap();

        center.hold_notifications(None);
        center.hold_notifications(Some(poster));
        center.post_notification("Glyph.Changed", poster, None).unwrap();
        center.release_held_notifications(Some(poster)).unwrap();
        assert!(entries(&log).is_empty());

        center.release_held_notifications(None).unwrap();
        assert_eq!(entries(&log), vec!["a:Glyph.Changed"]);
    }

    #[test]
    fn first_queued_payload_is_kept() {
        let center = NotificationCenter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let poster = ObjectId::next();

        let sink = Rc::clone(&seen);
        center
            .add_observer(ObjectId::next(), "record", "Glyph.WidthChanged", Some(poster), move |n| {
                sink.borrow_mut().push(n.get("newValue").cloned());
                Ok(())
            })
            .unwrap();

        center.hold_notifications(Some(poster));
        center
            .post_notification("Glyph.WidthChanged", poster, Some(user_info([("newValue", 500)])))
            .unwrap();
        center
            .post_notification("Glyph.WidthChanged", poster, Some(user_info([("newValue", 600)])))
            .unwrap();
        center.release_held_notifications(Some(poster)).unwrap();

        assert_eq!(*seen.borrow(), vec![Some(serde_json::Value::from(500))]);
    }

    #[test]
    fn disabled_notifications_are_dropped() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let poster = ObjectId::next();

        center
            .add_observer(ObjectId::next(), "record", "Info.Changed", Some(poster), record(&log, "a"))
            .unwrap();

        center.disable_notifications(Some(poster));
        assert!(center.are_notifications_disabled(Some(poster)));
        center.post_notification("Info.Changed", poster, None).unwrap();
        center.enable_notifications(Some(poster)).unwrap();
        assert!(entries(&log).is_empty());

        center.post_notification("Info.Changed", poster, None).unwrap();
        assert_eq!(entries(&log), vec!["a:Info.Changed"]);

        let error = center.enable_notifications(Some(poster)).unwrap_err();
        assert!(matches!(error, Error::UnbalancedEnable(_)));
    }

    #[test]
    fn batch_releases_after_closure() {
        let center = NotificationCenter::new();
        let log = Log::default();
        let poster = ObjectId::next();

        center
            .add_observer(ObjectId::next(), "record", "Contour.Changed", Some(poster), record(&log, "a"))
            .unwrap();

        let value = center
            .batch(Some(poster), || {
                for _ in 0..5 {
                    center.post_notification("Contour.Changed", poster, None)?;
                }
                Ok(42)
            })
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(entries(&log), vec!["a:Contour.Changed"]);
        assert!(!center.are_notifications_held(Some(poster)));
    }

    #[test]
    fn posting_without_observers_is_a_no_op() {
        let center = NotificationCenter::new();
        center
            .post_notification("Nobody.Listens", ObjectId::next(), None)
            .unwrap();
        assert_eq!(center.observer_count(), 0);
    }

    #[test]
    fn purge_forgets_observer_and_poster() {
        let center = NotificationCenter::new();
        let glyph = ObjectId::next();
        let watcher = ObjectId::next();

        center
            .add_observer(glyph, "destroy", "Glyph.Changed", Some(glyph), |_| Ok(()))
            .unwrap();
        center
            .add_observer(watcher, "record", "Glyph.Changed", Some(glyph), |_| Ok(()))
            .unwrap();
        center
            .add_observer(watcher, "record", "Font.Changed", None, |_| Ok(()))
            .unwrap();
        center.hold_notifications(Some(glyph));

        assert_eq!(center.purge(glyph), 2);
        assert_eq!(center.observer_count(), 1);
        assert!(!center.are_notifications_held(Some(glyph)));
    }

    struct Watcher {
        id: ObjectId,
        seen: RefCell<Vec<String>>,
    }

    impl Observer for Watcher {
        fn observer_id(&self) -> ObjectId {
            self.id
        }

        fn handle_notification(&self, selector: &str, notification: &Notification) -> anyhow::Result<()> {
            self.seen
                .borrow_mut()
                .push(format!("{selector}({})", notification.name()));
            Ok(())
        }
    }

    #[test]
    fn observer_objects_dispatch_by_selector() {
        let center = NotificationCenter::new();
        let poster = ObjectId::next();
        let watcher = Rc::new(Watcher {
            id: ObjectId::next(),
            seen: RefCell::default(),
        });

        center
            .add_observer_object(&watcher, "glyph_changed", "Glyph.Changed", Some(poster))
            .unwrap();
        center
            .add_observer_object(&watcher, "name_changed", "Glyph.NameChanged", Some(poster))
            .unwrap();

        center.post_notification("Glyph.NameChanged", poster, None).unwrap();
        center.post_notification("Glyph.Changed", poster, None).unwrap();
        assert_eq!(
            *watcher.seen.borrow(),
            vec!["name_changed(Glyph.NameChanged)", "glyph_changed(Glyph.Changed)"]
        );
        assert!(center.has_observer(watcher.id, "Glyph.Changed", Some(poster)));

        // a dropped observer is skipped rather than dangling
        drop(watcher);
        center.post_notification("Glyph.Changed", poster, None).unwrap();
    }
}
