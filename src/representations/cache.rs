//! Per-object representation cache
//!
//! Every cached value remembers which notifications destroy it. Entries are
//! evicted synchronously when one of those notifications is posted by the
//! owner, so a cached value is always the factory output for the owner's
//! current state. Recomputation waits for the next request.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;

use tracing::{trace, warn};

use super::parameters::{Parameters, RepresentationKey};
use crate::core::errors::{Error, Result};

struct CachedValue {
    value: Rc<dyn Any>,
    destroyed_by: Arc<[String]>,
}

/// A computation in progress. `stale` is set when the owner changes before
/// the factory returns.
struct InFlight {
    destroyed_by: Arc<[String]>,
    stale: bool,
}

#[derive(Default)]
pub struct RepresentationCache {
    entries: RefCell<BTreeMap<RepresentationKey, CachedValue>>,
    in_flight: RefCell<HashMap<RepresentationKey, InFlight>>,
    subscribed: RefCell<HashSet<String>>,
}

impl RepresentationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &RepresentationKey) -> Option<Rc<dyn Any>> {
        self.entries
            .borrow()
            .get(key)
            .map(|cached| Rc::clone(&cached.value))
    }

    pub fn contains(&self, key: &RepresentationKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Cached keys in canonical order
    pub fn keys(&self) -> Vec<RepresentationKey> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Mark `key` as being computed. A second request for the same key
    /// before [`finish`](Self::finish) is a cycle.
    pub(crate) fn begin(&self, key: &RepresentationKey, destroyed_by: Arc<[String]>) -> Result<()> {
        let mut in_flight = self.in_flight.borrow_mut();
        if in_flight.contains_key(key) {
            return Err(Error::RepresentationCycle(key.to_string()));
        }
        in_flight.insert(
            key.clone(),
            InFlight {
                destroyed_by,
                stale: false,
            },
        );
        Ok(())
    }

    /// Complete a computation started with [`begin`](Self::begin). Returns
    /// whether the value was cached.
    pub(crate) fn finish(&self, key: &RepresentationKey, value: Option<Rc<dyn Any>>) -> bool {
        let Some(flight) = self.in_flight.borrow_mut().remove(key) else {
            return false;
        };
        let Some(value) = value else {
            return false;
        };
        if flight.stale {
            warn!("Discarding representation {key}: its owner changed while it was computed");
            return false;
        }
        let replaced = self.entries.borrow_mut().insert(
            key.clone(),
            CachedValue {
                value,
                destroyed_by: flight.destroyed_by,
            },
        );
        drop(replaced);
        true
    }

    /// Evict every entry destroyed by `notification`
    pub fn invalidate(&self, notification: &str) -> usize {
        for flight in self.in_flight.borrow_mut().values_mut() {
            if flight.destroyed_by.iter().any(|name| name == notification) {
                flight.stale = true;
            }
        }
        let evicted = self.evict(|_, cached| {
            cached.destroyed_by.iter().any(|name| name == notification)
        });
        if evicted > 0 {
            trace!("{notification} evicted {evicted} representations");
        }
        evicted
    }

    /// Evict one entry (`name` and `parameters`), every entry called `name`,
    /// or everything when `name` is `None`.
    pub fn remove(&self, name: Option<&str>, parameters: Option<&Parameters>) -> usize {
        match (name, parameters) {
            (None, _) => self.clear(),
            (Some(name), None) => self.evict(|key, _| key.name == name),
            (Some(name), Some(parameters)) => {
                self.evict(|key, _| key.name == name && key.parameters == *parameters)
            }
        }
    }

    /// Evict everything, including values still being computed
    pub fn clear(&self) -> usize {
        for flight in self.in_flight.borrow_mut().values_mut() {
            flight.stale = true;
        }
        let removed = std::mem::take(&mut *self.entries.borrow_mut());
        removed.len()
    }

    fn evict(&self, matches: impl Fn(&RepresentationKey, &CachedValue) -> bool) -> usize {
        // values are dropped after the borrow ends
        let evicted: Vec<CachedValue> = {
            let mut entries = self.entries.borrow_mut();
            let keys: Vec<RepresentationKey> = entries
                .iter()
                .filter(|(key, cached)| matches(key, cached))
                .map(|(key, _)| key.clone())
                .collect();
            keys.iter().filter_map(|key| entries.remove(key)).collect()
        };
        evicted.len()
    }

    /// Record a subscription to `notification`. Returns `false` when it was
    /// already recorded.
    pub(crate) fn mark_subscribed(&self, notification: &str) -> bool {
        self.subscribed.borrow_mut().insert(notification.to_string())
    }

    pub(crate) fn reset_subscriptions(&self) {
        self.subscribed.borrow_mut().clear();
    }
}

impl std::fmt::Debug for RepresentationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepresentationCache")
            .field("keys", &self.keys())
            .field("in_flight", &self.in_flight.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> RepresentationKey {
        RepresentationKey::new(name, Parameters::new())
    }

    fn destroyed_by(names: &[&str]) -> Arc<[String]> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn store(cache: &RepresentationCache, key: &RepresentationKey, value: usize, by: &[&str]) {
        cache.begin(key, destroyed_by(by)).unwrap();
        assert!(cache.finish(key, Some(Rc::new(value))));
    }

    #[test]
    fn invalidation_is_scoped_by_notification() {
        let cache = RepresentationCache::new();
        store(&cache, &key("bounds"), 1, &["Glyph.Changed"]);
        store(&cache, &key("name"), 2, &["Glyph.NameChanged"]);

        assert_eq!(cache.invalidate("Glyph.WidthChanged"), 0);
        assert_eq!(cache.invalidate("Glyph.Changed"), 1);
        assert_eq!(cache.keys(), vec![key("name")]);
    }

    #[test]
    fn reentrant_request_is_a_cycle() {
        let cache = RepresentationCache::new();
        cache.begin(&key("area"), destroyed_by(&["Contour.Changed"])).unwrap();
        let error = cache
            .begin(&key("area"), destroyed_by(&["Contour.Changed"]))
            .unwrap_err();
        assert!(matches!(error, Error::RepresentationCycle(_)));
    }

    #[test]
    fn value_computed_during_change_is_not_cached() {
        let cache = RepresentationCache::new();
        let area = key("area");
        cache.begin(&area, destroyed_by(&["Contour.Changed"])).unwrap();
        cache.invalidate("Contour.Changed");
        assert!(!cache.finish(&area, Some(Rc::new(3.0f64))));
        assert!(!cache.contains(&area));

        // the key can be computed again afterwards
        cache.begin(&area, destroyed_by(&["Contour.Changed"])).unwrap();
        assert!(cache.finish(&area, Some(Rc::new(4.0f64))));
        let value = cache.get(&area).unwrap();
        assert_eq!(value.downcast_ref::<f64>(), Some(&4.0));
    }

    #[test]
    fn failed_computation_is_not_cached() {
        let cache = RepresentationCache::new();
        let bounds = key("bounds");
        cache.begin(&bounds, destroyed_by(&["Glyph.Changed"])).unwrap();
        assert!(!cache.finish(&bounds, None));
        assert!(cache.is_empty());
        cache.begin(&bounds, destroyed_by(&["Glyph.Changed"])).unwrap();
    }

    #[test]
    fn remove_by_name_and_parameters() {
        let cache = RepresentationCache::new();
        let fine = RepresentationKey::new("flat", Parameters::new().with("tolerance", 0.1));
        let coarse = RepresentationKey::new("flat", Parameters::new().with("tolerance", 1.0));
        store(&cache, &fine, 1, &["Contour.Changed"]);
        store(&cache, &coarse, 2, &["Contour.Changed"]);
        store(&cache, &key("area"), 3, &["Contour.Changed"]);

        assert_eq!(cache.remove(Some("flat"), Some(&fine.parameters)), 1);
        assert!(cache.contains(&coarse));
        assert_eq!(cache.remove(Some("flat"), None), 1);
        assert_eq!(cache.remove(None, None), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn subscriptions_are_recorded_once() {
        let cache = RepresentationCache::new();
        assert!(cache.mark_subscribed("Glyph.Changed"));
        assert!(!cache.mark_subscribed("Glyph.Changed"));
        cache.reset_subscriptions();
        assert!(cache.mark_subscribed("Glyph.Changed"));
    }
}
