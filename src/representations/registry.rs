//! Representation factory registry
//!
//! Factories are registered per owner type and name. The registry is shared
//! by every object of an object graph; a process-wide default instance with
//! the built-in geometry factories is used unless a graph is given its own.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::factories;
use super::parameters::Parameters;
use crate::core::errors::{Error, Result};
use crate::objects::Observable;

type ErasedFactory =
    dyn Fn(&dyn Any, Option<&dyn Observable>, &Parameters) -> anyhow::Result<Rc<dyn Any>> + Send + Sync;

/// A factory owned by the caller, registered through
/// [`RepresentationRegistry::add_shared_representation_factory`]
pub type SharedFactory<O, T> =
    Arc<dyn Fn(&O, Option<&dyn Observable>, &Parameters) -> anyhow::Result<T> + Send + Sync>;

/// What makes two registrations "the same factory"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FactoryIdentity {
    /// A function item or a closure without captures
    Stateless(TypeId),
    /// The address of a [`SharedFactory`] allocation
    Shared(usize),
    /// Captures state, so never the same as another registration
    Unique,
}

impl FactoryIdentity {
    fn of<F: 'static>() -> Self {
        if std::mem::size_of::<F>() == 0 {
            Self::Stateless(TypeId::of::<F>())
        } else {
            Self::Unique
        }
    }

    fn matches(self, other: Self) -> bool {
        self != Self::Unique && self == other
    }
}

/// A registered factory, type erased
#[derive(Clone)]
pub(crate) struct FactoryEntry {
    identity: FactoryIdentity,
    pub(crate) compute: Arc<ErasedFactory>,
    pub(crate) destructive_notifications: Option<Arc<[String]>>,
}

fn erase<F>(factory: F) -> Arc<ErasedFactory>
where
    F: Fn(&dyn Any, Option<&dyn Observable>, &Parameters) -> anyhow::Result<Rc<dyn Any>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(factory)
}

static SHARED: Lazy<Arc<RepresentationRegistry>> = Lazy::new(|| {
    let registry = RepresentationRegistry::new();
    if let Err(error) = factories::register_builtin_factories(&registry) {
        warn!("Failed to register built-in representation factories: {error}");
    }
    Arc::new(registry)
});

/// Factories keyed by owner type and representation name
#[derive(Default)]
pub struct RepresentationRegistry {
    factories: RwLock<HashMap<(TypeId, String), FactoryEntry>>,
}

impl RepresentationRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh registry holding the built-in geometry factories
    pub fn with_builtin_factories() -> Result<Self> {
        let registry = Self::new();
        factories::register_builtin_factories(&registry)?;
        Ok(registry)
    }

    /// The process-wide default registry
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Register `factory` as `name` for owners of type `O`, invalidated by the
    /// owner's `Changed` notification.
    ///
    /// Registering the same function again is a no-op. Anything else under
    /// an existing name fails with [`Error::DuplicateFactoryName`], including
    /// a closure that captures state. Use
    /// [`add_shared_representation_factory`](Self::add_shared_representation_factory)
    /// to re-register such a factory.
    pub fn add_representation_factory<O, T, F>(&self, name: &str, factory: F) -> Result<()>
    where
        O: Observable,
        T: 'static,
        F: Fn(&O, Option<&dyn Observable>, &Parameters) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.insert::<O, T, F>(name, FactoryIdentity::of::<F>(), factory, None)
    }

    /// Register a factory by handle. Registering the same `Arc` again is a
    /// no-op; a different one under the same name is a duplicate.
    pub fn add_shared_representation_factory<O, T>(&self, name: &str, factory: SharedFactory<O, T>) -> Result<()>
    where
        O: Observable,
        T: 'static,
    {
        let identity = FactoryIdentity::Shared(Arc::as_ptr(&factory) as *const () as usize);
        self.insert::<O, T, _>(
            name,
            identity,
            move |owner: &O, context: Option<&dyn Observable>, parameters: &Parameters| {
                factory(owner, context, parameters)
            },
            None,
        )
    }

    /// Like [`add_representation_factory`](Self::add_representation_factory),
    /// but cached values are dropped when any of `notifications` is posted by
    /// the owner instead of its `Changed` notification.
    pub fn add_representation_factory_with_notifications<O, T, F>(
        &self,
        name: &str,
        factory: F,
        notifications: &[&str],
    ) -> Result<()>
    where
        O: Observable,
        T: 'static,
        F: Fn(&O, Option<&dyn Observable>, &Parameters) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let notifications: Arc<[String]> = notifications.iter().map(|name| name.to_string()).collect();
        self.insert::<O, T, F>(name, FactoryIdentity::of::<F>(), factory, Some(notifications))
    }

    fn insert<O, T, F>(
        &self,
        name: &str,
        identity: FactoryIdentity,
        factory: F,
        destructive_notifications: Option<Arc<[String]>>,
    ) -> Result<()>
    where
        O: Observable,
        T: 'static,
        F: Fn(&O, Option<&dyn Observable>, &Parameters) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let key = (TypeId::of::<O>(), name.to_string());
        let mut factories = self.factories.write();

        if let Some(existing) = factories.get_mut(&key) {
            if !existing.identity.matches(identity) {
                return Err(Error::DuplicateFactoryName(name.to_string()));
            }
            existing.destructive_notifications = destructive_notifications;
            return Ok(());
        }

        let compute = erase(move |owner, context, parameters| {
            let Some(owner) = owner.downcast_ref::<O>() else {
                anyhow::bail!("owner is not a {}", std::any::type_name::<O>());
            };
            let value = factory(owner, context, parameters)?;
            Ok(Rc::new(value) as Rc<dyn Any>)
        });
        factories.insert(
            key,
            FactoryEntry {
                identity,
                compute,
                destructive_notifications,
            },
        );
        debug!(
            "Registered representation factory '{name}' for {}",
            std::any::type_name::<O>()
        );
        Ok(())
    }

    /// Forget the factory registered as `name` for `O`. Values already cached
    /// on objects stay until they are invalidated.
    pub fn remove_representation_factory<O: Observable>(&self, name: &str) -> bool {
        self.factories
            .write()
            .remove(&(TypeId::of::<O>(), name.to_string()))
            .is_some()
    }

    pub fn has_representation_factory<O: Observable>(&self, name: &str) -> bool {
        self.factories
            .read()
            .contains_key(&(TypeId::of::<O>(), name.to_string()))
    }

    /// Names registered for `O`, sorted
    pub fn factory_names<O: Observable>(&self) -> Vec<String> {
        let owner = TypeId::of::<O>();
        let mut names: Vec<String> = self
            .factories
            .read()
            .keys()
            .filter(|(type_id, _)| *type_id == owner)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub(crate) fn lookup(&self, owner: TypeId, name: &str) -> Option<FactoryEntry> {
        self.factories.read().get(&(owner, name.to_string())).cloned()
    }
}

impl std::fmt::Debug for RepresentationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepresentationRegistry")
            .field("factories", &self.factories.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Contour, Glyph};

    fn point_count(contour: &Contour, _: Option<&dyn Observable>, _: &Parameters) -> anyhow::Result<usize> {
        Ok(contour.len())
    }

    #[test]
    fn same_factory_twice_is_idempotent() {
        let registry = RepresentationRegistry::new();
        registry
            .add_representation_factory::<Contour, _, _>("count", point_count)
            .unwrap();
        registry
            .add_representation_factory::<Contour, _, _>("count", point_count)
            .unwrap();
        assert_eq!(registry.factory_names::<Contour>(), vec!["count"]);
    }

    #[test]
    fn different_factory_same_name_is_rejected() {
        let registry = RepresentationRegistry::new();
        registry
            .add_representation_factory::<Contour, _, _>("count", point_count)
            .unwrap();
        let error = registry
            .add_representation_factory::<Contour, _, _>("count", |_: &Contour, _, _| Ok(0usize))
            .unwrap_err();
        assert!(matches!(error, Error::DuplicateFactoryName(name) if name == "count"));
    }

    fn constant(value: usize) -> impl Fn(&Contour, Option<&dyn Observable>, &Parameters) -> anyhow::Result<usize> + Send + Sync {
        move |_, _, _| Ok(value)
    }

    #[test]
    fn capturing_closures_never_count_as_the_same_factory() {
        let registry = RepresentationRegistry::new();
        registry
            .add_representation_factory::<Contour, _, _>("k", constant(1))
            .unwrap();
        let error = registry
            .add_representation_factory::<Contour, _, _>("k", constant(2))
            .unwrap_err();
        assert!(matches!(error, Error::DuplicateFactoryName(name) if name == "k"));

        let contour = Contour::new(Vec::new());
        let entry = registry.lookup(TypeId::of::<Contour>(), "k").unwrap();
        let value = (entry.compute)(contour.as_any(), None, &Parameters::new()).unwrap();
        assert_eq!(value.downcast_ref::<usize>(), Some(&1));
    }

    #[test]
    fn shared_factories_are_identified_by_handle() {
        let registry = RepresentationRegistry::new();
        let one: SharedFactory<Contour, usize> = Arc::new(constant(1));
        registry
            .add_shared_representation_factory("k", Arc::clone(&one))
            .unwrap();
        registry
            .add_shared_representation_factory("k", Arc::clone(&one))
            .unwrap();

        let two: SharedFactory<Contour, usize> = Arc::new(constant(2));
        assert!(matches!(
            registry.add_shared_representation_factory("k", two),
            Err(Error::DuplicateFactoryName(_))
        ));
        assert_eq!(registry.factory_names::<Contour>(), vec!["k"]);
    }

    #[test]
    fn names_are_scoped_per_owner_type() {
        let registry = RepresentationRegistry::new();
        registry
            .add_representation_factory::<Contour, _, _>("count", point_count)
            .unwrap();
        registry
            .add_representation_factory::<Glyph, _, _>("count", |glyph: &Glyph, _, _| {
                Ok(glyph.contour_count())
            })
            .unwrap();
        assert!(registry.has_representation_factory::<Glyph>("count"));
        assert!(registry.remove_representation_factory::<Contour>("count"));
        assert!(!registry.has_representation_factory::<Contour>("count"));
        assert!(registry.has_representation_factory::<Glyph>("count"));
        assert!(!registry.remove_representation_factory::<Contour>("count"));
    }

    #[test]
    fn shared_registry_has_builtins() {
        let shared = RepresentationRegistry::shared();
        assert!(shared.has_representation_factory::<Contour>("contour.bezpath"));
        assert!(shared.has_representation_factory::<Glyph>("glyph.bounds"));
        assert!(Arc::ptr_eq(&shared, &RepresentationRegistry::shared()));
    }
}
