//! Cached derived data
//!
//! A representation is a value computed from an object's current state by a
//! named factory, cached per object and parameter set, and evicted when the
//! object posts one of the factory's destructive notifications.

pub mod cache;
pub mod factories;
pub mod parameters;
pub mod registry;

pub use cache::RepresentationCache;
pub use factories::DEFAULT_TOLERANCE;
pub use parameters::{ParamValue, Parameters, RepresentationKey};
pub use registry::RepresentationRegistry;
