//! Notification records and object identity

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Arbitrary payload attached to a notification
pub type UserInfo = serde_json::Map<String, Value>;

/// Identity of anything that posts or observes notifications
///
/// Ids are never reused within a process, so a stale id can only ever miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate a fresh identity
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An event broadcast from a poster to interested observers
///
/// Created at post time, read-only afterwards and dropped after delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    name: String,
    poster: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_info: Option<UserInfo>,
}

impl Notification {
    pub fn new(name: impl Into<String>, poster: ObjectId, user_info: Option<UserInfo>) -> Self {
        Self {
            name: name.into(),
            poster,
            user_info,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The object that raised the notification
    pub fn poster(&self) -> ObjectId {
        self.poster
    }

    pub fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }

    /// Look up a single payload value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.user_info.as_ref()?.get(key)
    }

    /// Deduplication identity used while notifications are held
    pub(crate) fn same_event(&self, other: &Notification) -> bool {
        self.name == other.name && self.poster == other.poster
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Notification: {} from {}>", self.name, self.poster)
    }
}

/// Build a [`UserInfo`] payload from key/value pairs
pub fn user_info<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> UserInfo
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// An observer that dispatches on the selector name it was registered with
///
/// This is the typed alternative to registering a closure: one object can
/// register several selectors and route them in `handle_notification`.
pub trait Observer {
    fn observer_id(&self) -> ObjectId;

    fn handle_notification(&self, selector: &str, notification: &Notification)
        -> anyhow::Result<()>;
}
