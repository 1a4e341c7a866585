//! Change notifications
//!
//! Named events flow from posters to observers through a
//! [`NotificationCenter`]. Posters and observers are identified by
//! [`ObjectId`], so the center never keeps anything alive.

pub mod center;
pub mod notification;

pub use center::{NotificationCenter, ObserverCallback};
pub use notification::{user_info, Notification, ObjectId, Observer, UserInfo};
