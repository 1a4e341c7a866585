//! Outline geometry over kurbo

pub mod outline;
