//! Use cases (interactors) for Sahayak
//!
//! Use cases orchestrate domain entities through port interfaces.
//!
//! ## Use Cases
//!
//! - [`ContentRepository`] - User content, saved content, activity and likes

pub mod content_repository;

pub use content_repository::{
    ContentRepository, HistoryLimits, ProfileStats, DEFAULT_ACTIVITY_LIMIT, DEFAULT_LIKES_LIMIT,
    RECENT_ACTIVITY_KEY, RECENT_LIKES_KEY, SAVED_CONTENT_KEY,
};
