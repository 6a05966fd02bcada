//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IKeyValueStore`] - Storage medium behind the persistent store
//! - [`ISyncService`] - Remote submission of queued items
//! - [`IConnectivityProbe`] - Online/offline sampling
//! - [`INotificationSink`] - User-facing notifications
//! - [`IClock`] - Time source for timestamps and ids

pub mod clock;
pub mod connectivity;
pub mod key_value_store;
pub mod notification;
pub mod sync_service;

pub use clock::{IClock, ManualClock, SystemClock};
pub use connectivity::IConnectivityProbe;
pub use key_value_store::IKeyValueStore;
pub use notification::INotificationSink;
pub use sync_service::ISyncService;
