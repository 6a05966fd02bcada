//! Sahayak Core - Domain logic for the offline-first layer
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `ContentPayload`, `ContentRecord`, `SyncItem`, `Notification`, `ActivityEntry`
//! - **Use cases** - `ContentRepository`
//! - **Port definitions** - Traits for adapters: `IKeyValueStore`, `ISyncService`, `IConnectivityProbe`, `INotificationSink`, `IClock`
//! - **Persistent store** - Namespaced JSON over any `IKeyValueStore`
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod store;
pub mod usecases;
