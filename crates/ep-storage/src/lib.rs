//! # ep-storage
//!
//! Storage abstraction traits for epeople.
//!
//! The forms never talk to a database directly; they go through the
//! provider interfaces defined here, which concrete backends implement.
//!
//! ## Provider Traits
//!
//! - [`AccountProvider`] - lookup, create, update and constraint-checked delete of accounts
//! - [`GroupProvider`] - group lookup, direct membership and the membership closure
//! - [`SubscriptionProvider`] - collections and the accounts subscribed to them
//!
//! [`InMemoryDirectory`] implements all three and backs the tests and the demo server.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod error;
pub mod group;
pub mod memory;
pub mod subscription;

pub use account::AccountProvider;
pub use error::{StorageError, StorageResult};
pub use group::GroupProvider;
pub use memory::InMemoryDirectory;
pub use subscription::SubscriptionProvider;
