//! # ep-model
//!
//! Domain models for epeople.
//!
//! This crate defines the entities the account forms operate on:
//! [`Account`], [`Group`], the [`Collection`]s an account can subscribe
//! to, the closed set of [`ProfileField`]s and the [`DeleteConstraint`]s
//! that block account deletion.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod collection;
pub mod constraint;
pub mod group;
pub mod profile;

pub use account::{Account, AccountId};
pub use collection::{Collection, CollectionId};
pub use constraint::DeleteConstraint;
pub use group::{Group, GroupId};
pub use profile::{ProfileField, SelectChoice};
