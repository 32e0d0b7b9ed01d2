//! # ep-core
//!
//! Core configuration and error handling for epeople.
//!
//! This crate provides foundational types used across the other
//! epeople crates: the layered [`Config`] and the top-level [`Error`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;

pub use config::{AccountsConfig, Config, ServerConfig, UiConfig};
pub use error::{Error, Result};
