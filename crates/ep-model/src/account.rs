//! Account domain model.
//!
//! Accounts are the user identities of the repository. They are created
//! by an administrator or through self-registration, carry a set of
//! profile attributes, and may belong to groups.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::ProfileField;

/// Numeric account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u32);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for AccountId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    // === Identity ===
    /// Unique identifier (assigned by the store on creation).
    pub id: AccountId,
    /// Unique email address.
    pub email: String,

    // === Profile ===
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Preferred interface language (locale tag).
    pub language: Option<String>,
    /// Profile attributes. Unset fields are absent.
    pub attributes: BTreeMap<ProfileField, String>,

    // === Flags ===
    /// Whether the account may log in.
    pub can_log_in: bool,
    /// Whether the account must authenticate with a certificate.
    pub require_certificate: bool,
    /// Whether the account was created through self-registration.
    pub self_registered: bool,

    // === Security ===
    /// PHC-formatted password hash, if a password was ever set.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    // === Timestamps ===
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new account with the given email.
    ///
    /// The id is a placeholder until the store assigns one.
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId(0),
            email: email.into(),
            first_name: None,
            last_name: None,
            language: None,
            attributes: BTreeMap::new(),
            can_log_in: false,
            require_certificate: false,
            self_registered: false,
            password_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the first name.
    #[must_use]
    pub fn with_first_name(mut self, name: impl Into<String>) -> Self {
        self.first_name = Some(name.into());
        self
    }

    /// Sets the last name.
    #[must_use]
    pub fn with_last_name(mut self, name: impl Into<String>) -> Self {
        self.last_name = Some(name.into());
        self
    }

    /// Sets whether the account may log in.
    #[must_use]
    pub const fn with_can_log_in(mut self, can_log_in: bool) -> Self {
        self.can_log_in = can_log_in;
        self
    }

    /// Sets a profile attribute.
    #[must_use]
    pub fn with_attribute(mut self, field: ProfileField, value: impl Into<String>) -> Self {
        self.set_attribute(field, value);
        self
    }

    /// Gets the full name ("First Last"), tolerating missing parts.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => String::new(),
        }
    }

    /// Gets a profile attribute value.
    #[must_use]
    pub fn attribute(&self, field: ProfileField) -> Option<&str> {
        self.attributes.get(&field).map(String::as_str)
    }

    /// Sets a profile attribute. An empty value clears it.
    pub fn set_attribute(&mut self, field: ProfileField, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.attributes.remove(&field);
        } else {
            self.attributes.insert(field, value);
        }
    }

    /// Checks whether the stored email matches `email`, ignoring case.
    #[must_use]
    pub fn has_email(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}
