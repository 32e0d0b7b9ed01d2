//! Mailed tokens.
//!
//! A token is a random alphanumeric string bound to one subject: an account
//! for password resets, an email address for registrations. It expires after
//! the configured lifespan and can be redeemed once. Expired tokens are
//! purged whenever the store is written to.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use ep_model::AccountId;
use parking_lot::RwLock;
use rand::distr::{Alphanumeric, SampleString};

use crate::error::{AuthError, AuthResult};

const TOKEN_LENGTH: usize = 32;

/// An issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<K> {
    /// The opaque token value sent by mail.
    pub value: String,
    /// What the token is bound to.
    pub subject: K,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl<K> Token<K> {
    /// Checks whether the token is past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A password reset token.
pub type ResetToken = Token<AccountId>;

/// A registration token, bound to the address it was mailed to.
pub type RegistrationToken = Token<String>;

/// Outstanding tokens.
#[derive(Debug)]
pub struct TokenStore<K> {
    lifespan: Duration,
    tokens: RwLock<HashMap<String, Token<K>>>,
}

/// Outstanding password reset tokens.
pub type ResetTokenStore = TokenStore<AccountId>;

/// Outstanding registration tokens.
pub type RegistrationTokenStore = TokenStore<String>;

impl<K> TokenStore<K>
where
    K: Clone + PartialEq,
{
    /// Creates a store whose tokens live for `lifespan`.
    #[must_use]
    pub fn new(lifespan: std::time::Duration) -> Self {
        Self {
            lifespan: Duration::from_std(lifespan).unwrap_or(Duration::days(1)),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Issues a token for the subject.
    ///
    /// Earlier tokens for the same subject are revoked.
    pub fn issue(&self, subject: K) -> Token<K> {
        let now = Utc::now();
        let token = Token {
            value: Alphanumeric.sample_string(&mut rand::rng(), TOKEN_LENGTH),
            subject,
            expires_at: now + self.lifespan,
        };

        let mut tokens = self.tokens.write();
        tokens.retain(|_, t| t.subject != token.subject && !t.is_expired_at(now));
        tokens.insert(token.value.clone(), token.clone());
        token
    }

    /// Returns the subject of a live token without consuming it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown or expired.
    pub fn peek(&self, value: &str) -> AuthResult<K> {
        self.tokens
            .read()
            .get(value)
            .filter(|t| !t.is_expired_at(Utc::now()))
            .map(|t| t.subject.clone())
            .ok_or(AuthError::InvalidToken)
    }

    /// Redeems a token, returning its subject.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown, was
    /// already redeemed or has expired.
    pub fn redeem(&self, value: &str) -> AuthResult<K> {
        let now = Utc::now();
        let mut tokens = self.tokens.write();
        let token = tokens.remove(value);
        tokens.retain(|_, t| !t.is_expired_at(now));
        let token = token.ok_or(AuthError::InvalidToken)?;

        if token.is_expired_at(now) {
            return Err(AuthError::InvalidToken);
        }
        Ok(token.subject)
    }

    /// Number of outstanding tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    /// Returns `true` if no tokens are outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}
