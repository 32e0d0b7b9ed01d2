//! Password hashing and verification using Argon2id.
//!
//! Passwords chosen on the profile and registration forms are checked
//! against a minimum length and stored as PHC strings.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{AuthError, AuthResult};

/// Password hashing configuration.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Shortest password accepted, in characters.
    pub min_length: usize,
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl PasswordPolicy {
    /// Creates a new password policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum length.
    #[must_use]
    pub const fn min_length(mut self, chars: usize) -> Self {
        self.min_length = chars;
        self
    }

    /// Sets the memory cost in KiB.
    #[must_use]
    pub const fn memory_cost(mut self, kib: u32) -> Self {
        self.memory_cost = kib;
        self
    }

    /// Sets the time cost (iterations).
    #[must_use]
    pub const fn time_cost(mut self, iterations: u32) -> Self {
        self.time_cost = iterations;
        self
    }

    fn build_params(&self) -> Result<Params, argon2::Error> {
        Params::new(self.memory_cost, self.time_cost, self.parallelism, Some(32))
    }
}

/// Password hasher using Argon2id.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasherService {
    policy: PasswordPolicy,
}

impl PasswordHasherService {
    /// Creates a new password hasher with the given policy.
    #[must_use]
    pub const fn new(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Checks a candidate password against the policy.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password is too short.
    pub fn check(&self, password: &str) -> AuthResult<()> {
        if password.chars().count() < self.policy.min_length {
            return Err(AuthError::WeakPassword(format!(
                "must be at least {} characters",
                self.policy.min_length
            )));
        }
        Ok(())
    }

    /// Hashes a password.
    ///
    /// Returns the PHC-formatted hash string.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let params = self
            .policy
            .build_params()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Verifies a password against a hash.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if verification fails.
    pub fn verify(&self, password: &str, hash: &str) -> AuthResult<()> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Internal(e.to_string()))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}
