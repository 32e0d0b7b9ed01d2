//! # ep-auth
//!
//! Authentication collaborators for the account forms.
//!
//! The forms never manage sessions themselves. They call into the
//! [`AuthenticationService`] to impersonate an account or to start a
//! password reset or registration, and into [`PasswordHasherService`]
//! when a password is chosen on the profile or registration form.
//!
//! ## Features
//!
//! - Argon2id password hashing
//! - Single-use, expiring password reset and registration tokens
//! - Pluggable [`Mailer`] with tracing and recording implementations
//! - Impersonation ("login as") with administrator checks and expiring sessions

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod mail;
pub mod password;
pub mod service;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use mail::{MailMessage, Mailer, RecordingMailer, TracingMailer};
pub use password::{PasswordHasherService, PasswordPolicy};
pub use service::{AuthenticationService, DirectoryAuthService, ImpersonationSession};
pub use token::{
    RegistrationToken, RegistrationTokenStore, ResetToken, ResetTokenStore, Token, TokenStore,
};
