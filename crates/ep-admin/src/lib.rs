//! # ep-admin
//!
//! Account administration and self-service profile forms for epeople.
//!
//! This crate holds the form flows (create, edit, batch delete, password
//! reset, login-as, profile update and registration), the abstract UI
//! document the forms are rendered into, the group membership resolver
//! used to explain inherited memberships, and an Axum router over all of
//! it.
//!
//! ## Modules
//!
//! - [`accounts`] - Administrative account flows
//! - [`profile`] - Profile update and registration flows
//! - [`membership`] - Direct vs inherited group membership
//! - [`document`] - Serializable UI document
//! - [`views`] - Form documents
//! - [`flow`] - Flow results
//! - [`auth`] - Request identity middleware
//! - [`router`] - Axum router and HTTP handlers
//!
//! ## Quick Start
//!
//! ```ignore
//! use ep_admin::{
//!     admin_router, identity_middleware, impersonation_router, profile_router, AdminState,
//!     IdentityHeader,
//! };
//! use std::sync::Arc;
//!
//! let state = AdminState::new(directory.clone(), directory.clone(), directory, auth, config);
//! let app = admin_router()
//!     .merge(profile_router())
//!     .merge(impersonation_router())
//!     .with_state(state)
//!     .layer(axum::middleware::from_fn_with_state(header, identity_middleware));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/admin/epeople` | Create an account |
//! | GET | `/admin/epeople/{id}` | Edit form document |
//! | POST | `/admin/epeople/{id}` | Save the edit form |
//! | POST | `/admin/epeople/{id}/reset-password` | Mail a password reset token |
//! | POST | `/admin/epeople/{id}/login-as` | Impersonate the account |
//! | POST | `/admin/epeople/delete` | Delete every `select_eperson` |
//! | POST | `/impersonation/end` | Close an impersonation session |
//! | GET | `/profile` | Profile form document |
//! | POST | `/profile` | Save the profile form |
//! | POST | `/register/request` | Mail a registration token |
//! | GET | `/register?token=...` | Registration form document |
//! | POST | `/register` | Register the token's address |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accounts;
pub mod auth;
pub mod context;
pub mod document;
pub mod error;
pub mod flow;
pub mod membership;
pub mod params;
pub mod profile;
pub mod router;
pub mod state;
pub mod views;

pub use accounts::{
    process_add_account, process_delete_accounts, process_edit_account, process_end_impersonation,
    process_login_as, process_reset_password,
};
pub use auth::{identity_middleware, AuthenticatedAccount, Identity, IdentityHeader};
pub use context::RequestContext;
pub use document::Document;
pub use error::{AdminError, AdminResult, ErrorResponse};
pub use flow::FlowResult;
pub use membership::{GroupIndex, Membership, MembershipResolver};
pub use params::FormParams;
pub use profile::{
    process_register, process_request_registration, process_update_profile, registration_email,
};
pub use router::{admin_router, impersonation_router, profile_router};
pub use state::AdminState;
pub use views::{edit_account_form, edit_profile_form, ProfileMode};
