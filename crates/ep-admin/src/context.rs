//! Per-request context.

use ep_model::Account;

use crate::error::{AdminError, AdminResult};

/// State of the request being handled, passed explicitly to every flow
/// and view.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The authenticated account, if any.
    pub current: Option<Account>,
    /// Whether the current account is an administrator.
    pub is_admin: bool,
    /// Locale used for the response.
    pub locale: String,
    /// Prefix for every generated URL.
    pub context_path: String,
}

impl RequestContext {
    /// Context for an anonymous request.
    #[must_use]
    pub fn anonymous(locale: impl Into<String>, context_path: impl Into<String>) -> Self {
        Self {
            current: None,
            is_admin: false,
            locale: locale.into(),
            context_path: context_path.into(),
        }
    }

    /// Attaches the authenticated account.
    #[must_use]
    pub fn with_account(mut self, account: Account, is_admin: bool) -> Self {
        self.current = Some(account);
        self.is_admin = is_admin;
        self
    }

    /// Returns the authenticated account.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` for anonymous requests.
    pub fn require_account(&self) -> AdminResult<&Account> {
        self.current.as_ref().ok_or(AdminError::Unauthorized)
    }

    /// Ensures the current account is an administrator.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` for anonymous requests and
    /// `AdminError::Forbidden` for non-administrators.
    pub fn require_admin(&self) -> AdminResult<&Account> {
        let account = self.require_account()?;
        if self.is_admin {
            Ok(account)
        } else {
            Err(AdminError::Forbidden(
                "administrator rights required".to_string(),
            ))
        }
    }

    /// Joins `path` onto the context path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.context_path.trim_end_matches('/'), path)
    }
}
