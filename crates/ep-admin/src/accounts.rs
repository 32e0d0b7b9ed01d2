//! Administrative account flows.
//!
//! Each flow handles one form submission: it reads the submitted
//! parameters, validates them, mutates the account through the providers
//! and reports a [`FlowResult`]. All flows require an administrator.

use ep_auth::AuthError;
use ep_model::{Account, AccountId, ProfileField};
use ep_storage::{AccountProvider, GroupProvider, StorageError};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{AdminError, AdminResult};
use crate::flow::FlowResult;
use crate::params::FormParams;
use crate::state::AdminState;

/// Form field names shared by the account forms.
pub mod fields {
    /// Email address.
    pub const EMAIL: &str = "email_address";
    /// First name.
    pub const FIRST_NAME: &str = "first_name";
    /// Last name.
    pub const LAST_NAME: &str = "last_name";
    /// Pseudo-field reported when the email belongs to another account.
    pub const EMAIL_TAKEN: &str = "email_taken";
    /// "Can log in" checkbox.
    pub const CAN_LOG_IN: &str = "can_log_in";
    /// "Requires certificate" checkbox.
    pub const CERTIFICATE: &str = "certificate";
    /// Repeated account id in the batch delete form.
    pub const SELECT_EPERSON: &str = "select_eperson";
    /// New password.
    pub const PASSWORD: &str = "password";
    /// Password confirmation.
    pub const PASSWORD_CONFIRM: &str = "password_confirm";
    /// Preferred language.
    pub const LANGUAGE: &str = "language";
    /// Repeated collection id on the profile form.
    pub const SUBSCRIPTIONS: &str = "subscriptions";
    /// Mailed registration token.
    pub const TOKEN: &str = "token";
    /// Impersonation session to close.
    pub const SESSION_ID: &str = "session_id";
}

/// Message keys reported by the account flows.
pub mod messages {
    /// Account created.
    pub const ADD_SUCCESS: &str = "admin.epeople.add.success";
    /// Account edited.
    pub const EDIT_SUCCESS: &str = "admin.epeople.edit.success";
    /// Every selected account was deleted.
    pub const DELETE_SUCCESS: &str = "admin.epeople.delete.success";
    /// Some selected accounts could not be deleted.
    pub const DELETE_FAILED: &str = "admin.epeople.delete.failed";
    /// Reset mail sent.
    pub const RESET_PASSWORD_SUCCESS: &str = "admin.epeople.reset_password.success";
    /// Impersonation session opened.
    pub const LOGIN_AS_SUCCESS: &str = "admin.epeople.login_as.success";
    /// Impersonation session closed.
    pub const LOGIN_AS_ENDED: &str = "admin.epeople.login_as.ended";
}

/// Sets `field` from the submitted value if it was submitted and differs.
///
/// Returns whether the account changed.
pub(crate) fn apply_profile_fields(account: &mut Account, params: &FormParams) -> bool {
    let mut changed = false;
    for field in ProfileField::ALL {
        let Some(value) = params.get_opt(field.param_name()) else {
            continue;
        };
        if account.attribute(field).unwrap_or_default() != value {
            account.set_attribute(field, value);
            changed = true;
        }
    }
    changed
}

/// Replaces an optional name if the submitted value differs.
pub(crate) fn apply_name(slot: &mut Option<String>, value: &str) -> bool {
    if slot.as_deref().unwrap_or_default() == value {
        return false;
    }
    *slot = (!value.is_empty()).then(|| value.to_string());
    true
}

fn require(result: &mut FlowResult, field: &str, value: &str) {
    if value.is_empty() {
        result.add_error(field);
    }
}

/// Creates an account from the add form.
///
/// Email, first name and last name are required; an email already in use
/// yields `email_taken`. On success the new id is returned as `accountId`.
///
/// # Errors
///
/// Returns `AdminError::Forbidden` for non-administrators and propagates
/// storage failures.
pub async fn process_add_account<A, G>(
    state: &AdminState<A, G>,
    ctx: &RequestContext,
    params: &FormParams,
) -> AdminResult<FlowResult>
where
    A: AccountProvider,
    G: GroupProvider,
{
    ctx.require_admin()?;
    let mut result = FlowResult::new();

    let email = params.get(fields::EMAIL);
    let first = params.get(fields::FIRST_NAME);
    let last = params.get(fields::LAST_NAME);

    require(&mut result, fields::EMAIL, &email);
    require(&mut result, fields::FIRST_NAME, &first);
    require(&mut result, fields::LAST_NAME, &last);

    if !email.is_empty() && state.accounts.get_by_email(&email).await?.is_some() {
        result.add_error(fields::EMAIL_TAKEN);
    }
    if result.has_errors() {
        return Ok(result);
    }

    let mut account = Account::new(email)
        .with_first_name(first)
        .with_last_name(last)
        .with_can_log_in(params.checkbox(fields::CAN_LOG_IN));
    account.require_certificate = params.checkbox(fields::CERTIFICATE);
    account.self_registered = false;
    apply_profile_fields(&mut account, params);

    let id = match state.accounts.create(&account).await {
        Ok(id) => id,
        // Lost a race with another create for the same address.
        Err(e) if e.is_duplicate() => {
            result.add_error(fields::EMAIL_TAKEN);
            return Ok(result);
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(account_id = %id, "account created");

    let mut result = FlowResult::success(messages::ADD_SUCCESS);
    result.set_parameter("accountId", id);
    Ok(result)
}

/// Applies the edit form to an existing account.
///
/// Only values that differ from the stored ones are written, and nothing
/// is written when nothing differs. Changing the email to one used by a
/// different account yields `email_taken` and halts.
///
/// # Errors
///
/// Returns `AdminError::NotFound` for an unknown account.
pub async fn process_edit_account<A, G>(
    state: &AdminState<A, G>,
    ctx: &RequestContext,
    account_id: AccountId,
    params: &FormParams,
) -> AdminResult<FlowResult>
where
    A: AccountProvider,
    G: GroupProvider,
{
    ctx.require_admin()?;
    let mut result = FlowResult::new();

    let email = params.get(fields::EMAIL);
    let first = params.get(fields::FIRST_NAME);
    let last = params.get(fields::LAST_NAME);

    require(&mut result, fields::EMAIL, &email);
    require(&mut result, fields::FIRST_NAME, &first);
    require(&mut result, fields::LAST_NAME, &last);
    if result.has_errors() {
        return Ok(result);
    }

    let mut account = state
        .accounts
        .get_by_id(account_id)
        .await?
        .ok_or_else(|| AdminError::not_found("Account", account_id))?;

    let mut changed = false;
    if account.email != email {
        match state.accounts.get_by_email(&email).await? {
            Some(other) if other.id != account.id => {
                result.add_error(fields::EMAIL_TAKEN);
                return Ok(result);
            }
            _ => {
                account.email = email;
                changed = true;
            }
        }
    }

    changed |= apply_name(&mut account.first_name, &first);
    changed |= apply_name(&mut account.last_name, &last);
    changed |= apply_profile_fields(&mut account, params);

    let can_log_in = params.checkbox(fields::CAN_LOG_IN);
    if account.can_log_in != can_log_in {
        account.can_log_in = can_log_in;
        changed = true;
    }
    let certificate = params.checkbox(fields::CERTIFICATE);
    if account.require_certificate != certificate {
        account.require_certificate = certificate;
        changed = true;
    }

    if changed {
        state.accounts.update(&account).await.map_err(|e| {
            if e.is_duplicate() {
                AdminError::BadRequest(format!("email {} is already in use", account.email))
            } else {
                AdminError::from(e)
            }
        })?;
        tracing::info!(account_id = %account.id, "account updated");
    } else {
        tracing::debug!(account_id = %account.id, "account unchanged, nothing written");
    }

    Ok(FlowResult::success(messages::EDIT_SUCCESS))
}

/// Deletes each selected account independently.
///
/// Accounts that other records still refer to are skipped and listed as
/// `First Last (email)` in the result's characters. Deletions that
/// succeeded are kept even when others fail.
///
/// # Errors
///
/// Returns `AdminError::BadRequest` if an id is not numeric.
pub async fn process_delete_accounts<A, G>(
    state: &AdminState<A, G>,
    ctx: &RequestContext,
    params: &FormParams,
) -> AdminResult<FlowResult>
where
    A: AccountProvider,
    G: GroupProvider,
{
    ctx.require_admin()?;

    let ids = params
        .get_all(fields::SELECT_EPERSON)
        .into_iter()
        .map(|raw| {
            raw.parse::<AccountId>()
                .map_err(|_| AdminError::BadRequest(format!("invalid account id: {raw}")))
        })
        .collect::<AdminResult<Vec<_>>>()?;

    let mut unable = Vec::new();
    for id in ids {
        let Some(account) = state.accounts.get_by_id(id).await? else {
            tracing::warn!(account_id = %id, "account to delete no longer exists");
            continue;
        };

        match state.accounts.delete(id).await {
            Ok(()) => tracing::info!(account_id = %id, "account deleted"),
            Err(StorageError::DeletionConstrained { constraints, .. }) => {
                tracing::warn!(
                    account_id = %id,
                    constraints = ?constraints,
                    "account still referenced, not deleted"
                );
                unable.push(format!(
                    "{} {} ({})",
                    account.first_name.as_deref().unwrap_or_default(),
                    account.last_name.as_deref().unwrap_or_default(),
                    account.email
                ));
            }
            Err(StorageError::NotFound { .. }) => {
                tracing::warn!(account_id = %id, "account vanished before deletion");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let mut result = FlowResult::new();
    if unable.is_empty() {
        result.set_outcome(true);
        result.set_message(messages::DELETE_SUCCESS);
    } else {
        result.set_outcome(false);
        result.set_message(messages::DELETE_FAILED);
        result.set_characters(unable.join(", "));
    }
    Ok(result)
}

/// Mails a password reset token to the account.
///
/// # Errors
///
/// Returns `AdminError::NotFound` for an unknown account and propagates
/// mail failures.
pub async fn process_reset_password<A, G>(
    state: &AdminState<A, G>,
    ctx: &RequestContext,
    account_id: AccountId,
) -> AdminResult<FlowResult>
where
    A: AccountProvider,
    G: GroupProvider,
{
    ctx.require_admin()?;

    let account = state
        .accounts
        .get_by_id(account_id)
        .await?
        .ok_or_else(|| AdminError::not_found("Account", account_id))?;

    state.auth.send_password_reset(&account).await?;

    Ok(FlowResult::success(messages::RESET_PASSWORD_SUCCESS))
}

/// Opens a session in which the current administrator acts as the account.
///
/// A refusal (impersonation disabled, caller not an administrator, target
/// an administrator) is reported as an unsuccessful result whose message
/// is the refusal text. On success the session id is returned as
/// `sessionId`.
///
/// # Errors
///
/// Returns `AdminError::Unauthorized` for anonymous requests and
/// `AdminError::NotFound` for an unknown account.
pub async fn process_login_as<A, G>(
    state: &AdminState<A, G>,
    ctx: &RequestContext,
    account_id: AccountId,
) -> AdminResult<FlowResult>
where
    A: AccountProvider,
    G: GroupProvider,
{
    let caller = ctx.require_account()?;

    match state.auth.login_as(caller, account_id).await {
        Ok(session) => {
            let mut result = FlowResult::success(messages::LOGIN_AS_SUCCESS);
            result.set_parameter("sessionId", session.id);
            Ok(result)
        }
        Err(AuthError::Forbidden(reason)) => {
            tracing::warn!(
                admin_id = %caller.id,
                account_id = %account_id,
                reason = %reason,
                "impersonation refused"
            );
            let mut result = FlowResult::new();
            result.set_continue(true);
            result.set_outcome(false);
            result.set_message(reason);
            Ok(result)
        }
        Err(AuthError::AccountNotFound(_)) => Err(AdminError::not_found("Account", account_id)),
        Err(e) => Err(e.into()),
    }
}

/// Closes the impersonation session named by `session_id`.
///
/// Open to the administrator who opened the session and to the
/// impersonated account. A missing or malformed id yields `session_id`.
///
/// # Errors
///
/// Returns `AdminError::Unauthorized` for anonymous requests,
/// `AdminError::NotFound` for an unknown or lapsed session and
/// `AdminError::Forbidden` for any other caller.
pub async fn process_end_impersonation<A, G>(
    state: &AdminState<A, G>,
    ctx: &RequestContext,
    params: &FormParams,
) -> AdminResult<FlowResult>
where
    A: AccountProvider,
    G: GroupProvider,
{
    let caller = ctx.require_account()?;

    let Ok(session_id) = Uuid::parse_str(&params.get(fields::SESSION_ID)) else {
        let mut result = FlowResult::new();
        result.add_error(fields::SESSION_ID);
        return Ok(result);
    };

    match state.auth.end_impersonation(caller, session_id).await {
        Ok(()) => Ok(FlowResult::success(messages::LOGIN_AS_ENDED)),
        Err(AuthError::SessionNotFound(_)) => Err(AdminError::not_found("Session", session_id)),
        Err(AuthError::Forbidden(reason)) => Err(AdminError::Forbidden(reason)),
        Err(e) => Err(e.into()),
    }
}
