//! Router configuration for the account forms.
//!
//! Requests are form encoded; responses are JSON, either a [`FlowResult`]
//! for submissions or a [`Document`] for form pages.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    routing::{get, post},
};
use ep_model::AccountId;
use ep_storage::{AccountProvider, GroupProvider};

use crate::accounts::{
    fields, process_add_account, process_delete_accounts, process_edit_account,
    process_end_impersonation, process_login_as, process_reset_password,
};
use crate::auth::Identity;
use crate::document::Document;
use crate::error::AdminResult;
use crate::flow::FlowResult;
use crate::params::FormParams;
use crate::profile::{
    process_register, process_request_registration, process_update_profile, registration_email,
};
use crate::state::AdminState;
use crate::views::{edit_account_form, edit_profile_form, ProfileMode};

/// Query key naming a field to mark as invalid when rendering a form.
const ERROR_PARAM: &str = "error";

/// Splits a form page query into redisplayed values and field errors.
///
/// The `error` keys are removed, so a query carrying only errors reads as
/// an unsubmitted form.
fn form_query(query: Option<String>) -> AdminResult<(FormParams, Vec<String>)> {
    let mut params = FormParams::parse(query.unwrap_or_default().as_bytes())?;
    let errors = params.take_all(ERROR_PARAM);
    Ok((params, errors))
}

// ============================================================================
// Account administration
// ============================================================================

/// POST /admin/epeople - Create an account
async fn add_account<A, G>(
    State(state): State<AdminState<A, G>>,
    identity: Identity,
    body: Bytes,
) -> AdminResult<Json<FlowResult>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let ctx = state.context_for(identity.0).await?;
    let params = FormParams::parse(&body)?;
    Ok(Json(process_add_account(&state, &ctx, &params).await?))
}

/// GET /admin/epeople/{id} - Edit form
async fn show_account<A, G>(
    State(state): State<AdminState<A, G>>,
    identity: Identity,
    Path(id): Path<u32>,
    RawQuery(query): RawQuery,
) -> AdminResult<Json<Document>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let ctx = state.context_for(identity.0).await?;
    ctx.require_admin()?;
    let (params, errors) = form_query(query)?;
    Ok(Json(
        edit_account_form(&state, &ctx, AccountId(id), &params, &errors).await?,
    ))
}

/// POST /admin/epeople/{id} - Save the edit form
async fn edit_account<A, G>(
    State(state): State<AdminState<A, G>>,
    identity: Identity,
    Path(id): Path<u32>,
    body: Bytes,
) -> AdminResult<Json<FlowResult>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let ctx = state.context_for(identity.0).await?;
    let params = FormParams::parse(&body)?;
    Ok(Json(
        process_edit_account(&state, &ctx, AccountId(id), &params).await?,
    ))
}

/// POST /admin/epeople/{id}/reset-password - Mail a reset token
async fn reset_password<A, G>(
    State(state): State<AdminState<A, G>>,
    identity: Identity,
    Path(id): Path<u32>,
) -> AdminResult<Json<FlowResult>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let ctx = state.context_for(identity.0).await?;
    Ok(Json(
        process_reset_password(&state, &ctx, AccountId(id)).await?,
    ))
}

/// POST /admin/epeople/{id}/login-as - Impersonate the account
async fn login_as<A, G>(
    State(state): State<AdminState<A, G>>,
    identity: Identity,
    Path(id): Path<u32>,
) -> AdminResult<Json<FlowResult>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let ctx = state.context_for(identity.0).await?;
    Ok(Json(process_login_as(&state, &ctx, AccountId(id)).await?))
}

/// POST /impersonation/end - Close an impersonation session
async fn end_impersonation<A, G>(
    State(state): State<AdminState<A, G>>,
    identity: Identity,
    body: Bytes,
) -> AdminResult<Json<FlowResult>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let ctx = state.context_for(identity.0).await?;
    let params = FormParams::parse(&body)?;
    Ok(Json(process_end_impersonation(&state, &ctx, &params).await?))
}

/// POST /admin/epeople/delete - Delete every `select_eperson`
async fn delete_accounts<A, G>(
    State(state): State<AdminState<A, G>>,
    identity: Identity,
    body: Bytes,
) -> AdminResult<Json<FlowResult>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let ctx = state.context_for(identity.0).await?;
    let params = FormParams::parse(&body)?;
    Ok(Json(process_delete_accounts(&state, &ctx, &params).await?))
}

// ============================================================================
// Self service
// ============================================================================

/// GET /profile - Profile form
async fn show_profile<A, G>(
    State(state): State<AdminState<A, G>>,
    identity: Identity,
    RawQuery(query): RawQuery,
) -> AdminResult<Json<Document>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let ctx = state.context_for(identity.0).await?;
    let (params, errors) = form_query(query)?;
    let mode = ProfileMode::Update {
        allow_set_password: true,
    };
    Ok(Json(
        edit_profile_form(&state, &ctx, &mode, &params, &errors).await?,
    ))
}

/// POST /profile - Save the profile form
async fn update_profile<A, G>(
    State(state): State<AdminState<A, G>>,
    identity: Identity,
    body: Bytes,
) -> AdminResult<Json<FlowResult>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let ctx = state.context_for(identity.0).await?;
    let params = FormParams::parse(&body)?;
    Ok(Json(
        process_update_profile(&state, &ctx, &params, true).await?,
    ))
}

/// POST /register/request - Mail a registration token
async fn request_registration<A, G>(
    State(state): State<AdminState<A, G>>,
    body: Bytes,
) -> AdminResult<Json<FlowResult>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let params = FormParams::parse(&body)?;
    Ok(Json(process_request_registration(&state, &params).await?))
}

/// GET /register?token=... - Registration form
async fn show_register<A, G>(
    State(state): State<AdminState<A, G>>,
    RawQuery(query): RawQuery,
) -> AdminResult<Json<Document>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let ctx = state.context_for(None).await?;
    let (params, errors) = form_query(query)?;
    let token = params.get(fields::TOKEN);
    let email = registration_email(&state, &token).await?;
    let mode = ProfileMode::Register { email, token };
    Ok(Json(
        edit_profile_form(&state, &ctx, &mode, &params, &errors).await?,
    ))
}

/// POST /register - Create an account for the token's address
async fn register<A, G>(
    State(state): State<AdminState<A, G>>,
    body: Bytes,
) -> AdminResult<Json<FlowResult>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    let params = FormParams::parse(&body)?;
    let token = params.get(fields::TOKEN);
    Ok(Json(process_register(&state, &token, &params).await?))
}

// ============================================================================
// Router Builders
// ============================================================================

/// Creates the account administration router.
///
/// Every route requires an administrator, except login-as which reports
/// a refusal as an unsuccessful result.
pub fn admin_router<A, G>() -> Router<AdminState<A, G>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    Router::new()
        .route("/admin/epeople", post(add_account::<A, G>))
        .route("/admin/epeople/delete", post(delete_accounts::<A, G>))
        .route(
            "/admin/epeople/{id}",
            get(show_account::<A, G>).post(edit_account::<A, G>),
        )
        .route(
            "/admin/epeople/{id}/reset-password",
            post(reset_password::<A, G>),
        )
        .route("/admin/epeople/{id}/login-as", post(login_as::<A, G>))
}

/// Creates the router for closing impersonation sessions.
///
/// Open to any authenticated account; the flow checks that the caller
/// opened the session or is the impersonated account.
pub fn impersonation_router<A, G>() -> Router<AdminState<A, G>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    Router::new().route("/impersonation/end", post(end_impersonation::<A, G>))
}

/// Creates the self-service router (profile and registration).
pub fn profile_router<A, G>() -> Router<AdminState<A, G>>
where
    A: AccountProvider + 'static,
    G: GroupProvider + 'static,
{
    Router::new()
        .route(
            "/profile",
            get(show_profile::<A, G>).post(update_profile::<A, G>),
        )
        .route(
            "/register",
            get(show_register::<A, G>).post(register::<A, G>),
        )
        .route("/register/request", post(request_registration::<A, G>))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_query_collects_errors() {
        let (params, errors) =
            form_query(Some("first_name=Ana&error=last_name&error=email_taken".to_string()))
                .unwrap();
        assert_eq!(params.get(fields::FIRST_NAME), "Ana");
        assert_eq!(errors, vec!["last_name", "email_taken"]);
        assert!(!params.contains(ERROR_PARAM));
    }

    #[test]
    fn form_query_tolerates_missing_query() {
        let (params, errors) = form_query(None).unwrap();
        assert!(params.is_empty());
        assert!(errors.is_empty());
    }
}
