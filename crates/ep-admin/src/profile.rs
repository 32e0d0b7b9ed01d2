//! Self-service profile flows.
//!
//! The profile form lets an account update its own name, demographic
//! fields, language, password and collection subscriptions. Registration
//! takes two steps: a token is mailed to the address, and the registration
//! form creates the account for whoever presents that token.

use std::collections::BTreeSet;

use ep_auth::AuthError;
use ep_model::{Account, AccountId, CollectionId};
use ep_storage::{AccountProvider, GroupProvider};

use crate::accounts::{apply_name, apply_profile_fields, fields};
use crate::context::RequestContext;
use crate::error::{AdminError, AdminResult};
use crate::flow::FlowResult;
use crate::params::FormParams;
use crate::state::AdminState;

/// Message keys reported by the profile flows.
pub mod messages {
    /// Profile saved.
    pub const UPDATE_SUCCESS: &str = "profile.update.success";
    /// Account registered.
    pub const REGISTER_SUCCESS: &str = "profile.register.success";
    /// Registration token mailed.
    pub const REGISTRATION_MAILED: &str = "profile.register.token_sent";
}

/// Checks the password pair, recording `password` or `password_confirm`.
///
/// Returns the password when one was submitted and both checks passed.
fn check_password(
    result: &mut FlowResult,
    params: &FormParams,
    min_length: usize,
    required: bool,
) -> Option<String> {
    let password = params.raw(fields::PASSWORD).unwrap_or_default();
    let confirm = params.raw(fields::PASSWORD_CONFIRM).unwrap_or_default();

    if password.is_empty() && confirm.is_empty() && !required {
        return None;
    }
    if password.chars().count() < min_length {
        result.add_error(fields::PASSWORD);
        return None;
    }
    if password != confirm {
        result.add_error(fields::PASSWORD_CONFIRM);
        return None;
    }
    Some(password.to_string())
}

fn supported_language<A, G>(state: &AdminState<A, G>, params: &FormParams) -> Option<String>
where
    A: AccountProvider,
    G: GroupProvider,
{
    let language = params.get_opt(fields::LANGUAGE)?;
    let ui = &state.config.ui;
    if language.is_empty() || !ui.supported_locales.iter().any(|l| *l == language) {
        tracing::debug!(language = %language, "ignoring unsupported language");
        return None;
    }
    Some(language)
}

async fn hash_password<A, G>(
    state: &AdminState<A, G>,
    result: &mut FlowResult,
    account: &mut Account,
    password: &str,
) -> AdminResult<()>
where
    A: AccountProvider,
    G: GroupProvider,
{
    match state.auth.set_password(account, password).await {
        Ok(()) => Ok(()),
        Err(AuthError::WeakPassword(_)) => {
            result.add_error(fields::PASSWORD);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Replaces the account's subscriptions with the submitted collections.
///
/// Nothing changes unless `subscriptions` was submitted; `-1` alone clears
/// every subscription. Ids of unknown collections are skipped.
async fn apply_subscriptions<A, G>(
    state: &AdminState<A, G>,
    account_id: AccountId,
    params: &FormParams,
) -> AdminResult<bool>
where
    A: AccountProvider,
    G: GroupProvider,
{
    if !params.contains(fields::SUBSCRIPTIONS) {
        return Ok(false);
    }

    let known: BTreeSet<CollectionId> = state
        .subscriptions
        .list_collections()
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    let wanted: BTreeSet<CollectionId> = params
        .get_all(fields::SUBSCRIPTIONS)
        .into_iter()
        .filter_map(|v| v.trim().parse().ok().map(CollectionId))
        .filter(|id| known.contains(id))
        .collect();
    let current: BTreeSet<CollectionId> = state
        .subscriptions
        .subscriptions(account_id)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();

    for id in wanted.difference(&current) {
        state.subscriptions.subscribe(account_id, *id).await?;
    }
    for id in current.difference(&wanted) {
        state.subscriptions.unsubscribe(account_id, *id).await?;
    }
    Ok(wanted != current)
}

/// Saves the profile form for the current account.
///
/// When metadata editing is enabled the names are required and the names
/// and profile fields are written if they differ. A submitted password
/// is set when `allow_set_password` holds; it must be long enough
/// (`password`) and match its confirmation (`password_confirm`). The
/// submitted `subscriptions` replace the account's subscriptions.
///
/// # Errors
///
/// Returns `AdminError::Unauthorized` for anonymous requests.
pub async fn process_update_profile<A, G>(
    state: &AdminState<A, G>,
    ctx: &RequestContext,
    params: &FormParams,
    allow_set_password: bool,
) -> AdminResult<FlowResult>
where
    A: AccountProvider,
    G: GroupProvider,
{
    let current = ctx.require_account()?;
    let edit_metadata = state.config.ui.edit_metadata;
    let mut result = FlowResult::new();

    let first = params.get(fields::FIRST_NAME);
    let last = params.get(fields::LAST_NAME);
    if edit_metadata {
        if first.is_empty() {
            result.add_error(fields::FIRST_NAME);
        }
        if last.is_empty() {
            result.add_error(fields::LAST_NAME);
        }
    }

    let password = if allow_set_password {
        check_password(
            &mut result,
            params,
            state.config.accounts.min_password_length,
            false,
        )
    } else {
        None
    };
    if result.has_errors() {
        return Ok(result);
    }

    let mut account = state
        .accounts
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AdminError::not_found("Account", current.id))?;

    let mut changed = false;
    if edit_metadata {
        changed |= apply_name(&mut account.first_name, &first);
        changed |= apply_name(&mut account.last_name, &last);
        changed |= apply_profile_fields(&mut account, params);
    }
    if let Some(language) = supported_language(state, params) {
        if account.language.as_deref() != Some(language.as_str()) {
            account.language = Some(language);
            changed = true;
        }
    }
    if let Some(password) = password {
        hash_password(state, &mut result, &mut account, &password).await?;
        if result.has_errors() {
            return Ok(result);
        }
        changed = true;
    }

    if changed {
        state.accounts.update(&account).await?;
        tracing::info!(account_id = %account.id, "profile updated");
    } else {
        tracing::debug!(account_id = %account.id, "profile unchanged, nothing written");
    }
    if apply_subscriptions(state, account.id, params).await? {
        tracing::info!(account_id = %account.id, "subscriptions updated");
    }

    Ok(FlowResult::success(messages::UPDATE_SUCCESS))
}

/// Mails a registration token to the submitted `email_address`.
///
/// An empty address yields `email_address`; an address already in use
/// yields `email_taken`.
///
/// # Errors
///
/// Propagates storage and mail failures.
pub async fn process_request_registration<A, G>(
    state: &AdminState<A, G>,
    params: &FormParams,
) -> AdminResult<FlowResult>
where
    A: AccountProvider,
    G: GroupProvider,
{
    let mut result = FlowResult::new();
    let email = params.get(fields::EMAIL);
    if email.is_empty() {
        result.add_error(fields::EMAIL);
        return Ok(result);
    }
    if state.accounts.get_by_email(&email).await?.is_some() {
        result.add_error(fields::EMAIL_TAKEN);
        return Ok(result);
    }

    state.auth.send_registration(&email).await?;
    Ok(FlowResult::success(messages::REGISTRATION_MAILED))
}

/// Resolves a registration token to the address it was mailed to.
///
/// # Errors
///
/// Returns `AdminError::BadRequest` if the token is empty, unknown or
/// expired.
pub async fn registration_email<A, G>(state: &AdminState<A, G>, token: &str) -> AdminResult<String>
where
    A: AccountProvider,
    G: GroupProvider,
{
    let token = token.trim();
    if token.is_empty() {
        return Err(AdminError::BadRequest("no registration token".to_string()));
    }
    match state.auth.registration_email(token).await {
        Ok(email) => Ok(email),
        Err(AuthError::InvalidToken) => Err(invalid_registration_token()),
        Err(e) => Err(e.into()),
    }
}

fn invalid_registration_token() -> AdminError {
    AdminError::BadRequest("unknown or expired registration token".to_string())
}

/// Creates a self-registered account for the address `token` was mailed to.
///
/// The names and a password are required. The account can log in
/// immediately. An address already in use yields `email_taken`. The token
/// is consumed only once the account is about to be stored.
///
/// # Errors
///
/// Returns `AdminError::BadRequest` if the token is empty, unknown or
/// expired.
pub async fn process_register<A, G>(
    state: &AdminState<A, G>,
    token: &str,
    params: &FormParams,
) -> AdminResult<FlowResult>
where
    A: AccountProvider,
    G: GroupProvider,
{
    let email = registration_email(state, token).await?;
    let email = email.as_str();

    let mut result = FlowResult::new();
    let first = params.get(fields::FIRST_NAME);
    let last = params.get(fields::LAST_NAME);
    if first.is_empty() {
        result.add_error(fields::FIRST_NAME);
    }
    if last.is_empty() {
        result.add_error(fields::LAST_NAME);
    }
    let password = check_password(
        &mut result,
        params,
        state.config.accounts.min_password_length,
        true,
    );
    if state.accounts.get_by_email(email).await?.is_some() {
        result.add_error(fields::EMAIL_TAKEN);
    }

    let Some(password) = password else {
        return Ok(result);
    };
    if result.has_errors() {
        return Ok(result);
    }

    let mut account = Account::new(email)
        .with_first_name(first)
        .with_last_name(last)
        .with_can_log_in(true);
    account.self_registered = true;
    account.language = supported_language(state, params);
    apply_profile_fields(&mut account, params);

    hash_password(state, &mut result, &mut account, &password).await?;
    if result.has_errors() {
        return Ok(result);
    }

    match state.auth.complete_registration(token.trim()).await {
        Ok(redeemed) if redeemed == email => {}
        Ok(_) | Err(AuthError::InvalidToken) => return Err(invalid_registration_token()),
        Err(e) => return Err(e.into()),
    }

    let id: AccountId = match state.accounts.create(&account).await {
        Ok(id) => id,
        Err(e) if e.is_duplicate() => {
            result.add_error(fields::EMAIL_TAKEN);
            return Ok(result);
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(account_id = %id, "account registered");

    let mut result = FlowResult::success(messages::REGISTER_SUCCESS);
    result.set_parameter("accountId", id);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ep_auth::{
        DirectoryAuthService, Mailer, PasswordHasherService, PasswordPolicy, RecordingMailer,
    };
    use ep_core::Config;
    use ep_model::{Collection, ProfileField};
    use ep_storage::{InMemoryDirectory, SubscriptionProvider};

    use super::*;

    struct Fixture {
        state: AdminState<InMemoryDirectory, InMemoryDirectory>,
        dir: Arc<InMemoryDirectory>,
        mailer: Arc<RecordingMailer>,
        ctx: RequestContext,
    }

    async fn fixture_with(config: Config) -> Fixture {
        let dir = Arc::new(InMemoryDirectory::new());
        let mailer = Arc::new(RecordingMailer::new());
        let config = Arc::new(config);

        let mut account = Account::new("ana@example.org")
            .with_first_name("Ana")
            .with_last_name("Ruiz");
        account.id = AccountProvider::create(dir.as_ref(), &account).await.unwrap();

        let hasher =
            PasswordHasherService::new(PasswordPolicy::new().memory_cost(1024).time_cost(1));
        let auth = DirectoryAuthService::new(
            Arc::clone(&dir),
            Arc::clone(&dir),
            Arc::clone(&mailer) as Arc<dyn Mailer>,
            &config,
        )
        .with_hasher(hasher);
        let state = AdminState::new(
            Arc::clone(&dir),
            Arc::clone(&dir),
            Arc::clone(&dir) as _,
            Arc::new(auth),
            config,
        );
        let ctx = RequestContext::anonymous("en", "").with_account(account, false);

        Fixture {
            state,
            dir,
            mailer,
            ctx,
        }
    }

    async fn fixture() -> Fixture {
        let mut config = Config::for_testing();
        config.ui.supported_locales = vec!["en".to_string(), "es".to_string()];
        fixture_with(config).await
    }

    async fn stored(f: &Fixture) -> Account {
        let id = f.ctx.current.as_ref().unwrap().id;
        AccountProvider::get_by_id(f.dir.as_ref(), id).await.unwrap().unwrap()
    }

    fn names(first: &str, last: &str) -> FormParams {
        FormParams::from_pairs([(fields::FIRST_NAME, first), (fields::LAST_NAME, last)])
    }

    fn registration(first: &str, last: &str) -> FormParams {
        let mut params = names(first, last);
        params.push(fields::PASSWORD, "secret-one");
        params.push(fields::PASSWORD_CONFIRM, "secret-one");
        params
    }

    /// Requests registration for `email` and returns the mailed token.
    async fn registration_token(f: &Fixture, email: &str) -> String {
        let params = FormParams::from_pairs([(fields::EMAIL, email)]);
        let result = process_request_registration(&f.state, &params).await.unwrap();
        assert!(result.outcome, "{result:?}");

        let sent = f.mailer.sent();
        let mail = sent.last().unwrap();
        assert_eq!(mail.to, email);
        mail.body
            .split("token=")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .unwrap()
            .to_string()
    }

    fn subscription_ids(ids: &[&str]) -> FormParams {
        let mut params = names("Ana", "Ruiz");
        for id in ids {
            params.push(fields::SUBSCRIPTIONS, *id);
        }
        params
    }

    async fn subscribed(f: &Fixture) -> Vec<u32> {
        let id = f.ctx.current.as_ref().unwrap().id;
        f.dir
            .subscriptions(id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id.0)
            .collect()
    }

    #[tokio::test]
    async fn update_writes_changed_fields() {
        let f = fixture().await;
        let mut params = names("Ana", "Ruiz García");
        params.push("organization", "UNAM");
        params.push(fields::LANGUAGE, "es");

        let result = process_update_profile(&f.state, &f.ctx, &params, false).await.unwrap();

        assert!(result.continue_flow && result.outcome);
        let account = stored(&f).await;
        assert_eq!(account.last_name.as_deref(), Some("Ruiz García"));
        assert_eq!(account.attribute(ProfileField::Organization), Some("UNAM"));
        assert_eq!(account.language.as_deref(), Some("es"));
    }

    #[tokio::test]
    async fn update_requires_names() {
        let f = fixture().await;

        let result = process_update_profile(&f.state, &f.ctx, &names("", " "), false)
            .await
            .unwrap();

        assert_eq!(result.errors, vec![fields::FIRST_NAME, fields::LAST_NAME]);
        assert!(!result.continue_flow);
    }

    #[tokio::test]
    async fn update_ignores_unsupported_language() {
        let f = fixture().await;
        let mut params = names("Ana", "Ruiz");
        params.push(fields::LANGUAGE, "fr");

        process_update_profile(&f.state, &f.ctx, &params, false).await.unwrap();
        assert!(stored(&f).await.language.is_none());
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_reported() {
        let f = fixture().await;
        let mut params = names("Ana", "Ruiz");
        params.push(fields::PASSWORD, "secret-one");
        params.push(fields::PASSWORD_CONFIRM, "secret-two");

        let result = process_update_profile(&f.state, &f.ctx, &params, true).await.unwrap();

        assert_eq!(result.errors, vec![fields::PASSWORD_CONFIRM]);
        assert!(stored(&f).await.password_hash.is_none());
    }

    #[tokio::test]
    async fn short_password_is_reported() {
        let f = fixture().await;
        let mut params = names("Ana", "Ruiz");
        params.push(fields::PASSWORD, "abc");
        params.push(fields::PASSWORD_CONFIRM, "abc");

        let result = process_update_profile(&f.state, &f.ctx, &params, true).await.unwrap();
        assert_eq!(result.errors, vec![fields::PASSWORD]);
    }

    #[tokio::test]
    async fn password_is_set_when_allowed() {
        let f = fixture().await;
        let mut params = names("Ana", "Ruiz");
        params.push(fields::PASSWORD, "secret-one");
        params.push(fields::PASSWORD_CONFIRM, "secret-one");

        process_update_profile(&f.state, &f.ctx, &params, false).await.unwrap();
        assert!(stored(&f).await.password_hash.is_none());

        process_update_profile(&f.state, &f.ctx, &params, true).await.unwrap();
        assert!(stored(&f).await.password_hash.is_some());
    }

    #[tokio::test]
    async fn locked_metadata_is_left_alone() {
        let mut config = Config::for_testing();
        config.ui.edit_metadata = false;
        let f = fixture_with(config).await;

        let mut params = FormParams::new();
        params.push("organization", "UNAM");
        let result = process_update_profile(&f.state, &f.ctx, &params, false).await.unwrap();

        assert!(result.outcome);
        assert!(stored(&f).await.attribute(ProfileField::Organization).is_none());
    }

    #[tokio::test]
    async fn subscriptions_are_replaced_by_submission() {
        let f = fixture().await;
        for (id, name) in [(1, "Articles"), (2, "Theses"), (3, "Maps")] {
            f.dir.add_collection(Collection::new(CollectionId(id), name));
        }

        process_update_profile(&f.state, &f.ctx, &subscription_ids(&["-1", "1", "3", "9"]), false)
            .await
            .unwrap();
        assert_eq!(subscribed(&f).await, vec![1, 3]);

        process_update_profile(&f.state, &f.ctx, &subscription_ids(&["2", "3"]), false)
            .await
            .unwrap();
        assert_eq!(subscribed(&f).await, vec![2, 3]);

        process_update_profile(&f.state, &f.ctx, &names("Ana", "Ruiz"), false)
            .await
            .unwrap();
        assert_eq!(subscribed(&f).await, vec![2, 3]);

        process_update_profile(&f.state, &f.ctx, &subscription_ids(&["-1"]), false)
            .await
            .unwrap();
        assert!(subscribed(&f).await.is_empty());
    }

    #[tokio::test]
    async fn registration_request_mails_a_token() {
        let f = fixture().await;

        let token = registration_token(&f, "bo@example.org").await;

        assert_eq!(
            registration_email(&f.state, &token).await.unwrap(),
            "bo@example.org"
        );
    }

    #[tokio::test]
    async fn registration_request_checks_the_address() {
        let f = fixture().await;

        let result = process_request_registration(&f.state, &FormParams::new()).await.unwrap();
        assert_eq!(result.errors, vec![fields::EMAIL]);

        let taken = FormParams::from_pairs([(fields::EMAIL, "ANA@example.org")]);
        let result = process_request_registration(&f.state, &taken).await.unwrap();
        assert_eq!(result.errors, vec![fields::EMAIL_TAKEN]);
        assert!(f.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn register_creates_self_registered_account() {
        let f = fixture().await;
        let token = registration_token(&f, "bo@example.org").await;
        let mut params = registration("Bo", "Lund");
        params.push("sex", "Hombre");

        let result = process_register(&f.state, &token, &params).await.unwrap();

        assert!(result.outcome);
        let id: AccountId = result.parameter("accountId").unwrap().parse().unwrap();
        let account = AccountProvider::get_by_id(f.dir.as_ref(), id).await.unwrap().unwrap();
        assert_eq!(account.email, "bo@example.org");
        assert!(account.self_registered);
        assert!(account.can_log_in);
        assert!(account.password_hash.is_some());
        assert_eq!(account.attribute(ProfileField::Sex), Some("Hombre"));
    }

    #[tokio::test]
    async fn register_token_is_single_use() {
        let f = fixture().await;
        let token = registration_token(&f, "bo@example.org").await;

        process_register(&f.state, &token, &registration("Bo", "Lund"))
            .await
            .unwrap();
        let err = process_register(&f.state, &token, &registration("Bo", "Lund"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::BadRequest(_)));
    }

    #[tokio::test]
    async fn register_refuses_unknown_token() {
        let f = fixture().await;

        for token in ["", "not-a-token"] {
            let err = process_register(&f.state, token, &registration("Eve", "Lund"))
                .await
                .unwrap_err();
            assert!(matches!(err, AdminError::BadRequest(_)));
        }
        assert_eq!(f.dir.account_count(), 1);
    }

    #[tokio::test]
    async fn register_requires_password_and_keeps_token() {
        let f = fixture().await;
        let token = registration_token(&f, "bo@example.org").await;

        let result = process_register(&f.state, &token, &names("Bo", "Lund"))
            .await
            .unwrap();

        assert_eq!(result.errors, vec![fields::PASSWORD]);
        assert!(f.dir.get_by_email("bo@example.org").await.unwrap().is_none());
        assert!(registration_email(&f.state, &token).await.is_ok());
    }

    #[tokio::test]
    async fn register_rejects_address_taken_since_the_token_was_mailed() {
        let f = fixture().await;
        let token = registration_token(&f, "bo@example.org").await;
        AccountProvider::create(f.dir.as_ref(), &Account::new("BO@example.org"))
            .await
            .unwrap();

        let result = process_register(&f.state, &token, &registration("Bo", "Other"))
            .await
            .unwrap();
        assert_eq!(result.errors, vec![fields::EMAIL_TAKEN]);
    }
}
