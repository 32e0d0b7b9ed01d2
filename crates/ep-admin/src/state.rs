//! Shared state for the account flows.

use std::sync::Arc;

use ep_auth::AuthenticationService;
use ep_core::Config;
use ep_model::AccountId;
use ep_storage::{AccountProvider, GroupProvider, SubscriptionProvider};

use crate::context::RequestContext;
use crate::error::{AdminError, AdminResult};
use crate::membership::MembershipResolver;

/// Providers, collaborators and configuration used by every flow.
pub struct AdminState<A, G>
where
    A: AccountProvider,
    G: GroupProvider,
{
    /// Account storage provider.
    pub accounts: Arc<A>,
    /// Group storage provider.
    pub groups: Arc<G>,
    /// Collection subscriptions shown on the profile form.
    pub subscriptions: Arc<dyn SubscriptionProvider>,
    /// Impersonation and password service.
    pub auth: Arc<dyn AuthenticationService>,
    /// Application configuration.
    pub config: Arc<Config>,
    /// Resolver used to annotate inherited memberships.
    pub resolver: MembershipResolver,
}

// Manual Clone implementation that doesn't require T: Clone for Arc<T>
impl<A, G> Clone for AdminState<A, G>
where
    A: AccountProvider,
    G: GroupProvider,
{
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            groups: Arc::clone(&self.groups),
            subscriptions: Arc::clone(&self.subscriptions),
            auth: Arc::clone(&self.auth),
            config: Arc::clone(&self.config),
            resolver: self.resolver,
        }
    }
}

impl<A, G> AdminState<A, G>
where
    A: AccountProvider,
    G: GroupProvider,
{
    /// Creates a new state with the one-hop resolver.
    pub fn new(
        accounts: Arc<A>,
        groups: Arc<G>,
        subscriptions: Arc<dyn SubscriptionProvider>,
        auth: Arc<dyn AuthenticationService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            accounts,
            groups,
            subscriptions,
            auth,
            config,
            resolver: MembershipResolver::new(),
        }
    }

    /// Replaces the membership resolver.
    #[must_use]
    pub const fn with_resolver(mut self, resolver: MembershipResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Builds the request context for an optionally authenticated account.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` if the identity names an account
    /// that doesn't exist.
    pub async fn context_for(&self, identity: Option<AccountId>) -> AdminResult<RequestContext> {
        let ctx = RequestContext::anonymous(
            self.config.ui.default_locale.clone(),
            self.config.ui.context_path.clone(),
        );
        let Some(id) = identity else {
            return Ok(ctx);
        };

        let account = self
            .accounts
            .get_by_id(id)
            .await?
            .ok_or(AdminError::Unauthorized)?;
        let is_admin = self.auth.is_admin(id).await?;

        let mut ctx = ctx.with_account(account, is_admin);
        if let Some(language) = ctx.current.as_ref().and_then(|a| a.language.clone()) {
            ctx.locale = language;
        }
        Ok(ctx)
    }
}
