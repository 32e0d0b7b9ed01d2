//! Impersonation and password management.
//!
//! [`AuthenticationService`] is the seam the account forms call through.
//! [`DirectoryAuthService`] implements it on top of the storage providers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ep_core::Config;
use ep_model::{Account, AccountId, GroupId};
use ep_storage::{AccountProvider, GroupProvider};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::mail::{MailMessage, Mailer};
use crate::password::{PasswordHasherService, PasswordPolicy};
use crate::token::{RegistrationToken, RegistrationTokenStore, ResetToken, ResetTokenStore};

/// A session opened by an administrator acting as another account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpersonationSession {
    /// Session identifier.
    pub id: Uuid,
    /// Account being impersonated.
    pub account_id: AccountId,
    /// Administrator who opened the session.
    pub impersonated_by: AccountId,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
    /// When the session lapses.
    pub expires_at: DateTime<Utc>,
}

impl ImpersonationSession {
    /// Checks whether the session has lapsed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Authentication operations used by the account forms.
#[async_trait]
pub trait AuthenticationService: Send + Sync {
    /// Checks whether the account has administrator rights.
    async fn is_admin(&self, account_id: AccountId) -> AuthResult<bool>;

    /// Opens a session in which `caller` acts as `target`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` when impersonation is disabled, the
    /// caller is not an administrator or the target is one, and
    /// `AuthError::AccountNotFound` if the target doesn't exist.
    async fn login_as(&self, caller: &Account, target: AccountId)
        -> AuthResult<ImpersonationSession>;

    /// Closes an impersonation session.
    ///
    /// Either the administrator who opened the session or the impersonated
    /// account may end it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionNotFound` for an unknown or lapsed
    /// session and `AuthError::Forbidden` for anyone else.
    async fn end_impersonation(&self, caller: &Account, session_id: Uuid) -> AuthResult<()>;

    /// Issues a reset token for the account and mails it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Mail` if the message cannot be delivered.
    async fn send_password_reset(&self, account: &Account) -> AuthResult<()>;

    /// Validates `password` and stores its hash on the account.
    ///
    /// The account is not persisted.
    async fn set_password(&self, account: &mut Account, password: &str) -> AuthResult<()>;

    /// Redeems a reset token and sets the account's new password.
    async fn complete_password_reset(&self, token: &str, password: &str)
        -> AuthResult<AccountId>;

    /// Issues a registration token for `email` and mails it there.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Mail` if the message cannot be delivered.
    async fn send_registration(&self, email: &str) -> AuthResult<()>;

    /// Returns the address a registration token was mailed to.
    ///
    /// The token stays valid.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown or expired.
    async fn registration_email(&self, token: &str) -> AuthResult<String>;

    /// Consumes a registration token, returning its address.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown, was
    /// already used or has expired.
    async fn complete_registration(&self, token: &str) -> AuthResult<String>;
}

/// [`AuthenticationService`] backed by the account and group providers.
pub struct DirectoryAuthService<A, G>
where
    A: AccountProvider,
    G: GroupProvider,
{
    accounts: Arc<A>,
    groups: Arc<G>,
    mailer: Arc<dyn Mailer>,
    hasher: PasswordHasherService,
    tokens: ResetTokenStore,
    registrations: RegistrationTokenStore,
    sessions: RwLock<HashMap<Uuid, ImpersonationSession>>,
    session_lifespan: Duration,
    assume_login: bool,
    admin_group: GroupId,
    base_url: String,
}

impl<A, G> DirectoryAuthService<A, G>
where
    A: AccountProvider,
    G: GroupProvider,
{
    /// Creates the service from configuration.
    pub fn new(accounts: Arc<A>, groups: Arc<G>, mailer: Arc<dyn Mailer>, config: &Config) -> Self {
        let policy = PasswordPolicy::new().min_length(config.accounts.min_password_length);
        Self {
            accounts,
            groups,
            mailer,
            hasher: PasswordHasherService::new(policy),
            tokens: ResetTokenStore::new(config.accounts.reset_token_duration()),
            registrations: RegistrationTokenStore::new(config.accounts.reset_token_duration()),
            sessions: RwLock::new(HashMap::new()),
            session_lifespan: Duration::from_std(config.accounts.impersonation_duration())
                .unwrap_or(Duration::hours(1)),
            assume_login: config.ui.assume_login,
            admin_group: GroupId(config.accounts.admin_group_id),
            base_url: config.server.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Replaces the password hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: PasswordHasherService) -> Self {
        self.hasher = hasher;
        self
    }

    /// Returns the password hasher.
    #[must_use]
    pub const fn hasher(&self) -> &PasswordHasherService {
        &self.hasher
    }

    /// Looks up an open impersonation session. Lapsed sessions are not
    /// returned.
    #[must_use]
    pub fn session(&self, id: Uuid) -> Option<ImpersonationSession> {
        self.sessions
            .read()
            .get(&id)
            .filter(|s| !s.is_expired_at(Utc::now()))
            .cloned()
    }

    /// Number of sessions held, lapsed ones included until the next purge.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn registration_message(&self, token: &RegistrationToken) -> MailMessage {
        let body = format!(
            "To complete the registration of {email}, follow this link:\n\n\
             {base}/register?token={token}\n\n\
             The link expires at {expires}. If you did not ask to register, \
             ignore this message.\n",
            email = token.subject,
            base = self.base_url,
            token = token.value,
            expires = token.expires_at.to_rfc3339(),
        );
        MailMessage {
            to: token.subject.clone(),
            subject: "Account Registration".to_string(),
            body,
        }
    }

    fn reset_message(&self, account: &Account, token: &ResetToken) -> MailMessage {
        let body = format!(
            "To change the password for {email}, follow this link:\n\n\
             {base}/forgot?token={token}\n\n\
             The link expires at {expires}. If you did not ask for a new \
             password, ignore this message.\n",
            email = account.email,
            base = self.base_url,
            token = token.value,
            expires = token.expires_at.to_rfc3339(),
        );
        MailMessage {
            to: account.email.clone(),
            subject: "Change Password Request".to_string(),
            body,
        }
    }
}

#[async_trait]
impl<A, G> AuthenticationService for DirectoryAuthService<A, G>
where
    A: AccountProvider,
    G: GroupProvider,
{
    async fn is_admin(&self, account_id: AccountId) -> AuthResult<bool> {
        Ok(self.groups.is_member(self.admin_group, account_id).await?)
    }

    async fn login_as(
        &self,
        caller: &Account,
        target: AccountId,
    ) -> AuthResult<ImpersonationSession> {
        if !self.assume_login {
            return Err(AuthError::forbidden("impersonation is disabled"));
        }
        if !self.is_admin(caller.id).await? {
            return Err(AuthError::forbidden(
                "only administrators may log in as another account",
            ));
        }

        let target_account = self
            .accounts
            .get_by_id(target)
            .await?
            .ok_or_else(|| AuthError::AccountNotFound(target.to_string()))?;

        if self.is_admin(target_account.id).await? {
            return Err(AuthError::forbidden(
                "administrators cannot be impersonated",
            ));
        }

        let now = Utc::now();
        let session = ImpersonationSession {
            id: Uuid::now_v7(),
            account_id: target_account.id,
            impersonated_by: caller.id,
            created_at: now,
            expires_at: now + self.session_lifespan,
        };
        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| !s.is_expired_at(now));
        sessions.insert(session.id, session.clone());
        drop(sessions);

        tracing::info!(
            session_id = %session.id,
            account_id = %target_account.id,
            admin_id = %caller.id,
            "impersonation session opened"
        );
        Ok(session)
    }

    async fn end_impersonation(&self, caller: &Account, session_id: Uuid) -> AuthResult<()> {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| !s.is_expired_at(now));

        let session = sessions
            .get(&session_id)
            .ok_or_else(|| AuthError::SessionNotFound(session_id.to_string()))?;
        if caller.id != session.impersonated_by && caller.id != session.account_id {
            return Err(AuthError::forbidden(
                "only the administrator or the impersonated account may end the session",
            ));
        }
        sessions.remove(&session_id);
        drop(sessions);

        tracing::info!(
            session_id = %session_id,
            closed_by = %caller.id,
            "impersonation session closed"
        );
        Ok(())
    }

    async fn send_password_reset(&self, account: &Account) -> AuthResult<()> {
        let token = self.tokens.issue(account.id);
        self.mailer.send(self.reset_message(account, &token)).await?;

        tracing::info!(account_id = %account.id, "password reset mailed");
        Ok(())
    }

    async fn set_password(&self, account: &mut Account, password: &str) -> AuthResult<()> {
        self.hasher.check(password)?;
        account.password_hash = Some(self.hasher.hash(password)?);
        Ok(())
    }

    async fn complete_password_reset(
        &self,
        token: &str,
        password: &str,
    ) -> AuthResult<AccountId> {
        self.hasher.check(password)?;
        let account_id = self.tokens.redeem(token)?;

        let mut account = self
            .accounts
            .get_by_id(account_id)
            .await?
            .ok_or_else(|| AuthError::AccountNotFound(account_id.to_string()))?;
        account.password_hash = Some(self.hasher.hash(password)?);
        self.accounts.update(&account).await?;

        tracing::info!(account_id = %account_id, "password reset completed");
        Ok(account_id)
    }

    async fn send_registration(&self, email: &str) -> AuthResult<()> {
        let token = self.registrations.issue(email.to_string());
        self.mailer.send(self.registration_message(&token)).await?;

        tracing::info!(email = %email, "registration token mailed");
        Ok(())
    }

    async fn registration_email(&self, token: &str) -> AuthResult<String> {
        self.registrations.peek(token)
    }

    async fn complete_registration(&self, token: &str) -> AuthResult<String> {
        self.registrations.redeem(token)
    }
}

#[cfg(test)]
mod tests {
    use ep_model::Group;
    use ep_storage::InMemoryDirectory;

    use super::*;
    use crate::mail::RecordingMailer;

    struct Fixture {
        service: DirectoryAuthService<InMemoryDirectory, InMemoryDirectory>,
        mailer: Arc<RecordingMailer>,
        admin: Account,
        user: Account,
    }

    async fn fixture(config: Config) -> Fixture {
        let dir = Arc::new(InMemoryDirectory::new());
        let mailer = Arc::new(RecordingMailer::new());

        let mut admin = Account::new("admin@example.org");
        admin.id = AccountProvider::create(dir.as_ref(), &admin).await.unwrap();
        let mut user = Account::new("user@example.org");
        user.id = AccountProvider::create(dir.as_ref(), &user).await.unwrap();
        GroupProvider::create(dir.as_ref(), &Group::new(GroupId(1), "Administrator").with_member(admin.id))
            .await
            .unwrap();

        let hasher = PasswordHasherService::new(PasswordPolicy::new().memory_cost(1024).time_cost(1));
        let service = DirectoryAuthService::new(
            Arc::clone(&dir),
            dir,
            Arc::clone(&mailer) as Arc<dyn Mailer>,
            &config,
        )
        .with_hasher(hasher);

        Fixture {
            service,
            mailer,
            admin,
            user,
        }
    }

    #[tokio::test]
    async fn admin_can_impersonate_regular_account() {
        let f = fixture(Config::for_testing()).await;

        let session = f.service.login_as(&f.admin, f.user.id).await.unwrap();

        assert_eq!(session.account_id, f.user.id);
        assert_eq!(session.impersonated_by, f.admin.id);
        assert_eq!(f.service.session(session.id), Some(session));
    }

    #[tokio::test]
    async fn ended_sessions_are_dropped() {
        let f = fixture(Config::for_testing()).await;
        let session = f.service.login_as(&f.admin, f.user.id).await.unwrap();

        let err = f
            .service
            .end_impersonation(&Account::new("stranger@example.org"), session.id)
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        f.service.end_impersonation(&f.user, session.id).await.unwrap();
        assert_eq!(f.service.session(session.id), None);
        assert_eq!(f.service.session_count(), 0);
        assert!(matches!(
            f.service.end_impersonation(&f.admin, session.id).await,
            Err(AuthError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn lapsed_sessions_are_purged_on_next_login_as() {
        let mut config = Config::for_testing();
        config.accounts.impersonation_lifespan = 0;
        let f = fixture(config).await;

        let first = f.service.login_as(&f.admin, f.user.id).await.unwrap();
        assert_eq!(f.service.session(first.id), None);

        for _ in 0..3 {
            f.service.login_as(&f.admin, f.user.id).await.unwrap();
        }
        assert_eq!(f.service.session_count(), 1);
    }

    #[tokio::test]
    async fn registration_token_resolves_to_mailed_address() {
        let f = fixture(Config::for_testing()).await;

        f.service.send_registration("new@example.org").await.unwrap();

        let sent = f.mailer.sent();
        assert_eq!(sent[0].to, "new@example.org");
        assert!(sent[0].body.contains("/register?token="));
        let token = sent[0]
            .body
            .split("token=")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .unwrap()
            .to_string();

        assert_eq!(f.service.registration_email(&token).await.unwrap(), "new@example.org");
        assert_eq!(f.service.complete_registration(&token).await.unwrap(), "new@example.org");
        assert!(matches!(
            f.service.registration_email(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn impersonation_refused_when_disabled() {
        let f = fixture(Config::default()).await;

        let err = f.service.login_as(&f.admin, f.user.id).await.unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn non_admin_cannot_impersonate() {
        let f = fixture(Config::for_testing()).await;

        let err = f.service.login_as(&f.user, f.admin.id).await.unwrap_err();
        assert!(err.is_forbidden());
    }

    #[tokio::test]
    async fn administrators_cannot_be_impersonated() {
        let f = fixture(Config::for_testing()).await;

        let err = f.service.login_as(&f.admin, f.admin.id).await.unwrap_err();
        assert_eq!(err.to_string(), "administrators cannot be impersonated");
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let f = fixture(Config::for_testing()).await;

        let err = f.service.login_as(&f.admin, AccountId(99)).await.unwrap_err();
        assert!(matches!(err, AuthError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn reset_mails_a_redeemable_token() {
        let f = fixture(Config::for_testing()).await;

        f.service.send_password_reset(&f.user).await.unwrap();

        let sent = f.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "user@example.org");

        let token = sent[0]
            .body
            .split("token=")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .unwrap()
            .to_string();

        let id = f
            .service
            .complete_password_reset(&token, "new-secret")
            .await
            .unwrap();
        assert_eq!(id, f.user.id);
        assert!(f
            .service
            .complete_password_reset(&token, "new-secret")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn set_password_enforces_minimum_length() {
        let f = fixture(Config::for_testing()).await;
        let mut account = f.user.clone();

        assert!(matches!(
            f.service.set_password(&mut account, "abc").await,
            Err(AuthError::WeakPassword(_))
        ));
        assert!(account.password_hash.is_none());

        f.service.set_password(&mut account, "abcdef").await.unwrap();
        let hash = account.password_hash.unwrap();
        assert!(f.service.hasher().verify("abcdef", &hash).is_ok());
    }
}
