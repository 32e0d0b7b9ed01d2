use ep_model::AccountId;
use ep_storage::{AccountProvider, GroupProvider};

use super::{add_phone_field, add_profile_fields, form_value};
use crate::accounts::fields;
use crate::context::RequestContext;
use crate::document::{Division, Document, Field, Inline, Item, List, Message};
use crate::error::AdminResult;
use crate::params::FormParams;
use crate::state::AdminState;

/// Which variant of the profile form to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileMode {
    /// A new account for an address proven by a mailed token.
    Register {
        /// The address the token was mailed to.
        email: String,
        /// The token, carried through the form as a hidden field.
        token: String,
    },
    /// The current account's own profile.
    Update {
        /// Whether the password section is offered.
        allow_set_password: bool,
    },
}

impl ProfileMode {
    const fn key(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Update { .. } => "update",
        }
    }
}

fn has(errors: &[String], field: &str) -> bool {
    errors.iter().any(|e| e == field)
}

/// Placeholder option value that selects no collection.
const NO_COLLECTION: &str = "-1";

/// Lists every collection, selecting the account's subscriptions, or the
/// submitted ones when the form is redisplayed.
async fn subscription_list<A, G>(
    state: &AdminState<A, G>,
    account_id: AccountId,
    params: &FormParams,
) -> AdminResult<List>
where
    A: AccountProvider,
    G: GroupProvider,
{
    let selected: Vec<String> = if params.contains(fields::SUBSCRIPTIONS) {
        params
            .get_all(fields::SUBSCRIPTIONS)
            .into_iter()
            .filter(|v| *v != NO_COLLECTION)
            .map(ToString::to_string)
            .collect()
    } else {
        state
            .subscriptions
            .subscriptions(account_id)
            .await?
            .iter()
            .map(|c| c.id.to_string())
            .collect()
    };
    let collections = state.subscriptions.list_collections().await?;

    let mut list = List::form("subscriptions").head(Message::new("profile.subscriptions.head"));
    list.add_item(Item::content(vec![Inline::message(Message::new(
        "profile.subscriptions.help",
    ))]));
    list.add_item(Item::field(
        Field::multi_select(
            fields::SUBSCRIPTIONS,
            Message::new("profile.select_collection"),
            collections
                .iter()
                .map(|c| (c.id.to_string(), c.short_name())),
            &selected,
        )
        .label(Message::new("profile.email_subscriptions")),
    ));
    Ok(list)
}

/// Builds the profile form, either for registration or for updating the
/// current account.
///
/// # Errors
///
/// Returns `AdminError::Unauthorized` when updating anonymously, or a
/// storage error if the memberships cannot be read.
pub async fn edit_profile_form<A, G>(
    state: &AdminState<A, G>,
    ctx: &RequestContext,
    mode: &ProfileMode,
    params: &FormParams,
    errors: &[String],
) -> AdminResult<Document>
where
    A: AccountProvider,
    G: GroupProvider,
{
    let account = match mode {
        ProfileMode::Register { .. } => None,
        ProfileMode::Update { .. } => Some(ctx.require_account()?),
    };
    let registering = account.is_none();
    let ui = &state.config.ui;
    let disabled = !registering && !ui.edit_metadata;
    let key = mode.key();

    let email = match (mode, account) {
        (ProfileMode::Register { email, .. }, _) => email.clone(),
        (_, Some(account)) => account.email.clone(),
        (_, None) => String::new(),
    };
    let first = form_value(
        params,
        fields::FIRST_NAME,
        account.and_then(|a| a.first_name.as_deref()),
    );
    let last = form_value(
        params,
        fields::LAST_NAME,
        account.and_then(|a| a.last_name.as_deref()),
    );
    let language = params
        .get_opt(fields::LANGUAGE)
        .or_else(|| account.and_then(|a| a.language.clone()))
        .unwrap_or_else(|| ui.default_locale.clone());

    let mut doc = Document::new(Message::new(format!("profile.{key}.title")));
    doc.add_trail(Some(ctx.url("/")), Message::new("general.home"));
    doc.add_trail(None, Message::new(format!("profile.{key}.trail")));

    let action = if registering { "/register" } else { "/profile" };
    let mut profile = Division::interactive("information", ctx.url(action), "primary")
        .head(Message::new(format!("profile.{key}.head")));

    let mut form = List::form("form");

    form.add_label(Message::new("profile.email_address"));
    form.add_item(Item::text(email));

    form.add_field(
        Field::text(fields::FIRST_NAME)
            .label(Message::new("profile.first_name"))
            .value(first)
            .required(true)
            .disabled(disabled)
            .error_if(
                has(errors, fields::FIRST_NAME),
                Message::new("profile.error_required"),
            ),
    );
    form.add_field(
        Field::text(fields::LAST_NAME)
            .label(Message::new("profile.last_name"))
            .value(last)
            .required(true)
            .disabled(disabled)
            .error_if(
                has(errors, fields::LAST_NAME),
                Message::new("profile.error_required"),
            ),
    );

    add_profile_fields(&mut form, account, params, true, disabled);
    add_phone_field(&mut form, account, params, true, disabled);

    form.add_field(
        Field::select(
            fields::LANGUAGE,
            ui.supported_locales.iter().map(|l| (l.as_str(), l.as_str())),
            &language,
        )
        .label(Message::new("profile.language"))
        .disabled(disabled),
    );

    if let Some(account) = account {
        form.add_list(subscription_list(state, account.id, params).await?);
    }

    let allow_password = match mode {
        ProfileMode::Register { .. } => true,
        ProfileMode::Update { allow_set_password } => *allow_set_password,
    };
    if allow_password {
        let mut security = List::form("security").head(Message::new("profile.security.head"));
        if !registering {
            security.add_item(Item::content(vec![Inline::highlight(
                "italic",
                vec![Inline::message(Message::new("profile.security.help"))],
            )]));
        }
        security.add_field(
            Field::password(fields::PASSWORD)
                .label(Message::new("profile.password"))
                .required(registering)
                .error_if(
                    has(errors, fields::PASSWORD),
                    Message::new("profile.error_password")
                        .with_param(state.config.accounts.min_password_length.to_string()),
                ),
        );
        security.add_field(
            Field::password(fields::PASSWORD_CONFIRM)
                .label(Message::new("profile.password_confirm"))
                .required(registering)
                .error_if(
                    has(errors, fields::PASSWORD_CONFIRM),
                    Message::new("profile.error_password_confirm"),
                ),
        );
        form.add_list(security);
    }

    form.add_item(Item::field(Field::button(
        "submit",
        Message::new(format!("profile.{key}.submit")),
    )));

    profile.add_list(form);
    if let ProfileMode::Register { token, .. } = mode {
        profile.add_hidden(fields::TOKEN, token.clone());
    }

    if let Some(account) = account {
        let groups = state.groups.all_member_groups(account.id).await?;
        if !groups.is_empty() {
            let mut memberships =
                List::simple("memberships").head(Message::new("profile.memberships.head"));
            for group in groups {
                memberships.add_item(Item::text(group.name));
            }
            profile.add_list(memberships);
        }
    }

    doc.body.push(profile);
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ep_auth::{DirectoryAuthService, Mailer, TracingMailer};
    use ep_core::Config;
    use ep_model::{Account, Collection, CollectionId, Group, GroupId};
    use ep_storage::{InMemoryDirectory, SubscriptionProvider};

    use super::*;
    use crate::document::{Block, FieldKind};
    use crate::error::AdminError;

    async fn state_with(
        config: Config,
    ) -> (AdminState<InMemoryDirectory, InMemoryDirectory>, Arc<InMemoryDirectory>, Account) {
        let dir = Arc::new(InMemoryDirectory::new());
        let mut account = Account::new("luis@example.org")
            .with_first_name("Luis")
            .with_last_name("Pérez")
            .with_can_log_in(true);
        account.id = AccountProvider::create(dir.as_ref(), &account).await.unwrap();

        let config = Arc::new(config);
        let auth = DirectoryAuthService::new(
            Arc::clone(&dir),
            Arc::clone(&dir),
            Arc::new(TracingMailer) as Arc<dyn Mailer>,
            &config,
        );
        let state = AdminState::new(
            Arc::clone(&dir),
            Arc::clone(&dir),
            Arc::clone(&dir) as _,
            Arc::new(auth),
            config,
        );
        (state, dir, account)
    }

    fn locales() -> Config {
        let mut config = Config::for_testing();
        config.ui.supported_locales = vec!["en".to_string(), "es_MX".to_string()];
        config
    }

    #[tokio::test]
    async fn register_form_offers_required_password() {
        let (state, _, _) = state_with(locales()).await;
        let ctx = RequestContext::anonymous("en", "");
        let mode = ProfileMode::Register {
            email: "new@example.org".to_string(),
            token: "abc123".to_string(),
        };

        let doc = edit_profile_form(&state, &ctx, &mode, &FormParams::new(), &[])
            .await
            .unwrap();

        assert_eq!(doc.title.key, "profile.register.title");
        assert_eq!(doc.body[0].form.as_ref().unwrap().action, "/register");
        assert!(doc.field(fields::EMAIL).is_none());
        assert!(doc.field(fields::PASSWORD).unwrap().required);
        assert_eq!(doc.field(fields::LANGUAGE).unwrap().selected(), Some("en"));
        assert!(doc.list("memberships").is_none());
        assert!(doc.list("subscriptions").is_none());
        let carries_token = doc.body[0].blocks.iter().any(|b| {
            matches!(b, Block::Hidden { name, value } if name == fields::TOKEN && value == "abc123")
        });
        assert!(carries_token);
    }

    #[tokio::test]
    async fn update_form_lists_collections_with_subscriptions_selected() {
        let (state, dir, account) = state_with(locales()).await;
        let long_name = format!("Colección de tesis {}", "y disertaciones ".repeat(4));
        dir.add_collection(Collection::new(CollectionId(1), "Articles"));
        dir.add_collection(Collection::new(CollectionId(2), long_name.clone()));
        dir.add_collection(Collection::new(CollectionId(3), "Maps"));
        dir.subscribe(account.id, CollectionId(2)).await.unwrap();
        dir.subscribe(account.id, CollectionId(3)).await.unwrap();
        let ctx = RequestContext::anonymous("en", "").with_account(account, false);
        let mode = ProfileMode::Update {
            allow_set_password: false,
        };

        let doc = edit_profile_form(&state, &ctx, &mode, &FormParams::new(), &[])
            .await
            .unwrap();

        let list = doc.list("subscriptions").unwrap();
        assert_eq!(list.head.as_ref().unwrap().key, "profile.subscriptions.head");
        let field = doc.field(fields::SUBSCRIPTIONS).unwrap();
        assert_eq!(field.label.as_ref().unwrap().key, "profile.email_subscriptions");
        assert_eq!(field.selected_values(), vec!["2", "3"]);
        let FieldKind::MultiSelect { placeholder, options } = &field.kind else {
            panic!("expected a multi-select");
        };
        assert_eq!(placeholder.key, "profile.select_collection");
        assert_eq!(options.len(), 3);
        assert_eq!(options[1].label.chars().count(), 50);
        assert!(options[1].label.ends_with("..."));
        assert_eq!(options[0].label, "Articles");
    }

    #[tokio::test]
    async fn redisplayed_subscriptions_follow_the_submission() {
        let (state, dir, account) = state_with(locales()).await;
        dir.add_collection(Collection::new(CollectionId(1), "Articles"));
        dir.add_collection(Collection::new(CollectionId(2), "Theses"));
        dir.subscribe(account.id, CollectionId(2)).await.unwrap();
        let ctx = RequestContext::anonymous("en", "").with_account(account, false);
        let mode = ProfileMode::Update {
            allow_set_password: false,
        };
        let params = FormParams::from_pairs([(fields::SUBSCRIPTIONS, "-1"), (fields::SUBSCRIPTIONS, "1")]);

        let doc = edit_profile_form(&state, &ctx, &mode, &params, &[])
            .await
            .unwrap();

        assert_eq!(doc.field(fields::SUBSCRIPTIONS).unwrap().selected_values(), vec!["1"]);
    }

    #[tokio::test]
    async fn update_form_is_seeded_from_account() {
        let (state, _, account) = state_with(locales()).await;
        let ctx = RequestContext::anonymous("en", "/xmlui").with_account(account, false);
        let mode = ProfileMode::Update {
            allow_set_password: false,
        };

        let doc = edit_profile_form(&state, &ctx, &mode, &FormParams::new(), &[])
            .await
            .unwrap();

        assert_eq!(doc.title.key, "profile.update.title");
        assert_eq!(doc.body[0].form.as_ref().unwrap().action, "/xmlui/profile");
        assert_eq!(doc.field(fields::LAST_NAME).unwrap().value.as_deref(), Some("Pérez"));
        assert!(doc.field(fields::PASSWORD).is_none());
        assert!(!doc.field("sex").unwrap().disabled);
    }

    #[tokio::test]
    async fn stored_language_is_selected() {
        let (state, _, mut account) = state_with(locales()).await;
        account.language = Some("es_MX".to_string());
        let ctx = RequestContext::anonymous("en", "").with_account(account, false);
        let mode = ProfileMode::Update {
            allow_set_password: true,
        };

        let doc = edit_profile_form(&state, &ctx, &mode, &FormParams::new(), &[])
            .await
            .unwrap();

        let FieldKind::Select { options } = &doc.field(fields::LANGUAGE).unwrap().kind else {
            panic!("expected a select");
        };
        assert_eq!(options.len(), 2);
        assert_eq!(doc.field(fields::LANGUAGE).unwrap().selected(), Some("es_MX"));
        assert!(!doc.field(fields::PASSWORD).unwrap().required);
    }

    #[tokio::test]
    async fn metadata_locked_when_editing_disabled() {
        let mut config = locales();
        config.ui.edit_metadata = false;
        let (state, _, account) = state_with(config).await;
        let ctx = RequestContext::anonymous("en", "").with_account(account, false);
        let mode = ProfileMode::Update {
            allow_set_password: true,
        };

        let doc = edit_profile_form(&state, &ctx, &mode, &FormParams::new(), &[])
            .await
            .unwrap();

        assert!(doc.field(fields::FIRST_NAME).unwrap().disabled);
        assert!(doc.field("organization").unwrap().disabled);
        assert!(doc.field("phone").unwrap().disabled);
        assert!(!doc.field(fields::PASSWORD).unwrap().disabled);
    }

    #[tokio::test]
    async fn errors_are_marked() {
        let (state, _, account) = state_with(locales()).await;
        let ctx = RequestContext::anonymous("en", "").with_account(account, false);
        let mode = ProfileMode::Update {
            allow_set_password: true,
        };
        let errors = vec![fields::PASSWORD_CONFIRM.to_string()];

        let doc = edit_profile_form(&state, &ctx, &mode, &FormParams::new(), &errors)
            .await
            .unwrap();

        assert!(doc.field(fields::PASSWORD).unwrap().errors.is_empty());
        assert_eq!(
            doc.field(fields::PASSWORD_CONFIRM).unwrap().errors[0].key,
            "profile.error_password_confirm"
        );
    }

    #[tokio::test]
    async fn memberships_listed_when_present() {
        let (state, dir, account) = state_with(locales()).await;
        GroupProvider::create(dir.as_ref(), &Group::new(GroupId(5), "Reviewers").with_member(account.id))
            .await
            .unwrap();
        let ctx = RequestContext::anonymous("en", "").with_account(account, false);
        let mode = ProfileMode::Update {
            allow_set_password: false,
        };

        let doc = edit_profile_form(&state, &ctx, &mode, &FormParams::new(), &[])
            .await
            .unwrap();

        let memberships = doc.list("memberships").unwrap();
        assert_eq!(memberships.items().count(), 1);
    }

    #[tokio::test]
    async fn update_requires_account() {
        let (state, _, _) = state_with(locales()).await;
        let ctx = RequestContext::anonymous("en", "");
        let mode = ProfileMode::Update {
            allow_set_password: false,
        };

        let err = edit_profile_form(&state, &ctx, &mode, &FormParams::new(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Unauthorized));
    }
}
