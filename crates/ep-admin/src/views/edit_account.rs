use ep_model::{AccountId, DeleteConstraint};
use ep_storage::{AccountProvider, GroupProvider};

use super::{add_phone_field, add_profile_fields, form_value};
use crate::accounts::fields;
use crate::context::RequestContext;
use crate::document::{Division, Document, Field, Inline, Item, List, Message};
use crate::error::{AdminError, AdminResult};
use crate::membership::Membership;
use crate::params::FormParams;
use crate::state::AdminState;

fn has(errors: &[String], field: &str) -> bool {
    errors.iter().any(|e| e == field)
}

/// "This account cannot be deleted because it is referenced by a, b, and c."
fn constraint_sentence(constraints: &[DeleteConstraint]) -> Vec<Inline> {
    let mut content = vec![
        Inline::message(Message::new("admin.epeople.edit.delete_constraint")),
        Inline::text(" "),
    ];
    let last = constraints.len().saturating_sub(1);
    for (idx, constraint) in constraints.iter().enumerate() {
        if idx > 0 && idx == last {
            content.push(Inline::text(if constraints.len() > 2 { ", " } else { " " }));
            content.push(Inline::message(Message::new(
                "admin.epeople.edit.delete_constraint.last_conjunction",
            )));
            content.push(Inline::text(" "));
        } else if idx > 0 {
            content.push(Inline::text(", "));
        }
        content.push(Inline::message(Message::new(constraint.message_key())));
    }
    content.push(Inline::text("."));
    content
}

/// Builds the administrative edit form for an account.
///
/// Administrators get inputs, the account actions and the list of groups
/// the account belongs to; anyone else gets a read-only summary.
/// `params` holds the values just submitted, `errors` the fields the last
/// submission reported.
///
/// # Errors
///
/// Returns `AdminError::NotFound` for an unknown account.
pub async fn edit_account_form<A, G>(
    state: &AdminState<A, G>,
    ctx: &RequestContext,
    account_id: AccountId,
    params: &FormParams,
    errors: &[String],
) -> AdminResult<Document>
where
    A: AccountProvider,
    G: GroupProvider,
{
    let account = state
        .accounts
        .get_by_id(account_id)
        .await?
        .ok_or_else(|| AdminError::not_found("Account", account_id))?;
    let admin = ctx.is_admin;

    let email = form_value(params, fields::EMAIL, Some(account.email.as_str()));
    let first = form_value(params, fields::FIRST_NAME, account.first_name.as_deref());
    let last = form_value(params, fields::LAST_NAME, account.last_name.as_deref());

    let mut doc = Document::new(Message::new("admin.epeople.edit.title"));
    doc.add_trail(Some(ctx.url("/")), Message::new("general.home"));
    doc.add_trail(Some(ctx.url("/admin/epeople")), Message::new("admin.epeople.trail"));
    doc.add_trail(None, Message::new("admin.epeople.edit.trail"));

    let mut edit = Division::interactive(
        "eperson-edit",
        ctx.url(&format!("/admin/epeople/{account_id}")),
        "primary administrative eperson",
    )
    .head(Message::new("admin.epeople.edit.head1"));

    if has(errors, fields::EMAIL_TAKEN) {
        edit.add_para(vec![Inline::highlight(
            "bold",
            vec![Inline::message(Message::new("admin.epeople.edit.email_taken"))],
        )]);
    }

    let mut identity = List::form("identity").head(
        Message::new("admin.epeople.edit.head2").with_param(account.full_name()),
    );

    if admin {
        let email_error = if has(errors, fields::EMAIL_TAKEN) {
            Some(Message::new("admin.epeople.edit.error_email_unique"))
        } else if has(errors, fields::EMAIL) {
            Some(Message::new("admin.epeople.edit.error_email"))
        } else {
            None
        };
        let mut email_field = Field::text(fields::EMAIL)
            .label(Message::new("profile.email_address"))
            .value(email)
            .required(true);
        email_field.errors.extend(email_error);
        identity.add_field(email_field);

        identity.add_field(
            Field::text(fields::FIRST_NAME)
                .label(Message::new("profile.first_name"))
                .value(first)
                .required(true)
                .error_if(
                    has(errors, fields::FIRST_NAME),
                    Message::new("admin.epeople.edit.error_fname"),
                ),
        );
        identity.add_field(
            Field::text(fields::LAST_NAME)
                .label(Message::new("profile.last_name"))
                .value(last)
                .required(true)
                .error_if(
                    has(errors, fields::LAST_NAME),
                    Message::new("admin.epeople.edit.error_lname"),
                ),
        );
    } else {
        for (label, value) in [
            ("profile.email_address", email),
            ("profile.first_name", first),
            ("profile.last_name", last),
        ] {
            identity.add_label(Message::new(label));
            identity.add_item(Item::text(value));
        }
    }

    add_profile_fields(&mut identity, Some(&account), params, admin, false);
    add_phone_field(&mut identity, Some(&account), params, admin, false);

    if admin {
        // Unchecked boxes are absent from a submission, so only a
        // redisplayed form (one carrying the email field) reads them.
        let submitted = params.contains(fields::EMAIL);
        let can_log_in = if submitted {
            params.checkbox(fields::CAN_LOG_IN)
        } else {
            account.can_log_in
        };
        let certificate = if submitted {
            params.checkbox(fields::CERTIFICATE)
        } else {
            account.require_certificate
        };
        identity.add_field(
            Field::checkbox(fields::CAN_LOG_IN, can_log_in)
                .label(Message::new("admin.epeople.edit.can_log_in")),
        );
        identity.add_field(
            Field::checkbox(fields::CERTIFICATE, certificate)
                .label(Message::new("admin.epeople.edit.req_certs")),
        );

        identity.add_item(Item::content(vec![Inline::highlight(
            "italic",
            vec![Inline::message(Message::new("admin.epeople.edit.special_help"))],
        )]));

        let constraints = state.accounts.delete_constraints(account_id).await?;
        let special = Item {
            fields: vec![
                Field::button(
                    "submit_reset_password",
                    Message::new("admin.epeople.edit.submit_reset_password"),
                ),
                Field::button("submit_delete", Message::new("admin.epeople.edit.submit_delete"))
                    .disabled(!constraints.is_empty()),
                Field::button(
                    "submit_login_as",
                    Message::new("admin.epeople.edit.submit_login_as"),
                )
                .disabled(!state.config.ui.assume_login),
            ],
            ..Item::default()
        };
        identity.add_item(special);

        if !constraints.is_empty() {
            identity.add_item(Item {
                id: Some("eperson-delete-constraint".to_string()),
                content: vec![Inline::highlight("error", constraint_sentence(&constraints))],
                fields: Vec::new(),
            });
        }
    }

    let mut buttons = Vec::new();
    if admin {
        buttons.push(Field::button("submit_save", Message::new("general.save")));
    }
    buttons.push(Field::button("submit_cancel", Message::new("general.cancel")));
    identity.add_item(Item {
        fields: buttons,
        ..Item::default()
    });

    edit.add_list(identity);

    if admin {
        let closure = state.groups.all_member_groups(account_id).await?;
        let mut member_of =
            List::simple("eperson-member-of").head(Message::new("admin.epeople.edit.member_head"));

        for group in &closure {
            let mut content = vec![Inline::xref(
                ctx.url(&format!("/admin/groups/{}", group.id)),
                group.name.clone(),
            )];
            if let Membership::Via(via) = state.resolver.resolve(account_id, group, &closure) {
                content.push(Inline::highlight(
                    "fade",
                    vec![Inline::message(
                        Message::new("admin.epeople.edit.indirect_member").with_param(via.name),
                    )],
                ));
            }
            member_of.add_item(Item::content(content));
        }
        if closure.is_empty() {
            member_of.add_item(Item::content(vec![Inline::highlight(
                "italic",
                vec![Inline::message(Message::new("admin.epeople.edit.member_none"))],
            )]));
        }
        edit.add_list(member_of);
    }

    edit.add_hidden("account_id", account_id.to_string());
    doc.body.push(edit);
    Ok(doc)
}
