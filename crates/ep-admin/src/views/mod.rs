//! Form views.
//!
//! Views assemble a [`Document`](crate::document::Document) for a form,
//! seeded from the stored account and overridden by any values the user
//! just submitted, with the fields named in `errors` marked.

mod edit_account;
mod edit_profile;

pub use edit_account::edit_account_form;
pub use edit_profile::{edit_profile_form, ProfileMode};

use ep_model::{Account, ProfileField};

use crate::document::{Field, Item, List, Message};
use crate::params::FormParams;

/// Current value of a profile field: submitted, else stored, else empty.
fn profile_value(account: Option<&Account>, params: &FormParams, field: ProfileField) -> String {
    params
        .get_opt(field.param_name())
        .or_else(|| {
            account
                .and_then(|a| a.attribute(field))
                .map(ToString::to_string)
        })
        .unwrap_or_default()
}

/// Current value of a plain form field: submitted, else `stored`.
fn form_value(params: &FormParams, name: &str, stored: Option<&str>) -> String {
    params
        .get_opt(name)
        .unwrap_or_else(|| stored.unwrap_or_default().to_string())
}

/// Appends the demographic fields (everything but phone) to `list`.
///
/// Editable lists get inputs; otherwise each value is shown read-only
/// under its label.
fn add_profile_fields(
    list: &mut List,
    account: Option<&Account>,
    params: &FormParams,
    editable: bool,
    disabled: bool,
) {
    for field in ProfileField::ALL {
        if field == ProfileField::Phone {
            continue;
        }
        let value = profile_value(account, params, field);
        let label = Message::new(field.label_key());

        if !editable {
            list.add_label(label);
            list.add_item(Item::text(value));
            continue;
        }

        if field.starts_organization_section() {
            list.add_label(Message::new("profile.organization.head"));
        }

        let input = match field.choices() {
            Some(choices) => Field::select(
                field.param_name(),
                choices.iter().map(|c| (c.value, c.label)),
                &value,
            ),
            None => Field::text(field.param_name()).value(value),
        };
        list.add_field(
            input
                .label(label)
                .help(field.help_key().map(Message::new))
                .required(field.marked_required())
                .disabled(disabled),
        );
    }
}

/// Appends the phone field.
fn add_phone_field(
    list: &mut List,
    account: Option<&Account>,
    params: &FormParams,
    editable: bool,
    disabled: bool,
) {
    let value = profile_value(account, params, ProfileField::Phone);
    let label = Message::new(ProfileField::Phone.label_key());
    if editable {
        list.add_field(
            Field::text(ProfileField::Phone.param_name())
                .label(label)
                .value(value)
                .disabled(disabled),
        );
    } else {
        list.add_label(label);
        list.add_item(Item::text(value));
    }
}
