//! Abstract UI document.
//!
//! Views build a [`Document`] of divisions, lists, items and form fields.
//! Text is carried as message keys with parameters so that the rendering
//! layer can localize it; the document itself never contains markup.

use serde::Serialize;

/// A localizable message key with positional parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Message catalogue key.
    pub key: String,
    /// Values substituted into the message.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl Message {
    /// Creates a message without parameters.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }
}

/// Inline content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    /// Literal text.
    Text {
        /// The text.
        text: String,
    },
    /// Localized text.
    Message {
        /// The message.
        message: Message,
    },
    /// Emphasized content; `rend` names the style (bold, italic, fade, error).
    Highlight {
        /// Rendering hint.
        rend: String,
        /// Highlighted content.
        content: Vec<Inline>,
    },
    /// A link.
    Xref {
        /// Link target.
        target: String,
        /// Link text.
        content: Vec<Inline>,
    },
}

impl Inline {
    /// Literal text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Localized text.
    #[must_use]
    pub const fn message(message: Message) -> Self {
        Self::Message { message }
    }

    /// Highlighted content.
    #[must_use]
    pub fn highlight(rend: impl Into<String>, content: Vec<Inline>) -> Self {
        Self::Highlight {
            rend: rend.into(),
            content,
        }
    }

    /// A link with literal text.
    #[must_use]
    pub fn xref(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Xref {
            target: target.into(),
            content: vec![Self::text(text)],
        }
    }
}

/// One option of a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    /// Submitted value.
    pub value: String,
    /// Display label.
    pub label: String,
    /// Whether the option is selected.
    pub selected: bool,
}

/// Kind of form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text input.
    Text,
    /// Password input.
    Password,
    /// Drop-down.
    Select {
        /// Choices in display order.
        options: Vec<SelectOption>,
    },
    /// Drop-down holding any number of selected instances, which the
    /// client may add to and delete from. Each selected option is
    /// submitted under the field name.
    MultiSelect {
        /// Label of the leading `-1` option that selects nothing.
        placeholder: Message,
        /// Choices in display order, after the placeholder.
        options: Vec<SelectOption>,
    },
    /// A single checkbox submitting `option` when checked.
    CheckBox {
        /// Submitted value.
        option: String,
        /// Whether the box is checked.
        checked: bool,
    },
    /// Submit button.
    Button,
}

/// A form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Request parameter name.
    pub name: String,
    /// Field kind.
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Label, or button text for buttons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Message>,
    /// Help text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<Message>,
    /// Current value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Whether the field is marked required.
    pub required: bool,
    /// Whether the field is disabled.
    pub disabled: bool,
    /// Inline errors.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Message>,
}

impl Field {
    fn of_kind(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: None,
            help: None,
            value: None,
            required: false,
            disabled: false,
            errors: Vec::new(),
        }
    }

    /// Text input.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::Text)
    }

    /// Password input.
    #[must_use]
    pub fn password(name: impl Into<String>) -> Self {
        Self::of_kind(name, FieldKind::Password)
    }

    /// Drop-down; the option whose value equals `selected` is selected.
    #[must_use]
    pub fn select<I, V, L>(name: impl Into<String>, options: I, selected: &str) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|(value, label)| {
                let value = value.into();
                SelectOption {
                    selected: value == selected,
                    value,
                    label: label.into(),
                }
            })
            .collect();
        Self::of_kind(name, FieldKind::Select { options })
    }

    /// Multi-valued drop-down; every option whose value is in `selected`
    /// is selected.
    #[must_use]
    pub fn multi_select<I, V, L>(
        name: impl Into<String>,
        placeholder: Message,
        options: I,
        selected: &[String],
    ) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|(value, label)| {
                let value = value.into();
                SelectOption {
                    selected: selected.contains(&value),
                    value,
                    label: label.into(),
                }
            })
            .collect();
        Self::of_kind(
            name,
            FieldKind::MultiSelect {
                placeholder,
                options,
            },
        )
    }

    /// Checkbox submitting `"true"`.
    #[must_use]
    pub fn checkbox(name: impl Into<String>, checked: bool) -> Self {
        Self::of_kind(
            name,
            FieldKind::CheckBox {
                option: "true".to_string(),
                checked,
            },
        )
    }

    /// Submit button with the given text.
    #[must_use]
    pub fn button(name: impl Into<String>, label: Message) -> Self {
        Self::of_kind(name, FieldKind::Button).label(label)
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: Message) -> Self {
        self.label = Some(label);
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help(mut self, help: Option<Message>) -> Self {
        self.help = help;
        self
    }

    /// Sets the value.
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Marks the field required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Disables the field.
    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Adds an inline error when `condition` holds.
    #[must_use]
    pub fn error_if(mut self, condition: bool, error: Message) -> Self {
        if condition {
            self.errors.push(error);
        }
        self
    }

    /// Returns the selected option value of a select field.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected_values().into_iter().next()
    }

    /// Returns every selected option value of a select or multi-select field.
    #[must_use]
    pub fn selected_values(&self) -> Vec<&str> {
        match &self.kind {
            FieldKind::Select { options } | FieldKind::MultiSelect { options, .. } => options
                .iter()
                .filter(|o| o.selected)
                .map(|o| o.value.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A list item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Optional element id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Inline content.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Inline>,
    /// Form fields.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
}

impl Item {
    /// An item holding one field.
    #[must_use]
    pub fn field(field: Field) -> Self {
        Self {
            fields: vec![field],
            ..Self::default()
        }
    }

    /// An item holding inline content.
    #[must_use]
    pub fn content(content: Vec<Inline>) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }

    /// An item holding literal text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::content(vec![Inline::text(text)])
    }
}

/// Kind of list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    /// Label/field pairs.
    Form,
    /// Plain bulleted list.
    Simple,
}

/// Entry of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListEntry {
    /// Label for the next item.
    Label {
        /// Label text.
        label: Message,
    },
    /// An item.
    Item(Item),
    /// A nested list.
    List(List),
}

/// A list of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct List {
    /// Element id.
    pub id: String,
    /// List kind.
    pub kind: ListKind,
    /// Heading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Message>,
    /// Entries in display order.
    pub entries: Vec<ListEntry>,
}

impl List {
    /// Creates a form list.
    #[must_use]
    pub fn form(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ListKind::Form,
            head: None,
            entries: Vec::new(),
        }
    }

    /// Creates a simple list.
    #[must_use]
    pub fn simple(id: impl Into<String>) -> Self {
        Self {
            kind: ListKind::Simple,
            ..Self::form(id)
        }
    }

    /// Sets the heading.
    #[must_use]
    pub fn head(mut self, head: Message) -> Self {
        self.head = Some(head);
        self
    }

    /// Appends a label.
    pub fn add_label(&mut self, label: Message) {
        self.entries.push(ListEntry::Label { label });
    }

    /// Appends an item.
    pub fn add_item(&mut self, item: Item) {
        self.entries.push(ListEntry::Item(item));
    }

    /// Appends an item holding one field.
    pub fn add_field(&mut self, field: Field) {
        self.add_item(Item::field(field));
    }

    /// Appends a nested list.
    pub fn add_list(&mut self, list: List) {
        self.entries.push(ListEntry::List(list));
    }

    /// Items of this list, excluding nested lists.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.entries.iter().filter_map(|e| match e {
            ListEntry::Item(item) => Some(item),
            _ => None,
        })
    }

    fn fields(&self) -> Vec<&Field> {
        let mut out = Vec::new();
        for entry in &self.entries {
            match entry {
                ListEntry::Item(item) => out.extend(item.fields.iter()),
                ListEntry::List(list) => out.extend(list.fields()),
                ListEntry::Label { .. } => {}
            }
        }
        out
    }

    fn find_list(&self, id: &str) -> Option<&List> {
        if self.id == id {
            return Some(self);
        }
        self.entries.iter().find_map(|e| match e {
            ListEntry::List(list) => list.find_list(id),
            _ => None,
        })
    }
}

/// Block-level content of a division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Paragraph.
    Para {
        /// Paragraph content.
        content: Vec<Inline>,
    },
    /// List.
    List(List),
    /// Hidden form value.
    Hidden {
        /// Parameter name.
        name: String,
        /// Value.
        value: String,
    },
}

/// Form submission target of an interactive division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormTarget {
    /// Action URL.
    pub action: String,
    /// HTTP method.
    pub method: String,
}

/// A division of the page body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Division {
    /// Element id.
    pub id: String,
    /// Rendering hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rend: Option<String>,
    /// Present when the division is a form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<FormTarget>,
    /// Heading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Message>,
    /// Content blocks.
    pub blocks: Vec<Block>,
}

impl Division {
    /// Creates a division that posts to `action`.
    #[must_use]
    pub fn interactive(id: impl Into<String>, action: impl Into<String>, rend: &str) -> Self {
        Self {
            id: id.into(),
            rend: Some(rend.to_string()),
            form: Some(FormTarget {
                action: action.into(),
                method: "post".to_string(),
            }),
            head: None,
            blocks: Vec::new(),
        }
    }

    /// Sets the heading.
    #[must_use]
    pub fn head(mut self, head: Message) -> Self {
        self.head = Some(head);
        self
    }

    /// Appends a paragraph.
    pub fn add_para(&mut self, content: Vec<Inline>) {
        self.blocks.push(Block::Para { content });
    }

    /// Appends a list.
    pub fn add_list(&mut self, list: List) {
        self.blocks.push(Block::List(list));
    }

    /// Appends a hidden value.
    pub fn add_hidden(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.blocks.push(Block::Hidden {
            name: name.into(),
            value: value.into(),
        });
    }

    fn lists(&self) -> impl Iterator<Item = &List> {
        self.blocks.iter().filter_map(|b| match b {
            Block::List(list) => Some(list),
            _ => None,
        })
    }
}

/// A trail (breadcrumb) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrailLink {
    /// Link target; the current page has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Link text.
    pub label: Message,
}

/// A complete page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Page title.
    pub title: Message,
    /// Breadcrumb trail.
    pub trail: Vec<TrailLink>,
    /// Body divisions.
    pub body: Vec<Division>,
}

impl Document {
    /// Creates an empty page.
    #[must_use]
    pub const fn new(title: Message) -> Self {
        Self {
            title,
            trail: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Appends a trail link.
    pub fn add_trail(&mut self, target: Option<String>, label: Message) {
        self.trail.push(TrailLink { target, label });
    }

    /// Finds a field anywhere in the body by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.body
            .iter()
            .flat_map(Division::lists)
            .flat_map(List::fields)
            .find(|f| f.name == name)
    }

    /// Finds a list anywhere in the body by id.
    #[must_use]
    pub fn list(&self, id: &str) -> Option<&List> {
        self.body
            .iter()
            .flat_map(Division::lists)
            .find_map(|l| l.find_list(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_marks_matching_option() {
        let field = Field::select("sex", [("", "--"), ("Hombre", "Hombre")], "Hombre");
        assert_eq!(field.selected(), Some("Hombre"));

        let none = Field::select("sex", [("", "--"), ("Hombre", "Hombre")], "other");
        assert_eq!(none.selected(), None);
    }

    #[test]
    fn multi_select_marks_every_listed_option() {
        let field = Field::multi_select(
            "subscriptions",
            Message::new("profile.select_collection"),
            [("1", "Articles"), ("2", "Theses"), ("3", "Maps")],
            &["3".to_string(), "1".to_string()],
        );

        assert_eq!(field.selected_values(), vec!["1", "3"]);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["kind"], "multi_select");
        assert_eq!(json["placeholder"]["key"], "profile.select_collection");
    }

    #[test]
    fn nested_fields_and_lists_are_found() {
        let mut inner = List::form("identity");
        inner.add_field(Field::text("first_name").required(true));
        let mut outer = List::form("form");
        outer.add_list(inner);

        let mut division = Division::interactive("information", "/profile", "primary");
        division.add_list(outer);

        let mut doc = Document::new(Message::new("title"));
        doc.body.push(division);

        assert!(doc.field("first_name").unwrap().required);
        assert!(doc.list("identity").is_some());
        assert!(doc.field("missing").is_none());
    }

    #[test]
    fn serializes_with_type_tags() {
        let mut list = List::simple("members");
        list.add_item(Item::content(vec![Inline::highlight(
            "italic",
            vec![Inline::message(Message::new("none"))],
        )]));

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["kind"], "simple");
        assert_eq!(json["entries"][0]["type"], "item");
        assert_eq!(json["entries"][0]["content"][0]["type"], "highlight");

        let field = serde_json::to_value(Field::checkbox("can_log_in", true)).unwrap();
        assert_eq!(field["kind"], "check_box");
        assert_eq!(field["checked"], true);
    }
}
