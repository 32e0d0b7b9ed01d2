//! Flow results.
//!
//! Every form operation returns a [`FlowResult`]. Validation problems are
//! recorded as field names in `errors` and never raised as errors; the
//! caller redisplays the form with those fields marked.

use std::collections::BTreeMap;

use serde::Serialize;

/// Outcome of a form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowResult {
    /// Whether the flow may move on to the next step.
    #[serde(rename = "continue")]
    pub continue_flow: bool,
    /// Whether the operation succeeded.
    pub outcome: bool,
    /// Names of fields in error.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Message key or text to show the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Named values for the next step (`accountId`, `sessionId`).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
    /// Free text appended to the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
}

impl FlowResult {
    /// A halted, unsuccessful result with nothing set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A result that continues successfully with `message`.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.set_continue(true);
        result.set_outcome(true);
        result.set_message(message);
        result
    }

    /// Sets the continue flag.
    pub fn set_continue(&mut self, continue_flow: bool) {
        self.continue_flow = continue_flow;
    }

    /// Sets the outcome.
    pub fn set_outcome(&mut self, outcome: bool) {
        self.outcome = outcome;
    }

    /// Sets the message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Records a field in error. Repeats are ignored.
    pub fn add_error(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.errors.contains(&field) {
            self.errors.push(field);
        }
    }

    /// Whether any field is in error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether `field` is in error.
    #[must_use]
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e == field)
    }

    /// Sets a named parameter.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl ToString) {
        self.parameters.insert(name.into(), value.to_string());
    }

    /// Returns a named parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// Sets the character payload.
    pub fn set_characters(&mut self, characters: impl Into<String>) {
        self.characters = Some(characters.into());
    }
}
