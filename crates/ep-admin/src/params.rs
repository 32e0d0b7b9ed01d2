//! Submitted form parameters.

use serde::Deserialize;

use crate::error::{AdminError, AdminResult};

/// Form parameters in submission order.
///
/// Keys may repeat (`select_eperson` in the batch delete form).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FormParams(Vec<(String, String)>);

impl FormParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::BadRequest` if the body is not valid form encoding.
    pub fn parse(body: &[u8]) -> AdminResult<Self> {
        serde_urlencoded::from_bytes(body)
            .map(Self)
            .map_err(|e| AdminError::BadRequest(format!("malformed form body: {e}")))
    }

    /// Builds parameters from key/value pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Returns the first raw value for `key`, if submitted.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `key` was submitted at all.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }

    /// Returns the trimmed value for `key`; missing keys read as empty.
    #[must_use]
    pub fn get(&self, key: &str) -> String {
        self.raw(key).map(str::trim).unwrap_or_default().to_string()
    }

    /// Returns the trimmed value for `key` if submitted.
    #[must_use]
    pub fn get_opt(&self, key: &str) -> Option<String> {
        self.raw(key).map(|v| v.trim().to_string())
    }

    /// Every value submitted under `key`.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Removes every value submitted under `key` and returns them.
    pub fn take_all(&mut self, key: &str) -> Vec<String> {
        let (taken, kept) = std::mem::take(&mut self.0)
            .into_iter()
            .partition(|(k, _)| k == key);
        self.0 = kept;
        taken.into_iter().map(|(_, v)| v).collect()
    }

    /// A checkbox is on whenever its key was submitted, whatever the value.
    #[must_use]
    pub fn checkbox(&self, key: &str) -> bool {
        self.contains(key)
    }

    /// Whether no parameters were submitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_trimmed() {
        let params = FormParams::from_pairs([("first_name", "  Ana "), ("phone", "")]);

        assert_eq!(params.get("first_name"), "Ana");
        assert_eq!(params.get("missing"), "");
        assert_eq!(params.get_opt("phone").as_deref(), Some(""));
        assert_eq!(params.get_opt("missing"), None);
    }

    #[test]
    fn parses_repeated_keys() {
        let params = FormParams::parse(b"select_eperson=1&select_eperson=7&submit_confirm=Delete")
            .unwrap();

        assert_eq!(params.get_all("select_eperson"), vec!["1", "7"]);
        assert!(params.contains("submit_confirm"));
    }

    #[test]
    fn decodes_percent_encoding() {
        let params = FormParams::parse(b"email_address=ana%40example.org&last_name=Ru%C3%ADz+G")
            .unwrap();

        assert_eq!(params.get("email_address"), "ana@example.org");
        assert_eq!(params.get("last_name"), "Ruíz G");
    }

    #[test]
    fn checkbox_is_on_when_present() {
        let params = FormParams::from_pairs([("can_log_in", "true"), ("certificate", "")]);

        assert!(params.checkbox("can_log_in"));
        assert!(params.checkbox("certificate"));
        assert!(!params.checkbox("absent"));
    }

    #[test]
    fn take_all_removes_only_that_key() {
        let mut params =
            FormParams::parse(b"error=first_name&first_name=Ana&error=email_taken").unwrap();

        assert_eq!(params.take_all("error"), vec!["first_name", "email_taken"]);
        assert!(!params.contains("error"));
        assert_eq!(params.get("first_name"), "Ana");
        assert!(params.take_all("error").is_empty());
    }
}
