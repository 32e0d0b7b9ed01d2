//! Bootstrap configuration.
//!
//! The demo server runs on an in-memory directory, so the first
//! administrator is seeded at startup from environment variables.

/// Seed data for the in-memory directory.
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfig {
    /// Email of the initial administrator. No administrator is seeded when unset.
    pub admin_email: Option<String>,

    /// Password of the initial administrator.
    pub admin_password: Option<String>,

    /// First name of the initial administrator.
    pub admin_first_name: String,

    /// Last name of the initial administrator.
    pub admin_last_name: String,

    /// Name of the administrator group.
    pub admin_group_name: String,

    /// Names of the collections offered for subscription, numbered from 1.
    pub collections: Vec<String>,
}

impl BootstrapConfig {
    /// Loads the bootstrap settings from `EP_BOOTSTRAP_*` variables.
    ///
    /// Expects the `.env` file, if any, to have been loaded already.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::for_testing();
        Self {
            admin_email: non_empty_var("EP_BOOTSTRAP_ADMIN_EMAIL"),
            admin_password: non_empty_var("EP_BOOTSTRAP_ADMIN_PASSWORD"),
            admin_first_name: non_empty_var("EP_BOOTSTRAP_ADMIN_FIRST_NAME")
                .unwrap_or(defaults.admin_first_name),
            admin_last_name: non_empty_var("EP_BOOTSTRAP_ADMIN_LAST_NAME")
                .unwrap_or(defaults.admin_last_name),
            admin_group_name: non_empty_var("EP_BOOTSTRAP_ADMIN_GROUP")
                .unwrap_or(defaults.admin_group_name),
            collections: non_empty_var("EP_BOOTSTRAP_COLLECTIONS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Creates bootstrap settings without an administrator account.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            admin_email: None,
            admin_password: None,
            admin_first_name: "Site".to_string(),
            admin_last_name: "Administrator".to_string(),
            admin_group_name: "Administrator".to_string(),
            collections: Vec::new(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
