//! Configuration management for epeople.
//!
//! Configuration is loaded from environment variables (and an optional
//! `.env` file) with sensible defaults for every setting.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Form and view configuration.
    pub ui: UiConfig,
    /// Account policy configuration.
    pub accounts: AccountsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Base URL for the server (used in password reset links).
    pub base_url: String,
    /// Header set by the authenticating proxy carrying the account id.
    pub identity_header: String,
}

/// Form and view configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Whether administrators may log in as another account.
    pub assume_login: bool,
    /// Whether users may edit their own profile metadata.
    pub edit_metadata: bool,
    /// Locales offered in the language selector (e.g. `en`, `es_MX`).
    pub supported_locales: Vec<String>,
    /// Locale used when an account has no language set.
    pub default_locale: String,
    /// Path prefix prepended to every form action and link.
    pub context_path: String,
}

/// Account policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Group whose (transitive) members are administrators.
    pub admin_group_id: u32,
    /// Minimum length of a password chosen through the profile forms.
    pub min_password_length: usize,
    /// Lifespan of password reset and registration tokens in seconds.
    pub reset_token_lifespan: u64,
    /// Lifespan of an impersonation session in seconds.
    pub impersonation_lifespan: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let host = env_or("EP_HOST", defaults.server.host);
        let port = env_parse("EP_PORT", defaults.server.port)?;
        let base_url = std::env::var("EP_BASE_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}"));
        let identity_header = env_or("EP_IDENTITY_HEADER", defaults.server.identity_header);

        let supported_locales = std::env::var("EP_SUPPORTED_LOCALES")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.ui.supported_locales);

        Ok(Self {
            server: ServerConfig {
                host,
                port,
                base_url,
                identity_header,
            },
            ui: UiConfig {
                assume_login: env_flag("EP_ASSUME_LOGIN", defaults.ui.assume_login),
                edit_metadata: env_flag("EP_EDIT_METADATA", defaults.ui.edit_metadata),
                supported_locales,
                default_locale: env_or("EP_DEFAULT_LOCALE", defaults.ui.default_locale),
                context_path: env_or("EP_CONTEXT_PATH", defaults.ui.context_path),
            },
            accounts: AccountsConfig {
                admin_group_id: env_parse("EP_ADMIN_GROUP_ID", defaults.accounts.admin_group_id)?,
                min_password_length: env_parse(
                    "EP_MIN_PASSWORD_LENGTH",
                    defaults.accounts.min_password_length,
                )?,
                reset_token_lifespan: env_parse(
                    "EP_RESET_TOKEN_LIFESPAN",
                    defaults.accounts.reset_token_lifespan,
                )?,
                impersonation_lifespan: env_parse(
                    "EP_IMPERSONATION_LIFESPAN",
                    defaults.accounts.impersonation_lifespan,
                )?,
            },
        })
    }

    /// Creates a configuration for testing.
    ///
    /// Impersonation is enabled so that the login-as flow can be exercised.
    #[must_use]
    pub fn for_testing() -> Self {
        let mut config = Self::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.ui.assume_login = true;
        config.accounts.min_password_length = 6;
        config
    }
}

impl AccountsConfig {
    /// Returns the reset token lifespan as a duration.
    #[must_use]
    pub const fn reset_token_duration(&self) -> Duration {
        Duration::from_secs(self.reset_token_lifespan)
    }

    /// Returns the impersonation session lifespan as a duration.
    #[must_use]
    pub const fn impersonation_duration(&self) -> Duration {
        Duration::from_secs(self.impersonation_lifespan)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
                identity_header: "x-authenticated-account".to_string(),
            },
            ui: UiConfig {
                assume_login: false,
                edit_metadata: true,
                supported_locales: vec!["en".to_string()],
                default_locale: "en".to_string(),
                context_path: String::new(),
            },
            accounts: AccountsConfig {
                admin_group_id: 1,
                min_password_length: 6,
                reset_token_lifespan: 86_400, // 24 hours
                impersonation_lifespan: 3_600,
            },
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no" | "off"))
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: '{raw}'"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_impersonation_off() {
        let config = Config::default();

        assert!(!config.ui.assume_login);
        assert!(config.ui.edit_metadata);
        assert_eq!(config.ui.default_locale, "en");
        assert_eq!(config.accounts.admin_group_id, 1);
    }

    #[test]
    fn testing_config_enables_login_as() {
        let config = Config::for_testing();

        assert!(config.ui.assume_login);
        assert_eq!(config.server.port, 0);
    }

    #[test]
    fn reset_token_duration_in_seconds() {
        let config = Config::default();
        assert_eq!(
            config.accounts.reset_token_duration(),
            Duration::from_secs(86_400)
        );
        assert_eq!(
            config.accounts.impersonation_duration(),
            Duration::from_secs(3_600)
        );
    }

    #[test]
    fn invalid_number_is_a_config_error() {
        std::env::set_var("EP_TEST_BAD_PORT", "not-a-port");
        let err = env_parse::<u16>("EP_TEST_BAD_PORT", 8080).unwrap_err();
        assert!(err.to_string().contains("EP_TEST_BAD_PORT"));
        std::env::remove_var("EP_TEST_BAD_PORT");
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = Config::for_testing();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ui.assume_login, config.ui.assume_login);
    }
}
