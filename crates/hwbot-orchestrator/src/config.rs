//! Configuration types for the hwbot orchestrator.
//!
//! Tunables (endpoint, interval, cursor behaviour, locale) come from an
//! optional `hwbot.json` file. Credentials never live in that file; they are
//! read from the environment into [`Credentials`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HwbotError, Result};
use crate::homework::Locale;

/// The default config file name.
const CONFIG_FILE_NAME: &str = "hwbot.json";

/// Environment variable holding the review API token.
pub const API_TOKEN_VAR: &str = "API_TOKEN";

/// Environment variable holding the chat bot token.
pub const CHAT_BOT_TOKEN_VAR: &str = "CHAT_BOT_TOKEN";

/// Environment variable holding the chat destination id.
pub const CHAT_DESTINATION_ID_VAR: &str = "CHAT_DESTINATION_ID";

/// Default review API endpoint.
fn default_endpoint() -> String {
    "https://practicum.yandex.ru/api/user_api/homework_statuses/".to_string()
}

/// Default chat API base URL.
fn default_chat_api_base() -> String {
    "https://api.telegram.org".to_string()
}

/// Default interval between polling cycles, in seconds.
const fn default_poll_interval_secs() -> u64 {
    600
}

/// Default per-request timeout, in seconds.
const fn default_request_timeout_secs() -> u64 {
    30
}

/// Main configuration for the homework watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Review API endpoint queried every cycle.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Base URL of the chat bot API.
    #[serde(default = "default_chat_api_base")]
    pub chat_api_base: String,

    /// Seconds to wait between polling cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Timeout applied to each outbound HTTP request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether the cursor moves forward after successful cycles.
    #[serde(default)]
    pub cursor_mode: CursorMode,

    /// Where the cursor starts when the process boots.
    #[serde(default)]
    pub initial_cursor: InitialCursor,

    /// Policy used by [`check_credentials`].
    #[serde(default)]
    pub credential_gate: CredentialGate,

    /// Language of outgoing chat messages.
    #[serde(default)]
    pub locale: Locale,

    /// Secrets loaded from the environment.
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            chat_api_base: default_chat_api_base(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            cursor_mode: CursorMode::default(),
            initial_cursor: InitialCursor::default(),
            credential_gate: CredentialGate::default(),
            locale: Locale::default(),
            credentials: Credentials::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `hwbot.json` in the current directory. If not found, returns
    /// the default configuration.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            HwbotError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `hwbot.json` in a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_file(&config_path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `HwbotError::ConfigParseError` if the file exists but contains
    /// invalid JSON or invalid enum values, and
    /// `HwbotError::ConfigValidationError` if a value is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(HwbotError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| HwbotError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Attaches credentials to this configuration.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Validates the configuration values.
    ///
    /// - `pollIntervalSecs` and `requestTimeoutSecs` must be greater than 0
    /// - `endpoint` and `chatApiBase` must not be empty
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(HwbotError::config_validation(
                "pollIntervalSecs must be greater than 0",
                "Set pollIntervalSecs to at least 1 in your hwbot.json",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(HwbotError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 in your hwbot.json",
            ));
        }

        if self.endpoint.trim().is_empty() {
            return Err(HwbotError::config_validation(
                "endpoint must not be empty",
                "Provide the review API URL in your hwbot.json or remove the key",
            ));
        }

        if self.chat_api_base.trim().is_empty() {
            return Err(HwbotError::config_validation(
                "chatApiBase must not be empty",
                "Provide the chat API base URL in your hwbot.json or remove the key",
            ));
        }

        Ok(())
    }

    /// Interval between polling cycles.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Timeout applied to each HTTP request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Cursor value for the first cycle.
    #[must_use]
    pub fn starting_cursor(&self) -> i64 {
        match self.initial_cursor {
            InitialCursor::Epoch => 0,
            InitialCursor::Now => chrono::Utc::now().timestamp(),
        }
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// The three opaque secrets the watcher needs.
///
/// An empty value is treated as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Review API token, sent as `Authorization: OAuth <token>`.
    pub api_token: Option<String>,
    /// Chat bot token.
    pub chat_bot_token: Option<String>,
    /// Chat destination id.
    pub chat_destination_id: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const fn mask(value: Option<&String>) -> &'static str {
            match value {
                Some(_) => "<set>",
                None => "<unset>",
            }
        }
        f.debug_struct("Credentials")
            .field("api_token", &mask(self.api_token.as_ref()))
            .field("chat_bot_token", &mask(self.chat_bot_token.as_ref()))
            .field(
                "chat_destination_id",
                &mask(self.chat_destination_id.as_ref()),
            )
            .finish()
    }
}

impl Credentials {
    /// Reads credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads credentials through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|value| !value.is_empty());
        Self {
            api_token: read(API_TOKEN_VAR),
            chat_bot_token: read(CHAT_BOT_TOKEN_VAR),
            chat_destination_id: read(CHAT_DESTINATION_ID_VAR),
        }
    }

    /// Names of the variables that are absent.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (API_TOKEN_VAR, self.api_token.is_none()),
            (CHAT_BOT_TOKEN_VAR, self.chat_bot_token.is_none()),
            (
                CHAT_DESTINATION_ID_VAR,
                self.chat_destination_id.is_none(),
            ),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect()
    }

    /// Review API token, or an empty string when absent.
    #[must_use]
    pub fn api_token(&self) -> &str {
        self.api_token.as_deref().unwrap_or_default()
    }

    /// Chat bot token, or an empty string when absent.
    #[must_use]
    pub fn chat_bot_token(&self) -> &str {
        self.chat_bot_token.as_deref().unwrap_or_default()
    }

    /// Chat destination id, or an empty string when absent.
    #[must_use]
    pub fn chat_destination_id(&self) -> &str {
        self.chat_destination_id.as_deref().unwrap_or_default()
    }
}

/// Decides whether the configured credentials are good enough to start.
///
/// Under [`CredentialGate::All`] startup is refused only when every
/// credential is absent; a partial set is let through and fails later inside
/// the network calls. [`CredentialGate::Any`] refuses on the first gap.
///
/// # Examples
///
/// ```
/// use hwbot_orchestrator::{check_credentials, Config, Credentials};
///
/// let config = Config::default();
/// assert!(!check_credentials(&config));
///
/// let config = Config::default().with_credentials(Credentials {
///     api_token: Some("token".into()),
///     ..Credentials::default()
/// });
/// assert!(check_credentials(&config));
/// ```
#[must_use]
pub fn check_credentials(config: &Config) -> bool {
    let missing = config.credentials.missing().len();
    match config.credential_gate {
        CredentialGate::All => missing < 3,
        CredentialGate::Any => missing == 0,
    }
}

// ============================================================================
// Enumerated settings
// ============================================================================

/// How the poll cursor evolves between cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorMode {
    /// The cursor never moves; every cycle requests the full history (default).
    #[default]
    Fixed,
    /// The cursor moves to the response time after each successful cycle.
    Advance,
}

impl CursorMode {
    /// Parses a string into a `CursorMode`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fixed" => Some(Self::Fixed),
            "advance" => Some(Self::Advance),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for CursorMode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid cursor mode '{s}': expected one of 'fixed', 'advance'"
            ))
        })
    }
}

impl Serialize for CursorMode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::Fixed => "fixed",
            Self::Advance => "advance",
        };
        serializer.serialize_str(s)
    }
}

/// Starting point of the cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InitialCursor {
    /// Unix epoch, i.e. the full history (default).
    #[default]
    Epoch,
    /// The moment the process starts.
    Now,
}

impl InitialCursor {
    /// Parses a string into an `InitialCursor`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "epoch" => Some(Self::Epoch),
            "now" => Some(Self::Now),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for InitialCursor {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid initial cursor '{s}': expected one of 'epoch', 'now'"
            ))
        })
    }
}

impl Serialize for InitialCursor {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::Epoch => "epoch",
            Self::Now => "now",
        };
        serializer.serialize_str(s)
    }
}

/// Policy for the startup credential check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialGate {
    /// Refuse to start only when every credential is absent (default).
    #[default]
    All,
    /// Refuse to start when any credential is absent.
    Any,
}

impl CredentialGate {
    /// Parses a string into a `CredentialGate`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(Self::All),
            "any" => Some(Self::Any),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for CredentialGate {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid credential gate '{s}': expected one of 'all', 'any'"
            ))
        })
    }
}

impl Serialize for CredentialGate {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::All => "all",
            Self::Any => "any",
        };
        serializer.serialize_str(s)
    }
}
