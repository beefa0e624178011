use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_ENDPOINT: &str = "/api/user";
pub const DEFAULT_HISTORY_ENDPOINT: &str = "/api/messages/history";
pub const DEFAULT_TRANSPORT_PATH: &str = "/ws";
pub const DEFAULT_PUBLIC_TOPIC: &str = "/topic/public";
pub const DEFAULT_ADD_USER_DESTINATION: &str = "/app/chat.addUser";
pub const DEFAULT_SEND_MESSAGE_DESTINATION: &str = "/app/chat.sendMessage";
pub const DEFAULT_LOGIN_PATH: &str = "/oauth2/authorization/keycloak";
pub const DEFAULT_LOGOUT_PATH: &str = "/logout";
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Name of the page global a host page can set to override defaults.
pub const CONFIG_GLOBAL: &str = "__CHAT_CONFIG__";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config overrides are not valid JSON: {0}")]
    InvalidJson(String),
    #[error("{field} must be an absolute path starting with '/', got {value:?}")]
    RelativePath { field: &'static str, value: String },
    #[error("unknown log level {0:?}")]
    UnknownLogLevel(String),
}

/// Endpoints, destinations, and logging level used by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub user_endpoint: String,
    pub history_endpoint: String,
    pub transport_path: String,
    pub public_topic: String,
    pub add_user_destination: String,
    pub send_message_destination: String,
    pub login_path: String,
    pub logout_path: String,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_endpoint: DEFAULT_USER_ENDPOINT.to_string(),
            history_endpoint: DEFAULT_HISTORY_ENDPOINT.to_string(),
            transport_path: DEFAULT_TRANSPORT_PATH.to_string(),
            public_topic: DEFAULT_PUBLIC_TOPIC.to_string(),
            add_user_destination: DEFAULT_ADD_USER_DESTINATION.to_string(),
            send_message_destination: DEFAULT_SEND_MESSAGE_DESTINATION.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Merge a JSON object of overrides onto the defaults.
    pub fn from_overrides_json(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(trimmed)
            .map_err(|error| ConfigError::InvalidJson(error.to_string()))?;
        config.validated()
    }

    pub fn validated(mut self) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("userEndpoint", &mut self.user_endpoint),
            ("historyEndpoint", &mut self.history_endpoint),
            ("transportPath", &mut self.transport_path),
            ("publicTopic", &mut self.public_topic),
            ("addUserDestination", &mut self.add_user_destination),
            ("sendMessageDestination", &mut self.send_message_destination),
            ("loginPath", &mut self.login_path),
            ("logoutPath", &mut self.logout_path),
        ] {
            *value = normalize_path(field, value)?;
        }

        let level = self.log_level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::UnknownLogLevel(self.log_level));
        }
        self.log_level = level;
        Ok(self)
    }

    /// Websocket path beneath the transport endpoint.
    #[must_use]
    pub fn websocket_path(&self) -> String {
        format!("{}/websocket", self.transport_path)
    }
}

fn normalize_path(field: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('/') {
        return Err(ConfigError::RelativePath {
            field,
            value: raw.to_string(),
        });
    }
    if trimmed.len() > 1 {
        return Ok(trimmed.trim_end_matches('/').to_string());
    }
    Ok(trimmed.to_string())
}

/// `https:` pages talk `wss`, everything else plain `ws`.
#[must_use]
pub fn build_websocket_url(protocol: &str, host: &str, path: &str) -> String {
    let ws_protocol = if protocol == "https:" { "wss" } else { "ws" };
    format!("{ws_protocol}://{host}{path}")
}
