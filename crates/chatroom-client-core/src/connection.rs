use serde::Serialize;

pub const CONNECTING_TEXT: &str = "Connecting...";
pub const CONNECTING_COLOR: &str = "#777";
pub const CONNECT_FAILED_TEXT: &str = "Could not connect to WebSocket. Please refresh.";
pub const CONNECT_FAILED_COLOR: &str = "red";
/// Marker carried by errors that mean the socket went away underneath us.
pub const DISCONNECT_MARKER: &str = "Whoops!";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// Free-form transport failure text.
    #[error("{0}")]
    Text(String),
    /// Broker rejected the session with an ERROR frame.
    #[error("broker error: {}", message.as_deref().unwrap_or("<no message>"))]
    Broker { message: Option<String> },
}

impl ConnectError {
    #[must_use]
    pub fn lost_connection(url: &str) -> Self {
        Self::Text(format!("{DISCONNECT_MARKER} Lost connection to {url}"))
    }

    /// Banner shown in place of the connecting indicator.
    #[must_use]
    pub fn banner_text(&self) -> String {
        match self {
            Self::Text(text) if text.contains(DISCONNECT_MARKER) => {
                format!("{CONNECT_FAILED_TEXT} (Lost connection)")
            }
            Self::Broker {
                message: Some(message),
            } => format!("{CONNECT_FAILED_TEXT} Server: {message}"),
            Self::Broker { message: None } => CONNECT_FAILED_TEXT.to_string(),
            Self::Text(text) => format!("{CONNECT_FAILED_TEXT} Details: {text}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed(String),
}

/// How the connecting indicator should look for a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorView {
    pub visible: bool,
    pub text: String,
    pub color: &'static str,
}

impl ConnectionState {
    #[must_use]
    pub fn failed(error: &ConnectError) -> Self {
        Self::Failed(error.banner_text())
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    #[must_use]
    pub fn indicator(&self) -> IndicatorView {
        match self {
            Self::Connecting => IndicatorView {
                visible: true,
                text: CONNECTING_TEXT.to_string(),
                color: CONNECTING_COLOR,
            },
            Self::Failed(banner) => IndicatorView {
                visible: true,
                text: banner.clone(),
                color: CONNECT_FAILED_COLOR,
            },
            Self::Disconnected | Self::Connected => IndicatorView {
                visible: false,
                text: String::new(),
                color: CONNECTING_COLOR,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatErrorKind {
    Unauthorized,
    Server,
    Network,
    Decode,
    Transport,
}

impl ChatErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Server => "server",
            Self::Network => "network",
            Self::Decode => "decode",
            Self::Transport => "transport",
        }
    }
}

/// Status `0` is what the shell reports when no response arrived at all.
#[must_use]
pub fn classify_http_status(status: u16) -> ChatErrorKind {
    match status {
        0 => ChatErrorKind::Network,
        401 => ChatErrorKind::Unauthorized,
        _ => ChatErrorKind::Server,
    }
}
