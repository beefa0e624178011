use chatroom_client_core::classify_http_status;
use chatroom_client_core::config::build_websocket_url;
use chatroom_client_core::message::decode_history;

use super::*;

impl ChatApiError {
    pub(super) fn new(status_code: u16, kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            kind,
        }
    }

    fn browser(message: &str) -> Self {
        Self::new(0, ChatErrorKind::Transport, message)
    }
}

/// GET `path` on this origin. Any status counts as a response.
pub(super) async fn get_text(path: &str) -> Result<(u16, String), ChatApiError> {
    let response = Request::get(path)
        .header("accept", "application/json")
        .send()
        .await
        .map_err(map_network_error)?;
    let status = response.status();
    let body = response.text().await.map_err(|error| {
        ChatApiError::new(
            status,
            ChatErrorKind::Decode,
            format!("failed to read response body: {error}"),
        )
    })?;
    Ok((status, body))
}

pub(super) fn map_network_error(error: gloo_net::Error) -> ChatApiError {
    ChatApiError::new(0, classify_http_status(0), error.to_string())
}

pub(super) async fn fetch_current_user(config: &ClientConfig) -> AuthOutcome {
    match get_text(&config.user_endpoint).await {
        Ok((status, body)) => AuthOutcome::from_response(status, &body),
        Err(error) => AuthOutcome::Unreachable {
            message: error.to_string(),
        },
    }
}

pub(super) async fn fetch_history(config: &ClientConfig) -> HistoryOutcome {
    let (status, body) = match get_text(&config.history_endpoint).await {
        Ok(response) => response,
        Err(error) => {
            return HistoryOutcome::NetworkError {
                message: error.to_string(),
            };
        }
    };
    if !(200..=299).contains(&status) {
        return HistoryOutcome::ServerError { status };
    }
    match decode_history(&body) {
        Ok(records) => HistoryOutcome::Loaded(records),
        Err(error) => HistoryOutcome::NetworkError {
            message: format!("history body did not decode: {error}"),
        },
    }
}

/// Socket URL for this page plus the host the broker should see in CONNECT.
pub(super) fn websocket_url(config: &ClientConfig) -> Result<(String, String), ChatApiError> {
    let window = web_sys::window().ok_or_else(|| ChatApiError::browser("window is unavailable"))?;
    let location = window.location();
    let protocol = location
        .protocol()
        .map_err(|_| ChatApiError::browser("browser protocol is unavailable"))?;
    let host = location
        .host()
        .map_err(|_| ChatApiError::browser("browser host is unavailable"))?;
    let url = build_websocket_url(&protocol, &host, &config.websocket_path());
    Ok((url, host))
}

pub(super) fn websocket_text(message: WsMessage) -> Result<String, ChatApiError> {
    match message {
        WsMessage::Text(text) => Ok(text),
        WsMessage::Bytes(bytes) => String::from_utf8(bytes).map_err(|error| {
            ChatApiError::new(
                0,
                ChatErrorKind::Decode,
                format!("invalid websocket frame encoding: {error}"),
            )
        }),
    }
}
