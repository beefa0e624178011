use chatroom_client_core::{FrameTransport, SessionHost, run_session};

use super::*;

/// The browser websocket, speaking text frames to the broker.
struct BrokerSocket {
    socket: WebSocket,
    url: String,
}

impl FrameTransport for BrokerSocket {
    async fn send_text(&mut self, raw: String) -> Result<(), ConnectError> {
        self.socket
            .send(WsMessage::Text(raw))
            .await
            .map_err(|error| map_socket_error(error, &self.url))
    }

    async fn next_text(&mut self) -> Result<Option<String>, ConnectError> {
        match self.socket.next().await {
            Some(Ok(message)) => match websocket_text(message) {
                Ok(text) => Ok(Some(text)),
                Err(error) => {
                    warn!(error = %error, "undecodable socket frame");
                    Ok(None)
                }
            },
            Some(Err(error)) => Err(map_socket_error(error, &self.url)),
            None => Err(ConnectError::lost_connection(&self.url)),
        }
    }
}

impl SessionHost for ChatShell {
    fn connected(&self) {
        self.set_connection(ConnectionState::Connected);
        info!("chat transport connected");
    }

    async fn load_history(&self) -> HistoryOutcome {
        fetch_history(&self.config).await
    }

    fn history_settled(&self, outcome: &HistoryOutcome) {
        self.apply_history(outcome);
    }

    fn message_received(&self, message: &ChatMessage) {
        self.display_message(message, RenderMode::Live);
        self.surfaces.scroll_messages_to_end();
    }
}

/// Open the chat transport for the current session. Failures are terminal.
pub(super) fn start_connection(shell: &Rc<ChatShell>) {
    let session = shell.session();
    if !session.can_connect() {
        warn!("signed in without a display name; not connecting");
        shell.set_connection(ConnectionState::Disconnected);
        return;
    }

    shell.set_connection(ConnectionState::Connecting);
    let mut outgoing = shell.install_outgoing();
    let task_shell = Rc::clone(shell);
    spawn_local(async move {
        let result = match open_socket(&task_shell.config) {
            Ok((mut socket, broker_host)) => {
                run_session(
                    &mut socket,
                    &*task_shell,
                    &task_shell.config,
                    &broker_host,
                    session.display_name(),
                    &mut outgoing,
                )
                .await
            }
            Err(failure) => Err(failure),
        };
        if let Err(failure) = result {
            task_shell.fail_connection(&failure);
        }
    });
}

fn open_socket(config: &ClientConfig) -> Result<(BrokerSocket, String), ConnectError> {
    let (url, host) =
        websocket_url(config).map_err(|error| ConnectError::Text(error.to_string()))?;
    info!(url = %url, "opening chat transport");
    let socket = WebSocket::open(&url).map_err(|error| ConnectError::Text(error.to_string()))?;
    Ok((BrokerSocket { socket, url }, host))
}

fn map_socket_error(error: WebSocketError, url: &str) -> ConnectError {
    match error {
        WebSocketError::MessageSendError(error) => ConnectError::Text(error.to_string()),
        _ => ConnectError::lost_connection(url),
    }
}
