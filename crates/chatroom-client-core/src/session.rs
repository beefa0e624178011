//! Broker session sequencing, independent of the socket implementation.
//!
//! Order on the wire: CONNECT, wait for CONNECTED, SUBSCRIBE to the public
//! topic, load history, announce JOIN, then relay frames both ways until the
//! transport fails or the outgoing queue closes.

use std::future::Future;

use futures::{FutureExt, Stream, StreamExt, pin_mut, select};
use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::config::ClientConfig;
use crate::connection::{ConnectError, ConnectionState};
use crate::history::HistoryOutcome;
use crate::message::ChatMessage;
use crate::stomp::{CMD_CONNECTED, CMD_ERROR, CMD_MESSAGE, StompFrame};

pub const PUBLIC_SUBSCRIPTION_ID: &str = "sub-0";

/// Text frames in and out of the broker socket.
pub trait FrameTransport {
    fn send_text(&mut self, raw: String) -> impl Future<Output = Result<(), ConnectError>>;

    /// Next inbound frame. `Ok(None)` is a frame with no usable text, which the
    /// session skips. A closed socket is an error.
    fn next_text(&mut self) -> impl Future<Output = Result<Option<String>, ConnectError>>;
}

/// Page-side effects of a running session.
pub trait SessionHost {
    fn connected(&self);

    fn load_history(&self) -> impl Future<Output = HistoryOutcome>;

    fn history_settled(&self, outcome: &HistoryOutcome);

    fn message_received(&self, message: &ChatMessage);
}

enum SessionEvent {
    Inbound(Result<Option<String>, ConnectError>),
    Outgoing(ChatMessage),
    OutgoingClosed,
}

/// Drive one broker session. Returns `Ok(())` only when `outgoing` closes.
pub async fn run_session<T, H, O>(
    transport: &mut T,
    host: &H,
    config: &ClientConfig,
    broker_host: &str,
    display_name: &str,
    outgoing: &mut O,
) -> Result<(), ConnectError>
where
    T: FrameTransport,
    H: SessionHost,
    O: Stream<Item = ChatMessage> + Unpin,
{
    transport
        .send_text(StompFrame::connect(broker_host).encode())
        .await?;
    await_connected(transport).await?;
    host.connected();

    let subscribe = StompFrame::subscribe(PUBLIC_SUBSCRIPTION_ID, &config.public_topic);
    transport.send_text(subscribe.encode()).await?;

    let history = host.load_history().await;
    match &history {
        HistoryOutcome::Loaded(records) => debug!(count = records.len(), "history loaded"),
        HistoryOutcome::ServerError { status } => warn!(status, "history request failed"),
        HistoryOutcome::NetworkError { message } => {
            warn!(error = %message, "history request did not complete");
        }
    }
    host.history_settled(&history);

    let join = ChatMessage::join(display_name);
    publish(transport, &config.add_user_destination, &join).await?;
    info!(user = display_name, "joined public topic");

    loop {
        let event = {
            let next_frame = transport.next_text().fuse();
            let next_outgoing = outgoing.next().fuse();
            pin_mut!(next_frame, next_outgoing);

            select! {
                frame = next_frame => SessionEvent::Inbound(frame),
                message = next_outgoing => match message {
                    Some(message) => SessionEvent::Outgoing(message),
                    None => SessionEvent::OutgoingClosed,
                },
            }
        };

        match event {
            SessionEvent::Inbound(frame) => {
                if let Some(frame) = parse_frame(frame?) {
                    handle_frame(host, &frame)?;
                }
            }
            SessionEvent::Outgoing(message) => {
                publish(transport, &config.send_message_destination, &message).await?;
            }
            SessionEvent::OutgoingClosed => {
                info!("outgoing queue closed; leaving broker session");
                return Ok(());
            }
        }
    }
}

/// CHAT message for a form submit, or `None` when it must be ignored.
/// Only blank input is rejected; the content is sent untrimmed.
#[must_use]
pub fn compose_chat(
    session: &Session,
    connection: &ConnectionState,
    raw_input: &str,
) -> Option<ChatMessage> {
    if !session.authenticated || !connection.is_connected() || raw_input.trim().is_empty() {
        return None;
    }
    Some(ChatMessage::chat(session.display_name(), raw_input))
}

async fn await_connected<T: FrameTransport>(transport: &mut T) -> Result<(), ConnectError> {
    loop {
        let Some(frame) = parse_frame(transport.next_text().await?) else {
            continue;
        };
        match frame.command.as_str() {
            CMD_CONNECTED => return Ok(()),
            CMD_ERROR => return Err(broker_error(&frame)),
            other => debug!(command = other, "ignoring frame before CONNECTED"),
        }
    }
}

fn handle_frame<H: SessionHost>(host: &H, frame: &StompFrame) -> Result<(), ConnectError> {
    match frame.command.as_str() {
        CMD_MESSAGE => match ChatMessage::from_json(&frame.body) {
            Ok(message) => host.message_received(&message),
            Err(error) => warn!(error = %error, "dropping undecodable chat message"),
        },
        CMD_ERROR => return Err(broker_error(frame)),
        other => debug!(command = other, "ignoring broker frame"),
    }
    Ok(())
}

fn parse_frame(raw: Option<String>) -> Option<StompFrame> {
    let Some(raw) = raw else {
        warn!("skipping socket frame without text");
        return None;
    };
    match StompFrame::decode(&raw) {
        Ok(frame) => frame,
        Err(error) => {
            warn!(error = %error, "skipping malformed broker frame");
            None
        }
    }
}

fn broker_error(frame: &StompFrame) -> ConnectError {
    ConnectError::Broker {
        message: frame.header_value("message").map(ToString::to_string),
    }
}

async fn publish<T: FrameTransport>(
    transport: &mut T,
    destination: &str,
    message: &ChatMessage,
) -> Result<(), ConnectError> {
    let body = message
        .to_json()
        .map_err(|error| ConnectError::Text(format!("failed to encode chat message: {error}")))?;
    transport
        .send_text(StompFrame::send(destination, body).encode())
        .await
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use futures::channel::mpsc::{UnboundedSender, unbounded};
    use futures::executor::block_on;
    use serde_json::json;

    use super::*;
    use crate::auth::CurrentUserResponse;
    use crate::message::MessageKind;

    const SOCKET_URL: &str = "ws://chat.test/ws/websocket";

    type Log = Rc<RefCell<Vec<String>>>;

    struct ScriptedTransport {
        log: Log,
        inbound: VecDeque<Result<Option<String>, ConnectError>>,
    }

    impl FrameTransport for ScriptedTransport {
        async fn send_text(&mut self, raw: String) -> Result<(), ConnectError> {
            let frame = StompFrame::decode(&raw)
                .expect("client frames decode")
                .expect("client frames are not heart-beats");
            let entry = match frame.header_value("destination") {
                Some(destination) => format!("send {} {destination}", frame.command),
                None => format!("send {}", frame.command),
            };
            self.log.borrow_mut().push(entry);
            Ok(())
        }

        async fn next_text(&mut self) -> Result<Option<String>, ConnectError> {
            match self.inbound.pop_front() {
                Some(next) => next,
                None => futures::future::pending().await,
            }
        }
    }

    struct RecordingHost {
        log: Log,
        history: HistoryOutcome,
        received: RefCell<Vec<ChatMessage>>,
    }

    impl SessionHost for RecordingHost {
        fn connected(&self) {
            self.log.borrow_mut().push("connected".to_string());
        }

        async fn load_history(&self) -> HistoryOutcome {
            self.log.borrow_mut().push("load history".to_string());
            self.history.clone()
        }

        fn history_settled(&self, outcome: &HistoryOutcome) {
            let entry = if outcome.is_failure() {
                "history failed"
            } else {
                "history loaded"
            };
            self.log.borrow_mut().push(entry.to_string());
        }

        fn message_received(&self, message: &ChatMessage) {
            self.log
                .borrow_mut()
                .push(format!("received {}", message.kind.as_str()));
            self.received.borrow_mut().push(message.clone());
        }
    }

    fn connected_frame() -> Result<Option<String>, ConnectError> {
        Ok(Some("CONNECTED\nversion:1.2\n\n\0".to_string()))
    }

    fn broadcast(body: &serde_json::Value) -> Result<Option<String>, ConnectError> {
        Ok(Some(format!(
            "MESSAGE\ndestination:/topic/public\nsubscription:sub-0\n\n{body}\0"
        )))
    }

    fn harness(
        history: HistoryOutcome,
        inbound: Vec<Result<Option<String>, ConnectError>>,
    ) -> (ScriptedTransport, RecordingHost, Log) {
        let log: Log = Rc::default();
        let transport = ScriptedTransport {
            log: Rc::clone(&log),
            inbound: inbound.into(),
        };
        let host = RecordingHost {
            log: Rc::clone(&log),
            history,
            received: RefCell::default(),
        };
        (transport, host, log)
    }

    fn run(
        transport: &mut ScriptedTransport,
        host: &RecordingHost,
        outgoing: &mut futures::channel::mpsc::UnboundedReceiver<ChatMessage>,
    ) -> Result<(), ConnectError> {
        block_on(run_session(
            transport,
            host,
            &ClientConfig::default(),
            "chat.test",
            "alice",
            outgoing,
        ))
    }

    fn opening_sequence(history_entry: &str) -> Vec<String> {
        vec![
            "send CONNECT".to_string(),
            "connected".to_string(),
            "send SUBSCRIBE /topic/public".to_string(),
            "load history".to_string(),
            history_entry.to_string(),
            "send SEND /app/chat.addUser".to_string(),
        ]
    }

    fn idle_outgoing() -> (
        UnboundedSender<ChatMessage>,
        futures::channel::mpsc::UnboundedReceiver<ChatMessage>,
    ) {
        unbounded()
    }

    #[test]
    fn opens_in_order_then_relays_broadcasts() {
        let (mut transport, host, log) = harness(
            HistoryOutcome::Loaded(Vec::new()),
            vec![
                connected_frame(),
                broadcast(&json!({"sender": "bob", "content": "hi", "type": "CHAT"})),
                Err(ConnectError::lost_connection(SOCKET_URL)),
            ],
        );
        let (_keep_open, mut outgoing) = idle_outgoing();

        let result = run(&mut transport, &host, &mut outgoing);

        assert_eq!(result, Err(ConnectError::lost_connection(SOCKET_URL)));
        let mut expected = opening_sequence("history loaded");
        expected.push("received CHAT".to_string());
        assert_eq!(*log.borrow(), expected);
        assert_eq!(host.received.borrow()[0].sender, "bob");
    }

    #[test]
    fn join_is_announced_after_history_server_error() {
        let (mut transport, host, log) = harness(
            HistoryOutcome::ServerError { status: 500 },
            vec![connected_frame(), Err(ConnectError::lost_connection(SOCKET_URL))],
        );
        let (_keep_open, mut outgoing) = idle_outgoing();

        let result = run(&mut transport, &host, &mut outgoing);

        assert!(result.is_err());
        assert_eq!(*log.borrow(), opening_sequence("history failed"));
    }

    #[test]
    fn join_is_announced_after_history_network_error() {
        let (mut transport, host, log) = harness(
            HistoryOutcome::NetworkError {
                message: "offline".to_string(),
            },
            vec![connected_frame(), Err(ConnectError::lost_connection(SOCKET_URL))],
        );
        let (_keep_open, mut outgoing) = idle_outgoing();

        let result = run(&mut transport, &host, &mut outgoing);

        assert!(result.is_err());
        assert_eq!(*log.borrow(), opening_sequence("history failed"));
    }

    #[test]
    fn broker_error_before_connected_stops_the_session() {
        let (mut transport, host, log) = harness(
            HistoryOutcome::Loaded(Vec::new()),
            vec![Ok(Some(
                "ERROR\nmessage:Access denied\n\n\0".to_string(),
            ))],
        );
        let (_keep_open, mut outgoing) = idle_outgoing();

        let result = run(&mut transport, &host, &mut outgoing);

        assert_eq!(
            result,
            Err(ConnectError::Broker {
                message: Some("Access denied".to_string()),
            })
        );
        assert_eq!(*log.borrow(), vec!["send CONNECT".to_string()]);
    }

    #[test]
    fn undecodable_frames_are_skipped() {
        let (mut transport, host, log) = harness(
            HistoryOutcome::Loaded(Vec::new()),
            vec![
                Ok(None),
                connected_frame(),
                Ok(None),
                Ok(Some("MESSAGE\nbroken".to_string())),
                broadcast(&json!({"sender": "carol", "type": "JOIN", "connectedUsers": ["alice", "carol"]})),
                Err(ConnectError::lost_connection(SOCKET_URL)),
            ],
        );
        let (_keep_open, mut outgoing) = idle_outgoing();

        let result = run(&mut transport, &host, &mut outgoing);

        assert_eq!(result, Err(ConnectError::lost_connection(SOCKET_URL)));
        assert_eq!(log.borrow().last().map(String::as_str), Some("received JOIN"));
        assert_eq!(host.received.borrow()[0].kind, MessageKind::Join);
    }

    #[test]
    fn queued_messages_are_sent_to_chat_destination() {
        let (mut transport, host, log) = harness(
            HistoryOutcome::Loaded(Vec::new()),
            vec![connected_frame()],
        );
        let (sender, mut outgoing) = unbounded();
        sender
            .unbounded_send(ChatMessage::chat("alice", " hello "))
            .expect("queue open");
        drop(sender);

        let result = run(&mut transport, &host, &mut outgoing);

        assert_eq!(result, Ok(()));
        assert_eq!(
            log.borrow().last().map(String::as_str),
            Some("send SEND /app/chat.sendMessage")
        );
    }

    fn signed_in() -> Session {
        Session::authenticated(CurrentUserResponse {
            username: "alice".to_string(),
            id_token: None,
        })
    }

    #[test]
    fn compose_chat_keeps_untrimmed_content() {
        let message = compose_chat(&signed_in(), &ConnectionState::Connected, "  hi there ")
            .expect("message");
        assert_eq!(message, ChatMessage::chat("alice", "  hi there "));
    }

    #[test]
    fn compose_chat_ignores_blank_or_offline_submits() {
        let session = signed_in();
        assert_eq!(compose_chat(&session, &ConnectionState::Connected, "   \n"), None);
        assert_eq!(compose_chat(&session, &ConnectionState::Connecting, "hi"), None);
        assert_eq!(
            compose_chat(&session, &ConnectionState::Failed("down".to_string()), "hi"),
            None
        );
        assert_eq!(
            compose_chat(&Session::default(), &ConnectionState::Connected, "hi"),
            None
        );
    }
}
