use chatroom_client_core::{ConnectionState, Session};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct ShellState {
    pub(super) session: Session,
    pub(super) connection: ConnectionState,
    pub(super) history_loaded: Option<bool>,
    pub(super) messages_rendered: u64,
    pub(super) roster_size: Option<usize>,
    pub(super) last_error: Option<String>,
}
