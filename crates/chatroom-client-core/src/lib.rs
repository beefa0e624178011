//! Target-independent core of the chatroom browser client.
//!
//! Everything here is pure: it decides what the page should look like and what
//! goes over the wire, and leaves applying it to the web shell.

pub mod auth;
pub mod config;
pub mod connection;
pub mod history;
pub mod message;
pub mod presence;
pub mod render;
pub mod session;
pub mod stomp;

pub use auth::{AuthControls, AuthOutcome, CurrentUserResponse, Session};
pub use config::{ClientConfig, ConfigError};
pub use connection::{ChatErrorKind, ConnectError, ConnectionState, classify_http_status};
pub use history::{HistoryOutcome, HistoryPlan};
pub use message::{ChatMessage, MessageKind};
pub use presence::{RosterView, order_roster, render_roster};
pub use render::{ClickAction, MessageRender, NodeSpec, RenderMode, avatar_color, render_message};
pub use session::{FrameTransport, SessionHost, compose_chat, run_session};
pub use stomp::{StompError, StompFrame};
