use serde::{Deserialize, Serialize};

use crate::render::{ClickAction, NodeSpec};

pub const LOGIN_BUTTON_TEXT: &str = "Login with Keycloak";
pub const LOGOUT_BUTTON_TEXT: &str = "Logout";
pub const USER_DATA_ERROR_TEXT: &str = "Error loading user data.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthInputError {
    #[error("current user response did not decode: {0}")]
    InvalidBody(String),
}

/// Body of a successful current-user request. A missing or empty username
/// still authenticates; [`Session::can_connect`] keeps it off the socket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentUserResponse {
    #[serde(default)]
    pub username: String,
    #[serde(rename = "idToken", default)]
    pub id_token: Option<String>,
}

/// Identity of the person using this page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Session {
    pub display_name: Option<String>,
    #[serde(skip)]
    pub auth_token: Option<String>,
    pub authenticated: bool,
}

impl Session {
    #[must_use]
    pub fn authenticated(user: CurrentUserResponse) -> Self {
        Self {
            display_name: Some(user.username),
            auth_token: user.id_token,
            authenticated: true,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }

    /// A connection is only attempted for an authenticated, named session.
    #[must_use]
    pub fn can_connect(&self) -> bool {
        self.authenticated && !self.display_name().is_empty()
    }
}

/// Settled current-user request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(Session),
    /// 401: nobody is logged in yet.
    Unauthenticated,
    /// Any other non-OK status.
    Failed { status: u16, body: String },
    /// The request never produced a usable response.
    Unreachable { message: String },
}

impl AuthOutcome {
    /// Classify a response that did arrive.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        if (200..=299).contains(&status) {
            return match decode_current_user(body) {
                Ok(user) => Self::Authenticated(Session::authenticated(user)),
                Err(error) => Self::Unreachable {
                    message: error.to_string(),
                },
            };
        }
        if status == 401 {
            return Self::Unauthenticated;
        }
        Self::Failed {
            status,
            body: body.to_string(),
        }
    }

    #[must_use]
    pub fn session(&self) -> Session {
        match self {
            Self::Authenticated(session) => session.clone(),
            _ => Session::default(),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub fn controls(&self, login_path: &str, logout_path: &str) -> AuthControls {
        match self {
            Self::Authenticated(session) => AuthControls::signed_in(session.display_name(), logout_path),
            Self::Failed { .. } => AuthControls::signed_out(login_path, true),
            Self::Unauthenticated | Self::Unreachable { .. } => {
                AuthControls::signed_out(login_path, false)
            }
        }
    }
}

pub fn decode_current_user(body: &str) -> Result<CurrentUserResponse, AuthInputError> {
    serde_json::from_str(body).map_err(|error| AuthInputError::InvalidBody(error.to_string()))
}

/// Contents of the auth controls container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthControls {
    pub nodes: Vec<NodeSpec>,
}

impl AuthControls {
    #[must_use]
    pub fn signed_out(login_path: &str, with_error: bool) -> Self {
        let mut nodes = vec![
            NodeSpec::element("button")
                .class("button")
                .class("primary")
                .on_click(ClickAction::Navigate(login_path.to_string()))
                .with_text(LOGIN_BUTTON_TEXT),
        ];
        if with_error {
            nodes.push(
                NodeSpec::element("p")
                    .style("color", "red")
                    .with_text(USER_DATA_ERROR_TEXT),
            );
        }
        Self { nodes }
    }

    #[must_use]
    pub fn signed_in(display_name: &str, logout_path: &str) -> Self {
        Self {
            nodes: vec![
                NodeSpec::element("span").with_text(format!("Logged in as: {display_name} ")),
                NodeSpec::element("button")
                    .class("button")
                    .class("accent")
                    .on_click(ClickAction::Navigate(logout_path.to_string()))
                    .with_text(LOGOUT_BUTTON_TEXT),
            ],
        }
    }
}
