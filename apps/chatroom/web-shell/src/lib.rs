#![allow(clippy::needless_pass_by_value)]

#[cfg(target_arch = "wasm32")]
mod wasm_constants;
#[cfg(target_arch = "wasm32")]
mod wasm_state;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use chatroom_client_core::connection::IndicatorView;
    use chatroom_client_core::{
        AuthOutcome, ChatErrorKind, ChatMessage, ClickAction, ClientConfig, ConnectError,
        ConnectionState, HistoryOutcome, HistoryPlan, NodeSpec, RenderMode, Session,
        compose_chat, render_message, render_roster,
    };
    use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
    use futures::{SinkExt, StreamExt};
    use gloo_net::http::Request;
    use gloo_net::websocket::{Message as WsMessage, WebSocketError, futures::WebSocket};
    use tracing::{error, info, warn};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

    use crate::wasm_constants::*;
    use crate::wasm_state::ShellState;

    mod connection;
    mod dom;
    mod lifecycle;
    mod network;

    use connection::*;
    use dom::*;
    use lifecycle::*;
    use network::*;

    type ClickHandler = Closure<dyn FnMut(web_sys::Event)>;

    thread_local! {
        static SHELL: RefCell<Option<Rc<ChatShell>>> = const { RefCell::new(None) };
        static DOM_READY_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static SUBMIT_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static CLICK_HANDLERS: RefCell<HashMap<&'static str, Vec<ClickHandler>>> = RefCell::new(HashMap::new());
    }

    #[derive(Debug, Clone, thiserror::Error)]
    #[error("{} (status={}, kind={})", .message, .status_code, .kind.as_str())]
    pub(super) struct ChatApiError {
        status_code: u16,
        message: String,
        kind: ChatErrorKind,
    }

    /// Page-wide context handed to every routine.
    pub(super) struct ChatShell {
        config: ClientConfig,
        surfaces: ChatSurfaces,
        state: RefCell<ShellState>,
        outgoing: RefCell<Option<UnboundedSender<ChatMessage>>>,
    }

    impl ChatShell {
        fn new(config: ClientConfig, surfaces: ChatSurfaces) -> Self {
            Self {
                config,
                surfaces,
                state: RefCell::new(ShellState::default()),
                outgoing: RefCell::new(None),
            }
        }

        fn session(&self) -> Session {
            self.state.borrow().session.clone()
        }

        fn reset_to_signed_out(&self) {
            self.state.borrow_mut().session = Session::default();
            self.surfaces.set_authenticated(false);
            self.surfaces.apply_indicator(&ConnectionState::Disconnected.indicator());
            self.render_auth_controls(&AuthOutcome::Unauthenticated);
        }

        fn apply_auth_outcome(&self, outcome: &AuthOutcome) {
            self.state.borrow_mut().session = outcome.session();
            self.surfaces.set_authenticated(outcome.is_authenticated());
            self.render_auth_controls(outcome);
        }

        fn render_auth_controls(&self, outcome: &AuthOutcome) {
            let controls = outcome.controls(&self.config.login_path, &self.config.logout_path);
            if let Err(error) = replace_children(
                &self.surfaces.document,
                &self.surfaces.auth_controls,
                AUTH_CONTROLS_SELECTOR,
                &controls.nodes,
            ) {
                error!(error = ?error, "failed to render auth controls");
            }
        }

        fn set_connection(&self, connection: ConnectionState) {
            let indicator: IndicatorView = connection.indicator();
            self.state.borrow_mut().connection = connection;
            self.surfaces.apply_indicator(&indicator);
        }

        fn fail_connection(&self, failure: &ConnectError) {
            error!(error = %failure, "chat transport failed; reload required");
            self.outgoing.borrow_mut().take();
            self.state.borrow_mut().last_error = Some(failure.to_string());
            self.set_connection(ConnectionState::failed(failure));
        }

        fn install_outgoing(&self) -> UnboundedReceiver<ChatMessage> {
            let (sender, receiver) = unbounded();
            *self.outgoing.borrow_mut() = Some(sender);
            receiver
        }

        fn display_message(&self, message: &ChatMessage, mode: RenderMode) {
            let rendered = render_message(message, mode);
            if let Some(item) = rendered.item.as_ref() {
                match append_children(
                    &self.surfaces.document,
                    &self.surfaces.message_area,
                    MESSAGE_AREA_SELECTOR,
                    std::slice::from_ref(item),
                ) {
                    Ok(()) => {
                        let mut state = self.state.borrow_mut();
                        state.messages_rendered = state.messages_rendered.saturating_add(1);
                    }
                    Err(error) => error!(error = ?error, "failed to append message"),
                }
            }
            if let Some(roster) = rendered.roster.as_deref() {
                self.display_roster(roster);
            }
        }

        fn display_roster(&self, roster: &[String]) {
            let view = render_roster(roster, self.session().display_name());
            if let Err(error) = replace_children(
                &self.surfaces.document,
                &self.surfaces.connected_users,
                CONNECTED_USERS_SELECTOR,
                &view.items,
            ) {
                error!(error = ?error, "failed to render roster");
                return;
            }
            self.surfaces
                .user_count
                .set_text_content(Some(&view.count.to_string()));
            self.state.borrow_mut().roster_size = Some(view.count);
        }

        fn apply_history(&self, outcome: &HistoryOutcome) {
            self.state.borrow_mut().history_loaded = Some(!outcome.is_failure());
            let result = match outcome.plan() {
                HistoryPlan::Nothing => Ok(()),
                HistoryPlan::Append(items) => {
                    let appended = append_children(
                        &self.surfaces.document,
                        &self.surfaces.message_area,
                        MESSAGE_AREA_SELECTOR,
                        &items,
                    );
                    if appended.is_ok() {
                        let mut state = self.state.borrow_mut();
                        state.messages_rendered =
                            state.messages_rendered.saturating_add(items.len() as u64);
                        drop(state);
                        self.surfaces.scroll_messages_to_end();
                    }
                    appended
                }
                HistoryPlan::ReplaceWithNotice(notice) => replace_children(
                    &self.surfaces.document,
                    &self.surfaces.message_area,
                    MESSAGE_AREA_SELECTOR,
                    std::slice::from_ref(&notice),
                ),
            };
            if let Err(error) = result {
                error!(error = ?error, "failed to render message history");
            }
        }

        fn submit_from_input(&self) {
            let message = {
                let state = self.state.borrow();
                compose_chat(
                    &state.session,
                    &state.connection,
                    &self.surfaces.message_input.value(),
                )
            };
            let Some(message) = message else {
                return;
            };

            let queued = self
                .outgoing
                .borrow()
                .as_ref()
                .is_some_and(|sender| sender.unbounded_send(message).is_ok());
            if !queued {
                warn!("chat transport is not accepting messages");
                return;
            }
            self.surfaces.message_input.set_value("");
        }
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        let (config, config_error) = load_config();
        install_logging(&config.log_level);
        if let Some(config_error) = config_error {
            warn!(error = %config_error, "ignoring invalid chat config overrides");
        }
        if let Err(error) = run_when_dom_ready(move || boot(config)) {
            error!(error = %error, "chat client could not wait for the document");
        }
    }

    #[wasm_bindgen]
    pub fn chat_state_json() -> String {
        SHELL.with(|slot| match slot.borrow().as_ref() {
            Some(shell) => serde_json::to_string(&*shell.state.borrow())
                .unwrap_or_else(|_| "{\"error\":\"state serialization failed\"}".to_string()),
            None => "{\"phase\":\"booting\"}".to_string(),
        })
    }

    fn boot(config: ClientConfig) {
        let surfaces = match ChatSurfaces::locate() {
            Ok(surfaces) => surfaces,
            Err(error) => {
                report_fatal(&error);
                return;
            }
        };

        let shell = Rc::new(ChatShell::new(config, surfaces));
        SHELL.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&shell)));

        if let Err(error) = install_submit_handler(&shell) {
            error!(error = %error, "message form handler could not be installed");
        }

        info!("chat client booted");
        spawn_local(bootstrap_auth(shell));
    }

    async fn bootstrap_auth(shell: Rc<ChatShell>) {
        shell.reset_to_signed_out();

        let outcome = fetch_current_user(&shell.config).await;
        match &outcome {
            AuthOutcome::Authenticated(session) => {
                info!(user = session.display_name(), "session authenticated");
            }
            AuthOutcome::Unauthenticated => info!("no active session; showing login"),
            AuthOutcome::Failed { status, body } => {
                error!(status, body = %body, "error fetching user info");
            }
            AuthOutcome::Unreachable { message } => {
                warn!(error = %message, "current user request failed");
            }
        }

        shell.apply_auth_outcome(&outcome);
        if outcome.is_authenticated() {
            start_connection(&shell);
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::chat_state_json;

#[cfg(not(target_arch = "wasm32"))]
pub fn chat_state_json() -> String {
    "{\"phase\":\"native\",\"detail\":\"chat client state only available on wasm\"}".to_string()
}
