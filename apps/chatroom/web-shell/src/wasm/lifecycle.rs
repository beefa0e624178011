use std::io;
use std::str::FromStr;

use chatroom_client_core::config::CONFIG_GLOBAL;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

use super::*;

/// Routes formatted tracing events to the browser console, one call per event.
pub(super) struct ConsoleMakeWriter;

pub(super) struct ConsoleWriter {
    level: Level,
    buffer: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.buffer);
        let line = JsValue::from_str(text.trim_end());
        match self.level {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: Level::INFO,
            buffer: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buffer: Vec::new(),
        }
    }
}

pub(super) fn install_logging(level: &str) {
    let level = Level::from_str(level).unwrap_or(Level::INFO);
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(ConsoleMakeWriter)
        .without_time()
        .with_ansi(false)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        web_sys::console::warn_1(&JsValue::from_str(
            "chat client logging was already initialized",
        ));
    }
}

/// Defaults merged with `window.__CHAT_CONFIG__`, plus the reason overrides
/// were discarded if they did not validate.
pub(super) fn load_config() -> (ClientConfig, Option<String>) {
    let Some(window) = web_sys::window() else {
        return (ClientConfig::default(), None);
    };
    let Ok(value) = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL)) else {
        return (ClientConfig::default(), None);
    };
    if value.is_undefined() || value.is_null() {
        return (ClientConfig::default(), None);
    }
    let raw = match js_sys::JSON::stringify(&value) {
        Ok(raw) => String::from(raw),
        Err(_) => {
            return (
                ClientConfig::default(),
                Some(format!("{CONFIG_GLOBAL} is not serializable")),
            );
        }
    };
    match ClientConfig::from_overrides_json(&raw) {
        Ok(config) => (config, None),
        Err(error) => (ClientConfig::default(), Some(error.to_string())),
    }
}

/// Run `on_ready` once the document has parsed, immediately if it already has.
pub(super) fn run_when_dom_ready(on_ready: impl FnOnce() + 'static) -> Result<(), String> {
    let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
    let document = window
        .document()
        .ok_or_else(|| "document is unavailable".to_string())?;

    if document.ready_state() != "loading" {
        on_ready();
        return Ok(());
    }

    let mut pending = Some(on_ready);
    let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
        if let Some(on_ready) = pending.take() {
            on_ready();
        }
    }));
    document
        .add_event_listener_with_callback("DOMContentLoaded", callback.as_ref().unchecked_ref())
        .map_err(|_| "failed to listen for DOMContentLoaded".to_string())?;
    DOM_READY_HANDLER.with(|slot| *slot.borrow_mut() = Some(callback));
    Ok(())
}

/// Startup cannot continue; tell both the console and the page.
pub(super) fn report_fatal(message: &str) {
    error!(error = %message, "critical chat UI elements missing");
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    if let Some(body) = document.body() {
        body.set_inner_html(PAGE_ERROR_MARKUP);
    }
}
