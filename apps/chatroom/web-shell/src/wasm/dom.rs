use super::*;

/// The page elements the client drives. All of them must exist.
pub(super) struct ChatSurfaces {
    pub(super) document: Document,
    pub(super) body: HtmlElement,
    pub(super) chat_page: HtmlElement,
    pub(super) message_form: Element,
    pub(super) message_input: HtmlInputElement,
    pub(super) message_area: Element,
    pub(super) connecting: HtmlElement,
    pub(super) connected_users: Element,
    pub(super) user_count: Element,
    pub(super) auth_controls: Element,
}

impl ChatSurfaces {
    pub(super) fn locate() -> Result<Self, String> {
        let window = web_sys::window().ok_or_else(|| "window is unavailable".to_string())?;
        let document = window
            .document()
            .ok_or_else(|| "document is unavailable".to_string())?;
        let body = document
            .body()
            .ok_or_else(|| "document body is unavailable".to_string())?;

        let missing: Vec<&str> = REQUIRED_SURFACES
            .iter()
            .copied()
            .filter(|selector| !matches!(document.query_selector(selector), Ok(Some(_))))
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing required elements: {}", missing.join(", ")));
        }

        Ok(Self {
            chat_page: html_element(&document, CHAT_PAGE_SELECTOR)?,
            message_form: element(&document, MESSAGE_FORM_SELECTOR)?,
            message_input: element(&document, MESSAGE_INPUT_SELECTOR)?
                .dyn_into::<HtmlInputElement>()
                .map_err(|_| format!("{MESSAGE_INPUT_SELECTOR} is not an input element"))?,
            message_area: element(&document, MESSAGE_AREA_SELECTOR)?,
            connecting: html_element(&document, CONNECTING_SELECTOR)?,
            connected_users: element(&document, CONNECTED_USERS_SELECTOR)?,
            user_count: element(&document, USER_COUNT_SELECTOR)?,
            auth_controls: element(&document, AUTH_CONTROLS_SELECTOR)?,
            body,
            document,
        })
    }

    pub(super) fn set_authenticated(&self, authenticated: bool) {
        let _ = self
            .body
            .class_list()
            .toggle_with_force(AUTHENTICATED_BODY_CLASS, authenticated);
        let display = if authenticated {
            CHAT_PAGE_VISIBLE_DISPLAY
        } else {
            "none"
        };
        let _ = self.chat_page.style().set_property("display", display);
    }

    pub(super) fn apply_indicator(&self, indicator: &IndicatorView) {
        let _ = self
            .connecting
            .class_list()
            .toggle_with_force(HIDDEN_CLASS, !indicator.visible);
        if indicator.visible {
            self.connecting.set_text_content(Some(&indicator.text));
            let _ = self.connecting.style().set_property("color", indicator.color);
        }
    }

    pub(super) fn scroll_messages_to_end(&self) {
        self.message_area
            .set_scroll_top(self.message_area.scroll_height());
    }
}

fn element(document: &Document, selector: &str) -> Result<Element, String> {
    document
        .query_selector(selector)
        .map_err(|_| format!("invalid selector {selector}"))?
        .ok_or_else(|| format!("missing {selector}"))
}

fn html_element(document: &Document, selector: &str) -> Result<HtmlElement, String> {
    element(document, selector)?
        .dyn_into::<HtmlElement>()
        .map_err(|_| format!("{selector} is not an HtmlElement"))
}

/// Materialize a node description. User text only ever becomes a text node.
pub(super) fn build_node(
    document: &Document,
    spec: &NodeSpec,
    handlers: &mut Vec<ClickHandler>,
) -> Result<web_sys::Node, JsValue> {
    match spec {
        NodeSpec::Text(text) => Ok(document.create_text_node(text).into()),
        NodeSpec::Element {
            tag,
            classes,
            styles,
            on_click,
            children,
        } => {
            let element = document.create_element(tag)?;
            for class in classes {
                element.class_list().add_1(class)?;
            }
            if !styles.is_empty() {
                let html = element
                    .dyn_ref::<HtmlElement>()
                    .ok_or_else(|| JsValue::from_str("styled node is not an HtmlElement"))?;
                for (property, value) in styles {
                    html.style().set_property(property, value)?;
                }
            }
            if let Some(action) = on_click {
                handlers.push(attach_click_action(&element, action.clone())?);
            }
            for child in children {
                element.append_child(&build_node(document, child, handlers)?)?;
            }
            Ok(element.into())
        }
    }
}

fn attach_click_action(element: &Element, action: ClickAction) -> Result<ClickHandler, JsValue> {
    let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
        match &action {
            ClickAction::Navigate(path) => navigate_to(path),
        }
    }));
    element.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())?;
    Ok(callback)
}

fn navigate_to(path: &str) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if window.location().set_href(path).is_err() {
        error!(path, "browser navigation failed");
    }
}

/// Discard the container's children, then render `specs` into it.
pub(super) fn replace_children(
    document: &Document,
    container: &Element,
    surface: &'static str,
    specs: &[NodeSpec],
) -> Result<(), JsValue> {
    container.set_text_content(None);
    let handlers = render_into(document, container, specs)?;
    CLICK_HANDLERS.with(|slot| {
        slot.borrow_mut().insert(surface, handlers);
    });
    Ok(())
}

pub(super) fn append_children(
    document: &Document,
    container: &Element,
    surface: &'static str,
    specs: &[NodeSpec],
) -> Result<(), JsValue> {
    let handlers = render_into(document, container, specs)?;
    if !handlers.is_empty() {
        CLICK_HANDLERS.with(|slot| {
            slot.borrow_mut().entry(surface).or_default().extend(handlers);
        });
    }
    Ok(())
}

fn render_into(
    document: &Document,
    container: &Element,
    specs: &[NodeSpec],
) -> Result<Vec<ClickHandler>, JsValue> {
    let mut handlers = Vec::new();
    for spec in specs {
        container.append_child(&build_node(document, spec, &mut handlers)?)?;
    }
    Ok(handlers)
}

pub(super) fn install_submit_handler(shell: &Rc<ChatShell>) -> Result<(), String> {
    let already_installed = SUBMIT_HANDLER.with(|slot| slot.borrow().is_some());
    if already_installed {
        return Ok(());
    }

    let submit_shell = Rc::clone(shell);
    let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(
        move |event: web_sys::Event| {
            event.prevent_default();
            submit_shell.submit_from_input();
        },
    ));
    shell
        .surfaces
        .message_form
        .add_event_listener_with_callback_and_bool(
            "submit",
            callback.as_ref().unchecked_ref(),
            true,
        )
        .map_err(|_| "failed to listen for message form submit".to_string())?;
    SUBMIT_HANDLER.with(|slot| *slot.borrow_mut() = Some(callback));
    Ok(())
}
