use crate::message::{ChatMessage, MessageKind};

pub const AVATAR_COLORS: [&str; 8] = [
    "#2196F3", "#32c787", "#00BCD4", "#ff5652", "#ffc107", "#ff85af", "#FF9800", "#39bbb0",
];
pub const AVATAR_NEUTRAL_COLOR: &str = "#CCCCCC";
pub const AVATAR_FALLBACK_GLYPH: &str = "?";

/// What a rendered control does when clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    Navigate(String),
}

/// Structured description of a DOM subtree.
///
/// Text only ever enters the tree through [`NodeSpec::Text`], which the shell
/// turns into a text node. There is no variant that carries markup, so user
/// supplied strings can never be parsed as HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSpec {
    Element {
        tag: &'static str,
        classes: Vec<&'static str>,
        styles: Vec<(&'static str, String)>,
        on_click: Option<ClickAction>,
        children: Vec<NodeSpec>,
    },
    Text(String),
}

impl NodeSpec {
    #[must_use]
    pub fn element(tag: &'static str) -> Self {
        Self::Element {
            tag,
            classes: Vec::new(),
            styles: Vec::new(),
            on_click: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn class(mut self, class: &'static str) -> Self {
        if let Self::Element { classes, .. } = &mut self {
            classes.push(class);
        }
        self
    }

    #[must_use]
    pub fn style(mut self, property: &'static str, value: impl Into<String>) -> Self {
        if let Self::Element { styles, .. } = &mut self {
            styles.push((property, value.into()));
        }
        self
    }

    #[must_use]
    pub fn on_click(mut self, action: ClickAction) -> Self {
        if let Self::Element { on_click, .. } = &mut self {
            *on_click = Some(action);
        }
        self
    }

    #[must_use]
    pub fn child(mut self, node: NodeSpec) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }

    #[must_use]
    pub fn with_text(self, value: impl Into<String>) -> Self {
        self.child(Self::text(value))
    }

    /// Concatenated text of the subtree, in document order.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(value) => out.push_str(value),
            Self::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Live,
    Historical,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageRender {
    pub item: Option<NodeSpec>,
    pub roster: Option<Vec<String>>,
}

#[must_use]
pub fn render_message(message: &ChatMessage, mode: RenderMode) -> MessageRender {
    let item = match message.kind {
        MessageKind::Join | MessageKind::Leave => event_notice(&message.content),
        MessageKind::Chat => Some(chat_item(message)),
        MessageKind::Unknown => None,
    };

    let roster = if mode == RenderMode::Live && message.kind.is_presence_event() {
        message.connected_users.clone()
    } else {
        None
    };

    MessageRender { item, roster }
}

fn event_notice(content: &str) -> Option<NodeSpec> {
    if content.is_empty() {
        return None;
    }
    Some(
        NodeSpec::element("li")
            .class("event-message")
            .child(NodeSpec::element("p").with_text(content)),
    )
}

fn chat_item(message: &ChatMessage) -> NodeSpec {
    let glyph = message
        .sender
        .chars()
        .next()
        .map_or_else(|| AVATAR_FALLBACK_GLYPH.to_string(), String::from);

    let avatar = NodeSpec::element("i")
        .style("background-color", avatar_color(&message.sender))
        .with_text(glyph);

    let body = NodeSpec::element("div")
        .class("chat-message-text-content")
        .child(NodeSpec::element("span").with_text(message.sender.clone()))
        .child(NodeSpec::element("p").with_text(message.content.clone()));

    NodeSpec::element("li")
        .class("chat-message")
        .child(avatar)
        .child(body)
}

/// Deterministic palette color for a sender name.
///
/// Folds the UTF-16 code units with `hash = 31 * hash + unit` in `f64`, the
/// browser's number type, then indexes the palette with `|hash % len|`. A hash
/// that overflows to infinity has no slot and gets the neutral color.
#[must_use]
pub fn avatar_color(sender: &str) -> &'static str {
    if sender.is_empty() {
        return AVATAR_NEUTRAL_COLOR;
    }
    let hash = sender
        .encode_utf16()
        .fold(0_f64, |hash, unit| 31.0 * hash + f64::from(unit));
    let slot = (hash % AVATAR_COLORS.len() as f64).abs();
    if !slot.is_finite() {
        return AVATAR_NEUTRAL_COLOR;
    }
    AVATAR_COLORS
        .get(slot as usize)
        .copied()
        .unwrap_or(AVATAR_NEUTRAL_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(node: &NodeSpec, out: &mut Vec<String>) {
        match node {
            NodeSpec::Text(value) => out.push(value.clone()),
            NodeSpec::Element { children, .. } => {
                for child in children {
                    texts(child, out);
                }
            }
        }
    }

    #[test]
    fn chat_message_carries_markup_as_literal_text() {
        let message = ChatMessage::chat("<b>mallory</b>", "<script>alert(1)</script>");
        let rendered = render_message(&message, RenderMode::Live);
        let item = rendered.item.expect("chat item");

        let mut found = Vec::new();
        texts(&item, &mut found);
        assert_eq!(
            found,
            vec![
                "<".to_string(),
                "<b>mallory</b>".to_string(),
                "<script>alert(1)</script>".to_string(),
            ]
        );
        assert!(rendered.roster.is_none());
    }

    #[test]
    fn chat_item_structure_matches_stylesheet_hooks() {
        let rendered = render_message(&ChatMessage::chat("bob", "hi"), RenderMode::Historical);
        let Some(NodeSpec::Element {
            tag,
            classes,
            children,
            ..
        }) = rendered.item
        else {
            panic!("expected element");
        };
        assert_eq!(tag, "li");
        assert_eq!(classes, vec!["chat-message"]);
        assert_eq!(children.len(), 2);

        let NodeSpec::Element { tag, styles, .. } = &children[0] else {
            panic!("expected avatar");
        };
        assert_eq!(*tag, "i");
        assert_eq!(
            styles,
            &vec![("background-color", avatar_color("bob").to_string())]
        );
        assert_eq!(children[0].text_content(), "b");
        assert_eq!(children[1].text_content(), "bobhi");
    }

    #[test]
    fn empty_sender_uses_fallback_glyph_and_neutral_color() {
        let rendered = render_message(&ChatMessage::chat("", "anon"), RenderMode::Live);
        let Some(NodeSpec::Element { children, .. }) = rendered.item else {
            panic!("expected element");
        };
        let NodeSpec::Element { styles, .. } = &children[0] else {
            panic!("expected avatar");
        };
        assert_eq!(children[0].text_content(), "?");
        assert_eq!(styles[0].1, AVATAR_NEUTRAL_COLOR);
    }

    #[test]
    fn presence_events_without_content_render_nothing() {
        for kind in [MessageKind::Join, MessageKind::Leave] {
            let message = ChatMessage {
                sender: "carol".to_string(),
                content: String::new(),
                kind,
                connected_users: Some(vec!["carol".to_string()]),
            };
            let rendered = render_message(&message, RenderMode::Live);
            assert!(rendered.item.is_none());
            assert_eq!(rendered.roster, Some(vec!["carol".to_string()]));
        }
    }

    #[test]
    fn live_join_renders_notice_and_roster() {
        let message = ChatMessage {
            sender: "carol".to_string(),
            content: "carol joined".to_string(),
            kind: MessageKind::Join,
            connected_users: Some(vec!["alice".to_string(), "carol".to_string()]),
        };
        let rendered = render_message(&message, RenderMode::Live);
        let item = rendered.item.expect("notice");
        assert_eq!(item.text_content(), "carol joined");
        let NodeSpec::Element { classes, .. } = &item else {
            panic!("expected element");
        };
        assert_eq!(classes, &vec!["event-message"]);
        assert_eq!(
            rendered.roster,
            Some(vec!["alice".to_string(), "carol".to_string()])
        );
    }

    #[test]
    fn historical_replay_never_updates_roster() {
        let message = ChatMessage {
            sender: "dave".to_string(),
            content: "dave left!".to_string(),
            kind: MessageKind::Leave,
            connected_users: Some(vec!["alice".to_string()]),
        };
        let rendered = render_message(&message, RenderMode::Historical);
        assert!(rendered.item.is_some());
        assert!(rendered.roster.is_none());
    }

    #[test]
    fn chat_with_roster_does_not_update_presence() {
        let mut message = ChatMessage::chat("bob", "hi");
        message.connected_users = Some(vec!["bob".to_string()]);
        assert!(render_message(&message, RenderMode::Live).roster.is_none());
    }

    #[test]
    fn unknown_kind_renders_nothing() {
        let message = ChatMessage {
            sender: "x".to_string(),
            content: "y".to_string(),
            kind: MessageKind::Unknown,
            connected_users: Some(vec!["x".to_string()]),
        };
        assert_eq!(
            render_message(&message, RenderMode::Live),
            MessageRender::default()
        );
    }

    #[test]
    fn avatar_color_follows_browser_number_hash() {
        // 31-fold of "alice" is 92903040, which is 0 mod 8.
        assert_eq!(avatar_color("alice"), AVATAR_COLORS[0]);
        // "bob" folds to 97717, which is 5 mod 8.
        assert_eq!(avatar_color("bob"), AVATAR_COLORS[5]);
        assert_eq!(avatar_color("bob"), avatar_color("bob"));
        assert_eq!(avatar_color(""), AVATAR_NEUTRAL_COLOR);
    }

    #[test]
    fn avatar_color_keeps_large_hashes_unwrapped() {
        // 2923030776462 is past i32 range; a wrapping fold lands on #00BCD4.
        assert_eq!(avatar_color("gal4xyit"), "#FF9800");
        assert_eq!(avatar_color("administrator"), "#2196F3");
        assert_eq!(avatar_color("keycloak-user"), "#2196F3");
    }

    #[test]
    fn avatar_color_for_overflowing_hash_is_neutral() {
        let endless_name = "x".repeat(400);
        assert_eq!(avatar_color(&endless_name), AVATAR_NEUTRAL_COLOR);
    }
}
