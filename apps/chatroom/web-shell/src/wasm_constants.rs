pub(crate) const CHAT_PAGE_SELECTOR: &str = "#chat-page";
pub(crate) const MESSAGE_FORM_SELECTOR: &str = "#messageForm";
pub(crate) const MESSAGE_INPUT_SELECTOR: &str = "#message";
pub(crate) const MESSAGE_AREA_SELECTOR: &str = "#messageArea";
pub(crate) const CONNECTING_SELECTOR: &str = ".connecting";
pub(crate) const CONNECTED_USERS_SELECTOR: &str = "#connectedUsersList";
pub(crate) const USER_COUNT_SELECTOR: &str = "#user-count";
pub(crate) const AUTH_CONTROLS_SELECTOR: &str = "#auth-controls";
pub(crate) const REQUIRED_SURFACES: [&str; 8] = [
    CHAT_PAGE_SELECTOR,
    MESSAGE_FORM_SELECTOR,
    MESSAGE_INPUT_SELECTOR,
    MESSAGE_AREA_SELECTOR,
    CONNECTING_SELECTOR,
    CONNECTED_USERS_SELECTOR,
    USER_COUNT_SELECTOR,
    AUTH_CONTROLS_SELECTOR,
];
pub(crate) const AUTHENTICATED_BODY_CLASS: &str = "user-authenticated";
pub(crate) const HIDDEN_CLASS: &str = "hidden";
pub(crate) const CHAT_PAGE_VISIBLE_DISPLAY: &str = "flex";
pub(crate) const PAGE_ERROR_MARKUP: &str =
    "<p style='color:red; text-align:center;'>Error: Chat UI components missing.</p>";
