use crate::message::ChatMessage;
use crate::render::{NodeSpec, RenderMode, render_message};

pub const HISTORY_SERVER_ERROR_TEXT: &str = "Could not load message history.";
pub const HISTORY_NETWORK_ERROR_TEXT: &str = "Failed to load history due to network error.";

/// How a history request settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    Loaded(Vec<ChatMessage>),
    ServerError { status: u16 },
    NetworkError { message: String },
}

/// What the message list should do with a settled history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryPlan {
    Nothing,
    /// Append these items, then scroll to the end.
    Append(Vec<NodeSpec>),
    /// Discard the current list and show a single notice.
    ReplaceWithNotice(NodeSpec),
}

impl HistoryOutcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Loaded(_))
    }

    #[must_use]
    pub fn plan(&self) -> HistoryPlan {
        match self {
            Self::Loaded(records) if records.is_empty() => HistoryPlan::Nothing,
            Self::Loaded(records) => HistoryPlan::Append(
                records
                    .iter()
                    .filter_map(|record| render_message(record, RenderMode::Historical).item)
                    .collect(),
            ),
            Self::ServerError { .. } => {
                HistoryPlan::ReplaceWithNotice(history_notice(HISTORY_SERVER_ERROR_TEXT))
            }
            Self::NetworkError { .. } => {
                HistoryPlan::ReplaceWithNotice(history_notice(HISTORY_NETWORK_ERROR_TEXT))
            }
        }
    }
}

fn history_notice(text: &str) -> NodeSpec {
    NodeSpec::element("li").child(NodeSpec::element("p").class("event-message").with_text(text))
}
