use std::cmp::Ordering;

use crate::render::NodeSpec;

pub const EMPTY_ROSTER_TEXT: &str = "No users currently online.";
pub const SELF_SUFFIX: &str = " (You)";

/// Full replacement for the connected-user list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterView {
    pub count: usize,
    pub items: Vec<NodeSpec>,
}

/// Own name first, everyone else in lexicographic order.
#[must_use]
pub fn order_roster(users: &[String], self_name: &str) -> Vec<String> {
    let mut ordered = users.to_vec();
    ordered.sort_by(|left, right| {
        match (left.as_str() == self_name, right.as_str() == self_name) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => left.cmp(right),
        }
    });
    ordered
}

#[must_use]
pub fn render_roster(users: &[String], self_name: &str) -> RosterView {
    if users.is_empty() {
        return RosterView {
            count: 0,
            items: vec![
                NodeSpec::element("li")
                    .style("font-style", "italic")
                    .style("color", "#888")
                    .with_text(EMPTY_ROSTER_TEXT),
            ],
        };
    }

    let items = order_roster(users, self_name)
        .into_iter()
        .map(|user| {
            if user == self_name {
                NodeSpec::element("li")
                    .child(NodeSpec::element("strong").with_text(format!("{user}{SELF_SUFFIX}")))
            } else {
                NodeSpec::element("li").with_text(user)
            }
        })
        .collect();

    RosterView {
        count: users.len(),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn self_sorts_first_then_lexicographic() {
        let ordered = order_roster(&names(&["zoe", "carol", "alice", "bob"]), "carol");
        assert_eq!(ordered, names(&["carol", "alice", "bob", "zoe"]));
    }

    #[test]
    fn ordering_without_self_is_plain_lexicographic() {
        let ordered = order_roster(&names(&["zoe", "bob"]), "alice");
        assert_eq!(ordered, names(&["bob", "zoe"]));
    }

    #[test]
    fn self_entry_is_marked_and_first() {
        let view = render_roster(&names(&["carol", "alice"]), "alice");
        assert_eq!(view.count, 2);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.items[0].text_content(), "alice (You)");
        assert_eq!(view.items[1].text_content(), "carol");

        let NodeSpec::Element { children, .. } = &view.items[0] else {
            panic!("expected list item");
        };
        assert!(matches!(
            &children[0],
            NodeSpec::Element { tag: "strong", .. }
        ));
        let NodeSpec::Element { children, .. } = &view.items[1] else {
            panic!("expected list item");
        };
        assert_eq!(children, &vec![NodeSpec::text("carol")]);
    }

    #[test]
    fn other_names_stay_literal_text() {
        let view = render_roster(&names(&["<img src=x onerror=alert(1)>"]), "alice");
        let NodeSpec::Element { children, .. } = &view.items[0] else {
            panic!("expected list item");
        };
        assert_eq!(
            children,
            &vec![NodeSpec::text("<img src=x onerror=alert(1)>")]
        );
    }

    #[test]
    fn empty_roster_renders_placeholder() {
        let view = render_roster(&[], "alice");
        assert_eq!(view.count, 0);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].text_content(), EMPTY_ROSTER_TEXT);
        let NodeSpec::Element { styles, .. } = &view.items[0] else {
            panic!("expected list item");
        };
        assert!(styles.contains(&("font-style", "italic".to_string())));
    }

    #[test]
    fn rendering_is_a_pure_replacement() {
        let roster = names(&["bob", "alice"]);
        assert_eq!(render_roster(&roster, "alice"), render_roster(&roster, "alice"));
    }
}
