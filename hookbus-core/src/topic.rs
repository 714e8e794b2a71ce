//! Topic tree and wildcard matcher (spec §4.1).
//!
//! Topics are strings split on a fixed two-character delimiter (`::`).
//! Listeners are stored in a trie keyed by segment so that matching a
//! concrete topic against many registered patterns is proportional to the
//! topic's own depth rather than the number of registered patterns.
//!
//! Matching precedence, per segment: exact match, then `*` (matches exactly
//! one segment), then `**` (matches zero or more trailing segments and
//! terminates the pattern). Listener invocation order for a given match
//! class is registration order (oldest first); exact matches are returned
//! before single-segment wildcards, which are returned before multi-segment
//! wildcards, mirroring §5's ordering guarantee.

use hashbrown::HashMap;

/// Delimiter separating topic segments on the wire and in patterns.
pub const DELIMITER: &str = "::";

/// Single-segment wildcard.
const STAR: &str = "*";

/// Multi-segment (trailing) wildcard.
const DOUBLE_STAR: &str = "**";

/// Opaque, stable identifier for a registered listener.
///
/// Used instead of comparing closures directly: a caller removes a listener
/// by the id returned from `add`, the same trick the teacher crate uses for
/// `PeerKey` in its subscription index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Splits a topic string into its `::`-delimited segments.
#[must_use]
pub fn split_topic(topic: &str) -> Vec<&str> {
    if topic.is_empty() {
        Vec::new()
    } else {
        topic.split(DELIMITER).collect()
    }
}

/// Joins segments back into a `::`-delimited topic string.
#[must_use]
pub fn join_topic(segments: &[&str]) -> String {
    segments.join(DELIMITER)
}

#[derive(Default)]
struct Node {
    children: HashMap<String, Node>,
    /// Listener ids bound exactly at this node, in registration order.
    listeners: Vec<ListenerId>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.listeners.is_empty() && self.children.is_empty()
    }
}

/// A trie of topic patterns mapping to listener ids.
///
/// The tree itself is agnostic to what a "listener" actually does; it only
/// tracks which `ListenerId`s are bound to which pattern, and which ids a
/// `match_topic` call finds for a concrete topic. `EventEmitter` layers the
/// actual callable behind each id.
#[derive(Default)]
pub struct TopicTree {
    root: Node,
    next_id: u64,
}

impl TopicTree {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::default(),
            next_id: 1,
        }
    }

    /// Registers a new listener id at `pattern` and returns it.
    pub fn add(&mut self, pattern: &str) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;

        let segments = split_topic(pattern);
        let mut node = &mut self.root;
        for seg in &segments {
            node = node.children.entry((*seg).to_string()).or_default();
        }
        node.listeners.push(id);

        id
    }

    /// Removes a specific listener id from `pattern`. Returns `true` if a
    /// listener was actually removed.
    pub fn remove(&mut self, pattern: &str, id: ListenerId) -> bool {
        let segments = split_topic(pattern);
        let Some(node) = Self::navigate_mut(&mut self.root, &segments) else {
            return false;
        };
        let before = node.listeners.len();
        node.listeners.retain(|l| *l != id);
        let removed = node.listeners.len() != before;

        if removed {
            Self::prune(&mut self.root, &segments);
        }
        removed
    }

    /// Removes every listener bound at `pattern` and returns their ids.
    pub fn remove_all(&mut self, pattern: &str) -> Vec<ListenerId> {
        let segments = split_topic(pattern);
        let Some(node) = Self::navigate_mut(&mut self.root, &segments) else {
            return Vec::new();
        };
        let removed = std::mem::take(&mut node.listeners);
        if !removed.is_empty() {
            Self::prune(&mut self.root, &segments);
        }
        removed
    }

    /// Returns every listener id bound at exactly `pattern` (no wildcard
    /// expansion) — used by `EventEmitter::listeners`.
    #[must_use]
    pub fn at(&self, pattern: &str) -> &[ListenerId] {
        let segments = split_topic(pattern);
        match Self::navigate(&self.root, &segments) {
            Some(node) => &node.listeners,
            None => &[],
        }
    }

    /// Returns every listener id whose pattern matches the concrete `topic`,
    /// ordered exact-before-`*`-before-`**`, registration order within a
    /// class.
    #[must_use]
    pub fn match_topic(&self, topic: &str) -> Vec<ListenerId> {
        let segments = split_topic(topic);

        let mut exact = Vec::new();
        let mut single = Vec::new();
        let mut multi = Vec::new();

        Self::walk(&self.root, &segments, &mut exact, &mut single, &mut multi);

        exact.extend(single);
        exact.extend(multi);
        exact
    }

    /// Returns the set of topic strings with at least one registered
    /// listener (§3 TopicTree.enumerate). Ordering is unspecified.
    #[must_use]
    pub fn enumerate(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        Self::collect(&self.root, &mut path, &mut out);
        out
    }

    fn collect(node: &Node, path: &mut Vec<String>, out: &mut Vec<String>) {
        if !node.listeners.is_empty() {
            out.push(join_topic(
                &path.iter().map(String::as_str).collect::<Vec<_>>(),
            ));
        }
        for (seg, child) in &node.children {
            path.push(seg.clone());
            Self::collect(child, path, out);
            path.pop();
        }
    }

    /// Classifies matches for one topic by wildcard specificity. `exact`,
    /// `single`, `multi` are disjoint accumulators so the caller can apply
    /// the exact < `*` < `**` precedence without a second pass.
    fn walk(
        node: &Node,
        remaining: &[&str],
        exact: &mut Vec<ListenerId>,
        single: &mut Vec<ListenerId>,
        multi: &mut Vec<ListenerId>,
    ) {
        // `**` at this node matches zero or more trailing segments —
        // terminate the pattern here regardless of what's left of `topic`.
        if let Some(child) = node.children.get(DOUBLE_STAR) {
            multi.extend(child.listeners.iter().copied());
        }

        let Some((head, rest)) = remaining.split_first() else {
            exact.extend(node.listeners.iter().copied());
            return;
        };

        if let Some(child) = node.children.get(*head) {
            Self::walk(child, rest, exact, single, multi);
        }
        if let Some(child) = node.children.get(STAR) {
            Self::walk(child, rest, single, single, multi);
        }
    }

    fn navigate<'a>(mut node: &'a Node, segments: &[&str]) -> Option<&'a Node> {
        for seg in segments {
            node = node.children.get(*seg)?;
        }
        Some(node)
    }

    fn navigate_mut<'a>(mut node: &'a mut Node, segments: &[&str]) -> Option<&'a mut Node> {
        for seg in segments {
            node = node.children.get_mut(*seg)?;
        }
        Some(node)
    }

    /// Drops now-empty nodes along `segments`, from the leaf back to the
    /// root. Pruning is not required by the spec but keeps `enumerate` and
    /// memory use proportional to live subscriptions.
    fn prune(node: &mut Node, segments: &[&str]) {
        if let Some((head, rest)) = segments.split_first() {
            if let Some(child) = node.children.get_mut(*head) {
                Self::prune(child, rest);
                if child.is_empty() {
                    node.children.remove(*head);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        let mut t = TopicTree::new();
        let id = t.add("a::b::c");
        assert_eq!(t.match_topic("a::b::c"), vec![id]);
        assert!(t.match_topic("a::b::d").is_empty());
    }

    #[test]
    fn single_wildcard_matches_one_segment() {
        let mut t = TopicTree::new();
        let id = t.add("a::*::c");
        assert_eq!(t.match_topic("a::b::c"), vec![id]);
        assert_eq!(t.match_topic("a::x::c"), vec![id]);
        assert!(t.match_topic("a::b::d").is_empty());
        assert!(t.match_topic("a::c").is_empty());
    }

    #[test]
    fn double_wildcard_matches_zero_or_more_trailing() {
        let mut t = TopicTree::new();
        let id = t.add("a::**");
        assert_eq!(t.match_topic("a"), vec![id]);
        assert_eq!(t.match_topic("a::b"), vec![id]);
        assert_eq!(t.match_topic("a::b::c"), vec![id]);
        assert!(t.match_topic("x").is_empty());
    }

    #[test]
    fn precedence_exact_before_wildcards() {
        let mut t = TopicTree::new();
        let exact = t.add("a::b");
        let star = t.add("a::*");
        let double = t.add("a::**");
        assert_eq!(t.match_topic("a::b"), vec![exact, star, double]);
    }

    #[test]
    fn remove_and_remove_all() {
        let mut t = TopicTree::new();
        let id1 = t.add("a::b");
        let id2 = t.add("a::b");
        assert!(t.remove("a::b", id1));
        assert_eq!(t.match_topic("a::b"), vec![id2]);
        let removed = t.remove_all("a::b");
        assert_eq!(removed, vec![id2]);
        assert!(t.match_topic("a::b").is_empty());
    }

    #[test]
    fn enumerate_returns_registered_patterns() {
        let mut t = TopicTree::new();
        t.add("a::b");
        t.add("a::*::c");
        let mut patterns = t.enumerate();
        patterns.sort();
        assert_eq!(patterns, vec!["a::*::c".to_string(), "a::b".to_string()]);
    }

    #[test]
    fn registration_order_within_a_class() {
        let mut t = TopicTree::new();
        let first = t.add("a::b");
        let second = t.add("a::b");
        assert_eq!(t.match_topic("a::b"), vec![first, second]);
    }
}
