//! Message handler registry.
//!
//! A [`MessageMap`] binds message names to handlers for one state type. An
//! application builds its map from fragments (pages, components) and merges
//! them; the runtime looks up inbound messages by exact name.

use std::{collections::HashMap, fmt, sync::Arc};

use liveframe_proto::Message;

use crate::{error::RegistryError, response::Response};

/// Message handler.
///
/// Receives the message and a mutable working copy of the session state. The
/// copy is committed only if the handler does not return an error.
pub type Handler<S> = Arc<dyn Fn(&Message, &mut S) -> Response + Send + Sync>;

/// Mapping from message name to handler.
pub struct MessageMap<S> {
    handlers: HashMap<String, Handler<S>>,
}

impl<S> MessageMap<S> {
    /// Empty map.
    pub fn new() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Message, &mut S) -> Response + Send + Sync + 'static,
    {
        self.insert(name, handler);
        self
    }

    /// Register `handler` under `name`, replacing any previous binding.
    pub fn insert<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Message, &mut S) -> Response + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Register an already shared handler under `name`.
    pub fn insert_handler(&mut self, name: impl Into<String>, handler: Handler<S>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Look up the handler for `name`.
    pub fn get(&self, name: &str) -> Option<&Handler<S>> {
        self.handlers.get(name)
    }

    /// Remove the binding for `name`.
    pub fn remove(&mut self, name: &str) -> Option<Handler<S>> {
        self.handlers.remove(name)
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Bound message names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Merge `other` into this map.
    ///
    /// On a name collision the binding from `other` wins and the collision is
    /// logged at warn level.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for (name, handler) in other.handlers {
            if self.handlers.contains_key(&name) {
                tracing::warn!(name = %name, "handler overridden during merge");
            }
            self.handlers.insert(name, handler);
        }
        self
    }

    /// Merge `other` into this map, refusing collisions.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateHandler` naming the first colliding message. Neither
    /// map is returned in that case.
    pub fn try_merge(mut self, other: Self) -> Result<Self, RegistryError> {
        if let Some(name) = other.handlers.keys().find(|name| self.handlers.contains_key(*name)) {
            return Err(RegistryError::DuplicateHandler { name: name.clone() });
        }
        self.handlers.extend(other.handlers);
        Ok(self)
    }

    /// Merge any number of maps left to right with [`merge`](Self::merge)
    /// semantics.
    pub fn merge_all(maps: impl IntoIterator<Item = Self>) -> Self {
        maps.into_iter().fold(Self::new(), Self::merge)
    }
}

impl<S> Default for MessageMap<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for MessageMap<S> {
    fn clone(&self) -> Self {
        Self { handlers: self.handlers.clone() }
    }
}

impl<S> fmt::Debug for MessageMap<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("MessageMap").field("messages", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn set(value: i64) -> impl Fn(&Message, &mut i64) -> Response + Send + Sync + 'static {
        move |_, state| {
            *state = value;
            Response::ok()
        }
    }

    fn run(map: &MessageMap<i64>, name: &str) -> i64 {
        let mut state = 0;
        let handler = map.get(name).unwrap();
        let _ = handler(&Message::new(name, json!(null)), &mut state);
        state
    }

    #[test]
    fn lookup_by_exact_name() {
        let map = MessageMap::new().with("A", set(1));
        assert!(map.contains("A"));
        assert!(map.get("a").is_none());
        assert_eq!(run(&map, "A"), 1);
    }

    #[test]
    fn merge_later_binding_wins() {
        let first = MessageMap::new().with("A", set(1)).with("B", set(2));
        let second = MessageMap::new().with("A", set(10));

        let merged = first.merge(second);
        assert_eq!(merged.len(), 2);
        assert_eq!(run(&merged, "A"), 10);
        assert_eq!(run(&merged, "B"), 2);
    }

    #[test]
    fn try_merge_rejects_collision() {
        let first = MessageMap::new().with("A", set(1));
        let second = MessageMap::new().with("A", set(2));

        let err = first.try_merge(second).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateHandler { name: "A".to_string() });
    }

    #[test]
    fn try_merge_disjoint() {
        let first = MessageMap::new().with("A", set(1));
        let second = MessageMap::new().with("B", set(2));

        let merged = first.try_merge(second).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_all_is_left_to_right() {
        let merged = MessageMap::merge_all([
            MessageMap::new().with("A", set(1)),
            MessageMap::new().with("A", set(2)),
            MessageMap::new().with("A", set(3)),
        ]);
        assert_eq!(run(&merged, "A"), 3);
    }

    #[test]
    fn debug_lists_sorted_names() {
        let map = MessageMap::<i64>::new().with("B", set(1)).with("A", set(2));
        assert_eq!(format!("{map:?}"), r#"MessageMap { messages: ["A", "B"] }"#);
    }

    fn map_of(names: &BTreeSet<String>, value: i64) -> MessageMap<i64> {
        names.iter().fold(MessageMap::new(), |map, name| map.with(name.as_str(), set(value)))
    }

    proptest! {
        #[test]
        fn merge_keeps_union_and_later_wins(
            first in prop::collection::btree_set("[A-F]", 0..6),
            second in prop::collection::btree_set("[A-F]", 0..6),
        ) {
            let merged = map_of(&first, 1).merge(map_of(&second, 2));

            prop_assert_eq!(merged.len(), first.union(&second).count());
            for name in &second {
                prop_assert_eq!(run(&merged, name), 2);
            }
            for name in first.difference(&second) {
                prop_assert_eq!(run(&merged, name), 1);
            }
        }

        #[test]
        fn try_merge_fails_exactly_on_overlap(
            first in prop::collection::btree_set("[A-F]", 0..6),
            second in prop::collection::btree_set("[A-F]", 0..6),
        ) {
            let overlaps = first.intersection(&second).next().is_some();
            match map_of(&first, 1).try_merge(map_of(&second, 2)) {
                Ok(merged) => {
                    prop_assert!(!overlaps);
                    prop_assert_eq!(merged.len(), first.len() + second.len());
                },
                Err(RegistryError::DuplicateHandler { name }) => {
                    prop_assert!(first.contains(&name) && second.contains(&name));
                },
            }
        }
    }
}
