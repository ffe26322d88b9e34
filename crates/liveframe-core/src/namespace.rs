//! Component message namespacing.
//!
//! Several instances of the same component can live on one page. Each
//! instance gets an id, and its message names are prefixed with it so the
//! flat handler registry can tell them apart:
//!
//! ```text
//!   component "left"  ──  TOGGLE  ──>  left_TOGGLE
//!   component "right" ──  TOGGLE  ──>  right_TOGGLE
//! ```

use std::fmt;

use crate::handler::MessageMap;

/// Identifier of one component instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Namespace with the given instance id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Instance id.
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Qualified message name: `"<id>_<name>"`.
    pub fn qualify(&self, name: &str) -> String {
        format!("{}_{}", self.0, name)
    }

    /// Rebind every handler in `map` under its qualified name.
    pub fn qualify_map<S>(&self, mut map: MessageMap<S>) -> MessageMap<S> {
        let mut qualified = MessageMap::new();
        let names: Vec<String> = map.names().map(str::to_owned).collect();
        for name in names {
            if let Some(handler) = map.remove(&name) {
                qualified.insert_handler(self.qualify(&name), handler);
            }
        }
        qualified
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::response::Response;

    #[test]
    fn qualify_prefixes_id() {
        assert_eq!(Namespace::new("left").qualify("TOGGLE"), "left_TOGGLE");
    }

    #[test]
    fn instances_do_not_collide() {
        let component = || MessageMap::<bool>::new().with("TOGGLE", |_, on| {
            *on = !*on;
            Response::ok()
        });

        let merged = Namespace::new("left")
            .qualify_map(component())
            .try_merge(Namespace::new("right").qualify_map(component()))
            .unwrap();

        assert!(merged.contains("left_TOGGLE"));
        assert!(merged.contains("right_TOGGLE"));
        assert!(!merged.contains("TOGGLE"));
    }

    proptest! {
        #[test]
        fn qualify_map_prefixes_every_name(
            id in "[a-z]{1,8}",
            names in prop::collection::btree_set("[A-Z_]{1,12}", 0..8),
        ) {
            let map = names.iter().fold(MessageMap::<bool>::new(), |map, name| {
                map.with(name.as_str(), |_, _| Response::ok())
            });

            let namespace = Namespace::new(id.clone());
            let qualified = namespace.qualify_map(map);

            prop_assert_eq!(qualified.len(), names.len());
            for name in &names {
                let expected_name = format!("{id}_{name}");
                prop_assert!(qualified.contains(&expected_name));
            }
            let prefix = format!("{id}_");
            prop_assert!(qualified.names().all(|name| name.starts_with(prefix.as_str())));
        }
    }
}
