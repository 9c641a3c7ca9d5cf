//! Identifier newtypes shared by graphs, state and predicates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Globally unique id of a dialogue node.
    NodeId
);

string_id!(
    /// Id of a character whose arc owns one or more graphs.
    CharacterId
);

string_id!(
    /// Id of a single authored graph (e.g. `samuel` or `samuel_revisit`).
    GraphId
);

/// Identifier for a player session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a nil session ID (used by simulation and replay).
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::nil()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_string_id_display_and_eq() {
        let a = NodeId::from("samuel_intro");
        let b = NodeId::new(String::from("samuel_intro"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "samuel_intro");
    }

    #[test]
    fn test_string_id_borrow_lookup() {
        let mut map = HashMap::new();
        map.insert(CharacterId::from("maya"), 3);
        assert_eq!(map.get("maya"), Some(&3));
    }

    #[test]
    fn test_string_id_serializes_transparently() {
        let json = serde_json::to_string(&GraphId::from("maya_revisit")).unwrap();
        assert_eq!(json, "\"maya_revisit\"");
    }

    #[test]
    fn test_session_id_default_is_nil() {
        assert_eq!(SessionId::default(), SessionId::nil());
        assert_ne!(SessionId::new(), SessionId::nil());
    }
}
