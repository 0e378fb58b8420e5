//! Identifier and name types for the property graph

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a numeric identifier newtype with a `Name(n)` display form.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(id: u64) -> Self {
                $name(id)
            }

            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                $name(id)
            }
        }
    };
}

/// Declares a string name newtype (labels, relationship types).
macro_rules! interned_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                $name(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

numeric_id!(
    /// Internal identifier of a node, assigned by the graph on creation
    NodeId
);

numeric_id!(
    /// Internal identifier of a relationship
    EdgeId
);

interned_name!(
    /// Node label (`Dataset`, `Fact`, `Embedded`, ...)
    Label
);

interned_name!(
    /// Relationship type (`CONTAINS`, `REFERENCES`)
    EdgeType
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display_and_order() {
        let id = NodeId::new(42);
        assert_eq!(id.as_u64(), 42);
        assert_eq!(id.to_string(), "NodeId(42)");
        assert_eq!(EdgeId::from(7).to_string(), "EdgeId(7)");
        assert!(NodeId::new(1) < NodeId::new(2));
    }

    #[test]
    fn test_names() {
        let label: Label = "Dataset".into();
        assert_eq!(label.as_str(), "Dataset");
        assert_eq!(label, Label::new(String::from("Dataset")));
        assert_eq!(EdgeType::new("CONTAINS").to_string(), "CONTAINS");
    }
}
