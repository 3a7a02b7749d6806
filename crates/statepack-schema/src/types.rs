//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings so documents keep their JSON shape.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$name> for String {
            fn eq(&self, other: &$name) -> bool {
                *self == other.0
            }
        }

        impl AsRef<std::path::Path> for $name {
            fn as_ref(&self) -> &std::path::Path {
                std::path::Path::new(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Lower-case hex SHA-256 digest of a packaged file.
    Sha256Digest
);

string_newtype!(
    /// Command namespace slug derived from an extension name.
    Namespace
);

impl Sha256Digest {
    /// Whether this is exactly 64 lower-case hex characters.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 64 && self.0.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl Namespace {
    /// Derive the namespace for an extension name. `None` when the slug is empty.
    pub fn derive(name: &str) -> Option<Self> {
        let slug = crate::slug::normalize_slug(name);
        if slug.is_empty() {
            None
        } else {
            Some(Self(slug))
        }
    }

    /// Prefix every namespaced command key starts with.
    pub fn key_prefix(&self) -> String {
        format!("{}/", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_display_and_as_ref() {
        let d = Sha256Digest::new("abc123");
        assert_eq!(d.to_string(), "abc123");
        assert_eq!(d.as_str(), "abc123");
        assert_eq!(AsRef::<str>::as_ref(&d), "abc123");
    }

    #[test]
    fn digest_serializes_as_plain_string() {
        let d = Sha256Digest::new("deadbeef");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"deadbeef\"");
        let back: Sha256Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn digest_well_formed() {
        assert!(Sha256Digest::new("a".repeat(64)).is_well_formed());
        assert!(!Sha256Digest::new("A".repeat(64)).is_well_formed());
        assert!(!Sha256Digest::new("a".repeat(63)).is_well_formed());
        assert!(!Sha256Digest::new("g".repeat(64)).is_well_formed());
    }

    #[test]
    fn namespace_derivation() {
        let ns = Namespace::derive("Sample Extension").unwrap();
        assert_eq!(ns.as_str(), "sample-extension");
        assert_eq!(ns.key_prefix(), "sample-extension/");
        assert!(Namespace::derive("???").is_none());
    }
}
