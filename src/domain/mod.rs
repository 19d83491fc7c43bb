//! Domain primitives for the ingestion pipeline.
//!
//! Identifiers are newtypes so a feed source id can never be passed where a
//! catalog entry id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                debug_assert!(id >= 0, concat!(stringify!($name), " should be non-negative"));
                Self(id)
            }

            #[must_use]
            pub const fn value(&self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self::new(id)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_i32(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let id = i32::deserialize(deserializer)?;
                Ok(Self::new(id))
            }
        }
    };
}

id_newtype!(
    /// Identifier of a configured feed source.
    FeedId
);

id_newtype!(
    /// Identifier of a catalog entry (one series season).
    CatalogId
);

/// Episode number as announced by a release.
///
/// Fractional values occur for recaps and specials (e.g. 12.5).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct EpisodeNumber(f64);

impl EpisodeNumber {
    #[must_use]
    pub const fn new(num: f64) -> Self {
        Self(num)
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn is_main_episode(&self) -> bool {
        self.0.fract() == 0.0
    }
}

impl fmt::Display for EpisodeNumber {
    #[allow(clippy::cast_possible_truncation)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_main_episode() {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{:.1}", self.0)
        }
    }
}

impl From<f64> for EpisodeNumber {
    fn from(num: f64) -> Self {
        Self::new(num)
    }
}

impl Serialize for EpisodeNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for EpisodeNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let num = f64::deserialize(deserializer)?;
        Ok(Self::new(num))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_id_conversions() {
        let id = FeedId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(FeedId::from(42), id);
    }

    #[test]
    fn catalog_id_serialization() {
        let id = CatalogId::new(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "7");
        let back: CatalogId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn episode_number_display() {
        assert_eq!(EpisodeNumber::new(8.0).to_string(), "8");
        assert_eq!(EpisodeNumber::new(12.5).to_string(), "12.5");
        assert!(!EpisodeNumber::new(12.5).is_main_episode());
    }
}
