//! Integer identifiers shared with the REST collaborator.
//!
//! Each identifier serialises transparently as the bare integer so payloads
//! keep the exact shape the API expects (`id_area`, `id_obra`, `id_usuario`).

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw identifier.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Return the raw integer value.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id! {
    /// Server-assigned area identifier (`id_area`).
    AreaId
}

define_id! {
    /// Work-site identifier (`id_obra`).
    ObraId
}

define_id! {
    /// User identifier (`id_usuario`).
    UserId
}

impl ObraId {
    /// Whether the identifier can refer to a persisted work site.
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}
