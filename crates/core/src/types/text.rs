//! Validated string identifiers sent to the cart backend.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a text identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// The input is empty or only whitespace.
    #[error("{kind} cannot be empty")]
    Empty {
        /// Which identifier was being parsed.
        kind: &'static str,
    },
    /// The input is too long.
    #[error("{kind} must be at most {max} characters")]
    TooLong {
        /// Which identifier was being parsed.
        kind: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
}

fn validate(kind: &'static str, max: usize, s: &str) -> Result<String, TextError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(TextError::Empty { kind });
    }
    if trimmed.chars().count() > max {
        return Err(TextError::TooLong { kind, max });
    }
    Ok(trimmed.to_owned())
}

macro_rules! define_text {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Maximum accepted length in characters.
            pub const MAX_LENGTH: usize = $max;

            /// Parse from a string, trimming surrounding whitespace.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is blank or too long.
            pub fn parse(s: &str) -> Result<Self, TextError> {
                validate($kind, Self::MAX_LENGTH, s).map(Self)
            }

            /// Returns the value as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = TextError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_text!(
    /// Catalog item code, e.g. `IM31790673`.
    ItemCode,
    "item code",
    64
);

define_text!(
    /// Identifier of an authenticated shopper.
    UserId,
    "user id",
    128
);

define_text!(
    /// Anonymous per-device token identifying a guest cart session.
    ///
    /// Generated once per guest session and reused for every call so the
    /// backend can correlate cart rows to the device.
    UniqueId,
    "unique id",
    128
);

impl UniqueId {
    /// Generate a fresh anonymous session token.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
