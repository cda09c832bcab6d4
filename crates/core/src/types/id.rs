//! Newtype IDs for backend-assigned row identifiers.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different backend tables.

use thiserror::Error;

/// Errors that can occur when parsing an ID from operator input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    /// The input is not an integer.
    #[error("not a valid id: {0}")]
    NotANumber(String),
    /// Backend identifiers start at 1.
    #[error("id must be positive (got {0})")]
    NotPositive(i32),
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
/// - `FromStr` that rejects non-positive values
///
/// # Example
///
/// ```rust
/// # use cartsync_core::define_id;
/// define_id!(OrderId);
/// define_id!(WishlistId);
///
/// let order_id = OrderId::new(1);
/// let wishlist_id = WishlistId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: OrderId = wishlist_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }

            /// Whether the backend could have issued this ID.
            #[must_use]
            pub const fn is_assigned(&self) -> bool {
                self.0 > 0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdParseError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                let id: i32 = s
                    .trim()
                    .parse()
                    .map_err(|_| $crate::types::id::IdParseError::NotANumber(s.to_string()))?;
                if id <= 0 {
                    return Err($crate::types::id::IdParseError::NotPositive(id));
                }
                Ok(Self(id))
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(CartId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_id_parse() {
        let id: CartId = "28447".parse().unwrap();
        assert_eq!(id.as_i32(), 28447);
        assert_eq!(id.to_string(), "28447");
    }

    #[test]
    fn test_cart_id_parse_trims_whitespace() {
        let id: CartId = " 12 ".parse().unwrap();
        assert_eq!(id, CartId::new(12));
    }

    #[test]
    fn test_cart_id_parse_rejects_garbage() {
        let err = "abc".parse::<CartId>().unwrap_err();
        assert!(matches!(err, IdParseError::NotANumber(_)));
    }

    #[test]
    fn test_cart_id_parse_rejects_zero_and_negative() {
        assert_eq!(
            "0".parse::<CartId>().unwrap_err(),
            IdParseError::NotPositive(0)
        );
        assert_eq!(
            "-4".parse::<CartId>().unwrap_err(),
            IdParseError::NotPositive(-4)
        );
    }

    #[test]
    fn test_cart_id_serde_transparent() {
        let id: CartId = serde_json::from_str("28447").unwrap();
        assert_eq!(id, CartId::new(28447));
        assert_eq!(serde_json::to_string(&id).unwrap(), "28447");
    }

    #[test]
    fn test_is_assigned() {
        assert!(CartId::new(1).is_assigned());
        assert!(!CartId::new(0).is_assigned());
    }
}
