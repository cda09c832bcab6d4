//! Cart session identity.

use serde::{Deserialize, Serialize};

use super::text::{UniqueId, UserId};

/// Who a cart belongs to.
///
/// The backend correlates cart rows to whichever identity is supplied.
/// Exactly one is active per session; the inactive one goes over the wire
/// as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CartIdentity {
    /// Signed-in shopper.
    User(UserId),
    /// Guest session keyed by a device token.
    Anonymous(UniqueId),
}

impl CartIdentity {
    /// Start a new guest session with a freshly generated token.
    #[must_use]
    pub fn new_guest() -> Self {
        Self::Anonymous(UniqueId::generate())
    }

    /// Value for the backend's `UserId` field.
    #[must_use]
    pub fn user_id_field(&self) -> &str {
        match self {
            Self::User(id) => id.as_str(),
            Self::Anonymous(_) => "",
        }
    }

    /// Value for the backend's `UniqueId` field.
    #[must_use]
    pub fn unique_id_field(&self) -> &str {
        match self {
            Self::User(_) => "",
            Self::Anonymous(id) => id.as_str(),
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Anonymous(_) => "anonymous",
        }
    }
}

impl From<UserId> for CartIdentity {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

impl From<UniqueId> for CartIdentity {
    fn from(id: UniqueId) -> Self {
        Self::Anonymous(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_identity_fields() {
        let identity = CartIdentity::from(UserId::parse("1007").unwrap());
        assert_eq!(identity.user_id_field(), "1007");
        assert_eq!(identity.unique_id_field(), "");
        assert_eq!(identity.kind(), "user");
    }

    #[test]
    fn test_anonymous_identity_fields() {
        let identity = CartIdentity::from(UniqueId::parse("guest-abc").unwrap());
        assert_eq!(identity.user_id_field(), "");
        assert_eq!(identity.unique_id_field(), "guest-abc");
        assert_eq!(identity.kind(), "anonymous");
    }

    #[test]
    fn test_new_guest_is_anonymous() {
        let identity = CartIdentity::new_guest();
        assert!(matches!(identity, CartIdentity::Anonymous(_)));
        assert!(!identity.unique_id_field().is_empty());
    }
}
