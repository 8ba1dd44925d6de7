//! # Identifiers
//!
//! Numeric identifiers shared with the other marketplace modules.
//!
//! Every id arrives from an upstream system (requests, providers, catalog),
//! so they are plain `i64` newtypes rather than generated UUIDs.
//!
//! # Examples
//!
//! ```
//! use matching_service::domain::value_objects::ids::{ProviderId, RequestId};
//!
//! let request = RequestId::new(10);
//! let provider = ProviderId::new(1);
//! assert_eq!(request.get(), 10);
//! assert_eq!(provider.to_string(), "1");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identifier.
            #[inline]
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw identifier.
            #[inline]
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Service request identifier.
    RequestId
);
numeric_id!(
    /// Provider identifier (external id, also the primary key).
    ProviderId
);
numeric_id!(
    /// Category (rubro) identifier.
    CategoryId
);
numeric_id!(
    /// Skill (habilidad) identifier.
    SkillId
);
numeric_id!(
    /// Quote identifier.
    QuoteId
);
numeric_id!(
    /// Zone identifier.
    ZoneId
);
numeric_id!(
    /// Requester (end user) identifier.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&ProviderId::new(42)).unwrap_or_default();
        assert_eq!(json, "42");
        let back: RequestId = serde_json::from_str("7").unwrap_or(RequestId::new(0));
        assert_eq!(back, RequestId::new(7));
    }

    #[test]
    fn ids_order_numerically() {
        assert!(ProviderId::new(2) < ProviderId::new(10));
    }
}
