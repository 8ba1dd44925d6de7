//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`RequestId`], [`ProviderId`], [`QuoteId`]: upstream numeric ids
//! - [`CategoryId`], [`SkillId`], [`ZoneId`], [`UserId`]: catalog and user ids
//!
//! ## Validated Values
//!
//! - [`QuoteAmount`]: positive decimal, 16 integer / 2 fraction digits
//! - [`RatingScore`]: 1 to 5 stars
//!
//! ## Domain Enums
//!
//! - [`RequestStatus`]: service request lifecycle

pub mod amount;
pub mod enums;
pub mod ids;
pub mod rating;
pub mod timestamp;

pub use amount::QuoteAmount;
pub use enums::{ParseEnumError, RequestStatus};
pub use ids::{CategoryId, ProviderId, QuoteId, RequestId, SkillId, UserId, ZoneId};
pub use rating::RatingScore;
pub use timestamp::Timestamp;
