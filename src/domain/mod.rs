//! # Domain Layer
//!
//! Entities, value objects and business rules with no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use errors::{DomainError, DomainResult};
