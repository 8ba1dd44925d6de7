//! # Application Layer
//!
//! Use cases of the matching service and the errors they report.

pub mod error;
pub mod services;

pub use error::{ApplicationError, ApplicationResult, InfrastructureError};
