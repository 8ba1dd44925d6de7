//! # Infrastructure Layer
//!
//! Adapters to the outside world.
//!
//! - [`persistence`]: repository ports with in-memory and PostgreSQL adapters
//! - [`integrations`]: Matching broker client and downstream module clients

pub mod integrations;
pub mod persistence;
