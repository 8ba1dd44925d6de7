//! # API Layer
//!
//! Inbound HTTP surface of the service.

pub mod rest;
