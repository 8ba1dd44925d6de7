//! # Domain Enums
//!
//! Enumeration types for domain concepts.
//!
//! - [`RequestStatus`] - Lifecycle of a service request
//!
//! All enums implement `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`,
//! `Display`, `FromStr`, and Serde traits. Wire values keep the upstream
//! Spanish names (`CREADA`, `COTIZANDO`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a service request.
///
/// ```text
/// CREADA → COTIZANDO → ASIGNADA → EN_PROGRESO → COMPLETADA
///    ↓          ↓           ↓           ↓
///    └──────────┴───────────┴───────────┴──→ CANCELADA
/// ```
///
/// Transitions only move forward. Only `CREADA` requests enter the
/// invitation workflow.
///
/// # Examples
///
/// ```
/// use matching_service::domain::value_objects::enums::RequestStatus;
///
/// assert!(RequestStatus::Created.can_transition_to(RequestStatus::Quoting));
/// assert!(!RequestStatus::Quoting.can_transition_to(RequestStatus::Created));
/// assert_eq!(RequestStatus::Quoting.to_string(), "COTIZANDO");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum RequestStatus {
    /// Created, waiting for invitations.
    #[default]
    #[serde(rename = "CREADA")]
    Created = 0,
    /// Providers invited, quotes being collected.
    #[serde(rename = "COTIZANDO")]
    Quoting = 1,
    /// A provider was assigned.
    #[serde(rename = "ASIGNADA")]
    Assigned = 2,
    /// Work in progress.
    #[serde(rename = "EN_PROGRESO")]
    InProgress = 3,
    /// Work finished.
    #[serde(rename = "COMPLETADA")]
    Completed = 4,
    /// Cancelled by the requester.
    #[serde(rename = "CANCELADA")]
    Cancelled = 5,
}

impl RequestStatus {
    /// Returns true if no further transition is possible.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if the status may move to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match target {
            Self::Cancelled => true,
            _ => (target as u8) > (self as u8),
        }
    }

    /// Returns the upstream wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREADA",
            Self::Quoting => "COTIZANDO",
            Self::Assigned => "ASIGNADA",
            Self::InProgress => "EN_PROGRESO",
            Self::Completed => "COMPLETADA",
            Self::Cancelled => "CANCELADA",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "CREADA" => Ok(Self::Created),
            "COTIZANDO" => Ok(Self::Quoting),
            "ASIGNADA" => Ok(Self::Assigned),
            "EN_PROGRESO" => Ok(Self::InProgress),
            "COMPLETADA" => Ok(Self::Completed),
            "CANCELADA" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError::InvalidValue("RequestStatus", s.to_string())),
        }
    }
}

/// Error returned when parsing an enum from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEnumError {
    /// The provided string value is not valid for the enum.
    InvalidValue(&'static str, String),
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue(enum_name, value) => {
                write!(f, "invalid {} value: '{}'", enum_name, value)
            }
        }
    }
}

impl std::error::Error for ParseEnumError {}
