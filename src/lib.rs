//! Synchronizes USB Type-C connector state with a ChromeOS embedded controller (EC).
//!
//! The EC owns PD negotiation. This crate negotiates the host command versions that the EC
//! supports, decodes its port status responses, and keeps the port partners registered with a
//! Type-C port abstraction in line with what the EC reports.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

// This must go first, so that the logging macros are visible to all other modules.
mod fmt;

pub mod engine;
pub mod error;
pub mod host_cmd;
pub mod notify;
pub mod partner;
pub mod port;
pub mod state;
pub mod typec;
pub mod version;

#[cfg(test)]
mod dummy;

pub use cros_ec_typec_traits::{CommandChannel, TransportError};
pub use engine::{Config, CrosEcTypec, EngineHandle, start};
pub use error::Error;

/// Power role of a port, also used for the VCONN role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerRole {
    /// Provides power (or VCONN).
    Source,
    /// Consumes power (or VCONN).
    Sink,
}

impl From<bool> for PowerRole {
    fn from(value: bool) -> Self {
        match value {
            false => Self::Sink,
            true => Self::Source,
        }
    }
}

impl From<PowerRole> for bool {
    fn from(role: PowerRole) -> bool {
        match role {
            PowerRole::Sink => false,
            PowerRole::Source => true,
        }
    }
}

/// Data role of a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataRole {
    /// Upstream facing port.
    Device,
    /// Downstream facing port.
    Host,
}

impl From<bool> for DataRole {
    fn from(value: bool) -> Self {
        match value {
            false => Self::Device,
            true => Self::Host,
        }
    }
}

impl From<DataRole> for bool {
    fn from(role: DataRole) -> bool {
        match role {
            DataRole::Device => false,
            DataRole::Host => true,
        }
    }
}

/// Orientation of the cable plug in the receptacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Nothing is plugged in.
    None,
    /// CC1 is the active line.
    Normal,
    /// CC2 is the active line.
    Reverse,
}

impl Orientation {
    /// Derive the orientation from the connection state and the polarity flag.
    pub fn from_polarity(connected: bool, polarity: bool) -> Self {
        match (connected, polarity) {
            (false, _) => Self::None,
            (true, false) => Self::Normal,
            (true, true) => Self::Reverse,
        }
    }
}
