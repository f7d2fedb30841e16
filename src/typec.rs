//! The Type-C port abstraction that the engine publishes port state to.
//!
//! Ports are addressed by their index. Partners are owned through a handle that the abstraction
//! hands out on registration.
use crate::{DataRole, Orientation, PowerRole};

/// Errors that the port abstraction can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TypecError {
    /// Out of resources for another port or partner.
    NoMemory,
    /// The request is not supported.
    NotSupported,
    /// The request was rejected.
    Rejected,
}

/// Power capabilities of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PortType {
    /// Source only.
    Source,
    /// Sink only.
    Sink,
    /// Dual-role power.
    Drp,
}

/// Data capabilities of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PortData {
    /// Downstream facing only.
    Dfp,
    /// Upstream facing only.
    Ufp,
    /// Dual-role data.
    Drd,
}

/// Capabilities that a port is registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortCapability {
    /// Power capabilities.
    pub port_type: PortType,
    /// Data capabilities.
    pub data: PortData,
    /// Preferred power role, if any.
    pub prefer_role: Option<PowerRole>,
}

impl Default for PortCapability {
    fn default() -> Self {
        Self {
            port_type: PortType::Drp,
            data: PortData::Dfp,
            prefer_role: Some(PowerRole::Sink),
        }
    }
}

/// Description of a partner to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartnerDesc {
    /// The partner supports USB PD.
    pub usb_pd: bool,
}

/// USB PD identity of a partner, as far as the EC discovers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartnerIdentity {
    /// ID header VDO. Only carries the vendor ID.
    pub id_header: u32,
    /// Product VDO. The product ID is in the upper half, bcdDevice stays zero.
    pub product: u32,
}

impl PartnerIdentity {
    /// Build an identity from a discovered vendor and product ID.
    pub fn new(vid: u16, pid: u16) -> Self {
        Self {
            id_header: vid as u32,
            product: (pid as u32) << 16,
        }
    }

    /// The vendor ID.
    pub fn vid(&self) -> u16 {
        self.id_header as u16
    }

    /// The product ID.
    pub fn pid(&self) -> u16 {
        (self.product >> 16) as u16
    }
}

/// Trait for the Type-C port abstraction.
///
/// The engine registers its ports here, and publishes the state of each port and its partner.
pub trait TypecClass {
    /// Handle of a registered partner.
    type Partner;

    /// Register port `port`.
    fn register_port(&mut self, port: usize, capability: &PortCapability) -> Result<(), TypecError>;

    /// Unregister port `port`.
    fn unregister_port(&mut self, port: usize);

    /// Publish the power role of `port`.
    fn set_power_role(&mut self, port: usize, role: PowerRole);

    /// Publish the data role of `port`.
    fn set_data_role(&mut self, port: usize, role: DataRole);

    /// Publish the VCONN role of `port`.
    fn set_vconn_role(&mut self, port: usize, role: PowerRole);

    /// Publish the cable orientation of `port`.
    fn set_orientation(&mut self, port: usize, orientation: Orientation);

    /// Register a partner on `port`.
    fn register_partner(&mut self, port: usize, desc: &PartnerDesc) -> Result<Self::Partner, TypecError>;

    /// Unregister a partner.
    fn unregister_partner(&mut self, partner: Self::Partner) -> Result<(), TypecError>;

    /// Publish the identity of a partner.
    fn set_partner_identity(&mut self, partner: &Self::Partner, identity: &PartnerIdentity) -> Result<(), TypecError>;
}

/// Hooks for role changes that are requested through the port abstraction.
///
/// By default, every request is accepted without changing anything.
pub trait RoleSwitch {
    /// Set the preferred power role of `port`. `None` removes the preference.
    fn try_role(&self, _port: usize, _role: Option<PowerRole>) -> Result<(), TypecError> {
        Ok(())
    }

    /// Swap the data role of `port`.
    fn dr_set(&self, _port: usize, _role: DataRole) -> Result<(), TypecError> {
        Ok(())
    }

    /// Swap the power role of `port`.
    fn pr_set(&self, _port: usize, _role: PowerRole) -> Result<(), TypecError> {
        Ok(())
    }

    /// Swap the VCONN role of `port`.
    fn vconn_set(&self, _port: usize, _role: PowerRole) -> Result<(), TypecError> {
        Ok(())
    }
}
