//! Responses of the host commands.
use byteorder::{ByteOrder, LittleEndian};
use proc_bitfield::bitfield;

use super::{ParseError, check_length};
use crate::{DataRole, PowerRole};

bitfield! {
    /// Mask of the versions that the EC supports for a command. Bit `n` stands for version `n`.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct VersionMask(pub u32): Debug, FromStorage, IntoStorage {
        /// Version 0 is supported.
        pub v0: bool @ 0,
        /// Version 1 is supported.
        pub v1: bool @ 1,
        /// Version 2 is supported.
        pub v2: bool @ 2,
    }
}

/// Response of `EC_CMD_GET_CMD_VERSIONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetCmdVersionsResponse {
    /// The supported versions.
    pub version_mask: VersionMask,
}

impl GetCmdVersionsResponse {
    /// Size of the serialized response.
    pub const SIZE: usize = 4;

    /// Parse the response from its binary representation.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ParseError> {
        check_length(buf, Self::SIZE)?;

        Ok(Self {
            version_mask: VersionMask(LittleEndian::read_u32(buf)),
        })
    }
}

/// Response of `EC_CMD_USB_PD_PORTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbPdPortsResponse {
    /// The number of USB PD ports.
    pub num_ports: u8,
}

impl UsbPdPortsResponse {
    /// Size of the serialized response.
    pub const SIZE: usize = 1;

    /// Parse the response from its binary representation.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ParseError> {
        check_length(buf, Self::SIZE)?;

        Ok(Self { num_ports: buf[0] })
    }
}

/// Response of `EC_CMD_USB_PD_CONTROL`, version 0.
///
/// Every field is a plain flag, where any non-zero value is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbPdControlV0 {
    /// Non-zero, if the port is connected.
    pub enabled: u8,
    /// Non-zero, if the port is source.
    pub role: u8,
    /// Non-zero, if the polarity is flipped.
    pub polarity: u8,
    /// Internal state of the EC's PD state machine.
    pub state: u8,
}

impl UsbPdControlV0 {
    /// Size of the serialized response.
    pub const SIZE: usize = 4;

    /// Parse the response from its binary representation.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ParseError> {
        check_length(buf, Self::SIZE)?;

        Ok(Self {
            enabled: buf[0],
            role: buf[1],
            polarity: buf[2],
            state: buf[3],
        })
    }
}

bitfield! {
    /// The `enabled` flags of a version 1 USB PD control response.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct EnabledFlags(pub u8): Debug, FromStorage, IntoStorage {
        /// PD communication is enabled.
        pub comms: bool @ 0,
        /// A partner is connected.
        pub connected: bool @ 1,
        /// The partner is PD capable.
        pub pd_capable: bool @ 2,
    }
}

bitfield! {
    /// The `role` flags of a version 1 USB PD control response.
    #[derive(Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct RoleFlags(pub u8): Debug, FromStorage, IntoStorage {
        /// The port's power role (0 -> sink, 1 -> source).
        pub power: bool [get PowerRole, set PowerRole] @ 0,
        /// The port's data role (0 -> UFP, 1 -> DFP).
        pub data: bool [get DataRole, set DataRole] @ 1,
        /// The port's VCONN role (0 -> sink, 1 -> source).
        pub vconn: bool [get PowerRole, set PowerRole] @ 2,
        /// The partner is dual-role power capable.
        pub dual_role_power: bool @ 3,
        /// The partner is dual-role data capable.
        pub dual_role_data: bool @ 4,
        /// The partner is USB communication capable.
        pub usb_comm: bool @ 5,
        /// The partner is externally powered.
        pub externally_powered: bool @ 6,
    }
}

/// Length of the state name in a version 1 USB PD control response.
pub const PD_STATE_NAME_SIZE: usize = 32;

/// Response of `EC_CMD_USB_PD_CONTROL`, version 1.
///
/// Version 2 responses start with the same fields, so they parse as version 1 as well.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbPdControlV1 {
    /// Connection flags.
    pub enabled: EnabledFlags,
    /// Role flags.
    pub role: RoleFlags,
    /// Non-zero, if the polarity is flipped.
    pub polarity: u8,
    /// Name of the EC's PD state machine state.
    pub state: heapless::String<PD_STATE_NAME_SIZE>,
}

impl UsbPdControlV1 {
    /// Size of the serialized response.
    pub const SIZE: usize = 3 + PD_STATE_NAME_SIZE;

    /// Parse the response from its binary representation.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ParseError> {
        check_length(buf, Self::SIZE)?;

        let name = &buf[3..Self::SIZE];
        let end = name.iter().position(|&c| c == 0).unwrap_or(name.len());

        let mut state = heapless::String::new();
        if let Ok(text) = core::str::from_utf8(&name[..end]) {
            // Cannot overflow, the name is at most `PD_STATE_NAME_SIZE` bytes long.
            _ = state.push_str(text);
        }

        Ok(Self {
            enabled: EnabledFlags(buf[0]),
            role: RoleFlags(buf[1]),
            polarity: buf[2],
            state,
        })
    }
}

/// Product type of a discovered partner.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProductType {
    Undefined,
    Hub,
    Peripheral,
    PassiveCable,
    ActiveCable,
    AlternateModeAdapter,
    Reserved(u8),
}

impl From<u8> for ProductType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Undefined,
            1 => Self::Hub,
            2 => Self::Peripheral,
            3 => Self::PassiveCable,
            4 => Self::ActiveCable,
            5 => Self::AlternateModeAdapter,
            x => Self::Reserved(x),
        }
    }
}

/// Response of `EC_CMD_USB_PD_DISCOVERY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbPdDiscoveryEntry {
    /// USB-IF vendor ID.
    pub vid: u16,
    /// Product ID.
    pub pid: u16,
    /// Raw product type.
    pub ptype: u8,
}

impl UsbPdDiscoveryEntry {
    /// Size of the serialized response.
    pub const SIZE: usize = 5;

    /// Parse the response from its binary representation.
    pub fn from_bytes(buf: &[u8]) -> Result<Self, ParseError> {
        check_length(buf, Self::SIZE)?;

        Ok(Self {
            vid: LittleEndian::read_u16(&buf[0..2]),
            pid: LittleEndian::read_u16(&buf[2..4]),
            ptype: buf[4],
        })
    }

    /// The product type of the partner.
    pub fn product_type(&self) -> ProductType {
        self.ptype.into()
    }
}
