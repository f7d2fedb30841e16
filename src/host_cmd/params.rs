//! Request parameters of the host commands.
use byteorder::{ByteOrder, LittleEndian};

/// Legacy (v0) request of `EC_CMD_GET_CMD_VERSIONS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetCmdVersionsV0 {
    /// The command to query, truncated to a byte.
    pub cmd: u8,
}

impl GetCmdVersionsV0 {
    /// Size of the serialized request.
    pub const SIZE: usize = 1;

    /// Serialize the request, returning the number of written bytes.
    pub fn to_bytes(self, buf: &mut [u8]) -> usize {
        buf[0] = self.cmd;
        Self::SIZE
    }
}

/// Request of `EC_CMD_GET_CMD_VERSIONS`, version 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GetCmdVersionsV1 {
    /// The command to query.
    pub cmd: u16,
}

impl GetCmdVersionsV1 {
    /// Size of the serialized request.
    pub const SIZE: usize = 2;

    /// Serialize the request, returning the number of written bytes.
    pub fn to_bytes(self, buf: &mut [u8]) -> usize {
        LittleEndian::write_u16(buf, self.cmd);
        Self::SIZE
    }
}

/// Role changes that can be requested through `EC_CMD_USB_PD_CONTROL`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlRole {
    NoChange = 0,
    ToggleOn = 1,
    ToggleOff = 2,
    ForceSink = 3,
    ForceSource = 4,
    Freeze = 5,
}

/// Mux changes that can be requested through `EC_CMD_USB_PD_CONTROL`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMux {
    NoChange = 0,
    None = 1,
    Usb = 2,
    Dp = 3,
    Dock = 4,
    Auto = 5,
}

/// Swaps that can be requested through `EC_CMD_USB_PD_CONTROL`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlSwap {
    None = 0,
    Data = 1,
    Power = 2,
    Vconn = 3,
}

/// Request of `EC_CMD_USB_PD_CONTROL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbPdControlParams {
    /// The port to control.
    pub port: u8,
    /// The requested role change.
    pub role: ControlRole,
    /// The requested mux change.
    pub mux: ControlMux,
    /// The requested swap.
    pub swap: ControlSwap,
}

impl UsbPdControlParams {
    /// Size of the serialized request.
    pub const SIZE: usize = 4;

    /// A request that only reads back the state of `port`.
    pub fn query(port: u8) -> Self {
        Self {
            port,
            role: ControlRole::NoChange,
            mux: ControlMux::NoChange,
            swap: ControlSwap::None,
        }
    }

    /// Serialize the request, returning the number of written bytes.
    pub fn to_bytes(self, buf: &mut [u8]) -> usize {
        buf[0] = self.port;
        buf[1] = self.role as u8;
        buf[2] = self.mux as u8;
        buf[3] = self.swap as u8;
        Self::SIZE
    }
}

/// Per-port request, as used by `EC_CMD_USB_PD_DISCOVERY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsbPdInfoRequest {
    /// The port to query.
    pub port: u8,
}

impl UsbPdInfoRequest {
    /// Size of the serialized request.
    pub const SIZE: usize = 1;

    /// Serialize the request, returning the number of written bytes.
    pub fn to_bytes(self, buf: &mut [u8]) -> usize {
        buf[0] = self.port;
        Self::SIZE
    }
}
