//! Decoding of USB PD control responses into a canonical port state.
use crate::host_cmd::ParseError;
use crate::host_cmd::response::{UsbPdControlV0, UsbPdControlV1};
use crate::version::ControlVersion;
use crate::{DataRole, Orientation, PowerRole};

/// State of a port, as reported by the EC.
///
/// Fields that the response version does not carry are `None`. They are unknown, and must not
/// be published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortState {
    /// A partner is connected.
    pub connected: bool,
    /// The port's power role.
    pub power_role: PowerRole,
    /// The port's data role.
    pub data_role: Option<DataRole>,
    /// The port's VCONN role.
    pub vconn_role: Option<PowerRole>,
    /// The cable orientation, `Orientation::None` if disconnected.
    pub orientation: Orientation,
    /// The partner is PD capable.
    pub pd_capable: Option<bool>,
}

impl From<&UsbPdControlV0> for PortState {
    fn from(response: &UsbPdControlV0) -> Self {
        let connected = response.enabled != 0;

        Self {
            connected,
            power_role: (response.role != 0).into(),
            data_role: None,
            vconn_role: None,
            orientation: Orientation::from_polarity(connected, response.polarity != 0),
            pd_capable: None,
        }
    }
}

impl From<&UsbPdControlV1> for PortState {
    fn from(response: &UsbPdControlV1) -> Self {
        let connected = response.enabled.connected();

        Self {
            connected,
            power_role: response.role.power(),
            data_role: Some(response.role.data()),
            vconn_role: Some(response.role.vconn()),
            orientation: Orientation::from_polarity(connected, response.polarity != 0),
            pd_capable: Some(response.enabled.pd_capable()),
        }
    }
}

/// Decode a raw USB PD control response of the given version.
pub fn decode(version: ControlVersion, raw: &[u8]) -> Result<PortState, ParseError> {
    match version {
        ControlVersion::V0 => {
            let response = UsbPdControlV0::from_bytes(raw)?;
            debug!(
                "Enabled: {:#x}, role: {:#x}, polarity: {:#x}, state: {:#x}",
                response.enabled, response.role, response.polarity, response.state
            );
            Ok((&response).into())
        }
        ControlVersion::V1 => {
            let response = UsbPdControlV1::from_bytes(raw)?;
            debug!(
                "Enabled: {:#x}, role: {:#x}, polarity: {:#x}, state: {}",
                response.enabled.0,
                response.role.0,
                response.polarity,
                response.state.as_str()
            );
            Ok((&response).into())
        }
    }
}
