//! Port contexts, and the inventory that creates them.
use cros_ec_typec_traits::CommandChannel;

use crate::error::Error;
use crate::host_cmd::{CommandLayer, EC_CMD_USB_PD_CONTROL, EC_USB_PD_MAX_PORTS};
use crate::typec::PartnerIdentity;
use crate::version::{self, ControlVersion};

/// Bounded storage for the contexts of all ports.
pub type Ports<PARTNER> = heapless::Vec<PortContext<PARTNER>, EC_USB_PD_MAX_PORTS>;

/// Per-port state of the engine.
#[derive(Debug)]
pub struct PortContext<PARTNER> {
    index: usize,
    protocol_version: ControlVersion,
    pub(crate) partner: Option<PARTNER>,
    pub(crate) partner_identity: Option<PartnerIdentity>,
}

impl<PARTNER> PortContext<PARTNER> {
    /// Create the context of a detached port.
    pub fn new(index: usize, protocol_version: ControlVersion) -> Self {
        Self {
            index,
            protocol_version,
            partner: None,
            partner_identity: None,
        }
    }

    /// The port's index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The control version that the port is updated with.
    pub fn protocol_version(&self) -> ControlVersion {
        self.protocol_version
    }

    /// The registered partner, if any.
    pub fn partner(&self) -> Option<&PARTNER> {
        self.partner.as_ref()
    }

    /// The identity of the registered partner, if any.
    pub fn partner_identity(&self) -> Option<&PartnerIdentity> {
        self.partner_identity.as_ref()
    }

    /// Whether a partner is registered.
    pub fn is_attached(&self) -> bool {
        self.partner.is_some()
    }

    /// Take a copy of the port's state.
    pub fn snapshot(&self) -> PortSnapshot {
        PortSnapshot {
            index: self.index,
            protocol_version: self.protocol_version,
            attached: self.is_attached(),
            partner_identity: self.partner_identity,
        }
    }
}

/// A copy of a port's state, for inspection from outside of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortSnapshot {
    /// The port's index.
    pub index: usize,
    /// The control version that the port is updated with.
    pub protocol_version: ControlVersion,
    /// Whether a partner is registered.
    pub attached: bool,
    /// The identity of the registered partner, if any.
    pub partner_identity: Option<PartnerIdentity>,
}

/// Query the number of ports.
///
/// More than `max_ports` ports (at most `EC_USB_PD_MAX_PORTS`) is an error.
pub async fn port_count<CHANNEL: CommandChannel>(
    commands: &mut CommandLayer<CHANNEL>,
    max_ports: usize,
) -> Result<usize, Error> {
    let count = commands
        .usb_pd_ports()
        .await
        .inspect_err(|_err| error!("Failed to get PD port count from EC: {:?}", _err))?
        .num_ports as usize;

    let max = max_ports.min(EC_USB_PD_MAX_PORTS);
    if count > max {
        error!("EC reported too many ports. got: {}, max: {}", count, max);
        return Err(Error::TooManyPorts { count, max });
    }

    Ok(count)
}

/// Create a detached context for each of `count` ports, in index order.
///
/// More than `EC_USB_PD_MAX_PORTS` ports is an error.
pub(crate) fn create_ports<PARTNER>(count: usize, protocol_version: ControlVersion) -> Result<Ports<PARTNER>, Error> {
    let mut ports = Ports::new();
    for index in 0..count {
        ports
            .push(PortContext::new(index, protocol_version))
            .map_err(|_| Error::TooManyPorts {
                count,
                max: EC_USB_PD_MAX_PORTS,
            })?;
    }

    Ok(ports)
}

/// Query the number of ports, resolve the control version, and create a detached context for each
/// port.
///
/// The port count is checked before the EC is asked for any command versions.
pub async fn discover_ports<CHANNEL: CommandChannel, PARTNER>(
    commands: &mut CommandLayer<CHANNEL>,
    max_ports: usize,
) -> Result<(ControlVersion, Ports<PARTNER>), Error> {
    let count = port_count(commands, max_ports).await?;
    debug!("Discovered {} ports", count);

    let mask = version::resolve(commands, EC_CMD_USB_PD_CONTROL).await?;
    let control_version = ControlVersion::select(mask);
    debug!("Using PD control version {}", u8::from(control_version));

    Ok((control_version, create_ports(count, control_version)?))
}
