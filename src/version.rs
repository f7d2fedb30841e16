//! Resolution of host command versions.
use cros_ec_typec_traits::CommandChannel;

use crate::error::Error;
use crate::host_cmd::CommandLayer;
use crate::host_cmd::response::VersionMask;

/// Layout of the `EC_CMD_USB_PD_CONTROL` response that ports are updated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlVersion {
    /// Connection, power role and polarity only.
    V0,
    /// Adds data role, VCONN role and PD capability.
    V1,
}

impl ControlVersion {
    /// Select the control version from the versions that the EC supports.
    ///
    /// Version 2 is never selected, as it does not add any information that is used here.
    pub fn select(mask: VersionMask) -> Self {
        if mask.v1() { Self::V1 } else { Self::V0 }
    }
}

impl From<ControlVersion> for u8 {
    fn from(value: ControlVersion) -> Self {
        match value {
            ControlVersion::V0 => 0,
            ControlVersion::V1 => 1,
        }
    }
}

/// Query the versions that the EC supports for `command`.
///
/// The newer request encoding is tried first. ECs that do not understand it are queried again
/// with the legacy encoding.
pub async fn resolve<CHANNEL: CommandChannel>(
    commands: &mut CommandLayer<CHANNEL>,
    command: u16,
) -> Result<VersionMask, Error> {
    let response = match commands.get_cmd_versions(command).await {
        Ok(response) => response,
        Err(err) => {
            debug!("Versions query failed with {:?}, retrying with legacy request", err);
            commands.get_cmd_versions_legacy(command).await.map_err(|err| {
                error!("Legacy versions query failed with {:?}", err);
                Error::VersionQueryFailure
            })?
        }
    };

    debug!("EC CMD {:#x} has version mask {:#x}", command, response.version_mask.0);
    Ok(response.version_mask)
}
