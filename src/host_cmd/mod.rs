//! EC host commands, as used for Type-C port synchronization.
//!
//! The request parameters and responses are packed little-endian structures, laid out exactly
//! as the EC firmware defines them.
pub mod params;
pub mod response;

use cros_ec_typec_traits::{CommandChannel, TransportError};

use params::{GetCmdVersionsV0, GetCmdVersionsV1, UsbPdControlParams, UsbPdInfoRequest};
use response::{GetCmdVersionsResponse, UsbPdDiscoveryEntry, UsbPdPortsResponse};

/// Get the supported versions of a host command.
pub const EC_CMD_GET_CMD_VERSIONS: u16 = 0x0008;
/// Get or set the USB PD control state of a port.
pub const EC_CMD_USB_PD_CONTROL: u16 = 0x0101;
/// Get the number of USB PD ports.
pub const EC_CMD_USB_PD_PORTS: u16 = 0x0102;
/// Get the discovery identity of a port partner.
pub const EC_CMD_USB_PD_DISCOVERY: u16 = 0x0113;

/// The maximum number of USB PD ports that an EC may report.
pub const EC_USB_PD_MAX_PORTS: usize = 8;

/// Host event code that signals a USB PD MCU event.
pub const EC_HOST_EVENT_PD_MCU: u32 = 22;

/// Convert a host event code into its bit in the host event mask.
pub const fn host_event_mask(event_code: u32) -> u32 {
    1 << (event_code - 1)
}

/// Largest response that the commands in this module produce (`usb_pd_control` v1).
pub const MAX_RESPONSE_SIZE: usize = response::UsbPdControlV1::SIZE;

/// Errors that can occur during response parsing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// The response buffer has an invalid length.
    /// * `expected` - The minimum expected length.
    /// * `found` - The actual length found.
    #[error("invalid response length (expected {expected:?}, found {found:?})")]
    InvalidLength {
        /// The minimum expected length.
        expected: usize,
        /// The actual length found.
        found: usize,
    },
}

/// Check that `buf` holds at least `expected` bytes.
pub(crate) fn check_length(buf: &[u8], expected: usize) -> Result<(), ParseError> {
    if buf.len() < expected {
        Err(ParseError::InvalidLength {
            expected,
            found: buf.len(),
        })
    } else {
        Ok(())
    }
}

/// Errors that can occur when exchanging a host command.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// The transport failed.
    Transport(TransportError),
    /// The response could not be parsed.
    Parse(ParseError),
}

impl From<TransportError> for CommandError {
    fn from(value: TransportError) -> Self {
        CommandError::Transport(value)
    }
}

impl From<ParseError> for CommandError {
    fn from(value: ParseError) -> Self {
        CommandError::Parse(value)
    }
}

/// The host command layer wraps a command channel and speaks the EC's host commands.
#[derive(Debug)]
pub struct CommandLayer<CHANNEL: CommandChannel> {
    channel: CHANNEL,
    command_offset: u16,
}

impl<CHANNEL: CommandChannel> CommandLayer<CHANNEL> {
    /// Create a new command layer.
    ///
    /// `command_offset` is added to every command, for ECs that are reached through a passthru.
    pub fn new(channel: CHANNEL, command_offset: u16) -> Self {
        Self {
            channel,
            command_offset,
        }
    }

    /// Release the underlying channel.
    pub fn into_channel(self) -> CHANNEL {
        self.channel
    }

    /// Exchange a raw host command, returning the length of the response.
    pub async fn command(
        &mut self,
        version: u8,
        command: u16,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, TransportError> {
        trace!("typec HC {:#x} req: {:?}", command, request);

        let result = self
            .channel
            .execute(version, self.command_offset.wrapping_add(command), request, response)
            .await;

        match result {
            Ok(len) => {
                let len = len.min(response.len());
                trace!("typec HC {:#x} res: {:?}", command, &response[..len]);
                Ok(len)
            }
            Err(err) => {
                trace!("typec HC {:#x} failed: {:?}", command, err);
                Err(err)
            }
        }
    }

    /// Query the version mask of `command`, with the newer (v1) request encoding.
    pub async fn get_cmd_versions(&mut self, command: u16) -> Result<GetCmdVersionsResponse, CommandError> {
        let mut request = [0u8; GetCmdVersionsV1::SIZE];
        GetCmdVersionsV1 { cmd: command }.to_bytes(&mut request);

        let mut buf = [0u8; GetCmdVersionsResponse::SIZE];
        let len = self.command(1, EC_CMD_GET_CMD_VERSIONS, &request, &mut buf).await?;
        Ok(GetCmdVersionsResponse::from_bytes(&buf[..len])?)
    }

    /// Query the version mask of `command`, with the legacy (v0) request encoding.
    ///
    /// The legacy encoding only carries the low byte of the command.
    pub async fn get_cmd_versions_legacy(&mut self, command: u16) -> Result<GetCmdVersionsResponse, CommandError> {
        let mut request = [0u8; GetCmdVersionsV0::SIZE];
        GetCmdVersionsV0 { cmd: command as u8 }.to_bytes(&mut request);

        let mut buf = [0u8; GetCmdVersionsResponse::SIZE];
        let len = self.command(0, EC_CMD_GET_CMD_VERSIONS, &request, &mut buf).await?;
        Ok(GetCmdVersionsResponse::from_bytes(&buf[..len])?)
    }

    /// Query the number of USB PD ports.
    pub async fn usb_pd_ports(&mut self) -> Result<UsbPdPortsResponse, CommandError> {
        let mut buf = [0u8; UsbPdPortsResponse::SIZE];
        let len = self.command(0, EC_CMD_USB_PD_PORTS, &[], &mut buf).await?;
        Ok(UsbPdPortsResponse::from_bytes(&buf[..len])?)
    }

    /// Fetch the raw USB PD control response of `port` at `version`, without changing anything.
    ///
    /// The raw bytes are copied into `response`, and their length is returned.
    pub async fn usb_pd_control(
        &mut self,
        port: u8,
        version: u8,
        response: &mut [u8; MAX_RESPONSE_SIZE],
    ) -> Result<usize, TransportError> {
        let mut request = [0u8; UsbPdControlParams::SIZE];
        UsbPdControlParams::query(port).to_bytes(&mut request);

        self.command(version, EC_CMD_USB_PD_CONTROL, &request, response).await
    }

    /// Query the discovery identity of the partner on `port`.
    pub async fn usb_pd_discovery(&mut self, port: u8) -> Result<UsbPdDiscoveryEntry, CommandError> {
        let mut request = [0u8; UsbPdInfoRequest::SIZE];
        UsbPdInfoRequest { port }.to_bytes(&mut request);

        let mut buf = [0u8; UsbPdDiscoveryEntry::SIZE];
        let len = self.command(0, EC_CMD_USB_PD_DISCOVERY, &request, &mut buf).await?;
        Ok(UsbPdDiscoveryEntry::from_bytes(&buf[..len])?)
    }
}
