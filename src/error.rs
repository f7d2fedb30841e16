//! Errors of the port synchronization engine.
use cros_ec_typec_traits::TransportError;

use crate::host_cmd::{CommandError, ParseError};

/// Errors that can occur while synchronizing ports with the EC.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A host command exchange failed or timed out.
    #[error("host command transport failed: {0:?}")]
    TransportFailure(TransportError),
    /// The EC answered with a malformed response.
    #[error("malformed host command response: {0}")]
    MalformedResponse(ParseError),
    /// The EC reported more ports than the platform supports.
    #[error("EC reported too many ports (got {count}, max {max})")]
    TooManyPorts {
        /// The number of ports reported by the EC.
        count: usize,
        /// The maximum number of supported ports.
        max: usize,
    },
    /// The supported command versions could not be queried with either request encoding.
    #[error("failed to get supported PD command versions")]
    VersionQueryFailure,
    /// The port abstraction rejected the registration of a port.
    #[error("port {0} registration failed")]
    PortRegistrationFailure(usize),
    /// The port abstraction rejected the registration of a partner.
    #[error("port {0} partner registration failed")]
    PartnerRegistrationFailure(usize),
    /// The partner identity could not be queried after attaching.
    #[error("port {0} PD identity query failed")]
    IdentityQueryFailure(usize),
    /// A port index outside of the discovered ports was used.
    #[error("invalid port {0}")]
    PortIndexInvalid(usize),
}

impl From<TransportError> for Error {
    fn from(value: TransportError) -> Self {
        Error::TransportFailure(value)
    }
}

impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Error::MalformedResponse(value)
    }
}

impl From<CommandError> for Error {
    fn from(value: CommandError) -> Self {
        match value {
            CommandError::Transport(err) => err.into(),
            CommandError::Parse(err) => err.into(),
        }
    }
}
