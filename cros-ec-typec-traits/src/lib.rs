//! ChromeOS EC Type-C traits.
//!
//! Provides the command channel trait, through which the port synchronization engine
//! talks to an embedded controller over an arbitrary bus.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
use core::future::Future;

/// Transport Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The EC did not answer within the transport's timeout.
    Timeout,

    /// The EC answered with a non-success result code.
    Status(u32),

    /// The response did not fit into the provided buffer.
    Overflow,

    /// The bus transfer itself failed.
    Bus,
}

/// Command channel trait, through which host commands are exchanged with the EC.
pub trait CommandChannel {
    /// Execute a host command and wait for its response.
    ///
    /// `version` selects the request/response layout of `command`. The response payload
    /// is copied into `response`, and its length is returned.
    fn execute(
        &mut self,
        version: u8,
        command: u16,
        request: &[u8],
        response: &mut [u8],
    ) -> impl Future<Output = Result<usize, TransportError>>;
}
