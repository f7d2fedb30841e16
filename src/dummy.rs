//! Implements a dummy EC and a dummy Type-C port abstraction for testing.
//!
//! Both dummies share their state between clones, so that a test can keep a handle for
//! inspection after moving the other one into the engine.
use std::cell::RefCell;
use std::rc::Rc;

use cros_ec_typec_traits::{CommandChannel, TransportError};

use crate::host_cmd::response::PD_STATE_NAME_SIZE;
use crate::host_cmd::{
    EC_CMD_GET_CMD_VERSIONS, EC_CMD_USB_PD_CONTROL, EC_CMD_USB_PD_DISCOVERY, EC_CMD_USB_PD_PORTS,
};
use crate::typec::{PartnerDesc, PartnerIdentity, PortCapability, TypecClass, TypecError};
use crate::{DataRole, Orientation, PowerRole};

/// Command bits that are left after removing a passthru offset.
const COMMAND_MASK: u16 = 0x3fff;

/// The EC status for an invalid parameter.
pub const EC_RES_INVALID_PARAM: u32 = 3;

/// The status of a dummy port, rendered into a control response at the requested version.
#[derive(Debug, Clone, Copy)]
pub struct DummyPort {
    pub connected: bool,
    pub pd_capable: bool,
    pub power: PowerRole,
    pub data_host: bool,
    pub vconn_source: bool,
    pub flipped: bool,
}

impl Default for DummyPort {
    fn default() -> Self {
        Self {
            connected: false,
            pd_capable: false,
            power: PowerRole::Sink,
            data_host: false,
            vconn_source: false,
            flipped: false,
        }
    }
}

impl DummyPort {
    /// A port with a PD capable partner, sourcing power, as data host, flipped.
    pub fn pd_partner() -> Self {
        Self {
            connected: true,
            pd_capable: true,
            power: PowerRole::Source,
            data_host: true,
            vconn_source: false,
            flipped: true,
        }
    }

    fn render(&self, version: u8, buf: &mut Vec<u8>) {
        let power = bool::from(self.power);
        if version == 0 {
            buf.extend_from_slice(&[self.connected as u8, power as u8, self.flipped as u8, 0x42]);
        } else {
            let enabled = 1 | (self.connected as u8) << 1 | (self.pd_capable as u8) << 2;
            let role = power as u8 | (self.data_host as u8) << 1 | (self.vconn_source as u8) << 2;
            buf.extend_from_slice(&[enabled, role, self.flipped as u8]);

            let mut name = [0u8; PD_STATE_NAME_SIZE];
            let text: &[u8] = if self.connected { b"SNK_READY" } else { b"SNK_DISCONNECTED" };
            name[..text.len()].copy_from_slice(text);
            buf.extend_from_slice(&name);
        }
    }
}

#[derive(Default)]
struct EcState {
    num_ports: u8,
    version_mask: u32,
    ports: Vec<DummyPort>,
    raw_control: Vec<Option<Vec<u8>>>,
    discovery: Vec<Vec<u8>>,
    failures: Vec<(u16, TransportError)>,
    port_failures: Vec<(u8, TransportError)>,
    versions_v1_failure: Option<TransportError>,
    versions_v0_failure: Option<TransportError>,
    commands: Vec<u16>,
    requests: Vec<Vec<u8>>,
}

impl EcState {
    fn respond(&self, version: u8, command: u16, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        if let Some((_, err)) = self.failures.iter().find(|(cmd, _)| *cmd == command) {
            return Err(*err);
        }

        let mut buf = Vec::new();
        match command {
            EC_CMD_GET_CMD_VERSIONS => {
                let failure = match version {
                    0 => self.versions_v0_failure,
                    _ => self.versions_v1_failure,
                };
                if let Some(err) = failure {
                    return Err(err);
                }
                buf.extend_from_slice(&self.version_mask.to_le_bytes());
            }
            EC_CMD_USB_PD_PORTS => buf.push(self.num_ports),
            EC_CMD_USB_PD_CONTROL => {
                let port = self.port(request)?;
                if let Some((_, err)) = self.port_failures.iter().find(|(p, _)| *p as usize == port) {
                    return Err(*err);
                }
                match &self.raw_control[port] {
                    Some(raw) => buf.extend_from_slice(raw),
                    None => self.ports[port].render(version, &mut buf),
                }
            }
            EC_CMD_USB_PD_DISCOVERY => {
                let port = self.port(request)?;
                buf.extend_from_slice(&self.discovery[port]);
            }
            _ => return Err(TransportError::Status(1)),
        }

        Ok(buf)
    }

    fn port(&self, request: &[u8]) -> Result<usize, TransportError> {
        match request.first() {
            Some(&port) if port < self.num_ports => Ok(port as usize),
            _ => Err(TransportError::Status(EC_RES_INVALID_PARAM)),
        }
    }
}

/// A dummy EC, that answers the host commands used for Type-C port synchronization.
///
/// Every port starts out disconnected, and reports a default discovery identity.
#[derive(Clone)]
pub struct DummyEc {
    state: Rc<RefCell<EcState>>,
}

impl DummyEc {
    /// The default partner vendor ID.
    pub const VID: u16 = 0x18d1;
    /// The default partner product ID.
    pub const PID: u16 = 0x5022;

    /// Create a new dummy EC with `num_ports` ports, supporting the control versions in `version_mask`.
    pub fn new(num_ports: u8, version_mask: u32) -> Self {
        let mut discovery = Vec::new();
        discovery.extend_from_slice(&Self::VID.to_le_bytes());
        discovery.extend_from_slice(&Self::PID.to_le_bytes());
        discovery.push(2);

        let count = num_ports as usize;
        let state = EcState {
            num_ports,
            version_mask,
            ports: vec![DummyPort::default(); count],
            raw_control: vec![None; count],
            discovery: vec![discovery; count],
            ..Default::default()
        };

        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Set the status of `port`.
    pub fn set_port(&self, port: usize, status: DummyPort) {
        self.state.borrow_mut().ports[port] = status;
    }

    /// Connect a PD capable partner to `port`.
    pub fn connect(&self, port: usize) {
        self.set_port(port, DummyPort::pd_partner());
    }

    /// Disconnect the partner of `port`.
    pub fn disconnect(&self, port: usize) {
        self.set_port(port, DummyPort::default());
    }

    /// Answer control requests for `port` with raw bytes, regardless of the version.
    pub fn set_control_response(&self, port: usize, raw: &[u8]) {
        self.state.borrow_mut().raw_control[port] = Some(raw.to_vec());
    }

    /// Set the discovery identity of the partner on `port`.
    pub fn set_discovery(&self, port: usize, vid: u16, pid: u16, ptype: u8) {
        let mut raw = Vec::new();
        raw.extend_from_slice(&vid.to_le_bytes());
        raw.extend_from_slice(&pid.to_le_bytes());
        raw.push(ptype);
        self.set_discovery_response(port, &raw);
    }

    /// Answer discovery requests for `port` with raw bytes.
    pub fn set_discovery_response(&self, port: usize, raw: &[u8]) {
        self.state.borrow_mut().discovery[port] = raw.to_vec();
    }

    /// Fail every exchange of `command`.
    pub fn fail_command(&self, command: u16, err: TransportError) {
        self.state.borrow_mut().failures.push((command, err));
    }

    /// Fail control requests for `port`.
    pub fn fail_port(&self, port: u8, err: TransportError) {
        self.state.borrow_mut().port_failures.push((port, err));
    }

    /// Stop failing any exchange.
    pub fn clear_failures(&self) {
        let mut state = self.state.borrow_mut();
        state.failures.clear();
        state.port_failures.clear();
    }

    /// Fail version queries with the newer (v1) request encoding.
    pub fn fail_versions_v1(&self, err: TransportError) {
        self.state.borrow_mut().versions_v1_failure = Some(err);
    }

    /// Fail version queries with the legacy (v0) request encoding.
    pub fn fail_versions_v0(&self, err: TransportError) {
        self.state.borrow_mut().versions_v0_failure = Some(err);
    }

    /// All commands exchanged so far, as they went out on the channel.
    pub fn commands(&self) -> Vec<u16> {
        self.state.borrow().commands.clone()
    }

    /// Count the exchanges of `command`.
    pub fn count(&self, command: u16) -> usize {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|&&cmd| cmd & COMMAND_MASK == command)
            .count()
    }

    /// The request parameters of the last exchange.
    pub fn last_request(&self) -> Vec<u8> {
        self.state.borrow().requests.last().cloned().unwrap_or_default()
    }
}

impl CommandChannel for DummyEc {
    async fn execute(
        &mut self,
        version: u8,
        command: u16,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, TransportError> {
        // Give other tasks a chance to run, like a real transport would.
        embassy_futures::yield_now().await;

        let mut state = self.state.borrow_mut();
        state.commands.push(command);
        state.requests.push(request.to_vec());

        let data = state.respond(version, command & COMMAND_MASK, request)?;
        if data.len() > response.len() {
            return Err(TransportError::Overflow);
        }

        response[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}

/// A call into the dummy port abstraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypecCall {
    RegisterPort(usize),
    UnregisterPort(usize),
    SetPowerRole(usize, PowerRole),
    SetDataRole(usize, DataRole),
    SetVconnRole(usize, PowerRole),
    SetOrientation(usize, Orientation),
    RegisterPartner(usize, PartnerDesc),
    UnregisterPartner(usize),
    SetIdentity(usize, PartnerIdentity),
}

/// Handle of a partner that was registered with the dummy port abstraction.
#[derive(Debug, PartialEq, Eq)]
pub struct DummyPartner {
    pub port: usize,
}

#[derive(Default)]
struct TypecState {
    calls: Vec<TypecCall>,
    ports: Vec<usize>,
    reject_port: Option<usize>,
    reject_partners: bool,
    unregister_failure: Option<TypecError>,
    identity_failure: Option<TypecError>,
}

/// A dummy Type-C port abstraction, that records all calls.
#[derive(Clone, Default)]
pub struct DummyTypec {
    state: Rc<RefCell<TypecState>>,
}

impl DummyTypec {
    /// Create a new dummy port abstraction, that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the registration of `port`.
    pub fn reject_port(&self, port: usize) {
        self.state.borrow_mut().reject_port = Some(port);
    }

    /// Reject partner registrations.
    pub fn reject_partners(&self, reject: bool) {
        self.state.borrow_mut().reject_partners = reject;
    }

    /// Fail partner unregistrations, after dropping the partner.
    pub fn fail_unregister(&self, err: Option<TypecError>) {
        self.state.borrow_mut().unregister_failure = err;
    }

    /// Fail identity updates.
    pub fn fail_identity(&self, err: Option<TypecError>) {
        self.state.borrow_mut().identity_failure = err;
    }

    /// All calls so far.
    pub fn calls(&self) -> Vec<TypecCall> {
        self.state.borrow().calls.clone()
    }

    /// Count the calls that match `f`.
    pub fn count(&self, f: impl Fn(&TypecCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|call| f(call)).count()
    }

    /// The ports that are currently registered.
    pub fn registered_ports(&self) -> Vec<usize> {
        self.state.borrow().ports.clone()
    }

    pub fn partners_registered(&self) -> usize {
        self.count(|call| matches!(call, TypecCall::RegisterPartner(..)))
    }

    pub fn partners_unregistered(&self) -> usize {
        self.count(|call| matches!(call, TypecCall::UnregisterPartner(..)))
    }

    /// The number of partners that are currently registered.
    pub fn live_partners(&self) -> usize {
        self.partners_registered() - self.partners_unregistered()
    }

    /// The most recently published partner identity.
    pub fn last_identity(&self) -> Option<PartnerIdentity> {
        self.state.borrow().calls.iter().rev().find_map(|call| match call {
            TypecCall::SetIdentity(_, identity) => Some(*identity),
            _ => None,
        })
    }

    fn record(&self, call: TypecCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl TypecClass for DummyTypec {
    type Partner = DummyPartner;

    fn register_port(&mut self, port: usize, _capability: &PortCapability) -> Result<(), TypecError> {
        let mut state = self.state.borrow_mut();
        if state.reject_port == Some(port) {
            return Err(TypecError::NoMemory);
        }

        state.calls.push(TypecCall::RegisterPort(port));
        state.ports.push(port);
        Ok(())
    }

    fn unregister_port(&mut self, port: usize) {
        let mut state = self.state.borrow_mut();
        state.calls.push(TypecCall::UnregisterPort(port));
        state.ports.retain(|&p| p != port);
    }

    fn set_power_role(&mut self, port: usize, role: PowerRole) {
        self.record(TypecCall::SetPowerRole(port, role));
    }

    fn set_data_role(&mut self, port: usize, role: DataRole) {
        self.record(TypecCall::SetDataRole(port, role));
    }

    fn set_vconn_role(&mut self, port: usize, role: PowerRole) {
        self.record(TypecCall::SetVconnRole(port, role));
    }

    fn set_orientation(&mut self, port: usize, orientation: Orientation) {
        self.record(TypecCall::SetOrientation(port, orientation));
    }

    fn register_partner(&mut self, port: usize, desc: &PartnerDesc) -> Result<DummyPartner, TypecError> {
        if self.state.borrow().reject_partners {
            return Err(TypecError::NoMemory);
        }

        self.record(TypecCall::RegisterPartner(port, *desc));
        Ok(DummyPartner { port })
    }

    fn unregister_partner(&mut self, partner: DummyPartner) -> Result<(), TypecError> {
        self.record(TypecCall::UnregisterPartner(partner.port));

        match self.state.borrow().unregister_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn set_partner_identity(&mut self, partner: &DummyPartner, identity: &PartnerIdentity) -> Result<(), TypecError> {
        if let Some(err) = self.state.borrow().identity_failure {
            return Err(err);
        }

        self.record(TypecCall::SetIdentity(partner.port, *identity));
        Ok(())
    }
}
