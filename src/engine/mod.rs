//! The port synchronization engine.
//!
//! At startup, the engine discovers the EC's ports, resolves the control version that ports are
//! updated with, and registers every port with the port abstraction. Every event then triggers a
//! sweep over all ports, which fetches each port's state from the EC and applies it.
//!
//! All port state sits behind one lock. A sweep holds it for its whole duration, so concurrent
//! events are handled one after the other.
use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;

use crate::error::Error;
use crate::host_cmd::{CommandLayer, EC_USB_PD_MAX_PORTS, MAX_RESPONSE_SIZE};
use crate::notify::{Notification, Subscription, UsbPdNotifier};
use crate::port::{self, PortContext, PortSnapshot, Ports};
use crate::typec::{PortCapability, RoleSwitch, TypecClass};
use crate::version::ControlVersion;
use crate::{CommandChannel, partner, state};


/// Configuration of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// The maximum number of ports that the platform supports.
    ///
    /// Bounded by `EC_USB_PD_MAX_PORTS`.
    pub max_ports: usize,
    /// Offset that is added to every host command, for ECs that are reached through a passthru.
    pub command_offset: u16,
    /// The capabilities that every port is registered with.
    pub capability: PortCapability,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_ports: EC_USB_PD_MAX_PORTS,
            command_offset: 0,
            capability: PortCapability::default(),
        }
    }
}

struct Inner<CHANNEL: CommandChannel, TYPEC: TypecClass> {
    commands: CommandLayer<CHANNEL>,
    typec: TYPEC,
    ports: Ports<TYPEC::Partner>,
}

impl<CHANNEL: CommandChannel, TYPEC: TypecClass> Inner<CHANNEL, TYPEC> {
    /// Register all ports, or none of them.
    fn register_ports(&mut self, capability: &PortCapability) -> Result<(), Error> {
        for index in 0..self.ports.len() {
            if let Err(_err) = self.typec.register_port(index, capability) {
                error!("Failed to register port {}: {:?}", index, _err);

                for registered in (0..index).rev() {
                    self.typec.unregister_port(registered);
                }
                return Err(Error::PortRegistrationFailure(index));
            }
        }

        Ok(())
    }

    async fn update_port(&mut self, index: usize) -> Result<(), Error> {
        let port = self.ports.get_mut(index).ok_or(Error::PortIndexInvalid(index))?;
        let version = port.protocol_version();

        let mut raw = [0u8; MAX_RESPONSE_SIZE];
        let len = self
            .commands
            .usb_pd_control(index as u8, version.into(), &mut raw)
            .await?;
        let state = state::decode(version, &raw[..len])?;

        partner::apply(&mut self.commands, &mut self.typec, port, &state).await
    }

    async fn sweep(&mut self) {
        for index in 0..self.ports.len() {
            if let Err(_err) = self.update_port(index).await {
                error!("Update failed for port {}: {:?}", index, _err);
            }
        }
    }

    fn teardown(&mut self) {
        for port in self.ports.iter_mut() {
            partner::detach(&mut self.typec, port);
        }

        for index in 0..self.ports.len() {
            self.typec.unregister_port(index);
        }
    }
}

/// Keeps the port abstraction in sync with the ports of a ChromeOS EC.
pub struct CrosEcTypec<M: RawMutex, CHANNEL: CommandChannel, TYPEC: TypecClass> {
    inner: Mutex<M, Inner<CHANNEL, TYPEC>>,
    control_version: ControlVersion,
    num_ports: usize,
}

impl<M: RawMutex, CHANNEL: CommandChannel, TYPEC: TypecClass> CrosEcTypec<M, CHANNEL, TYPEC> {
    /// Create an engine, and bring all ports in sync with the EC.
    ///
    /// Fails if the ports or the control version cannot be discovered, or if the port
    /// abstraction rejects a port. Failures of individual ports during the initial sweep are only
    /// logged.
    pub async fn new(channel: CHANNEL, typec: TYPEC, config: Config) -> Result<Self, Error> {
        let mut commands = CommandLayer::new(channel, config.command_offset);

        let (control_version, ports) = port::discover_ports(&mut commands, config.max_ports).await?;
        let num_ports = ports.len();

        let mut inner = Inner { commands, typec, ports };
        inner.register_ports(&config.capability)?;
        inner.sweep().await;

        info!("Managing {} ports", num_ports);
        Ok(Self {
            inner: Mutex::new(inner),
            control_version,
            num_ports,
        })
    }

    /// The control version that ports are updated with.
    pub fn control_version(&self) -> ControlVersion {
        self.control_version
    }

    /// The number of ports.
    pub fn num_ports(&self) -> usize {
        self.num_ports
    }

    /// A copy of the state of port `index`.
    pub async fn port(&self, index: usize) -> Option<PortSnapshot> {
        let inner = self.inner.lock().await;
        inner.ports.get(index).map(PortContext::snapshot)
    }

    /// Copies of the state of all ports, in index order.
    pub async fn ports(&self) -> heapless::Vec<PortSnapshot, EC_USB_PD_MAX_PORTS> {
        let inner = self.inner.lock().await;
        inner.ports.iter().map(PortContext::snapshot).collect()
    }

    /// Handle a USB PD event, by updating all ports.
    pub async fn on_event(&self) {
        trace!("Updating {} ports", self.num_ports);
        let mut inner = self.inner.lock().await;
        inner.sweep().await;
    }

    /// Handle a notification from the notifier, with one sweep per event that it stands for.
    ///
    /// Events that the notifier dropped are still swept for. Returns the number of sweeps.
    pub async fn on_notification(&self, notification: Notification) -> u64 {
        match notification {
            Notification::Event(_event) => trace!("Handling event {:#x}", _event),
            Notification::Missed(_count) => warn!("Missed {} events", _count),
        }

        let events = notification.events();
        for _ in 0..events {
            self.on_event().await;
        }

        events
    }

    /// Update port `index` only.
    pub async fn update_port(&self, index: usize) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;
        inner.update_port(index).await
    }

    /// Unregister all partners and ports, and release the channel and the port abstraction.
    pub fn shutdown(self) -> (CHANNEL, TYPEC) {
        let mut inner = self.inner.into_inner();
        inner.teardown();

        (inner.commands.into_channel(), inner.typec)
    }
}

/// Role changes are not forwarded to the EC. Every request is accepted as is.
impl<M: RawMutex, CHANNEL: CommandChannel, TYPEC: TypecClass> RoleSwitch for CrosEcTypec<M, CHANNEL, TYPEC> {}

/// A running engine, subscribed to a notifier.
pub struct EngineHandle<'n, M: RawMutex, CHANNEL: CommandChannel, TYPEC: TypecClass, const CAP: usize, const SUBS: usize>
{
    engine: CrosEcTypec<M, CHANNEL, TYPEC>,
    subscription: Option<Subscription<'n, M, CAP, SUBS>>,
}

/// Create an engine, and subscribe it to `notifier`.
///
/// If the notifier has no free subscriber slot, the engine still starts, but is only updated
/// through [`CrosEcTypec::on_event`].
pub async fn start<'n, M: RawMutex, CHANNEL: CommandChannel, TYPEC: TypecClass, const CAP: usize, const SUBS: usize>(
    channel: CHANNEL,
    typec: TYPEC,
    config: Config,
    notifier: &'n UsbPdNotifier<M, CAP, SUBS>,
) -> Result<EngineHandle<'n, M, CHANNEL, TYPEC, CAP, SUBS>, Error> {
    let engine = CrosEcTypec::new(channel, typec, config).await?;

    let subscription = match notifier.register() {
        Ok(subscription) => Some(subscription),
        Err(_err) => {
            warn!("Failed to register notifier: {:?}", _err);
            None
        }
    };

    Ok(EngineHandle { engine, subscription })
}

impl<'n, M: RawMutex, CHANNEL: CommandChannel, TYPEC: TypecClass, const CAP: usize, const SUBS: usize>
    EngineHandle<'n, M, CHANNEL, TYPEC, CAP, SUBS>
{
    /// The engine.
    pub fn engine(&self) -> &CrosEcTypec<M, CHANNEL, TYPEC> {
        &self.engine
    }

    /// Whether the engine receives events from the notifier.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Handle all pending notifications.
    ///
    /// Returns the number of handled events, including the ones that the notifier dropped.
    pub async fn process_pending(&mut self) -> u64 {
        let mut handled = 0;
        while let Some(notification) = self.subscription.as_mut().and_then(|s| s.try_next()) {
            handled += self.engine.on_notification(notification).await;
        }

        handled
    }

    /// Handle notifications as they arrive, until `stop` is signaled.
    pub async fn listen(&mut self, stop: &Signal<M, ()>) {
        let Some(subscription) = self.subscription.as_mut() else {
            stop.wait().await;
            return;
        };

        loop {
            match select(stop.wait(), subscription.next()).await {
                Either::First(()) => return,
                Either::Second(notification) => {
                    self.engine.on_notification(notification).await;
                }
            }
        }
    }

    /// Unsubscribe from the notifier, and shut the engine down.
    pub fn stop(self) -> (CHANNEL, TYPEC) {
        let Self { engine, subscription } = self;
        drop(subscription);

        engine.shutdown()
    }
}
