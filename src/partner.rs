//! Partner lifecycle management.
//!
//! A port is either detached (no partner) or attached (exactly one registered partner). The
//! EC's connection flag is the only attach signal.
use cros_ec_typec_traits::CommandChannel;

use crate::error::Error;
use crate::host_cmd::CommandLayer;
use crate::port::PortContext;
use crate::state::PortState;
use crate::typec::{PartnerDesc, PartnerIdentity, TypecClass};

/// Publish the roles and orientation of a port.
///
/// Roles that the state does not know about are left untouched.
pub fn publish_roles<TYPEC: TypecClass>(typec: &mut TYPEC, port: usize, state: &PortState) {
    typec.set_orientation(port, state.orientation);
    if let Some(role) = state.data_role {
        typec.set_data_role(port, role);
    }
    typec.set_power_role(port, state.power_role);
    if let Some(role) = state.vconn_role {
        typec.set_vconn_role(port, role);
    }
}

/// Apply a freshly decoded port state.
///
/// Roles are republished on every update. A partner is attached when the port became
/// connected, and detached when it became disconnected.
pub async fn apply<CHANNEL: CommandChannel, TYPEC: TypecClass>(
    commands: &mut CommandLayer<CHANNEL>,
    typec: &mut TYPEC,
    port: &mut PortContext<TYPEC::Partner>,
    state: &PortState,
) -> Result<(), Error> {
    publish_roles(typec, port.index(), state);

    match (state.connected, port.is_attached()) {
        (true, false) => attach(commands, typec, port, state.pd_capable.unwrap_or(false)).await,
        (false, true) => {
            detach(typec, port);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Register a partner, and query and publish its identity.
///
/// On failure, no partner is left registered.
async fn attach<CHANNEL: CommandChannel, TYPEC: TypecClass>(
    commands: &mut CommandLayer<CHANNEL>,
    typec: &mut TYPEC,
    port: &mut PortContext<TYPEC::Partner>,
    pd_capable: bool,
) -> Result<(), Error> {
    let index = port.index();

    let partner = match typec.register_partner(index, &PartnerDesc { usb_pd: pd_capable }) {
        Ok(partner) => partner,
        Err(_err) => {
            error!("Port {} partner register failed: {:?}", index, _err);
            return Err(Error::PartnerRegistrationFailure(index));
        }
    };

    let identity = match commands.usb_pd_discovery(index as u8).await {
        Ok(entry) => {
            debug!("Port {} partner type {:?}", index, entry.product_type());
            PartnerIdentity::new(entry.vid, entry.pid)
        }
        Err(_err) => {
            error!("Port {} PD query failed: {:?}", index, _err);
            if let Err(_err) = typec.unregister_partner(partner) {
                warn!("Port {} partner unregister failed: {:?}", index, _err);
            }
            return Err(Error::IdentityQueryFailure(index));
        }
    };

    if let Err(_err) = typec.set_partner_identity(&partner, &identity) {
        warn!("Port {} partner identity update failed: {:?}", index, _err);
    }

    info!(
        "Port {} partner attached (VID {:#x}, PID {:#x}, PD: {})",
        index,
        identity.vid(),
        identity.pid(),
        pd_capable
    );
    port.partner_identity = Some(identity);
    port.partner = Some(partner);
    Ok(())
}

/// Unregister the partner of a port.
///
/// The partner is dropped from the port, even if the port abstraction reports an error.
pub(crate) fn detach<TYPEC: TypecClass>(typec: &mut TYPEC, port: &mut PortContext<TYPEC::Partner>) {
    port.partner_identity = None;

    if let Some(partner) = port.partner.take() {
        if let Err(_err) = typec.unregister_partner(partner) {
            warn!("Port {} partner unregister failed: {:?}", port.index(), _err);
        }
        info!("Port {} partner detached", port.index());
    }
}
