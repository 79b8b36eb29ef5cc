use std::net::SocketAddr;

use crate::climate::{Climate, ClimateHandle, Result};
use crate::ir::output::blaster::Blaster;
use crate::ir::output::hass::HassRemote;
use crate::ir::output::Transmit;

/// Delivery path for one device instance, fixed at setup time.
#[derive(Clone, Debug)]
pub enum TransmitTarget {
    /// A directly addressed network IR blaster.
    Blaster(SocketAddr),
    /// A remote-control entity owned by the home automation platform.
    Remote {
        api_base: String,
        entity_id: String,
        token: String,
    },
}

impl TransmitTarget {
    /// Builds the matching transmitter, running any one-time handshake.
    pub async fn connect(&self) -> Result<Box<dyn Transmit>> {
        match self {
            TransmitTarget::Blaster(addr) => Ok(Box::new(Blaster::connect(*addr).await?)),
            TransmitTarget::Remote {
                api_base,
                entity_id,
                token,
            } => Ok(Box::new(HassRemote::new(api_base, entity_id, token))),
        }
    }
}

/// Everything configured per device instance. No other state persists.
#[derive(Clone, Debug)]
pub struct ClimateConfig {
    pub name: String,
    pub target: TransmitTarget,
    pub swing_capable: bool,
}

impl ClimateConfig {
    /// Connects the transmitter and starts the device task.
    pub async fn start(self) -> Result<ClimateHandle> {
        let out = self.target.connect().await?;
        Ok(Climate::new(self.name, self.swing_capable, out).spawn())
    }
}
