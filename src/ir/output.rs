pub mod blaster;
pub mod hass;

use async_trait::async_trait;
use thiserror::Error;

use crate::ir::types::IrPacket;

#[derive(Error, Debug)]
pub enum TransmitError {
    #[error("Could not reach the transmitter")]
    Connection(#[from] std::io::Error),
    #[error("Transmitter refused authentication")]
    AuthRejected,
    #[error("Transmitter rejected the payload")]
    Rejected,
    #[error("Timed out waiting for the transmitter")]
    Timeout,
    #[error("Remote service call failed")]
    Remote(#[from] reqwest::Error),
    #[error("Remote entity {0} did not accept the command")]
    RemoteEntity(String),
}

pub type Result<T> = std::result::Result<T, TransmitError>;

/// Local delivery of an encapsulated infrared payload.
///
/// Implementations confirm hand-off to the transmitter only. The AC itself
/// never replies, so a success here means "asserted", not "applied".
#[async_trait]
pub trait Transmit: Send {
    async fn transmit(&mut self, packet: IrPacket) -> Result<()>;
}

#[async_trait]
impl<T: Transmit + ?Sized> Transmit for Box<T> {
    async fn transmit(&mut self, packet: IrPacket) -> Result<()> {
        (**self).transmit(packet).await
    }
}
