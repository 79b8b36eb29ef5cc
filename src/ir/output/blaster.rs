//! Direct client for a network-attached IR blaster.
//!
//! The bridge speaks a small datagram protocol: a four byte header
//! `[command, 0x00, length lo, length hi]` followed by the body, answered
//! with `[command, status]`. Authentication happens once at setup; after
//! that every payload is shipped as a send-data command and acknowledged
//! locally. The bridge never knows whether the AC acted on it.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::ir::output::{Result, Transmit, TransmitError};
use crate::ir::types::IrPacket;

const AUTH_COMMAND: u8 = 0x65;
const SEND_COMMAND: u8 = 0x6a;
const STATUS_OK: u8 = 0x00;
const REPLY_TIMEOUT: Duration = Duration::from_secs(3);

pub struct Blaster {
    socket: UdpSocket,
    addr: SocketAddr,
}

impl Blaster {
    /// Connects to the bridge and runs the one-time authentication
    /// exchange.
    pub async fn connect(addr: SocketAddr) -> Result<Blaster> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(addr).await?;
        let blaster = Blaster { socket, addr };
        blaster.exchange(AUTH_COMMAND, &[]).await.map_err(|e| match e {
            TransmitError::Rejected => TransmitError::AuthRejected,
            other => other,
        })?;
        debug!("authenticated with blaster at {}", addr);
        Ok(blaster)
    }

    async fn exchange(&self, command: u8, body: &[u8]) -> Result<()> {
        let mut datagram = Vec::with_capacity(4 + body.len());
        datagram.push(command);
        datagram.push(0x00);
        datagram.push(body.len() as u8);
        datagram.push((body.len() >> 8) as u8);
        datagram.extend_from_slice(body);
        self.socket.send(&datagram).await?;

        let mut reply = [0u8; 16];
        let received = timeout(REPLY_TIMEOUT, self.socket.recv(&mut reply))
            .await
            .map_err(|_| TransmitError::Timeout)??;
        if received >= 2 && reply[0] == command && reply[1] == STATUS_OK {
            Ok(())
        } else {
            Err(TransmitError::Rejected)
        }
    }
}

#[async_trait]
impl Transmit for Blaster {
    async fn transmit(&mut self, packet: IrPacket) -> Result<()> {
        trace!("sending {} byte payload to {}", packet.len(), self.addr);
        self.exchange(SEND_COMMAND, packet.as_ref()).await
    }
}
