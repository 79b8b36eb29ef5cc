//! Remote-entity delivery through a Home Assistant style platform.
//!
//! The payload is not sent to hardware directly; it is forwarded to a
//! pre-existing remote-control entity via the platform's generic
//! `remote.send_command` service.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::ir::output::{Result, Transmit, TransmitError};
use crate::ir::types::IrPacket;

pub struct HassRemote {
    http: Client,
    service_url: String,
    entity_id: String,
    token: String,
}

impl HassRemote {
    pub fn new(api_base: &str, entity_id: &str, token: &str) -> HassRemote {
        HassRemote {
            http: Client::new(),
            service_url: format!(
                "{}/api/services/remote/send_command",
                api_base.trim_end_matches('/')
            ),
            entity_id: entity_id.to_string(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl Transmit for HassRemote {
    async fn transmit(&mut self, packet: IrPacket) -> Result<()> {
        let command = format!("hex:{}", packet.as_hex());
        debug!("forwarding command to {}: {}", self.entity_id, command);
        let response = self
            .http
            .post(&self.service_url)
            .bearer_auth(&self.token)
            .json(&json!({ "entity_id": self.entity_id, "command": command }))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            warn!(
                "remote service answered {} for {}",
                response.status(),
                self.entity_id
            );
            Err(TransmitError::RemoteEntity(self.entity_id.clone()))
        }
    }
}
