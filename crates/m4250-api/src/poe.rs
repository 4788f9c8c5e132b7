// PoE configuration endpoints

use secrecy::SecretString;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::client::SwitchClient;
use crate::error::Error;
use crate::models::{PoeConfigEnvelope, PoeConfigTable, PoePortConfig, PortCollection};

impl SwitchClient {
    /// `GET swcfg_poe?portid=ALL`
    pub async fn poe_config(&self, token: &SecretString) -> Result<PoeConfigTable, Error> {
        let url = self.api_url("swcfg_poe?portid=ALL")?;
        let envelope: PoeConfigEnvelope = self.get(url, token).await?;
        PortCollection::new(envelope.poe_port_config)
    }

    /// Enable or disable PoE on the port described by `current`.
    ///
    /// `POST swcfg_poe?portid={id}` with the full object as read, `portid`
    /// stripped and `enable` overwritten.
    pub async fn set_poe_enabled(
        &self,
        token: &SecretString,
        current: &PoePortConfig,
        enabled: bool,
    ) -> Result<(), Error> {
        debug!(port = current.port_id, enabled, "setting PoE state");
        self.write_poe_port(token, current.port_id, current.with_enabled(enabled))
            .await
    }

    /// Power-cycle PoE on the port described by `current`.
    ///
    /// `POST swcfg_poe?portid={id}` with the object as read plus `reset: true`.
    pub async fn power_cycle_poe(
        &self,
        token: &SecretString,
        current: &PoePortConfig,
    ) -> Result<(), Error> {
        debug!(port = current.port_id, "power cycling PoE");
        self.write_poe_port(token, current.port_id, current.with_reset())
            .await
    }

    async fn write_poe_port(
        &self,
        token: &SecretString,
        port_id: u32,
        fields: Map<String, Value>,
    ) -> Result<(), Error> {
        let url = self.api_url(&format!("swcfg_poe?portid={port_id}"))?;
        self.post(url, token, &json!({ "poePortConfig": fields }))
            .await?;
        Ok(())
    }
}
