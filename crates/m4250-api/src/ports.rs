// Port statistics endpoint

use secrecy::SecretString;

use crate::client::SwitchClient;
use crate::error::Error;
use crate::models::{PortCollection, PortStatsEnvelope, PortStatsTable};

impl SwitchClient {
    /// `GET sw_portstats?portid=ALL`
    pub async fn port_stats(&self, token: &SecretString) -> Result<PortStatsTable, Error> {
        let url = self.api_url("sw_portstats?portid=ALL")?;
        let envelope: PortStatsEnvelope = self.get(url, token).await?;
        PortCollection::new(envelope.switch_stats_port)
    }
}
