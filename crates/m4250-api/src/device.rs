// Device-level endpoints
//
// Health summary, device name (cheap liveness probe), and reboot.

use secrecy::SecretString;
use serde_json::json;
use tracing::debug;

use crate::client::SwitchClient;
use crate::error::Error;
use crate::models::{DeviceInfoEnvelope, DeviceNameEnvelope, DeviceStatus};

/// Delay the switch waits before rebooting.
pub const REBOOT_DELAY_SECS: u64 = 2;

impl SwitchClient {
    /// `GET device_info`
    pub async fn device_info(&self, token: &SecretString) -> Result<DeviceStatus, Error> {
        let url = self.api_url("device_info")?;
        let envelope: DeviceInfoEnvelope = self.get(url, token).await?;
        Ok(envelope.device_info)
    }

    /// `GET device_name`
    ///
    /// The cheapest authenticated call the switch offers, which makes it
    /// the token liveness probe.
    pub async fn device_name(&self, token: &SecretString) -> Result<String, Error> {
        let url = self.api_url("device_name")?;
        let envelope: DeviceNameEnvelope = self.get(url, token).await?;
        Ok(envelope.device_name.name)
    }

    /// Reboot the switch after [`REBOOT_DELAY_SECS`].
    ///
    /// `POST device_reboot` with `{"deviceReboot": {"afterSecs": 2}}`
    pub async fn reboot(&self, token: &SecretString) -> Result<(), Error> {
        let url = self.api_url("device_reboot")?;
        debug!(after_secs = REBOOT_DELAY_SECS, "rebooting switch");
        let body = json!({ "deviceReboot": { "afterSecs": REBOOT_DELAY_SECS } });
        self.post(url, token, &body).await?;
        Ok(())
    }
}
