use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::error::{OrchestraError, Result};
use crate::responder::ResponderConfig;

pub const DEFAULT_KEY_VALIDATION_DELAY_MS: u64 = 2000;
pub const DEFAULT_AGENT_PROVISIONING_DELAY_MS: u64 = 1000;
pub const DEFAULT_REPLY_DELAY_MS: u64 = 1500;
pub const DEFAULT_MAX_QUEUED_MESSAGES: usize = 32;

/// What `send` does while an assistant reply is still pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Hold the message and deliver it once the in-flight reply lands.
    #[default]
    Queue,
    /// Refuse the message with [`OrchestraError::Busy`].
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub key_validation_delay_ms: u64,
    pub agent_provisioning_delay_ms: u64,
    pub reply_delay_ms: u64,
    pub busy_policy: BusyPolicy,
    /// Sends held under `BusyPolicy::Queue`; further sends get `Busy`.
    pub max_queued_messages: usize,
    /// Keys lacking this prefix settle as invalid instead of active.
    pub required_key_prefix: Option<String>,
    /// Base64 of a 32-byte vault key. A fresh key is generated per console when unset.
    pub vault_key: Option<String>,
    pub seed_demo_data: bool,
    pub responder: ResponderConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            key_validation_delay_ms: DEFAULT_KEY_VALIDATION_DELAY_MS,
            agent_provisioning_delay_ms: DEFAULT_AGENT_PROVISIONING_DELAY_MS,
            reply_delay_ms: DEFAULT_REPLY_DELAY_MS,
            busy_policy: BusyPolicy::Queue,
            max_queued_messages: DEFAULT_MAX_QUEUED_MESSAGES,
            required_key_prefix: None,
            vault_key: None,
            seed_demo_data: false,
            responder: ResponderConfig::default(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ConsoleConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(prefix) = &self.required_key_prefix {
            if prefix.trim().is_empty() {
                return Err(OrchestraError::InvalidConfig(
                    "required_key_prefix must not be blank".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn key_validation_delay(&self) -> Duration {
        Duration::from_millis(self.key_validation_delay_ms)
    }

    pub fn agent_provisioning_delay(&self) -> Duration {
        Duration::from_millis(self.agent_provisioning_delay_ms)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}
