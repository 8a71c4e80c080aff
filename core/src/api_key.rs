use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use crate::{
    draft,
    error::{OrchestraError, Result},
    status::StatusTone,
    store::Record,
    vault::{SealedSecret, SecretVault},
};

pub const MASK_HEAD: usize = 8;
pub const MASK_TAIL: usize = 4;
pub const MIN_SECRET_LEN: usize = MASK_HEAD + MASK_TAIL;
pub const MAX_SECRET_LEN: usize = 256;

/// `first 8 chars + "..." + last 4 chars`. Secrets too short to hide
/// anything come back fully starred.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < MIN_SECRET_LEN {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..MASK_HEAD].iter().collect();
    let tail: String = chars[chars.len() - MASK_TAIL..].iter().collect();
    format!("{}...{}", head, tail)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Pending,
    Active,
    Invalid,
}

impl KeyStatus {
    pub fn tone(&self) -> StatusTone {
        match self {
            KeyStatus::Pending => StatusTone::Warning,
            KeyStatus::Active => StatusTone::Success,
            KeyStatus::Invalid => StatusTone::Destructive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Pending => "pending",
            KeyStatus::Active => "active",
            KeyStatus::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of the "add key" form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewApiKey {
    pub name: String,
    pub key: String,
}

impl NewApiKey {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        draft::check_name(&self.name, "key")?;
        let len = self.key.chars().count();
        if len < MIN_SECRET_LEN {
            return Err(OrchestraError::validation(format!(
                "API key must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        if len > MAX_SECRET_LEN {
            return Err(OrchestraError::validation(format!(
                "API key exceeds {} characters",
                MAX_SECRET_LEN
            )));
        }
        if self.key.chars().any(char::is_whitespace) {
            return Err(OrchestraError::validation("API key must not contain whitespace"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    pub id: String,
    pub name: String,
    pub sealed: SealedSecret,
    /// Masked form computed at insertion, so listing never has to unseal.
    pub preview: String,
    pub status: KeyStatus,
    pub last_used: Option<DateTime<Utc>>,
    pub usage: u64,
    pub created_at: DateTime<Utc>,
}

impl ApiKeyRecord {
    pub fn new(new_key: &NewApiKey, vault: &SecretVault) -> Result<Self> {
        new_key.validate()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: new_key.name.trim().to_string(),
            sealed: vault.seal(&new_key.key)?,
            preview: mask(&new_key.key),
            status: KeyStatus::Pending,
            last_used: None,
            usage: 0,
            created_at: Utc::now(),
        })
    }

    /// Counts one request against the key. Only active keys can be used.
    pub fn record_usage(&mut self) -> Result<()> {
        if self.status != KeyStatus::Active {
            return Err(OrchestraError::validation(format!(
                "API key {} is {}, not active",
                self.id, self.status
            )));
        }
        self.usage = self.usage.saturating_add(1);
        self.last_used = Some(Utc::now());
        Ok(())
    }

    pub fn view(&self, vault: &SecretVault, revealed: bool) -> Result<KeyView> {
        let display = if revealed {
            vault.unseal(&self.sealed)?
        } else {
            self.preview.clone()
        };
        Ok(KeyView {
            id: self.id.clone(),
            name: self.name.clone(),
            display,
            revealed,
            status: self.status,
            tone: self.status.tone(),
            last_used: self.last_used,
            usage: self.usage,
        })
    }
}

/// Editable fields of a stored key. Status is owned by validation and
/// the secret is immutable; replace the key to rotate it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeyPatch {
    pub name: Option<String>,
}

impl ApiKeyPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()) }
    }
}

impl Record for ApiKeyRecord {
    type Patch = ApiKeyPatch;
    const KIND: &'static str = "api key";

    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, patch: ApiKeyPatch) -> Result<()> {
        if let Some(name) = patch.name {
            draft::check_name(&name, "key")?;
            self.name = name.trim().to_string();
        }
        Ok(())
    }
}

/// What the key manager screen renders for one key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyView {
    pub id: String,
    pub name: String,
    /// Plain secret when revealed, masked preview otherwise.
    pub display: String,
    pub revealed: bool,
    pub status: KeyStatus,
    pub tone: StatusTone,
    pub last_used: Option<DateTime<Utc>>,
    pub usage: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyStats {
    pub total_requests: u64,
    pub active_keys: usize,
    pub used_keys: usize,
}

impl KeyStats {
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a ApiKeyRecord>) -> Self {
        keys.into_iter().fold(KeyStats::default(), |mut stats, key| {
            stats.total_requests = stats.total_requests.saturating_add(key.usage);
            if key.status == KeyStatus::Active {
                stats.active_keys += 1;
            }
            if key.last_used.is_some() {
                stats.used_keys += 1;
            }
            stats
        })
    }
}
