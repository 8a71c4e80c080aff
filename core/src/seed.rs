//! Demo roster, keys and greeting for a freshly opened console.

use chrono::{Duration, Utc};
use crate::{
    agent::{AgentRecord, AgentStatus},
    api_key::{ApiKeyRecord, KeyStatus, NewApiKey},
    draft::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE},
    error::Result,
    message::Message,
    store::Registry,
    vault::SecretVault,
};

pub const GREETING: &str = "Hello! I'm your AI agent orchestrator. How can I help you today?";

struct SeedAgent {
    id: &'static str,
    name: &'static str,
    model: &'static str,
    status: AgentStatus,
    usage: u8,
    idle_for: Duration,
}

struct SeedKey {
    name: &'static str,
    secret: &'static str,
    usage: u64,
    idle_for: Duration,
}

fn seed_agents() -> Vec<SeedAgent> {
    vec![
        SeedAgent {
            id: "1",
            name: "Content Creator",
            model: "llama3.1-8b",
            status: AgentStatus::Active,
            usage: 85,
            idle_for: Duration::minutes(2),
        },
        SeedAgent {
            id: "2",
            name: "Data Analyst",
            model: "llama3.1-70b",
            status: AgentStatus::Idle,
            usage: 45,
            idle_for: Duration::hours(1),
        },
        SeedAgent {
            id: "3",
            name: "Code Assistant",
            model: "llama3.1-8b",
            status: AgentStatus::Active,
            usage: 92,
            idle_for: Duration::seconds(30),
        },
    ]
}

fn seed_keys() -> Vec<SeedKey> {
    vec![
        SeedKey {
            name: "Production Key",
            secret: "cbr_sk_1234567890abcdef",
            usage: 1250,
            idle_for: Duration::hours(2),
        },
        SeedKey {
            name: "Development Key",
            secret: "cbr_sk_fedcba0987654321",
            usage: 450,
            idle_for: Duration::days(1),
        },
    ]
}

pub(crate) fn agents(registry: &mut Registry<AgentRecord>) -> Result<()> {
    let now = Utc::now();
    for seed in seed_agents() {
        registry.insert(AgentRecord {
            id: seed.id.to_string(),
            name: seed.name.to_string(),
            description: String::new(),
            model: seed.model.to_string(),
            system_prompt: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            tags: Vec::new(),
            status: seed.status,
            usage: seed.usage,
            last_active: Some(now - seed.idle_for),
            created_at: now,
        })?;
    }
    Ok(())
}

/// Seeded keys are already validated, so they skip the pending phase.
pub(crate) fn keys(registry: &mut Registry<ApiKeyRecord>, vault: &SecretVault) -> Result<()> {
    let now = Utc::now();
    for seed in seed_keys() {
        let mut record = ApiKeyRecord::new(&NewApiKey::new(seed.name, seed.secret), vault)?;
        record.status = KeyStatus::Active;
        record.usage = seed.usage;
        record.last_used = Some(now - seed.idle_for);
        registry.insert(record)?;
    }
    Ok(())
}

pub(crate) fn greeting() -> Message {
    Message::assistant(GREETING)
}
