use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use crate::{
    draft::{self, AgentDraft},
    error::{OrchestraError, Result},
    status::StatusTone,
    store::Record,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Idle,
    Error,
}

impl AgentStatus {
    pub fn tone(&self) -> StatusTone {
        match self {
            AgentStatus::Active => StatusTone::Success,
            AgentStatus::Idle => StatusTone::Warning,
            AgentStatus::Error => StatusTone::Destructive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Idle => "idle",
            AgentStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub tags: Vec<String>,
    pub status: AgentStatus,
    /// Share of capacity in use, 0..=100.
    pub usage: u8,
    pub last_active: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AgentRecord {
    /// Builds an idle agent from a validated draft. Provisioning moves it to active later.
    pub fn from_draft(draft: &AgentDraft) -> Result<Self> {
        draft.validate()?;
        let tags = draft.normalized_tags()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            description: draft.description.clone(),
            model: draft.model.clone(),
            system_prompt: draft.system_prompt.clone(),
            temperature: draft.temperature,
            max_tokens: draft.max_tokens,
            tags,
            status: AgentStatus::Idle,
            usage: 0,
            last_active: None,
            created_at: Utc::now(),
        })
    }

    pub fn tone(&self) -> StatusTone {
        self.status.tone()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub system_prompt: Option<String>,
    pub status: Option<AgentStatus>,
    pub usage: Option<u8>,
    pub last_active: Option<DateTime<Utc>>,
}

impl AgentPatch {
    pub fn status(status: AgentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Record for AgentRecord {
    type Patch = AgentPatch;
    const KIND: &'static str = "agent";

    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, patch: AgentPatch) -> Result<()> {
        if let Some(name) = &patch.name {
            draft::check_name(name, "agent")?;
        }
        if let Some(description) = &patch.description {
            draft::check_len("description", description, draft::MAX_DESCRIPTION_LEN)?;
        }
        if let Some(prompt) = &patch.system_prompt {
            draft::check_len("system prompt", prompt, draft::MAX_SYSTEM_PROMPT_LEN)?;
        }
        if let Some(usage) = patch.usage {
            if usage > 100 {
                return Err(OrchestraError::validation(format!(
                    "usage {} exceeds 100 percent",
                    usage
                )));
            }
        }

        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(prompt) = patch.system_prompt {
            self.system_prompt = prompt;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(usage) = patch.usage {
            self.usage = usage;
        }
        if let Some(last_active) = patch.last_active {
            self.last_active = Some(last_active);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_agents: usize,
    pub active_agents: usize,
    /// Rounded mean of agent usage; 0 for an empty roster.
    pub average_usage: u8,
}

impl DashboardStats {
    pub fn from_agents<'a>(agents: impl IntoIterator<Item = &'a AgentRecord>) -> Self {
        let mut stats = DashboardStats::default();
        let mut usage_sum: u64 = 0;
        for agent in agents {
            stats.total_agents += 1;
            if agent.status == AgentStatus::Active {
                stats.active_agents += 1;
            }
            usage_sum += u64::from(agent.usage);
        }
        if stats.total_agents > 0 {
            stats.average_usage = (usage_sum as f64 / stats.total_agents as f64).round() as u8;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(status: AgentStatus, usage: u8) -> AgentRecord {
        let mut record = AgentRecord::from_draft(
            &AgentDraft::new("Content Creator").with_model("llama3.1-8b"),
        )
        .unwrap();
        record.status = status;
        record.usage = usage;
        record
    }

    #[test]
    fn test_from_draft_starts_idle() {
        let draft = AgentDraft::new("  Data Analyst ").with_model("llama3.1-70b");
        let record = AgentRecord::from_draft(&draft).unwrap();
        assert_eq!(record.name, "Data Analyst");
        assert_eq!(record.status, AgentStatus::Idle);
        assert_eq!(record.usage, 0);
        assert!(record.last_active.is_none());
        assert_eq!(record.tone(), StatusTone::Warning);
    }

    #[test]
    fn test_from_draft_stores_normalized_tags() {
        let draft: AgentDraft = serde_json::from_str(
            r#"{"name": "Writer", "model": "llama3.1-8b", "tags": [" long   form ", "blog "]}"#,
        )
        .unwrap();
        let record = AgentRecord::from_draft(&draft).unwrap();
        assert_eq!(record.tags, vec!["long form", "blog"]);

        let duplicated: AgentDraft = serde_json::from_str(
            r#"{"name": "Writer", "model": "llama3.1-8b", "tags": ["writing", "  writing  "]}"#,
        )
        .unwrap();
        assert_eq!(AgentRecord::from_draft(&duplicated).unwrap_err().kind(), "validation");
    }

    #[test]
    fn test_from_invalid_draft() {
        assert!(AgentRecord::from_draft(&AgentDraft::new("x")).is_err());
    }

    #[test]
    fn test_status_tone_is_exhaustive() {
        assert_eq!(AgentStatus::Active.tone(), StatusTone::Success);
        assert_eq!(AgentStatus::Idle.tone(), StatusTone::Warning);
        assert_eq!(AgentStatus::Error.tone(), StatusTone::Destructive);
    }

    #[test]
    fn test_patch_validates_before_applying() {
        let mut record = agent(AgentStatus::Active, 10);
        let patch = AgentPatch {
            name: Some("Renamed".into()),
            usage: Some(101),
            ..Default::default()
        };
        assert!(record.apply(patch).is_err());
        assert_eq!(record.name, "Content Creator");

        record.apply(AgentPatch::status(AgentStatus::Error)).unwrap();
        assert_eq!(record.status, AgentStatus::Error);
    }

    #[test]
    fn test_dashboard_stats() {
        let agents = vec![
            agent(AgentStatus::Active, 85),
            agent(AgentStatus::Idle, 45),
            agent(AgentStatus::Active, 92),
        ];
        let stats = DashboardStats::from_agents(&agents);
        assert_eq!(stats.total_agents, 3);
        assert_eq!(stats.active_agents, 2);
        assert_eq!(stats.average_usage, 74);

        assert_eq!(DashboardStats::from_agents(&Vec::new()), DashboardStats::default());
    }
}
