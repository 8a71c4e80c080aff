use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::{
    agent::AgentRecord,
    error::Result,
    message::{Message, MessageRole},
};

pub const TRANSCRIPT_FORMAT_VERSION: &str = "0.1.0";

/// Exported conversation, version 0.1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptFile {
    pub version: String,
    pub messages: Vec<Message>,
    /// Agents credited with at least one reply, in order of first reply.
    pub participants: Vec<ParticipantExport>,
    pub metadata: TranscriptMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantExport {
    pub id: String,
    pub name: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMetadata {
    pub orchestra_version: String,
    pub export_time: DateTime<Utc>,
    pub export_source: String,
    pub message_count: usize,
    pub user_messages: usize,
}

impl TranscriptFile {
    pub fn export(messages: &[Message], agents: &[AgentRecord]) -> Self {
        let mut participants: Vec<ParticipantExport> = Vec::new();
        for agent_id in messages.iter().filter_map(|m| m.agent_id.as_deref()) {
            if participants.iter().any(|p| p.id == agent_id) {
                continue;
            }
            // Agents deleted since they replied are simply not credited.
            if let Some(agent) = agents.iter().find(|a| a.id == agent_id) {
                participants.push(ParticipantExport {
                    id: agent.id.clone(),
                    name: agent.name.clone(),
                    model: agent.model.clone(),
                });
            }
        }

        Self {
            version: TRANSCRIPT_FORMAT_VERSION.to_string(),
            messages: messages.to_vec(),
            participants,
            metadata: TranscriptMetadata {
                orchestra_version: crate::VERSION.to_string(),
                export_time: Utc::now(),
                export_source: "orchestra-console".to_string(),
                message_count: messages.len(),
                user_messages: messages.iter().filter(|m| m.role == MessageRole::User).count(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
