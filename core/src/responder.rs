use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use crate::error::{OrchestraError, Result};

pub const DEFAULT_REPLY: &str =
    "I understand your request. Let me coordinate with the available agents to provide the best response...";

/// Appended when a responder fails, so every user message still gets its reply.
pub const FALLBACK_REPLY: &str = "I have no response to share.";

const ROTATING_REPLIES: &[&str] = &[
    DEFAULT_REPLY,
    "{{ agent_name }} is picking this up now. I'll share the results as soon as they're ready.",
    "Routing your request to {{ agent_name }}. One moment while the workflow runs...",
    "I've split this into subtasks and assigned them across the active agents.",
    "{{ agent_name }} has the context it needs. Expect a draft shortly.",
];

/// The agent a reply is attributed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRequest {
    pub prompt: String,
    pub agent: Option<AgentRef>,
    /// Sequence number of the triggering user message.
    pub user_seq: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self { text: content.into() }
    }
}

#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, request: &ReplyRequest) -> Result<Reply>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponderConfig {
    #[serde(rename = "canned")]
    Canned(CannedConfig),
}

impl Default for ResponderConfig {
    fn default() -> Self {
        ResponderConfig::Canned(CannedConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CannedConfig {
    /// Always answer with the first template instead of rotating.
    pub deterministic: bool,
    /// Tera templates; `agent_name`, `prompt` and `user_seq` are in scope.
    pub templates: Vec<String>,
}

impl Default for CannedConfig {
    fn default() -> Self {
        Self {
            deterministic: true,
            templates: Vec::new(),
        }
    }
}

pub struct ResponderFactory;

impl ResponderFactory {
    pub fn create(config: &ResponderConfig) -> Result<Arc<dyn Responder>> {
        match config {
            ResponderConfig::Canned(cfg) => Ok(Arc::new(CannedResponder::new(cfg)?)),
        }
    }
}

/// Answers from a fixed set of templates.
pub struct CannedResponder {
    tera: Tera,
    template_names: Vec<String>,
    deterministic: bool,
    call_count: AtomicUsize,
}

impl CannedResponder {
    pub fn new(config: &CannedConfig) -> Result<Self> {
        let sources: Vec<String> = if !config.templates.is_empty() {
            config.templates.clone()
        } else if config.deterministic {
            vec![DEFAULT_REPLY.to_string()]
        } else {
            ROTATING_REPLIES.iter().map(|s| s.to_string()).collect()
        };

        let mut tera = Tera::default();
        let mut template_names = Vec::with_capacity(sources.len());
        for (i, source) in sources.iter().enumerate() {
            let name = format!("reply_{}", i);
            tera.add_raw_template(&name, source)
                .map_err(|e| OrchestraError::InvalidConfig(format!("reply template {}: {}", i, e)))?;
            template_names.push(name);
        }

        Ok(Self {
            tera,
            template_names,
            deterministic: config.deterministic,
            call_count: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Responder for CannedResponder {
    async fn reply(&self, request: &ReplyRequest) -> Result<Reply> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        let index = if self.deterministic {
            0
        } else {
            count % self.template_names.len()
        };

        let mut context = Context::new();
        context.insert("prompt", &request.prompt);
        context.insert("user_seq", &request.user_seq);
        context.insert(
            "agent_name",
            request.agent.as_ref().map(|a| a.name.as_str()).unwrap_or("the orchestrator"),
        );

        let text = self
            .tera
            .render(&self.template_names[index], &context)
            .map_err(|e| OrchestraError::Responder(e.to_string()))?;
        Ok(Reply::text(text))
    }

    fn name(&self) -> &str {
        "canned"
    }
}
