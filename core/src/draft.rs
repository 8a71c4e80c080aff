//! The agent-creation form: a transient draft plus the catalogs it picks from.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::error::{OrchestraError, Result};

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 2.0;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const MIN_MAX_TOKENS: u32 = 128;
pub const MAX_MAX_TOKENS: u32 = 8192;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_SYSTEM_PROMPT_LEN: usize = 8000;
pub const MAX_TAG_LEN: usize = 32;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub speed: &'static str,
    pub cost: &'static str,
}

pub const MODEL_CATALOG: &[ModelSpec] = &[
    ModelSpec { id: "llama3.1-8b", name: "Llama 3.1 8B", speed: "Fast", cost: "Low" },
    ModelSpec { id: "llama3.1-70b", name: "Llama 3.1 70B", speed: "Medium", cost: "Medium" },
    ModelSpec { id: "llama3.1-405b", name: "Llama 3.1 405B", speed: "Slow", cost: "High" },
];

pub const PRESET_NAMES: &[&str] = &[
    "Content Creation Assistant",
    "Data Analysis Expert",
    "Code Review Specialist",
    "Customer Support Agent",
    "Research Assistant",
];

pub fn find_model(id: &str) -> Option<&'static ModelSpec> {
    MODEL_CATALOG.iter().find(|m| m.id == id)
}

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Trims a tag and collapses inner whitespace runs to a single space.
pub fn normalize_tag(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw.trim(), " ").into_owned()
}

pub(crate) fn check_name(name: &str, what: &str) -> Result<()> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(OrchestraError::validation(format!("{} name is required", what)));
    }
    if len > MAX_NAME_LEN {
        return Err(OrchestraError::validation(format!(
            "{} name exceeds {} characters",
            what, MAX_NAME_LEN
        )));
    }
    Ok(())
}

pub(crate) fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(OrchestraError::validation(format!(
            "{} exceeds {} characters",
            field, max
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentDraft {
    pub name: String,
    pub description: String,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub tags: Vec<String>,
}

impl Default for AgentDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            model: String::new(),
            system_prompt: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            tags: Vec::new(),
        }
    }
}

impl AgentDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<()> {
        check_temperature(temperature)?;
        self.temperature = temperature;
        Ok(())
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<()> {
        check_max_tokens(max_tokens)?;
        self.max_tokens = max_tokens;
        Ok(())
    }

    /// Returns false when the tag is blank, too long or already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = normalize_tag(tag);
        if tag.is_empty() || tag.chars().count() > MAX_TAG_LEN || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let tag = normalize_tag(tag);
        let before = self.tags.len();
        self.tags.retain(|t| *t != tag);
        self.tags.len() != before
    }

    pub fn apply_preset(&mut self, preset: &str) -> Result<()> {
        let preset = PRESET_NAMES
            .iter()
            .find(|p| **p == preset)
            .ok_or_else(|| OrchestraError::validation(format!("unknown preset '{}'", preset)))?;
        self.name = preset.to_string();
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        check_name(&self.name, "agent")?;
        check_len("description", &self.description, MAX_DESCRIPTION_LEN)?;
        check_len("system prompt", &self.system_prompt, MAX_SYSTEM_PROMPT_LEN)?;
        if find_model(&self.model).is_none() {
            return Err(OrchestraError::validation(format!("unknown model '{}'", self.model)));
        }
        check_temperature(self.temperature)?;
        check_max_tokens(self.max_tokens)?;

        self.normalized_tags().map(|_| ())
    }

    /// Tags as `add_tag` would have stored them. Drafts deserialized from
    /// JSON bypass `add_tag`, so blanks, overlong tags and duplicates after
    /// normalisation are rejected here.
    pub fn normalized_tags(&self) -> Result<Vec<String>> {
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for raw in &self.tags {
            let tag = normalize_tag(raw);
            if tag.is_empty() || tag.chars().count() > MAX_TAG_LEN {
                return Err(OrchestraError::validation(format!("invalid tag '{}'", raw)));
            }
            if tags.contains(&tag) {
                return Err(OrchestraError::validation(format!("duplicate tag '{}'", tag)));
            }
            tags.push(tag);
        }
        Ok(tags)
    }
}

fn check_temperature(temperature: f32) -> Result<()> {
    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        return Err(OrchestraError::validation(format!(
            "temperature {} outside {}..={}",
            temperature, MIN_TEMPERATURE, MAX_TEMPERATURE
        )));
    }
    Ok(())
}

fn check_max_tokens(max_tokens: u32) -> Result<()> {
    if !(MIN_MAX_TOKENS..=MAX_MAX_TOKENS).contains(&max_tokens) {
        return Err(OrchestraError::validation(format!(
            "max tokens {} outside {}..={}",
            max_tokens, MIN_MAX_TOKENS, MAX_MAX_TOKENS
        )));
    }
    Ok(())
}
