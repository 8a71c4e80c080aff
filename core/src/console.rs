//! The console: one owning object for every registry, timer and transcript.
//!
//! All mutation goes through [`Console`] methods, which take the state lock
//! for the duration of a single action. Delayed work is spawned on the
//! current tokio runtime and holds only a weak reference back to the
//! console, so dropping the last `Console` clone cancels everything.

use std::collections::HashSet;
use std::sync::{Arc, Weak};
use chrono::Utc;
use tokio::sync::Mutex;
use crate::{
    agent::{AgentPatch, AgentRecord, AgentStatus, DashboardStats},
    api_key::{ApiKeyPatch, ApiKeyRecord, KeyStats, KeyStatus, KeyView, NewApiKey},
    config::{BusyPolicy, ConsoleConfig},
    conversation::Conversation,
    draft::AgentDraft,
    error::{OrchestraError, Result},
    message::{Message, MAX_MESSAGE_LEN},
    responder::{AgentRef, ReplyRequest, Responder, ResponderFactory, FALLBACK_REPLY},
    scheduler::{EntityKey, TransitionScheduler},
    seed,
    store::Registry,
    transcript::TranscriptFile,
    vault::SecretVault,
};

#[derive(Debug, Default)]
struct ConsoleState {
    agents: Registry<AgentRecord>,
    keys: Registry<ApiKeyRecord>,
    conversation: Conversation,
    revealed: HashSet<String>,
    scheduler: TransitionScheduler,
}

impl ConsoleState {
    fn key_views(&self, vault: &SecretVault) -> Result<Vec<KeyView>> {
        self.keys
            .iter()
            .map(|key| key.view(vault, self.revealed.contains(&key.id)))
            .collect()
    }

    /// First active agent in roster order answers the chat.
    fn responding_agent(&self) -> Option<AgentRef> {
        self.agents
            .iter()
            .find(|a| a.status == AgentStatus::Active)
            .map(|a| AgentRef {
                id: a.id.clone(),
                name: a.name.clone(),
            })
    }

    /// Appends the user message for `text` and opens a new reply turn.
    fn start_turn(&mut self, text: String) -> (u64, ReplyRequest) {
        let seq = self.conversation.push(Message::user(text.clone())).seq;
        let turn = self.conversation.begin_turn();
        let request = ReplyRequest {
            prompt: text,
            agent: self.responding_agent(),
            user_seq: seq,
        };
        (turn, request)
    }
}

struct Inner {
    state: Mutex<ConsoleState>,
    config: ConsoleConfig,
    responder: Arc<dyn Responder>,
    vault: SecretVault,
}

#[derive(Clone)]
pub struct Console {
    inner: Arc<Inner>,
}

impl Console {
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        let responder = ResponderFactory::create(&config.responder)?;
        Self::with_responder(config, responder)
    }

    pub fn with_responder(config: ConsoleConfig, responder: Arc<dyn Responder>) -> Result<Self> {
        config.validate()?;
        let vault = match &config.vault_key {
            Some(encoded) => SecretVault::from_base64(encoded)?,
            None => SecretVault::ephemeral(),
        };

        let mut state = ConsoleState::default();
        if config.seed_demo_data {
            seed::agents(&mut state.agents)?;
            seed::keys(&mut state.keys, &vault)?;
            state.conversation.push(seed::greeting());
        }

        tracing::info!(
            "Console ready (responder: {}, vault: {}, seeded: {})",
            responder.name(),
            if vault.is_ephemeral() { "ephemeral" } else { "configured" },
            config.seed_demo_data
        );

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                config,
                responder,
                vault,
            }),
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    // ======================== Agents ========================

    pub async fn create_agent(&self, draft: AgentDraft) -> Result<Vec<AgentRecord>> {
        let record = AgentRecord::from_draft(&draft)?;
        let mut state = self.inner.state.lock().await;
        let id = state.agents.insert(record)?.id.clone();
        tracing::info!("Created agent {} ({})", id, draft.name.trim());

        self.schedule(
            &mut state,
            EntityKey::Agent(id),
            self.inner.config.agent_provisioning_delay(),
        );
        Ok(state.agents.list())
    }

    pub async fn update_agent(&self, id: &str, patch: AgentPatch) -> Result<Vec<AgentRecord>> {
        let mut state = self.inner.state.lock().await;
        state.agents.update(id, patch)?;
        Ok(state.agents.list())
    }

    pub async fn delete_agent(&self, id: &str) -> Result<Vec<AgentRecord>> {
        let mut state = self.inner.state.lock().await;
        state.agents.remove(id)?;
        state.scheduler.cancel(&EntityKey::Agent(id.to_string()));
        tracing::info!("Deleted agent {}", id);
        Ok(state.agents.list())
    }

    pub async fn agents(&self) -> Vec<AgentRecord> {
        self.inner.state.lock().await.agents.list()
    }

    pub async fn agent(&self, id: &str) -> Option<AgentRecord> {
        self.inner.state.lock().await.agents.get(id).cloned()
    }

    pub async fn dashboard_stats(&self) -> DashboardStats {
        DashboardStats::from_agents(self.inner.state.lock().await.agents.iter())
    }

    pub async fn active_agent_count(&self) -> usize {
        self.dashboard_stats().await.active_agents
    }

    // ======================== API keys ========================

    pub async fn add_key(&self, new_key: NewApiKey) -> Result<Vec<KeyView>> {
        let record = ApiKeyRecord::new(&new_key, &self.inner.vault)?;
        let mut state = self.inner.state.lock().await;
        let id = state.keys.insert(record)?.id.clone();
        tracing::info!("Added API key {} ({}), awaiting validation", id, new_key.name.trim());

        self.schedule(
            &mut state,
            EntityKey::ApiKey(id),
            self.inner.config.key_validation_delay(),
        );
        state.key_views(&self.inner.vault)
    }

    pub async fn update_key(&self, id: &str, patch: ApiKeyPatch) -> Result<Vec<KeyView>> {
        let mut state = self.inner.state.lock().await;
        state.keys.update(id, patch)?;
        state.key_views(&self.inner.vault)
    }

    pub async fn delete_key(&self, id: &str) -> Result<Vec<KeyView>> {
        let mut state = self.inner.state.lock().await;
        state.keys.remove(id)?;
        state.revealed.remove(id);
        state.scheduler.cancel(&EntityKey::ApiKey(id.to_string()));
        tracing::info!("Deleted API key {}", id);
        state.key_views(&self.inner.vault)
    }

    pub async fn toggle_key_visibility(&self, id: &str) -> Result<Vec<KeyView>> {
        let mut state = self.inner.state.lock().await;
        if !state.keys.contains(id) {
            return Err(OrchestraError::not_found("api key", id));
        }
        if !state.revealed.remove(id) {
            state.revealed.insert(id.to_string());
        }
        state.key_views(&self.inner.vault)
    }

    pub async fn record_key_usage(&self, id: &str) -> Result<Vec<KeyView>> {
        let mut state = self.inner.state.lock().await;
        state
            .keys
            .get_mut(id)
            .ok_or_else(|| OrchestraError::not_found("api key", id))?
            .record_usage()?;
        state.key_views(&self.inner.vault)
    }

    pub async fn keys(&self) -> Result<Vec<KeyView>> {
        self.inner.state.lock().await.key_views(&self.inner.vault)
    }

    pub async fn key_stats(&self) -> KeyStats {
        KeyStats::from_keys(self.inner.state.lock().await.keys.iter())
    }

    // ======================== Conversation ========================

    pub async fn send_message(&self, text: impl Into<String>) -> Result<Vec<Message>> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(OrchestraError::validation("message is empty"));
        }
        if text.chars().count() > MAX_MESSAGE_LEN {
            return Err(OrchestraError::validation(format!(
                "message exceeds {} characters",
                MAX_MESSAGE_LEN
            )));
        }

        let mut state = self.inner.state.lock().await;
        if state.conversation.is_busy() {
            match self.inner.config.busy_policy {
                BusyPolicy::Reject => return Err(OrchestraError::Busy),
                BusyPolicy::Queue => {
                    if state.conversation.queued_len() >= self.inner.config.max_queued_messages {
                        tracing::warn!(
                            "Send queue full ({} waiting), rejecting message",
                            state.conversation.queued_len()
                        );
                        return Err(OrchestraError::Busy);
                    }
                    state.conversation.enqueue(text);
                    tracing::debug!(
                        "Reply pending, queued message ({} waiting)",
                        state.conversation.queued_len()
                    );
                    return Ok(state.conversation.snapshot());
                }
            }
        }

        let (turn, request) = state.start_turn(text);
        let worker = tokio::spawn(run_reply_worker(Arc::downgrade(&self.inner), turn, request));
        state.conversation.attach_worker(worker.abort_handle());
        Ok(state.conversation.snapshot())
    }

    pub async fn clear_conversation(&self) -> Vec<Message> {
        let mut state = self.inner.state.lock().await;
        state.conversation.clear();
        tracing::info!("Conversation cleared");
        state.conversation.snapshot()
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.inner.state.lock().await.conversation.snapshot()
    }

    pub async fn is_busy(&self) -> bool {
        self.inner.state.lock().await.conversation.is_busy()
    }

    pub async fn export_transcript(&self) -> TranscriptFile {
        let state = self.inner.state.lock().await;
        TranscriptFile::export(state.conversation.messages(), &state.agents.list())
    }

    // ======================== Lifecycle ========================

    pub async fn pending_transitions(&self) -> usize {
        self.inner.state.lock().await.scheduler.pending_count()
    }

    /// Cancels every pending transition and reply.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        let cancelled = state.scheduler.cancel_all();
        state.conversation.clear();
        tracing::info!("Console shut down ({} pending transitions cancelled)", cancelled);
    }

    fn schedule(&self, state: &mut ConsoleState, key: EntityKey, delay: std::time::Duration) {
        let ticket = state.scheduler.issue_ticket();
        let weak = Arc::downgrade(&self.inner);
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut state = inner.state.lock().await;
            if !state.scheduler.finish(&task_key, ticket) {
                tracing::debug!("Dropped stale transition for {}", task_key);
                return;
            }
            fire_transition(&inner, &mut state, &task_key);
        });
        state.scheduler.track(key, ticket, task.abort_handle());
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

fn fire_transition(inner: &Inner, state: &mut ConsoleState, key: &EntityKey) {
    match key {
        EntityKey::Agent(id) => {
            let Some(agent) = state.agents.get_mut(id) else {
                tracing::warn!("Provisioning fired for missing agent {}", id);
                return;
            };
            if agent.status != AgentStatus::Idle {
                return;
            }
            agent.status = AgentStatus::Active;
            agent.last_active = Some(Utc::now());
            tracing::info!("Agent {} provisioned: idle -> active", id);
        }
        EntityKey::ApiKey(id) => {
            let Some(record) = state.keys.get_mut(id) else {
                tracing::warn!("Validation fired for missing API key {}", id);
                return;
            };
            if record.status != KeyStatus::Pending {
                return;
            }
            let outcome = match inner.vault.unseal(&record.sealed) {
                Ok(secret) => match &inner.config.required_key_prefix {
                    Some(prefix) if !secret.starts_with(prefix.as_str()) => KeyStatus::Invalid,
                    _ => KeyStatus::Active,
                },
                Err(e) => {
                    tracing::warn!("Could not unseal API key {}: {}", id, e);
                    KeyStatus::Invalid
                }
            };
            record.status = outcome;
            tracing::info!("API key {} validated: pending -> {}", id, outcome);
        }
    }
}

/// Delivers the reply for `turn`, then keeps draining queued sends until
/// the queue is empty or the conversation is cleared.
async fn run_reply_worker(weak: Weak<Inner>, mut turn: u64, mut request: ReplyRequest) {
    loop {
        let delay = match weak.upgrade() {
            Some(inner) => inner.config.reply_delay(),
            None => return,
        };
        tokio::time::sleep(delay).await;

        let Some(inner) = weak.upgrade() else {
            return;
        };
        let text = match inner.responder.reply(&request).await {
            Ok(reply) if !reply.text.trim().is_empty() => reply.text,
            Ok(_) => FALLBACK_REPLY.to_string(),
            Err(e) => {
                tracing::warn!("Responder failed for message #{}: {}", request.user_seq, e);
                FALLBACK_REPLY.to_string()
            }
        };

        let mut state = inner.state.lock().await;
        if !state.conversation.is_current(turn) {
            return;
        }
        let agent_id = request.agent.as_ref().map(|a| a.id.clone());
        state.conversation.push(Message::assistant(text).with_agent(agent_id));

        match state.conversation.dequeue() {
            Some(next) => {
                let (next_turn, next_request) = state.start_turn(next);
                turn = next_turn;
                request = next_request;
            }
            None => {
                state.conversation.finish();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;
    use crate::responder::{Reply, DEFAULT_REPLY};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn quiet_config() -> ConsoleConfig {
        ConsoleConfig::default()
    }

    fn draft(name: &str) -> AgentDraft {
        AgentDraft::new(name).with_model("llama3.1-8b")
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_pending_then_active() {
        let console = Console::new(quiet_config()).unwrap();
        let views = console
            .add_key(NewApiKey::new("Test", "cbr_sk_abcdefghijklmnop"))
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status, KeyStatus::Pending);
        assert_eq!(views[0].display, "cbr_sk_a...mnop");

        advance(1999).await;
        assert_eq!(console.keys().await.unwrap()[0].status, KeyStatus::Pending);

        advance(2).await;
        assert_eq!(console.keys().await.unwrap()[0].status, KeyStatus::Active);
        assert_eq!(console.pending_transitions().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_required_prefix_marks_key_invalid() {
        let config = ConsoleConfig {
            required_key_prefix: Some("cbr_sk_".into()),
            ..quiet_config()
        };
        let console = Console::new(config).unwrap();
        console.add_key(NewApiKey::new("Good", "cbr_sk_abcdefghijklmnop")).await.unwrap();
        console.add_key(NewApiKey::new("Bad", "sk-live-abcdefghijklmnop")).await.unwrap();

        advance(2001).await;
        let statuses: Vec<KeyStatus> = console.keys().await.unwrap().iter().map(|k| k.status).collect();
        assert_eq!(statuses, vec![KeyStatus::Active, KeyStatus::Invalid]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_key_cancels_validation() {
        let console = Console::new(quiet_config()).unwrap();
        let id = console
            .add_key(NewApiKey::new("Test", "cbr_sk_abcdefghijklmnop"))
            .await
            .unwrap()[0]
            .id
            .clone();
        assert_eq!(console.pending_transitions().await, 1);

        let remaining = console.delete_key(&id).await.unwrap();
        assert!(remaining.is_empty());
        assert_eq!(console.pending_transitions().await, 0);

        advance(5000).await;
        assert!(console.keys().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_agent_provisioning_and_mid_flight_delete() {
        let console = Console::new(quiet_config()).unwrap();
        let kept = console.create_agent(draft("Kept")).await.unwrap()[0].id.clone();
        let doomed = console.create_agent(draft("Doomed")).await.unwrap()[1].id.clone();
        assert_eq!(console.agent(&kept).await.unwrap().status, AgentStatus::Idle);

        console.delete_agent(&doomed).await.unwrap();
        advance(1001).await;

        let agents = console.agents().await;
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].id, kept);
        assert_eq!(agents[0].status, AgentStatus::Active);
        assert!(agents[0].last_active.is_some());
        assert!(console.agent(&doomed).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_provisioning_does_not_override_manual_status() {
        let console = Console::new(quiet_config()).unwrap();
        let id = console.create_agent(draft("Bot")).await.unwrap()[0].id.clone();
        console
            .update_agent(&id, AgentPatch::status(AgentStatus::Error))
            .await
            .unwrap();

        advance(1001).await;
        assert_eq!(console.agent(&id).await.unwrap().status, AgentStatus::Error);
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let console = Console::new(quiet_config()).unwrap();
        assert_eq!(console.delete_agent("nope").await.unwrap_err().kind(), "not_found");
        assert_eq!(console.delete_key("nope").await.unwrap_err().kind(), "not_found");
        assert_eq!(console.toggle_key_visibility("nope").await.unwrap_err().kind(), "not_found");
        assert_eq!(
            console.update_agent("nope", AgentPatch::default()).await.unwrap_err().kind(),
            "not_found"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_key_renames_without_touching_status() {
        let console = Console::new(quiet_config()).unwrap();
        let id = console
            .add_key(NewApiKey::new("Test", "cbr_sk_abcdefghijklmnop"))
            .await
            .unwrap()[0]
            .id
            .clone();

        let views = console.update_key(&id, ApiKeyPatch::rename("Staging")).await.unwrap();
        assert_eq!(views[0].name, "Staging");
        assert_eq!(views[0].status, KeyStatus::Pending);

        let err = console.update_key(&id, ApiKeyPatch::rename("")).await.unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(console.keys().await.unwrap()[0].name, "Staging");
        assert_eq!(
            console.update_key("nope", ApiKeyPatch::rename("x")).await.unwrap_err().kind(),
            "not_found"
        );

        // Renaming does not disturb the pending validation.
        advance(2001).await;
        assert_eq!(console.keys().await.unwrap()[0].status, KeyStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_queue_is_bounded() {
        let config = ConsoleConfig {
            max_queued_messages: 2,
            ..quiet_config()
        };
        let console = Console::new(config).unwrap();
        console.send_message("first").await.unwrap();
        console.send_message("second").await.unwrap();
        console.send_message("third").await.unwrap();
        assert_eq!(console.send_message("fourth").await.unwrap_err().kind(), "busy");

        advance(1501 * 3).await;
        let transcript = console.transcript().await;
        assert_eq!(transcript.len(), 6);
        assert!(transcript.iter().all(|m| m.content != "fourth"));
    }

    #[tokio::test]
    async fn test_toggle_visibility() {
        let console = Console::new(quiet_config()).unwrap();
        let id = console
            .add_key(NewApiKey::new("Test", "cbr_sk_abcdefghijklmnop"))
            .await
            .unwrap()[0]
            .id
            .clone();

        let shown = console.toggle_key_visibility(&id).await.unwrap();
        assert_eq!(shown[0].display, "cbr_sk_abcdefghijklmnop");
        let hidden = console.toggle_key_visibility(&id).await.unwrap();
        assert_eq!(hidden[0].display, "cbr_sk_a...mnop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_then_reply_then_clear() {
        let console = Console::new(quiet_config()).unwrap();
        let transcript = console.send_message("Hello").await.unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].role, MessageRole::User);
        assert_eq!(transcript[0].content, "Hello");
        assert!(console.is_busy().await);

        advance(1501).await;
        let transcript = console.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, MessageRole::Assistant);
        assert_eq!(transcript[1].content, DEFAULT_REPLY);
        assert!(!console.is_busy().await);

        assert!(console.clear_conversation().await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let console = Console::new(quiet_config()).unwrap();
        for blank in ["", "   ", "\n\t"] {
            assert_eq!(console.send_message(blank).await.unwrap_err().kind(), "validation");
        }
        assert!(console.transcript().await.is_empty());
        assert!(!console.is_busy().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_sends_keep_pairs_together() {
        let console = Console::new(quiet_config()).unwrap();
        console.send_message("first").await.unwrap();
        let snapshot = console.send_message("second").await.unwrap();
        console.send_message("third").await.unwrap();
        assert_eq!(snapshot.len(), 1);

        advance(1501 * 3).await;
        let transcript = console.transcript().await;
        let shape: Vec<(MessageRole, &str)> = transcript
            .iter()
            .map(|m| (m.role, if m.is_user() { m.content.as_str() } else { "reply" }))
            .collect();
        assert_eq!(
            shape,
            vec![
                (MessageRole::User, "first"),
                (MessageRole::Assistant, "reply"),
                (MessageRole::User, "second"),
                (MessageRole::Assistant, "reply"),
                (MessageRole::User, "third"),
                (MessageRole::Assistant, "reply"),
            ]
        );
        assert!(!console.is_busy().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_policy() {
        let config = ConsoleConfig {
            busy_policy: BusyPolicy::Reject,
            ..quiet_config()
        };
        let console = Console::new(config).unwrap();
        console.send_message("first").await.unwrap();
        assert_eq!(console.send_message("second").await.unwrap_err().kind(), "busy");

        advance(1501).await;
        assert_eq!(console.transcript().await.len(), 2);
        console.send_message("second").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_in_flight_reply() {
        let console = Console::new(quiet_config()).unwrap();
        console.send_message("Hello").await.unwrap();
        console.send_message("queued").await.unwrap();
        advance(500).await;

        console.clear_conversation().await;
        advance(5000).await;
        assert!(console.transcript().await.is_empty());
        assert!(!console.is_busy().await);

        // The pipeline is usable again after a clear.
        console.send_message("again").await.unwrap();
        advance(1501).await;
        assert_eq!(console.transcript().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_credited_to_first_active_agent() {
        let config = ConsoleConfig {
            seed_demo_data: true,
            ..quiet_config()
        };
        let console = Console::new(config).unwrap();
        console.send_message("Draft a blog post").await.unwrap();
        advance(1501).await;

        let transcript = console.transcript().await;
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[2].agent_id.as_deref(), Some("1"));

        let export = console.export_transcript().await;
        assert_eq!(export.participants.len(), 1);
        assert_eq!(export.participants[0].name, "Content Creator");
    }

    struct FailingResponder;

    #[async_trait]
    impl Responder for FailingResponder {
        async fn reply(&self, _request: &ReplyRequest) -> Result<Reply> {
            Err(OrchestraError::Responder("model offline".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_responder_failure_still_answers() {
        let console = Console::with_responder(quiet_config(), Arc::new(FailingResponder)).unwrap();
        console.send_message("Hello").await.unwrap();
        advance(1501).await;

        let transcript = console.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].content, FALLBACK_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_everything() {
        let console = Console::new(quiet_config()).unwrap();
        console.create_agent(draft("Bot")).await.unwrap();
        console.add_key(NewApiKey::new("Test", "cbr_sk_abcdefghijklmnop")).await.unwrap();
        console.send_message("Hello").await.unwrap();

        console.shutdown().await;
        assert_eq!(console.pending_transitions().await, 0);
        advance(5000).await;

        assert_eq!(console.agents().await[0].status, AgentStatus::Idle);
        assert_eq!(console.keys().await.unwrap()[0].status, KeyStatus::Pending);
        assert!(console.transcript().await.is_empty());
    }

    #[tokio::test]
    async fn test_seeded_stats() {
        let config = ConsoleConfig {
            seed_demo_data: true,
            ..quiet_config()
        };
        let console = Console::new(config).unwrap();

        let stats = console.dashboard_stats().await;
        assert_eq!(stats, DashboardStats { total_agents: 3, active_agents: 2, average_usage: 74 });
        assert_eq!(console.active_agent_count().await, 2);

        let key_stats = console.key_stats().await;
        assert_eq!(key_stats, KeyStats { total_requests: 1700, active_keys: 2, used_keys: 2 });

        let transcript = console.transcript().await;
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].content, seed::GREETING);
    }

    #[tokio::test]
    async fn test_record_key_usage() {
        let config = ConsoleConfig {
            seed_demo_data: true,
            ..quiet_config()
        };
        let console = Console::new(config).unwrap();
        let id = console.keys().await.unwrap()[0].id.clone();

        let views = console.record_key_usage(&id).await.unwrap();
        assert_eq!(views[0].usage, 1251);
        assert_eq!(console.key_stats().await.total_requests, 1701);
    }
}
