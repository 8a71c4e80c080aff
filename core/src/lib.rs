pub mod error;
pub mod status;
pub mod store;
pub mod config;
pub mod vault;
pub mod draft;
pub mod agent;
pub mod api_key;
pub mod message;
pub mod responder;
pub mod scheduler;
pub mod conversation;
pub mod transcript;
pub mod seed;
pub mod console;

pub use error::{OrchestraError, Result};
pub use status::StatusTone;
pub use store::{Record, Registry};
pub use config::{BusyPolicy, ConsoleConfig};
pub use vault::{SealedSecret, SecretVault};
pub use draft::{AgentDraft, ModelSpec, MODEL_CATALOG, PRESET_NAMES};
pub use agent::{AgentPatch, AgentRecord, AgentStatus, DashboardStats};
pub use api_key::{ApiKeyPatch, ApiKeyRecord, KeyStats, KeyStatus, KeyView, NewApiKey};
pub use message::{Message, MessageRole};
pub use responder::{CannedResponder, Reply, ReplyRequest, Responder, ResponderConfig, ResponderFactory};
pub use scheduler::{EntityKey, TransitionScheduler};
pub use conversation::Conversation;
pub use transcript::TranscriptFile;
pub use console::Console;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
