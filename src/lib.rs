pub mod completion;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod domain;
pub mod error;
pub mod gemini;
pub mod openrouter;
pub mod prompt;
pub mod session;

pub use completion::{CompletionClient, FallbackKind, FallbackMessages, GenerationParams, RetryPolicy};
pub use config::{Backend, ClientConfig};
pub use conversation::{ConversationStore, Message, Origin};
pub use domain::{Domain, DomainProfile};
pub use error::{ClientError, ConfigError, SessionError};
pub use gemini::GeminiClient;
pub use openrouter::OpenRouterClient;
pub use prompt::PromptComposer;
pub use session::{ChatSession, PendingReply, Reply, SessionState};
