//! Outbound integrations: the seven bibliographic and media sources, the
//! OpenRouter LLM client, and the retry helper shared by their callers.

pub mod error;
pub mod http;
pub mod llm;
pub mod registry;
pub mod retry;
pub mod source;
pub mod sources;
pub mod xml;

pub use error::UpstreamError;
pub use llm::{LlmClient, LlmCompletion, OpenRouterClient, OpenRouterConfig};
pub use registry::{SourceDescription, SourceRegistry, SourcesConfig};
pub use retry::with_retry;
pub use source::{DataSource, MonitorQuery, Operation, Params};
