//! AI Integration Layer
//!
//! Prompt templates and the resilient clients for the language-model and
//! speech-synthesis providers.

pub mod prompt;
pub mod provider;

pub use prompt::{PromptTemplate, PromptTemplates};
pub use provider::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState, ClientHealthState,
    ElevenLabsClient, ErrorCategory, ErrorClassifier, ModelDescriptor, OpenRouterClient,
    ProviderRuntime, ResilienceConfig, ResilientClient, SpeechRequest, TextRequest,
};
