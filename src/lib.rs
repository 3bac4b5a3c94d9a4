//! Trailer Forge - AI-Generated Movie Trailers
//!
//! Randomly combines story elements (genre, setting, main character,
//! conflict, plot twist), asks a language model for a title and a voice-over
//! script, and narrates the script with a text-to-speech service.
//!
//! ## Core Features
//!
//! - **Resilient Clients**: circuit breaker, response cache, DNS pre-check
//!   and rate limiting in front of every provider call
//! - **Short-lived Credentials**: API keys expire after a configurable TTL
//! - **Explicit Session State**: one `SessionContext` owns everything
//! - **Intent-gated Narration**: speech synthesis only runs when requested
//!
//! ## Quick Start
//!
//! ```ignore
//! use trailer_forge::{ConfigLoader, GenerationOrchestrator, SessionContext};
//!
//! let config = ConfigLoader::load()?;
//! let orchestrator = GenerationOrchestrator::from_config(&config);
//! let mut session = SessionContext::start(config)?;
//!
//! let trailer = orchestrator.generate_title_and_script(&mut session).await?;
//! session.request_voice_generation();
//! let audio = orchestrator.generate_audio(&mut session).await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: Prompt templates and provider clients
//! - [`trailer`]: Story elements, session, orchestrator, media
//! - [`credentials`]: Expiring API-key store
//! - [`config`]: Layered configuration

pub mod ai;
pub mod cli;
pub mod clock;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod trailer;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, ErrorClassifier, Result, TrailerError};

// Time and credentials
pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{CredentialStore, InMemoryCredentialStore};

// =============================================================================
// Workflow Re-exports
// =============================================================================

pub use trailer::{
    GeneratedArtifacts, GenerationOrchestrator, GenerationState, Provider, SessionContext,
    StoryCategory, StoryElementCatalog, StoryElementSelection, TitleAndScript,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    ClientHealthState, ElevenLabsClient, ModelDescriptor, OpenRouterClient, ProviderRuntime,
    ResilienceConfig,
};
