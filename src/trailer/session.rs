//! Session Context
//!
//! Everything one interactive session owns: configuration, the credential
//! store, the current story selection, generated artifacts, the generation
//! state, the voice-generation intent flag, and both provider clients (which
//! in turn own their caches and health counters). Nothing here is global;
//! the caller creates one context and passes it to the orchestrator.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use secrecy::SecretString;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::orchestrator::GenerationState;
use super::story::{StoryCategory, StoryElementCatalog, StoryElementSelection};
use crate::ai::provider::{
    ElevenLabsClient, ModelDescriptor, OpenRouterClient, ProviderRuntime,
};
use crate::clock::SharedClock;
use crate::config::Config;
use crate::constants::credentials::{LLM_API_KEY, TTS_API_KEY};
use crate::credentials::{InMemoryCredentialStore, SharedCredentials};
use crate::types::Result;

/// Which external service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Llm,
    Tts,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Llm => write!(f, "language model"),
            Self::Tts => write!(f, "speech synthesis"),
        }
    }
}

/// Outputs of the current generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    pub movie_name: Option<String>,
    pub script: Option<String>,
    pub audio: Option<Vec<u8>>,
}

pub struct SessionContext {
    id: Uuid,
    config: Config,
    clock: SharedClock,
    credentials: SharedCredentials,
    catalog: StoryElementCatalog,
    selection: StoryElementSelection,
    artifacts: GeneratedArtifacts,
    generation_state: GenerationState,
    voice_generation_requested: bool,
    llm: OpenRouterClient,
    tts: ElevenLabsClient,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("id", &self.id)
            .field("selection", &self.selection)
            .field("generation_state", &self.generation_state)
            .field("voice_generation_requested", &self.voice_generation_requested)
            .field("llm", &self.llm)
            .field("tts", &self.tts)
            .finish()
    }
}

impl SessionContext {
    /// Build a session from explicit collaborators with a random selection
    pub fn new(
        config: Config,
        runtime: ProviderRuntime,
        catalog: StoryElementCatalog,
    ) -> Result<Self> {
        let llm = OpenRouterClient::new(config.llm.clone(), &config.resilience, &runtime)?;
        let tts = ElevenLabsClient::new(config.tts.clone(), &config.resilience, &runtime)?;
        let selection = catalog.random_selection(&mut rand::rng());
        let id = Uuid::new_v4();
        info!("Session {} started", id);

        Ok(Self {
            id,
            config,
            clock: runtime.clock,
            credentials: runtime.credentials,
            catalog,
            selection,
            artifacts: GeneratedArtifacts::default(),
            generation_state: GenerationState::Idle,
            voice_generation_requested: false,
            llm,
            tts,
        })
    }

    /// Production session: system clock, reqwest, tokio resolver, the
    /// configured element catalog, and API keys from configuration
    pub fn start(config: Config) -> Result<Self> {
        let credentials: SharedCredentials = Arc::new(InMemoryCredentialStore::default());
        let runtime = ProviderRuntime::system(credentials)?;
        let catalog = match &config.output.elements_dir {
            Some(dir) => StoryElementCatalog::load_dir(dir)?,
            None => StoryElementCatalog::builtin(),
        };

        let mut session = Self::new(config, runtime, catalog)?;
        session.seed_credentials();
        Ok(session)
    }

    fn seed_credentials(&mut self) {
        let ttl = self.config.credentials.ttl_hours;
        let seeds = [
            (LLM_API_KEY, self.config.llm.api_key.clone()),
            (TTS_API_KEY, self.config.tts.api_key.clone()),
        ];
        for (name, value) in seeds {
            if let Some(value) = value {
                self.credentials.set(name, SecretString::from(value), ttl);
            } else {
                debug!("No {} configured", name);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn catalog(&self) -> &StoryElementCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> &StoryElementSelection {
        &self.selection
    }

    pub fn artifacts(&self) -> &GeneratedArtifacts {
        &self.artifacts
    }

    pub fn generation_state(&self) -> GenerationState {
        self.generation_state
    }

    pub fn voice_generation_requested(&self) -> bool {
        self.voice_generation_requested
    }

    pub fn llm(&self) -> &OpenRouterClient {
        &self.llm
    }

    pub fn tts(&self) -> &ElevenLabsClient {
        &self.tts
    }

    // -------------------------------------------------------------------------
    // Credentials
    // -------------------------------------------------------------------------

    /// Store an API key; `ttl_hours` defaults to the configured lifetime
    pub fn set_credential(&self, name: &str, value: SecretString, ttl_hours: Option<u32>) {
        let ttl = ttl_hours.unwrap_or(self.config.credentials.ttl_hours);
        self.credentials.set(name, value, ttl);
    }

    pub fn get_credential(&self, name: &str) -> Option<SecretString> {
        self.credentials.get(name)
    }

    pub fn clear_credential(&self, name: &str) {
        self.credentials.clear(name);
    }

    pub fn credential_expiration(&self, name: &str) -> Option<DateTime<Utc>> {
        self.credentials.expiration_of(name)
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    pub fn randomize_selection(&mut self) {
        self.randomize_selection_with(&mut rand::rng());
    }

    pub fn randomize_selection_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.selection = self.catalog.random_selection(rng);
        info!("Randomized story elements");
    }

    /// Replace one element with free text
    pub fn set_custom_element(&mut self, category: StoryCategory, value: &str) -> Result<()> {
        self.selection.set(category, value)?;
        debug!("{} set to '{}'", category, self.selection.get(category));
        Ok(())
    }

    pub fn set_selection(&mut self, selection: StoryElementSelection) {
        self.selection = selection;
    }

    // -------------------------------------------------------------------------
    // Providers
    // -------------------------------------------------------------------------

    /// Signal explicit intent to spend on speech synthesis
    pub fn request_voice_generation(&mut self) {
        self.voice_generation_requested = true;
    }

    /// Breaker closed and host resolvable; issues no API request
    pub async fn is_provider_reachable(&self, provider: Provider) -> bool {
        match provider {
            Provider::Llm => self.llm.is_reachable().await,
            Provider::Tts => self.tts.is_reachable().await,
        }
    }

    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        self.llm.list_models().await
    }

    // -------------------------------------------------------------------------
    // Generation bookkeeping (driven by the orchestrator)
    // -------------------------------------------------------------------------

    /// Return to `Idle` and then enter `NamingInFlight`, dropping the
    /// previous artifacts and voice intent
    pub(crate) fn begin_generation(&mut self) {
        match self.generation_state {
            GenerationState::Idle => {}
            state if state.is_terminal() => self.transition(GenerationState::Idle),
            state => {
                warn!("Previous generation was abandoned while {}", state);
                self.transition(GenerationState::Idle);
            }
        }
        self.artifacts = GeneratedArtifacts::default();
        self.voice_generation_requested = false;
        self.transition(GenerationState::NamingInFlight);
    }

    pub(crate) fn transition(&mut self, next: GenerationState) {
        debug!("{} -> {}", self.generation_state, next);
        self.generation_state = next;
    }

    pub(crate) fn artifacts_mut(&mut self) -> &mut GeneratedArtifacts {
        &mut self.artifacts
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ai::provider::testing::{FakeResolver, FakeTransport};
    use crate::clock::{Clock, ManualClock};
    use secrecy::ExposeSecret;
    use std::time::Duration;

    pub(crate) struct TestSession {
        pub clock: Arc<ManualClock>,
        pub transport: Arc<FakeTransport>,
        pub session: SessionContext,
    }

    /// Session wired to fakes, with both API keys stored
    pub(crate) fn test_session() -> TestSession {
        test_session_with(Config::default())
    }

    pub(crate) fn test_session_with(config: Config) -> TestSession {
        let clock = Arc::new(ManualClock::starting_now());
        let transport = Arc::new(FakeTransport::new());
        let runtime = ProviderRuntime {
            clock: clock.clone(),
            transport: transport.clone(),
            resolver: Arc::new(FakeResolver::ok()),
            credentials: Arc::new(InMemoryCredentialStore::new(clock.clone())),
        };

        let session =
            SessionContext::new(config, runtime, StoryElementCatalog::builtin()).unwrap();
        session.set_credential(LLM_API_KEY, SecretString::from("sk-test".to_string()), None);
        session.set_credential(TTS_API_KEY, SecretString::from("xi-test".to_string()), None);

        TestSession {
            clock,
            transport,
            session,
        }
    }

    #[test]
    fn test_new_session_is_idle_with_full_selection() {
        let t = test_session();
        assert_eq!(t.session.generation_state(), GenerationState::Idle);
        assert!(!t.session.voice_generation_requested());
        assert_eq!(t.session.artifacts(), &GeneratedArtifacts::default());
        for category in StoryCategory::ALL {
            assert!(!t.session.selection().get(category).is_empty());
        }
    }

    #[test]
    fn test_credentials_use_configured_ttl() {
        let t = test_session();
        let expires = t.session.credential_expiration(LLM_API_KEY).unwrap();
        assert_eq!(expires, t.clock.now() + chrono::TimeDelta::hours(48));

        t.session.set_credential("CUSTOM", SecretString::from("v".to_string()), Some(1));
        t.clock.advance(Duration::from_secs(2 * 3600));
        assert!(t.session.get_credential("CUSTOM").is_none());
        assert_eq!(
            t.session.get_credential(LLM_API_KEY).unwrap().expose_secret(),
            "sk-test"
        );

        t.session.clear_credential(LLM_API_KEY);
        assert!(t.session.get_credential(LLM_API_KEY).is_none());
    }

    #[test]
    fn test_custom_element() {
        let mut t = test_session();
        t.session
            .set_custom_element(StoryCategory::Setting, "Haunted Porta-Potty")
            .unwrap();
        assert_eq!(
            t.session.selection().get(StoryCategory::Setting),
            "Haunted Porta-Potty"
        );
        assert!(t.session.set_custom_element(StoryCategory::Setting, " ").is_err());
    }

    #[test]
    fn test_begin_generation_clears_artifacts_and_intent() {
        let mut t = test_session();
        t.session.request_voice_generation();
        t.session.artifacts_mut().movie_name = Some("Old".to_string());
        t.session.transition(GenerationState::ScriptDone);

        t.session.begin_generation();

        assert_eq!(t.session.generation_state(), GenerationState::NamingInFlight);
        assert!(t.session.artifacts().movie_name.is_none());
        assert!(!t.session.voice_generation_requested());
    }

    #[test]
    fn test_begin_generation_recovers_from_abandoned_stage() {
        let mut t = test_session();
        t.session.transition(GenerationState::ScriptInFlight);
        assert!(!t.session.generation_state().is_terminal());

        t.session.begin_generation();
        assert_eq!(t.session.generation_state(), GenerationState::NamingInFlight);
    }

    #[tokio::test]
    async fn test_provider_reachability() {
        let t = test_session();
        assert!(t.session.is_provider_reachable(Provider::Llm).await);
        assert!(t.session.is_provider_reachable(Provider::Tts).await);
        assert_eq!(t.transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_list_models_through_session() {
        let t = test_session();
        t.transport.push_json(
            200,
            serde_json::json!({ "data": [{ "id": "google/gemma-3-4b-it:free" }] }),
        );

        let models = t.session.list_models().await.unwrap();
        assert_eq!(models[0].id, "google/gemma-3-4b-it:free");
    }
}
