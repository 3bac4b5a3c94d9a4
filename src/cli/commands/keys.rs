//! Keys Command
//!
//! Show which API keys the session holds and when each one expires.
//! Secret values are never printed.

use chrono::{DateTime, Utc};

use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::constants::credentials::{LLM_API_KEY, TTS_API_KEY};
use crate::trailer::{Provider, SessionContext};
use crate::types::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStatus {
    pub name: &'static str,
    pub provider: Provider,
    /// `None` when the key is missing or has expired
    pub expires_at: Option<DateTime<Utc>>,
}

impl KeyStatus {
    pub fn is_present(&self) -> bool {
        self.expires_at.is_some()
    }
}

/// Status of every credential the session uses, LLM first
pub fn key_status(session: &SessionContext) -> Vec<KeyStatus> {
    [(LLM_API_KEY, Provider::Llm), (TTS_API_KEY, Provider::Tts)]
        .into_iter()
        .map(|(name, provider)| {
            // A read evicts an expired entry, so the expiration below is live
            let expires_at = session
                .get_credential(name)
                .and_then(|_| session.credential_expiration(name));
            KeyStatus {
                name,
                provider,
                expires_at,
            }
        })
        .collect()
}

pub fn run(ctx: &CommandContext) -> Result<()> {
    let out = Output::new();
    let now = ctx.session.now();
    out.header("API keys");

    for status in key_status(&ctx.session) {
        match status.expires_at {
            Some(expires_at) => {
                let hours = (expires_at - now).num_hours();
                out.success(&format!("{} ({}) set", status.name, status.provider));
                out.field(
                    "expires",
                    &format!("{} (in {}h)", expires_at.format("%Y-%m-%d %H:%M UTC"), hours),
                );
            }
            None => {
                out.warning(&format!("{} ({}) missing", status.name, status.provider));
            }
        }
    }
    Ok(())
}
