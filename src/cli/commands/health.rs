//! Health Command
//!
//! Report whether each provider looks reachable, without spending API calls
//! unless `--deep` asks for a model listing round trip.

use tracing::debug;

use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::trailer::Provider;
use crate::types::Result;

pub async fn run(ctx: &CommandContext, deep: bool) -> Result<()> {
    let out = Output::new();
    out.header("Provider health");
    out.field("session", &ctx.session.id().to_string());

    for provider in [Provider::Llm, Provider::Tts] {
        let reachable = ctx.session.is_provider_reachable(provider).await;
        let health = match provider {
            Provider::Llm => ctx.session.llm().health(),
            Provider::Tts => ctx.session.tts().health(),
        };
        debug!("{}", health.summary());

        out.section(&provider.to_string());
        if reachable {
            out.success(&format!("{} reachable", health.provider));
        } else {
            out.warning(&format!("{} unreachable", health.provider));
        }
        out.field("circuit", &health.circuit_state.to_string());
        out.field("failures", &health.failure_count.to_string());
        out.field("dns verified", &health.dns_verified.to_string());
        out.field(
            "cache hit rate",
            &format!("{:.0}%", health.cache.hit_rate() * 100.0),
        );
    }

    if deep {
        out.section("Round trip");
        if ctx.session.llm().health_check().await {
            out.success("Model listing succeeded");
        } else {
            out.error("Model listing failed");
        }
    }

    Ok(())
}
