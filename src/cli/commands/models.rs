//! Models Command
//!
//! List the models the language-model provider offers.

use crate::cli::CommandContext;
use crate::cli::ui::Output;
use crate::types::Result;

pub async fn run(ctx: &CommandContext, format: &str) -> Result<()> {
    let out = Output::new();
    let models = match ctx.session.list_models().await {
        Ok(models) => models,
        Err(e) => {
            out.failure(&e);
            return Err(e);
        }
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    let default_model = ctx.session.llm().default_model();
    out.header(&format!("{} models", models.len()));
    for model in &models {
        let marker = if model.id == default_model { "*" } else { " " };
        let context = model
            .context_length
            .map(|c| format!("{}k ctx", c / 1000))
            .unwrap_or_else(|| "-".to_string());
        let price = match (model.prompt_price, model.completion_price) {
            (Some(p), Some(c)) if p == 0.0 && c == 0.0 => "free".to_string(),
            (Some(p), Some(c)) => format!("${:.2}/${:.2} per M", p * 1e6, c * 1e6),
            _ => "-".to_string(),
        };
        println!("{} {:<48} {:>9}  {}", marker, model.id, context, price);
    }
    Ok(())
}
