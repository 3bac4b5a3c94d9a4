use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trailer_forge::StoryCategory;
use trailer_forge::cli::CommandContext;
use trailer_forge::cli::commands::generate::GenerateOptions;

/// Parse `category=value` into a story element override
fn parse_element(s: &str) -> Result<(StoryCategory, String), String> {
    let (category, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected CATEGORY=VALUE, got '{}'", s))?;
    let category: StoryCategory = category.parse()?;
    if value.trim().is_empty() {
        return Err(format!("Value for {} must not be empty", category.key()));
    }
    Ok((category, value.trim().to_string()))
}

#[derive(Parser)]
#[command(name = "trailer-forge")]
#[command(
    version,
    about = "Generate movie trailer titles, scripts and voice-overs with AI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, help = "Config file (replaces global and project config)")]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a trailer title and script
    Generate {
        #[arg(
            long = "set",
            short = 's',
            value_parser = parse_element,
            help = "Override an element, e.g. --set genre=Horror (repeatable)"
        )]
        overrides: Vec<(StoryCategory, String)>,
        #[arg(long, help = "Seed for a reproducible element draw")]
        seed: Option<u64>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long, help = "Narrate the script (uses text-to-speech credits)")]
        audio: bool,
        #[arg(long, requires = "audio", help = "Mix background music under the narration")]
        mix: bool,
        #[arg(long, help = "Save title and script as movie_data.json")]
        export: bool,
    },

    /// List available language models
    Models {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Check provider reachability
    Health {
        #[arg(long, help = "Also list models to confirm the key works")]
        deep: bool,
    },

    /// Show which API keys are set and when they expire
    Keys,

    /// List saved voice-overs, newest first
    Audio,

    /// Show story element options
    Elements {
        #[arg(help = "Only this category (genre, setting, main_character, conflict, plot_twist)")]
        category: Option<StoryCategory>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mTrailer Forge encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            overrides,
            seed,
            model,
            audio,
            mix,
            export,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            let mut ctx = CommandContext::load(cli.config, model)?;
            let options = GenerateOptions {
                overrides,
                seed,
                audio,
                mix,
                export,
            };
            rt.block_on(trailer_forge::cli::commands::generate::run(&mut ctx, options))?;
        }
        Commands::Models { format } => {
            let rt = tokio::runtime::Runtime::new()?;
            let ctx = CommandContext::load(cli.config, None)?;
            rt.block_on(trailer_forge::cli::commands::models::run(&ctx, &format))?;
        }
        Commands::Health { deep } => {
            let rt = tokio::runtime::Runtime::new()?;
            let ctx = CommandContext::load(cli.config, None)?;
            rt.block_on(trailer_forge::cli::commands::health::run(&ctx, deep))?;
        }
        Commands::Keys => {
            let ctx = CommandContext::load(cli.config, None)?;
            trailer_forge::cli::commands::keys::run(&ctx)?;
        }
        Commands::Audio => {
            trailer_forge::cli::commands::audio::run(cli.config)?;
        }
        Commands::Elements { category } => {
            trailer_forge::cli::commands::elements::run(cli.config, category)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                trailer_forge::cli::commands::config::show(&format)?;
            }
            ConfigAction::Path => {
                trailer_forge::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                trailer_forge::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
