//! # photostudio
//!
//! Binary entry point for the Photostudio Telegram bot.
//!
//! `photostudio` (or `photostudio run`) resolves configuration, then runs the
//! Telegram polling loop and the liveness endpoint side by side until Ctrl+C
//! or SIGTERM.

mod config;

use std::io::{IsTerminal, stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use photostudio_core::{Conversation, Dispatcher, SessionStore};
use photostudio_gemini::GeminiClient;
use photostudio_proto::{ChatAdapter, EventSink, mask_secret};
use photostudio_telegram::{TelegramService, shutdown_signal, wait_for_shutdown};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::{RunArgs, Settings};

/// How long in-flight conversations may finish after shutdown was requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Photostudio - AI portrait photographer for Telegram
#[derive(Parser, Debug)]
#[command(name = "photostudio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot (default if no subcommand given)
    Run(RunArgs),

    /// Show where each setting comes from, with secrets masked
    Status(RunArgs),

    /// Print the active style catalog
    Styles(StylesArgs),

    /// Manage the bot token in the OS keychain
    Token(TokenArgs),
}

#[derive(Parser, Debug)]
struct StylesArgs {
    /// YAML file replacing the built-in style catalog
    #[arg(long, env = "PHOTOSTUDIO_STYLES")]
    styles: Option<std::path::PathBuf>,
}

#[derive(Parser, Debug)]
struct TokenArgs {
    #[command(subcommand)]
    command: TokenCommands,
}

#[derive(Subcommand, Debug)]
enum TokenCommands {
    /// Store the Telegram bot token in the OS keychain
    Set(SetTokenArgs),
}

#[derive(Parser, Debug)]
struct SetTokenArgs {
    /// Telegram bot token from @BotFather
    token: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; env fallbacks below read whatever it set.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let use_colors = stdout().is_terminal();

    match cli.command {
        Some(Commands::Run(args)) => run_command(args).await,
        Some(Commands::Status(args)) => {
            status_command(use_colors, &args);
            Ok(())
        }
        Some(Commands::Styles(args)) => styles_command(&args),
        Some(Commands::Token(args)) => match args.command {
            TokenCommands::Set(args) => token_set_command(use_colors, &args),
        },
        None => run_command(RunArgs::parse_from(["photostudio"])).await,
    }
}

async fn run_command(args: RunArgs) -> Result<()> {
    let settings = match Settings::resolve(&args, config::load_bot_token) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Configuration incomplete");
            std::process::exit(1);
        }
    };

    for warning in config::warnings(&args) {
        warn!("{warning}");
    }

    info!(
        flow = %settings.conversation.flow,
        model = %settings.gemini.model,
        port = settings.port,
        token = %settings.bot_token_masked(),
        token_source = %settings.token_source,
        "Starting Photostudio"
    );

    let generator =
        Arc::new(GeminiClient::new(settings.gemini.clone()).context("Failed to create Gemini client")?);

    let shutdown = shutdown_signal();
    let service = TelegramService::new(settings.bot_token.clone(), shutdown.clone())?;

    let conversation = Arc::new(Conversation::new(
        Arc::new(service.bot().clone()),
        generator,
        Arc::new(SessionStore::new()),
        settings.conversation.clone(),
    ));
    let dispatcher = Dispatcher::new(conversation);

    let sink: EventSink = {
        let dispatcher = dispatcher.clone();
        Box::new(move |event| dispatcher.dispatch(event))
    };

    let web_config = photostudio_web::Config {
        port: settings.port,
        ..photostudio_web::Config::default()
    };
    let web = async {
        photostudio_web::serve(web_config, wait_for_shutdown(shutdown.clone()))
            .await
            .context("Liveness endpoint failed")
    };

    let result = tokio::try_join!(web, service.run(sink)).map(|_| ());

    if dispatcher.wait_idle(SHUTDOWN_GRACE).await {
        info!("All conversations finished");
    } else {
        warn!(
            active = dispatcher.active(),
            "Shutting down with conversations still in progress"
        );
    }

    result
}

fn status_command(use_colors: bool, args: &RunArgs) {
    println!("Photostudio configuration:");

    match config::resolve_token_from(args.bot_token.clone(), config::load_bot_token) {
        Some((token, source)) => print_success(
            use_colors,
            &format!("Bot token: {} (from {})", mask_secret(&token), source),
        ),
        None => print_error(
            use_colors,
            "Bot token: not set (--bot-token, TG_TOKEN, or `photostudio token set`)",
        ),
    }

    match config::normalize_token(args.gemini_key.clone()) {
        Some(key) => print_success(use_colors, &format!("Gemini key: {}", mask_secret(&key))),
        None => print_error(use_colors, "Gemini key: not set (--gemini-key or GEMINI_KEY)"),
    }

    let gemini = photostudio_gemini::GeminiConfig::new(
        String::new(),
        config::normalize_token(args.gemini_model.clone()),
        config::normalize_token(args.gemini_base_url.clone()),
        args.gemini_timeout,
    );
    print_status(use_colors, &format!("Gemini endpoint: {}", gemini.endpoint()));
    print_status(
        use_colors,
        &format!("Gemini timeout: {}s", gemini.timeout.as_secs()),
    );
    print_status(use_colors, &format!("Flow: {}", args.flow));
    print_status(use_colors, &format!("Liveness port: {}", args.port));

    match config::normalize_token(args.webapp_url.clone()) {
        Some(url) => print_status(use_colors, &format!("Web app: {url}")),
        None => print_status(use_colors, "Web app: not configured"),
    }

    match config::load_styles(args.styles.as_deref()) {
        Ok(catalog) => {
            let source = args
                .styles
                .as_ref()
                .map_or_else(|| "built-in".to_string(), |p| p.display().to_string());
            print_success(
                use_colors,
                &format!("Styles: {} ({})", catalog.len(), source),
            );
        }
        Err(e) => print_error(use_colors, &format!("Styles: {e}")),
    }

    for warning in config::warnings(args) {
        print_warning(use_colors, &warning);
    }
}

fn styles_command(args: &StylesArgs) -> Result<()> {
    let catalog = config::load_styles(args.styles.as_deref())?;
    let width = catalog.iter().map(|s| s.key.len()).max().unwrap_or(0);
    for style in catalog.iter() {
        println!("{:width$}  {}", style.key, style.label, width = width);
        println!("{:width$}  {}", "", style.prompt, width = width);
    }
    Ok(())
}

fn token_set_command(use_colors: bool, args: &SetTokenArgs) -> Result<()> {
    let Some(token) = config::normalize_token(Some(args.token.clone())) else {
        print_error(use_colors, "Token is empty");
        anyhow::bail!("Token is empty");
    };
    config::store_bot_token(&token)?;
    print_success(
        use_colors,
        &format!("Bot token {} stored in the OS keychain", mask_secret(&token)),
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// OUTPUT HELPERS
// ─────────────────────────────────────────────────────────────────────────────

fn print_success(use_colors: bool, msg: &str) {
    if use_colors {
        println!("  \x1b[32m\u{2713}\x1b[0m {}", msg);
    } else {
        println!("  OK: {}", msg);
    }
}

fn print_error(use_colors: bool, msg: &str) {
    if use_colors {
        println!("  \x1b[31m\u{2717}\x1b[0m {}", msg);
    } else {
        println!("  ERROR: {}", msg);
    }
}

fn print_warning(use_colors: bool, msg: &str) {
    if use_colors {
        println!("  \x1b[33m!\x1b[0m {}", msg);
    } else {
        println!("  WARN: {}", msg);
    }
}

fn print_status(use_colors: bool, msg: &str) {
    if use_colors {
        println!("  \x1b[2m-\x1b[0m {}", msg);
    } else {
        println!("  {}", msg);
    }
}
