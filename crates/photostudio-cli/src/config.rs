//! Runtime configuration for the `photostudio` binary.
//!
//! Every option comes from a flag or its environment variable (after `.env`
//! has been loaded). The bot token additionally falls back to the OS keychain.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use photostudio_core::{ConversationSettings, FlowMode, StyleCatalog, StyleCatalogError};
use photostudio_gemini::GeminiConfig;
use photostudio_proto::mask_secret;
use photostudio_web::DEFAULT_PORT;
use thiserror::Error;

/// Keychain service name holding the bot token.
pub const KEYCHAIN_SERVICE: &str = "photostudio";
/// Keychain user name holding the bot token.
pub const KEYCHAIN_USER: &str = "telegram-bot-token";

/// Options shared by `run` and `status`.
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Telegram bot token (falls back to the OS keychain)
    #[arg(long, env = "TG_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_KEY", hide_env_values = true)]
    pub gemini_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL")]
    pub gemini_base_url: Option<String>,

    /// Gemini request timeout in seconds
    #[arg(long, env = "GEMINI_TIMEOUT_SECONDS")]
    pub gemini_timeout: Option<u64>,

    /// Port of the liveness endpoint
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Mini App URL offered in the welcome message
    #[arg(long, env = "WEBAPP_URL")]
    pub webapp_url: Option<String>,

    /// Photoshoot flow: face-transfer or style-menu
    #[arg(long, env = "PHOTOSTUDIO_FLOW", default_value = "face-transfer")]
    pub flow: FlowMode,

    /// YAML file replacing the built-in style catalog
    #[arg(long, env = "PHOTOSTUDIO_STYLES")]
    pub styles: Option<PathBuf>,
}

/// Configuration problems that stop the bot before it starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Telegram bot token not configured: pass --bot-token, set TG_TOKEN, or run `photostudio token set`"
    )]
    MissingBotToken,

    #[error("Gemini API key not configured: pass --gemini-key or set GEMINI_KEY")]
    MissingGeminiKey,

    #[error(transparent)]
    Styles(#[from] StyleCatalogError),
}

/// Where the bot token was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// `--bot-token` or `TG_TOKEN`
    Argument,
    /// OS keychain
    Keychain,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Argument => f.write_str("--bot-token / TG_TOKEN"),
            TokenSource::Keychain => f.write_str("keychain"),
        }
    }
}

/// Fully resolved settings for a bot run.
#[derive(Clone)]
pub struct Settings {
    pub bot_token: String,
    pub token_source: TokenSource,
    pub gemini: GeminiConfig,
    pub port: u16,
    pub conversation: ConversationSettings,
}

impl Settings {
    /// Resolves `args`, consulting `keychain` only when no token was given.
    pub fn resolve(
        args: &RunArgs,
        keychain: impl FnOnce() -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let (bot_token, token_source) = resolve_token_from(args.bot_token.clone(), keychain)
            .ok_or(ConfigError::MissingBotToken)?;
        let gemini_key =
            normalize_token(args.gemini_key.clone()).ok_or(ConfigError::MissingGeminiKey)?;

        let gemini = GeminiConfig::new(
            gemini_key,
            normalize_token(args.gemini_model.clone()),
            normalize_token(args.gemini_base_url.clone()),
            args.gemini_timeout,
        );

        Ok(Self {
            bot_token,
            token_source,
            gemini,
            port: args.port,
            conversation: ConversationSettings {
                flow: args.flow,
                styles: load_styles(args.styles.as_deref())?,
                web_app_url: normalize_token(args.webapp_url.clone()),
            },
        })
    }

    pub fn bot_token_masked(&self) -> String {
        mask_secret(&self.bot_token)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("bot_token", &self.bot_token_masked())
            .field("token_source", &self.token_source)
            .field("gemini", &self.gemini)
            .field("port", &self.port)
            .field("conversation", &self.conversation)
            .finish()
    }
}

/// Settings that are accepted but will not behave as the user likely expects.
pub fn warnings(args: &RunArgs) -> Vec<String> {
    let mut warnings = Vec::new();
    if args.styles.is_some() && args.flow == FlowMode::FaceTransfer {
        warnings.push(format!(
            "Styles file is only used by the style-menu flow (current flow: {})",
            args.flow
        ));
    }
    if let Some(url) = normalize_token(args.webapp_url.clone())
        && !url.starts_with("https://")
    {
        warnings.push(format!(
            "Web app URL {url} is not https://; Telegram will drop the button"
        ));
    }
    warnings
}

/// Loads the catalog at `path`, or the built-in one.
pub fn load_styles(path: Option<&Path>) -> Result<StyleCatalog, StyleCatalogError> {
    match path {
        Some(path) => StyleCatalog::load(path),
        None => Ok(StyleCatalog::builtin()),
    }
}

pub fn normalize_token(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Picks the argument token, then the keychain one.
pub fn resolve_token_from(
    argument: Option<String>,
    keychain: impl FnOnce() -> Option<String>,
) -> Option<(String, TokenSource)> {
    if let Some(token) = normalize_token(argument) {
        return Some((token, TokenSource::Argument));
    }
    normalize_token(keychain()).map(|token| (token, TokenSource::Keychain))
}

/// Store bot token in OS keychain.
pub fn store_bot_token(token: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_USER)
        .context("Failed to create keychain entry")?;
    if let Err(err) = entry.set_password(token) {
        // Some keychains refuse overwrites; try delete + set as a fallback.
        if entry.delete_credential().is_ok() {
            entry
                .set_password(token)
                .context("Failed to store token in keychain after deleting existing entry")?;
        } else {
            return Err(anyhow::anyhow!(
                "Failed to store token in keychain: {}",
                err
            ));
        }
    }
    Ok(())
}

/// Load bot token from OS keychain.
pub fn load_bot_token() -> Option<String> {
    keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_USER)
        .ok()
        .and_then(|e| e.get_password().ok())
}
