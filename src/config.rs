//! Application configuration.
//!
//! Settings are merged in layers: built-in defaults, an optional YAML file
//! (`--config`, `CONFIG_FILE`, or `./config.yaml`), `PARLEY_*` environment
//! variables, then CLI overrides. LLM connection settings come from the
//! conventional `LLM_*` environment variables. Everything is resolved once
//! at startup and passed into components explicitly.

use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::env;

use crate::llm::{LlmSettings, Provider};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Host to bind
    #[arg(long)]
    pub host: Option<String>,

    /// System prompt prepended to every conversation
    #[arg(long)]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Fixed system instruction sent at the head of every prompt.
    pub system_prompt: String,
    /// Optional cap on how many prior messages are sent upstream per turn.
    /// The stored log is never truncated.
    #[serde(default)]
    pub history_window: Option<usize>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("chat.system_prompt", "You are a helpful AI.")?;

        // Config file: explicit path is required to exist, the cwd
        // fallback is not.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::new(path, FileFormat::Yaml));
        } else {
            builder = builder.add_source(File::new("config.yaml", FileFormat::Yaml).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("PARLEY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(prompt) = cli.system_prompt {
            builder = builder.set_override("chat.system_prompt", prompt)?;
        }

        builder.build()?.try_deserialize()
    }
}

/// Load LLM connection settings from the environment.
///
/// # Errors
///
/// Returns a message naming the missing or empty variable.
pub fn load_llm_settings() -> Result<LlmSettings, String> {
    let base_url = env::var("LLM_BASE_URL")
        .map_err(|_| "Missing required env var: LLM_BASE_URL".to_string())?;
    if base_url.trim().is_empty() {
        return Err("LLM_BASE_URL cannot be empty".to_string());
    }

    let model =
        env::var("LLM_MODEL").map_err(|_| "Missing required env var: LLM_MODEL".to_string())?;
    if model.trim().is_empty() {
        return Err("LLM_MODEL cannot be empty".to_string());
    }

    let api_key = env::var("LLM_API_KEY").ok().filter(|s| !s.trim().is_empty());

    // Auto-detect provider from base URL, filling in Azure deployment
    // settings when supplied.
    let mut provider = Provider::detect_from_url(&base_url);
    if let Provider::AzureOpenAI { .. } = &provider
        && let Some(deployment) = env::var("AZURE_DEPLOYMENT_NAME").ok().filter(|s| !s.is_empty())
    {
        provider = Provider::AzureOpenAI {
            deployment_name: deployment,
            api_version: env::var("AZURE_API_VERSION")
                .unwrap_or_else(|_| "2024-08-01-preview".to_string()),
        };
    }

    Ok(LlmSettings {
        base_url,
        api_key,
        model,
        provider,
    })
}
