//! Config file loading and merging with command-line flags
//!
//! Precedence: flags, then the config file, then built-in defaults. The
//! API token comes from the file or the environment; a remote endpoint
//! without one is a startup error.

use crate::cli::RunArgs;
use duel_error::{Error, ErrorKind, Result};
use duel_llm::provider::{token_from_env, TOKEN_ENV_VARS};
use duel_llm::ProviderConfig;
use duel_sim::SimulationConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub simulation: SimulationConfig,
    pub provider: ProviderSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSection {
    pub local: bool,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub stream: Option<bool>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    /// Extra HTTP headers sent with every request (e.g. `X-Use-Cache`)
    pub headers: HashMap<String, String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::from(e)
                .with_operation("config::load")
                .with_context("path", path.display().to_string())
        })?;
        Self::parse(&text).map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            Error::new(ErrorKind::ConfigInvalid, e.message().to_string())
                .with_operation("config::parse")
                .set_source(e)
        })
    }
}

/// Simulation settings with flags applied over the file
pub fn simulation_config(file: &FileConfig, args: &RunArgs) -> SimulationConfig {
    let mut config = file.simulation.clone();
    if let Some(max_rounds) = args.max_rounds {
        config.max_rounds = max_rounds;
    }
    if let Some(threshold) = args.pass_threshold {
        config.pass_threshold = threshold;
    }
    if let Some(round) = args.coaching_starts_at {
        config.coaching_starts_at = round;
    }
    config
}

/// Provider settings with flags applied over the file.
///
/// `env` looks up environment variables; it is a parameter so the token
/// rules can be checked without touching the process environment.
pub fn provider_config<F>(file: &FileConfig, args: &RunArgs, env: F) -> Result<ProviderConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let section = &file.provider;
    let local = args.local || section.local;

    let mut config = if local {
        let base_url = args
            .base_url
            .clone()
            .or_else(|| section.base_url.clone())
            .ok_or_else(|| {
                Error::config_invalid("base_url", "a local provider needs --base-url or provider.base_url")
                    .with_operation("config::provider")
            })?;
        let model = args
            .model
            .clone()
            .or_else(|| section.model.clone())
            .unwrap_or_else(|| duel_llm::provider::DEFAULT_MODEL.to_string());
        let mut config = ProviderConfig::local(base_url, model);
        config.api_key = section.api_key.clone().or_else(|| token_from_env(&env));
        config
    } else {
        let token = section
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| token_from_env(&env))
            .ok_or_else(|| Error::credential_missing(TOKEN_ENV_VARS).with_operation("config::provider"))?;
        let mut config = ProviderConfig::hugging_face(token);
        if let Some(base_url) = args.base_url.clone().or_else(|| section.base_url.clone()) {
            config = config.with_base_url(base_url);
        }
        if let Some(model) = args.model.clone().or_else(|| section.model.clone()) {
            config = config.with_model(model);
        }
        config
    };

    if let Some(stream) = section.stream {
        config = config.with_streaming(stream);
    }
    if args.no_stream {
        config = config.with_streaming(false);
    }
    if let Some(max) = args.max_tokens.or(section.max_tokens) {
        config = config.with_max_tokens(max);
    }
    if let Some(temp) = section.temperature {
        config = config.with_temperature(temp);
    }
    if let Some(secs) = args.timeout.or(section.timeout_secs) {
        config = config.with_timeout(secs);
    }
    for (name, value) in &section.headers {
        config = config.with_header(name, value);
    }

    Ok(config)
}
