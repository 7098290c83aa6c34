#![forbid(unsafe_code)]

use anyhow::{Context, Result, anyhow};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::sentiment::LabelScheme;

pub const DEFAULT_ENV_PATH: &str = ".env";
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TUBESTATS_PORT: u16 = 8080;
pub const DEFAULT_TUBESTATS_HOST: &str = "127.0.0.1";

/// Everything the binaries need to reach YouTube and the optional sentiment
/// service.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub api_key: String,
    pub api_base_url: String,
    pub http_timeout: Duration,
    pub sentiment_url: Option<String>,
    pub sentiment_token: Option<String>,
    /// From `SENTIMENT_LABEL_CLASSES` (2 or 3).
    pub sentiment_label_scheme: LabelScheme,
    pub tubestats_port: u16,
    pub tubestats_host: String,
}

pub fn load_runtime_settings() -> Result<RuntimeSettings> {
    resolve_runtime_settings(RuntimeOverrides::default())
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub tubestats_port: Option<u16>,
    pub tubestats_host: Option<String>,
    pub env_path: Option<PathBuf>,
}

pub fn resolve_runtime_settings(overrides: RuntimeOverrides) -> Result<RuntimeSettings> {
    let env_path = overrides
        .env_path
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_ENV_PATH));
    let file_vars = read_env_file(env_path)?;
    build_runtime_settings_with_overrides(&file_vars, env_var_string, overrides)
}

#[cfg(test)]
fn build_runtime_settings(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<RuntimeSettings> {
    build_runtime_settings_with_overrides(file_vars, env_lookup, RuntimeOverrides::default())
}

fn build_runtime_settings_with_overrides(
    file_vars: &HashMap<String, String>,
    env_lookup: impl Fn(&str) -> Option<String>,
    overrides: RuntimeOverrides,
) -> Result<RuntimeSettings> {
    let api_key = non_blank(overrides.api_key)
        .or_else(|| lookup_value("YOUTUBE_API_KEY", file_vars, &env_lookup))
        .ok_or_else(|| anyhow!("YOUTUBE_API_KEY not set"))?;
    let api_base_url = non_blank(overrides.api_base_url)
        .or_else(|| lookup_value("YOUTUBE_API_BASE_URL", file_vars, &env_lookup))
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
    let http_timeout_secs = overrides
        .http_timeout_secs
        .or_else(|| {
            lookup_value("TUBESTATS_HTTP_TIMEOUT_SECS", file_vars, &env_lookup)
                .and_then(|value| value.parse::<u64>().ok())
        })
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    let sentiment_url = lookup_value("SENTIMENT_API_URL", file_vars, &env_lookup);
    let sentiment_token = lookup_value("SENTIMENT_API_TOKEN", file_vars, &env_lookup);
    let sentiment_label_scheme = lookup_value("SENTIMENT_LABEL_CLASSES", file_vars, &env_lookup)
        .and_then(|value| value.parse::<u8>().ok())
        .and_then(LabelScheme::from_class_count)
        .unwrap_or_default();
    let tubestats_port = overrides
        .tubestats_port
        .or_else(|| {
            lookup_value("TUBESTATS_PORT", file_vars, &env_lookup)
                .and_then(|value| value.parse::<u16>().ok())
        })
        .unwrap_or(DEFAULT_TUBESTATS_PORT);
    let tubestats_host = non_blank(overrides.tubestats_host)
        .or_else(|| lookup_value("TUBESTATS_HOST", file_vars, &env_lookup))
        .unwrap_or_else(|| DEFAULT_TUBESTATS_HOST.to_string());

    Ok(RuntimeSettings {
        api_key,
        api_base_url,
        http_timeout: Duration::from_secs(http_timeout_secs),
        sentiment_url,
        sentiment_token,
        sentiment_label_scheme,
        tubestats_port,
        tubestats_host,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_var_string(key: &str) -> Option<String> {
    non_blank(env::var(key).ok())
}

fn lookup_value(
    key: &str,
    file_vars: &HashMap<String, String>,
    env_lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env_lookup(key).or_else(|| non_blank(file_vars.get(key).cloned()))
}

pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();
    if !path.exists() {
        return Ok(vars);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let Some((key, value_raw)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value_raw.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|value| value.strip_suffix('"'))
            .or_else(|| {
                value
                    .strip_prefix('\'')
                    .and_then(|value| value.strip_suffix('\''))
            })
            .unwrap_or(value);
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}
