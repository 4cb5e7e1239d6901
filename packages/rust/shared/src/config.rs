//! Application configuration for PageInsights.
//!
//! User config lives at `~/.pageinsights/pageinsights.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets never live in the file: it only names the env vars holding them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PageInsightsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pageinsights.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pageinsights";

// ---------------------------------------------------------------------------
// Config structs (matching pageinsights.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Page store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Gemini summarization settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Headless browser settings.
    #[serde(default)]
    pub renderer: RendererConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Name of the env var holding the connection string.
    #[serde(default = "default_database_url_env")]
    pub url_env: String,

    /// Name of the env var holding the auth token for remote databases.
    #[serde(default = "default_database_auth_token_env")]
    pub auth_token_env: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url_env: default_database_url_env(),
            auth_token_env: default_database_auth_token_env(),
        }
    }
}

fn default_database_url_env() -> String {
    "DATABASE_URL".into()
}
fn default_database_auth_token_env() -> String {
    "DATABASE_AUTH_TOKEN".into()
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for summaries.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Request deadline for one summary call.
    #[serde(default = "default_gemini_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_gemini_base_url(),
            timeout_secs: default_gemini_timeout(),
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_gemini_timeout() -> u64 {
    60
}

/// `[renderer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Deadline for one render (launch, navigation, settle and capture).
    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: u64,

    /// Maximum browser sessions alive at once.
    #[serde(default = "default_max_concurrent_renders")]
    pub max_concurrent_renders: u32,

    /// Explicit Chrome/Chromium binary. Auto-detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_executable: Option<String>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            render_timeout_secs: default_render_timeout(),
            max_concurrent_renders: default_max_concurrent_renders(),
            chrome_executable: None,
        }
    }
}

fn default_render_timeout() -> u64 {
    30
}
fn default_max_concurrent_renders() -> u32 {
    2
}

// ---------------------------------------------------------------------------
// Secrets (resolved from the environment at startup)
// ---------------------------------------------------------------------------

/// Connection string and credential required before the service can start.
#[derive(Clone)]
pub struct Secrets {
    /// Database connection string (file path, `:memory:`, or remote URL).
    pub database_url: String,
    /// Auth token for remote databases, if one is set.
    pub database_auth_token: Option<String>,
    /// Generative-service API key.
    pub gemini_api_key: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("database_url", &self.database_url)
            .field("database_auth_token", &self.database_auth_token.as_ref().map(|_| "***"))
            .field("gemini_api_key", &"***")
            .finish()
    }
}

/// Resolve [`Secrets`] from the process environment.
pub fn resolve_secrets(config: &AppConfig) -> Result<Secrets> {
    resolve_secrets_with(config, |name| std::env::var(name).ok())
}

/// Resolve [`Secrets`] through an arbitrary lookup (the environment in production).
pub fn resolve_secrets_with(
    config: &AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Secrets> {
    let required = |name: &str| match lookup(name) {
        Some(val) if !val.is_empty() => Ok(val),
        _ => Err(PageInsightsError::config(format!(
            "{name} is not set. Export it or add it to a .env file."
        ))),
    };

    Ok(Secrets {
        database_url: required(&config.database.url_env)?,
        database_auth_token: lookup(&config.database.auth_token_env).filter(|v| !v.is_empty()),
        gemini_api_key: required(&config.gemini.api_key_env)?,
    })
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load a `.env` file from the working directory, if there is one.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(?path, "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env"),
    }
}

/// Get the path to the config directory (`~/.pageinsights/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PageInsightsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pageinsights/pageinsights.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PageInsightsError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PageInsightsError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PageInsightsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PageInsightsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PageInsightsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("GEMINI_API_KEY"));
        assert!(toml_str.contains("DATABASE_URL"));
        assert!(toml_str.contains("gemini-2.5-flash"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[server]
port = 9000

[renderer]
max_concurrent_renders = 4
chrome_executable = "/usr/bin/chromium"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.renderer.max_concurrent_renders, 4);
        assert_eq!(config.renderer.render_timeout_secs, 30);
        assert_eq!(
            config.renderer.chrome_executable.as_deref(),
            Some("/usr/bin/chromium")
        );
        assert_eq!(config.gemini.timeout_secs, 60);
    }

    #[test]
    fn secrets_require_both_values() {
        let config = AppConfig::default();
        let env: HashMap<&str, &str> = [("DATABASE_URL", "/tmp/pages.db")].into();
        let err = resolve_secrets_with(&config, |k| env.get(k).map(|v| v.to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY is not set"));

        let env: HashMap<&str, &str> = [("GEMINI_API_KEY", "k"), ("DATABASE_URL", "")].into();
        let err = resolve_secrets_with(&config, |k| env.get(k).map(|v| v.to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL is not set"));
    }

    #[test]
    fn secrets_resolve_with_custom_names() {
        let mut config = AppConfig::default();
        config.gemini.api_key_env = "PI_TEST_KEY".into();
        let env: HashMap<&str, &str> =
            [("PI_TEST_KEY", "secret"), ("DATABASE_URL", ":memory:")].into();
        let secrets =
            resolve_secrets_with(&config, |k| env.get(k).map(|v| v.to_string())).expect("resolve");
        assert_eq!(secrets.gemini_api_key, "secret");
        assert_eq!(secrets.database_url, ":memory:");
        assert!(secrets.database_auth_token.is_none());
        assert!(!format!("{secrets:?}").contains("secret"));
    }
}
