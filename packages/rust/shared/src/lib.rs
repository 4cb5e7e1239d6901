//! Shared types, error model, and configuration for PageInsights.
//!
//! This crate is the foundation depended on by all other PageInsights crates.
//! It provides:
//! - [`PageInsightsError`]: the unified error type
//! - Domain types ([`Page`], [`Post`], [`PageProfile`])
//! - Configuration ([`AppConfig`], [`Secrets`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DatabaseConfig, GeminiConfig, RendererConfig, Secrets, ServerConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, load_dotenv, resolve_secrets,
    resolve_secrets_with,
};
pub use error::{PageInsightsError, Result};
pub use types::{MAX_POSTS, Page, PageProfile, Post};
