//! Service settings.
//!
//! Loaded from the JSON file named by `INSOLVEX_CONFIG` when set, otherwise
//! defaults; a few environment variables override individual fields. The API
//! key is read from `OPENAI_API_KEY` by the vision client and never lives here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::prompt;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Chat-completions endpoint.
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// `low`, `high` or `auto`.
    pub image_detail: String,
    pub bind_addr: String,
    pub body_limit_mb: usize,
    /// File replacing the built-in system prompt.
    pub prompt_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 2200,
            image_detail: "high".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            body_limit_mb: 50,
            prompt_path: None,
        }
    }
}

impl Settings {
    /// Settings from `INSOLVEX_CONFIG` (if set) plus environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match std::env::var_os("INSOLVEX_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("INSOLVEX_MODEL") {
            self.model = model;
        }
        if let Ok(url) = std::env::var("INSOLVEX_API_URL") {
            self.api_url = url;
        }
        if let Ok(addr) = std::env::var("INSOLVEX_BIND_ADDR") {
            self.bind_addr = addr;
        }
    }

    /// The configured prompt file, or the built-in prompt.
    pub fn system_prompt(&self) -> Result<String> {
        match &self.prompt_path {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read prompt: {:?}", path)),
            None => Ok(prompt::system_prompt()),
        }
    }
}
