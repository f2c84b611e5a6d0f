//! Environment variable handling.

use std::env;

use crate::types::TelemetryConfig;

/// Environment variable names.
pub mod vars {
    // Layout
    pub const HOOKSCOPE_DIR: &str = "HOOKSCOPE_DIR";

    // Config overrides
    pub const HOOKSCOPE_ENABLED: &str = "HOOKSCOPE_ENABLED";
    pub const HOOKSCOPE_API_URL: &str = "HOOKSCOPE_API_URL";
    pub const HOOKSCOPE_API_KEY: &str = "HOOKSCOPE_API_KEY";
    pub const HOOKSCOPE_WEBHOOK_URL: &str = "HOOKSCOPE_WEBHOOK_URL";
}

/// Typed access to environment variables.
pub struct Environment;

impl Environment {
    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    /// Get a boolean variable.
    pub fn get_bool(var: &str) -> Option<bool> {
        env::var(var).ok().map(|v| parse_bool(&v))
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

/// Overrides layered on top of the file configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub enabled: Option<bool>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub webhook_url: Option<String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self {
            enabled: Environment::get_bool(vars::HOOKSCOPE_ENABLED),
            api_url: Environment::get(vars::HOOKSCOPE_API_URL),
            api_key: Environment::get(vars::HOOKSCOPE_API_KEY),
            webhook_url: Environment::get(vars::HOOKSCOPE_WEBHOOK_URL),
        }
    }

    /// Whether any override is present.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the overrides in place.
    pub fn apply(&self, config: &mut TelemetryConfig) {
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
        if let Some(url) = &self.api_url {
            config.api_url = Some(url.clone());
        }
        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(url) = &self.webhook_url {
            config.webhook_url = Some(url.clone());
        }
    }
}
