use crate::model::DEFAULT_MODEL;
use std::time::Duration;

/// Default address of a local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Budget for the model-list call used as a health check.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for a full (non-streamed) generation. First runs load the model into
/// memory and are much slower than later ones.
pub const GENERATE_TIMEOUT: Duration = Duration::from_secs(300);

const ENV_BASE_URL: &str = "OLLAMA_BASE_URL";
const ENV_MODEL: &str = "OLLAMA_MODEL";
const ENV_TIMEOUT_SECS: &str = "OLLAMA_TIMEOUT_SECS";

/// Where the inference backend lives and how long to wait for it.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    pub model: String,
    pub health_timeout: Duration,
    pub generate_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            health_timeout: HEALTH_TIMEOUT,
            generate_timeout: GENERATE_TIMEOUT,
        }
    }
}

impl BackendConfig {
    /// Reads `OLLAMA_BASE_URL`, `OLLAMA_MODEL` and `OLLAMA_TIMEOUT_SECS`,
    /// falling back to the defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url.trim().to_string();
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.generate_timeout = Duration::from_secs(secs),
                _ => log::warn!("Ignoring invalid {ENV_TIMEOUT_SECS} value: {secs:?}"),
            }
        }

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_generate_timeout(mut self, timeout: Duration) -> Self {
        self.generate_timeout = timeout;
        self
    }

    /// Joins an API path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BackendConfig::from_lookup(lookup(&[]));
        assert_eq!(config, BackendConfig::default());
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "llava");
        assert_eq!(config.generate_timeout, Duration::from_secs(300));
        assert_eq!(config.health_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_environment_overrides() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("OLLAMA_BASE_URL", "http://gpu-box:11434"),
            ("OLLAMA_MODEL", "moondream"),
            ("OLLAMA_TIMEOUT_SECS", "60"),
        ]));
        assert_eq!(config.base_url, "http://gpu-box:11434");
        assert_eq!(config.model, "moondream");
        assert_eq!(config.generate_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_timeout_keeps_default() {
        for value in ["soon", "0", "-5"] {
            let config = BackendConfig::from_lookup(lookup(&[("OLLAMA_TIMEOUT_SECS", value)]));
            assert_eq!(config.generate_timeout, GENERATE_TIMEOUT);
        }
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = BackendConfig::default().with_base_url("http://127.0.0.1:1234/");
        assert_eq!(config.endpoint("/api/tags"), "http://127.0.0.1:1234/api/tags");
    }
}
