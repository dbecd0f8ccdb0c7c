//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (nested keys separated by `__`, e.g.
//! `APP_RETRIEVAL__MAX_RESULTS=3`).
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub chunk_target_size: usize,
    pub max_results: usize,
    pub max_supporting_sentences: usize,
    pub direct_answer_sentences: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { chunk_target_size: 900, max_results: 5, max_supporting_sentences: 3, direct_answer_sentences: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { filter: "info".to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.chunk_target_size == 0 {
            return Err(Error::InvalidConfig("retrieval.chunk_target_size must be > 0".into()));
        }
        if r.max_results == 0 {
            return Err(Error::InvalidConfig("retrieval.max_results must be > 0".into()));
        }
        if r.max_supporting_sentences == 0 {
            return Err(Error::InvalidConfig("retrieval.max_supporting_sentences must be > 0".into()));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(env_name)?;
        Ok(config)
    }

    /// Wraps an already assembled figment, skipping file and env discovery.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extracts the typed settings, falling back to defaults for missing keys.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(self.figment.clone())
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "dev" | "development" | "prod" | "production" | "test" | "testing" => {}
            other => tracing::warn!(env = other, "unknown RUST_ENV, only config.toml applies"),
        }
        if let Err(e) = self.settings() {
            tracing::warn!(error = %e, "rejected configuration");
            return Err(e.into());
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(toml: &str) -> Config {
        Config::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = config_from("").settings().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.retrieval.chunk_target_size, 900);
        assert_eq!(settings.retrieval.max_results, 5);
    }

    #[test]
    fn toml_overrides_single_keys() {
        let settings = config_from("[retrieval]\nmax_results = 2\n").settings().unwrap();
        assert_eq!(settings.retrieval.max_results, 2);
        assert_eq!(settings.retrieval.max_supporting_sentences, 3);
        assert_eq!(settings.logging.filter, "info");
    }

    #[test]
    fn zero_target_size_is_rejected() {
        let err = config_from("[retrieval]\nchunk_target_size = 0\n").settings().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn get_reads_arbitrary_keys() {
        let config = config_from("[logging]\nfilter = \"debug\"\n");
        let filter: String = config.get("logging.filter").unwrap();
        assert_eq!(filter, "debug");
        assert!(config.get::<String>("missing.key").is_err());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/data");
        assert_eq!(resolve_with_base(base, "notes/protocol.txt"), PathBuf::from("/data/notes/protocol.txt"));
        assert_eq!(resolve_with_base(base, "/abs/file.txt"), PathBuf::from("/abs/file.txt"));
    }
}
