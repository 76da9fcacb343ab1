//! Configuration loading, validation, and management for attune.
//!
//! Loads configuration from `~/.attune/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The root configuration structure.
///
/// Maps directly to `~/.attune/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ranking strategies
    #[serde(default)]
    pub attention: AttentionConfig,

    /// Where memories, sessions, and personas live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Assembly pipeline tunables
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Query/memory embedding provider
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// A ranking strategy name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingStrategy {
    Passthrough,
    Lexical,
    Vectorized,
}

impl RankingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::Lexical => "lexical",
            Self::Vectorized => "vectorized",
        }
    }
}

impl fmt::Display for RankingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "passthrough" => Ok(Self::Passthrough),
            "lexical" => Ok(Self::Lexical),
            "vectorized" => Ok(Self::Vectorized),
            other => Err(ConfigError::ValidationError(format!(
                "unknown ranking strategy '{other}' (expected passthrough, lexical, or vectorized)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionConfig {
    /// Strategy for semantic memories
    #[serde(default = "default_semantic_strategy")]
    pub semantic: RankingStrategy,

    /// Strategy for episodic memories
    #[serde(default = "default_episodic_strategy")]
    pub episodic: RankingStrategy,
}

fn default_semantic_strategy() -> RankingStrategy {
    RankingStrategy::Lexical
}
fn default_episodic_strategy() -> RankingStrategy {
    RankingStrategy::Passthrough
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            semantic: default_semantic_strategy(),
            episodic: default_episodic_strategy(),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON files in the data directory
    #[default]
    File,
    /// A SQLite database in the data directory
    Sqlite,
    /// Process memory; nothing survives a restart
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" | "json" => Ok(Self::File),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::ValidationError(format!(
                "unknown storage backend '{other}' (expected file, sqlite, or memory)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Data directory (default: `<config dir>/data`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Persona catalog (default: `<data dir>/personas.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personas_file: Option<PathBuf>,

    /// Root of `<domain>/<key>.json` task payloads; none disables task data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Semantic candidates fetched before ranking
    #[serde(default = "default_semantic_candidates")]
    pub semantic_candidates: usize,

    /// Episodic candidates fetched before ranking
    #[serde(default = "default_episodic_candidates")]
    pub episodic_candidates: usize,

    /// Timeout for each collaborator call
    #[serde(default = "default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,

    /// Domain for input no persona claims
    #[serde(default = "default_domain")]
    pub default_domain: String,
}

fn default_semantic_candidates() -> usize {
    3
}
fn default_episodic_candidates() -> usize {
    5
}
fn default_collaborator_timeout_ms() -> u64 {
    10_000
}
fn default_domain() -> String {
    "default".into()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            semantic_candidates: default_semantic_candidates(),
            episodic_candidates: default_episodic_candidates(),
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
            default_domain: default_domain(),
        }
    }
}

/// Embedding provider selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    None,
    /// Feature-hashing bag of words
    Hash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_dimensions() -> usize {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            dimensions: default_dimensions(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (`<config dir>/config.toml`).
    ///
    /// Environment variables override file values:
    /// - `ATTUNE_STORAGE_BACKEND`
    /// - `ATTUNE_DATA_DIR`
    /// - `ATTUNE_SEMANTIC_RANKING`
    /// - `ATTUNE_EPISODIC_RANKING`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Load from `path` if given, else from the default path, then apply
    /// environment overrides and validate.
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_lookup(path, |key| std::env::var(key).ok())
    }

    /// [`AppConfig::load_with`] with an explicit variable lookup. Overrides
    /// are applied before validation, so they can repair a file value.
    pub fn load_with_lookup<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(path.unwrap_or(&default_path))?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a specific file path. Not validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`AppConfig::load`]).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("ATTUNE_STORAGE_BACKEND") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(dir) = lookup("ATTUNE_DATA_DIR").filter(|d| !d.is_empty()) {
            self.storage.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(strategy) = lookup("ATTUNE_SEMANTIC_RANKING") {
            self.attention.semantic = strategy.parse()?;
        }
        if let Some(strategy) = lookup("ATTUNE_EPISODIC_RANKING") {
            self.attention.episodic = strategy.parse()?;
        }
        Ok(())
    }

    /// Get the configuration directory path (`$ATTUNE_HOME` or `~/.attune`).
    pub fn config_dir() -> PathBuf {
        match std::env::var("ATTUNE_HOME") {
            Ok(home) if !home.is_empty() => PathBuf::from(home),
            _ => dirs_home().join(".attune"),
        }
    }

    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("data"))
    }

    /// Resolved persona catalog path.
    pub fn personas_path(&self) -> PathBuf {
        self.storage
            .personas_file
            .clone()
            .unwrap_or_else(|| self.data_dir().join("personas.json"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.semantic_candidates == 0 || self.pipeline.episodic_candidates == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline candidate counts must be at least 1".into(),
            ));
        }

        if self.pipeline.collaborator_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.collaborator_timeout_ms must be > 0".into(),
            ));
        }

        if self.pipeline.default_domain.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "pipeline.default_domain must not be empty".into(),
            ));
        }

        if self.embedding.dimensions == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimensions must be > 0".into(),
            ));
        }

        let wants_vectors = self.attention.semantic == RankingStrategy::Vectorized
            || self.attention.episodic == RankingStrategy::Vectorized;
        if wants_vectors && self.embedding.provider == EmbeddingProvider::None {
            return Err(ConfigError::ValidationError(
                "vectorized ranking requires an embedding provider (set embedding.provider)".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.attention.semantic, RankingStrategy::Lexical);
        assert_eq!(config.attention.episodic, RankingStrategy::Passthrough);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.pipeline.semantic_candidates, 3);
        assert_eq!(config.pipeline.episodic_candidates, 5);
        assert_eq!(config.pipeline.default_domain, "default");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[attention]
semantic = "passthrough"

[storage]
backend = "sqlite"
data_dir = "/var/lib/attune"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.attention.semantic, RankingStrategy::Passthrough);
        assert_eq!(config.attention.episodic, RankingStrategy::Passthrough);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.data_dir(), PathBuf::from("/var/lib/attune"));
        assert_eq!(
            config.personas_path(),
            PathBuf::from("/var/lib/attune/personas.json")
        );
        assert_eq!(config.pipeline.collaborator_timeout_ms, 10_000);
    }

    #[test]
    fn unknown_strategy_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[attention]\nsemantic = \"psychic\"\n").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn vectorized_requires_embedding_provider() {
        let mut config = AppConfig::default();
        config.attention.semantic = RankingStrategy::Vectorized;
        assert!(config.validate().is_err());

        config.embedding.provider = EmbeddingProvider::Hash;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_values_rejected() {
        let mut config = AppConfig::default();
        config.pipeline.semantic_candidates = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.pipeline.collaborator_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.embedding.dimensions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert_eq!(result.unwrap(), AppConfig::default());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[
                ("ATTUNE_STORAGE_BACKEND", "memory"),
                ("ATTUNE_DATA_DIR", "/tmp/attune-data"),
                ("ATTUNE_SEMANTIC_RANKING", "Passthrough"),
                ("ATTUNE_EPISODIC_RANKING", "lexical"),
            ]))
            .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/attune-data"));
        assert_eq!(config.attention.semantic, RankingStrategy::Passthrough);
        assert_eq!(config.attention.episodic, RankingStrategy::Lexical);
    }

    #[test]
    fn env_override_repairs_invalid_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[attention]\nsemantic = \"vectorized\"\n").unwrap();

        let err = AppConfig::load_with_lookup(Some(&path), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let config =
            AppConfig::load_with_lookup(Some(&path), env(&[("ATTUNE_SEMANTIC_RANKING", "lexical")]))
                .unwrap();
        assert_eq!(config.attention.semantic, RankingStrategy::Lexical);
    }

    #[test]
    fn bad_env_override_is_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(env(&[("ATTUNE_STORAGE_BACKEND", "postgres")]))
            .unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("[attention]"));
        assert!(toml_str.contains("semantic = \"lexical\""));
        assert!(toml_str.contains("backend = \"file\""));
        assert!(toml_str.contains("collaborator_timeout_ms = 10000"));
    }
}
