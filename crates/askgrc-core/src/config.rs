//! Configuration loading and the typed engine settings.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env
//! vars. All tuning constants (fusion weight, rerank boosts, recency
//! window, budgets, timeouts, TTL) are named fields here rather than
//! literals at the call sites, so tests can exercise boundary behavior.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Results kept after fusion.
    pub top_k: usize,
    /// Minimum final score a fused result must reach.
    pub threshold: f32,
    /// Weight of the vector score in the combined score; lexical gets 1-α.
    pub alpha: f32,
    /// Each source is asked for ceil(top_k × this) before fusion.
    pub overfetch_factor: f32,
    pub timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 10, threshold: 0.5, alpha: 0.7, overfetch_factor: 1.5, timeout_ms: 5_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    pub enabled: bool,
    /// Maximum additive boost for query keywords found in the chunk.
    pub keyword_boost_max: f32,
    /// Flat additive boost for chunks created within the recency window.
    pub recency_boost: f32,
    pub recency_window_days: i64,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self { enabled: true, keyword_boost_max: 0.1, recency_boost: 0.05, recency_window_days: 30 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Soft character budget for the assembled context; hard only between
    /// chunks (the first chunk is always admitted whole).
    pub max_context_length: usize,
    /// Excerpt length used for answer source citations.
    pub excerpt_length: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { max_context_length: 8_000, excerpt_length: 200 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    /// Per-provider attempt timeout within the fallback chain.
    pub timeout_ms: u64,
    /// Text preview length for the extractive fallback answer.
    pub fallback_preview_length: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { max_tokens: 1_000, temperature: 0.3, timeout_ms: 30_000, fallback_preview_length: 500 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 3_600, sweep_interval_secs: 3_600 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retrieval: RetrievalConfig,
    pub rerank: RerankConfig,
    pub context: ContextConfig,
    pub generation: GenerationConfig,
    pub cache: CacheConfig,
}

impl EngineConfig {
    /// Merge defaults, `config.toml`, the `RUST_ENV`-specific file and
    /// `APP_*` env vars, then extract the `engine` section.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`load`](Self::load), with the config files resolved
    /// against `dir` instead of the working directory.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::default("engine", EngineConfig::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config: EngineConfig = figment
            .extract_inner("engine")
            .map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.retrieval.alpha) {
            return Err(EngineError::Config(format!(
                "retrieval.alpha must be in [0,1], got {}",
                self.retrieval.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.retrieval.threshold) {
            return Err(EngineError::Config(format!(
                "retrieval.threshold must be in [0,1], got {}",
                self.retrieval.threshold
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(EngineError::Config("retrieval.top_k must be at least 1".to_string()));
        }
        if self.retrieval.overfetch_factor < 1.0 {
            return Err(EngineError::Config(format!(
                "retrieval.overfetch_factor must be >= 1.0, got {}",
                self.retrieval.overfetch_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::default();
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg.retrieval.top_k, 10);
        assert!((cfg.retrieval.alpha - 0.7).abs() < f32::EPSILON);
        assert_eq!(cfg.cache.ttl_secs, 3_600);
    }

    #[test]
    fn alpha_out_of_range_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.retrieval.alpha = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_top_k_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.retrieval.top_k = 0;
        assert!(cfg.validate().is_err());
    }
}
