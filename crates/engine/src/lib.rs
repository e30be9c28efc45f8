//! Resolution facade.
//!
//! Orchestrates prompt → completion → parse → match for products, and
//! validate → match → list products for regions. Product resolution makes
//! at most one completion call, bounded by `EngineConfig::timeout_ms`; any failure of
//! that call drops straight to the local fallback. Neither flow panics, and
//! the only error surfaced is an unusable location signal.

use brewmatch_backend_deepseek::{CompletionBackend, DeepSeekConfig};
use brewmatch_explain::{fallback_reasoning, seasonal_suggestion, weather_suggestion};
use brewmatch_model::{
    CatalogSnapshot, LocationSignal, Product, ProductResolution, RecommendationRequest, Region,
    RegionResolution, SignalError,
};
use brewmatch_prompt::{parse_reply, PromptTemplate, RestrictedPrompt};
use brewmatch_resolve::{
    empty_resolution, fallback_resolution, first_available, ProductMatcher, RegionMatcher,
    DEFAULT_REGION_CODE,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid location signal: {0}")]
    InvalidSignal(#[from] SignalError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{}`: {source}", path.display())]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{}`: {source}", path.display())]
    ParseFile { path: PathBuf, source: toml::de::Error },
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound for the single completion call
    pub timeout_ms: u64,
    /// Region used when a location cannot be placed
    pub default_region_code: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 8_000,
            default_region_code: DEFAULT_REGION_CODE.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Settings file with an `[engine]` and a `[deepseek]` section. Either may
/// be left out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub deepseek: DeepSeekConfig,
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Product resolution stages, in order. `Calling` may jump straight to
/// `Matching` on the local fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Building,
    Calling,
    Parsing,
    Matching,
    Done,
}

/// The resolution engine.
///
/// Holds only immutable tables and configuration, so one instance can be
/// shared across tasks behind an `Arc`.
pub struct Engine<B> {
    backend: B,
    prompt: RestrictedPrompt,
    products: ProductMatcher,
    regions: RegionMatcher,
    config: EngineConfig,
}

impl<B: CompletionBackend> Engine<B> {
    pub fn new(backend: B, config: EngineConfig) -> Self {
        let regions = RegionMatcher::default().with_default_code(config.default_region_code.clone());
        Self {
            backend,
            prompt: RestrictedPrompt,
            products: ProductMatcher::default(),
            regions,
            config,
        }
    }

    /// Swap the region matcher, e.g. for one with its own province table or
    /// a geocoder. The configured default region code still applies.
    pub fn with_region_matcher(mut self, matcher: RegionMatcher) -> Self {
        self.regions = matcher.with_default_code(self.config.default_region_code.clone());
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Recommend exactly one product from `candidates`.
    ///
    /// Unavailable products are ignored. When none are available the
    /// result is the empty placeholder and no completion call is made.
    pub async fn resolve_product(
        &self,
        request: &RecommendationRequest,
        candidates: &[Product],
    ) -> ProductResolution {
        let available: Vec<Product> = candidates.iter().filter(|p| p.available).cloned().collect();
        if available.is_empty() {
            tracing::warn!(stage = ?Stage::Done, "No available products, skipping completion");
            return empty_resolution();
        }

        tracing::debug!(stage = ?Stage::Building, candidates = available.len(), "Building prompt");
        let prompt = self.prompt.render(request, &available);

        tracing::debug!(stage = ?Stage::Calling, backend = self.backend.name(), "Requesting completion");
        let result = match self.complete(&prompt).await {
            Some(text) => {
                tracing::debug!(stage = ?Stage::Parsing, "Parsing reply");
                let reply = parse_reply(&text);

                tracing::debug!(stage = ?Stage::Matching, requested = %reply.name, "Matching reply");
                self.products.resolve(&reply, &available)
            }
            None => {
                tracing::debug!(stage = ?Stage::Matching, "Using local fallback");
                self.local_fallback(request, &available)
            }
        };

        tracing::info!(
            stage = ?Stage::Done,
            tier = result.match_tier.label(),
            product = %result.chosen_name,
            "Resolved product"
        );
        result
    }

    /// The single completion attempt. `None` covers timeout, backend errors
    /// and blank replies alike.
    async fn complete(&self, prompt: &str) -> Option<String> {
        match tokio::time::timeout(self.config.timeout(), self.backend.complete(prompt)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
            Ok(Ok(_)) => {
                tracing::warn!(backend = self.backend.name(), "Completion returned no text");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "Completion failed");
                None
            }
            Err(_) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    timeout_ms = self.config.timeout_ms,
                    "Completion timed out"
                );
                None
            }
        }
    }

    /// Deterministic local recommendation, used when the completion
    /// service gives nothing usable.
    pub fn local_fallback(&self, request: &RecommendationRequest, candidates: &[Product]) -> ProductResolution {
        match first_available(candidates) {
            Some(product) => fallback_resolution(product, fallback_reasoning(request)),
            None => empty_resolution(),
        }
    }

    /// Place a location signal into one of `candidates`.
    ///
    /// Fails only when the signal is unusable. With no active region the
    /// result is unresolved rather than an error.
    pub fn resolve_region(
        &self,
        signal: &LocationSignal,
        candidates: &[Region],
    ) -> Result<RegionResolution, ResolveError> {
        signal.validate()?;
        Ok(self.resolve_region_in_month(signal, candidates, chrono::Local::now().month()))
    }

    /// As `resolve_region`, with the calendar month for the seasonal hint
    /// given explicitly. The signal must already be usable.
    pub fn resolve_region_in_month(
        &self,
        signal: &LocationSignal,
        candidates: &[Region],
        month: u32,
    ) -> RegionResolution {
        let matched = self.regions.resolve(signal, candidates);

        tracing::info!(
            region = matched.region.as_ref().map(|r| r.code.as_str()).unwrap_or("none"),
            match_type = matched.match_type.label(),
            "Resolved region"
        );

        RegionResolution {
            weather_suggestion: weather_suggestion(matched.detected_province.as_deref()),
            seasonal_suggestion: seasonal_suggestion(month),
            region: matched.region,
            detected_province: matched.detected_province,
            detected_city: signal.city.clone(),
            match_type: matched.match_type,
            featured_products: Vec::new(),
            all_products: Vec::new(),
        }
    }

    /// Resolve a signal against the catalog's active regions and list the
    /// resolved region's available products.
    pub fn recommend_region(
        &self,
        signal: &LocationSignal,
        catalog: &CatalogSnapshot,
    ) -> Result<RegionResolution, ResolveError> {
        let mut resolution = self.resolve_region(signal, &catalog.active_regions())?;

        let all = resolution
            .region_code()
            .map(|code| catalog.regional_products(code))
            .unwrap_or_default();
        resolution.featured_products = all.iter().filter(|rp| rp.is_featured).cloned().collect();
        resolution.all_products = all;

        tracing::debug!(
            featured = resolution.featured_products.len(),
            listed = resolution.all_products.len(),
            "Attached regional products"
        );
        Ok(resolution)
    }

    /// Regions for an exactly listed province.
    pub fn regions_for_province(&self, province: &str, candidates: &[Region]) -> Vec<Region> {
        self.regions.regions_for_province(province, candidates)
    }
}
