//! Evaluation CLI for trying resolutions against a catalog snapshot.
//!
//! Usage:
//!     brewmatch-eval recommend --catalog demos/catalog.json --weather 雨天
//!     brewmatch-eval region --catalog demos/catalog.json --province 云南省
//!     brewmatch-eval health

use anyhow::{Context, Result};
use brewmatch_backend_deepseek::{BackendError, CompletionBackend, DeepSeekBackend};
use brewmatch_engine::{Engine, Settings};
use brewmatch_explain::{explain_product, explain_region, summarize_product};
use brewmatch_model::{CatalogSnapshot, LocationSignal, RecommendationRequest};
use brewmatch_resolve::{ProvinceTable, RegionMatcher};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "brewmatch-eval")]
#[command(about = "Resolve drink recommendations and regions against a catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file with [engine] and [deepseek] sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Completion service URL
    #[arg(long)]
    base_url: Option<String>,

    /// Completion service API key
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Completion timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend one product
    Recommend {
        /// Catalog snapshot (JSON)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Taste preference
        #[arg(short, long)]
        preference: Option<String>,

        /// Current weather
        #[arg(short, long)]
        weather: Option<String>,

        /// Current mood
        #[arg(short, long)]
        mood: Option<String>,

        /// Skip the completion service and use the local fallback
        #[arg(long)]
        offline: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Resolve a location to a region
    Region {
        /// Catalog snapshot (JSON)
        #[arg(short, long)]
        catalog: PathBuf,

        #[arg(long)]
        province: Option<String>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        district: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Pin the region code
        #[arg(long)]
        mock: Option<String>,

        /// Map provinces with the catalog's region coverage instead of the
        /// built-in table
        #[arg(long)]
        provinces_from_catalog: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check completion service health
    Health,
}

/// Backend selected on the command line.
enum CliBackend {
    DeepSeek(DeepSeekBackend),
    Offline,
}

impl CompletionBackend for CliBackend {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        match self {
            Self::DeepSeek(backend) => backend.complete(prompt).await,
            Self::Offline => Err(BackendError::Unavailable),
        }
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        match self {
            Self::DeepSeek(backend) => backend.health_check().await,
            Self::Offline => Err(BackendError::Unavailable),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::DeepSeek(backend) => backend.name(),
            Self::Offline => "offline",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("brewmatch_engine=info".parse()?)
                .add_directive("brewmatch_resolve=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.deepseek.base_url = base_url;
    }
    if cli.api_key.is_some() {
        config.deepseek.api_key = cli.api_key;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.engine.timeout_ms = timeout_ms;
    }
    tracing::debug!(
        base_url = %config.deepseek.base_url,
        timeout_ms = config.engine.timeout_ms,
        default_region = %config.engine.default_region_code,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Recommend {
            catalog,
            preference,
            weather,
            mood,
            offline,
            format,
        } => {
            let backend = if offline {
                CliBackend::Offline
            } else {
                CliBackend::DeepSeek(DeepSeekBackend::new(config.deepseek)?)
            };
            let engine = Engine::new(backend, config.engine);
            let request = RecommendationRequest {
                preference,
                weather,
                mood,
            };
            run_recommend(&engine, &catalog, &request, &format).await?;
        }
        Commands::Region {
            catalog,
            province,
            city,
            district,
            lat,
            lon,
            mock,
            provinces_from_catalog,
            format,
        } => {
            let catalog = load_catalog(&catalog)?;
            let mut engine = Engine::new(CliBackend::Offline, config.engine);
            if provinces_from_catalog {
                let matcher = RegionMatcher::new(ProvinceTable::from_regions(&catalog.active_regions()));
                engine = engine.with_region_matcher(matcher);
            }
            let signal = LocationSignal {
                latitude: lat,
                longitude: lon,
                province,
                city,
                district,
                use_mock: mock.is_some(),
                mock_region_code: mock,
            };
            run_region(&engine, &catalog, &signal, &format)?;
        }
        Commands::Health => {
            let backend = DeepSeekBackend::new(config.deepseek)?;
            run_health(&backend).await?;
        }
    }

    Ok(())
}

fn load_catalog(path: &Path) -> Result<CatalogSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing catalog {}", path.display()))
}

async fn run_recommend(
    engine: &Engine<CliBackend>,
    catalog_path: &Path,
    request: &RecommendationRequest,
    format: &str,
) -> Result<()> {
    let catalog = load_catalog(catalog_path)?;
    let products = catalog.available_products();

    let result = engine.resolve_product(request, &products).await;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Backend: {}", engine.backend().name());
    println!("Candidates: {}", products.len());
    println!("---");
    println!("{}", summarize_product(&result));
    println!("   Reasoning: {}", result.reasoning);
    println!("   Description: {}", result.description);

    let explanation = explain_product(&result);
    println!("   {} (confidence {:.1})", explanation.summary, explanation.confidence);
    println!("   {}", explanation.detail);

    if result.is_empty() {
        println!("\nNo products configured in {}", catalog_path.display());
    }

    Ok(())
}

fn run_region(
    engine: &Engine<CliBackend>,
    catalog: &CatalogSnapshot,
    signal: &LocationSignal,
    format: &str,
) -> Result<()> {
    let result = match engine.recommend_region(signal, catalog) {
        Ok(result) => result,
        Err(e) => {
            println!("Provide a valid location: {}", e);
            std::process::exit(2);
        }
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Location: {}", signal.location_description());
    println!("---");
    match &result.region {
        Some(region) => println!("{} ({}) [{}]", region.name, region.code, result.match_type.label()),
        None => println!("NO REGION [{}]", result.match_type.label()),
    }
    if let Some(province) = &result.detected_province {
        println!("   Detected province: {}", province);
    }
    if let Some(province) = signal.province_text() {
        let covering = engine.regions_for_province(province, &catalog.active_regions());
        if let Some(region) = covering.first() {
            println!("   Listed under: {}", region.name);
        }
    }
    println!("   Weather: {}", result.weather_suggestion);
    println!("   Season: {}", result.seasonal_suggestion);

    if !result.featured_products.is_empty() {
        println!("   Featured:");
        for item in &result.featured_products {
            let reason = item.recommend_reason.as_deref().unwrap_or("");
            println!("     - {} {}", item.product.name, reason);
        }
    }
    println!("   Listed products: {}", result.all_products.len());

    let explanation = explain_region(&result);
    println!("   {}", explanation.detail);

    Ok(())
}

async fn run_health(backend: &DeepSeekBackend) -> Result<()> {
    print!("Checking {} backend... ", backend.name());

    match backend.health_check().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewmatch_engine::EngineConfig;
    use brewmatch_model::{MatchTier, RegionMatchType};

    const DEMO_CATALOG: &str = include_str!("../../../demos/catalog.json");
    const DEMO_CONFIG: &str = include_str!("../../../demos/brewmatch.toml");

    #[test]
    fn test_demo_config_parses() {
        let config = Settings::from_toml_str(DEMO_CONFIG).unwrap();
        assert_eq!(config.engine.default_region_code, "southwest");
        assert_eq!(config.deepseek.model, "deepseek-chat");
        assert_eq!(config.deepseek.api_key, None);
    }

    #[tokio::test]
    async fn test_offline_recommendation_on_demo_catalog() {
        let catalog: CatalogSnapshot = serde_json::from_str(DEMO_CATALOG).unwrap();
        let engine = Engine::new(CliBackend::Offline, EngineConfig::default());

        let request = RecommendationRequest::default().with_weather("雨天");
        let result = engine.resolve_product(&request, &catalog.available_products()).await;

        assert_eq!(result.match_tier, MatchTier::Fallback);
        assert_eq!(result.matched_id, Some(1));
        assert_eq!(result.reasoning, "结合「雨天」天气");
    }

    #[test]
    fn test_every_demo_province_resolves_to_its_region() {
        let catalog: CatalogSnapshot = serde_json::from_str(DEMO_CATALOG).unwrap();
        let engine = Engine::new(CliBackend::Offline, EngineConfig::default());
        let regions = catalog.active_regions();

        for region in &regions {
            for province in &region.cover_provinces {
                let result = engine
                    .resolve_region(&LocationSignal::from_province(province.clone()), &regions)
                    .unwrap();
                assert_eq!(result.region_code(), Some(region.code.as_str()), "{}", province);
                assert_eq!(result.match_type, RegionMatchType::Exact);
            }
        }
    }

    #[test]
    fn test_demo_region_products() {
        let catalog: CatalogSnapshot = serde_json::from_str(DEMO_CATALOG).unwrap();
        let engine = Engine::new(CliBackend::Offline, EngineConfig::default());

        let result = engine
            .recommend_region(&LocationSignal::from_province("黑龙江省"), &catalog)
            .unwrap();
        assert_eq!(result.region_code(), Some("northeast"));
        assert!(!result.featured_products.is_empty());
        assert!(result.featured_products.iter().all(|rp| rp.is_featured && rp.product.available));
        assert!(result.all_products.len() >= result.featured_products.len());
    }

    #[test]
    fn test_catalog_province_table() {
        let catalog: CatalogSnapshot = serde_json::from_str(DEMO_CATALOG).unwrap();
        let matcher = RegionMatcher::new(ProvinceTable::from_regions(&catalog.active_regions()));
        let engine = Engine::new(CliBackend::Offline, EngineConfig::default()).with_region_matcher(matcher);

        let result = engine
            .resolve_region(&LocationSignal::from_province("澳门"), &catalog.active_regions())
            .unwrap();
        assert_eq!(result.region_code(), Some("southeast"));
    }
}
