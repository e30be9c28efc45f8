//! Core domain model for brewmatch resolution.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `Product` / `Region`: The catalog snapshot handed in by the caller
//! - `RecommendationRequest` / `LocationSignal`: The loosely structured inputs
//! - `MatchTier` / `RegionMatchType`: Which strategy produced a result
//! - `ProductResolution` / `RegionResolution`: The canonical outputs
//! - `RegionProduct` / `RegionalProduct`: Products listed for a region

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A catalog product (one drink on the menu).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Opaque unique identifier
    pub id: u64,

    /// Unique display name, the key every matching tier compares against
    pub name: String,

    /// Category tag (milktea, fruit, weather, festival, special, ...)
    #[serde(default)]
    pub category: String,

    /// Free-text keywords
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub price: Decimal,

    /// Only available products are candidates
    #[serde(default = "default_true")]
    pub available: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl Product {
    /// Create a minimal available product for testing.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            category: String::new(),
            tags: Vec::new(),
            description: String::new(),
            price: Decimal::ZERO,
            available: true,
            emoji: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

/// A regional product grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Unique short identifier, e.g. "northeast"
    pub code: String,

    /// Display name, e.g. "东北地区"
    pub name: String,

    /// Provinces owned by this region, in priority order
    #[serde(default)]
    pub cover_provinces: Vec<String>,

    /// Only active regions are candidates
    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty_desc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate_feature: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommend_tags: Option<String>,
}

impl Region {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            cover_provinces: Vec::new(),
            is_active: true,
            icon: None,
            specialty_desc: None,
            climate_feature: None,
            recommend_tags: None,
        }
    }

    pub fn with_provinces<I, S>(mut self, provinces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cover_provinces = provinces.into_iter().map(Into::into).collect();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

fn default_true() -> bool {
    true
}

/// Free-text signals for a drink recommendation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// Taste preference, e.g. "喜欢甜的"
    #[serde(default, alias = "userPreference")]
    pub preference: Option<String>,

    #[serde(default)]
    pub weather: Option<String>,

    #[serde(default)]
    pub mood: Option<String>,
}

impl RecommendationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preference(mut self, preference: impl Into<String>) -> Self {
        self.preference = Some(preference.into());
        self
    }

    pub fn with_weather(mut self, weather: impl Into<String>) -> Self {
        self.weather = Some(weather.into());
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }
}

/// Errors raised when a location signal cannot be resolved at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("location signal has no valid coordinates, province or mock flag")]
    Unusable,
}

/// A user's geographic signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSignal {
    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub province: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    pub district: Option<String>,

    /// Skip detection and use `mock_region_code` directly
    #[serde(default)]
    pub use_mock: bool,

    #[serde(default)]
    pub mock_region_code: Option<String>,
}

impl LocationSignal {
    pub fn from_province(province: impl Into<String>) -> Self {
        Self {
            province: Some(province.into()),
            ..Default::default()
        }
    }

    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Default::default()
        }
    }

    pub fn mock(region_code: impl Into<String>) -> Self {
        Self {
            use_mock: true,
            mock_region_code: Some(region_code.into()),
            ..Default::default()
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Both coordinates present and inside the valid lat/lon ranges.
    pub fn has_coordinates(&self) -> bool {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => lat.abs() <= 90.0 && lon.abs() <= 180.0,
            _ => false,
        }
    }

    pub fn has_text_location(&self) -> bool {
        self.province_text().is_some()
    }

    /// Trimmed province text, if non-empty.
    pub fn province_text(&self) -> Option<&str> {
        self.province
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    pub fn is_usable(&self) -> bool {
        self.has_coordinates() || self.has_text_location() || self.use_mock
    }

    pub fn validate(&self) -> Result<(), SignalError> {
        if self.is_usable() {
            Ok(())
        } else {
            Err(SignalError::Unusable)
        }
    }

    /// Human-readable description of where the user is.
    pub fn location_description(&self) -> String {
        if self.has_text_location() {
            return [&self.province, &self.city, &self.district]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect();
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if self.has_coordinates() => {
                format!("坐标({:.4}, {:.4})", lat, lon)
            }
            _ => "未知位置".to_string(),
        }
    }
}

/// Which product matching strategy produced a result.
///
/// Variants are declared in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Name equals a catalog name
    Exact,
    /// Name maps to a catalog name through the alias table
    Alias,
    /// Catalog name contains the name's two-character prefix
    Fuzzy,
    /// First available product, nothing else matched
    Fallback,
    /// No available products at all
    Empty,
}

impl MatchTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Alias => "alias",
            Self::Fuzzy => "fuzzy",
            Self::Fallback => "fallback",
            Self::Empty => "empty",
        }
    }
}

/// Which region matching strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionMatchType {
    Exact,
    Fuzzy,
    Mock,
    Default,
}

impl RegionMatchType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Mock => "mock",
            Self::Default => "default",
        }
    }
}

/// Outcome of a product resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResolution {
    pub chosen_name: String,
    pub reasoning: String,
    pub description: String,

    /// `None` only for `MatchTier::Empty`
    pub matched_id: Option<u64>,

    pub match_tier: MatchTier,
}

impl ProductResolution {
    /// True when the catalog held no available product.
    pub fn is_empty(&self) -> bool {
        self.match_tier == MatchTier::Empty
    }
}

/// Outcome of a region resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionResolution {
    /// `None` only when no region is active
    pub region: Option<Region>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_province: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_city: Option<String>,

    pub match_type: RegionMatchType,

    #[serde(default)]
    pub weather_suggestion: String,

    #[serde(default)]
    pub seasonal_suggestion: String,

    /// Featured products of the resolved region
    #[serde(default)]
    pub featured_products: Vec<RegionalProduct>,

    /// Every available product listed for the resolved region
    #[serde(default)]
    pub all_products: Vec<RegionalProduct>,
}

impl RegionResolution {
    pub fn is_resolved(&self) -> bool {
        self.region.is_some()
    }

    pub fn region_code(&self) -> Option<&str> {
        self.region.as_ref().map(|r| r.code.as_str())
    }
}

/// Lists a product under a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProduct {
    pub region_code: String,
    pub product_id: u64,

    #[serde(default)]
    pub is_featured: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommend_reason: Option<String>,

    /// What the product is called locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
}

/// A region link joined with its product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalProduct {
    pub product: Product,
    pub is_featured: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommend_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,
}

/// A full catalog snapshot as exchanged with the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub products: Vec<Product>,

    #[serde(default)]
    pub regions: Vec<Region>,

    #[serde(default)]
    pub region_products: Vec<RegionProduct>,
}

impl CatalogSnapshot {
    /// Products eligible for recommendation, in catalog order.
    pub fn available_products(&self) -> Vec<Product> {
        self.products.iter().filter(|p| p.available).cloned().collect()
    }

    /// Regions eligible for resolution, in catalog order.
    pub fn active_regions(&self) -> Vec<Region> {
        self.regions.iter().filter(|r| r.is_active).cloned().collect()
    }

    /// Available products listed for `region_code`, in link order.
    ///
    /// A product is listed at most once; its first link wins. Links to
    /// unknown or unavailable products are skipped.
    pub fn regional_products(&self, region_code: &str) -> Vec<RegionalProduct> {
        let mut seen = HashSet::new();
        self.region_products
            .iter()
            .filter(|link| link.region_code == region_code)
            .filter(|link| seen.insert(link.product_id))
            .filter_map(|link| {
                let product = self.products.iter().find(|p| p.id == link.product_id && p.available)?;
                Some(RegionalProduct {
                    product: product.clone(),
                    is_featured: link.is_featured,
                    recommend_reason: link.recommend_reason.clone(),
                    local_name: link.local_name.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_usability() {
        assert!(LocationSignal::from_province("四川").is_usable());
        assert!(LocationSignal::from_coordinates(30.6, 104.1).is_usable());
        assert!(LocationSignal::mock("east").is_usable());

        assert!(!LocationSignal::default().is_usable());
        assert!(!LocationSignal::from_province("   ").is_usable());
        assert!(!LocationSignal::from_coordinates(91.0, 0.0).is_usable());
        assert_eq!(
            LocationSignal::from_coordinates(0.0, 181.0).validate(),
            Err(SignalError::Unusable)
        );
    }

    #[test]
    fn test_location_description() {
        let signal = LocationSignal::from_province("四川省").with_city("成都市");
        assert_eq!(signal.location_description(), "四川省成都市");

        let signal = LocationSignal::from_coordinates(30.65, 104.066);
        assert_eq!(signal.location_description(), "坐标(30.6500, 104.0660)");

        assert_eq!(LocationSignal::default().location_description(), "未知位置");
    }

    #[test]
    fn test_catalog_deserialization() {
        let json = r#"{
            "products": [
                {"id": 1, "name": "经典珍珠奶茶", "category": "milktea",
                 "tags": ["奶茶", "珍珠"], "price": "18.00"},
                {"id": 2, "name": "芒果冰沙", "available": false}
            ],
            "regions": [
                {"code": "southwest", "name": "西南地区", "cover_provinces": ["四川", "云南"]}
            ]
        }"#;
        let catalog: CatalogSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(catalog.products[0].price, Decimal::new(1800, 2));
        assert!(catalog.products[0].available);
        assert_eq!(catalog.available_products().len(), 1);
        assert_eq!(catalog.active_regions()[0].cover_provinces, vec!["四川", "云南"]);
    }

    #[test]
    fn test_regional_products() {
        let json = r#"{
            "products": [
                {"id": 1, "name": "雪天巧克力热饮"},
                {"id": 2, "name": "红豆奶茶"},
                {"id": 3, "name": "中秋月饼奶茶", "available": false}
            ],
            "region_products": [
                {"region_code": "northeast", "product_id": 1, "is_featured": true,
                 "recommend_reason": "寒冬暖身"},
                {"region_code": "northeast", "product_id": 3, "is_featured": true},
                {"region_code": "south", "product_id": 2},
                {"region_code": "northeast", "product_id": 2, "local_name": "红豆沙"},
                {"region_code": "northeast", "product_id": 1},
                {"region_code": "northeast", "product_id": 42}
            ]
        }"#;
        let catalog: CatalogSnapshot = serde_json::from_str(json).unwrap();

        let listed = catalog.regional_products("northeast");
        let ids: Vec<u64> = listed.iter().map(|rp| rp.product.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(listed[0].is_featured);
        assert_eq!(listed[0].recommend_reason.as_deref(), Some("寒冬暖身"));
        assert!(!listed[1].is_featured);
        assert_eq!(listed[1].local_name.as_deref(), Some("红豆沙"));

        assert!(catalog.regional_products("west").is_empty());
    }

    #[test]
    fn test_tier_serialization() {
        assert_eq!(serde_json::to_string(&MatchTier::Fallback).unwrap(), "\"fallback\"");
        assert_eq!(serde_json::to_string(&RegionMatchType::Mock).unwrap(), "\"mock\"");
        assert!(MatchTier::Exact < MatchTier::Alias);
    }
}
