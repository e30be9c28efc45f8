//! Region matching: place a location signal into one of the regions.

use crate::first_match;
use crate::tables::{ProvinceTable, DEFAULT_REGION_CODE};
use brewmatch_model::{LocationSignal, Region, RegionMatchType};
use std::fmt;
use std::sync::Arc;

/// Province reported for a mock location.
pub const MOCK_PROVINCE: &str = "模拟定位";

/// Turns coordinates into a province name.
///
/// Reverse geocoding is an external concern; without a geocoder,
/// coordinate-only signals resolve to the default region.
pub trait ReverseGeocoder: Send + Sync {
    fn province_at(&self, latitude: f64, longitude: f64) -> Option<String>;
}

/// Signal-driven tiers, in precedence order. The default region applies
/// after all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionTier {
    /// Caller-pinned region code
    Mock,
    /// Province text listed in the province table
    Province,
    /// Province text partially matching a listed province
    ProvinceFuzzy,
    /// Province obtained from coordinates
    Coordinates,
}

/// Outcome of region matching.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMatch {
    /// `None` only when no candidate region is active
    pub region: Option<Region>,
    pub match_type: RegionMatchType,
    pub detected_province: Option<String>,
}

/// Resolves location signals against the active regions.
#[derive(Clone)]
pub struct RegionMatcher {
    provinces: ProvinceTable,
    default_code: String,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
}

impl fmt::Debug for RegionMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionMatcher")
            .field("provinces", &self.provinces.len())
            .field("default_code", &self.default_code)
            .field("geocoder", &self.geocoder.is_some())
            .finish()
    }
}

impl Default for RegionMatcher {
    fn default() -> Self {
        Self::new(ProvinceTable::builtin())
    }
}

impl RegionMatcher {
    pub const TIERS: [RegionTier; 4] = [
        RegionTier::Mock,
        RegionTier::Province,
        RegionTier::ProvinceFuzzy,
        RegionTier::Coordinates,
    ];

    pub fn new(provinces: ProvinceTable) -> Self {
        Self {
            provinces,
            default_code: DEFAULT_REGION_CODE.to_string(),
            geocoder: None,
        }
    }

    pub fn with_default_code(mut self, code: impl Into<String>) -> Self {
        self.default_code = code.into();
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Resolve a signal to exactly one active region.
    ///
    /// The signal is assumed usable; callers reject unusable signals first.
    pub fn resolve(&self, signal: &LocationSignal, candidates: &[Region]) -> RegionMatch {
        if let Some((tier, (region, match_type, province))) =
            first_match(&Self::TIERS, |tier| self.attempt(tier, signal, candidates))
        {
            tracing::debug!(
                ?tier,
                region = %region.code,
                province = province.as_deref().unwrap_or(""),
                "Matched region"
            );
            return RegionMatch {
                region: Some(region.clone()),
                match_type,
                detected_province: province,
            };
        }

        let region = self.default_region(candidates);
        if region.is_none() {
            tracing::warn!("No active regions, leaving region unresolved");
        } else {
            tracing::info!(
                location = %signal.location_description(),
                default = %self.default_code,
                "Location not placed, using default region"
            );
        }

        RegionMatch {
            region: region.cloned(),
            match_type: RegionMatchType::Default,
            detected_province: signal.province_text().map(str::to_string),
        }
    }

    fn attempt<'a>(
        &self,
        tier: RegionTier,
        signal: &LocationSignal,
        candidates: &'a [Region],
    ) -> Option<(&'a Region, RegionMatchType, Option<String>)> {
        match tier {
            RegionTier::Mock => {
                if !signal.use_mock {
                    return None;
                }
                let code = signal.mock_region_code.as_deref()?.trim();
                let region = active_by_code(candidates, code)?;
                Some((region, RegionMatchType::Mock, Some(MOCK_PROVINCE.to_string())))
            }
            RegionTier::Province => {
                let province = signal.province_text()?;
                let region = self.by_province(province, candidates)?;
                Some((region, RegionMatchType::Exact, Some(province.to_string())))
            }
            RegionTier::ProvinceFuzzy => {
                let province = signal.province_text()?;
                let region = self.by_province_fuzzy(province, candidates)?;
                Some((region, RegionMatchType::Fuzzy, Some(province.to_string())))
            }
            RegionTier::Coordinates => {
                if signal.has_text_location() || !signal.has_coordinates() {
                    return None;
                }
                let geocoder = self.geocoder.as_ref()?;
                let (lat, lon) = (signal.latitude?, signal.longitude?);
                let province = geocoder.province_at(lat, lon)?;
                let province = province.trim();

                if let Some(region) = self.by_province(province, candidates) {
                    return Some((region, RegionMatchType::Exact, Some(province.to_string())));
                }
                let region = self.by_province_fuzzy(province, candidates)?;
                Some((region, RegionMatchType::Fuzzy, Some(province.to_string())))
            }
        }
    }

    fn by_province<'a>(&self, province: &str, candidates: &'a [Region]) -> Option<&'a Region> {
        let code = self.provinces.region_code(province)?;
        active_by_code(candidates, code)
    }

    /// The first containing entry decides; an inactive region there leaves
    /// the signal to the default.
    fn by_province_fuzzy<'a>(&self, province: &str, candidates: &'a [Region]) -> Option<&'a Region> {
        let (_, code) = self.provinces.fuzzy_matches(province).next()?;
        active_by_code(candidates, code)
    }

    /// The configured default region, else the first active one.
    pub fn default_region<'a>(&self, candidates: &'a [Region]) -> Option<&'a Region> {
        active_by_code(candidates, &self.default_code).or_else(|| candidates.iter().find(|r| r.is_active))
    }

    /// Regions for an exactly listed province: zero or one.
    pub fn regions_for_province(&self, province: &str, candidates: &[Region]) -> Vec<Region> {
        self.by_province(province.trim(), candidates)
            .into_iter()
            .cloned()
            .collect()
    }
}

fn active_by_code<'a>(candidates: &'a [Region], code: &str) -> Option<&'a Region> {
    candidates.iter().find(|r| r.is_active && r.code == code)
}
