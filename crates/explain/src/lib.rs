//! Explanation generation for resolution results.
//!
//! Converts match tiers into human-readable explanations and produces the
//! locally generated texts used when the completion service is unavailable:
//! fallback reasoning, weather hints and seasonal hints.

use brewmatch_features::{non_blank, split_tags};
use brewmatch_model::{MatchTier, ProductResolution, RecommendationRequest, RegionMatchType, RegionResolution};
use serde::{Deserialize, Serialize};

/// A structured explanation for how a result was reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Short summary (1 line)
    pub summary: String,

    /// Detailed explanation (1-2 sentences)
    pub detail: String,

    /// How much the result reflects the user's signals (0.0 - 1.0)
    pub confidence: f32,

    /// Evidence items supporting this explanation
    pub evidence: Vec<EvidenceItem>,
}

/// A piece of evidence supporting an explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Type of evidence
    pub kind: String,

    /// The specific value or match
    pub value: String,

    /// Optional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Explain a product resolution.
pub fn explain_product(resolution: &ProductResolution) -> Explanation {
    let mut explanation = explain_tier(resolution.match_tier, &resolution.chosen_name);
    if let Some(id) = resolution.matched_id {
        explanation.evidence.push(EvidenceItem {
            kind: "product_id".to_string(),
            value: id.to_string(),
            context: None,
        });
    }
    explanation
}

/// Explain a single product match tier.
pub fn explain_tier(tier: MatchTier, name: &str) -> Explanation {
    match tier {
        MatchTier::Exact => Explanation {
            summary: "Exact catalog match".to_string(),
            detail: format!("The recommended name '{}' is listed verbatim in the catalog.", name),
            confidence: 1.0,
            evidence: vec![EvidenceItem {
                kind: "exact_name".to_string(),
                value: name.to_string(),
                context: None,
            }],
        },

        MatchTier::Alias => Explanation {
            summary: "Matched through alias".to_string(),
            detail: format!(
                "The recommended name maps to the catalog product '{}' \
                 through the alias table.",
                name
            ),
            confidence: 0.9,
            evidence: vec![EvidenceItem {
                kind: "alias".to_string(),
                value: name.to_string(),
                context: None,
            }],
        },

        MatchTier::Fuzzy => Explanation {
            summary: "Matched by name prefix".to_string(),
            detail: format!(
                "No exact or alias match was found; '{}' shares the leading \
                 characters of the recommended name.",
                name
            ),
            confidence: 0.5,
            evidence: vec![EvidenceItem {
                kind: "prefix".to_string(),
                value: name.to_string(),
                context: Some("first catalog hit wins".to_string()),
            }],
        },

        MatchTier::Fallback => Explanation {
            summary: "Default product".to_string(),
            detail: format!(
                "The recommendation could not be matched to the catalog, so \
                 the first available product '{}' was chosen.",
                name
            ),
            confidence: 0.2,
            evidence: vec![],
        },

        MatchTier::Empty => Explanation {
            summary: "No products available".to_string(),
            detail: "The catalog has no available products; the result is a \
                     placeholder and references nothing."
                .to_string(),
            confidence: 0.0,
            evidence: vec![],
        },
    }
}

/// Explain a region resolution.
pub fn explain_region(resolution: &RegionResolution) -> Explanation {
    let region = resolution
        .region
        .as_ref()
        .map(|r| format!("{} ({})", r.name, r.code))
        .unwrap_or_else(|| "none".to_string());
    let province = resolution.detected_province.clone();

    let (summary, detail, confidence) = match resolution.match_type {
        RegionMatchType::Mock => (
            "Mock location",
            format!("The caller pinned the region to {}.", region),
            1.0,
        ),
        RegionMatchType::Exact => (
            "Province match",
            format!("The province is listed for {}.", region),
            1.0,
        ),
        RegionMatchType::Fuzzy => (
            "Partial province match",
            format!("The province text partially matches a province of {}.", region),
            0.7,
        ),
        RegionMatchType::Default if resolution.region.is_none() => (
            "No active region",
            "No region is active, nothing could be selected.".to_string(),
            0.0,
        ),
        RegionMatchType::Default => (
            "Default region",
            format!("The location could not be placed, falling back to {}.", region),
            0.2,
        ),
    };

    let mut evidence: Vec<EvidenceItem> = province
        .map(|p| EvidenceItem {
            kind: "province".to_string(),
            value: p,
            context: None,
        })
        .into_iter()
        .collect();

    if let Some(region) = &resolution.region {
        let tags = region.recommend_tags.as_deref().map(split_tags).unwrap_or_default();
        evidence.extend(tags.into_iter().map(|tag| EvidenceItem {
            kind: "region_tag".to_string(),
            value: tag.to_string(),
            context: Some(region.code.clone()),
        }));
    }

    Explanation {
        summary: summary.to_string(),
        detail,
        confidence,
        evidence,
    }
}

/// Reasoning composed from the request alone, for the local fallback path.
pub fn fallback_reasoning(request: &RecommendationRequest) -> String {
    let mut parts = Vec::new();

    if let Some(preference) = non_blank(request.preference.as_deref()) {
        parts.push(format!("根据您的口味偏好「{}」推荐", preference));
    }
    if let Some(weather) = non_blank(request.weather.as_deref()) {
        parts.push(format!("结合「{}」天气", weather));
    }
    if let Some(mood) = non_blank(request.mood.as_deref()) {
        parts.push(format!("匹配您「{}」的心情", mood));
    }

    if parts.is_empty() {
        return "为您推荐这款受欢迎的商品".to_string();
    }
    parts.join("，")
}

const COLD_PROVINCES: [&str; 3] = ["黑龙江", "吉林", "辽宁"];
const HOT_PROVINCES: [&str; 3] = ["广东", "广西", "海南"];

/// Drink hint for the detected province's climate.
pub fn weather_suggestion(province: Option<&str>) -> String {
    let Some(province) = province else {
        return "根据当地天气选择合适的饮品".to_string();
    };

    if COLD_PROVINCES.iter().any(|p| province.contains(p)) {
        "东北地区较寒冷，建议选择热饮暖身".to_string()
    } else if HOT_PROVINCES.iter().any(|p| province.contains(p)) {
        "南方天气炎热，推荐清凉解暑的饮品".to_string()
    } else {
        "当前天气适中，各种饮品都适宜".to_string()
    }
}

/// Drink hint for a calendar month (1-12).
pub fn seasonal_suggestion(month: u32) -> String {
    match month {
        12 | 1 | 2 => "冬季推荐热饮，温暖身心",
        3..=5 => "春季推荐清新果茶，感受生机",
        6..=8 => "夏季推荐冰饮，消暑解渴",
        9..=11 => "秋季推荐温和奶茶，滋养润燥",
        _ => "根据季节选择合适饮品",
    }
    .to_string()
}

/// One-line summary of a product resolution, for CLI output.
pub fn summarize_product(resolution: &ProductResolution) -> String {
    match resolution.matched_id {
        Some(id) => format!(
            "{} #{} [{}]",
            resolution.chosen_name,
            id,
            resolution.match_tier.label()
        ),
        None => format!("NO PRODUCT [{}]", resolution.match_tier.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewmatch_model::Region;

    #[test]
    fn test_explain_exact_tier() {
        let explanation = explain_tier(MatchTier::Exact, "芋圆奶茶");
        assert_eq!(explanation.confidence, 1.0);
        assert!(explanation.detail.contains("芋圆奶茶"));
    }

    #[test]
    fn test_confidence_follows_precedence() {
        let tiers = [
            MatchTier::Exact,
            MatchTier::Alias,
            MatchTier::Fuzzy,
            MatchTier::Fallback,
            MatchTier::Empty,
        ];
        let confidences: Vec<f32> = tiers.iter().map(|t| explain_tier(*t, "x").confidence).collect();
        assert!(confidences.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_fallback_reasoning() {
        let request = RecommendationRequest::new()
            .with_preference("甜")
            .with_mood("开心");
        assert_eq!(fallback_reasoning(&request), "根据您的口味偏好「甜」推荐，匹配您「开心」的心情");

        let request = RecommendationRequest::new().with_weather(" ");
        assert_eq!(fallback_reasoning(&request), "为您推荐这款受欢迎的商品");
    }

    #[test]
    fn test_weather_suggestion() {
        assert!(weather_suggestion(Some("黑龙江省")).contains("热饮"));
        assert!(weather_suggestion(Some("海南")).contains("清凉"));
        assert!(weather_suggestion(Some("四川")).contains("适中"));
        assert!(weather_suggestion(None).contains("当地天气"));
    }

    #[test]
    fn test_seasonal_suggestion() {
        assert!(seasonal_suggestion(1).contains("冬季"));
        assert!(seasonal_suggestion(4).contains("春季"));
        assert!(seasonal_suggestion(7).contains("夏季"));
        assert!(seasonal_suggestion(10).contains("秋季"));
        assert_eq!(seasonal_suggestion(13), "根据季节选择合适饮品");
    }

    #[test]
    fn test_explain_empty_region() {
        let resolution = RegionResolution {
            region: None,
            detected_province: None,
            detected_city: None,
            match_type: RegionMatchType::Default,
            weather_suggestion: String::new(),
            seasonal_suggestion: String::new(),
            featured_products: Vec::new(),
            all_products: Vec::new(),
        };
        assert_eq!(explain_region(&resolution).summary, "No active region");

        let resolution = RegionResolution {
            region: Some(Region::new("southwest", "西南地区")),
            detected_province: Some("云南省".to_string()),
            match_type: RegionMatchType::Fuzzy,
            ..resolution
        };
        let explanation = explain_region(&resolution);
        assert!(explanation.detail.contains("southwest"));
        assert_eq!(explanation.evidence[0].value, "云南省");
    }

    #[test]
    fn test_explain_region_tags() {
        let mut region = Region::new("northeast", "东北地区");
        region.recommend_tags = Some("暖身,抗寒，高热量".to_string());
        let resolution = RegionResolution {
            region: Some(region),
            detected_province: None,
            detected_city: None,
            match_type: RegionMatchType::Mock,
            weather_suggestion: String::new(),
            seasonal_suggestion: String::new(),
            featured_products: Vec::new(),
            all_products: Vec::new(),
        };

        let tags: Vec<_> = explain_region(&resolution)
            .evidence
            .into_iter()
            .filter(|e| e.kind == "region_tag")
            .map(|e| e.value)
            .collect();
        assert_eq!(tags, vec!["暖身", "抗寒", "高热量"]);
    }

    #[test]
    fn test_summarize_product() {
        let resolution = ProductResolution {
            chosen_name: "珍珠奶茶".to_string(),
            reasoning: String::new(),
            description: String::new(),
            matched_id: None,
            match_tier: MatchTier::Empty,
        };
        assert_eq!(summarize_product(&resolution), "NO PRODUCT [empty]");
    }
}
