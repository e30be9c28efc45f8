//! Product matching: turn a recommended name into a catalog product.

use crate::first_match;
use crate::tables::AliasTable;
use brewmatch_features::{contains_ignore_case, fuzzy_key};
use brewmatch_model::{MatchTier, Product, ProductResolution};
use brewmatch_prompt::{ParsedReply, DEFAULT_DESCRIPTION};

/// Placeholder name used when no product is available at all.
pub const EMPTY_NAME: &str = "珍珠奶茶";
pub const EMPTY_REASONING: &str = "经典口味，适合大多数场合";
pub const EMPTY_DESCRIPTION: &str = "香浓奶茶搭配Q弹珍珠，经典美味";

/// Resolves names against the available products of a catalog.
#[derive(Debug, Clone)]
pub struct ProductMatcher {
    aliases: AliasTable,
}

impl Default for ProductMatcher {
    fn default() -> Self {
        Self::new(AliasTable::builtin())
    }
}

impl ProductMatcher {
    /// Name-based tiers, in precedence order. `Fallback` and `Empty` are
    /// not name-based and apply after these.
    pub const TIERS: [MatchTier; 3] = [MatchTier::Exact, MatchTier::Alias, MatchTier::Fuzzy];

    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    /// Find the product a name refers to, with the tier that found it.
    ///
    /// Unavailable products are skipped.
    pub fn find<'a>(&self, name: &str, candidates: &'a [Product]) -> Option<(MatchTier, &'a Product)> {
        let name = name.trim();
        first_match(&Self::TIERS, |tier| self.attempt(tier, name, candidates))
    }

    fn attempt<'a>(&self, tier: MatchTier, name: &str, candidates: &'a [Product]) -> Option<&'a Product> {
        let mut available = candidates.iter().filter(|p| p.available);
        match tier {
            MatchTier::Exact => available.find(|p| p.name == name),
            MatchTier::Alias => {
                let canonical = self.aliases.canonical(name)?;
                available.find(|p| p.name == canonical)
            }
            MatchTier::Fuzzy => {
                let key = fuzzy_key(name);
                if key.is_empty() {
                    return None;
                }
                available.find(|p| contains_ignore_case(&p.name, key))
            }
            MatchTier::Fallback | MatchTier::Empty => None,
        }
    }

    /// Resolve a parsed reply to exactly one product.
    ///
    /// Never fails: an unmatched name resolves to the first available
    /// product, and a catalog without available products resolves to the
    /// empty placeholder.
    pub fn resolve(&self, reply: &ParsedReply, candidates: &[Product]) -> ProductResolution {
        let Some(default) = first_available(candidates) else {
            tracing::warn!("No available products, returning placeholder");
            return empty_resolution();
        };

        match self.find(&reply.name, candidates) {
            Some((tier, product)) => {
                tracing::debug!(
                    tier = tier.label(),
                    requested = %reply.name,
                    product = %product.name,
                    "Matched recommended product"
                );
                let description = if reply.description == DEFAULT_DESCRIPTION {
                    product.description.clone()
                } else {
                    reply.description.clone()
                };
                ProductResolution {
                    chosen_name: product.name.clone(),
                    reasoning: reply.reasoning.clone(),
                    description,
                    matched_id: Some(product.id),
                    match_tier: tier,
                }
            }
            None => {
                tracing::info!(
                    requested = %reply.name,
                    product = %default.name,
                    "No match for recommended product, using default"
                );
                fallback_resolution(default, reply.reasoning.clone())
            }
        }
    }
}

/// The first available product in catalog order.
pub fn first_available(candidates: &[Product]) -> Option<&Product> {
    candidates.iter().find(|p| p.available)
}

/// Result pointing at `product` with the given reasoning.
pub fn fallback_resolution(product: &Product, reasoning: String) -> ProductResolution {
    ProductResolution {
        chosen_name: product.name.clone(),
        reasoning,
        description: product.description.clone(),
        matched_id: Some(product.id),
        match_tier: MatchTier::Fallback,
    }
}

/// Placeholder result for a catalog without available products.
pub fn empty_resolution() -> ProductResolution {
    ProductResolution {
        chosen_name: EMPTY_NAME.to_string(),
        reasoning: EMPTY_REASONING.to_string(),
        description: EMPTY_DESCRIPTION.to_string(),
        matched_id: None,
        match_tier: MatchTier::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewmatch_prompt::parse_reply;
    use pretty_assertions::assert_eq;

    fn catalog() -> Vec<Product> {
        vec![
            Product::new(1, "经典珍珠奶茶").with_description("香浓奶茶搭配Q弹珍珠，甜度适中"),
            Product::new(2, "芒果冰沙").with_description("新鲜芒果冰沙，清凉解暑"),
            Product::new(3, "芋圆奶茶").with_description("香糯芋圆搭配醇香奶茶"),
            Product::new(4, "Matcha Latte").with_description("matcha and milk"),
        ]
    }

    fn reply(name: &str) -> ParsedReply {
        ParsedReply {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_match_takes_precedence() {
        // "芋圆奶茶" is also an alias entry and fuzzy-matches itself.
        let matcher = ProductMatcher::default();
        let result = matcher.resolve(&reply("芋圆奶茶"), &catalog());
        assert_eq!(result.matched_id, Some(3));
        assert_eq!(result.match_tier, MatchTier::Exact);
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        let matcher = ProductMatcher::default();
        let products = catalog();
        let (tier, product) = matcher.find("matcha latte", &products).unwrap();
        assert_eq!(tier, MatchTier::Fuzzy);
        assert_eq!(product.id, 4);
    }

    #[test]
    fn test_alias_before_fuzzy() {
        // "芒果波波茶" would fuzzy-match "芒果冰沙" too, alias must win.
        let matcher = ProductMatcher::default();
        let result = matcher.resolve(&reply("芒果波波茶"), &catalog());
        assert_eq!(result.matched_id, Some(2));
        assert_eq!(result.match_tier, MatchTier::Alias);
        assert_eq!(result.chosen_name, "芒果冰沙");
    }

    #[test]
    fn test_alias_to_missing_product_falls_through() {
        let matcher = ProductMatcher::default();
        // "红糖姜茶" aliases "雨天暖姜奶茶", which is not in this catalog,
        // and its prefix "红糖" matches nothing either.
        let result = matcher.resolve(&reply("红糖姜茶"), &catalog());
        assert_eq!(result.match_tier, MatchTier::Fallback);
        assert_eq!(result.matched_id, Some(1));
    }

    #[test]
    fn test_fuzzy_prefix_first_catalog_hit() {
        let matcher = ProductMatcher::default();
        let result = matcher.resolve(&reply("芋圆波波"), &catalog());
        assert_eq!(result.match_tier, MatchTier::Fuzzy);
        assert_eq!(result.matched_id, Some(3));
    }

    #[test]
    fn test_fallback_replaces_name_and_description() {
        let matcher = ProductMatcher::default();
        let parsed = parse_reply("推荐产品：火星特饮\n推荐理由：好喝\n产品描述：不存在");
        let result = matcher.resolve(&parsed, &catalog());

        assert_eq!(
            result,
            ProductResolution {
                chosen_name: "经典珍珠奶茶".to_string(),
                reasoning: "好喝".to_string(),
                description: "香浓奶茶搭配Q弹珍珠，甜度适中".to_string(),
                matched_id: Some(1),
                match_tier: MatchTier::Fallback,
            }
        );
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let matcher = ProductMatcher::default();
        let first = matcher.resolve(&reply("火星特饮"), &catalog());
        let second = matcher.resolve(&reply("木星特饮"), &catalog());
        assert_eq!(first.matched_id, second.matched_id);
        assert_eq!(first, matcher.resolve(&reply("火星特饮"), &catalog()));
    }

    #[test]
    fn test_empty_name_never_fuzzy_matches() {
        let matcher = ProductMatcher::default();
        assert!(matcher.find("", &catalog()).is_none());
        assert!(matcher.find("   ", &catalog()).is_none());
        assert_eq!(matcher.resolve(&reply(""), &catalog()).match_tier, MatchTier::Fallback);
    }

    #[test]
    fn test_unavailable_products_are_skipped() {
        let mut products = catalog();
        products[0].available = false;
        let matcher = ProductMatcher::default();

        let result = matcher.resolve(&reply("经典珍珠奶茶"), &products);
        assert_ne!(result.matched_id, Some(1));
        assert_eq!(result.matched_id, Some(2));
        assert_eq!(result.match_tier, MatchTier::Fallback);
    }

    #[test]
    fn test_empty_catalog_placeholder() {
        let matcher = ProductMatcher::default();
        let result = matcher.resolve(&reply("经典珍珠奶茶"), &[]);
        assert_eq!(result, empty_resolution());
        assert!(result.is_empty());

        let unavailable = vec![Product::new(9, "芒果冰沙").unavailable()];
        assert_eq!(matcher.resolve(&reply("芒果冰沙"), &unavailable).matched_id, None);
    }

    #[test]
    fn test_reply_description_kept_when_present() {
        let matcher = ProductMatcher::default();
        let parsed = parse_reply("推荐产品：芒果冰沙\n产品描述：夏日必备");
        let result = matcher.resolve(&parsed, &catalog());
        assert_eq!(result.description, "夏日必备");

        let parsed = parse_reply("推荐产品：芒果冰沙");
        let result = matcher.resolve(&parsed, &catalog());
        assert_eq!(result.description, "新鲜芒果冰沙，清凉解暑");
    }

    #[test]
    fn test_custom_alias_table() {
        let matcher = ProductMatcher::new(AliasTable::from_pairs([("抹茶", "Matcha Latte")]));
        let products = catalog();
        let (tier, product) = matcher.find("抹茶", &products).unwrap();
        assert_eq!(tier, MatchTier::Alias);
        assert_eq!(product.id, 4);
    }
}
