//! Prompt rendering and reply parsing for the completion service.
//!
//! The remote service is asked to pick one product from the catalog and
//! answer in a three-line labeled format:
//!
//! ```text
//! 推荐产品：<name>
//! 推荐理由：<reasoning>
//! 产品描述：<description>
//! ```
//!
//! `parse_reply` reads that format back, tolerating anything else.

use brewmatch_features::non_blank;
use brewmatch_model::{Product, RecommendationRequest};
use std::fmt::Write;

/// Label of the chosen product line.
pub const NAME_LABEL: &str = "推荐产品：";
/// Label of the reasoning line.
pub const REASONING_LABEL: &str = "推荐理由：";
/// Label of the description line.
pub const DESCRIPTION_LABEL: &str = "产品描述：";

/// Placeholder for an absent signal or tag list.
pub const NONE_PROVIDED: &str = "无";

pub const DEFAULT_REASONING: &str = "系统默认推荐";
pub const DEFAULT_DESCRIPTION: &str = "暂无描述";

/// Trait for rendering a recommendation request into an instruction.
pub trait PromptTemplate {
    /// The output type (usually String or a structured message list)
    type Output;

    /// Render the request against the given candidates
    fn render(&self, request: &RecommendationRequest, products: &[Product]) -> Self::Output;
}

/// Instruction that restricts the service to the listed catalog.
#[derive(Debug, Default)]
pub struct RestrictedPrompt;

impl PromptTemplate for RestrictedPrompt {
    type Output = String;

    fn render(&self, request: &RecommendationRequest, products: &[Product]) -> String {
        let signal = |value: &Option<String>| {
            non_blank(value.as_deref()).unwrap_or(NONE_PROVIDED).to_string()
        };

        let mut prompt = String::from("你是一个奶茶推荐专家。用户信息：\n");
        // Writing into a String cannot fail.
        let _ = writeln!(prompt, "口味偏好：{}", signal(&request.preference));
        let _ = writeln!(prompt, "天气：{}", signal(&request.weather));
        let _ = writeln!(prompt, "心情：{}", signal(&request.mood));
        prompt.push('\n');

        prompt.push_str("重要限制：你只能从以下现有商品中选择推荐，不能推荐不存在的商品：\n");
        prompt.push_str(&product_list(products));
        prompt.push('\n');

        prompt.push_str("请严格按照以下格式回复：\n");
        let _ = writeln!(prompt, "{}[从上面列表中选择一个具体的商品名称]", NAME_LABEL);
        let _ = writeln!(prompt, "{}[简要说明为什么推荐这个商品]", REASONING_LABEL);
        let _ = writeln!(prompt, "{}[使用该商品的实际描述]", DESCRIPTION_LABEL);
        prompt.push('\n');
        prompt.push_str("注意：商品名称必须完全匹配上面列表中的名称，只能推荐一个商品！");

        prompt
    }
}

/// Enumerate the candidates, one line each.
pub fn product_list(products: &[Product]) -> String {
    let mut list = String::from("请从以下商品中选择推荐（只能选择这些商品）：\n");

    for product in products {
        let tags = if product.tags.is_empty() {
            NONE_PROVIDED.to_string()
        } else {
            product.tags.join(",")
        };
        let _ = writeln!(
            list,
            "- {}（分类：{}，标签：{}，描述：{}）",
            product.name, product.category, tags, product.description
        );
    }

    list
}

/// The three labeled fields of a service reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    /// Chosen product name; empty when the reply named none
    pub name: String,
    pub reasoning: String,
    pub description: String,
}

impl Default for ParsedReply {
    fn default() -> Self {
        Self {
            name: String::new(),
            reasoning: DEFAULT_REASONING.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

impl ParsedReply {
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Parse a free-text reply into its labeled fields.
///
/// Labels are matched as exact, case-sensitive prefixes after leading
/// whitespace. The first occurrence of each label wins. Lines without a
/// label are ignored, so malformed text yields the default triple.
pub fn parse_reply(text: &str) -> ParsedReply {
    let mut name = None;
    let mut reasoning = None;
    let mut description = None;

    for line in text.lines() {
        let line = line.trim_start();

        if let Some(rest) = line.strip_prefix(NAME_LABEL) {
            name.get_or_insert_with(|| rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(REASONING_LABEL) {
            reasoning.get_or_insert_with(|| rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix(DESCRIPTION_LABEL) {
            description.get_or_insert_with(|| rest.trim().to_string());
        }
    }

    if name.is_none() {
        tracing::debug!(len = text.len(), "Reply carried no product line");
    }

    let defaults = ParsedReply::default();
    ParsedReply {
        name: name.unwrap_or(defaults.name),
        reasoning: reasoning.unwrap_or(defaults.reasoning),
        description: description.unwrap_or(defaults.description),
    }
}
