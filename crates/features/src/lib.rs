//! Text features for name and province matching.
//!
//! Provides pure functions used by the matching tiers:
//! - Character prefixes (the fuzzy key)
//! - Case-insensitive and bidirectional containment
//! - Tag splitting for delimited tag strings
//!
//! All slicing is done on `char` boundaries; catalog names are mostly CJK
//! where one character spans several bytes.

/// Number of leading characters used as the fuzzy key.
pub const FUZZY_KEY_CHARS: usize = 2;

/// The first `n` characters of `text`, or all of it when shorter.
pub fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Prefix used by the substring fuzzy tier.
///
/// Only two characters are used, so short or common prefixes (e.g. "奶茶")
/// can collide across many catalog names. First match in catalog order wins.
pub fn fuzzy_key(name: &str) -> &str {
    char_prefix(name.trim(), FUZZY_KEY_CHARS)
}

/// Whether `haystack` contains `needle`, ignoring case.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Whether either string contains the other.
///
/// Empty strings never match; an empty needle is contained everywhere and
/// would make every entry a hit.
pub fn mutual_contains(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(b) || b.contains(a)
}

/// Non-empty trimmed text, if any.
pub fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// Split a delimited tag string such as "暖身,抗寒，高热量".
///
/// ASCII and full-width commas and the enumeration comma all separate tags.
pub fn split_tags(raw: &str) -> Vec<&str> {
    raw.split(|c: char| matches!(c, ',' | '，' | '、'))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags("暖身,抗寒，高热量"), vec!["暖身", "抗寒", "高热量"]);
        assert_eq!(split_tags(" 经典、 传统 ,,"), vec!["经典", "传统"]);
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn test_char_prefix_multibyte() {
        assert_eq!(char_prefix("珍珠奶茶", 2), "珍珠");
        assert_eq!(char_prefix("茶", 2), "茶");
        assert_eq!(char_prefix("", 2), "");
        assert_eq!(char_prefix("Latte", 2), "La");
    }

    #[test]
    fn test_fuzzy_key() {
        assert_eq!(fuzzy_key(" 芒果波波茶 "), "芒果");
        assert_eq!(fuzzy_key("A"), "A");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Matcha Latte", "la"));
        assert!(contains_ignore_case("抹茶拿铁", "抹茶"));
        assert!(!contains_ignore_case("抹茶拿铁", "红茶"));
    }

    #[test]
    fn test_mutual_contains() {
        assert!(mutual_contains("云南省", "云南"));
        assert!(mutual_contains("云南", "云南省"));
        assert!(!mutual_contains("四川", "云南"));
        assert!(!mutual_contains("", "云南"));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  雨天 ")), Some("雨天"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
