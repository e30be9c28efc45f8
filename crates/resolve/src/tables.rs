//! Static lookup tables: product aliases and province-to-region codes.
//!
//! The built-in data is held in `static` slices and wrapped into table types
//! once, when a matcher is constructed. Tables are never mutated afterwards.

use brewmatch_features::mutual_contains;
use brewmatch_model::Region;
use std::collections::HashMap;

/// Alternate names the completion service tends to produce, mapped to the
/// catalog's canonical names.
pub static PRODUCT_ALIASES: &[(&str, &str)] = &[
    ("经典珍珠奶茶", "经典珍珠奶茶"),
    ("珍珠奶茶", "经典珍珠奶茶"),
    ("冰爽芒果波波茶", "芒果冰沙"),
    ("芒果波波茶", "芒果冰沙"),
    ("暖心红糖姜茶", "雨天暖姜奶茶"),
    ("红糖姜茶", "雨天暖姜奶茶"),
    ("芝士奶盖草莓奶茶", "芝士奶盖红茶"),
    ("芝士草莓奶茶", "芝士奶盖红茶"),
    ("提神咖啡奶茶", "咖啡奶茶"),
    ("咖啡奶茶", "咖啡奶茶"),
    ("薰衣草奶茶", "春风茉莉花茶"),
    ("黑糖珍珠鲜奶", "黑糖珍珠奶茶"),
    ("百香果绿茶", "百香果绿茶"),
    ("四季春茶", "四季春茶"),
    ("冰爽柠檬茶", "柠檬绿茶"),
    ("柠檬绿茶", "柠檬绿茶"),
    ("芝士奶盖绿茶", "芝士奶盖红茶"),
    ("草莓多多", "草莓果茶"),
    ("芋圆奶茶", "芋圆奶茶"),
    ("红豆奶茶", "红豆奶茶"),
    ("布丁奶茶", "布丁奶茶"),
    ("椰果奶茶", "椰果奶茶"),
    ("仙草冻奶茶", "仙草冻奶茶"),
    ("抹茶拿铁", "抹茶拿铁"),
    ("巧克力奶茶", "巧克力奶茶"),
    ("芋泥波波茶", "芋圆奶茶"),
    ("葡萄多多", "葡萄多多"),
    ("桃子乌龙茶", "桃子乌龙"),
];

/// Every provincial-level division, in scan order, with its region code.
pub static PROVINCE_REGIONS: &[(&str, &str)] = &[
    // northeast
    ("黑龙江", "northeast"),
    ("吉林", "northeast"),
    ("辽宁", "northeast"),
    // north
    ("北京", "north"),
    ("天津", "north"),
    ("河北", "north"),
    ("山西", "north"),
    ("内蒙古", "north"),
    // northwest
    ("陕西", "northwest"),
    ("甘肃", "northwest"),
    ("青海", "northwest"),
    ("宁夏", "northwest"),
    ("新疆", "northwest"),
    // southwest
    ("四川", "southwest"),
    ("云南", "southwest"),
    ("贵州", "southwest"),
    ("重庆", "southwest"),
    ("西藏", "southwest"),
    // central
    ("河南", "central"),
    ("湖北", "central"),
    ("湖南", "central"),
    ("江西", "central"),
    // east
    ("上海", "east"),
    ("江苏", "east"),
    ("浙江", "east"),
    ("安徽", "east"),
    ("福建", "east"),
    ("山东", "east"),
    // south
    ("广东", "south"),
    ("广西", "south"),
    ("海南", "south"),
    // southeast
    ("台湾", "southeast"),
    ("香港", "southeast"),
    ("澳门", "southeast"),
];

/// Region code used when a location cannot be placed.
pub const DEFAULT_REGION_CODE: &str = "southwest";

/// Name-normalization map from free-text names to catalog names.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    /// The built-in alias table.
    pub fn builtin() -> Self {
        Self::from_pairs(PRODUCT_ALIASES.iter().copied())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
                .collect(),
        }
    }

    /// Canonical catalog name for `name`, if aliased.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered province-to-region-code map.
///
/// Order matters: fuzzy lookups scan entries front to back and a province
/// listed twice keeps its first region.
#[derive(Debug, Clone, Default)]
pub struct ProvinceTable {
    entries: Vec<(String, String)>,
}

impl ProvinceTable {
    /// The built-in table covering all provincial-level divisions.
    pub fn builtin() -> Self {
        Self::from_pairs(PROVINCE_REGIONS.iter().copied())
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut table = Self::default();
        for (province, code) in pairs {
            table.insert(province, code);
        }
        table
    }

    /// Build the table from the regions' own `cover_provinces`.
    ///
    /// Regions are taken in the given order; a province claimed by two
    /// regions stays with the first.
    pub fn from_regions(regions: &[Region]) -> Self {
        let mut table = Self::default();
        for region in regions {
            for province in &region.cover_provinces {
                table.insert(province.trim(), &region.code);
            }
        }
        table
    }

    fn insert(&mut self, province: &str, code: &str) {
        if province.is_empty() || self.entries.iter().any(|(p, _)| p == province) {
            return;
        }
        self.entries.push((province.to_string(), code.to_string()));
    }

    /// Region code for an exactly listed province.
    pub fn region_code(&self, province: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == province)
            .map(|(_, code)| code.as_str())
    }

    /// Entries whose province contains, or is contained in, `province`,
    /// in scan order.
    pub fn fuzzy_matches<'a>(&'a self, province: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.entries
            .iter()
            .filter(move |(p, _)| mutual_contains(province, p))
            .map(|(p, code)| (p.as_str(), code.as_str()))
    }

    pub fn provinces(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_alias_table() {
        let aliases = AliasTable::builtin();
        assert_eq!(aliases.canonical("珍珠奶茶"), Some("经典珍珠奶茶"));
        assert_eq!(aliases.canonical("芋泥波波茶"), Some("芋圆奶茶"));
        assert_eq!(aliases.canonical("不存在的奶茶"), None);
    }

    #[test]
    fn test_builtin_province_table_covers_all_divisions() {
        let provinces = ProvinceTable::builtin();
        assert_eq!(provinces.len(), 34);
        assert_eq!(provinces.region_code("云南"), Some("southwest"));
        assert_eq!(provinces.region_code("香港"), Some("southeast"));
        assert_eq!(provinces.region_code("云南省"), None);
    }

    #[test]
    fn test_fuzzy_matches_both_directions() {
        let provinces = ProvinceTable::builtin();
        let hit: Vec<_> = provinces.fuzzy_matches("云南省").collect();
        assert_eq!(hit, vec![("云南", "southwest")]);

        let hit: Vec<_> = provinces.fuzzy_matches("内蒙").collect();
        assert_eq!(hit, vec![("内蒙古", "north")]);
    }

    #[test]
    fn test_from_regions_first_claim_wins() {
        let regions = vec![
            Region::new("south", "华南地区").with_provinces(["广东", "海南"]),
            Region::new("southeast", "东南地区").with_provinces(["海南", "台湾"]),
        ];
        let table = ProvinceTable::from_regions(&regions);

        assert_eq!(table.len(), 3);
        assert_eq!(table.region_code("海南"), Some("south"));
        assert_eq!(table.region_code("台湾"), Some("southeast"));
        assert_eq!(table.provinces().collect::<Vec<_>>(), vec!["广东", "海南", "台湾"]);
    }
}
