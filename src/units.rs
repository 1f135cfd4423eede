//! Packaging-unit inference and base-unit math.
//!
//! Product names in the catalogue carry their packaging inline
//! ("Toned Milk 500 ML", "Fresh Paneer 200 GM"). The parser extracts a
//! `(value, unit)` pair from that free text; names without a recognizable
//! unit token are counted as discrete "each" items — that is normal data,
//! not an error. Conversion then normalizes everything to liters,
//! kilograms, or eaches before crate math.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Base units a crate holds; crate counts are floor-divided, remainders
/// are intentionally dropped.
pub const UNITS_PER_CRATE: f64 = 12.0;

/// First `<number><unit token>` occurrence wins. GRMS must be tried before
/// GM/G so the longer token is not split.
static UNIT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(GRMS|GM|ML|LTR|KG|G)\b").expect("unit regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Ml,
    Gm,
    Ltr,
    Kg,
    /// Discrete item with no sub-unit packaging.
    Each,
}

/// A parsed per-package measure, ephemeral to one line item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedUnit {
    pub value: f64,
    pub unit: Unit,
}

impl ParsedUnit {
    /// The fallback for names that carry no unit token.
    pub const EACH: ParsedUnit = ParsedUnit {
        value: 1.0,
        unit: Unit::Each,
    };
}

// ---------------------------------------------------------------------------
// Extraction strategies
// ---------------------------------------------------------------------------

/// Strategy seam for "extract a unit from arbitrary product input". The
/// regex implementation is the default; catalog lookup exists for masters
/// that carry an explicit unit field.
pub trait UnitExtractor: Send + Sync {
    fn extract(&self, product_name: &str) -> ParsedUnit;
}

/// Default extractor: single regex over the product name, first match
/// wins. Never fails — no match means `Each`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexUnitExtractor;

impl UnitExtractor for RegexUnitExtractor {
    fn extract(&self, product_name: &str) -> ParsedUnit {
        let Some(caps) = UNIT_PATTERN.captures(product_name) else {
            return ParsedUnit::EACH;
        };
        let value: f64 = match caps[1].parse() {
            Ok(v) => v,
            Err(_) => return ParsedUnit::EACH,
        };
        let unit = match caps[2].to_uppercase().as_str() {
            "ML" => Unit::Ml,
            "LTR" => Unit::Ltr,
            "KG" => Unit::Kg,
            // GRMS | GM | G
            _ => Unit::Gm,
        };
        ParsedUnit { value, unit }
    }
}

/// Extractor backed by product master data. Falls back to the regex
/// extractor for products the catalog does not know, so a stale master
/// degrades to the name-parsing behavior instead of mis-counting.
#[derive(Debug, Default, Clone)]
pub struct CatalogUnitExtractor {
    catalog: HashMap<String, ParsedUnit>,
}

impl CatalogUnitExtractor {
    pub fn new(catalog: HashMap<String, ParsedUnit>) -> Self {
        Self { catalog }
    }

    pub fn insert(&mut self, product_name: impl Into<String>, parsed: ParsedUnit) {
        self.catalog.insert(product_name.into(), parsed);
    }
}

impl UnitExtractor for CatalogUnitExtractor {
    fn extract(&self, product_name: &str) -> ParsedUnit {
        match self.catalog.get(product_name) {
            Some(parsed) => *parsed,
            None => RegexUnitExtractor.extract(product_name),
        }
    }
}

/// Parse a product name with the default regex strategy.
pub fn parse(product_name: &str) -> ParsedUnit {
    RegexUnitExtractor.extract(product_name)
}

// ---------------------------------------------------------------------------
// Base-unit conversion and crate math
// ---------------------------------------------------------------------------

/// Total base-unit quantity across `ordered_count` packages: liters for
/// ml/ltr, kilograms for gm/kg, a plain count for eaches.
pub fn to_base_units(parsed: ParsedUnit, ordered_count: i64) -> f64 {
    let count = ordered_count as f64;
    match parsed.unit {
        Unit::Ml | Unit::Gm => parsed.value * count / 1000.0,
        Unit::Ltr | Unit::Kg => parsed.value * count,
        Unit::Each => count,
    }
}

/// Crates needed for a base-unit quantity. Floor division: fewer than
/// `UNITS_PER_CRATE` base units contribute zero crates.
pub fn to_crates(base_unit_quantity: f64) -> i64 {
    (base_unit_quantity / UNITS_PER_CRATE).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ml() {
        let parsed = parse("Toned Milk 500 ML");
        assert_eq!(
            parsed,
            ParsedUnit {
                value: 500.0,
                unit: Unit::Ml
            }
        );
    }

    #[test]
    fn test_parse_decimal_ltr() {
        let parsed = parse("Full Cream 1.5 LTR");
        assert_eq!(
            parsed,
            ParsedUnit {
                value: 1.5,
                unit: Unit::Ltr
            }
        );
    }

    #[test]
    fn test_parse_gram_spellings() {
        assert_eq!(parse("Paneer 200 GM").unit, Unit::Gm);
        assert_eq!(parse("Paneer 200 GRMS").unit, Unit::Gm);
        assert_eq!(parse("Paneer 200 G").unit, Unit::Gm);
        assert_eq!(parse("Ghee 1 KG").unit, Unit::Kg);
    }

    #[test]
    fn test_parse_is_case_insensitive_and_tolerates_no_space() {
        assert_eq!(
            parse("curd 400ml"),
            ParsedUnit {
                value: 400.0,
                unit: Unit::Ml
            }
        );
    }

    #[test]
    fn test_parse_first_match_wins() {
        // Two unit substrings: the 500 ML comes first in the text.
        let parsed = parse("Combo 500 ML + 200 GM");
        assert_eq!(
            parsed,
            ParsedUnit {
                value: 500.0,
                unit: Unit::Ml
            }
        );
    }

    #[test]
    fn test_parse_defaults_to_each() {
        assert_eq!(parse("Bread"), ParsedUnit::EACH);
        assert_eq!(parse("Eggs Tray of Thirty"), ParsedUnit::EACH);
        // Digits without a unit token still count as eaches.
        assert_eq!(parse("Lassi 6 Pack"), ParsedUnit::EACH);
    }

    #[test]
    fn test_catalog_extractor_overrides_and_falls_back() {
        let mut extractor = CatalogUnitExtractor::default();
        extractor.insert(
            "House Blend",
            ParsedUnit {
                value: 250.0,
                unit: Unit::Gm,
            },
        );
        assert_eq!(extractor.extract("House Blend").value, 250.0);
        // Unknown product: regex fallback.
        assert_eq!(
            extractor.extract("Toned Milk 500 ML"),
            ParsedUnit {
                value: 500.0,
                unit: Unit::Ml
            }
        );
    }

    #[test]
    fn test_to_base_units_round_trip() {
        // 500ml x 2 packages = 1 liter.
        let parsed = ParsedUnit {
            value: 500.0,
            unit: Unit::Ml,
        };
        assert_eq!(to_base_units(parsed, 2), 1.0);
    }

    #[test]
    fn test_to_base_units_by_unit() {
        let gm = ParsedUnit {
            value: 200.0,
            unit: Unit::Gm,
        };
        let kg = ParsedUnit {
            value: 5.0,
            unit: Unit::Kg,
        };
        let ltr = ParsedUnit {
            value: 1.5,
            unit: Unit::Ltr,
        };
        assert_eq!(to_base_units(gm, 10), 2.0);
        assert_eq!(to_base_units(kg, 3), 15.0);
        assert_eq!(to_base_units(ltr, 4), 6.0);
        assert_eq!(to_base_units(ParsedUnit::EACH, 7), 7.0);
        assert_eq!(to_base_units(gm, 0), 0.0);
    }

    #[test]
    fn test_crate_truncation() {
        assert_eq!(to_crates(11.9), 0);
        assert_eq!(to_crates(12.0), 1);
        assert_eq!(to_crates(23.999), 1);
        assert_eq!(to_crates(24.0), 2);
        assert_eq!(to_crates(0.0), 0);
    }
}
