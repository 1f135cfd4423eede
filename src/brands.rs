//! Brand-level crate totals.
//!
//! The brand is taken as the first whitespace-delimited token of the
//! product name, upper-cased ("Amul Milk 500 ML" -> "AMUL"). Multi-word
//! brands therefore collapse to their first word; the totals table keeps
//! that visible rather than guessing. Output is sorted by brand name so
//! two generations of the same data render identically.

use indexmap::IndexMap;
use serde::Serialize;

use crate::consolidate::ConsolidatedProduct;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrandTotal {
    pub brand: String,
    pub total_crates: i64,
}

/// Derive the brand key from a product name.
pub fn brand_key(product_name: &str) -> String {
    product_name
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_uppercase()
}

/// Sum crate totals per brand across the consolidated products of one
/// route bucket.
pub fn aggregate_brands(consolidated: &IndexMap<String, ConsolidatedProduct>) -> Vec<BrandTotal> {
    let mut sums: IndexMap<String, i64> = IndexMap::new();
    for (product_name, product) in consolidated {
        *sums.entry(brand_key(product_name)).or_insert(0) += product.total_crates;
    }

    let mut totals: Vec<BrandTotal> = sums
        .into_iter()
        .map(|(brand, total_crates)| BrandTotal {
            brand,
            total_crates,
        })
        .collect();
    totals.sort_by(|a, b| a.brand.cmp(&b.brand));
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(crates: i64) -> ConsolidatedProduct {
        ConsolidatedProduct {
            total_crates: crates,
            ..Default::default()
        }
    }

    #[test]
    fn test_brand_key_is_first_token_uppercased() {
        assert_eq!(brand_key("Amul Milk 500 ML"), "AMUL");
        assert_eq!(brand_key("  nandini Curd"), "NANDINI");
        assert_eq!(brand_key(""), "");
    }

    #[test]
    fn test_brands_sum_across_products() {
        let mut consolidated = IndexMap::new();
        consolidated.insert("Amul Milk 500 ML".to_string(), product(3));
        consolidated.insert("Amul Butter 200 GM".to_string(), product(2));
        consolidated.insert("Nandini Milk 500 ML".to_string(), product(4));

        let totals = aggregate_brands(&consolidated);
        assert_eq!(
            totals,
            vec![
                BrandTotal {
                    brand: "AMUL".into(),
                    total_crates: 5
                },
                BrandTotal {
                    brand: "NANDINI".into(),
                    total_crates: 4
                },
            ]
        );
    }

    #[test]
    fn test_output_is_sorted_by_brand() {
        let mut consolidated = IndexMap::new();
        consolidated.insert("Zed Cola 500 ML".to_string(), product(1));
        consolidated.insert("Amul Milk 500 ML".to_string(), product(1));
        let totals = aggregate_brands(&consolidated);
        assert_eq!(totals[0].brand, "AMUL");
        assert_eq!(totals[1].brand, "ZED");
    }
}
