//! Comparison of competitor prices against the reference store.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::PriceCheck;

/// Price of `product_id` on the reference website, if one was checked.
///
/// Simulated reference prices are accepted; only competitors must be scraped.
#[must_use]
pub fn reference_price(product_id: &str, reference_website: &str, checks: &[PriceCheck]) -> Option<u64> {
    checks
        .iter()
        .filter(|c| c.product_id == product_id && c.website == reference_website)
        .find_map(|c| c.price)
}

/// Competitor checks with a scraped price strictly below `reference`.
#[must_use]
pub fn cheaper_competitors<'a>(
    product_id: &str,
    reference_website: &str,
    reference: u64,
    checks: &'a [PriceCheck],
) -> Vec<&'a PriceCheck> {
    checks
        .iter()
        .filter(|c| {
            c.product_id == product_id
                && c.website != reference_website
                && !c.is_simulated()
                && c.price.is_some_and(|p| p < reference)
        })
        .collect()
}

/// Competitor undercutting the reference store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Undercut {
    pub website: String,
    pub price: u64,
    pub difference: u64,
}

/// Per-product comparison summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub product_id: String,
    pub reference_price: Option<u64>,
    pub cheaper: Vec<Undercut>,
}

/// One [`Comparison`] per distinct product id, in product id order.
#[must_use]
pub fn compare_all(reference_website: &str, checks: &[PriceCheck]) -> Vec<Comparison> {
    let product_ids: BTreeSet<&str> = checks.iter().map(|c| c.product_id.as_str()).collect();

    product_ids
        .into_iter()
        .map(|product_id| {
            let reference = reference_price(product_id, reference_website, checks);
            let cheaper = reference
                .map(|r| {
                    cheaper_competitors(product_id, reference_website, r, checks)
                        .into_iter()
                        .filter_map(|c| {
                            c.price.map(|price| Undercut {
                                website: c.website.clone(),
                                price,
                                difference: r - price,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();

            Comparison {
                product_id: product_id.to_string(),
                reference_price: reference,
                cheaper,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::PriceSource;

    fn check(product_id: &str, website: &str, price: Option<u64>, source: PriceSource) -> PriceCheck {
        PriceCheck {
            instance_id: format!("{product_id}-{website}"),
            product_id: product_id.to_string(),
            website: website.to_string(),
            price,
            source,
            error: None,
            checked_at: Utc::now(),
        }
    }

    fn checks() -> Vec<PriceCheck> {
        vec![
            check("SKU-1", "MyStore", Some(1_000_000), PriceSource::Scraped),
            check("SKU-1", "Cheap", Some(900_000), PriceSource::Scraped),
            check("SKU-1", "Pricey", Some(1_100_000), PriceSource::Scraped),
            check("SKU-1", "Equal", Some(1_000_000), PriceSource::Scraped),
            check("SKU-1", "Fake", Some(100_000), PriceSource::Simulated),
            check("SKU-1", "Unknown", None, PriceSource::Scraped),
            check("SKU-2", "Cheap", Some(50_000), PriceSource::Scraped),
        ]
    }

    #[test]
    fn reference_comes_from_reference_website() {
        let checks = checks();
        assert_eq!(reference_price("SKU-1", "MyStore", &checks), Some(1_000_000));
        assert_eq!(reference_price("SKU-2", "MyStore", &checks), None);
    }

    #[test]
    fn simulated_reference_is_accepted() {
        let checks = vec![check("SKU-3", "MyStore", Some(700_000), PriceSource::Simulated)];
        assert_eq!(reference_price("SKU-3", "MyStore", &checks), Some(700_000));
    }

    #[test]
    fn only_strictly_cheaper_scraped_competitors() {
        let checks = checks();
        let cheaper = cheaper_competitors("SKU-1", "MyStore", 1_000_000, &checks);
        let websites: Vec<&str> = cheaper.iter().map(|c| c.website.as_str()).collect();
        assert_eq!(websites, vec!["Cheap"]);
    }

    #[test]
    fn summary_per_product() {
        let summary = compare_all("MyStore", &checks());
        assert_eq!(
            summary,
            vec![
                Comparison {
                    product_id: "SKU-1".to_string(),
                    reference_price: Some(1_000_000),
                    cheaper: vec![Undercut {
                        website: "Cheap".to_string(),
                        price: 900_000,
                        difference: 100_000,
                    }],
                },
                Comparison {
                    product_id: "SKU-2".to_string(),
                    reference_price: None,
                    cheaper: vec![],
                },
            ]
        );
    }
}
