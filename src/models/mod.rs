//! Data models for tracked products, price observations and price checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profiles::GENERIC_ID;

/// A product page on one website that we track the price of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedProduct {
    pub instance_id: String,
    /// Shared across websites selling the same product
    pub product_id: String,
    pub name: String,
    pub url: String,
    pub website: String,
    /// Site profile used to extract the price, unknown ids act as `generic`
    pub profile_id: String,
    pub category: Option<String>,
    pub brand: Option<String>,
}

impl TrackedProduct {
    /// New product with an instance id derived from its website and URL.
    pub fn new(
        product_id: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        website: impl Into<String>,
        profile_id: Option<&str>,
    ) -> Self {
        let url = url.into();
        let website = website.into();
        let profile_id = profile_id
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(GENERIC_ID)
            .to_string();

        Self {
            instance_id: instance_id_for(&website, &url),
            product_id: product_id.into(),
            name: name.into(),
            url,
            website,
            profile_id,
            category: None,
            brand: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }
}

/// Stable instance id for a product page.
#[must_use]
pub fn instance_id_for(website: &str, url: &str) -> String {
    format!("{:x}", md5::compute(format!("{website}:{url}")))
}

/// A scraped price, appended to the price history and never modified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceObservation {
    pub instance_id: String,
    pub product_id: String,
    pub website: String,
    pub price: u64,
    pub observed_at: DateTime<Utc>,
}

/// Where the price in a [`PriceCheck`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Scraped,
    /// Placeholder after a failed extraction, must be shown as unverified
    Simulated,
}

/// Outcome of checking one product's price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCheck {
    pub instance_id: String,
    pub product_id: String,
    pub website: String,
    pub price: Option<u64>,
    pub source: PriceSource,
    /// Extraction error when the price is simulated or missing
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl PriceCheck {
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.source == PriceSource::Simulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_id_is_stable_per_page() {
        let a = TrackedProduct::new("SKU-001", "Mouse", "https://a.vn/m", "A", None);
        let b = TrackedProduct::new("SKU-002", "Other", "https://a.vn/m", "A", Some("meta"));
        let c = TrackedProduct::new("SKU-001", "Mouse", "https://a.vn/m", "B", None);

        assert_eq!(a.instance_id, b.instance_id);
        assert_ne!(a.instance_id, c.instance_id);
        assert_eq!(a.instance_id.len(), 32);
    }

    #[test]
    fn missing_profile_defaults_to_generic() {
        let product = TrackedProduct::new("SKU-001", "Mouse", "https://a.vn/m", "A", Some("  "));
        assert_eq!(product.profile_id, GENERIC_ID);
    }

    #[test]
    fn product_serializes_camel_case() {
        let product = TrackedProduct::new("SKU-9", "Tai nghe", "https://x.vn", "MyStore", Some("woocommerce"))
            .with_brand("Sony");
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["productId"], "SKU-9");
        assert_eq!(json["profileId"], "woocommerce");
        assert_eq!(json["brand"], "Sony");
        assert!(json["category"].is_null());
    }

    #[test]
    fn price_source_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PriceSource::Simulated).unwrap(),
            "\"simulated\""
        );
    }
}
