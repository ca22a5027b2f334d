//! Price extraction: fetch, parse, probe, normalize.
//!
//! [`PriceExtractor::extract`] is the entry point transport layers call with
//! a URL and a profile id. It never retries or falls back on its own; the
//! precise [`ExtractError`] is handed back so the caller can decide what to
//! do (log, alert, or use a simulated price).

use std::sync::Arc;

use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ExtractError;
use crate::fetcher::PageFetcher;
use crate::normalize::normalize_price;
use crate::profiles::{ProfileRegistry, SiteProfile};

/// Successful extraction, serialized as `{"price": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: u64,
}

/// Applies a profile to already-fetched markup.
///
/// # Errors
///
/// [`ExtractError::ElementNotFound`] when every probe yields empty text,
/// [`ExtractError::Unparseable`] when the text found (whitespace included)
/// has no digits.
pub fn extract_from_html(html: &str, profile: &SiteProfile) -> Result<u64, ExtractError> {
    let document = Html::parse_document(html);

    let Some(text) = profile.find_price_text(&document) else {
        return Err(ExtractError::ElementNotFound);
    };

    normalize_price(Some(text.as_str())).inspect_err(|_| {
        error!("Could not parse price from text: {:?}", text);
    })
}

/// Extraction engine owning its fetcher and an immutable profile registry.
pub struct PriceExtractor<F> {
    fetcher: F,
    registry: Arc<ProfileRegistry>,
}

impl<F: PageFetcher> PriceExtractor<F> {
    pub fn new(fetcher: F, registry: Arc<ProfileRegistry>) -> Self {
        Self { fetcher, registry }
    }

    #[must_use]
    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetches `url` and extracts its price with the rules of `profile_id`.
    ///
    /// Unknown profile ids are treated as `generic`. Every call re-fetches.
    ///
    /// # Errors
    ///
    /// [`ExtractError::Network`] if the page could not be fetched (checked
    /// before any profile is consulted), otherwise as [`extract_from_html`].
    pub async fn extract(&self, url: &str, profile_id: &str) -> Result<PriceQuote, ExtractError> {
        let html = self.fetcher.fetch(url).await.inspect_err(|e| {
            error!("Error scraping {}: {}", url, e);
        })?;

        let profile = self.registry.resolve(profile_id);
        info!("Scraping {} with profile: {}", url, profile.id());

        match extract_from_html(&html, profile) {
            Ok(price) => {
                info!("Found price: {}", price);
                Ok(PriceQuote { price })
            }
            Err(e) => {
                error!("{} for {} ({})", e, url, e.kind());
                Err(e)
            }
        }
    }
}

impl<F: Clone> Clone for PriceExtractor<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}
