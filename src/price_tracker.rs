use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::compare::compare_all;
use crate::config::Config;
use crate::database::Database;
use crate::extractor::PriceExtractor;
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::models::{PriceCheck, PriceObservation, PriceSource, TrackedProduct};
use crate::profiles::ProfileRegistry;
use crate::simulate::simulate_price;

/// Checks tracked products' prices, records real prices and falls back to
/// simulated ones when extraction fails.
pub struct PriceTracker<F = HttpFetcher> {
    extractor: Arc<PriceExtractor<F>>,
    database: Database,
    reference_website: String,
    max_concurrency: usize,
    simulate_on_failure: bool,
}

impl PriceTracker<HttpFetcher> {
    pub async fn new(config: &Config) -> Result<Self> {
        let mut registry = ProfileRegistry::builtin()?;
        if let Some(path) = &config.profiles_path {
            registry = registry.with_overlay_file(path)?;
        }

        let fetcher = HttpFetcher::from_config(config).context("building HTTP client")?;
        let database = Database::new(&config.database_url).await?;

        Ok(Self::with_parts(
            PriceExtractor::new(fetcher, Arc::new(registry)),
            database,
            config,
        ))
    }
}

impl<F: PageFetcher> PriceTracker<F> {
    pub fn with_parts(extractor: PriceExtractor<F>, database: Database, config: &Config) -> Self {
        Self {
            extractor: Arc::new(extractor),
            database,
            reference_website: config.reference_website.clone(),
            max_concurrency: config.max_concurrency.max(1),
            simulate_on_failure: config.simulate_on_failure,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Checks one product. Only scraped prices are written to the history;
    /// a failed write is logged and the scraped check is still returned.
    pub async fn check_product(&self, product: &TrackedProduct) -> PriceCheck {
        let checked_at = Utc::now();

        match self.extractor.extract(&product.url, &product.profile_id).await {
            Ok(quote) => {
                let observation = PriceObservation {
                    instance_id: product.instance_id.clone(),
                    product_id: product.product_id.clone(),
                    website: product.website.clone(),
                    price: quote.price,
                    observed_at: checked_at,
                };
                if let Err(e) = self.database.save_observation(&observation).await {
                    error!("Error saving price for {}: {:#}", product.url, e);
                }

                PriceCheck {
                    instance_id: product.instance_id.clone(),
                    product_id: product.product_id.clone(),
                    website: product.website.clone(),
                    price: Some(quote.price),
                    source: PriceSource::Scraped,
                    error: None,
                    checked_at,
                }
            }
            Err(e) => {
                let price = self.simulate_on_failure.then(|| simulate_price(&product.url));
                if let Some(simulated) = price {
                    warn!(
                        "Using simulated price {} for {} ({})",
                        simulated,
                        product.url,
                        e.kind()
                    );
                }

                PriceCheck {
                    instance_id: product.instance_id.clone(),
                    product_id: product.product_id.clone(),
                    website: product.website.clone(),
                    price,
                    source: PriceSource::Simulated,
                    error: Some(e.to_string()),
                    checked_at,
                }
            }
        }
    }

    /// Checks every stored product, at most `max_concurrency` at a time.
    /// Results come back in the store's product order.
    pub async fn check_all_prices(&self) -> Result<Vec<PriceCheck>> {
        let products = self.database.list_products().await?;
        info!(
            "Checking prices for {} products (concurrency {})",
            products.len(),
            self.max_concurrency
        );

        let checks: Vec<PriceCheck> = stream::iter(products)
            .map(|product| async move { self.check_product(&product).await })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let failed = checks.iter().filter(|c| c.is_simulated()).count();
        if failed > 0 {
            warn!("{} of {} price checks failed", failed, checks.len());
        } else {
            info!("All {} price checks succeeded", checks.len());
        }

        for comparison in compare_all(&self.reference_website, &checks) {
            for undercut in &comparison.cheaper {
                info!(
                    "{} is cheaper at {}: {} ({} below {})",
                    comparison.product_id,
                    undercut.website,
                    undercut.price,
                    undercut.difference,
                    self.reference_website
                );
            }
        }

        Ok(checks)
    }
}

impl<F> Clone for PriceTracker<F> {
    fn clone(&self) -> Self {
        Self {
            extractor: Arc::clone(&self.extractor),
            database: self.database.clone(),
            reference_website: self.reference_website.clone(),
            max_concurrency: self.max_concurrency,
            simulate_on_failure: self.simulate_on_failure,
        }
    }
}
