//! Retail price tracking across vendor websites.
//!
//! The core is [`extractor::PriceExtractor`]: given a product page URL and a
//! site profile id it fetches the page, applies the profile's probes and
//! normalizes the text found into an integer price. Around it sit a SQLite
//! product store, a scheduled "check all prices" loop and a simulated-price
//! fallback for failed extractions.

pub mod compare;
pub mod config;
pub mod database;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod normalize;
pub mod price_tracker;
pub mod profiles;
pub mod simulate;

pub use error::{ExtractError, RegistryError};
pub use extractor::{PriceExtractor, PriceQuote};
pub use price_tracker::PriceTracker;
