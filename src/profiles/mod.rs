//! Site profiles: per-vendor rules for locating the price on a product page.
//!
//! A [`SiteProfile`] is an ordered list of [`ProbeRule`]s. Rules are tried
//! strictly in sequence and the first one yielding non-empty text wins; there
//! is no scoring or merging of results.
//!
//! The [`ProfileRegistry`] is built once at start-up and is read-only
//! afterwards. Lookups never fail: an unknown identifier resolves to the
//! `generic` profile so that a bad configuration value still produces an
//! extraction attempt.

mod builtin;

use std::collections::HashMap;
use std::path::Path;

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::RegistryError;

pub use builtin::GENERIC_ID;

/// Serialized form of a single document query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDef {
    /// CSS selector; only the first matching element is read
    pub selector: String,
    /// Attribute to read instead of the element text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,
}

/// Serialized form of a probe: a query plus an optional secondary query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeDef {
    #[serde(flatten)]
    pub query: QueryDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<QueryDef>,
}

/// Serialized form of a site profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDef {
    pub id: String,
    /// Human readable name, also accepted by [`ProfileRegistry::resolve`]
    pub name: String,
    pub probes: Vec<ProbeDef>,
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    profiles: Vec<ProfileDef>,
}

/// A compiled document query.
#[derive(Debug, Clone)]
pub struct Query {
    source: String,
    selector: Selector,
    attr: Option<String>,
}

impl Query {
    fn compile(profile: &str, def: &QueryDef) -> Result<Self, RegistryError> {
        let selector =
            Selector::parse(&def.selector).map_err(|e| RegistryError::InvalidSelector {
                profile: profile.to_string(),
                selector: def.selector.clone(),
                reason: format!("{e:?}"),
            })?;

        Ok(Self {
            source: def.selector.clone(),
            selector,
            attr: def.attr.clone(),
        })
    }

    /// Reads the first matching element, returning its text (or attribute)
    /// untouched when non-empty. Whitespace counts as text.
    #[must_use]
    pub fn read(&self, document: &Html) -> Option<String> {
        let element = document.select(&self.selector).next()?;

        let raw = match &self.attr {
            Some(attr) => element.value().attr(attr)?.to_string(),
            None => element.text().collect::<String>(),
        };

        (!raw.is_empty()).then_some(raw)
    }

    #[must_use]
    pub fn selector(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn attr(&self) -> Option<&str> {
        self.attr.as_deref()
    }
}

/// One probe: the secondary query is only tried when the first yields nothing.
#[derive(Debug, Clone)]
pub struct ProbeRule {
    primary: Query,
    fallback: Option<Query>,
}

impl ProbeRule {
    fn compile(profile: &str, def: &ProbeDef) -> Result<Self, RegistryError> {
        Ok(Self {
            primary: Query::compile(profile, &def.query)?,
            fallback: def
                .fallback
                .as_ref()
                .map(|q| Query::compile(profile, q))
                .transpose()?,
        })
    }

    #[must_use]
    pub fn apply(&self, document: &Html) -> Option<String> {
        self.primary
            .read(document)
            .or_else(|| self.fallback.as_ref().and_then(|q| q.read(document)))
    }

    #[must_use]
    pub fn primary(&self) -> &Query {
        &self.primary
    }

    #[must_use]
    pub fn fallback(&self) -> Option<&Query> {
        self.fallback.as_ref()
    }
}

/// Named extraction rule set for one vendor platform.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    id: String,
    name: String,
    probes: Vec<ProbeRule>,
}

impl SiteProfile {
    fn compile(def: &ProfileDef) -> Result<Self, RegistryError> {
        let probes = def
            .probes
            .iter()
            .map(|probe| ProbeRule::compile(&def.id, probe))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: def.id.trim().to_lowercase(),
            name: def.name.clone(),
            probes,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn probes(&self) -> &[ProbeRule] {
        &self.probes
    }

    /// Applies the probes in order and returns the first non-empty text.
    #[must_use]
    pub fn find_price_text(&self, document: &Html) -> Option<String> {
        self.probes.iter().find_map(|probe| probe.apply(document))
    }
}

/// Immutable mapping from profile identifier to [`SiteProfile`].
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    generic: SiteProfile,
    profiles: HashMap<String, SiteProfile>,
}

impl ProfileRegistry {
    /// Builds the registry from the built-in profile table.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidSelector`] if a built-in selector does
    /// not parse.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_definitions(&builtin::definitions())
    }

    /// Builds a registry from explicit definitions.
    ///
    /// A `generic` profile with no probes is supplied if the definitions do
    /// not contain one; later definitions replace earlier ones with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidSelector`] for any selector that does
    /// not parse.
    pub fn from_definitions(defs: &[ProfileDef]) -> Result<Self, RegistryError> {
        let mut registry = Self {
            generic: SiteProfile {
                id: GENERIC_ID.to_string(),
                name: "Generic".to_string(),
                probes: Vec::new(),
            },
            profiles: HashMap::new(),
        };
        registry.merge(defs)?;
        Ok(registry)
    }

    /// Adds or replaces profiles from a JSON document of the form
    /// `{"profiles": [{"id", "name", "probes": [...]}]}`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Parse`] for malformed JSON and
    /// [`RegistryError::InvalidSelector`] for bad selectors.
    pub fn with_overlay_json(mut self, json: &str) -> Result<Self, RegistryError> {
        let file: ProfileFile = serde_json::from_str(json)?;
        self.merge(&file.profiles)?;
        Ok(self)
    }

    /// Same as [`Self::with_overlay_json`], reading the document from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] if the file cannot be read.
    pub fn with_overlay_file(self, path: &Path) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path)?;
        let registry = self.with_overlay_json(&json)?;
        info!(
            "Loaded profile overlay from {} ({} profiles known)",
            path.display(),
            registry.len()
        );
        Ok(registry)
    }

    fn merge(&mut self, defs: &[ProfileDef]) -> Result<(), RegistryError> {
        for def in defs {
            let profile = SiteProfile::compile(def)?;
            if profile.id == GENERIC_ID {
                self.generic = profile;
            } else {
                self.profiles.insert(profile.id.clone(), profile);
            }
        }
        Ok(())
    }

    /// Looks up a profile by id, then by display name (both case-insensitive).
    /// Anything else resolves to the `generic` profile.
    #[must_use]
    pub fn resolve(&self, profile_id: &str) -> &SiteProfile {
        let key = profile_id.trim().to_lowercase();

        if key == GENERIC_ID {
            return &self.generic;
        }

        if let Some(profile) = self.profiles.get(&key) {
            return profile;
        }

        // Lowest id wins when display names collide.
        if let Some(profile) = self
            .profiles
            .values()
            .filter(|profile| profile.name.to_lowercase() == key)
            .min_by(|a, b| a.id.cmp(&b.id))
        {
            return profile;
        }

        warn!("Unknown profile \"{}\", using \"{}\"", profile_id, GENERIC_ID);
        &self.generic
    }

    /// Whether `profile_id` names a known profile exactly (after trimming and lowercasing).
    #[must_use]
    pub fn contains(&self, profile_id: &str) -> bool {
        let key = profile_id.trim().to_lowercase();
        key == GENERIC_ID || self.profiles.contains_key(&key)
    }

    /// Known profile ids, `generic` first and the rest sorted.
    #[must_use]
    pub fn known_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids.insert(0, GENERIC_ID);
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len() + 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}
