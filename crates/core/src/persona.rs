//! Personas: one identity per domain, plus keyword-based domain detection.
//!
//! A persona carries the role description, objective, and golden rules that
//! head every context blob for its domain. The [`PersonaSource`] trait is the
//! collaborator seam; [`PersonaCatalog`] is the bundled implementation that
//! loads a JSON catalog and classifies input by keyword.
//!
//! Catalog format:
//!
//! ```json
//! [
//!   {
//!     "id": "fiscal",
//!     "name": "ABACO",
//!     "semantic_description": "Invoices, tax documents, ICMS",
//!     "persona_config": {
//!       "persona": "A meticulous tax analyst",
//!       "objective": "Validate fiscal documents",
//!       "golden_rules": ["Never guess tax values"]
//!     },
//!     "keywords": ["invoice", "icms", "nfe"]
//!   }
//! ]
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::PersonaError;

/// Domain id returned when no persona keyword matches.
pub const DEFAULT_DOMAIN: &str = "default";

/// Detailed behaviour of a persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Personality and role of the assistant in this domain
    #[serde(rename = "persona")]
    pub role_description: String,

    /// The goal that guides every answer
    pub objective: String,

    /// Ordered rules the assistant must never break.
    /// Order is meaningful and is rendered verbatim.
    #[serde(default)]
    pub golden_rules: Vec<String>,
}

/// A complete identity the assistant can assume, keyed by domain id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Domain id (e.g. "fiscal", "product_catalog")
    pub id: String,

    /// Friendly name shown in the IDENTITY tag
    #[serde(rename = "name")]
    pub display_name: String,

    /// What this domain covers
    #[serde(default)]
    pub semantic_description: String,

    #[serde(rename = "persona_config")]
    pub config: PersonaConfig,
}

/// The persona collaborator.
#[async_trait]
pub trait PersonaSource: Send + Sync {
    /// Look up the persona for a domain id.
    async fn get_persona(&self, domain_id: &str) -> Result<Option<Persona>, PersonaError>;

    /// Classify user input into a domain id. Never absent: unmatched input
    /// maps to a default domain.
    async fn detect_domain(&self, user_input: &str) -> Result<String, PersonaError>;
}

/// A catalog entry: the persona plus the keywords that route input to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub persona: Persona,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

/// In-memory persona catalog with first-match keyword classification.
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    entries: Vec<CatalogEntry>,
    default_domain: String,
}

impl PersonaCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            default_domain: DEFAULT_DOMAIN.into(),
        }
    }

    /// Override the domain returned for unmatched input.
    pub fn with_default_domain(mut self, domain_id: impl Into<String>) -> Self {
        self.default_domain = domain_id.into();
        self
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, PersonaError> {
        let content = std::fs::read_to_string(path).map_err(|e| PersonaError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let catalog = Self::from_json(&content)?;
        debug!(path = %path.display(), personas = catalog.entries.len(), "Persona catalog loaded");
        Ok(catalog)
    }

    /// Parse a catalog from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, PersonaError> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(json).map_err(|e| PersonaError::Invalid(e.to_string()))?;

        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.persona.id.as_str()) {
                return Err(PersonaError::Invalid(format!(
                    "duplicate persona id '{}'",
                    entry.persona.id
                )));
            }
        }

        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn default_domain(&self) -> &str {
        &self.default_domain
    }

    /// First persona (in catalog order) with a keyword contained in the input.
    pub fn classify(&self, user_input: &str) -> &str {
        let lowered = user_input.to_lowercase();
        self.entries
            .iter()
            .find(|entry| {
                entry
                    .keywords
                    .iter()
                    .any(|kw| !kw.is_empty() && lowered.contains(&kw.to_lowercase()))
            })
            .map(|entry| entry.persona.id.as_str())
            .unwrap_or(&self.default_domain)
    }

    pub fn find(&self, domain_id: &str) -> Option<&Persona> {
        self.entries
            .iter()
            .map(|entry| &entry.persona)
            .find(|persona| persona.id == domain_id)
    }
}

#[async_trait]
impl PersonaSource for PersonaCatalog {
    async fn get_persona(&self, domain_id: &str) -> Result<Option<Persona>, PersonaError> {
        Ok(self.find(domain_id).cloned())
    }

    async fn detect_domain(&self, user_input: &str) -> Result<String, PersonaError> {
        Ok(self.classify(user_input).to_string())
    }
}
