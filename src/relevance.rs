// src/relevance.rs
//! Cheap deterministic pre-filter gating oracle calls: plain substring
//! containment against keyword sets, no tokenization or stemming. The
//! imprecision (e.g. "us" matching inside unrelated words) is accepted;
//! the oracle corrects false positives downstream.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::ingest::types::Article;

// --- env defaults & names ---
pub const DEFAULT_KEYWORDS_CONFIG_PATH: &str = "config/keywords.toml";
pub const ENV_KEYWORDS_CONFIG_PATH: &str = "KEYWORDS_CONFIG_PATH";

/// Built-in copy of the shipped rules, used when no config file is found.
const EMBEDDED_RULES: &str = include_str!("../config/keywords.toml");

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
struct KeywordRoot {
    action: TermSet,
    party_a: TermSet,
    party_b: TermSet,
}

#[derive(Debug, Clone, Deserialize)]
struct TermSet {
    terms: Vec<String>,
}

fn lowered(set: TermSet) -> Vec<String> {
    set.terms
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Two-keyword-set rule: a record is relevant only with at least one
/// action term AND at least one party term (either side).
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    action: Vec<String>,
    party_a: Vec<String>,
    party_b: Vec<String>,
}

impl RelevanceFilter {
    /// Load from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let root: KeywordRoot = toml::from_str(toml_str)?;
        let filter = Self {
            action: lowered(root.action),
            party_a: lowered(root.party_a),
            party_b: lowered(root.party_b),
        };
        if filter.action.is_empty() || (filter.party_a.is_empty() && filter.party_b.is_empty()) {
            anyhow::bail!("keyword config must provide action terms and party terms");
        }
        Ok(filter)
    }

    /// Load from a TOML file. Uses KEYWORDS_CONFIG_PATH or defaults to
    /// "config/keywords.toml"; falls back to the embedded rules when no
    /// file is present.
    pub fn from_toml() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_KEYWORDS_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_KEYWORDS_CONFIG_PATH));

        match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|e| {
                anyhow::anyhow!("invalid keyword config at {}: {}", path.display(), e)
            }),
            Err(_) => {
                tracing::warn!(path = %path.display(), "keyword config not found, using embedded rules");
                Self::from_toml_str(EMBEDDED_RULES)
            }
        }
    }

    /// Evaluate raw text (already concatenated title + summary).
    pub fn text_is_relevant(&self, text: &str) -> bool {
        let lower = text.to_lowercase();

        let has_action = self.action.iter().any(|k| lower.contains(k.as_str()));
        if !has_action {
            return false;
        }

        let mentions_a = self.party_a.iter().any(|k| lower.contains(k.as_str()));
        let mentions_b = self.party_b.iter().any(|k| lower.contains(k.as_str()));
        mentions_a || mentions_b
    }

    pub fn is_relevant(&self, article: &Article) -> bool {
        self.text_is_relevant(&format!("{} {}", article.title, article.summary))
    }
}

/* ----------------------------
Tests
---------------------------- */
