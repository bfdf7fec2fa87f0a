//! Search tuning.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "weights": { "title": 8.0 }, "tokenizer": { "stem": true } }
//! ```

use crate::error::{Error, Result};
use crate::tokenizer::TokenizerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Score added per query term matched through an API object.
pub const DEFAULT_OBJECT_WEIGHT: f32 = 15.0;

/// Score added per query term found in a document title.
pub const DEFAULT_TITLE_WEIGHT: f32 = 5.0;

/// Score added per query term found in body text, scaled by the posting weight.
pub const DEFAULT_BODY_WEIGHT: f32 = 1.0;

/// Shortest query term that may be expanded as a prefix when it has no exact
/// entry. Raise it to stop one-letter terms from expanding to the vocabulary.
pub const DEFAULT_PREFIX_MIN_LEN: usize = 1;

/// Relative weight of each term tier. Must satisfy `object > title > body > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub object: f32,
    pub title: f32,
    pub body: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self { object: DEFAULT_OBJECT_WEIGHT, title: DEFAULT_TITLE_WEIGHT, body: DEFAULT_BODY_WEIGHT }
    }
}

impl Weights {
    pub fn validate(&self) -> Result<()> {
        let Weights { object, title, body } = *self;
        if ![object, title, body].iter().all(|w| w.is_finite()) {
            return Err(Error::InvalidConfig("weights must be finite".into()));
        }
        if !(object > title && title > body && body > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "weights must satisfy object > title > body > 0, got {object} / {title} / {body}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub weights: Weights,
    pub tokenizer: TokenizerConfig,
    pub prefix_min_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            tokenizer: TokenizerConfig::default(),
            prefix_min_len: DEFAULT_PREFIX_MIN_LEN,
        }
    }
}

impl SearchConfig {
    /// Settings matching how Sphinx builds its index: stemmed keys and the
    /// English stopword list.
    pub fn sphinx() -> Self {
        Self {
            tokenizer: TokenizerConfig { stem: true, stopwords: true, ..Default::default() },
            ..Default::default()
        }
    }

    /// Read a JSON config file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SearchConfig::default().validate().unwrap();
        SearchConfig::sphinx().validate().unwrap();
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: SearchConfig = serde_json::from_str(r#"{"weights": {"title": 8.0}}"#).unwrap();
        assert_eq!(cfg.weights.title, 8.0);
        assert_eq!(cfg.weights.object, DEFAULT_OBJECT_WEIGHT);
        assert_eq!(cfg.prefix_min_len, DEFAULT_PREFIX_MIN_LEN);
        assert!(!cfg.tokenizer.stem);
    }

    #[test]
    fn misordered_weights_are_rejected() {
        let w = Weights { object: 1.0, title: 5.0, body: 1.0 };
        assert!(matches!(w.validate(), Err(Error::InvalidConfig(_))));
        let w = Weights { body: 0.0, ..Default::default() };
        assert!(w.validate().is_err());
        let w = Weights { object: f32::NAN, ..Default::default() };
        assert!(w.validate().is_err());
    }

    #[test]
    fn from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search.json");
        std::fs::write(&path, r#"{"tokenizer": {"stem": true}, "prefix_min_len": 3}"#).unwrap();
        let cfg = SearchConfig::from_file(&path).unwrap();
        assert!(cfg.tokenizer.stem);
        assert_eq!(cfg.prefix_min_len, 3);
    }
}
