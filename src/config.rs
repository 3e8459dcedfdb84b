//! Configuration management for span anchoring

use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Anchoring configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// How a boundary between two text leaves reads during matching
    pub leaf_boundary: LeafBoundary,
    /// Strip combining marks when folding characters ("Café" matches "cafe")
    pub fold_diacritics: bool,
    /// Check index invariants after every add/remove even in release builds
    pub verify_invariants: bool,
    /// Markup used when rendering annotation wrappers
    pub markup: MarkupConfig,
}

/// Treatment of the boundary between two adjacent text leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafBoundary {
    /// A boundary reads as one whitespace character, or as nothing when
    /// comparing span text
    Space,
    /// A boundary contributes nothing; fragments join directly
    Join,
}

/// Configuration for wrapper markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Element name of a wrapper
    pub tag: String,
    /// CSS class placed on every wrapper
    pub class_name: String,
    /// Data attribute carrying the annotation id
    pub id_attribute: String,
    /// Data attribute carrying the leaf's index within its annotation
    pub sub_attribute: String,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl Default for AnchorConfig {
    fn default() -> Self {
        AnchorConfig {
            leaf_boundary: LeafBoundary::Space,
            fold_diacritics: false,
            verify_invariants: false,
            markup: MarkupConfig::default(),
        }
    }
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            tag: "span".to_string(),
            class_name: "ll-highlight".to_string(),
            id_attribute: "data-annotation-id".to_string(),
            sub_attribute: "data-annotation-sub".to_string(),
        }
    }
}

impl AnchorConfig {
    /// Load configuration from `SPAN_ANCHOR_*` environment variables,
    /// falling back to defaults for unset keys
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = AnchorConfig::default();
        let markup_defaults = MarkupConfig::default();

        let leaf_boundary = match env::var("SPAN_ANCHOR_LEAF_BOUNDARY") {
            Ok(value) => match value.trim().to_lowercase().as_str() {
                "space" => LeafBoundary::Space,
                "join" => LeafBoundary::Join,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "SPAN_ANCHOR_LEAF_BOUNDARY",
                        value,
                    })
                }
            },
            Err(_) => defaults.leaf_boundary,
        };

        Ok(AnchorConfig {
            leaf_boundary,
            fold_diacritics: bool_var("SPAN_ANCHOR_FOLD_DIACRITICS", defaults.fold_diacritics)?,
            verify_invariants: bool_var("SPAN_ANCHOR_VERIFY", defaults.verify_invariants)?,
            markup: MarkupConfig {
                tag: env::var("SPAN_ANCHOR_WRAPPER_TAG").unwrap_or(markup_defaults.tag),
                class_name: env::var("SPAN_ANCHOR_WRAPPER_CLASS")
                    .unwrap_or(markup_defaults.class_name),
                ..markup_defaults
            },
        })
    }
}

fn bool_var(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(value) = env::var(key) else {
        return Ok(default);
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnchorConfig::default();
        assert_eq!(config.leaf_boundary, LeafBoundary::Space);
        assert!(!config.fold_diacritics);
        assert_eq!(config.markup.id_attribute, "data-annotation-id");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AnchorConfig =
            serde_json::from_str(r#"{"leaf_boundary":"join","markup":{"tag":"mark"}}"#).unwrap();
        assert_eq!(config.leaf_boundary, LeafBoundary::Join);
        assert_eq!(config.markup.tag, "mark");
        assert_eq!(config.markup.class_name, "ll-highlight");
        assert!(!config.verify_invariants);
    }
}
