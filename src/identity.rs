//! Detail-page URL parsing
//!
//! Icon detail pages look like `https://host/icons/<digits>/<name>[_<variant>]_icon`.
//! The variant is only recognised when it belongs to the configured tag set;
//! anything else stays part of the name.

use crate::error::{ParseFailure, Result};
use crate::types::{AssetIdentity, DEFAULT_VARIANT};
use regex::Regex;

/// Turns detail-page URLs into [`AssetIdentity`] values
#[derive(Clone, Debug)]
pub struct IdentityParser {
    pattern: Regex,
    prefix: String,
}

impl IdentityParser {
    /// Build a parser for a variant tag set and an optional name prefix to strip
    pub fn new<S: AsRef<str>>(variants: &[S], prefix: impl Into<String>) -> Result<Self> {
        let tags: Vec<String> = variants
            .iter()
            .map(|t| regex::escape(t.as_ref().trim()))
            .filter(|t| !t.is_empty())
            .collect();

        let variant_group = if tags.is_empty() {
            String::new()
        } else {
            format!("(?:_({}))?", tags.join("|"))
        };
        let pattern = Regex::new(&format!(
            r"(?i)/icons/(\d+)/([a-z0-9_]+?){variant_group}_icon$"
        ))?;

        Ok(Self {
            pattern,
            prefix: prefix.into(),
        })
    }

    /// Parser configured from [`Config`](crate::Config)
    pub fn from_config(config: &crate::Config) -> Result<Self> {
        Self::new(&config.catalog.icon_types, config.catalog.prefix_to_remove.clone())
    }

    /// Extract the identity from one URL
    pub fn parse(&self, url: &str) -> std::result::Result<AssetIdentity, ParseFailure> {
        let failure = || ParseFailure {
            url: url.to_string(),
        };

        let caps = self.pattern.captures(url).ok_or_else(failure)?;
        let numeric_id = caps.get(1).ok_or_else(failure)?.as_str().to_string();
        let raw_name = caps.get(2).ok_or_else(failure)?.as_str();

        let lowered = raw_name.to_lowercase();
        let trimmed = lowered.trim_end_matches('_');
        let base_name = trimmed.strip_prefix(self.prefix.as_str()).unwrap_or(trimmed);
        if base_name.is_empty() {
            return Err(failure());
        }

        let variant = caps
            .get(3)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_else(|| DEFAULT_VARIANT.to_string());

        Ok(AssetIdentity {
            numeric_id,
            base_name: base_name.to_string(),
            variant,
        })
    }
}
