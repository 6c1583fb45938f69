//! Engine options, resolved once before any site is created.

use crate::specialize::DEFAULT_POLYMORPHISM_LIMIT;
use tracing::warn;

pub const ENV_POLYMORPHISM_LIMIT: &str = "JSNODE_POLYMORPHISM_LIMIT";
pub const ENV_FOREIGN_HASH_PROPERTIES: &str = "JSNODE_FOREIGN_HASH_PROPERTIES";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    /// Maximum number of specializations a site holds before it
    /// generalizes. Never below 1.
    pub polymorphism_limit: usize,
    /// Delete foreign hash entries as if they were properties.
    pub foreign_hash_properties: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            polymorphism_limit: DEFAULT_POLYMORPHISM_LIMIT,
            foreign_hash_properties: false,
        }
    }
}

impl ContextOptions {
    /// Defaults overridden by the `JSNODE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`ContextOptions::from_env`], reading variables through `lookup`.
    /// Unparsable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(raw) = lookup(ENV_POLYMORPHISM_LIMIT) {
            match raw.trim().parse::<usize>() {
                Ok(limit) => options = options.with_polymorphism_limit(limit),
                Err(err) => warn!(
                    variable = ENV_POLYMORPHISM_LIMIT,
                    value = %raw,
                    %err,
                    "ignoring invalid value"
                ),
            }
        }
        if let Some(raw) = lookup(ENV_FOREIGN_HASH_PROPERTIES) {
            match parse_bool(&raw) {
                Some(enabled) => options.foreign_hash_properties = enabled,
                None => warn!(
                    variable = ENV_FOREIGN_HASH_PROPERTIES,
                    value = %raw,
                    "ignoring invalid value"
                ),
            }
        }
        options
    }

    pub fn with_polymorphism_limit(mut self, limit: usize) -> Self {
        self.polymorphism_limit = limit.max(1);
        self
    }

    pub fn with_foreign_hash_properties(mut self, enabled: bool) -> Self {
        self.foreign_hash_properties = enabled;
        self
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
