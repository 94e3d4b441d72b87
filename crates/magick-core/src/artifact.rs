//! Free-form option map
//!
//! User-facing entry points read behavioral settings (kernel scaling,
//! kernel display, compose overrides, verbose tracing) from a string map
//! rather than from function arguments, so that the settings can travel
//! with a processing request without widening every signature.

use std::collections::HashMap;

/// A string-to-string option map
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    values: HashMap<String, String>,
}

impl Artifacts {
    pub fn new() -> Self {
        Artifacts::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// True when the key is present, whatever its value
    pub fn is_set(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}
