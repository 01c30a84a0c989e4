//! Optional lookup tables loaded at session start.
//!
//! Both tables are flat JSON objects (`{"DKI JAKARTA": "Jakarta", ...}`).

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use cuaca_core::TranslationConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTables {
    provinces: HashMap<String, String>,
    conditions: HashMap<String, String>,
}

impl TranslationTables {
    pub fn new(provinces: HashMap<String, String>, conditions: HashMap<String, String>) -> Self {
        Self {
            provinces: lowercase_keys(provinces),
            conditions: lowercase_keys(conditions),
        }
    }

    /// Load the tables named in `config`. Tables without a path are empty.
    pub fn load(config: &TranslationConfig) -> Result<Self> {
        let provinces = match &config.province_table {
            Some(path) => read_table(path)?,
            None => HashMap::new(),
        };
        let conditions = match &config.condition_table {
            Some(path) => read_table(path)?,
            None => HashMap::new(),
        };

        tracing::info!(
            "Loaded {} province and {} condition translations",
            provinces.len(),
            conditions.len()
        );
        Ok(Self::new(provinces, conditions))
    }

    /// Translation for a province display name, matched case-insensitively
    pub fn province(&self, name: &str) -> Option<&str> {
        self.provinces
            .get(&name.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn condition(&self, description: &str) -> Option<&str> {
        self.conditions
            .get(&description.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty() && self.conditions.is_empty()
    }
}

fn lowercase_keys(table: HashMap<String, String>) -> HashMap<String, String> {
    table
        .into_iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v))
        .collect()
}

fn read_table(path: &Path) -> Result<HashMap<String, String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read translation table {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse translation table {}", path.display()))
}
