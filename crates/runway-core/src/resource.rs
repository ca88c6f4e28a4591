//! Static runway reference data
//!
//! The [`ResourceRegistry`] maps short runway codes (e.g. `"18R"`) to display
//! names (e.g. `"Polderbaan"`). It is built once at startup and never
//! mutated afterwards. Iteration follows insertion order, which is the order
//! in which the watcher diffs runways and emits change events.

use crate::config::ResourceConfig;
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Runway codes and names at Amsterdam Airport Schiphol
const SCHIPHOL_RUNWAYS: &[(&str, &str)] = &[
    ("18L", "Aalsmeerbaan"),
    ("36R", "Aalsmeerbaan"),
    ("09", "Buitenveldertbaan"),
    ("27", "Buitenveldertbaan"),
    ("06", "Kaagbaan"),
    ("24", "Kaagbaan"),
    ("18R", "Polderbaan"),
    ("36L", "Polderbaan"),
    ("18C", "Zwanenburgbaan"),
    ("36C", "Zwanenburgbaan"),
];

/// A runway, identified by its code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    /// Short identifier as reported by the source (e.g. "18R")
    pub code: String,
    /// Human-readable name (e.g. "Polderbaan")
    pub name: String,
}

impl Resource {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// `"Polderbaan (18R)"`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}

/// Immutable lookup of runway codes to runways
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    resources: Vec<Resource>,
    index: HashMap<String, usize>,
}

impl ResourceRegistry {
    /// Build a registry from an ordered list of runways
    ///
    /// # Returns
    ///
    /// - `Err(Error::Config)` if the list is empty, a code is blank, or a
    ///   code appears twice
    pub fn new(resources: Vec<Resource>) -> Result<Self> {
        if resources.is_empty() {
            return Err(Error::config("Resource registry cannot be empty"));
        }

        let mut index = HashMap::with_capacity(resources.len());
        for (position, resource) in resources.iter().enumerate() {
            if resource.code.trim().is_empty() {
                return Err(Error::config("Resource code cannot be empty"));
            }
            if index.insert(resource.code.clone(), position).is_some() {
                return Err(Error::config(format!(
                    "Duplicate resource code: {}",
                    resource.code
                )));
            }
        }

        Ok(Self { resources, index })
    }

    /// The ten Schiphol runway codes
    pub fn schiphol() -> Result<Self> {
        Self::from_config(&schiphol_resource_config())
    }

    /// Build a registry from configuration entries
    pub fn from_config(entries: &[ResourceConfig]) -> Result<Self> {
        Self::new(
            entries
                .iter()
                .map(|entry| Resource::new(entry.code.clone(), entry.name.clone()))
                .collect(),
        )
    }

    /// Look up a runway by code
    pub fn get(&self, code: &str) -> Option<&Resource> {
        self.index.get(code).map(|&position| &self.resources[position])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Runways in registry order
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Default resource table for configuration files
pub(crate) fn schiphol_resource_config() -> Vec<ResourceConfig> {
    SCHIPHOL_RUNWAYS
        .iter()
        .map(|(code, name)| ResourceConfig {
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schiphol_registry() {
        let registry = ResourceRegistry::schiphol().unwrap();
        assert_eq!(registry.len(), 10);
        assert_eq!(registry.get("18R").unwrap().name, "Polderbaan");
        assert_eq!(registry.get("09").unwrap().name, "Buitenveldertbaan");
        assert!(registry.get("99X").is_none());
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let registry = ResourceRegistry::new(vec![
            Resource::new("B", "Bravo"),
            Resource::new("A", "Alpha"),
        ])
        .unwrap();

        let codes: Vec<_> = registry.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "A"]);
    }

    #[test]
    fn test_rejects_duplicates_and_blanks() {
        let duplicate = ResourceRegistry::new(vec![
            Resource::new("A", "Alpha"),
            Resource::new("A", "Again"),
        ]);
        assert!(matches!(duplicate, Err(Error::Config(_))));

        let blank = ResourceRegistry::new(vec![Resource::new(" ", "Nothing")]);
        assert!(matches!(blank, Err(Error::Config(_))));

        assert!(ResourceRegistry::new(Vec::new()).is_err());
    }

    #[test]
    fn test_config_defaults_match_builtin_table() {
        let from_config = ResourceRegistry::from_config(&schiphol_resource_config()).unwrap();
        let builtin = ResourceRegistry::schiphol().unwrap();
        assert!(from_config.iter().eq(builtin.iter()));
    }

    #[test]
    fn test_schiphol_index_matches_order() {
        let registry = ResourceRegistry::schiphol().unwrap();
        for (code, _) in SCHIPHOL_RUNWAYS {
            assert_eq!(registry.get(code).map(|r| r.code.as_str()), Some(*code));
        }
        let codes = registry.iter().map(|r| r.code.as_str());
        assert!(codes.eq(SCHIPHOL_RUNWAYS.iter().map(|(code, _)| *code)));
    }

    #[test]
    fn test_label() {
        assert_eq!(Resource::new("18R", "Polderbaan").label(), "Polderbaan (18R)");
    }
}
