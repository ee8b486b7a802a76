use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One browsable category as declared in the catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryItem {
    pub description: String,
    /// Full listing URL for the first page of the category.
    pub link: String,
    /// Expected US price bands, passed to the verification prompt.
    #[serde(default)]
    pub pricing_guidance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    /// Group label, e.g. `"Memory"`.
    pub category: String,
    pub items: Vec<CategoryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryCatalog {
    pub categories: Vec<CategoryGroup>,
}

/// A catalog item resolved with its key and group label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    pub key: String,
    pub description: String,
    pub group: String,
    pub link: String,
    pub pricing_guidance: Option<String>,
}

/// Derives the CLI key for a category description.
///
/// Lowercases, maps spaces to dashes and drops parentheses:
/// `"SSD (NVMe)"` → `"ssd-nvme"`.
#[must_use]
pub fn category_key(description: &str) -> String {
    description
        .to_lowercase()
        .replace(' ', "-")
        .replace(['(', ')'], "")
}

impl CategoryCatalog {
    /// Flattens the catalog into resolved categories in file order.
    #[must_use]
    pub fn resolve(&self) -> Vec<CategoryInfo> {
        self.categories
            .iter()
            .flat_map(|group| {
                group.items.iter().map(move |item| CategoryInfo {
                    key: category_key(&item.description),
                    description: item.description.clone(),
                    group: group.category.clone(),
                    link: item.link.clone(),
                    pricing_guidance: item.pricing_guidance.clone(),
                })
            })
            .collect()
    }

    /// Looks up a single category by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CategoryInfo> {
        self.resolve().into_iter().find(|c| c.key == key)
    }
}

/// Load and validate the category catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_categories(path: &Path) -> Result<CategoryCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CategoriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_categories(&content)
}

/// Parse and validate a catalog from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_categories(content: &str) -> Result<CategoryCatalog, ConfigError> {
    let catalog: CategoryCatalog = serde_yaml::from_str(content)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

fn validate_catalog(catalog: &CategoryCatalog) -> Result<(), ConfigError> {
    let mut seen_keys = HashSet::new();

    for group in &catalog.categories {
        if group.category.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category group label must be non-empty".to_string(),
            ));
        }

        for item in &group.items {
            if item.description.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "group '{}' has an item with an empty description",
                    group.category
                )));
            }

            if item.link.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "category '{}' has an empty link",
                    item.description
                )));
            }

            let key = category_key(&item.description);
            if !seen_keys.insert(key.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate category key: '{key}' (from '{}')",
                    item.description
                )));
            }
        }
    }

    Ok(())
}
