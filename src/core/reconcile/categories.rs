//! Detail-transaction category resolution
//!
//! ERP detail rows carry only a free-text description. The matcher maps a
//! normalized description to a closed set of category tags using a versioned
//! pattern table from configuration, and it runs once at ingestion: the rest
//! of the engine works with tags, never with raw description probing.

use crate::config::CategoryConfig;
use crate::domain::ticket::TransactionCategory;

/// Resolves free-text descriptions to [`TransactionCategory`] tags
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    version: u32,
    rules: Vec<(String, TransactionCategory)>,
}

impl CategoryMatcher {
    /// Builds a matcher from the configured pattern table
    ///
    /// Rule order is fixed: cancelled, returned, point-of-sale, requisition.
    /// The first pattern contained in the normalized description wins.
    pub fn from_config(config: &CategoryConfig) -> Self {
        let mut rules = Vec::new();
        for pattern in &config.cancelled {
            rules.push((pattern.clone(), TransactionCategory::Cancelled));
        }
        for pattern in &config.returned {
            rules.push((pattern.clone(), TransactionCategory::Returned));
        }
        for pattern in &config.point_of_sale {
            rules.push((pattern.clone(), TransactionCategory::PointOfSale));
        }
        for pattern in &config.requisition {
            rules.push((pattern.clone(), TransactionCategory::Requisition));
        }

        Self {
            version: config.version,
            rules,
        }
    }

    /// Pattern-table revision this matcher was built from
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Resolves a raw ERP description to a category tag
    pub fn categorize(&self, description: &str) -> TransactionCategory {
        let normalized = description.trim();
        for (pattern, category) in &self.rules {
            if normalized.contains(pattern.as_str()) {
                return *category;
            }
        }
        TransactionCategory::Other
    }
}

impl Default for CategoryMatcher {
    fn default() -> Self {
        Self::from_config(&CategoryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns() {
        let matcher = CategoryMatcher::default();
        assert_eq!(
            matcher.categorize("BILHETE CANCELADO 123"),
            TransactionCategory::Cancelled
        );
        assert_eq!(
            matcher.categorize("  BILHETE DEVOLVIDO"),
            TransactionCategory::Returned
        );
        assert_eq!(
            matcher.categorize("VENDA PDV LOJA 4"),
            TransactionCategory::PointOfSale
        );
        assert_eq!(
            matcher.categorize("REQUISICAO DE MATERIAL"),
            TransactionCategory::Requisition
        );
        assert_eq!(
            matcher.categorize("EXCESSO DE BAGAGEM"),
            TransactionCategory::Other
        );
    }

    #[test]
    fn test_first_rule_wins() {
        let config = CategoryConfig {
            version: 2,
            cancelled: vec!["CANCEL".to_string()],
            returned: vec!["CANCEL RETURN".to_string()],
            point_of_sale: vec![],
            requisition: vec![],
        };
        let matcher = CategoryMatcher::from_config(&config);
        // Both patterns match; the cancelled rule is registered first.
        assert_eq!(
            matcher.categorize("CANCEL RETURN"),
            TransactionCategory::Cancelled
        );
        assert_eq!(matcher.version(), 2);
    }

    #[test]
    fn test_substring_not_exact_match() {
        let matcher = CategoryMatcher::default();
        assert_eq!(
            matcher.categorize("ESTORNO BILHETE CANCELADO PARCIAL"),
            TransactionCategory::Cancelled
        );
    }
}
