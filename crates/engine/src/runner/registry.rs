use crate::core::{Rule, RuleCategory, Severity};
use crate::rules::all_rules;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

static DEFAULT_CATALOG: Lazy<RuleCatalog> = Lazy::new(RuleCatalog::with_defaults);

/// Ordered rule registry. Registration order is the tie-break order used by the ranker.
pub struct RuleCatalog {
    rules: Vec<Arc<dyn Rule>>,
    index: HashMap<&'static str, usize>,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for rule in all_rules() {
            catalog.register_arc(rule);
        }
        catalog
    }

    /// The built-in catalog, built once and shared by every pipeline.
    pub fn shared() -> &'static RuleCatalog {
        &DEFAULT_CATALOG
    }

    pub fn register<R: Rule + 'static>(&mut self, rule: R) {
        self.register_arc(Arc::new(rule));
    }

    /// Re-registering an id replaces the rule in place.
    pub fn register_arc(&mut self, rule: Arc<dyn Rule>) {
        match self.index.get(rule.id()) {
            Some(&position) => self.rules[position] = rule,
            None => {
                self.index.insert(rule.id(), self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Rule>> {
        self.index.get(id).map(|&position| Arc::clone(&self.rules[position]))
    }

    pub fn all(&self) -> Vec<Arc<dyn Rule>> {
        self.rules.clone()
    }

    pub fn by_category(&self, category: RuleCategory) -> Vec<Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|r| r.category() == category)
            .cloned()
            .collect()
    }

    pub fn by_severity(&self, severity: Severity) -> Vec<Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|r| r.severity() == severity)
            .cloned()
            .collect()
    }

    pub fn enabled(&self) -> Vec<Arc<dyn Rule>> {
        self.rules
            .iter()
            .filter(|r| r.enabled_by_default())
            .cloned()
            .collect()
    }

    pub fn list_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RuleCatalogBuilder {
    catalog: RuleCatalog,
}

impl RuleCatalogBuilder {
    pub fn new() -> Self {
        Self {
            catalog: RuleCatalog::new(),
        }
    }

    pub fn with_rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.catalog.register(rule);
        self
    }

    pub fn with_defaults(mut self) -> Self {
        for rule in all_rules() {
            self.catalog.register_arc(rule);
        }
        self
    }

    pub fn without(mut self, id: &str) -> Self {
        self.catalog.rules.retain(|r| r.id() != id);
        self.catalog.index = self
            .catalog
            .rules
            .iter()
            .enumerate()
            .map(|(position, r)| (r.id(), position))
            .collect();
        self
    }

    pub fn build(self) -> RuleCatalog {
        self.catalog
    }
}

impl Default for RuleCatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnalysisContext, Finding, FindingType};
    use crate::rules::{NtpRule, TelnetRule};

    struct Shadow;

    impl Rule for Shadow {
        fn id(&self) -> &'static str {
            "telnet-enabled"
        }
        fn name(&self) -> &'static str {
            "Shadow"
        }
        fn category(&self) -> RuleCategory {
            RuleCategory::Security
        }
        fn finding_type(&self) -> FindingType {
            FindingType::SecurityRisk
        }
        fn severity(&self) -> Severity {
            Severity::Info
        }
        fn evaluate(&self, _context: &AnalysisContext<'_>) -> Vec<Finding> {
            Vec::new()
        }
    }

    #[test]
    fn test_registration_order_is_kept() {
        let catalog = RuleCatalogBuilder::new()
            .with_rule(NtpRule)
            .with_rule(TelnetRule)
            .build();
        assert_eq!(catalog.list_ids(), vec!["ntp-not-configured", "telnet-enabled"]);
    }

    #[test]
    fn test_reregistering_replaces_in_place() {
        let catalog = RuleCatalogBuilder::new()
            .with_rule(TelnetRule)
            .with_rule(NtpRule)
            .with_rule(Shadow)
            .build();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.list_ids()[0], "telnet-enabled");
        assert_eq!(catalog.get("telnet-enabled").unwrap().severity(), Severity::Info);
    }

    #[test]
    fn test_without_reindexes() {
        let catalog = RuleCatalogBuilder::new()
            .with_defaults()
            .without("password-encryption-disabled")
            .build();
        assert!(catalog.get("password-encryption-disabled").is_none());
        let last = *catalog.list_ids().last().unwrap();
        assert_eq!(catalog.get(last).unwrap().id(), last);
    }

    #[test]
    fn test_shared_catalog_has_every_category() {
        let catalog = RuleCatalog::shared();
        assert!(!catalog.is_empty());
        for category in [RuleCategory::Security, RuleCategory::Conflict, RuleCategory::BestPractice] {
            assert!(!catalog.by_category(category).is_empty());
        }
        assert!(!catalog.by_severity(Severity::Critical).is_empty());
    }
}
