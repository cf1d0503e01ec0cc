use crate::core::{
    AnalysisContext, DeduplicationStats, EngineConfig, Finding, FindingType, Rule, RuleCategory,
    Severity,
};
use crate::model::CanonicalConfig;
use crate::runner::ranker::finalize_with_stats;
use crate::runner::RuleCatalog;
use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

pub struct RuleEngine {
    rules: Vec<Arc<dyn Rule>>,
    config: EngineConfig,
}

impl RuleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    /// Engine over every rule of `catalog`, in catalog order.
    pub fn from_catalog(catalog: &RuleCatalog, config: EngineConfig) -> Self {
        Self::new(config).with_rules(catalog.all())
    }

    pub fn add_rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn with_rules(mut self, rules: Vec<Arc<dyn Rule>>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Raw findings of every enabled rule, concatenated in catalog order.
    pub fn evaluate(&self, config: &CanonicalConfig) -> Vec<Finding> {
        self.evaluate_for(config, None)
    }

    /// Like [`evaluate`](Self::evaluate); `fallback_device` names the device when the
    /// configuration has no hostname.
    pub fn evaluate_for(&self, config: &CanonicalConfig, fallback_device: Option<&str>) -> Vec<Finding> {
        let selected: Vec<&Arc<dyn Rule>> = self
            .rules
            .iter()
            .filter(|rule| rule.enabled_by_default() && self.config.is_rule_enabled(rule.id()))
            .collect();
        self.run_selected(&selected, config, fallback_device)
    }

    /// Evaluates and finalizes: deduplicated, id-stamped, most severe first.
    pub fn run(&self, config: &CanonicalConfig, fallback_device: Option<&str>) -> ScanReport {
        let findings = self.evaluate_for(config, fallback_device);
        let (findings, stats) = finalize_with_stats(findings, self.config.deduplication_enabled);
        ScanReport::new(findings).with_deduplication_stats(stats)
    }

    /// Runs only the listed rules, ignoring `disabled_rules`.
    pub fn run_rules(&self, rule_ids: &[&str], config: &CanonicalConfig) -> ScanReport {
        let selected: Vec<&Arc<dyn Rule>> = self
            .rules
            .iter()
            .filter(|rule| rule_ids.contains(&rule.id()))
            .collect();
        let findings = self.run_selected(&selected, config, None);
        let (findings, stats) = finalize_with_stats(findings, self.config.deduplication_enabled);
        ScanReport::new(findings).with_deduplication_stats(stats)
    }

    pub fn list_rules(&self) -> Vec<RuleInfo> {
        self.rules
            .iter()
            .map(|r| RuleInfo {
                id: r.id().to_string(),
                name: r.name().to_string(),
                description: r.description().to_string(),
                category: r.category(),
                finding_type: r.finding_type(),
                severity: r.severity(),
                enabled: r.enabled_by_default() && self.config.is_rule_enabled(r.id()),
            })
            .collect()
    }

    fn run_selected(
        &self,
        rules: &[&Arc<dyn Rule>],
        config: &CanonicalConfig,
        fallback_device: Option<&str>,
    ) -> Vec<Finding> {
        let mut context = AnalysisContext::new(config, &self.config);
        if let Some(fallback) = fallback_device {
            context = context.with_fallback_device_id(fallback);
        }

        let per_rule: Vec<Vec<Finding>> = if self.config.parallel_execution {
            rules
                .par_iter()
                .map(|rule| run_contained(rule, &context))
                .collect()
        } else {
            rules
                .iter()
                .map(|rule| run_contained(rule, &context))
                .collect()
        };

        let findings: Vec<Finding> = per_rule
            .into_iter()
            .flatten()
            .filter(|f| self.config.meets_min_severity(f.severity))
            .collect();

        debug!(
            device = context.device_id(),
            rules = rules.len(),
            findings = findings.len(),
            "rules evaluated"
        );
        findings
    }
}

/// A panicking rule contributes nothing; the rest of the run continues.
fn run_contained(rule: &Arc<dyn Rule>, context: &AnalysisContext<'_>) -> Vec<Finding> {
    match catch_unwind(AssertUnwindSafe(|| rule.evaluate(context))) {
        Ok(findings) => findings,
        Err(_) => {
            error!(rule = rule.id(), device = context.device_id(), "rule panicked, skipping");
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: RuleCategory,
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    pub severity: Severity,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    findings: Vec<Finding>,
    deduplication_stats: Option<DeduplicationStats>,
}

impl ScanReport {
    /// Wraps findings that are already finalized.
    pub fn new(findings: Vec<Finding>) -> Self {
        Self {
            findings,
            deduplication_stats: None,
        }
    }

    pub fn with_deduplication_stats(mut self, stats: Option<DeduplicationStats>) -> Self {
        self.deduplication_stats = stats;
        self
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn deduplication_stats(&self) -> Option<&DeduplicationStats> {
        self.deduplication_stats.as_ref()
    }

    pub fn by_type(&self, finding_type: FindingType) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.finding_type == finding_type)
    }

    pub fn count_by_severity(&self) -> SeverityCount {
        let mut count = SeverityCount::default();
        for finding in &self.findings {
            match finding.severity {
                Severity::Critical => count.critical += 1,
                Severity::High => count.high += 1,
                Severity::Medium => count.medium += 1,
                Severity::Low => count.low += 1,
                Severity::Info => count.info += 1,
            }
        }
        count
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.findings)?)
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::from("# Configuration Analysis Report\n\n");

        let count = self.count_by_severity();
        md.push_str("## Summary\n\n");
        md.push_str(&format!("- Critical: {}\n", count.critical));
        md.push_str(&format!("- High: {}\n", count.high));
        md.push_str(&format!("- Medium: {}\n", count.medium));
        md.push_str(&format!("- Low: {}\n", count.low));
        md.push_str(&format!("- Info: {}\n", count.info));
        md.push_str(&format!("- Total: {}\n\n", count.total()));

        if let Some(stats) = &self.deduplication_stats {
            md.push_str("## Deduplication\n\n");
            md.push_str(&format!("- Original findings: {}\n", stats.original_count));
            md.push_str(&format!("- After deduplication: {}\n", stats.deduped_count));
            md.push_str(&format!("- Removed duplicates: {}\n", stats.removed_count));
            md.push_str(&format!("- Reduction: {:.1}%\n\n", stats.reduction_percentage()));
        }

        if !self.findings.is_empty() {
            md.push_str("## Findings\n\n");

            for finding in &self.findings {
                md.push_str(&format!(
                    "### {} {} {}: {}\n\n",
                    finding.severity.emoji(),
                    finding.severity,
                    finding.finding_type,
                    finding.description
                ));
                if let Some(id) = &finding.id {
                    md.push_str(&format!("**Id:** {}\n", id));
                }
                md.push_str(&format!("**Rule:** {}\n", finding.rule_id));
                md.push_str(&format!("**Devices:** {}\n\n", finding.devices_involved.join(", ")));

                if !finding.details.is_empty() {
                    md.push_str("**Details:**\n");
                    for (key, value) in &finding.details {
                        md.push_str(&format!("- {}: {}\n", key, value));
                    }
                    md.push('\n');
                }

                if !finding.recommendation.is_empty() {
                    md.push_str(&format!("**Recommendation:** {}\n\n", finding.recommendation));
                }
            }
        }

        md
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeverityCount {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeverityCount {
    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{CdpRule, NtpRule, PasswordEncryptionRule, TelnetRule};

    struct Exploding;

    impl Rule for Exploding {
        fn id(&self) -> &'static str {
            "exploding"
        }
        fn name(&self) -> &'static str {
            "Exploding"
        }
        fn category(&self) -> RuleCategory {
            RuleCategory::Security
        }
        fn finding_type(&self) -> FindingType {
            FindingType::SecurityRisk
        }
        fn severity(&self) -> Severity {
            Severity::Critical
        }
        fn evaluate(&self, _context: &AnalysisContext<'_>) -> Vec<Finding> {
            panic!("boom")
        }
    }

    fn sequential() -> EngineConfig {
        EngineConfig {
            parallel_execution: false,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_panicking_rule_is_contained() {
        let engine = RuleEngine::new(sequential())
            .add_rule(Exploding)
            .add_rule(NtpRule);
        let findings = engine.evaluate(&CanonicalConfig::default());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "ntp-not-configured");
    }

    #[test]
    fn test_parallel_keeps_catalog_order() {
        let config = CanonicalConfig::default();
        let parallel = RuleEngine::from_catalog(RuleCatalog::shared(), EngineConfig::default());
        let serial = RuleEngine::from_catalog(RuleCatalog::shared(), sequential());
        assert_eq!(parallel.evaluate(&config), serial.evaluate(&config));
    }

    #[test]
    fn test_disabled_rules_and_min_severity() {
        let mut settings = sequential();
        settings.disabled_rules = vec!["ntp-not-configured".to_string()];
        settings.min_severity = Some(Severity::Medium);

        let mut config = CanonicalConfig::default();
        config.other_services.cdp_enabled = Some(true);

        let engine = RuleEngine::new(settings)
            .add_rule(NtpRule)
            .add_rule(CdpRule::new())
            .add_rule(PasswordEncryptionRule::new());
        let ids: Vec<_> = engine.evaluate(&config).into_iter().map(|f| f.rule_id).collect();
        assert_eq!(ids, vec!["password-encryption-disabled"]);

        let info = engine.list_rules();
        assert!(!info[0].enabled);
        assert!(info[1].enabled);
    }

    #[test]
    fn test_run_finalizes_and_uses_fallback_device() {
        let mut config = CanonicalConfig::default();
        config.security_features.telnet_enabled = Some(true);

        let engine = RuleEngine::new(sequential())
            .add_rule(NtpRule)
            .add_rule(TelnetRule);
        let report = engine.run(&config, Some("edge.cfg"));

        assert_eq!(report.len(), 2);
        assert_eq!(report.findings()[0].rule_id, "telnet-enabled");
        assert_eq!(report.findings()[0].id.as_deref(), Some("security_1"));
        assert_eq!(report.findings()[0].devices_involved, vec!["edge.cfg".to_string()]);
        assert_eq!(report.deduplication_stats().unwrap().original_count, 2);
    }

    #[test]
    fn test_run_rules_selects_by_id() {
        let engine = RuleEngine::from_catalog(RuleCatalog::shared(), sequential());
        let report = engine.run_rules(&["ntp-not-configured"], &CanonicalConfig::default());
        assert_eq!(report.len(), 1);
        assert_eq!(report.count_by_severity().low, 1);
    }

    #[test]
    fn test_markdown_lists_findings() {
        let engine = RuleEngine::new(sequential()).add_rule(NtpRule);
        let report = engine.run(&CanonicalConfig::default(), Some("sw.cfg"));
        let md = report.to_markdown();
        assert!(md.contains("- Low: 1"));
        assert!(md.contains("- Total: 1"));
        assert!(md.contains("**Rule:** ntp-not-configured"));
        assert!(md.contains("best_practice_1"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["ruleId"], "ntp-not-configured");
    }
}
