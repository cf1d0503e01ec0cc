//! Finding ranker and deduplicator.
//!
//! Input order is assumed to be rule-catalog order. Duplicates are collapsed onto their first
//! occurrence, ids are assigned per category in that order, and a stable sort by descending
//! severity keeps catalog order within each severity.

use crate::core::{DeduplicationStats, Finding, FindingFingerprint, RuleCategory};
use std::collections::{HashMap, HashSet};

pub fn finalize(findings: Vec<Finding>) -> Vec<Finding> {
    finalize_with_stats(findings, true).0
}

/// Like [`finalize`]; deduplication can be switched off, in which case no stats are returned.
pub fn finalize_with_stats(
    findings: Vec<Finding>,
    deduplicate: bool,
) -> (Vec<Finding>, Option<DeduplicationStats>) {
    let (mut findings, stats) = if deduplicate {
        let (deduped, stats) = deduplicate_findings(findings);
        (deduped, Some(stats))
    } else {
        (findings, None)
    };

    assign_ids(&mut findings);
    findings.sort_by_key(|f| std::cmp::Reverse(f.severity.rank()));

    (findings, stats)
}

fn deduplicate_findings(findings: Vec<Finding>) -> (Vec<Finding>, DeduplicationStats) {
    let original_count = findings.len();
    let mut seen = HashSet::new();

    let deduped: Vec<Finding> = findings
        .into_iter()
        .filter(|finding| seen.insert(FindingFingerprint::from_finding(finding)))
        .collect();

    let deduped_count = deduped.len();
    let stats = DeduplicationStats {
        original_count,
        deduped_count,
        removed_count: original_count - deduped_count,
    };

    (deduped, stats)
}

fn assign_ids(findings: &mut [Finding]) {
    let taken: HashSet<String> = findings.iter().filter_map(|f| f.id.clone()).collect();
    let mut counters: HashMap<RuleCategory, usize> = HashMap::new();

    for finding in findings.iter_mut().filter(|f| f.id.is_none()) {
        let counter = counters.entry(finding.category).or_insert(0);
        let id = loop {
            *counter += 1;
            let candidate = format!("{}_{}", finding.category, counter);
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        finding.id = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FindingType, Severity};

    fn finding(category: RuleCategory, severity: Severity, description: &str) -> Finding {
        let finding_type = match category {
            RuleCategory::Security => FindingType::SecurityRisk,
            RuleCategory::Conflict => FindingType::Conflict,
            RuleCategory::BestPractice => FindingType::BestPractice,
        };
        Finding::new("r", category, finding_type, severity, description.to_string()).with_device("SW1")
    }

    #[test]
    fn test_orders_by_descending_severity_keeping_ties_stable() {
        let findings = vec![
            finding(RuleCategory::BestPractice, Severity::Low, "a"),
            finding(RuleCategory::Security, Severity::High, "b"),
            finding(RuleCategory::Security, Severity::Low, "c"),
            finding(RuleCategory::Conflict, Severity::High, "d"),
            finding(RuleCategory::Security, Severity::Critical, "e"),
        ];

        let descriptions: Vec<_> = finalize(findings)
            .into_iter()
            .map(|f| f.description)
            .collect();
        assert_eq!(descriptions, vec!["e", "b", "d", "a", "c"]);
    }

    #[test]
    fn test_ids_are_per_category_counters() {
        let findings = vec![
            finding(RuleCategory::Security, Severity::Low, "a"),
            finding(RuleCategory::Conflict, Severity::High, "b"),
            finding(RuleCategory::Security, Severity::High, "c"),
        ];

        let ids: Vec<_> = finalize(findings).into_iter().filter_map(|f| f.id).collect();
        assert_eq!(ids, vec!["conflict_1", "security_2", "security_1"]);
    }

    #[test]
    fn test_existing_ids_are_kept_and_not_reused() {
        let findings = vec![
            finding(RuleCategory::Security, Severity::High, "a").with_id("security_1"),
            finding(RuleCategory::Security, Severity::High, "b"),
        ];

        let ids: Vec<_> = finalize(findings).into_iter().filter_map(|f| f.id).collect();
        assert_eq!(ids, vec!["security_1", "security_2"]);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let first = finding(RuleCategory::Security, Severity::High, "Telnet is enabled")
            .with_detail("source", "first");
        let second = finding(RuleCategory::Security, Severity::High, "Telnet is enabled")
            .with_detail("source", "second");
        let other = finding(RuleCategory::Security, Severity::High, "Telnet is enabled")
            .with_device("SW2");

        let (findings, stats) = finalize_with_stats(vec![first, second, other], true);
        let stats = stats.unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].detail_str("source"), Some("first"));
        assert_eq!(stats.original_count, 3);
        assert_eq!(stats.removed_count, 1);
    }

    #[test]
    fn test_deduplication_can_be_disabled() {
        let findings = vec![
            finding(RuleCategory::Security, Severity::High, "same"),
            finding(RuleCategory::Security, Severity::High, "same"),
        ];
        let (findings, stats) = finalize_with_stats(findings, false);
        assert_eq!(findings.len(), 2);
        assert!(stats.is_none());
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let build = || {
            vec![
                finding(RuleCategory::Conflict, Severity::Medium, "x"),
                finding(RuleCategory::Security, Severity::Medium, "y"),
                finding(RuleCategory::BestPractice, Severity::Info, "z"),
            ]
        };
        assert_eq!(finalize(build()), finalize(build()));
    }
}
