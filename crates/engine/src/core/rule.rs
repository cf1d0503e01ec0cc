//! Rule trait for pluggable configuration checks.
//!
//! Every rule is a pure function of the canonical configuration: it receives an immutable
//! [`AnalysisContext`] and returns the findings it detects. Rules never see each other's output
//! and never fail; a rule that lacks the data it needs simply returns nothing.
//!
//! Severity and finding type are static per rule so the outcome of a given rule is always
//! classified the same way. Findings built through [`Rule::finding`] inherit both, which keeps
//! the `type`/`severity` pair of every finding consistent with the rule that produced it.

use crate::core::{AnalysisContext, Finding, FindingType, RuleCategory, Severity};

pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }

    fn category(&self) -> RuleCategory;

    fn finding_type(&self) -> FindingType;

    fn severity(&self) -> Severity;

    fn evaluate(&self, context: &AnalysisContext<'_>) -> Vec<Finding>;

    fn enabled_by_default(&self) -> bool {
        true
    }

    /// Starts a finding stamped with this rule's identity and the analyzed device.
    fn finding(&self, context: &AnalysisContext<'_>, description: String) -> Finding {
        Finding::new(
            self.id(),
            self.category(),
            self.finding_type(),
            self.severity(),
            description,
        )
        .with_device(context.device_id())
    }
}

#[macro_export]
macro_rules! impl_rule {
    (
        $rule:ty,
        id: $id:expr,
        name: $name:expr,
        category: $category:expr,
        finding_type: $finding_type:expr,
        severity: $severity:expr
        $(, description: $description:expr)?
    ) => {
        impl $crate::core::Rule for $rule {
            fn id(&self) -> &'static str {
                $id
            }

            fn name(&self) -> &'static str {
                $name
            }

            fn category(&self) -> $crate::core::RuleCategory {
                $category
            }

            fn finding_type(&self) -> $crate::core::FindingType {
                $finding_type
            }

            fn severity(&self) -> $crate::core::Severity {
                $severity
            }

            $(
                fn description(&self) -> &'static str {
                    $description
                }
            )?

            fn evaluate(
                &self,
                context: &$crate::core::AnalysisContext<'_>,
            ) -> Vec<$crate::core::Finding> {
                self.evaluate_impl(context)
            }
        }
    };
}
