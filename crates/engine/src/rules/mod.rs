//! Rule catalog
//!
//! Rules are grouped by category: hardening checks in [`security`], internal consistency in
//! [`conflicts`], and hygiene suggestions in [`best_practice`]. [`all_rules`] returns them in
//! catalog order, which is also the tie-break order of the ranker.

pub mod best_practice;
pub mod conflicts;
pub mod security;

pub use best_practice::{
    CdpRule, InterfaceDescriptionRule, LoginBannerRule, NtpRule, VlanNameConsistencyRule,
    VlanNameRule, VtpModeRule,
};
pub use conflicts::{
    DuplicateInterfaceRule, DuplicateIpAddressRule, InterfaceVlanUndeclaredRule,
    PortChannelMissingRule,
};
pub use security::{
    AaaRule, AccessPortProtectionRule, AclPermitAnyRule, EnablePasswordRule, HttpServerRule,
    PasswordEncryptionRule, SnmpCommunityWithoutAclRule, SnmpDefaultCommunityRule,
    SnmpWriteCommunityRule, SshRule, TelnetRule,
};

use crate::core::Rule;
use std::sync::Arc;

pub fn all_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(PasswordEncryptionRule::new()),
        Arc::new(SnmpDefaultCommunityRule::new()),
        Arc::new(SnmpWriteCommunityRule::new()),
        Arc::new(SnmpCommunityWithoutAclRule::new()),
        Arc::new(HttpServerRule::new()),
        Arc::new(AccessPortProtectionRule::new()),
        Arc::new(TelnetRule),
        Arc::new(SshRule),
        Arc::new(AaaRule::new()),
        Arc::new(EnablePasswordRule::new()),
        Arc::new(AclPermitAnyRule::new()),
        Arc::new(InterfaceVlanUndeclaredRule::new()),
        Arc::new(PortChannelMissingRule::new()),
        Arc::new(DuplicateInterfaceRule::new()),
        Arc::new(DuplicateIpAddressRule::new()),
        Arc::new(InterfaceDescriptionRule::new()),
        Arc::new(VlanNameRule::new()),
        Arc::new(VlanNameConsistencyRule::new()),
        Arc::new(VtpModeRule::new()),
        Arc::new(NtpRule),
        Arc::new(LoginBannerRule::new()),
        Arc::new(CdpRule::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rule_ids_are_unique() {
        let rules = all_rules();
        let ids: HashSet<&str> = rules.iter().map(|r| r.id()).collect();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn test_categories_are_grouped_in_catalog_order() {
        let categories: Vec<_> = all_rules().iter().map(|r| r.category()).collect();
        let mut seen = Vec::new();
        for category in categories {
            if seen.last() != Some(&category) {
                assert!(!seen.contains(&category), "{} rules are not contiguous", category);
                seen.push(category);
            }
        }
    }
}
