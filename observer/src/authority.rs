//! Authorization tiers for privileged messages.
//!
//! Each privileged message names one [`PolicyTier`]; the signer must be the
//! account registered for that tier. Tiers are not hierarchical: the admin
//! account cannot sign emergency messages unless it is also registered there.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use xchain_types::Address;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PolicyTier {
    /// Fast-path switches that can only reduce what the module does.
    Emergency,
    /// Day-to-day operation: re-enabling processing, tuning gas policy.
    Operational,
    /// Roster and chain configuration.
    Admin,
}

impl fmt::Display for PolicyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyTier::Emergency => "emergency",
            PolicyTier::Operational => "operational",
            PolicyTier::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// Decides whether a signer may act at a given tier.
pub trait Authority {
    fn is_authorized(&self, signer: &Address, tier: PolicyTier) -> bool;
}

/// An [`Authority`] backed by one registered account per tier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    policies: BTreeMap<PolicyTier, Address>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address` for `tier`, replacing any previous account.
    pub fn with(mut self, tier: PolicyTier, address: Address) -> Self {
        self.policies.insert(tier, address);
        self
    }

    pub fn get(&self, tier: PolicyTier) -> Option<&Address> {
        self.policies.get(&tier)
    }
}

impl Authority for PolicyTable {
    fn is_authorized(&self, signer: &Address, tier: PolicyTier) -> bool {
        self.policies.get(&tier) == Some(signer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xchain_nullables::sample;

    #[test]
    fn signer_must_match_tier_account() {
        let admin = sample::address(1);
        let emergency = sample::address(2);
        let table = PolicyTable::new()
            .with(PolicyTier::Admin, admin.clone())
            .with(PolicyTier::Emergency, emergency.clone());

        assert!(table.is_authorized(&admin, PolicyTier::Admin));
        assert!(table.is_authorized(&emergency, PolicyTier::Emergency));
        assert!(!table.is_authorized(&admin, PolicyTier::Emergency));
        assert!(!table.is_authorized(&admin, PolicyTier::Operational));
    }

    #[test]
    fn unregistered_tier_authorizes_nobody() {
        let table = PolicyTable::new();
        assert!(!table.is_authorized(&sample::address(1), PolicyTier::Admin));
        assert_eq!(PolicyTier::Operational.to_string(), "operational");
    }
}
