//! Turning an outdated listing plus skip names into per-package attempts.

use crate::types::{normalize_name, PackageRef, UpgradeAttempt};
use std::collections::BTreeSet;

/// Enumerated packages in listing order, each either dispatched or withheld.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradePlan {
    pub attempts: Vec<UpgradeAttempt>,
    /// Skip names (as given) that matched no outdated package.
    pub unmatched_skips: Vec<String>,
}

impl UpgradePlan {
    pub fn build(outdated: Vec<PackageRef>, skip: &[String]) -> Self {
        let skip_set: BTreeSet<String> = skip.iter().map(|s| normalize_name(s)).collect();

        let attempts: Vec<UpgradeAttempt> = outdated
            .into_iter()
            .map(|pkg| {
                if skip_set.contains(&pkg.normalized_name()) {
                    UpgradeAttempt::withheld(pkg)
                } else {
                    UpgradeAttempt::dispatch(pkg)
                }
            })
            .collect();

        let listed: BTreeSet<String> = attempts
            .iter()
            .map(|a| a.package.normalized_name())
            .collect();
        let mut seen = BTreeSet::new();
        let unmatched_skips = skip
            .iter()
            .filter(|s| !listed.contains(&normalize_name(s)))
            .filter(|s| seen.insert(normalize_name(s)))
            .cloned()
            .collect();

        Self {
            attempts,
            unmatched_skips,
        }
    }

    /// Number of packages that will be handed to the package manager.
    pub fn to_upgrade(&self) -> usize {
        self.attempts.iter().filter(|a| a.requested).count()
    }
}
