use crate::conflict::ConflictSet;
use crate::error::Result;
use crate::types::{CheckPhase, PackageRef, UpgradeAttempt};

/// The package manager as the orchestrator sees it.
///
/// Every call is synchronous and returns an explicit outcome. `upgrade` never
/// fails as such: a package that could not be upgraded comes back as a failed
/// [`UpgradeAttempt`] so the caller can keep going.
pub trait PackageManager {
    fn check_consistency(&self, phase: CheckPhase) -> Result<ConflictSet>;

    fn list_outdated(&self) -> Result<Vec<PackageRef>>;

    fn upgrade(&self, package: &PackageRef) -> UpgradeAttempt;

    /// Free-form version banner, if the manager reports one.
    fn version(&self) -> Option<String> {
        None
    }
}
