//! Ability declarations and the authorization seam used by the engine.
//!
//! # Responsibility
//! - Name the abilities recipient resolution checks.
//! - Define `AbilityChecker`, the opaque predicate the engine consults.
//!
//! # Invariants
//! - The engine never inspects policy internals; it only asks `can`.

use crate::model::project::Project;
use crate::model::target::{Target, TargetKind};
use crate::model::user::User;
use crate::repo::RepoResult;
use std::fmt::{Display, Formatter};

mod policy;

pub use policy::MembershipPolicy;

/// Ability checked during recipient filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ability {
    ReceiveNotifications,
    ReadProject,
    ReadIssue,
    ReadMergeRequest,
    /// Pipeline emails embed build traces.
    ReadBuild,
    ReadPersonalSnippet,
}

impl Ability {
    /// Stable ability name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReceiveNotifications => "receive_notifications",
            Self::ReadProject => "read_project",
            Self::ReadIssue => "read_issue",
            Self::ReadMergeRequest => "read_merge_request",
            Self::ReadBuild => "read_build",
            Self::ReadPersonalSnippet => "read_personal_snippet",
        }
    }

    /// Ability a recipient needs to be told about `kind`, beyond
    /// `ReceiveNotifications`.
    ///
    /// Issuables map to `read_<kind>`, pipelines to `read_build`; other kinds
    /// impose no extra check.
    pub fn read_for(kind: TargetKind) -> Option<Self> {
        match kind {
            TargetKind::Issue => Some(Self::ReadIssue),
            TargetKind::MergeRequest => Some(Self::ReadMergeRequest),
            TargetKind::Pipeline => Some(Self::ReadBuild),
            TargetKind::Commit | TargetKind::ProjectSnippet | TargetKind::PersonalSnippet => None,
        }
    }
}

impl Display for Ability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object an ability is checked against.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Project(&'a Project),
    Target(&'a Target),
}

/// Authorization predicate service.
pub trait AbilityChecker {
    /// Returns whether `user` may perform `ability` on `subject`.
    ///
    /// `subject == None` asks about a global ability.
    fn can(&self, user: &User, ability: Ability, subject: Option<Subject<'_>>) -> RepoResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::Ability;
    use crate::model::target::TargetKind;

    #[test]
    fn issuables_map_to_read_ability_by_kind_name() {
        for kind in [TargetKind::Issue, TargetKind::MergeRequest] {
            let ability = Ability::read_for(kind).expect("issuables require a read ability");
            assert_eq!(ability.as_str(), format!("read_{}", kind.as_str()));
        }
    }

    #[test]
    fn pipelines_require_read_build_and_others_nothing() {
        assert_eq!(Ability::read_for(TargetKind::Pipeline), Some(Ability::ReadBuild));
        assert_eq!(Ability::read_for(TargetKind::Commit), None);
        assert_eq!(Ability::read_for(TargetKind::PersonalSnippet), None);
    }
}
