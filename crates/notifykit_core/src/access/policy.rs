//! Membership and visibility based access policy.
//!
//! # Invariants
//! - Blocked users are denied every ability.
//! - Private projects require membership; merge requests and builds on
//!   private projects require reporter access or above.
//! - Confidential issues are readable by their author, assignees and
//!   reporters+ only.

use crate::access::{Ability, AbilityChecker, Subject};
use crate::model::project::{AccessLevel, Project};
use crate::model::target::{Target, TargetKind};
use crate::model::user::User;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::RepoResult;

/// Access policy backed by project visibility and membership rows.
pub struct MembershipPolicy<'a> {
    projects: &'a dyn ProjectRepository,
}

impl<'a> MembershipPolicy<'a> {
    pub fn new(projects: &'a dyn ProjectRepository) -> Self {
        Self { projects }
    }

    fn access_level(&self, user: &User, project: &Project) -> RepoResult<Option<AccessLevel>> {
        self.projects.max_access_level(user.id, project)
    }

    fn can_read_project(&self, user: &User, project: &Project) -> RepoResult<bool> {
        if project.visibility.is_open() {
            return Ok(true);
        }
        Ok(self.access_level(user, project)?.is_some())
    }

    fn can_read_with_reporter(&self, user: &User, project: &Project) -> RepoResult<bool> {
        if project.visibility.is_open() {
            return Ok(true);
        }
        Ok(self
            .access_level(user, project)?
            .is_some_and(|level| level >= AccessLevel::Reporter))
    }

    fn can_read_issue(&self, user: &User, issue: &Target, project: &Project) -> RepoResult<bool> {
        if !self.can_read_project(user, project)? {
            return Ok(false);
        }
        if !issue.confidential {
            return Ok(true);
        }
        if issue.author_id == Some(user.id) || issue.is_assignee(user.id) {
            return Ok(true);
        }
        Ok(self
            .access_level(user, project)?
            .is_some_and(|level| level >= AccessLevel::Reporter))
    }

    fn target_project(&self, target: &Target) -> RepoResult<Option<Project>> {
        match target.project_id {
            Some(id) => self.projects.get_project(id),
            None => Ok(None),
        }
    }
}

impl AbilityChecker for MembershipPolicy<'_> {
    fn can(&self, user: &User, ability: Ability, subject: Option<Subject<'_>>) -> RepoResult<bool> {
        if !user.is_active() {
            return Ok(false);
        }

        match (ability, subject) {
            (Ability::ReceiveNotifications, _) => Ok(true),
            (Ability::ReadProject, Some(Subject::Project(project))) => {
                self.can_read_project(user, project)
            }
            (Ability::ReadPersonalSnippet, Some(Subject::Target(snippet)))
                if snippet.kind == TargetKind::PersonalSnippet =>
            {
                Ok(snippet.author_id == Some(user.id) || snippet.visibility.is_open())
            }
            (Ability::ReadProject, Some(Subject::Target(target))) => {
                match self.target_project(target)? {
                    Some(project) => self.can_read_project(user, &project),
                    None => Ok(false),
                }
            }
            (Ability::ReadIssue, Some(Subject::Target(issue))) if issue.kind == TargetKind::Issue => {
                match self.target_project(issue)? {
                    Some(project) => self.can_read_issue(user, issue, &project),
                    None => Ok(false),
                }
            }
            (Ability::ReadMergeRequest | Ability::ReadBuild, Some(Subject::Target(target))) => {
                match self.target_project(target)? {
                    Some(project) => self.can_read_with_reporter(user, &project),
                    None => Ok(false),
                }
            }
            _ => Ok(false),
        }
    }
}
