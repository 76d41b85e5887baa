//! Notification recipient resolution engine.
//!
//! # Responsibility
//! - Resolve effective notification settings (project > group > global).
//! - Collect watcher, custom-level and subscriber sets from storage.
//! - Compose filters into one fixed pipeline per notification scenario.
//!
//! # Invariants
//! - Resolution is read-only: no builder writes to any repository.
//! - Missing optional target capabilities contribute nothing; they never fail.
//! - Every builder output is deduplicated by user id in insertion order.
//! - Resolved settings are memoised per `ResolutionContext` only.

use crate::access::AbilityChecker;
use crate::model::notification_setting::{InvalidNotificationLevel, NotificationSetting};
use crate::model::project::{Project, ProjectId};
use crate::model::target::Target;
use crate::model::user::{User, UserId};
use crate::repo::label_repo::LabelRepository;
use crate::repo::notification_setting_repo::NotificationSettingRepository;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::subscription_repo::SubscriptionRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::{RepoError, RepoResult};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod builders;
pub mod collector;
pub mod filters;
pub mod resolver;
pub mod watchers;

pub use builders::{
    build_default, build_new_note, build_pipeline, build_relabeled, DefaultRecipientsRequest,
};

pub type RecipientResult<T> = Result<T, RecipientError>;

/// Error raised while resolving recipients.
#[derive(Debug)]
pub enum RecipientError {
    /// Storage or policy lookup failed; propagated unchanged.
    Repo(RepoError),
    /// A level name outside the known set reached a level filter.
    InvalidNotificationLevel(InvalidNotificationLevel),
}

impl Display for RecipientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::InvalidNotificationLevel(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RecipientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidNotificationLevel(err) => Some(err),
        }
    }
}

impl From<RepoError> for RecipientError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<InvalidNotificationLevel> for RecipientError {
    fn from(value: InvalidNotificationLevel) -> Self {
        Self::InvalidNotificationLevel(value)
    }
}

/// External collaborators the engine reads from.
#[derive(Clone, Copy)]
pub struct RecipientSources<'a> {
    pub users: &'a dyn UserRepository,
    pub projects: &'a dyn ProjectRepository,
    pub settings: &'a dyn NotificationSettingRepository,
    pub subscriptions: &'a dyn SubscriptionRepository,
    pub labels: &'a dyn LabelRepository,
    pub abilities: &'a dyn AbilityChecker,
}

/// State for one builder invocation: collaborators, the ambient project and
/// the memo of resolved settings.
pub struct ResolutionContext<'a> {
    sources: RecipientSources<'a>,
    project: Option<&'a Project>,
    resolved: RefCell<HashMap<(UserId, Option<ProjectId>), NotificationSetting>>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(sources: RecipientSources<'a>, project: Option<&'a Project>) -> Self {
        Self {
            sources,
            project,
            resolved: RefCell::new(HashMap::new()),
        }
    }

    pub fn sources(&self) -> &RecipientSources<'a> {
        &self.sources
    }

    /// Project the notification is sent on behalf of.
    pub fn project(&self) -> Option<&'a Project> {
        self.project
    }

    /// Effective setting of `user_id` for `project`, memoised for this context.
    pub fn resolved_setting(
        &self,
        user_id: UserId,
        project: Option<&Project>,
    ) -> RepoResult<NotificationSetting> {
        let key = (user_id, project.map(|project| project.id));
        if let Some(setting) = self.resolved.borrow().get(&key) {
            return Ok(setting.clone());
        }

        let setting =
            resolver::notification_setting_for_user_project(self.sources.settings, user_id, project)?;
        self.resolved.borrow_mut().insert(key, setting.clone());
        Ok(setting)
    }

    /// Effective setting against the ambient project.
    pub fn ambient_setting(&self, user_id: UserId) -> RepoResult<NotificationSetting> {
        self.resolved_setting(user_id, self.project)
    }

    /// Project owning `target`, reusing the ambient project when it matches.
    pub fn project_of(&self, target: &Target) -> RepoResult<Option<Project>> {
        match (target.project_id, self.project) {
            (None, _) => Ok(None),
            (Some(id), Some(project)) if project.id == id => Ok(Some(project.clone())),
            (Some(id), _) => self.sources.projects.get_project(id),
        }
    }

    pub fn find_users(&self, ids: &[UserId]) -> RepoResult<Vec<User>> {
        self.sources.users.find_users(ids)
    }
}

/// Drops repeated users, keeping the first occurrence.
pub fn dedupe(users: Vec<User>) -> Vec<User> {
    let mut seen = HashSet::with_capacity(users.len());
    users.into_iter().filter(|user| seen.insert(user.id)).collect()
}

/// Drops repeated ids, keeping the first occurrence.
pub fn unique_ids(ids: impl IntoIterator<Item = UserId>) -> Vec<UserId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
