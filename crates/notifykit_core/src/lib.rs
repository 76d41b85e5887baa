//! Notification recipient resolution core.
//!
//! Given a target (issue, merge request, pipeline, note) and an action, this
//! crate computes the deduplicated set of users to notify, honouring
//! project/group/global notification levels, subscriptions, mentions and
//! access control.

pub mod access;
pub mod db;
pub mod logging;
pub mod model;
pub mod recipient;
pub mod repo;
pub mod service;

pub use access::{Ability, AbilityChecker, MembershipPolicy, Subject};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::notification_setting::{
    InvalidNotificationLevel, IssuableAction, NotificationEvent, NotificationLevel,
    NotificationSetting, NotificationSource, EXCLUDED_WATCHER_EVENTS,
};
pub use model::project::{AccessLevel, Group, GroupId, Project, ProjectId, Visibility};
pub use model::target::{Label, LabelScope, Note, Subscribable, Target, TargetKind};
pub use model::user::{User, UserId, UserState};
pub use recipient::{RecipientError, RecipientResult, RecipientSources, ResolutionContext};
pub use repo::label_repo::{LabelRepository, SqliteLabelRepository};
pub use repo::notification_setting_repo::{
    NotificationSettingRepository, SqliteNotificationSettingRepository,
};
pub use repo::project_repo::{MemberSource, ProjectRepository, SqliteProjectRepository};
pub use repo::subscription_repo::{
    SqliteSubscriptionRepository, Subscription, SubscriptionRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::notification_setting_service::NotificationSettingService;
pub use service::recipient_service::NotificationRecipientService;

/// Minimal health-check API for smoke checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
