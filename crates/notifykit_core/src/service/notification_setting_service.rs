//! Notification preference use-case service.
//!
//! # Responsibility
//! - Update a user's level and custom event toggles for one scope.
//! - Answer "what applies to this user here" queries for settings screens.
//!
//! # Invariants
//! - Custom toggles are cleared whenever the level is not `custom`.
//! - The global setting can never be set to `global`.

use crate::model::notification_setting::{
    NotificationEvent, NotificationLevel, NotificationSetting, NotificationSource,
};
use crate::model::project::Project;
use crate::model::user::UserId;
use crate::recipient::resolver::{global_setting, notification_setting_for_user_project};
use crate::repo::notification_setting_repo::NotificationSettingRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;

/// Notification setting facade over repository implementations.
pub struct NotificationSettingService<R: NotificationSettingRepository> {
    repo: R,
}

impl<R: NotificationSettingRepository> NotificationSettingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Sets `level` (and custom `events`) for `user_id` on `source`.
    ///
    /// Returns the stored setting as read back from the repository.
    pub fn update_setting(
        &self,
        user_id: UserId,
        source: NotificationSource,
        level: NotificationLevel,
        events: impl IntoIterator<Item = NotificationEvent>,
    ) -> RepoResult<NotificationSetting> {
        if source == NotificationSource::Global && level == NotificationLevel::Global {
            return Err(RepoError::Validation(
                "global notification setting cannot defer to `global`".to_string(),
            ));
        }

        let setting = if level == NotificationLevel::Custom {
            NotificationSetting::custom(user_id, source, events)
        } else {
            NotificationSetting::new(user_id, source, level)
        };
        self.repo.upsert_setting(&setting)?;
        info!(
            "event=notification_setting_update module=service status=ok scope={} level={} events={}",
            source_scope(source),
            setting.level,
            setting.events.len()
        );

        self.repo
            .get_setting(user_id, source)?
            .ok_or(RepoError::NotFound {
                entity: "notification_setting",
                id: user_id,
            })
    }

    /// Setting persisted for exactly `source`, without fallback.
    pub fn setting_for(
        &self,
        user_id: UserId,
        source: NotificationSource,
    ) -> RepoResult<Option<NotificationSetting>> {
        self.repo.get_setting(user_id, source)
    }

    /// Global setting, or the implicit default when none is stored.
    pub fn global_setting(&self, user_id: UserId) -> RepoResult<NotificationSetting> {
        global_setting(&self.repo, user_id)
    }

    /// Effective setting after project > group > global precedence.
    pub fn effective_setting(
        &self,
        user_id: UserId,
        project: Option<&Project>,
    ) -> RepoResult<NotificationSetting> {
        notification_setting_for_user_project(&self.repo, user_id, project)
    }
}

fn source_scope(source: NotificationSource) -> &'static str {
    match source {
        NotificationSource::Global => "global",
        NotificationSource::Project(_) => "project",
        NotificationSource::Group(_) => "group",
    }
}
