//! Effective notification setting resolution.

use crate::model::notification_setting::{NotificationSetting, NotificationSource};
use crate::model::project::Project;
use crate::model::user::UserId;
use crate::repo::notification_setting_repo::NotificationSettingRepository;
use crate::repo::RepoResult;

/// Resolves the single effective setting for a user on a project.
///
/// Walks project -> group -> global and stops at the first setting whose
/// level is not `global`. The global step always yields a setting: the
/// persisted one, or `NotificationSetting::default_global`.
pub fn notification_setting_for_user_project(
    settings: &dyn NotificationSettingRepository,
    user_id: UserId,
    project: Option<&Project>,
) -> RepoResult<NotificationSetting> {
    if let Some(project) = project {
        let project_setting =
            settings.get_setting(user_id, NotificationSource::Project(project.id))?;
        if let Some(setting) = project_setting.filter(|setting| !setting.is_global()) {
            return Ok(setting);
        }

        if let Some(group_id) = project.group_id {
            let group_setting = settings.get_setting(user_id, NotificationSource::Group(group_id))?;
            if let Some(setting) = group_setting.filter(|setting| !setting.is_global()) {
                return Ok(setting);
            }
        }
    }

    global_setting(settings, user_id)
}

/// The user's global setting, falling back to the implicit default.
pub fn global_setting(
    settings: &dyn NotificationSettingRepository,
    user_id: UserId,
) -> RepoResult<NotificationSetting> {
    Ok(settings
        .get_setting(user_id, NotificationSource::Global)?
        .unwrap_or_else(|| NotificationSetting::default_global(user_id)))
}
