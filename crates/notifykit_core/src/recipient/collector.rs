//! Level-based user id collection over one notification source.

use crate::model::notification_setting::{
    NotificationEvent, NotificationLevel, NotificationSource,
};
use crate::model::user::UserId;
use crate::repo::notification_setting_repo::NotificationSettingRepository;
use crate::repo::RepoResult;

/// Collects ids of users holding a setting on `resource`.
///
/// - `resource == None` (e.g. the group of a group-less project) yields
///   nothing.
/// - Without `level`, every user with any setting on the resource is returned.
/// - With `level`, only settings at that level count; with `level` and
///   `action`, the setting must also have the custom toggle for `action` on.
pub fn user_ids_notifiable_on(
    settings: &dyn NotificationSettingRepository,
    resource: Option<NotificationSource>,
    level: Option<NotificationLevel>,
    action: Option<NotificationEvent>,
) -> RepoResult<Vec<UserId>> {
    let Some(resource) = resource else {
        return Ok(Vec::new());
    };

    let rows = settings.list_settings(resource, level)?;
    let ids = match (level, action) {
        (Some(_), Some(action)) => rows
            .into_iter()
            .filter(|setting| setting.event_enabled(Some(action)))
            .map(|setting| setting.user_id)
            .collect(),
        _ => rows.into_iter().map(|setting| setting.user_id).collect(),
    };
    Ok(ids)
}

/// Ids among `user_ids` whose global setting is at `level`.
pub fn user_ids_with_global_level(
    settings: &dyn NotificationSettingRepository,
    level: NotificationLevel,
    user_ids: &[UserId],
) -> RepoResult<Vec<UserId>> {
    Ok(settings
        .global_settings_with_level(level, user_ids)?
        .into_iter()
        .map(|setting| setting.user_id)
        .collect())
}

/// Ids among `user_ids` whose global setting is custom with `action` enabled.
pub fn user_ids_with_global_level_custom(
    settings: &dyn NotificationSettingRepository,
    user_ids: &[UserId],
    action: NotificationEvent,
) -> RepoResult<Vec<UserId>> {
    Ok(settings
        .global_settings_with_level(NotificationLevel::Custom, user_ids)?
        .into_iter()
        .filter(|setting| setting.event_enabled(Some(action)))
        .map(|setting| setting.user_id)
        .collect())
}
