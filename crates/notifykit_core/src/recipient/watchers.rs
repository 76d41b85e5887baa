//! Project watcher set.
//!
//! A group-level `watch` must not reach users who already have an explicit
//! project-level setting: only users with no project setting inherit group
//! watch behaviour, directly or through a `global` group setting that resolves
//! to `watch`.

use crate::model::notification_setting::{NotificationLevel, NotificationSource};
use crate::model::project::Project;
use crate::model::user::User;
use crate::recipient::collector::{user_ids_notifiable_on, user_ids_with_global_level};
use crate::recipient::{unique_ids, RecipientSources};
use crate::repo::RepoResult;
use std::collections::HashSet;

/// Users who implicitly watch `project`.
pub fn watchers_of(sources: &RecipientSources<'_>, project: &Project) -> RepoResult<Vec<User>> {
    let settings = sources.settings;
    let project_source = Some(NotificationSource::Project(project.id));
    let group_source = project.group_id.map(NotificationSource::Group);

    let project_member_ids: HashSet<_> =
        user_ids_notifiable_on(settings, project_source, None, None)?
            .into_iter()
            .collect();

    let project_global_ids =
        user_ids_notifiable_on(settings, project_source, Some(NotificationLevel::Global), None)?;
    let group_global_ids =
        user_ids_notifiable_on(settings, group_source, Some(NotificationLevel::Global), None)?;

    let candidates = unique_ids(
        project_global_ids
            .iter()
            .chain(group_global_ids.iter())
            .copied(),
    );
    let global_watch_ids: HashSet<_> =
        user_ids_with_global_level(settings, NotificationLevel::Watch, &candidates)?
            .into_iter()
            .collect();

    let mut project_watch_ids =
        user_ids_notifiable_on(settings, project_source, Some(NotificationLevel::Watch), None)?;
    project_watch_ids.extend(
        project_global_ids
            .iter()
            .filter(|id| global_watch_ids.contains(*id)),
    );

    let mut group_watch_ids: Vec<_> =
        user_ids_notifiable_on(settings, group_source, Some(NotificationLevel::Watch), None)?
            .into_iter()
            .filter(|id| !project_member_ids.contains(id))
            .collect();
    group_watch_ids.extend(
        group_global_ids
            .iter()
            .filter(|id| !project_member_ids.contains(*id) && global_watch_ids.contains(*id)),
    );

    let watcher_ids = unique_ids(project_watch_ids.into_iter().chain(group_watch_ids));
    sources.users.find_users(&watcher_ids)
}
