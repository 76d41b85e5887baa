//! Composable recipient filters.
//!
//! Every function takes the current recipient list by value and returns the
//! next one. None of them write to storage.

use crate::access::{Ability, Subject};
use crate::model::notification_setting::{
    NotificationEvent, NotificationLevel, NotificationSource,
};
use crate::model::target::{Label, Subscribable, Target};
use crate::model::user::User;
use crate::recipient::collector::{user_ids_notifiable_on, user_ids_with_global_level_custom};
use crate::recipient::watchers::watchers_of;
use crate::recipient::{dedupe, unique_ids, RecipientResult, ResolutionContext};

/// Participant users of `target`, or `None` when it has no participant
/// concept.
pub fn participants(
    ctx: &ResolutionContext<'_>,
    target: &Target,
) -> RecipientResult<Option<Vec<User>>> {
    match target.participants() {
        Some(ids) => Ok(Some(ctx.find_users(ids)?)),
        None => Ok(None),
    }
}

/// Drops users whose resolved setting on the ambient project is `level`.
///
/// The input is deduplicated first.
pub fn reject_users_with_level(
    ctx: &ResolutionContext<'_>,
    users: Vec<User>,
    level: NotificationLevel,
) -> RecipientResult<Vec<User>> {
    let mut kept = Vec::new();
    for user in dedupe(users) {
        if ctx.ambient_setting(user.id)?.level != level {
            kept.push(user);
        }
    }
    Ok(kept)
}

/// Same as `reject_users_with_level` for a level given by name.
///
/// # Errors
/// - `RecipientError::InvalidNotificationLevel` for an unknown name; the
///   call is aborted before any user is inspected.
pub fn reject_users_by_level_name(
    ctx: &ResolutionContext<'_>,
    users: Vec<User>,
    level: &str,
) -> RecipientResult<Vec<User>> {
    let level = NotificationLevel::parse(level)?;
    reject_users_with_level(ctx, users, level)
}

pub fn reject_muted_users(
    ctx: &ResolutionContext<'_>,
    users: Vec<User>,
) -> RecipientResult<Vec<User>> {
    reject_users_with_level(ctx, users, NotificationLevel::Disabled)
}

pub fn reject_mention_users(
    ctx: &ResolutionContext<'_>,
    users: Vec<User>,
) -> RecipientResult<Vec<User>> {
    reject_users_with_level(ctx, users, NotificationLevel::Mention)
}

/// Appends the project watchers; no-op without an ambient project.
pub fn add_project_watchers(
    ctx: &ResolutionContext<'_>,
    mut recipients: Vec<User>,
) -> RecipientResult<Vec<User>> {
    if let Some(project) = ctx.project() {
        recipients.extend(watchers_of(ctx.sources(), project)?);
    }
    Ok(recipients)
}

/// Appends users with a custom level that enables `action`.
///
/// Sources: custom settings on the project and on its group, plus users whose
/// project or group setting is `global` and whose global setting is custom
/// with `action` enabled.
pub fn add_custom_notifications(
    ctx: &ResolutionContext<'_>,
    mut recipients: Vec<User>,
    action: NotificationEvent,
) -> RecipientResult<Vec<User>> {
    let settings = ctx.sources().settings;
    let project_source = ctx
        .project()
        .map(|project| NotificationSource::Project(project.id));
    let group_source = ctx
        .project()
        .and_then(|project| project.group_id)
        .map(NotificationSource::Group);
    let custom = Some(NotificationLevel::Custom);
    let global = Some(NotificationLevel::Global);

    let mut user_ids = user_ids_notifiable_on(settings, project_source, custom, Some(action))?;
    user_ids.extend(user_ids_notifiable_on(settings, group_source, custom, Some(action))?);

    let mut global_ids = user_ids_notifiable_on(settings, project_source, global, None)?;
    global_ids.extend(user_ids_notifiable_on(settings, group_source, global, None)?);
    let global_ids = unique_ids(global_ids);
    user_ids.extend(user_ids_with_global_level_custom(settings, &global_ids, action)?);

    recipients.extend(ctx.find_users(&unique_ids(user_ids))?);
    Ok(recipients)
}

/// Appends subscribers of a subscribable target within the ambient project.
pub fn add_subscribed_users(
    ctx: &ResolutionContext<'_>,
    mut recipients: Vec<User>,
    target: &Target,
) -> RecipientResult<Vec<User>> {
    if !target.is_subscribable() {
        return Ok(recipients);
    }

    let project_id = ctx.project().map(|project| project.id);
    let ids = ctx
        .sources()
        .subscriptions
        .subscriber_ids(Subscribable::of_target(target), project_id)?;
    recipients.extend(ctx.find_users(&ids)?);
    Ok(recipients)
}

/// Drops users holding an explicit unsubscribed record on `target`.
///
/// Users without any record are kept.
pub fn reject_unsubscribed_users(
    ctx: &ResolutionContext<'_>,
    recipients: Vec<User>,
    target: &Target,
) -> RecipientResult<Vec<User>> {
    if !target.is_subscribable() {
        return Ok(recipients);
    }

    let subscribable = Subscribable::of_target(target);
    let mut kept = Vec::with_capacity(recipients.len());
    for user in recipients {
        let subscription = ctx
            .sources()
            .subscriptions
            .subscription_for(subscribable, user.id)?;
        if !subscription.is_some_and(|subscription| !subscription.subscribed) {
            kept.push(user);
        }
    }
    Ok(kept)
}

/// Keeps users allowed to receive notifications and, for issuables and
/// pipelines, to read `target`.
pub fn reject_users_without_access(
    ctx: &ResolutionContext<'_>,
    recipients: Vec<User>,
    target: &Target,
) -> RecipientResult<Vec<User>> {
    let abilities = ctx.sources().abilities;
    let read_ability = Ability::read_for(target.kind);

    let mut kept = Vec::with_capacity(recipients.len());
    for user in recipients {
        if !abilities.can(&user, Ability::ReceiveNotifications, None)? {
            continue;
        }
        if let Some(ability) = read_ability {
            if !abilities.can(&user, ability, Some(Subject::Target(target)))? {
                continue;
            }
        }
        kept.push(user);
    }
    Ok(kept)
}

/// Appends label subscribers in the ambient project.
///
/// Uses `labels` when given, otherwise the labels applied to `target`.
/// Targets that cannot carry labels contribute nothing.
pub fn add_labels_subscribers(
    ctx: &ResolutionContext<'_>,
    mut recipients: Vec<User>,
    target: &Target,
    labels: Option<&[Label]>,
) -> RecipientResult<Vec<User>> {
    if !target.is_labelable() {
        return Ok(recipients);
    }

    let owned;
    let labels = match labels {
        Some(labels) => labels,
        None => {
            owned = ctx.sources().labels.labels_for(target)?;
            owned.as_slice()
        }
    };

    let project_id = ctx.project().map(|project| project.id);
    for label in labels {
        let ids = ctx
            .sources()
            .subscriptions
            .subscriber_ids(Subscribable::of_label(label), project_id)?;
        recipients.extend(ctx.find_users(&ids)?);
    }
    Ok(recipients)
}

/// Removes `user` unless they opted into notifications about their own
/// activity.
pub fn drop_own_activity(mut recipients: Vec<User>, user: &User) -> Vec<User> {
    if !user.notified_of_own_activity {
        recipients.retain(|recipient| recipient.id != user.id);
    }
    recipients
}
