//! Recipient builders, one fixed pipeline per notification scenario.
//!
//! Each builder lists its steps top to bottom; the order is part of the
//! contract (for example, mention rejection runs before reassignment
//! re-injection, mute rejection after it).

use crate::access::{Ability, Subject};
use crate::model::notification_setting::{IssuableAction, NotificationEvent, NotificationLevel};
use crate::model::target::{Label, Note, Target};
use crate::model::user::{User, UserId};
use crate::recipient::filters::{
    add_custom_notifications, add_labels_subscribers, add_project_watchers, add_subscribed_users,
    drop_own_activity, participants, reject_mention_users, reject_muted_users,
    reject_unsubscribed_users, reject_users_without_access,
};
use crate::recipient::{dedupe, RecipientResult, ResolutionContext};
use std::collections::HashSet;

/// Input of the generic issue / merge request builder.
#[derive(Debug, Clone, Copy)]
pub struct DefaultRecipientsRequest<'a> {
    pub target: &'a Target,
    pub current_user: &'a User,
    pub action: IssuableAction,
    /// Assignees before a reassignment; ignored for other actions.
    pub previous_assignees: &'a [UserId],
    pub skip_current_user: bool,
}

impl<'a> DefaultRecipientsRequest<'a> {
    pub fn new(target: &'a Target, current_user: &'a User, action: IssuableAction) -> Self {
        Self {
            target,
            current_user,
            action,
            previous_assignees: &[],
            skip_current_user: true,
        }
    }

    pub fn with_previous_assignees(mut self, previous: &'a [UserId]) -> Self {
        self.previous_assignees = previous;
        self
    }

    pub fn include_current_user(mut self) -> Self {
        self.skip_current_user = false;
        self
    }
}

/// Recipients of a generic issuable event.
pub fn build_default(
    ctx: &ResolutionContext<'_>,
    request: DefaultRecipientsRequest<'_>,
) -> RecipientResult<Vec<User>> {
    let target = request.target;
    let custom_action = NotificationEvent::for_action(request.action, target.kind);

    let mut recipients = participants(ctx, target)?.unwrap_or_default();
    recipients = add_project_watchers(ctx, recipients)?;
    if let Some(action) = custom_action {
        recipients = add_custom_notifications(ctx, recipients, action)?;
    }
    recipients = reject_mention_users(ctx, recipients)?;

    // A reassignment counts as a mention of the people involved, so they are
    // re-added after mention rejection. Mute rejection still applies.
    if matches!(
        custom_action,
        Some(NotificationEvent::ReassignIssue | NotificationEvent::ReassignMergeRequest)
    ) {
        let involved: Vec<UserId> = request
            .previous_assignees
            .iter()
            .chain(target.assignee_ids.iter())
            .copied()
            .collect();
        recipients.extend(ctx.find_users(&involved)?);
    }

    recipients = reject_muted_users(ctx, recipients)?;
    recipients = add_subscribed_users(ctx, recipients, target)?;
    if matches!(
        custom_action,
        Some(NotificationEvent::NewIssue | NotificationEvent::NewMergeRequest)
    ) {
        recipients = add_labels_subscribers(ctx, recipients, target, None)?;
    }
    recipients = reject_unsubscribed_users(ctx, recipients, target)?;
    recipients = reject_users_without_access(ctx, recipients, target)?;

    if request.skip_current_user {
        recipients = drop_own_activity(recipients, request.current_user);
    }
    Ok(dedupe(recipients))
}

/// Recipients of a pipeline status change: the acting user or nobody.
pub fn build_pipeline(
    ctx: &ResolutionContext<'_>,
    target: &Target,
    current_user: Option<&User>,
    status: &str,
) -> RecipientResult<Vec<User>> {
    let Some(user) = current_user else {
        return Ok(Vec::new());
    };

    let custom_action = NotificationEvent::for_pipeline_status(status);
    let project = ctx.project_of(target)?;
    let setting = ctx.resolved_setting(user.id, project.as_ref())?;

    let suppressed = match setting.level {
        NotificationLevel::Mention | NotificationLevel::Disabled => true,
        NotificationLevel::Custom => !setting.event_enabled(custom_action),
        NotificationLevel::Watch | NotificationLevel::Participating => {
            custom_action.is_some_and(NotificationEvent::is_excluded_for_watchers)
        }
        NotificationLevel::Global => false,
    };
    if suppressed {
        return Ok(Vec::new());
    }

    reject_users_without_access(ctx, vec![user.clone()], target)
}

/// Recipients of a relabel event: subscribers of the newly added labels.
pub fn build_relabeled(
    ctx: &ResolutionContext<'_>,
    target: &Target,
    current_user: &User,
    labels: &[Label],
) -> RecipientResult<Vec<User>> {
    let mut recipients = add_labels_subscribers(ctx, Vec::new(), target, Some(labels))?;
    recipients = reject_unsubscribed_users(ctx, recipients, target)?;
    recipients = reject_users_without_access(ctx, recipients, target)?;
    recipients = drop_own_activity(recipients, current_user);
    Ok(dedupe(recipients))
}

/// Recipients of a new comment.
///
/// Users mentioned in the note are exempt from mention-level suppression.
pub fn build_new_note(ctx: &ResolutionContext<'_>, note: &Note) -> RecipientResult<Vec<User>> {
    let target = &note.noteable;
    let for_snippet = note.for_personal_snippet();
    let project = ctx.project_of(target)?;

    let candidates = ctx
        .sources()
        .users
        .find_users_by_usernames(&note.mentioned_usernames())?;
    let mut mentioned = Vec::with_capacity(candidates.len());
    for user in candidates {
        let allowed = if for_snippet {
            ctx.sources()
                .abilities
                .can(&user, Ability::ReadPersonalSnippet, Some(Subject::Target(target)))?
        } else {
            match project.as_ref() {
                Some(project) => ctx.sources().abilities.can(
                    &user,
                    Ability::ReadProject,
                    Some(Subject::Project(project)),
                )?,
                None => false,
            }
        };
        if allowed {
            mentioned.push(user);
        }
    }

    let mut recipients = match participants(ctx, target)? {
        Some(users) => users,
        None => mentioned.clone(),
    };
    if !for_snippet {
        recipients = add_project_watchers(ctx, recipients)?;
        recipients = add_custom_notifications(ctx, recipients, NotificationEvent::NewNote)?;
    }

    let mentioned_ids: HashSet<UserId> = mentioned.iter().map(|user| user.id).collect();
    recipients.retain(|user| !mentioned_ids.contains(&user.id));
    recipients = reject_mention_users(ctx, recipients)?;
    recipients.extend(mentioned);

    recipients = reject_muted_users(ctx, recipients)?;
    recipients = add_subscribed_users(ctx, recipients, target)?;
    recipients = reject_unsubscribed_users(ctx, recipients, target)?;
    recipients = reject_users_without_access(ctx, recipients, target)?;

    match ctx.sources().users.get_user(note.author_id)? {
        Some(author) => recipients = drop_own_activity(recipients, &author),
        None => recipients.retain(|user| user.id != note.author_id),
    }
    Ok(dedupe(recipients))
}
