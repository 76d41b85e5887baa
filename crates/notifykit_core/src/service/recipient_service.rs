//! Recipient resolution use-case service.
//!
//! # Responsibility
//! - Expose one entry point per notification scenario to the mail layer.
//! - Give every call a fresh `ResolutionContext` and log its outcome.
//!
//! # Invariants
//! - No state survives between calls; memoised settings die with the context.
//! - Log lines carry ids and counts only, never usernames or note bodies.

use crate::model::notification_setting::IssuableAction;
use crate::model::project::Project;
use crate::model::target::{Label, Note, Target, TargetKind};
use crate::model::user::{User, UserId};
use crate::recipient::{
    build_default, build_new_note, build_pipeline, build_relabeled, DefaultRecipientsRequest,
    RecipientResult, RecipientSources, ResolutionContext,
};
use log::{debug, error};
use std::time::Instant;
use uuid::Uuid;

/// Recipient resolution facade scoped to one project.
///
/// `project` is `None` only for notifications outside any project, such as
/// comments on personal snippets.
pub struct NotificationRecipientService<'a> {
    sources: RecipientSources<'a>,
    project: Option<&'a Project>,
}

impl<'a> NotificationRecipientService<'a> {
    pub fn new(sources: RecipientSources<'a>, project: Option<&'a Project>) -> Self {
        Self { sources, project }
    }

    /// Recipients of a generic issue or merge request event.
    ///
    /// `previous_assignees` only matters for `IssuableAction::Reassign`.
    pub fn build_recipients(
        &self,
        target: &Target,
        current_user: &User,
        action: IssuableAction,
        previous_assignees: &[UserId],
        skip_current_user: bool,
    ) -> RecipientResult<Vec<User>> {
        let mut request = DefaultRecipientsRequest::new(target, current_user, action)
            .with_previous_assignees(previous_assignees);
        request.skip_current_user = skip_current_user;
        self.run("default", target.kind, |ctx| build_default(ctx, request))
    }

    /// Recipients of a pipeline status change.
    pub fn build_pipeline_recipients(
        &self,
        target: &Target,
        current_user: Option<&User>,
        status: &str,
    ) -> RecipientResult<Vec<User>> {
        self.run("pipeline", target.kind, |ctx| {
            build_pipeline(ctx, target, current_user, status)
        })
    }

    /// Recipients of labels being added to an issuable.
    pub fn build_relabeled_recipients(
        &self,
        target: &Target,
        current_user: &User,
        labels: &[Label],
    ) -> RecipientResult<Vec<User>> {
        self.run("relabeled", target.kind, |ctx| {
            build_relabeled(ctx, target, current_user, labels)
        })
    }

    /// Recipients of a new comment.
    pub fn build_new_note_recipients(&self, note: &Note) -> RecipientResult<Vec<User>> {
        self.run("new_note", note.noteable.kind, |ctx| build_new_note(ctx, note))
    }

    fn run(
        &self,
        builder: &'static str,
        kind: TargetKind,
        build: impl FnOnce(&ResolutionContext<'a>) -> RecipientResult<Vec<User>>,
    ) -> RecipientResult<Vec<User>> {
        let run_id = Uuid::new_v4();
        let started_at = Instant::now();
        let ctx = ResolutionContext::new(self.sources, self.project);

        match build(&ctx) {
            Ok(recipients) => {
                debug!(
                    "event=recipients_build module=recipient status=ok run_id={run_id} builder={builder} target_kind={} count={} duration_ms={}",
                    kind.as_str(),
                    recipients.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(recipients)
            }
            Err(err) => {
                error!(
                    "event=recipients_build module=recipient status=error run_id={run_id} builder={builder} target_kind={} duration_ms={} error={err}",
                    kind.as_str(),
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}
