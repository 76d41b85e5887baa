//! Notification preference model.
//!
//! # Responsibility
//! - Define notification levels, custom event toggles and setting sources.
//! - Map issuable actions onto custom event keys.
//!
//! # Invariants
//! - A user has at most one setting per `(user_id, source)` pair.
//! - A user has exactly one `NotificationSource::Global` setting; when none is
//!   persisted, `NotificationSetting::default_global` stands in for it.
//! - Custom event toggles are only meaningful when `level == Custom`.

use crate::model::project::{GroupId, ProjectId};
use crate::model::target::TargetKind;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Level applied to an implicit global setting.
pub const DEFAULT_GLOBAL_LEVEL: NotificationLevel = NotificationLevel::Participating;

/// Events that watchers and participants never receive.
pub const EXCLUDED_WATCHER_EVENTS: &[NotificationEvent] = &[NotificationEvent::SuccessPipeline];

/// How eagerly a user is notified about a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Disabled,
    Participating,
    Watch,
    /// Defers to the next scope up (project -> group -> global).
    Global,
    Mention,
    Custom,
}

impl NotificationLevel {
    pub const ALL: [NotificationLevel; 6] = [
        Self::Disabled,
        Self::Participating,
        Self::Watch,
        Self::Global,
        Self::Mention,
        Self::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Participating => "participating",
            Self::Watch => "watch",
            Self::Global => "global",
            Self::Mention => "mention",
            Self::Custom => "custom",
        }
    }

    /// Parses one level name.
    ///
    /// # Errors
    /// - Returns `InvalidNotificationLevel` for anything but the six names.
    pub fn parse(value: &str) -> Result<Self, InvalidNotificationLevel> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == value)
            .ok_or_else(|| InvalidNotificationLevel(value.to_string()))
    }
}

impl Display for NotificationLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown notification level name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidNotificationLevel(pub String);

impl Display for InvalidNotificationLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid notification level `{}`", self.0)
    }
}

impl Error for InvalidNotificationLevel {}

/// Custom-level event toggle keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationEvent {
    NewNote,
    NewIssue,
    ReopenIssue,
    CloseIssue,
    ReassignIssue,
    NewMergeRequest,
    ReopenMergeRequest,
    CloseMergeRequest,
    ReassignMergeRequest,
    MergeMergeRequest,
    FailedPipeline,
    SuccessPipeline,
}

impl NotificationEvent {
    pub const ALL: [NotificationEvent; 12] = [
        Self::NewNote,
        Self::NewIssue,
        Self::ReopenIssue,
        Self::CloseIssue,
        Self::ReassignIssue,
        Self::NewMergeRequest,
        Self::ReopenMergeRequest,
        Self::CloseMergeRequest,
        Self::ReassignMergeRequest,
        Self::MergeMergeRequest,
        Self::FailedPipeline,
        Self::SuccessPipeline,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewNote => "new_note",
            Self::NewIssue => "new_issue",
            Self::ReopenIssue => "reopen_issue",
            Self::CloseIssue => "close_issue",
            Self::ReassignIssue => "reassign_issue",
            Self::NewMergeRequest => "new_merge_request",
            Self::ReopenMergeRequest => "reopen_merge_request",
            Self::CloseMergeRequest => "close_merge_request",
            Self::ReassignMergeRequest => "reassign_merge_request",
            Self::MergeMergeRequest => "merge_merge_request",
            Self::FailedPipeline => "failed_pipeline",
            Self::SuccessPipeline => "success_pipeline",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == value)
    }

    /// Builds the custom event key for an action on a target kind.
    ///
    /// Returns `None` when no toggle exists for the combination, e.g.
    /// `update` on an issue or any action on a commit.
    pub fn for_action(action: IssuableAction, kind: TargetKind) -> Option<Self> {
        Self::parse(&format!("{}_{}", action.as_str(), kind.as_str()))
    }

    /// Maps a pipeline status onto its custom event key.
    pub fn for_pipeline_status(status: &str) -> Option<Self> {
        match status {
            "failed" => Some(Self::FailedPipeline),
            "success" => Some(Self::SuccessPipeline),
            _ => None,
        }
    }

    pub fn is_excluded_for_watchers(self) -> bool {
        EXCLUDED_WATCHER_EVENTS.contains(&self)
    }
}

/// Actions performed on issues and merge requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuableAction {
    New,
    Reopen,
    Close,
    Reassign,
    Merge,
    Update,
}

impl IssuableAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reopen => "reopen",
            Self::Close => "close",
            Self::Reassign => "reassign",
            Self::Merge => "merge",
            Self::Update => "update",
        }
    }
}

/// Scope a setting applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationSource {
    Global,
    Project(ProjectId),
    Group(GroupId),
}

/// One persisted notification preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSetting {
    pub user_id: UserId,
    pub source: NotificationSource,
    pub level: NotificationLevel,
    /// Events enabled for `level == Custom`.
    pub events: BTreeSet<NotificationEvent>,
}

impl NotificationSetting {
    pub fn new(user_id: UserId, source: NotificationSource, level: NotificationLevel) -> Self {
        Self {
            user_id,
            source,
            level,
            events: BTreeSet::new(),
        }
    }

    /// Creates a custom-level setting with the given events enabled.
    pub fn custom(
        user_id: UserId,
        source: NotificationSource,
        events: impl IntoIterator<Item = NotificationEvent>,
    ) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Self::new(user_id, source, NotificationLevel::Custom)
        }
    }

    /// Implicit global setting used when a user has none persisted.
    pub fn default_global(user_id: UserId) -> Self {
        Self::new(user_id, NotificationSource::Global, DEFAULT_GLOBAL_LEVEL)
    }

    /// Returns whether the custom toggle for `event` is on.
    ///
    /// A missing event key is never enabled.
    pub fn event_enabled(&self, event: Option<NotificationEvent>) -> bool {
        event.is_some_and(|event| self.events.contains(&event))
    }

    pub fn is_global(&self) -> bool {
        self.level == NotificationLevel::Global
    }
}
