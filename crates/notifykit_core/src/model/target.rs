//! Notification targets: issuables, pipelines, snippets, labels and notes.
//!
//! # Responsibility
//! - Tag every target with an explicit `TargetKind` instead of probing types.
//! - Fix optional capabilities (participants, subscriptions, labels) at
//!   construction time.
//!
//! # Invariants
//! - `participants == None` means the target has no participant concept;
//!   `Some(vec![])` means it has one but nobody participates yet.
//! - Only issues and merge requests are subscribable and labelable.

use crate::model::project::{GroupId, ProjectId, Visibility};
use crate::model::user::UserId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

pub type TargetId = Uuid;
pub type LabelId = Uuid;
pub type NoteId = Uuid;

static MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w@.])@([A-Za-z0-9_][A-Za-z0-9_.\-]*[A-Za-z0-9_]|[A-Za-z0-9_])")
        .expect("valid mention regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Issue,
    MergeRequest,
    Pipeline,
    Commit,
    ProjectSnippet,
    PersonalSnippet,
}

impl TargetKind {
    /// Stable name, also used to build custom event keys and ability names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::MergeRequest => "merge_request",
            Self::Pipeline => "pipeline",
            Self::Commit => "commit",
            Self::ProjectSnippet => "project_snippet",
            Self::PersonalSnippet => "personal_snippet",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "issue" => Some(Self::Issue),
            "merge_request" => Some(Self::MergeRequest),
            "pipeline" => Some(Self::Pipeline),
            "commit" => Some(Self::Commit),
            "project_snippet" => Some(Self::ProjectSnippet),
            "personal_snippet" => Some(Self::PersonalSnippet),
            _ => None,
        }
    }

    pub fn is_issuable(self) -> bool {
        matches!(self, Self::Issue | Self::MergeRequest)
    }

    pub fn is_subscribable(self) -> bool {
        self.is_issuable()
    }

    pub fn is_labelable(self) -> bool {
        self.is_issuable()
    }
}

/// Object a notification is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub id: TargetId,
    pub kind: TargetKind,
    /// `None` only for personal snippets.
    pub project_id: Option<ProjectId>,
    pub author_id: Option<UserId>,
    pub assignee_ids: Vec<UserId>,
    /// Confidential issues are readable by author, assignees and reporters+.
    pub confidential: bool,
    /// Own visibility; consulted for personal snippets only.
    pub visibility: Visibility,
    participants: Option<Vec<UserId>>,
}

impl Target {
    /// Creates a project-scoped target without a participant concept.
    pub fn new(kind: TargetKind, project_id: ProjectId) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            project_id: Some(project_id),
            author_id: None,
            assignee_ids: Vec::new(),
            confidential: false,
            visibility: Visibility::Private,
            participants: None,
        }
    }

    /// Creates an issue or merge request.
    ///
    /// Issuables always have participants: the author, the assignees and
    /// whatever the caller adds through `with_participants`.
    pub fn issuable(kind: TargetKind, project_id: ProjectId, author_id: UserId) -> Self {
        let mut target = Self::new(kind, project_id);
        target.author_id = Some(author_id);
        target.participants = Some(vec![author_id]);
        target
    }

    pub fn pipeline(project_id: ProjectId) -> Self {
        Self::new(TargetKind::Pipeline, project_id)
    }

    pub fn commit(project_id: ProjectId) -> Self {
        Self::new(TargetKind::Commit, project_id)
    }

    /// Creates a personal snippet, which lives outside any project.
    pub fn personal_snippet(author_id: UserId, visibility: Visibility) -> Self {
        Self {
            project_id: None,
            author_id: Some(author_id),
            visibility,
            participants: Some(vec![author_id]),
            ..Self::new(TargetKind::PersonalSnippet, Uuid::nil())
        }
    }

    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = UserId>) -> Self {
        self.assignee_ids = assignees.into_iter().collect();
        if let Some(participants) = self.participants.as_mut() {
            for id in &self.assignee_ids {
                if !participants.contains(id) {
                    participants.push(*id);
                }
            }
        }
        self
    }

    /// Adds participants (e.g. commenters), enabling the capability if absent.
    pub fn with_participants(mut self, users: impl IntoIterator<Item = UserId>) -> Self {
        let participants = self.participants.get_or_insert_with(Vec::new);
        for id in users {
            if !participants.contains(&id) {
                participants.push(id);
            }
        }
        self
    }

    pub fn confidential(mut self) -> Self {
        self.confidential = true;
        self
    }

    /// Participant ids, or `None` when the target has no participant concept.
    pub fn participants(&self) -> Option<&[UserId]> {
        self.participants.as_deref()
    }

    pub fn is_subscribable(&self) -> bool {
        self.kind.is_subscribable()
    }

    pub fn is_labelable(&self) -> bool {
        self.kind.is_labelable()
    }

    pub fn is_assignee(&self, user_id: UserId) -> bool {
        self.assignee_ids.contains(&user_id)
    }
}

/// Owner scope of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelScope {
    Project(ProjectId),
    Group(GroupId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: LabelId,
    pub title: String,
    pub scope: LabelScope,
}

impl Label {
    pub fn new(title: impl Into<String>, scope: LabelScope) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            scope,
        }
    }
}

/// Anything a subscription row can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscribable {
    Target(TargetKind, TargetId),
    Label(LabelId),
}

impl Subscribable {
    pub fn of_target(target: &Target) -> Self {
        Self::Target(target.kind, target.id)
    }

    pub fn of_label(label: &Label) -> Self {
        Self::Label(label.id)
    }
}

/// A comment on a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub author_id: UserId,
    pub body: String,
    pub noteable: Target,
}

impl Note {
    pub fn new(author_id: UserId, body: impl Into<String>, noteable: Target) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            body: body.into(),
            noteable,
        }
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.noteable.project_id
    }

    pub fn for_personal_snippet(&self) -> bool {
        self.noteable.kind == TargetKind::PersonalSnippet
    }

    /// Usernames referenced as `@username`, lowercased and deduplicated in
    /// first-seen order.
    pub fn mentioned_usernames(&self) -> Vec<String> {
        extract_mentions(&self.body)
    }
}

/// Extracts `@username` references from markdown text.
///
/// Email addresses and references inside inline code spans are ignored.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut mentions = Vec::new();
    for (index, segment) in text.split('`').enumerate() {
        // Odd segments sit between backticks.
        if index % 2 == 1 {
            continue;
        }
        for caps in MENTION_RE.captures_iter(segment) {
            if let Some(name) = caps.get(1) {
                let normalized = name.as_str().to_lowercase();
                if seen.insert(normalized.clone()) {
                    mentions.push(normalized);
                }
            }
        }
    }
    mentions
}
