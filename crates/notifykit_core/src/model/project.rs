//! Project and group domain models.
//!
//! # Invariants
//! - A project belongs to at most one group.
//! - Visibility is the only access input owned by these records; membership
//!   lives in storage and is read by the access policy.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;
pub type GroupId = Uuid;

/// Visibility level shared by projects, groups and snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Private,
    /// Visible to every active signed-in user.
    Internal,
    Public,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Internal => "internal",
            Self::Public => "public",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "private" => Some(Self::Private),
            "internal" => Some(Self::Internal),
            "public" => Some(Self::Public),
            _ => None,
        }
    }

    /// Returns whether any active user can read the resource.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Internal | Self::Public)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub path: String,
    pub visibility: Visibility,
}

impl Group {
    pub fn new(path: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            visibility,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub path: String,
    pub visibility: Visibility,
    pub group_id: Option<GroupId>,
}

impl Project {
    /// Creates a project without a parent group.
    pub fn new(path: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            visibility,
            group_id: None,
        }
    }

    /// Creates a project nested under `group`.
    pub fn in_group(path: impl Into<String>, visibility: Visibility, group: &Group) -> Self {
        Self {
            group_id: Some(group.id),
            ..Self::new(path, visibility)
        }
    }
}

/// Membership access level, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Guest,
    Reporter,
    Developer,
    Maintainer,
    Owner,
}

impl AccessLevel {
    /// Numeric value persisted in `members.access_level`.
    pub fn as_db(self) -> i64 {
        match self {
            Self::Guest => 10,
            Self::Reporter => 20,
            Self::Developer => 30,
            Self::Maintainer => 40,
            Self::Owner => 50,
        }
    }

    pub fn from_db(value: i64) -> Option<Self> {
        match value {
            10 => Some(Self::Guest),
            20 => Some(Self::Reporter),
            30 => Some(Self::Developer),
            40 => Some(Self::Maintainer),
            50 => Some(Self::Owner),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessLevel, Group, Project, Visibility};

    #[test]
    fn access_levels_are_ordered_by_privilege() {
        assert!(AccessLevel::Guest < AccessLevel::Reporter);
        assert!(AccessLevel::Maintainer < AccessLevel::Owner);
        assert_eq!(AccessLevel::from_db(AccessLevel::Developer.as_db()), Some(AccessLevel::Developer));
        assert_eq!(AccessLevel::from_db(15), None);
    }

    #[test]
    fn project_in_group_links_parent() {
        let group = Group::new("platform", Visibility::Private);
        let project = Project::in_group("api", Visibility::Private, &group);
        assert_eq!(project.group_id, Some(group.id));
    }
}
