//! User domain model.
//!
//! # Responsibility
//! - Define the identity record that recipient resolution operates on.
//! - Carry the per-user preferences the engine consults directly.
//!
//! # Invariants
//! - `id` is stable and never reused for another user.
//! - `username` is unique and is what `@mentions` resolve against.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for users.
pub type UserId = Uuid;

/// Account lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserState {
    Active,
    /// Blocked users never receive notifications.
    Blocked,
}

impl UserState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }
}

/// Canonical user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub state: UserState,
    /// When `false`, the acting user is dropped from recipients of their own
    /// actions.
    pub notified_of_own_activity: bool,
}

impl User {
    /// Creates an active user with a generated stable ID.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), username)
    }

    /// Creates an active user with a caller-provided stable ID.
    pub fn with_id(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            state: UserState::Active,
            notified_of_own_activity: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == UserState::Active
    }
}
