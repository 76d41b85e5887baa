//! Domain model for users, scopes, preferences and notification targets.
//!
//! # Responsibility
//! - Define canonical data structures used by the recipient engine.
//! - Keep capability decisions (participants, subscriptions, labels) explicit
//!   on the types instead of probing at call time.
//!
//! # Invariants
//! - Every persisted domain object is identified by a stable UUID.
//! - Models carry no storage handles; reads go through `repo`.

pub mod notification_setting;
pub mod project;
pub mod target;
pub mod user;
