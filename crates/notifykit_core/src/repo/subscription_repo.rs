//! Subscription repository for issuables and labels.
//!
//! # Invariants
//! - At most one row per `(user, subscribable, project)`; unscoped rows use a
//!   NULL project.
//! - An explicit `subscribed = false` row means "unsubscribed"; the absence of
//!   a row means "no opinion".

use crate::db::ensure_tables;
use crate::model::project::ProjectId;
use crate::model::target::Subscribable;
use crate::model::user::UserId;
use crate::repo::{bool_to_int, parse_bool, parse_uuid, RepoResult};
use rusqlite::{params, Connection};

/// Explicit subscription state of one user on one subscribable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub user_id: UserId,
    pub project_id: Option<ProjectId>,
    pub subscribed: bool,
}

/// Repository interface for subscription state.
pub trait SubscriptionRepository {
    fn set_subscription(
        &self,
        subscribable: Subscribable,
        user_id: UserId,
        project_id: Option<ProjectId>,
        subscribed: bool,
    ) -> RepoResult<()>;
    /// First explicit subscription row of `user_id`, regardless of project.
    fn subscription_for(
        &self,
        subscribable: Subscribable,
        user_id: UserId,
    ) -> RepoResult<Option<Subscription>>;
    /// Users subscribed within `project_id` or through an unscoped row.
    fn subscriber_ids(
        &self,
        subscribable: Subscribable,
        project_id: Option<ProjectId>,
    ) -> RepoResult<Vec<UserId>>;
}

/// SQLite-backed subscription repository.
pub struct SqliteSubscriptionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubscriptionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["subscriptions"])?;
        Ok(Self { conn })
    }
}

impl SubscriptionRepository for SqliteSubscriptionRepository<'_> {
    fn set_subscription(
        &self,
        subscribable: Subscribable,
        user_id: UserId,
        project_id: Option<ProjectId>,
        subscribed: bool,
    ) -> RepoResult<()> {
        let (kind, id) = subscribable_to_db(subscribable);
        let project = project_id.map(|value| value.to_string());

        let changed = self.conn.execute(
            "UPDATE subscriptions
             SET subscribed = ?5
             WHERE user_id = ?1
               AND subscribable_type = ?2
               AND subscribable_id = ?3
               AND project_id IS ?4;",
            params![
                user_id.to_string(),
                kind,
                id,
                project.as_deref(),
                bool_to_int(subscribed)
            ],
        )?;
        if changed == 0 {
            self.conn.execute(
                "INSERT INTO subscriptions (
                    user_id,
                    subscribable_type,
                    subscribable_id,
                    project_id,
                    subscribed
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    user_id.to_string(),
                    kind,
                    id,
                    project.as_deref(),
                    bool_to_int(subscribed)
                ],
            )?;
        }
        Ok(())
    }

    fn subscription_for(
        &self,
        subscribable: Subscribable,
        user_id: UserId,
    ) -> RepoResult<Option<Subscription>> {
        let (kind, id) = subscribable_to_db(subscribable);
        let mut stmt = self.conn.prepare(
            "SELECT project_id, subscribed
             FROM subscriptions
             WHERE subscribable_type = ?1
               AND subscribable_id = ?2
               AND user_id = ?3
             ORDER BY id ASC
             LIMIT 1;",
        )?;
        let mut rows = stmt.query(params![kind, id, user_id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let project_id = match row.get::<_, Option<String>>("project_id")? {
            Some(value) => Some(parse_uuid(&value, "subscriptions.project_id")?),
            None => None,
        };
        Ok(Some(Subscription {
            user_id,
            project_id,
            subscribed: parse_bool(row.get("subscribed")?, "subscriptions.subscribed")?,
        }))
    }

    fn subscriber_ids(
        &self,
        subscribable: Subscribable,
        project_id: Option<ProjectId>,
    ) -> RepoResult<Vec<UserId>> {
        let (kind, id) = subscribable_to_db(subscribable);
        let mut stmt = self.conn.prepare(
            "SELECT user_id
             FROM subscriptions
             WHERE subscribable_type = ?1
               AND subscribable_id = ?2
               AND subscribed = 1
               AND (project_id IS NULL OR project_id IS ?3)
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query(params![kind, id, project_id.map(|value| value.to_string())])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            let user_id = parse_uuid(&text, "subscriptions.user_id")?;
            if !ids.contains(&user_id) {
                ids.push(user_id);
            }
        }
        Ok(ids)
    }
}

fn subscribable_to_db(subscribable: Subscribable) -> (&'static str, String) {
    match subscribable {
        Subscribable::Target(kind, id) => (kind.as_str(), id.to_string()),
        Subscribable::Label(id) => ("label", id.to_string()),
    }
}
