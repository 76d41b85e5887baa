//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `find_users` returns users in the order ids were first given, skipping
//!   unknown ids and duplicates.
//! - Username lookups are case-insensitive.

use crate::db::ensure_tables;
use crate::model::user::{User, UserId, UserState};
use crate::repo::{bool_to_int, parse_bool, parse_uuid, placeholders, RepoError, RepoResult};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::{HashMap, HashSet};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    state,
    notified_of_own_activity
FROM users";

/// Repository interface for user identity lookups.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Fetches users by id-set, preserving first-seen input order.
    fn find_users(&self, ids: &[UserId]) -> RepoResult<Vec<User>>;
    /// Fetches users by username, preserving first-seen input order.
    fn find_users_by_usernames(&self, usernames: &[String]) -> RepoResult<Vec<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        if user.username.trim().is_empty() {
            return Err(RepoError::Validation("username cannot be empty".to_string()));
        }

        self.conn.execute(
            "INSERT INTO users (id, username, state, notified_of_own_activity)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.state.as_str(),
                bool_to_int(user.notified_of_own_activity),
            ],
        )?;
        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_users(&self, ids: &[UserId]) -> RepoResult<Vec<User>> {
        let mut seen = HashSet::new();
        let ordered: Vec<UserId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if ordered.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{USER_SELECT_SQL} WHERE id IN ({});",
            placeholders(ordered.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(ordered.iter().map(|id| id.to_string())))?;
        let mut by_id = HashMap::with_capacity(ordered.len());
        while let Some(row) = rows.next()? {
            let user = parse_user_row(row)?;
            by_id.insert(user.id, user);
        }

        Ok(ordered.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    fn find_users_by_usernames(&self, usernames: &[String]) -> RepoResult<Vec<User>> {
        let mut seen = HashSet::new();
        let ordered: Vec<String> = usernames
            .iter()
            .map(|name| name.to_lowercase())
            .filter(|name| seen.insert(name.clone()))
            .collect();
        if ordered.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{USER_SELECT_SQL} WHERE lower(username) IN ({});",
            placeholders(ordered.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(ordered.iter()))?;
        let mut by_name = HashMap::with_capacity(ordered.len());
        while let Some(row) = rows.next()? {
            let user = parse_user_row(row)?;
            by_name.insert(user.username.to_lowercase(), user);
        }

        Ok(ordered
            .iter()
            .filter_map(|name| by_name.remove(name))
            .collect())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let state_text: String = row.get("state")?;
    let state = UserState::parse(&state_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid user state `{state_text}` in users.state"))
    })?;

    Ok(User {
        id: parse_uuid(&id_text, "users.id")?,
        username: row.get("username")?,
        state,
        notified_of_own_activity: parse_bool(
            row.get("notified_of_own_activity")?,
            "users.notified_of_own_activity",
        )?,
    })
}
