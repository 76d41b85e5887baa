//! Project, group and membership repository.
//!
//! # Responsibility
//! - Persist projects/groups and resolve a project's parent group.
//! - Answer membership access-level queries for the access policy.
//!
//! # Invariants
//! - A user has at most one membership row per source.
//! - Effective access is the maximum of project and parent-group membership.

use crate::db::ensure_tables;
use crate::model::project::{AccessLevel, Group, GroupId, Project, ProjectId, Visibility};
use crate::model::user::UserId;
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Source a membership row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberSource {
    Project(ProjectId),
    Group(GroupId),
}

impl MemberSource {
    fn to_db(self) -> (&'static str, String) {
        match self {
            Self::Project(id) => ("project", id.to_string()),
            Self::Group(id) => ("group", id.to_string()),
        }
    }
}

/// Repository interface for projects, groups and memberships.
pub trait ProjectRepository {
    fn create_group(&self, group: &Group) -> RepoResult<GroupId>;
    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>>;
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Inserts or updates one membership row.
    fn add_member(&self, source: MemberSource, user_id: UserId, level: AccessLevel)
        -> RepoResult<()>;
    /// Highest access the user holds on the project directly or via its group.
    fn max_access_level(&self, user_id: UserId, project: &Project)
        -> RepoResult<Option<AccessLevel>>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["namespaces", "projects", "members"])?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_group(&self, group: &Group) -> RepoResult<GroupId> {
        self.conn.execute(
            "INSERT INTO namespaces (id, path, visibility) VALUES (?1, ?2, ?3);",
            params![
                group.id.to_string(),
                group.path.as_str(),
                group.visibility.as_str()
            ],
        )?;
        Ok(group.id)
    }

    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, path, visibility FROM namespaces WHERE id = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>("id")?,
                        row.get::<_, String>("path")?,
                        row.get::<_, String>("visibility")?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id_text, path, visibility)| {
            Ok(Group {
                id: parse_uuid(&id_text, "namespaces.id")?,
                path,
                visibility: parse_visibility(&visibility, "namespaces.visibility")?,
            })
        })
        .transpose()
    }

    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        if let Some(group_id) = project.group_id {
            if self.get_group(group_id)?.is_none() {
                return Err(RepoError::NotFound {
                    entity: "group",
                    id: group_id,
                });
            }
        }

        self.conn.execute(
            "INSERT INTO projects (id, path, visibility, group_id) VALUES (?1, ?2, ?3, ?4);",
            params![
                project.id.to_string(),
                project.path.as_str(),
                project.visibility.as_str(),
                project.group_id.map(|id| id.to_string()),
            ],
        )?;
        Ok(project.id)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, path, visibility, group_id FROM projects WHERE id = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_project_row(row)?)),
            None => Ok(None),
        }
    }

    fn add_member(
        &self,
        source: MemberSource,
        user_id: UserId,
        level: AccessLevel,
    ) -> RepoResult<()> {
        let (source_type, source_id) = source.to_db();
        self.conn.execute(
            "INSERT INTO members (user_id, source_type, source_id, access_level)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, source_type, source_id)
             DO UPDATE SET access_level = excluded.access_level;",
            params![user_id.to_string(), source_type, source_id, level.as_db()],
        )?;
        Ok(())
    }

    fn max_access_level(
        &self,
        user_id: UserId,
        project: &Project,
    ) -> RepoResult<Option<AccessLevel>> {
        let level: Option<i64> = self.conn.query_row(
            "SELECT MAX(access_level)
             FROM members
             WHERE user_id = ?1
               AND (
                    (source_type = 'project' AND source_id = ?2)
                 OR (source_type = 'group' AND source_id = ?3)
               );",
            params![
                user_id.to_string(),
                project.id.to_string(),
                project.group_id.map(|id| id.to_string()),
            ],
            |row| row.get(0),
        )?;

        level
            .map(|value| {
                AccessLevel::from_db(value).ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "invalid access level `{value}` in members.access_level"
                    ))
                })
            })
            .transpose()
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("id")?;
    let visibility: String = row.get("visibility")?;
    let group_id = match row.get::<_, Option<String>>("group_id")? {
        Some(value) => Some(parse_uuid(&value, "projects.group_id")?),
        None => None,
    };

    Ok(Project {
        id: parse_uuid(&id_text, "projects.id")?,
        path: row.get("path")?,
        visibility: parse_visibility(&visibility, "projects.visibility")?,
        group_id,
    })
}

fn parse_visibility(value: &str, column: &str) -> RepoResult<Visibility> {
    Visibility::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid visibility `{value}` in {column}"))
    })
}
