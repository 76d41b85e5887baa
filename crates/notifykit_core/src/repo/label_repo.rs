//! Label repository contracts and SQLite implementation.

use crate::db::ensure_tables;
use crate::model::target::{Label, LabelId, LabelScope, Target};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

/// Repository interface for labels and their links to targets.
pub trait LabelRepository {
    fn create_label(&self, label: &Label) -> RepoResult<LabelId>;
    /// Links a label to a labelable target; linking twice is a no-op.
    fn attach_label(&self, target: &Target, label_id: LabelId) -> RepoResult<()>;
    /// Labels applied to `target`, in the order they were attached.
    fn labels_for(&self, target: &Target) -> RepoResult<Vec<Label>>;
}

/// SQLite-backed label repository.
pub struct SqliteLabelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLabelRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["labels", "label_links"])?;
        Ok(Self { conn })
    }
}

impl LabelRepository for SqliteLabelRepository<'_> {
    fn create_label(&self, label: &Label) -> RepoResult<LabelId> {
        if label.title.trim().is_empty() {
            return Err(RepoError::Validation("label title cannot be empty".to_string()));
        }

        let (scope_type, scope_id) = match label.scope {
            LabelScope::Project(id) => ("project", id.to_string()),
            LabelScope::Group(id) => ("group", id.to_string()),
        };
        self.conn.execute(
            "INSERT INTO labels (id, title, scope_type, scope_id) VALUES (?1, ?2, ?3, ?4);",
            params![label.id.to_string(), label.title.as_str(), scope_type, scope_id],
        )?;
        Ok(label.id)
    }

    fn attach_label(&self, target: &Target, label_id: LabelId) -> RepoResult<()> {
        if !target.is_labelable() {
            return Err(RepoError::Validation(format!(
                "target kind `{}` does not support labels",
                target.kind.as_str()
            )));
        }

        self.conn.execute(
            "INSERT OR IGNORE INTO label_links (label_id, target_type, target_id)
             VALUES (?1, ?2, ?3);",
            params![
                label_id.to_string(),
                target.kind.as_str(),
                target.id.to_string()
            ],
        )?;
        Ok(())
    }

    fn labels_for(&self, target: &Target) -> RepoResult<Vec<Label>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.title, l.scope_type, l.scope_id
             FROM label_links ll
             INNER JOIN labels l ON l.id = ll.label_id
             WHERE ll.target_type = ?1
               AND ll.target_id = ?2
             ORDER BY ll.id ASC;",
        )?;
        let mut rows = stmt.query(params![target.kind.as_str(), target.id.to_string()])?;
        let mut labels = Vec::new();
        while let Some(row) = rows.next()? {
            labels.push(parse_label_row(row)?);
        }
        Ok(labels)
    }
}

fn parse_label_row(row: &Row<'_>) -> RepoResult<Label> {
    let id_text: String = row.get("id")?;
    let scope_type: String = row.get("scope_type")?;
    let scope_text: String = row.get("scope_id")?;
    let scope_id = parse_uuid(&scope_text, "labels.scope_id")?;
    let scope = match scope_type.as_str() {
        "project" => LabelScope::Project(scope_id),
        "group" => LabelScope::Group(scope_id),
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid label scope `{other}` in labels.scope_type"
            )));
        }
    };

    Ok(Label {
        id: parse_uuid(&id_text, "labels.id")?,
        title: row.get("title")?,
        scope,
    })
}
