//! Notification setting repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store one setting row per `(user, source)` pair.
//! - Serve the level/source queries used by the recipient engine.
//!
//! # Invariants
//! - `upsert_setting` never creates a second row for the same pair.
//! - Custom event toggles are persisted as a JSON array of event keys.
//! - Listings are ordered by insertion (`id ASC`).

use crate::db::ensure_tables;
use crate::model::notification_setting::{
    NotificationEvent, NotificationLevel, NotificationSetting, NotificationSource,
};
use crate::model::user::UserId;
use crate::repo::{parse_uuid, placeholders, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;

const SETTING_SELECT_SQL: &str = "SELECT
    user_id,
    source_type,
    source_id,
    level,
    events
FROM notification_settings";

/// Repository interface for notification preference queries.
pub trait NotificationSettingRepository {
    /// Returns the setting a user holds on exactly `source`, if any.
    fn get_setting(
        &self,
        user_id: UserId,
        source: NotificationSource,
    ) -> RepoResult<Option<NotificationSetting>>;
    /// Lists all settings on `source`, optionally restricted to one level.
    fn list_settings(
        &self,
        source: NotificationSource,
        level: Option<NotificationLevel>,
    ) -> RepoResult<Vec<NotificationSetting>>;
    /// Lists global settings at `level` belonging to any of `user_ids`.
    fn global_settings_with_level(
        &self,
        level: NotificationLevel,
        user_ids: &[UserId],
    ) -> RepoResult<Vec<NotificationSetting>>;
    /// Inserts or replaces the setting for its `(user, source)` pair.
    fn upsert_setting(&self, setting: &NotificationSetting) -> RepoResult<()>;
}

/// SQLite-backed notification setting repository.
pub struct SqliteNotificationSettingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationSettingRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["notification_settings"])?;
        Ok(Self { conn })
    }
}

impl NotificationSettingRepository for SqliteNotificationSettingRepository<'_> {
    fn get_setting(
        &self,
        user_id: UserId,
        source: NotificationSource,
    ) -> RepoResult<Option<NotificationSetting>> {
        let (source_type, source_id) = source_to_db(source);
        let mut stmt = self.conn.prepare(&format!(
            "{SETTING_SELECT_SQL}
             WHERE user_id = ?1
               AND source_type IS ?2
               AND source_id IS ?3;"
        ))?;
        let mut rows = stmt.query(params![user_id.to_string(), source_type, source_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_setting_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_settings(
        &self,
        source: NotificationSource,
        level: Option<NotificationLevel>,
    ) -> RepoResult<Vec<NotificationSetting>> {
        let (source_type, source_id) = source_to_db(source);
        let mut sql = format!("{SETTING_SELECT_SQL} WHERE source_type IS ? AND source_id IS ?");
        let mut bind_values = vec![
            option_text(source_type.map(str::to_string)),
            option_text(source_id),
        ];

        if let Some(level) = level {
            sql.push_str(" AND level = ?");
            bind_values.push(Value::Text(level.as_str().to_string()));
        }
        sql.push_str(" ORDER BY id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut settings = Vec::new();
        while let Some(row) = rows.next()? {
            settings.push(parse_setting_row(row)?);
        }
        Ok(settings)
    }

    fn global_settings_with_level(
        &self,
        level: NotificationLevel,
        user_ids: &[UserId],
    ) -> RepoResult<Vec<NotificationSetting>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{SETTING_SELECT_SQL}
             WHERE source_type IS NULL
               AND level = ?
               AND user_id IN ({})
             ORDER BY id ASC;",
            placeholders(user_ids.len())
        );
        let mut bind_values = vec![Value::Text(level.as_str().to_string())];
        bind_values.extend(user_ids.iter().map(|id| Value::Text(id.to_string())));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut settings = Vec::new();
        while let Some(row) = rows.next()? {
            settings.push(parse_setting_row(row)?);
        }
        Ok(settings)
    }

    fn upsert_setting(&self, setting: &NotificationSetting) -> RepoResult<()> {
        let (source_type, source_id) = source_to_db(setting.source);
        let events = serde_json::to_string(&setting.events).map_err(|err| {
            RepoError::InvalidData(format!("failed to encode notification events: {err}"))
        })?;

        let changed = self.conn.execute(
            "UPDATE notification_settings
             SET level = ?4, events = ?5
             WHERE user_id = ?1
               AND source_type IS ?2
               AND source_id IS ?3;",
            params![
                setting.user_id.to_string(),
                source_type,
                source_id.as_deref(),
                setting.level.as_str(),
                events.as_str(),
            ],
        )?;

        if changed == 0 {
            self.conn.execute(
                "INSERT INTO notification_settings (user_id, source_type, source_id, level, events)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    setting.user_id.to_string(),
                    source_type,
                    source_id.as_deref(),
                    setting.level.as_str(),
                    events.as_str(),
                ],
            )?;
        }

        Ok(())
    }
}

fn source_to_db(source: NotificationSource) -> (Option<&'static str>, Option<String>) {
    match source {
        NotificationSource::Global => (None, None),
        NotificationSource::Project(id) => (Some("project"), Some(id.to_string())),
        NotificationSource::Group(id) => (Some("group"), Some(id.to_string())),
    }
}

fn option_text(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::Text)
}

fn parse_setting_row(row: &Row<'_>) -> RepoResult<NotificationSetting> {
    let user_text: String = row.get("user_id")?;
    let source_type: Option<String> = row.get("source_type")?;
    let source_id: Option<String> = row.get("source_id")?;
    let source = match (source_type.as_deref(), source_id.as_deref()) {
        (None, None) => NotificationSource::Global,
        (Some("project"), Some(id)) => {
            NotificationSource::Project(parse_uuid(id, "notification_settings.source_id")?)
        }
        (Some("group"), Some(id)) => {
            NotificationSource::Group(parse_uuid(id, "notification_settings.source_id")?)
        }
        (kind, id) => {
            return Err(RepoError::InvalidData(format!(
                "invalid notification source `{kind:?}/{id:?}` in notification_settings"
            )));
        }
    };

    let level_text: String = row.get("level")?;
    let level = NotificationLevel::parse(&level_text).map_err(|err| {
        RepoError::InvalidData(format!("{err} in notification_settings.level"))
    })?;

    let events_text: String = row.get("events")?;
    let events: BTreeSet<NotificationEvent> =
        serde_json::from_str(&events_text).map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid events `{events_text}` in notification_settings.events: {err}"
            ))
        })?;

    Ok(NotificationSetting {
        user_id: parse_uuid(&user_text, "notification_settings.user_id")?,
        source,
        level,
        events,
    })
}
