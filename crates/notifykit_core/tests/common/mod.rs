#![allow(dead_code)]

use notifykit_core::db::open_db_in_memory;
use notifykit_core::{
    AccessLevel, Group, Label, LabelRepository, LabelScope, MemberSource, MembershipPolicy,
    NotificationEvent, NotificationLevel, NotificationRecipientService, NotificationSetting,
    NotificationSettingRepository, NotificationSource, Project, ProjectRepository,
    RecipientSources, SqliteLabelRepository, SqliteNotificationSettingRepository,
    SqliteProjectRepository, SqliteSubscriptionRepository, SqliteUserRepository, Subscribable,
    SubscriptionRepository, Target, User, UserId, UserRepository, UserState, Visibility,
};
use rusqlite::Connection;
use std::collections::BTreeSet;

/// In-memory database with seeding helpers.
pub struct Fixture {
    pub conn: Connection,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            conn: open_db_in_memory().unwrap(),
        }
    }

    pub fn user(&self, username: &str) -> User {
        let user = User::new(username);
        SqliteUserRepository::try_new(&self.conn)
            .unwrap()
            .create_user(&user)
            .unwrap();
        user
    }

    pub fn user_notified_of_own_activity(&self, username: &str) -> User {
        let mut user = User::new(username);
        user.notified_of_own_activity = true;
        SqliteUserRepository::try_new(&self.conn)
            .unwrap()
            .create_user(&user)
            .unwrap();
        user
    }

    pub fn blocked_user(&self, username: &str) -> User {
        let mut user = User::new(username);
        user.state = UserState::Blocked;
        SqliteUserRepository::try_new(&self.conn)
            .unwrap()
            .create_user(&user)
            .unwrap();
        user
    }

    pub fn group(&self, path: &str, visibility: Visibility) -> Group {
        let group = Group::new(path, visibility);
        SqliteProjectRepository::try_new(&self.conn)
            .unwrap()
            .create_group(&group)
            .unwrap();
        group
    }

    pub fn project(&self, path: &str, visibility: Visibility, group: Option<&Group>) -> Project {
        let project = match group {
            Some(group) => Project::in_group(path, visibility, group),
            None => Project::new(path, visibility),
        };
        SqliteProjectRepository::try_new(&self.conn)
            .unwrap()
            .create_project(&project)
            .unwrap();
        project
    }

    pub fn member(&self, source: MemberSource, user: &User, level: AccessLevel) {
        SqliteProjectRepository::try_new(&self.conn)
            .unwrap()
            .add_member(source, user.id, level)
            .unwrap();
    }

    pub fn setting(&self, user: &User, source: NotificationSource, level: NotificationLevel) {
        SqliteNotificationSettingRepository::try_new(&self.conn)
            .unwrap()
            .upsert_setting(&NotificationSetting::new(user.id, source, level))
            .unwrap();
    }

    pub fn custom(
        &self,
        user: &User,
        source: NotificationSource,
        events: impl IntoIterator<Item = NotificationEvent>,
    ) {
        SqliteNotificationSettingRepository::try_new(&self.conn)
            .unwrap()
            .upsert_setting(&NotificationSetting::custom(user.id, source, events))
            .unwrap();
    }

    pub fn subscribe(
        &self,
        subscribable: Subscribable,
        user: &User,
        project: Option<&Project>,
        subscribed: bool,
    ) {
        SqliteSubscriptionRepository::try_new(&self.conn)
            .unwrap()
            .set_subscription(
                subscribable,
                user.id,
                project.map(|project| project.id),
                subscribed,
            )
            .unwrap();
    }

    pub fn label(&self, title: &str, project: &Project) -> Label {
        let label = Label::new(title, LabelScope::Project(project.id));
        SqliteLabelRepository::try_new(&self.conn)
            .unwrap()
            .create_label(&label)
            .unwrap();
        label
    }

    pub fn attach_label(&self, target: &Target, label: &Label) {
        SqliteLabelRepository::try_new(&self.conn)
            .unwrap()
            .attach_label(target, label.id)
            .unwrap();
    }

    /// Runs `f` with a recipient service wired to this database.
    pub fn with_service<R>(
        &self,
        project: Option<&Project>,
        f: impl FnOnce(&NotificationRecipientService<'_>) -> R,
    ) -> R {
        self.with_sources(|sources| f(&NotificationRecipientService::new(sources, project)))
    }

    /// Runs `f` with the raw collaborators wired to this database.
    pub fn with_sources<R>(&self, f: impl FnOnce(RecipientSources<'_>) -> R) -> R {
        let users = SqliteUserRepository::try_new(&self.conn).unwrap();
        let projects = SqliteProjectRepository::try_new(&self.conn).unwrap();
        let settings = SqliteNotificationSettingRepository::try_new(&self.conn).unwrap();
        let subscriptions = SqliteSubscriptionRepository::try_new(&self.conn).unwrap();
        let labels = SqliteLabelRepository::try_new(&self.conn).unwrap();
        let policy = MembershipPolicy::new(&projects);
        f(RecipientSources {
            users: &users,
            projects: &projects,
            settings: &settings,
            subscriptions: &subscriptions,
            labels: &labels,
            abilities: &policy,
        })
    }
}

pub fn ids(users: &[User]) -> BTreeSet<UserId> {
    users.iter().map(|user| user.id).collect()
}

pub fn id_set(users: &[&User]) -> BTreeSet<UserId> {
    users.iter().map(|user| user.id).collect()
}

/// Asserts no user appears twice.
pub fn assert_unique(users: &[User]) {
    assert_eq!(ids(users).len(), users.len(), "duplicate recipients: {users:?}");
}
