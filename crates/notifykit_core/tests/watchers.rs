mod common;

use common::{id_set, ids, Fixture};
use notifykit_core::recipient::watchers::watchers_of;
use notifykit_core::{NotificationLevel, NotificationSource, Visibility};

#[test]
fn project_and_group_watchers_are_merged() {
    let fx = Fixture::new();
    let group = fx.group("acme", Visibility::Private);
    let project = fx.project("web", Visibility::Private, Some(&group));
    let a = fx.user("a");
    let b = fx.user("b");
    let c = fx.user("c");

    fx.setting(&a, NotificationSource::Project(project.id), NotificationLevel::Watch);
    fx.setting(&b, NotificationSource::Group(group.id), NotificationLevel::Watch);
    fx.setting(
        &c,
        NotificationSource::Project(project.id),
        NotificationLevel::Disabled,
    );

    let watchers = fx.with_sources(|sources| watchers_of(&sources, &project).unwrap());
    assert_eq!(ids(&watchers), id_set(&[&a, &b]));
}

#[test]
fn explicit_project_setting_hides_group_watch() {
    let fx = Fixture::new();
    let group = fx.group("acme", Visibility::Private);
    let project = fx.project("web", Visibility::Private, Some(&group));
    let user = fx.user("a");

    fx.setting(&user, NotificationSource::Group(group.id), NotificationLevel::Watch);
    fx.setting(
        &user,
        NotificationSource::Project(project.id),
        NotificationLevel::Mention,
    );

    let watchers = fx.with_sources(|sources| watchers_of(&sources, &project).unwrap());
    assert!(watchers.is_empty());
}

#[test]
fn project_global_level_does_not_fall_through_to_group_watch() {
    let fx = Fixture::new();
    let group = fx.group("acme", Visibility::Private);
    let project = fx.project("web", Visibility::Private, Some(&group));
    let user = fx.user("a");

    fx.setting(
        &user,
        NotificationSource::Project(project.id),
        NotificationLevel::Global,
    );
    fx.setting(&user, NotificationSource::Group(group.id), NotificationLevel::Watch);

    let watchers = fx.with_sources(|sources| watchers_of(&sources, &project).unwrap());
    assert!(watchers.is_empty());

    fx.setting(&user, NotificationSource::Global, NotificationLevel::Watch);
    let watchers = fx.with_sources(|sources| watchers_of(&sources, &project).unwrap());
    assert_eq!(ids(&watchers), id_set(&[&user]));
}

#[test]
fn group_global_level_resolving_to_watch_counts() {
    let fx = Fixture::new();
    let group = fx.group("acme", Visibility::Private);
    let project = fx.project("web", Visibility::Private, Some(&group));
    let watching = fx.user("watching");
    let quiet = fx.user("quiet");

    for user in [&watching, &quiet] {
        fx.setting(user, NotificationSource::Group(group.id), NotificationLevel::Global);
    }
    fx.setting(&watching, NotificationSource::Global, NotificationLevel::Watch);
    fx.setting(&quiet, NotificationSource::Global, NotificationLevel::Participating);

    let watchers = fx.with_sources(|sources| watchers_of(&sources, &project).unwrap());
    assert_eq!(ids(&watchers), id_set(&[&watching]));
}

#[test]
fn global_watch_without_scoped_rows_is_not_a_watcher() {
    let fx = Fixture::new();
    let project = fx.project("web", Visibility::Private, None);
    let user = fx.user("a");
    fx.setting(&user, NotificationSource::Global, NotificationLevel::Watch);

    let watchers = fx.with_sources(|sources| watchers_of(&sources, &project).unwrap());
    assert!(watchers.is_empty());
}

#[test]
fn project_without_group_uses_project_rows_only() {
    let fx = Fixture::new();
    let project = fx.project("web", Visibility::Private, None);
    let a = fx.user("a");
    let b = fx.user("b");
    fx.setting(&a, NotificationSource::Project(project.id), NotificationLevel::Watch);
    fx.setting(&b, NotificationSource::Project(project.id), NotificationLevel::Global);
    fx.setting(&b, NotificationSource::Global, NotificationLevel::Watch);

    let watchers = fx.with_sources(|sources| watchers_of(&sources, &project).unwrap());
    assert_eq!(ids(&watchers), id_set(&[&a, &b]));
    common::assert_unique(&watchers);
}

#[test]
fn project_watch_wins_over_group_disabled() {
    let fx = Fixture::new();
    let group = fx.group("acme", Visibility::Private);
    let project = fx.project("web", Visibility::Private, Some(&group));
    let user = fx.user("a");

    fx.setting(&user, NotificationSource::Project(project.id), NotificationLevel::Watch);
    fx.setting(&user, NotificationSource::Group(group.id), NotificationLevel::Disabled);

    let watchers = fx.with_sources(|sources| watchers_of(&sources, &project).unwrap());
    assert_eq!(ids(&watchers), id_set(&[&user]));
}
