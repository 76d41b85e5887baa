mod common;

use common::{assert_unique, id_set, ids, Fixture};
use notifykit_core::recipient::filters::reject_users_by_level_name;
use notifykit_core::{
    AccessLevel, IssuableAction, MemberSource, NotificationEvent, NotificationLevel,
    NotificationSource, RecipientError, ResolutionContext, Subscribable, Target, TargetKind,
    Visibility,
};

#[test]
fn participants_and_watchers_are_notified_without_the_actor() {
    let fx = Fixture::new();
    let project = fx.project("web", Visibility::Public, None);
    let author = fx.user("author");
    let assignee = fx.user("assignee");
    let watcher = fx.user("watcher");
    fx.setting(
        &watcher,
        NotificationSource::Project(project.id),
        NotificationLevel::Watch,
    );

    let issue = Target::issuable(TargetKind::Issue, project.id, author.id)
        .with_assignees([assignee.id]);
    let recipients = fx.with_service(Some(&project), |service| {
        service
            .build_recipients(&issue, &author, IssuableAction::New, &[], true)
            .unwrap()
    });

    assert_eq!(ids(&recipients), id_set(&[&assignee, &watcher]));
    assert_unique(&recipients);
}

#[test]
fn actor_is_kept_when_not_skipped_or_opted_in() {
    let fx = Fixture::new();
    let project = fx.project("web", Visibility::Public, None);
    let author = fx.user("author");
    let chatty = fx.user_notified_of_own_activity("chatty");

    let issue = Target::issuable(TargetKind::Issue, project.id, author.id);
    let recipients = fx.with_service(Some(&project), |service| {
        service
            .build_recipients(&issue, &author, IssuableAction::Update, &[], false)
            .unwrap()
    });
    assert_eq!(ids(&recipients), id_set(&[&author]));

    let issue = Target::issuable(TargetKind::Issue, project.id, chatty.id);
    let recipients = fx.with_service(Some(&project), |service| {
        service
            .build_recipients(&issue, &chatty, IssuableAction::Update, &[], true)
            .unwrap()
    });
    assert_eq!(ids(&recipients), id_set(&[&chatty]));
}

#[test]
fn mention_and_disabled_levels_are_rejected() {
    let fx = Fixture::new();
    let project = fx.project("web", Visibility::Public, None);
    let actor = fx.user("actor");
    let author = fx.user("author");
    let mention_only = fx.user("mention_only");
    let muted = fx.user("muted");
    fx.setting(
        &mention_only,
        NotificationSource::Project(project.id),
        NotificationLevel::Mention,
    );
    fx.setting(&muted, NotificationSource::Global, NotificationLevel::Disabled);

    let issue = Target::issuable(TargetKind::Issue, project.id, author.id)
        .with_participants([mention_only.id, muted.id]);
    let recipients = fx.with_service(Some(&project), |service| {
        service
            .build_recipients(&issue, &actor, IssuableAction::Close, &[], true)
            .unwrap()
    });

    assert_eq!(ids(&recipients), id_set(&[&author]));
}

#[test]
fn custom_level_users_follow_their_event_toggles() {
    let fx = Fixture::new();
    let group = fx.group("acme", Visibility::Public);
    let project = fx.project("web", Visibility::Public, Some(&group));
    let author = fx.user("author");
    let on_project = fx.user("on_project");
    let on_group = fx.user("on_group");
    let via_global = fx.user("via_global");
    fx.custom(
        &on_project,
        NotificationSource::Project(project.id),
        [NotificationEvent::NewIssue],
    );
    fx.custom(
        &on_group,
        NotificationSource::Group(group.id),
        [NotificationEvent::NewIssue, NotificationEvent::CloseIssue],
    );
    fx.setting(
        &via_global,
        NotificationSource::Project(project.id),
        NotificationLevel::Global,
    );
    fx.custom(
        &via_global,
        NotificationSource::Global,
        [NotificationEvent::CloseIssue],
    );

    let issue = Target::issuable(TargetKind::Issue, project.id, author.id);
    let (opened, closed, updated) = fx.with_service(Some(&project), |service| {
        let opened = service
            .build_recipients(&issue, &author, IssuableAction::New, &[], true)
            .unwrap();
        let closed = service
            .build_recipients(&issue, &author, IssuableAction::Close, &[], true)
            .unwrap();
        let updated = service
            .build_recipients(&issue, &author, IssuableAction::Update, &[], true)
            .unwrap();
        (opened, closed, updated)
    });

    assert_eq!(ids(&opened), id_set(&[&on_project, &on_group]));
    assert_eq!(ids(&closed), id_set(&[&on_group, &via_global]));
    assert!(updated.is_empty());
}

#[test]
fn reassignment_re_adds_involved_users_but_not_muted_ones() {
    let fx = Fixture::new();
    let project = fx.project("web", Visibility::Public, None);
    let actor = fx.user("actor");
    let previous = fx.user("previous");
    let muted_assignee = fx.user("muted_assignee");
    let new_assignee = fx.user("new_assignee");
    fx.setting(
        &previous,
        NotificationSource::Project(project.id),
        NotificationLevel::Mention,
    );
    fx.setting(
        &muted_assignee,
        NotificationSource::Project(project.id),
        NotificationLevel::Disabled,
    );
    fx.setting(
        &new_assignee,
        NotificationSource::Project(project.id),
        NotificationLevel::Mention,
    );

    let mr = Target::issuable(TargetKind::MergeRequest, project.id, actor.id)
        .with_assignees([new_assignee.id, muted_assignee.id]);
    let previous_ids = [previous.id];
    let (reassigned, updated) = fx.with_service(Some(&project), |service| {
        let reassigned = service
            .build_recipients(&mr, &actor, IssuableAction::Reassign, &previous_ids, true)
            .unwrap();
        let updated = service
            .build_recipients(&mr, &actor, IssuableAction::Update, &previous_ids, true)
            .unwrap();
        (reassigned, updated)
    });

    assert_eq!(ids(&reassigned), id_set(&[&previous, &new_assignee]));
    assert!(updated.is_empty());
}

#[test]
fn subscribers_are_added_and_unsubscribers_removed() {
    let fx = Fixture::new();
    let project = fx.project("web", Visibility::Public, None);
    let author = fx.user("author");
    let actor = fx.user("actor");
    let subscriber = fx.user("subscriber");
    let elsewhere = fx.user("elsewhere");
    let other_project = fx.project("api", Visibility::Public, None);

    let issue = Target::issuable(TargetKind::Issue, project.id, author.id);
    let subscribable = Subscribable::of_target(&issue);
    fx.subscribe(subscribable, &subscriber, Some(&project), true);
    fx.subscribe(subscribable, &elsewhere, Some(&other_project), true);
    fx.subscribe(subscribable, &author, Some(&project), false);

    let recipients = fx.with_service(Some(&project), |service| {
        service
            .build_recipients(&issue, &actor, IssuableAction::Update, &[], true)
            .unwrap()
    });

    assert_eq!(ids(&recipients), id_set(&[&subscriber]));
}

#[test]
fn label_subscribers_join_only_for_new_issuables() {
    let fx = Fixture::new();
    let project = fx.project("web", Visibility::Public, None);
    let author = fx.user("author");
    let fan = fx.user("fan");
    let label = fx.label("bug", &project);
    fx.subscribe(Subscribable::of_label(&label), &fan, Some(&project), true);

    let issue = Target::issuable(TargetKind::Issue, project.id, author.id);
    fx.attach_label(&issue, &label);

    let (opened, reopened) = fx.with_service(Some(&project), |service| {
        let opened = service
            .build_recipients(&issue, &author, IssuableAction::New, &[], true)
            .unwrap();
        let reopened = service
            .build_recipients(&issue, &author, IssuableAction::Reopen, &[], true)
            .unwrap();
        (opened, reopened)
    });

    assert_eq!(ids(&opened), id_set(&[&fan]));
    assert!(reopened.is_empty());
}

#[test]
fn private_project_requires_membership() {
    let fx = Fixture::new();
    let project = fx.project("secret", Visibility::Private, None);
    let author = fx.user("author");
    let member = fx.user("member");
    let outsider = fx.user("outsider");
    fx.member(MemberSource::Project(project.id), &author, AccessLevel::Developer);
    fx.member(MemberSource::Project(project.id), &member, AccessLevel::Guest);
    for user in [&member, &outsider] {
        fx.setting(
            user,
            NotificationSource::Project(project.id),
            NotificationLevel::Watch,
        );
    }

    let issue = Target::issuable(TargetKind::Issue, project.id, author.id);
    let recipients = fx.with_service(Some(&project), |service| {
        service
            .build_recipients(&issue, &author, IssuableAction::New, &[], true)
            .unwrap()
    });

    assert_eq!(ids(&recipients), id_set(&[&member]));
}

#[test]
fn confidential_issue_reaches_only_privileged_users() {
    let fx = Fixture::new();
    let project = fx.project("web", Visibility::Public, None);
    let actor = fx.user("actor");
    let author = fx.user("author");
    let assignee = fx.user("assignee");
    let reporter = fx.user("reporter");
    let guest = fx.user("guest");
    let stranger = fx.user("stranger");
    fx.member(MemberSource::Project(project.id), &reporter, AccessLevel::Reporter);
    fx.member(MemberSource::Project(project.id), &guest, AccessLevel::Guest);
    for user in [&reporter, &guest, &stranger] {
        fx.setting(
            user,
            NotificationSource::Project(project.id),
            NotificationLevel::Watch,
        );
    }

    let issue = Target::issuable(TargetKind::Issue, project.id, author.id)
        .with_assignees([assignee.id])
        .confidential();
    let recipients = fx.with_service(Some(&project), |service| {
        service
            .build_recipients(&issue, &actor, IssuableAction::Update, &[], true)
            .unwrap()
    });

    assert_eq!(ids(&recipients), id_set(&[&author, &assignee, &reporter]));
}

#[test]
fn blocked_users_never_receive_notifications() {
    let fx = Fixture::new();
    let project = fx.project("web", Visibility::Public, None);
    let actor = fx.user("actor");
    let author = fx.user("author");
    let blocked = fx.blocked_user("blocked");

    let issue = Target::issuable(TargetKind::Issue, project.id, author.id)
        .with_participants([blocked.id]);
    let recipients = fx.with_service(Some(&project), |service| {
        service
            .build_recipients(&issue, &actor, IssuableAction::Update, &[], true)
            .unwrap()
    });

    assert_eq!(ids(&recipients), id_set(&[&author]));
}

#[test]
fn repeated_builds_return_the_same_recipients() {
    let fx = Fixture::new();
    let group = fx.group("acme", Visibility::Public);
    let project = fx.project("web", Visibility::Public, Some(&group));
    let author = fx.user("author");
    let assignee = fx.user("assignee");
    let watcher = fx.user("watcher");
    fx.setting(&watcher, NotificationSource::Group(group.id), NotificationLevel::Watch);
    fx.setting(
        &assignee,
        NotificationSource::Project(project.id),
        NotificationLevel::Watch,
    );
    let issue = Target::issuable(TargetKind::Issue, project.id, author.id)
        .with_assignees([assignee.id]);
    fx.subscribe(Subscribable::of_target(&issue), &assignee, Some(&project), true);

    let (first, second) = fx.with_service(Some(&project), |service| {
        let build = || {
            service
                .build_recipients(&issue, &author, IssuableAction::New, &[], true)
                .unwrap()
        };
        (build(), build())
    });

    assert_eq!(first, second);
    assert_unique(&first);
    assert_eq!(ids(&first), id_set(&[&assignee, &watcher]));
}

#[test]
fn unknown_level_name_aborts_filtering() {
    let fx = Fixture::new();
    let project = fx.project("web", Visibility::Public, None);
    let user = fx.user("user");

    let err = fx.with_sources(|sources| {
        let ctx = ResolutionContext::new(sources, Some(&project));
        reject_users_by_level_name(&ctx, vec![user.clone()], "loud").unwrap_err()
    });
    assert!(matches!(err, RecipientError::InvalidNotificationLevel(_)));

    let kept = fx.with_sources(|sources| {
        let ctx = ResolutionContext::new(sources, Some(&project));
        reject_users_by_level_name(&ctx, vec![user.clone(), user.clone()], "mention").unwrap()
    });
    assert_eq!(kept, vec![user]);
}

#[test]
fn project_watch_survives_group_mute() {
    let fx = Fixture::new();
    let group = fx.group("acme", Visibility::Public);
    let project = fx.project("web", Visibility::Public, Some(&group));
    let author = fx.user("author");
    let watcher = fx.user("watcher");
    let group_muted = fx.user("group_muted");
    fx.setting(
        &watcher,
        NotificationSource::Project(project.id),
        NotificationLevel::Watch,
    );
    for user in [&watcher, &group_muted] {
        fx.setting(user, NotificationSource::Group(group.id), NotificationLevel::Disabled);
    }

    let issue = Target::issuable(TargetKind::Issue, project.id, author.id)
        .with_participants([group_muted.id]);
    let recipients = fx.with_service(Some(&project), |service| {
        service
            .build_recipients(&issue, &author, IssuableAction::New, &[], true)
            .unwrap()
    });

    assert_eq!(ids(&recipients), id_set(&[&watcher]));
}
