use super::*;
use crate::{gc, Outcome};
use pretty_assertions::assert_eq;

fn names(store: &MemStore) -> Vec<String> {
    store.bindings().into_iter().map(|b| b.id.name).collect()
}

#[tokio::test]
async fn collects_only_managed_bindings_of_user() {
    let store = MemStore::default()
        .with_binding(managed(
            "c1",
            "u-alice-c1-developer",
            spec("projects-create", "alice", "p1", "c1"),
        ))
        .with_binding(managed(
            "c2",
            "u-alice-c2-developer",
            spec("projects-create", "alice", "p1", "c2"),
        ))
        .with_binding(managed(
            "c1",
            "u-bob-c1-developer",
            spec("projects-create", "bob", "p2", "c1"),
        ))
        .with_binding(unmanaged(
            "c1",
            "alice-by-hand",
            spec("cluster-owner", "alice", "p1", "c1"),
            None,
        ))
        .with_binding(unmanaged(
            "c1",
            "alice-by-other-tool",
            spec("cluster-owner", "alice", "p1", "c1"),
            Some("some-other-controller"),
        ));
    let metrics = Metrics::register(&mut Default::default());

    let deleted = gc::collect(&store, "alice", &metrics).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(
        names(&store),
        vec!["alice-by-hand", "alice-by-other-tool", "u-bob-c1-developer"]
    );
    assert_eq!(metrics.binding_changes("delete"), 2);
}

#[tokio::test]
async fn already_deleted_binding_is_success() {
    let store = MemStore::default().with_binding(managed(
        "c1",
        "u-alice-c1-developer",
        spec("projects-create", "alice", "p1", "c1"),
    ));
    store.fail(Fail::DeleteNotFound);
    let metrics = Metrics::register(&mut Default::default());

    let deleted = gc::collect(&store, "alice", &metrics).await.unwrap();
    assert_eq!(deleted, 0);
    assert!(store.bindings().is_empty());
}

#[tokio::test]
async fn list_failure_is_propagated() {
    let store = MemStore::default().with_binding(managed(
        "c1",
        "u-alice-c1-developer",
        spec("projects-create", "alice", "p1", "c1"),
    ));
    store.fail(Fail::ListBindings);
    let metrics = Metrics::register(&mut Default::default());

    let error = gc::collect(&store, "alice", &metrics).await.unwrap_err();
    assert!(!error.is_conflict());
    assert_eq!(error.to_string(), "connection reset");
    assert_eq!(store.bindings().len(), 1);
}

#[tokio::test]
async fn collect_for_deleted_identity() {
    let rules = rules_file(&[Rule::new("developer", "projects-create")]);
    let store = MemStore::default()
        .with_identity(identity("u-alice", "alice-developer", &["p1"]))
        .with_identity(identity("u-carol", "carol-developer", &["p3"]))
        .with_cluster("c1", Some("alice-developer,carol-developer"));
    let r = reconciler(store, &rules);

    r.reconcile("u-alice").await.unwrap();
    r.reconcile("u-carol").await.unwrap();
    assert_eq!(
        names(r.store()),
        vec!["u-alice-c1-developer", "u-carol-c1-developer"]
    );

    r.store().remove_identity("u-alice");
    assert_eq!(
        r.collect("alice-developer").await.unwrap(),
        Outcome::Collected(1)
    );
    assert_eq!(names(r.store()), vec!["u-carol-c1-developer"]);
    assert_eq!(r.metrics().reconciles("collected"), 1);
}
