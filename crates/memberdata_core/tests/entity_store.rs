use memberdata_core::{
    Entity, EntityRepository, EntitySchema, FieldType, InMemoryEntityStore, QueryError,
    RepoError,
};
use uuid::Uuid;

fn member_store() -> InMemoryEntityStore {
    let schema = EntitySchema::new(
        "Member",
        [
            ("username", FieldType::Text),
            ("age", FieldType::Integer),
            ("team", FieldType::Reference),
        ],
    )
    .unwrap();
    InMemoryEntityStore::new(schema)
}

#[test]
fn insert_then_get_returns_same_entity_with_assigned_id() {
    let mut store = member_store();
    let member = Entity::new().with("username", "userA").with("age", 10);

    let id = store.insert(&member).unwrap();
    let loaded = store.get(id).unwrap();

    assert_eq!(loaded.id(), Some(id));
    assert!(!id.is_nil());
    assert_eq!(loaded.without_id(), member);
}

#[test]
fn explicit_id_is_kept_and_duplicates_are_rejected() {
    let mut store = member_store();
    let id = Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap();
    let first = Entity::with_id(id).unwrap().with("username", "a");

    assert_eq!(store.insert(&first).unwrap(), id);
    let err = store.insert(&first).unwrap_err();
    assert_eq!(err, RepoError::DuplicateIdentifier(id));
    assert_eq!(store.count(), 1);
}

#[test]
fn get_missing_returns_not_found() {
    let store = member_store();
    let id = Uuid::new_v4();
    assert_eq!(store.get(id).unwrap_err(), RepoError::NotFound(id));
    assert!(store.find_by_id(id).is_none());
}

#[test]
fn count_tracks_inserts_minus_deletes() {
    let mut store = member_store();
    let ids: Vec<_> = (0..5)
        .map(|n| {
            store
                .insert(&Entity::new().with("username", format!("member{n}")))
                .unwrap()
        })
        .collect();

    assert!(store.delete(ids[1]));
    assert!(store.delete(ids[3]));
    assert!(!store.delete(ids[3]));

    assert_eq!(store.count(), 3);
}

#[test]
fn all_preserves_insertion_order_across_deletes() {
    let mut store = member_store();
    let a = store.insert(&Entity::new().with("username", "a")).unwrap();
    let b = store.insert(&Entity::new().with("username", "b")).unwrap();
    let c = store.insert(&Entity::new().with("username", "c")).unwrap();
    store.delete(b);
    let d = store.insert(&Entity::new().with("username", "d")).unwrap();

    let ids: Vec<_> = store.all().iter().filter_map(Entity::id).collect();
    assert_eq!(ids, vec![a, c, d]);
}

#[test]
fn insert_rejects_fields_outside_schema() {
    let mut store = member_store();

    let unknown = store
        .insert(&Entity::new().with("nickname", "x"))
        .unwrap_err();
    assert!(matches!(
        unknown,
        RepoError::InvalidEntity(QueryError::UnknownField { ref field, .. }) if field == "nickname"
    ));

    let mismatch = store
        .insert(&Entity::new().with("age", "ten"))
        .unwrap_err();
    assert!(matches!(
        mismatch,
        RepoError::InvalidEntity(QueryError::TypeMismatch {
            expected: FieldType::Integer,
            found: FieldType::Text,
            ..
        })
    ));
    assert_eq!(store.count(), 0);
}

#[test]
fn update_is_visible_to_next_read_and_snapshots_are_detached() {
    let mut store = member_store();
    let id = store
        .insert(&Entity::new().with("username", "member1"))
        .unwrap();

    let mut snapshot = store.get(id).unwrap();
    snapshot.set("username", "update member name");
    assert_eq!(store.get(id).unwrap().text("username"), Some("member1"));

    store.update(&snapshot).unwrap();
    assert_eq!(
        store.get(id).unwrap().text("username"),
        Some("update member name")
    );
}

#[test]
fn update_of_deleted_entity_is_not_found() {
    let mut store = member_store();
    let id = store.insert(&Entity::new().with("username", "gone")).unwrap();
    let snapshot = store.get(id).unwrap();
    store.delete(id);

    assert_eq!(store.update(&snapshot).unwrap_err(), RepoError::NotFound(id));
}
