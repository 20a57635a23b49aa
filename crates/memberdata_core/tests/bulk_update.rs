use memberdata_core::{
    bulk_update, Entity, EntityRepository, EntitySchema, FieldType, InMemoryEntityStore,
    Predicate, QueryError, RepoError,
};
use uuid::Uuid;

fn seeded(ages: &[i64]) -> InMemoryEntityStore {
    let schema = EntitySchema::new(
        "Member",
        [("username", FieldType::Text), ("age", FieldType::Integer)],
    )
    .unwrap();
    let mut store = InMemoryEntityStore::new(schema);
    for (n, age) in ages.iter().enumerate() {
        store
            .insert(
                &Entity::new()
                    .with("username", format!("member{}", n + 1))
                    .with("age", *age),
            )
            .unwrap();
    }
    store
}

fn ages(store: &InMemoryEntityStore) -> Vec<i64> {
    store.all().iter().filter_map(|e| e.integer("age")).collect()
}

fn plus_one(entity: &mut Entity) -> Result<(), RepoError> {
    let age = entity.integer("age").unwrap_or_default();
    entity.set("age", age + 1);
    Ok(())
}

#[test]
fn increments_every_member_at_or_above_threshold() {
    let mut store = seeded(&[10, 19, 20, 21, 40]);
    let predicate = Predicate::builder(store.schema())
        .gte("age", 20)
        .build()
        .unwrap();

    let updated = bulk_update(&mut store, &predicate, plus_one).unwrap();

    assert_eq!(updated, 3);
    assert_eq!(ages(&store), vec![10, 19, 21, 22, 41]);
}

#[test]
fn snapshot_taken_before_bulk_update_is_stale_but_rereads_are_fresh() {
    let mut store = seeded(&[10, 19, 20, 21, 40]);
    let member5 = store.all().pop().unwrap();
    let predicate = Predicate::builder(store.schema())
        .gte("age", 20)
        .build()
        .unwrap();

    bulk_update(&mut store, &predicate, plus_one).unwrap();

    assert_eq!(member5.integer("age"), Some(40));
    let reread = store.get(member5.id().unwrap()).unwrap();
    assert_eq!(reread.integer("age"), Some(41));
}

#[test]
fn failure_part_way_keeps_earlier_updates() {
    let mut store = seeded(&[20, 30, 40]);
    let predicate = Predicate::all();
    let mut seen = 0;

    let err = bulk_update(&mut store, &predicate, |entity| {
        seen += 1;
        if seen == 2 {
            entity.set("age", 0);
            return Err(RepoError::InvalidData("refused".to_string()));
        }
        plus_one(entity)
    })
    .unwrap_err();

    assert_eq!(err, RepoError::InvalidData("refused".to_string()));
    assert_eq!(ages(&store), vec![21, 30, 40]);
}

#[test]
fn per_entity_write_is_all_or_nothing() {
    let mut store = seeded(&[20]);

    let err = bulk_update(&mut store, &Predicate::all(), |entity| {
        entity.set("username", "renamed");
        entity.set("age", "not a number");
        Ok(())
    })
    .unwrap_err();

    assert!(matches!(
        err,
        RepoError::InvalidEntity(QueryError::TypeMismatch { .. })
    ));
    let stored = store.all().pop().unwrap();
    assert_eq!(stored.text("username"), Some("member1"));
    assert_eq!(stored.integer("age"), Some(20));
}

#[test]
fn transform_cannot_change_identity() {
    let mut store = seeded(&[20]);
    let original = store.all().pop().unwrap().id().unwrap();

    let err = bulk_update(&mut store, &Predicate::all(), |entity| {
        *entity = entity.clone().identified_by(Uuid::new_v4());
        Ok(())
    })
    .unwrap_err();

    assert!(matches!(
        err,
        RepoError::IdentifierChanged { expected, .. } if expected == original
    ));
}

#[test]
fn invalid_predicate_writes_nothing() {
    let mut store = seeded(&[20, 30]);
    let foreign = EntitySchema::new("Team", [("name", FieldType::Text)]).unwrap();
    let predicate = Predicate::builder(&foreign)
        .eq("name", "teamA")
        .build()
        .unwrap();

    let err = bulk_update(&mut store, &predicate, plus_one).unwrap_err();
    assert!(matches!(err, RepoError::Query(QueryError::UnknownField { .. })));
    assert_eq!(ages(&store), vec![20, 30]);
}
