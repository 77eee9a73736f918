//! Entities inheriting the mapping of a parent entity.

use tests::{tests, DbTest};

use pretty_assertions::assert_eq;
use trellis::config::IntegerVersion;
use trellis::stmt::Value;
use trellis::{
    lens, property, EntityMapping, IdentifierPolicy, Inheritance, PersistListener, Persister,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Animal {
    id: Option<i64>,
    name: String,
    version: Option<i64>,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Dog {
    animal: Animal,
    breed: String,
}

fn animal_mapping() -> EntityMapping<Animal> {
    EntityMapping::new()
        .identifier(property!(Animal, id), IdentifierPolicy::after_insert())
        .add(property!(Animal, name))
}

fn dog(name: &str, breed: &str) -> Dog {
    Dog {
        animal: Animal {
            name: name.to_string(),
            ..Default::default()
        },
        breed: breed.to_string(),
    }
}

fn columns(cx: &trellis::PersistenceContext, table: &str) -> Vec<String> {
    cx.schema()
        .table(table)
        .unwrap()
        .columns
        .iter()
        .map(|column| column.name.clone())
        .collect()
}

fn parent_columns_join_the_child_table(test: &mut DbTest) {
    let mut cx = test.context();
    let dogs = EntityMapping::<Dog>::new()
        .map_inheritance(Inheritance::new(lens!(Dog, animal), animal_mapping()))
        .add(property!(Dog, breed))
        .build(&mut cx)
        .unwrap();

    assert_eq!(columns(&cx, "Dog"), vec!["id", "name", "breed"]);
    assert!(cx.schema().table("Animal").is_none());
    assert!(!cx.is_registered::<Animal>());

    let mut session = test.session(&cx);
    let mut rex = dog("Rex", "collie");
    dogs.insert(&mut session, &mut rex).unwrap();
    assert_eq!(rex.animal.id, Some(1));
    assert_eq!(test.log().count_on("insert", "Dog"), 1);

    let loaded = dogs.select(&mut session, Value::I64(1)).unwrap().unwrap();
    assert_eq!(loaded, rex);
}

fn joined_tables(test: &mut DbTest) {
    let mut cx = test.context();
    let dogs = EntityMapping::<Dog>::new()
        .map_inheritance(Inheritance::new(lens!(Dog, animal), animal_mapping()).with_joined_table())
        .add(property!(Dog, breed))
        .build(&mut cx)
        .unwrap();

    assert_eq!(columns(&cx, "Animal"), vec!["id", "name"]);
    assert_eq!(columns(&cx, "Dog"), vec!["id", "breed"]);
    let fk = &cx.schema().table("Dog").unwrap().foreign_keys[0];
    assert_eq!(fk.name, "FK_Dog_id_Animal_id");
    assert_eq!(fk.target_table, "Animal");

    let mut session = test.session(&cx);
    let mut rex = dog("Rex", "collie");
    dogs.insert(&mut session, &mut rex).unwrap();
    assert_eq!(
        test.log().statements(),
        vec![
            "INSERT INTO Animal {name: 'Rex'}".to_string(),
            "INSERT INTO Dog {id: 1, breed: 'collie'}".to_string(),
        ]
    );

    let loaded = dogs.select(&mut session, Value::I64(1)).unwrap().unwrap();
    assert_eq!(loaded, rex);

    // Only the table holding the change is written
    let original = rex.clone();
    rex.breed = "beagle".into();
    test.log().clear();
    dogs.update(&mut session, &mut rex, &original, false).unwrap();
    assert_eq!(test.log().count_on("update", "Animal"), 0);
    assert_eq!(test.log().count_on("update", "Dog"), 1);

    // Child rows go first
    test.log().clear();
    dogs.delete(&mut session, &rex).unwrap();
    assert_eq!(
        test.log().statements(),
        vec![
            "DELETE FROM Dog WHERE id = 1".to_string(),
            "DELETE FROM Animal WHERE id = 1".to_string(),
        ]
    );
    assert_eq!(test.memory().row_count("Animal"), 0);
}

fn inherited_version_follows_changes_in_any_table(test: &mut DbTest) {
    let mut cx = test.context();
    let dogs = EntityMapping::<Dog>::new()
        .map_inheritance(
            Inheritance::new(
                lens!(Dog, animal),
                animal_mapping().versioned_by(property!(Animal, version), IntegerVersion),
            )
            .with_joined_table(),
        )
        .add(property!(Dog, breed))
        .build(&mut cx)
        .unwrap();
    let mut session = test.session(&cx);

    let mut rex = dog("Rex", "collie");
    dogs.insert(&mut session, &mut rex).unwrap();
    assert_eq!(rex.animal.version, Some(1));

    let original = rex.clone();
    rex.breed = "beagle".into();
    dogs.update(&mut session, &mut rex, &original, false).unwrap();

    assert_eq!(rex.animal.version, Some(2));
    assert_eq!(
        test.memory().rows("Animal")[0].get("version"),
        &Value::I64(2)
    );

    // The stale copy no longer matches
    let mut stale = original.clone();
    stale.breed = "poodle".into();
    let err = dogs
        .update(&mut session, &mut stale, &original, false)
        .unwrap_err();
    assert!(err.is_stale_object());
}

fn child_cannot_redefine_the_identifier(test: &mut DbTest) {
    let mut cx = test.context();
    let err = EntityMapping::<Dog>::new()
        .map_inheritance(Inheritance::new(lens!(Dog, animal), animal_mapping()))
        .identifier(property!(Dog, breed), IdentifierPolicy::after_insert())
        .build(&mut cx)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid mapping: identifier of Dog is already defined by its parent"
    );
}

struct Noop;

impl PersistListener<Animal> for Noop {}

fn parent_listeners_are_not_inherited(test: &mut DbTest) {
    let mut cx = test.context();
    let err = EntityMapping::<Dog>::new()
        .map_inheritance(Inheritance::new(
            lens!(Dog, animal),
            animal_mapping().add_listener(Noop),
        ))
        .build(&mut cx)
        .unwrap_err();
    assert!(err.is_unsupported_feature());
}

tests!(
    parent_columns_join_the_child_table,
    joined_tables,
    inherited_version_follows_changes_in_any_table,
    child_cannot_redefine_the_identifier,
    parent_listeners_are_not_inherited,
);
