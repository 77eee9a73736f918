//! One-to-one relations, with the key on either side.

use tests::{tests, DbTest};

use pretty_assertions::assert_eq;
use trellis::stmt::Value;
use trellis::{
    lens, property, CascadeType, EntityMapping, IdentifierPolicy, OneToOne, Persister,
    RelationTarget,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Country {
    id: Option<i64>,
    name: String,
    capital: Option<City>,
    president: Option<President>,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct City {
    id: Option<i64>,
    name: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct President {
    id: Option<i64>,
    name: String,
    country_id: Option<i64>,
}

fn country_mapping() -> EntityMapping<Country> {
    EntityMapping::new()
        .identifier(property!(Country, id), IdentifierPolicy::after_insert())
        .add(property!(Country, name))
}

fn city_mapping() -> EntityMapping<City> {
    EntityMapping::new()
        .identifier(property!(City, id), IdentifierPolicy::after_insert())
        .add(property!(City, name))
}

fn president_mapping() -> EntityMapping<President> {
    EntityMapping::new()
        .identifier(property!(President, id), IdentifierPolicy::after_insert())
        .add(property!(President, name))
        .add(property!(President, country_id))
}

fn city(name: &str) -> City {
    City {
        id: None,
        name: name.to_string(),
    }
}

fn country(name: &str) -> Country {
    Country {
        name: name.to_string(),
        ..Default::default()
    }
}

fn join_column_on_the_owner(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_one(OneToOne::new(lens!(Country, capital), city_mapping()))
        .build(&mut cx)
        .unwrap();

    assert!(cx.is_registered::<City>());
    let table = cx.schema().table("Country").unwrap();
    assert!(table.column("capitalId").unwrap().nullable);
    assert_eq!(table.foreign_keys[0].name, "FK_Country_capitalId_City_id");

    let mut session = test.session(&cx);
    let mut france = country("France");
    france.capital = Some(city("Paris"));
    countries.insert(&mut session, &mut france).unwrap();

    // The target is inserted first, so its key can be referenced
    assert_eq!(
        test.log().statements(),
        vec![
            "INSERT INTO City {name: 'Paris'}".to_string(),
            "INSERT INTO Country {name: 'France', capitalId: 1}".to_string(),
        ]
    );
    assert_eq!(france.capital.as_ref().unwrap().id, Some(1));

    let loaded = countries
        .select(&mut session, Value::I64(1))
        .unwrap()
        .unwrap();
    assert_eq!(loaded, france);

    countries.delete(&mut session, &loaded).unwrap();
    assert_eq!(test.memory().row_count("Country"), 0);
    assert_eq!(test.memory().row_count("City"), 0);
}

fn shared_target_is_inserted_once(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_one(OneToOne::new(lens!(Country, capital), city_mapping()))
        .build(&mut cx)
        .unwrap();
    let mut session = test.session(&cx);

    let mut first = country("Vatican");
    first.capital = Some(city("Rome"));
    countries.insert(&mut session, &mut first).unwrap();

    let mut second = country("Italy");
    second.capital = first.capital.clone();
    countries.insert(&mut session, &mut second).unwrap();
    assert_eq!(test.memory().row_count("City"), 1);

    let loaded: Vec<_> = [1, 2]
        .into_iter()
        .map(|id| {
            countries
                .select(&mut session, Value::I64(id))
                .unwrap()
                .unwrap()
        })
        .collect();
    assert_eq!(loaded[0].capital, loaded[1].capital);
    assert_eq!(loaded[1].capital.as_ref().unwrap().id, Some(1));
}

fn replacing_the_owned_target(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_one(
            OneToOne::new(lens!(Country, capital), city_mapping()).join_column("capital"),
        )
        .build(&mut cx)
        .unwrap();
    let mut session = test.session(&cx);

    let mut germany = country("Germany");
    germany.capital = Some(city("Bonn"));
    countries.insert(&mut session, &mut germany).unwrap();

    let original = germany.clone();
    germany.capital = Some(city("Berlin"));
    countries
        .update(&mut session, &mut germany, &original, false)
        .unwrap();

    assert_eq!(test.memory().row_count("City"), 2);
    assert_eq!(
        test.memory().rows("Country")[0].get("capital"),
        &Value::I64(2)
    );

    // Changes of the current target cascade
    let original = germany.clone();
    germany.capital.as_mut().unwrap().name = "Berlin-Mitte".into();
    countries
        .update(&mut session, &mut germany, &original, false)
        .unwrap();
    assert_eq!(
        test.memory().rows("City")[1].get("name"),
        &Value::from("Berlin-Mitte")
    );
}

fn mandatory_relation(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_one(OneToOne::new(lens!(Country, capital), city_mapping()).mandatory())
        .build(&mut cx)
        .unwrap();
    assert!(
        !cx.schema()
            .table("Country")
            .unwrap()
            .column("capitalId")
            .unwrap()
            .nullable
    );

    let mut session = test.session(&cx);
    let err = countries
        .insert(&mut session, &mut country("Atlantis"))
        .unwrap_err();
    assert!(err.is_mandatory_relation());
    assert!(err
        .to_string()
        .starts_with("non-null value expected for relation Country::capital on object"));
    assert!(test.log().is_empty());
}

fn limited_cascades(test: &mut DbTest) {
    let mut cx = test.context();
    let cities = city_mapping().build(&mut cx).unwrap();
    let countries = country_mapping()
        .add_one_to_one(
            OneToOne::new(lens!(Country, capital), RelationTarget::Registered)
                .cascading(&[CascadeType::Select]),
        )
        .build(&mut cx)
        .unwrap();
    let mut session = test.session(&cx);

    let mut madrid = city("Madrid");
    cities.insert(&mut session, &mut madrid).unwrap();

    let mut spain = country("Spain");
    spain.capital = Some(madrid.clone());
    countries.insert(&mut session, &mut spain).unwrap();
    assert_eq!(test.memory().row_count("City"), 1);

    let loaded = countries
        .select(&mut session, Value::I64(1))
        .unwrap()
        .unwrap();
    assert_eq!(loaded.capital, Some(madrid));

    // The capital row is still referenced
    let err = cities
        .delete(&mut session, spain.capital.as_ref().unwrap())
        .unwrap_err();
    assert!(err.is_driver());

    // Deletes stop at the owner
    countries.delete(&mut session, &loaded).unwrap();
    assert_eq!(test.memory().row_count("Country"), 0);
    assert_eq!(test.memory().row_count("City"), 1);
}

fn unregistered_target(test: &mut DbTest) {
    let mut cx = test.context();
    let err = country_mapping()
        .add_one_to_one(OneToOne::<Country, City>::new(
            lens!(Country, capital),
            RelationTarget::Registered,
        ))
        .build(&mut cx)
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid mapping: City is not mapped");
}

fn key_on_the_target(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_one(
            OneToOne::new(lens!(Country, president), president_mapping())
                .mapped_by(property!(President, country_id)),
        )
        .build(&mut cx)
        .unwrap();

    let table = cx.schema().table("President").unwrap();
    assert_eq!(
        table.foreign_keys[0].name,
        "FK_President_country_id_Country_id"
    );
    assert!(cx.schema().table("Country").unwrap().column("presidentId").is_none());

    let mut session = test.session(&cx);
    let mut chile = country("Chile");
    chile.president = Some(President {
        name: "Bachelet".into(),
        ..Default::default()
    });
    countries.insert(&mut session, &mut chile).unwrap();

    // The owner goes first; the back reference is filled in
    let president = chile.president.as_ref().unwrap();
    assert_eq!(president.country_id, Some(1));
    assert_eq!(
        test.log().statements()[1],
        "INSERT INTO President {name: 'Bachelet', country_id: 1}"
    );

    let loaded = countries
        .select(&mut session, Value::I64(1))
        .unwrap()
        .unwrap();
    assert_eq!(loaded, chile);

    // A replaced target is unlinked
    let original = chile.clone();
    chile.president = Some(President {
        name: "Boric".into(),
        ..Default::default()
    });
    countries
        .update(&mut session, &mut chile, &original, false)
        .unwrap();
    let rows = test.memory().rows("President");
    assert_eq!(rows[0].get("country_id"), &Value::Null);
    assert_eq!(rows[1].get("country_id"), &Value::I64(1));

    // The target is deleted before its owner
    countries.delete(&mut session, &chile).unwrap();
    assert_eq!(test.memory().row_count("President"), 1);
    assert_eq!(test.memory().row_count("Country"), 0);
}

fn delete_by_id_reaches_the_target(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_one(
            OneToOne::new(lens!(Country, president), president_mapping())
                .mapped_by(property!(President, country_id)),
        )
        .build(&mut cx)
        .unwrap();
    let mut session = test.session(&cx);

    let mut chile = country("Chile");
    chile.president = Some(President {
        name: "Bachelet".into(),
        ..Default::default()
    });
    countries.insert(&mut session, &mut chile).unwrap();

    countries.delete_by_id(&mut session, &chile).unwrap();
    assert_eq!(test.memory().row_count("President"), 0);
    assert_eq!(test.memory().row_count("Country"), 0);
}

fn reverse_column_without_back_reference(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_one(
            OneToOne::new(lens!(Country, capital), city_mapping())
                .reverse_column("capital_of")
                .cascading(&[CascadeType::Insert, CascadeType::Select]),
        )
        .build(&mut cx)
        .unwrap();
    assert!(cx.schema().table("City").unwrap().column("capital_of").is_some());

    let mut session = test.session(&cx);
    let mut peru = country("Peru");
    peru.capital = Some(city("Lima"));
    countries.insert(&mut session, &mut peru).unwrap();
    assert_eq!(
        test.memory().rows("City")[0].get("capital_of"),
        &Value::I64(1)
    );

    let loaded = countries
        .select(&mut session, Value::I64(1))
        .unwrap()
        .unwrap();
    assert_eq!(loaded.capital, peru.capital);

    // Without a delete cascade the target is unlinked, not deleted
    countries.delete(&mut session, &loaded).unwrap();
    assert_eq!(test.memory().row_count("City"), 1);
    assert_eq!(
        test.memory().rows("City")[0].get("capital_of"),
        &Value::Null
    );
}

fn join_and_reverse_columns_conflict(test: &mut DbTest) {
    let mut cx = test.context();
    let err = country_mapping()
        .add_one_to_one(
            OneToOne::new(lens!(Country, capital), city_mapping())
                .join_column("capital")
                .reverse_column("capital_of"),
        )
        .build(&mut cx)
        .unwrap_err();
    assert!(err.is_invalid_mapping());
}

tests!(
    join_column_on_the_owner,
    shared_target_is_inserted_once,
    replacing_the_owned_target,
    mandatory_relation,
    limited_cascades,
    unregistered_target,
    key_on_the_target,
    delete_by_id_reaches_the_target,
    reverse_column_without_back_reference,
    join_and_reverse_columns_conflict,
);
