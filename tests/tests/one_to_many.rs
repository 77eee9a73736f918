//! One-to-many relations stored through a reverse key or an association
//! table, optionally indexed.

use tests::{tests, DbTest};

use pretty_assertions::assert_eq;
use trellis::stmt::Value;
use trellis::{lens, property, EntityMapping, IdentifierPolicy, OneToMany, Persister};

#[derive(Debug, Default, Clone, PartialEq)]
struct Country {
    id: Option<i64>,
    name: String,
    cities: Vec<City>,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct City {
    id: Option<i64>,
    name: String,
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

fn city(name: &str) -> City {
    City {
        id: None,
        name: name.to_string(),
    }
}

fn country(name: &str, cities: &[&str]) -> Country {
    Country {
        id: None,
        name: name.to_string(),
        cities: cities.iter().map(|name| city(name)).collect(),
    }
}

fn names(country: &Country) -> Vec<&str> {
    country.cities.iter().map(|city| city.name.as_str()).collect()
}

fn indexed_reverse_list(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_many(
            OneToMany::list(lens!(Country, cities), city_mapping())
                .reverse_column("country")
                .indexed(),
        )
        .build(&mut cx)
        .unwrap();

    let table = cx.schema().table("City").unwrap();
    assert!(table.column("country").unwrap().nullable);
    assert!(table.column("idx").is_some());
    assert_eq!(table.foreign_keys[0].target_table, "Country");

    let mut session = test.session(&cx);
    let mut france = country("France", &["Paris", "Lyon", "Nice"]);
    countries.insert(&mut session, &mut france).unwrap();
    assert_eq!(
        test.log().statements()[1],
        "INSERT INTO City {name: 'Paris', country: 1, idx: 0}"
    );
    assert_eq!(france.cities[2].id, Some(3));

    let loaded = countries
        .select(&mut session, Value::I64(1))
        .unwrap()
        .unwrap();
    assert_eq!(loaded, france);

    // Drop Lyon, move Nice to the front, append Lille
    let original = france.clone();
    let lyon = france.cities.remove(1);
    france.cities.swap(0, 1);
    france.cities.push(city("Lille"));
    countries
        .update(&mut session, &mut france, &original, false)
        .unwrap();
    assert_eq!(france.cities[2].id, Some(4));

    let loaded = countries
        .select(&mut session, Value::I64(1))
        .unwrap()
        .unwrap();
    assert_eq!(names(&loaded), vec!["Nice", "Paris", "Lille"]);

    // Without orphan removal the dropped element is only unlinked
    let rows = test.memory().rows("City");
    let row = rows
        .iter()
        .find(|row| row.get("id") == &Value::I64(lyon.id.unwrap()))
        .unwrap();
    assert_eq!(row.get("country"), &Value::Null);
    assert_eq!(row.get("idx"), &Value::Null);

    countries.delete(&mut session, &loaded).unwrap();
    assert_eq!(test.memory().row_count("Country"), 0);
    assert_eq!(test.memory().row_count("City"), 1);
}

fn orphan_removal(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_many(
            OneToMany::set(lens!(Country, cities), city_mapping())
                .reverse_column("country")
                .orphan_removal(),
        )
        .build(&mut cx)
        .unwrap();
    let mut session = test.session(&cx);

    let mut spain = country("Spain", &["Madrid", "Toledo"]);
    countries.insert(&mut session, &mut spain).unwrap();

    let original = spain.clone();
    spain.cities.retain(|city| city.name != "Toledo");
    countries
        .update(&mut session, &mut spain, &original, false)
        .unwrap();

    let rows = test.memory().rows("City");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), &Value::from("Madrid"));
}

fn orphaned_list_elements_are_reindexed(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_many(
            OneToMany::list(lens!(Country, cities), city_mapping())
                .reverse_column("country")
                .indexed()
                .orphan_removal(),
        )
        .build(&mut cx)
        .unwrap();
    let mut session = test.session(&cx);

    let mut belgium = country("Belgium", &["A", "B", "C", "D"]);
    countries.insert(&mut session, &mut belgium).unwrap();

    let original = belgium.clone();
    belgium.cities.remove(1);
    belgium.cities.swap(0, 2);
    assert_eq!(names(&belgium), vec!["D", "C", "A"]);
    countries
        .update(&mut session, &mut belgium, &original, false)
        .unwrap();

    let rows = test.memory().rows("City");
    assert_eq!(rows.len(), 3);
    let index_of = |name: &str| {
        rows.iter()
            .find(|row| row.get("name") == &Value::from(name))
            .map(|row| row.get("idx").clone())
            .unwrap()
    };
    assert_eq!(index_of("D"), Value::I32(0));
    assert_eq!(index_of("C"), Value::I32(1));
    assert_eq!(index_of("A"), Value::I32(2));
    assert!(rows.iter().all(|row| row.get("name") != &Value::from("B")));
}

fn writes_by_identifier_cascade(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_many(
            OneToMany::list(lens!(Country, cities), city_mapping())
                .reverse_column("country")
                .indexed()
                .orphan_removal(),
        )
        .build(&mut cx)
        .unwrap();
    let mut session = test.session(&cx);

    let mut austria = country("Austria", &["Vienna", "Graz"]);
    countries.insert(&mut session, &mut austria).unwrap();

    // New elements are inserted and linked, held ones stay put
    austria.cities.push(city("Linz"));
    countries.update_by_id(&mut session, &mut austria).unwrap();
    assert_eq!(austria.cities[2].id, Some(3));
    let rows = test.memory().rows("City");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].get("country"), &Value::I64(1));
    assert_eq!(rows[2].get("idx"), &Value::I32(2));

    let loaded = countries
        .select(&mut session, Value::I64(1))
        .unwrap()
        .unwrap();
    assert_eq!(names(&loaded), vec!["Vienna", "Graz", "Linz"]);

    // Owned elements go before their owner
    countries.delete_by_id(&mut session, &loaded).unwrap();
    assert_eq!(test.memory().row_count("City"), 0);
    assert_eq!(test.memory().row_count("Country"), 0);
}

fn held_elements_cascade_updates(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_many(
            OneToMany::set(lens!(Country, cities), city_mapping()).reverse_column("country"),
        )
        .build(&mut cx)
        .unwrap();
    let mut session = test.session(&cx);

    let mut italy = country("Italy", &["Rome", "Milan"]);
    countries.insert(&mut session, &mut italy).unwrap();

    let original = italy.clone();
    italy.cities[1].name = "Milano".into();
    test.log().clear();
    countries
        .update(&mut session, &mut italy, &original, false)
        .unwrap();

    assert_eq!(
        test.log().statements(),
        vec!["UPDATE City SET {name: 'Milano'} WHERE id = 2".to_string()]
    );
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Team {
    id: Option<i64>,
    name: String,
    players: Vec<Player>,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Player {
    id: Option<i64>,
    name: String,
    team_id: Option<i64>,
}

fn team_mapping() -> EntityMapping<Team> {
    EntityMapping::new()
        .identifier(property!(Team, id), IdentifierPolicy::after_insert())
        .add(property!(Team, name))
}

fn player(name: &str) -> Player {
    Player {
        name: name.to_string(),
        ..Default::default()
    }
}

fn mapped_by_fills_the_back_reference(test: &mut DbTest) {
    let mut cx = test.context();
    let teams = team_mapping()
        .add_one_to_many(
            OneToMany::set(
                lens!(Team, players),
                EntityMapping::<Player>::new()
                    .identifier(property!(Player, id), IdentifierPolicy::after_insert())
                    .add(property!(Player, name))
                    .add(property!(Player, team_id)),
            )
            .mapped_by(property!(Player, team_id)),
        )
        .build(&mut cx)
        .unwrap();

    let player_columns: Vec<_> = cx
        .schema()
        .table("Player")
        .unwrap()
        .columns
        .iter()
        .map(|column| column.name.as_str())
        .collect();
    assert_eq!(player_columns, vec!["id", "name", "team_id"]);

    let mut session = test.session(&cx);
    let mut team = Team {
        id: None,
        name: "Rovers".into(),
        players: vec![player("Ana"), player("Bo")],
    };
    teams.insert(&mut session, &mut team).unwrap();
    assert!(team.players.iter().all(|p| p.team_id == Some(1)));

    let loaded = teams.select(&mut session, Value::I64(1)).unwrap().unwrap();
    assert_eq!(loaded, team);
}

fn mapped_by_an_unmapped_member(test: &mut DbTest) {
    let mut cx = test.context();
    let err = team_mapping()
        .add_one_to_many(
            OneToMany::set(
                lens!(Team, players),
                EntityMapping::<Player>::new()
                    .identifier(property!(Player, id), IdentifierPolicy::after_insert())
                    .add(property!(Player, name)),
            )
            .mapped_by(property!(Player, team_id)),
        )
        .build(&mut cx)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid mapping: Team::players is mapped by a member that Player does not map"
    );
}

fn association_table(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_many(OneToMany::set(lens!(Country, cities), city_mapping()))
        .build(&mut cx)
        .unwrap();

    let table = cx.schema().table("Country_cities").unwrap();
    let columns: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["Country_id", "cities_id"]);
    assert_eq!(table.primary_key_columns().count(), 2);
    assert!(cx.schema().table("City").unwrap().column("country").is_none());

    let mut session = test.session(&cx);
    let mut peru = country("Peru", &["Lima", "Cusco"]);
    countries.insert(&mut session, &mut peru).unwrap();
    assert_eq!(test.memory().row_count("Country_cities"), 2);

    let loaded = countries
        .select(&mut session, Value::I64(1))
        .unwrap()
        .unwrap();
    assert_eq!(loaded, peru);

    let original = peru.clone();
    peru.cities.remove(0);
    countries
        .update(&mut session, &mut peru, &original, false)
        .unwrap();
    assert_eq!(test.memory().row_count("Country_cities"), 1);
    assert_eq!(test.memory().row_count("City"), 2);

    countries.delete(&mut session, &peru).unwrap();
    assert_eq!(test.memory().row_count("Country_cities"), 0);
    assert_eq!(test.memory().row_count("Country"), 0);
    assert_eq!(test.memory().row_count("City"), 1);
}

fn indexed_association_table(test: &mut DbTest) {
    let mut cx = test.context();
    let countries = country_mapping()
        .add_one_to_many(
            OneToMany::list(lens!(Country, cities), city_mapping())
                .association_table("country_city")
                .indexed_by("position"),
        )
        .build(&mut cx)
        .unwrap();
    let position = cx
        .schema()
        .table("country_city")
        .unwrap()
        .column("position")
        .unwrap();
    assert!(!position.nullable);

    let mut session = test.session(&cx);
    let mut chile = country("Chile", &["Santiago", "Arica", "Punta Arenas"]);
    countries.insert(&mut session, &mut chile).unwrap();

    let original = chile.clone();
    chile.cities.reverse();
    countries
        .update(&mut session, &mut chile, &original, false)
        .unwrap();

    let loaded = countries
        .select(&mut session, Value::I64(1))
        .unwrap()
        .unwrap();
    assert_eq!(
        names(&loaded),
        vec!["Punta Arenas", "Arica", "Santiago"]
    );
}

fn sets_cannot_be_indexed(test: &mut DbTest) {
    let mut cx = test.context();
    let err = country_mapping()
        .add_one_to_many(OneToMany::set(lens!(Country, cities), city_mapping()).indexed())
        .build(&mut cx)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid mapping: Country::cities is a set; only lists can be indexed"
    );
}

fn association_table_and_reverse_column_conflict(test: &mut DbTest) {
    let mut cx = test.context();
    let err = country_mapping()
        .add_one_to_many(
            OneToMany::set(lens!(Country, cities), city_mapping())
                .association_table("links")
                .reverse_column("country"),
        )
        .build(&mut cx)
        .unwrap_err();
    assert!(err.is_invalid_mapping());
    assert!(!cx.is_registered::<City>());
}

tests!(
    indexed_reverse_list,
    orphan_removal,
    orphaned_list_elements_are_reindexed,
    writes_by_identifier_cascade,
    held_elements_cascade_updates,
    mapped_by_fills_the_back_reference,
    mapped_by_an_unmapped_member,
    association_table,
    indexed_association_table,
    sets_cannot_be_indexed,
    association_table_and_reverse_column_conflict,
);
