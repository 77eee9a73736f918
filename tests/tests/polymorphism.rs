//! Polymorphic entities whose rows hold one of several subtypes.

use tests::{tests, DbTest};

use pretty_assertions::assert_eq;
use trellis::stmt::Value;
use trellis::{
    property, EntityMapping, IdentifierPolicy, Persister, PolymorphismPolicy, SubEntity,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Vehicle {
    id: Option<i64>,
    name: String,
    kind: VehicleKind,
}

#[derive(Debug, Default, Clone, PartialEq)]
enum VehicleKind {
    #[default]
    Unknown,
    Car(Car),
    Truck(Truck),
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Car {
    doors: i32,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Truck {
    payload: i64,
    body: TruckBody,
}

#[derive(Debug, Default, Clone, PartialEq)]
enum TruckBody {
    #[default]
    Plain,
    Tanker(Tanker),
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Tanker {
    volume: i64,
}

fn as_car(vehicle: &Vehicle) -> Option<&Car> {
    match &vehicle.kind {
        VehicleKind::Car(car) => Some(car),
        _ => None,
    }
}

fn as_car_mut(vehicle: &mut Vehicle) -> Option<&mut Car> {
    match &mut vehicle.kind {
        VehicleKind::Car(car) => Some(car),
        _ => None,
    }
}

fn as_truck(vehicle: &Vehicle) -> Option<&Truck> {
    match &vehicle.kind {
        VehicleKind::Truck(truck) => Some(truck),
        _ => None,
    }
}

fn as_truck_mut(vehicle: &mut Vehicle) -> Option<&mut Truck> {
    match &mut vehicle.kind {
        VehicleKind::Truck(truck) => Some(truck),
        _ => None,
    }
}

fn as_tanker(truck: &Truck) -> Option<&Tanker> {
    match &truck.body {
        TruckBody::Tanker(tanker) => Some(tanker),
        TruckBody::Plain => None,
    }
}

fn as_tanker_mut(truck: &mut Truck) -> Option<&mut Tanker> {
    match &mut truck.body {
        TruckBody::Tanker(tanker) => Some(tanker),
        TruckBody::Plain => None,
    }
}

fn car_entity() -> SubEntity<Vehicle, Car> {
    SubEntity::new(as_car, as_car_mut, |car| Vehicle {
        kind: VehicleKind::Car(car),
        ..Default::default()
    })
    .add(property!(Car, doors))
}

fn truck_entity() -> SubEntity<Vehicle, Truck> {
    SubEntity::new(as_truck, as_truck_mut, |truck| Vehicle {
        kind: VehicleKind::Truck(truck),
        ..Default::default()
    })
    .add(property!(Truck, payload))
}

fn tanker_entity() -> SubEntity<Truck, Tanker> {
    SubEntity::new(as_tanker, as_tanker_mut, |tanker| Truck {
        body: TruckBody::Tanker(tanker),
        ..Default::default()
    })
    .add(property!(Tanker, volume))
}

fn vehicle_mapping(policy: PolymorphismPolicy<Vehicle>) -> EntityMapping<Vehicle> {
    EntityMapping::new()
        .identifier(property!(Vehicle, id), IdentifierPolicy::after_insert())
        .add(property!(Vehicle, name))
        .map_polymorphism(policy)
}

fn car(name: &str, doors: i32) -> Vehicle {
    Vehicle {
        id: None,
        name: name.to_string(),
        kind: VehicleKind::Car(Car { doors }),
    }
}

fn truck(name: &str, payload: i64) -> Vehicle {
    Vehicle {
        id: None,
        name: name.to_string(),
        kind: VehicleKind::Truck(Truck {
            payload,
            body: TruckBody::Plain,
        }),
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

fn single_table(test: &mut DbTest) {
    let mut cx = test.context();
    let vehicles = vehicle_mapping(
        PolymorphismPolicy::single_table()
            .add_sub_class(car_entity())
            .add_sub_class(truck_entity()),
    )
    .build(&mut cx)
    .unwrap();

    assert_eq!(
        columns(&cx, "Vehicle"),
        vec!["id", "name", "doors", "DTYPE", "payload"]
    );
    let table = cx.schema().table("Vehicle").unwrap();
    assert!(table.column("doors").unwrap().nullable);
    assert!(!table.column("DTYPE").unwrap().nullable);
    assert_eq!(vehicles.variants().len(), 2);

    let mut session = test.session(&cx);
    let mut mini = car("mini", 3);
    let mut actros = truck("actros", 18);
    vehicles.insert(&mut session, &mut mini).unwrap();
    vehicles.insert(&mut session, &mut actros).unwrap();

    let rows = test.memory().rows("Vehicle");
    assert_eq!(rows[0].get("DTYPE"), &Value::from("Car"));
    assert_eq!(rows[0].get("payload"), &Value::Null);
    assert_eq!(rows[1].get("DTYPE"), &Value::from("Truck"));
    assert_eq!(rows[1].get("doors"), &Value::Null);

    let loaded = vehicles.select(&mut session, Value::I64(2)).unwrap().unwrap();
    assert_eq!(loaded, actros);
    let loaded = vehicles.select(&mut session, Value::I64(1)).unwrap().unwrap();
    assert_eq!(loaded, mini);
}

fn explicit_discriminators(test: &mut DbTest) {
    let mut cx = test.context();
    let vehicles = vehicle_mapping(
        PolymorphismPolicy::single_table()
            .discriminator_column("kind")
            .add_sub_class(car_entity().discriminator("C"))
            .add_sub_class(truck_entity().discriminator("T")),
    )
    .build(&mut cx)
    .unwrap();
    let mut session = test.session(&cx);

    let mut mini = car("mini", 3);
    vehicles.insert(&mut session, &mut mini).unwrap();
    assert_eq!(
        test.memory().rows("Vehicle")[0].get("kind"),
        &Value::from("C")
    );
}

fn duplicate_discriminators(test: &mut DbTest) {
    let mut cx = test.context();
    let err = vehicle_mapping(
        PolymorphismPolicy::single_table()
            .add_sub_class(car_entity().discriminator("V"))
            .add_sub_class(truck_entity().discriminator("V")),
    )
    .build(&mut cx)
    .unwrap_err();
    assert!(err.is_invalid_mapping());
}

fn joined_tables(test: &mut DbTest) {
    let mut cx = test.context();
    let vehicles = vehicle_mapping(
        PolymorphismPolicy::joined_tables()
            .add_sub_class(car_entity())
            .add_sub_class(truck_entity()),
    )
    .build(&mut cx)
    .unwrap();

    assert_eq!(columns(&cx, "Vehicle"), vec!["id", "name"]);
    assert_eq!(columns(&cx, "Car"), vec!["id", "doors"]);
    assert_eq!(columns(&cx, "Truck"), vec!["id", "payload"]);
    assert!(!cx.schema().table("Car").unwrap().column("doors").unwrap().nullable);

    let mut session = test.session(&cx);
    let mut mini = car("mini", 3);
    let mut actros = truck("actros", 18);
    vehicles.insert(&mut session, &mut mini).unwrap();
    vehicles.insert(&mut session, &mut actros).unwrap();
    assert_eq!(test.memory().row_count("Vehicle"), 2);
    assert_eq!(test.memory().row_count("Car"), 1);
    assert_eq!(test.memory().row_count("Truck"), 1);

    let loaded = vehicles.select(&mut session, Value::I64(2)).unwrap().unwrap();
    assert_eq!(loaded, actros);

    let original = actros.clone();
    if let VehicleKind::Truck(truck) = &mut actros.kind {
        truck.payload = 20;
    }
    vehicles
        .update(&mut session, &mut actros, &original, false)
        .unwrap();
    assert_eq!(test.memory().rows("Truck")[0].get("payload"), &Value::I64(20));

    vehicles.delete(&mut session, &mini).unwrap();
    assert_eq!(test.memory().row_count("Car"), 0);
    assert_eq!(test.memory().row_count("Vehicle"), 1);
}

fn single_table_nested_in_joined_tables(test: &mut DbTest) {
    let mut cx = test.context();
    let vehicles = vehicle_mapping(
        PolymorphismPolicy::joined_tables()
            .add_sub_class(car_entity())
            .add_sub_class(truck_entity().map_polymorphism(
                PolymorphismPolicy::single_table().add_sub_class(tanker_entity()),
            )),
    )
    .build(&mut cx)
    .unwrap();

    // Only leaf subtypes are instantiated
    let names: Vec<_> = vehicles
        .variants()
        .iter()
        .map(|variant| variant.entity().simple_name())
        .collect();
    assert_eq!(names, vec!["Car", "Tanker"]);
    assert_eq!(
        columns(&cx, "Truck"),
        vec!["id", "payload", "volume", "DTYPE"]
    );

    let mut session = test.session(&cx);
    let mut tanker = Vehicle {
        id: None,
        name: "tanker".into(),
        kind: VehicleKind::Truck(Truck {
            payload: 30,
            body: TruckBody::Tanker(Tanker { volume: 9000 }),
        }),
    };
    vehicles.insert(&mut session, &mut tanker).unwrap();
    assert_eq!(
        test.memory().rows("Truck")[0].get("DTYPE"),
        &Value::from("Tanker")
    );

    let loaded = vehicles.select(&mut session, Value::I64(1)).unwrap().unwrap();
    assert_eq!(loaded, tanker);

    // A plain truck is not a mapped subtype
    let err = vehicles
        .insert(&mut session, &mut truck("plain", 1))
        .unwrap_err();
    assert!(err.to_string().contains("not an instance of any mapped subtype"));
}

fn joined_tables_cannot_nest_in_single_table(test: &mut DbTest) {
    let mut cx = test.context();
    let err = vehicle_mapping(
        PolymorphismPolicy::single_table().add_sub_class(truck_entity().map_polymorphism(
            PolymorphismPolicy::joined_tables().add_sub_class(tanker_entity()),
        )),
    )
    .build(&mut cx)
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "unsupported feature: nesting joined-tables polymorphism inside single-table polymorphism is not supported"
    );
}

fn table_per_class_is_not_implemented(test: &mut DbTest) {
    let mut cx = test.context();
    let err = vehicle_mapping(PolymorphismPolicy::table_per_class().add_sub_class(car_entity()))
        .build(&mut cx)
        .unwrap_err();
    assert!(err.is_unsupported_feature());
    assert!(!cx.is_registered::<Vehicle>());
}

fn polymorphism_needs_a_subclass(test: &mut DbTest) {
    let mut cx = test.context();
    let err = vehicle_mapping(PolymorphismPolicy::joined_tables())
        .build(&mut cx)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid mapping: no subclass is mapped for polymorphic Vehicle"
    );
}

fn subtype_cannot_change_on_update(test: &mut DbTest) {
    let mut cx = test.context();
    let vehicles = vehicle_mapping(
        PolymorphismPolicy::single_table()
            .add_sub_class(car_entity())
            .add_sub_class(truck_entity()),
    )
    .build(&mut cx)
    .unwrap();
    let mut session = test.session(&cx);

    let mut mini = car("mini", 3);
    vehicles.insert(&mut session, &mut mini).unwrap();

    let mut changed = truck("mini", 2);
    changed.id = mini.id;
    let err = vehicles
        .update(&mut session, &mut changed, &mini, false)
        .unwrap_err();
    assert!(err.is_unsupported_feature());
}

tests!(
    single_table,
    explicit_discriminators,
    duplicate_discriminators,
    joined_tables,
    single_table_nested_in_joined_tables,
    joined_tables_cannot_nest_in_single_table,
    table_per_class_is_not_implemented,
    polymorphism_needs_a_subclass,
    subtype_cannot_change_on_update,
);
