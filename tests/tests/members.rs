//! Members reached through accessors, enums, and nested properties.

use tests::{tests, DbTest};

use pretty_assertions::assert_eq;
use trellis::member::{Accessor, Mutator, Property};
use trellis::stmt::{Type, Value};
use trellis::{
    lens, property, EntityMapping, EnumEncoding, IdentifierPolicy, MappedEnum, Persister,
};

#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum Status {
    #[default]
    Open,
    Closed,
}

impl MappedEnum for Status {
    const VARIANTS: &'static [Self] = &[Status::Open, Status::Closed];

    fn name(&self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::Closed => "CLOSED",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Issue {
    id: Option<i64>,
    title: String,
    status: Status,
    priority: Status,
}

impl Issue {
    fn get_title(&self) -> String {
        self.title.clone()
    }

    fn set_title(&mut self, title: String) {
        self.title = title;
    }
}

fn title() -> Property<Issue, String> {
    Property::new(
        Accessor::method("getTitle", |issue: &Issue| issue.get_title()),
        Mutator::method("setTitle", |issue: &mut Issue, title| issue.set_title(title)),
    )
    .unwrap()
}

fn enums_and_methods(test: &mut DbTest) {
    let mut cx = test.context();
    let issues = EntityMapping::new()
        .identifier(property!(Issue, id), IdentifierPolicy::after_insert())
        .add(title())
        .add_enum(property!(Issue, status), EnumEncoding::ByName)
        .add_enum(property!(Issue, priority), EnumEncoding::ByOrdinal)
        .build(&mut cx)
        .unwrap();

    let table = cx.schema().table("Issue").unwrap();
    assert_eq!(table.column("title").unwrap().ty, Type::String);
    assert_eq!(table.column("status").unwrap().ty, Type::String);
    assert_eq!(table.column("priority").unwrap().ty, Type::I32);

    let mut session = test.session(&cx);
    let mut issue = Issue {
        id: None,
        title: "crash on start".into(),
        status: Status::Closed,
        priority: Status::Closed,
    };
    issues.insert(&mut session, &mut issue).unwrap();

    let row = &test.memory().rows("Issue")[0];
    assert_eq!(row.get("status"), &Value::from("CLOSED"));
    assert_eq!(row.get("priority"), &Value::I32(1));

    let loaded = issues.select(&mut session, Value::I64(1)).unwrap().unwrap();
    assert_eq!(loaded, issue);
}

fn getter_and_field_designate_one_member(test: &mut DbTest) {
    let mut cx = test.context();
    let err = EntityMapping::<Issue>::new()
        .identifier(property!(Issue, id), IdentifierPolicy::after_insert())
        .add(title())
        .add_as(property!(Issue, title), "heading")
        .build(&mut cx)
        .unwrap_err();
    assert!(err.to_string().contains("is already mapped"), "{err}");
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Address {
    city: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Customer {
    id: Option<i64>,
    address: Address,
}

fn nested_property(test: &mut DbTest) {
    let mut cx = test.context();
    let city = lens!(Customer, address)
        .property()
        .through(property!(Address, city));
    let customers = EntityMapping::new()
        .identifier(property!(Customer, id), IdentifierPolicy::after_insert())
        .add(city)
        .build(&mut cx)
        .unwrap();
    assert!(cx.schema().table("Customer").unwrap().column("city").is_some());

    let mut session = test.session(&cx);
    let mut customer = Customer {
        id: None,
        address: Address {
            city: "Quito".into(),
        },
    };
    customers.insert(&mut session, &mut customer).unwrap();

    let loaded = customers.select(&mut session, Value::I64(1)).unwrap().unwrap();
    assert_eq!(loaded.address.city, "Quito");
}

tests!(
    enums_and_methods,
    getter_and_field_designate_one_member,
    nested_property,
);
