//! Optimistic locking and transactions.

use tests::{tests, DbTest};

use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use trellis::config::{IntegerVersion, TimestampVersion};
use trellis::stmt::Value;
use trellis::{property, EntityMapping, IdentifierPolicy, Persister};

#[derive(Debug, Default, Clone, PartialEq)]
struct Document {
    id: Option<i64>,
    title: String,
    version: Option<i64>,
}

fn document_mapping() -> EntityMapping<Document> {
    EntityMapping::new()
        .identifier(property!(Document, id), IdentifierPolicy::after_insert())
        .add(property!(Document, title))
        .versioned_by(property!(Document, version), IntegerVersion)
}

fn document(title: &str) -> Document {
    Document {
        title: title.to_string(),
        ..Default::default()
    }
}

fn versions_count_up(test: &mut DbTest) {
    let mut cx = test.context();
    let documents = document_mapping().build(&mut cx).unwrap();
    assert!(
        !cx.schema()
            .table("Document")
            .unwrap()
            .column("version")
            .unwrap()
            .nullable
    );

    let mut session = test.session(&cx);
    let mut doc = document("draft");
    documents.insert(&mut session, &mut doc).unwrap();
    assert_eq!(doc.version, Some(1));

    let original = doc.clone();
    doc.title = "final".into();
    test.log().clear();
    documents
        .update(&mut session, &mut doc, &original, false)
        .unwrap();

    assert_eq!(doc.version, Some(2));
    assert_eq!(
        test.log().statements(),
        vec!["UPDATE Document SET {title: 'final', version: 2} WHERE id = 1 AND version = 1"
            .to_string()]
    );

    // Nothing changed, so the version stays
    let original = doc.clone();
    documents
        .update(&mut session, &mut doc, &original, false)
        .unwrap();
    assert_eq!(doc.version, Some(2));
}

fn concurrent_updates_are_detected(test: &mut DbTest) {
    let mut cx = test.context();
    let documents = document_mapping().build(&mut cx).unwrap();
    let mut session = test.session(&cx);

    let mut doc = document("draft");
    documents.insert(&mut session, &mut doc).unwrap();

    let mut first = documents.select(&mut session, Value::I64(1)).unwrap().unwrap();
    let mut second = first.clone();
    let snapshot = first.clone();

    first.title = "mine".into();
    documents
        .update(&mut session, &mut first, &snapshot, false)
        .unwrap();

    second.title = "theirs".into();
    let err = documents
        .update(&mut session, &mut second, &snapshot, false)
        .unwrap_err();
    assert!(err.is_stale_object());
    assert_eq!(
        err.to_string(),
        "stale object: expected 1 row(s) to be affected in table Document, but 0 were"
    );
    assert_eq!(second.version, Some(1));

    // Deleting with an outdated version fails as well
    let err = documents.delete(&mut session, &second).unwrap_err();
    assert!(err.is_stale_object());
    documents.delete(&mut session, &first).unwrap();
    assert_eq!(test.memory().row_count("Document"), 0);
}

fn rollback_restores_versions(test: &mut DbTest) {
    let mut cx = test.context();
    let documents = document_mapping().build(&mut cx).unwrap();
    let mut session = test.session(&cx);

    let mut doc = document("draft");
    documents.insert(&mut session, &mut doc).unwrap();

    session.begin().unwrap();
    assert!(session.in_transaction());
    let original = doc.clone();
    doc.title = "edited".into();
    documents
        .update(&mut session, &mut doc, &original, false)
        .unwrap();
    assert_eq!(doc.version, Some(2));

    let rolled_back = session.rollback().unwrap();
    assert_eq!(rolled_back.len(), 1);
    assert!(rolled_back.restore(&mut doc));
    assert_eq!(doc.version, Some(1));
    assert_eq!(
        test.memory().rows("Document")[0].get("title"),
        &Value::from("draft")
    );

    // The restored version matches the stored row again
    let original = document("draft");
    documents
        .update(&mut session, &mut doc, &original, false)
        .unwrap();
    assert_eq!(doc.version, Some(2));
}

fn commit_keeps_changes(test: &mut DbTest) {
    let mut cx = test.context();
    let documents = document_mapping().build(&mut cx).unwrap();
    let mut session = test.session(&cx);

    session.begin().unwrap();
    assert!(session.begin().is_err());

    let mut doc = document("draft");
    documents.insert(&mut session, &mut doc).unwrap();
    session.commit().unwrap();

    assert!(!session.in_transaction());
    assert_eq!(test.memory().row_count("Document"), 1);
    assert!(session.commit().is_err());
    assert!(session.rollback().is_err());
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Article {
    id: Option<i64>,
    body: String,
    modified: Option<DateTime<Utc>>,
}

fn timestamp_versions(test: &mut DbTest) {
    let mut cx = test.context();
    let articles = EntityMapping::new()
        .identifier(property!(Article, id), IdentifierPolicy::after_insert())
        .add(property!(Article, body))
        .versioned_by(property!(Article, modified), TimestampVersion)
        .build(&mut cx)
        .unwrap();
    let mut session = test.session(&cx);

    let mut article = Article {
        id: None,
        body: "first".into(),
        modified: None,
    };
    articles.insert(&mut session, &mut article).unwrap();
    let created = article.modified.unwrap();

    let original = article.clone();
    article.body = "second".into();
    articles
        .update(&mut session, &mut article, &original, false)
        .unwrap();
    assert!(article.modified.unwrap() > created);

    let err = articles
        .update(&mut session, &mut original.clone(), &original, true)
        .unwrap_err();
    assert!(err.is_stale_object());
}

fn version_cannot_be_redefined(test: &mut DbTest) {
    #[derive(Debug, Default, Clone)]
    struct Draft {
        document: Document,
        revision: i64,
    }

    let mut cx = test.context();
    let err = EntityMapping::<Draft>::new()
        .map_inheritance(trellis::Inheritance::new(
            trellis::lens!(Draft, document),
            document_mapping(),
        ))
        .versioned_by(property!(Draft, revision), IntegerVersion)
        .build(&mut cx)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid mapping: version of Draft is already defined by its parent"
    );
}

tests!(
    versions_count_up,
    concurrent_updates_are_detected,
    rollback_restores_versions,
    commit_keeps_changes,
    timestamp_versions,
    version_cannot_be_redefined,
);
