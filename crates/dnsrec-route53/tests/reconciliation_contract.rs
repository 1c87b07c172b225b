//! Contract Test: Record Reconciliation
//!
//! Verifies how caller records are reconciled against existing record sets:
//! - Append merges into the existing set and never duplicates a value
//! - Set replaces the whole set with the single new value
//! - Delete echoes the exact current set, or does nothing if there is none
//! - Reading expands multi-value sets into one record per value

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use dnsrec_core::traits::{RecordAppender, RecordDeleter, RecordGetter, RecordSetter};
use dnsrec_core::{CancellationToken, ChangeAction, Record, RecordId, RecordType};
use tokio_test::assert_ok;

fn txt(name: &str, value: &str) -> Record {
    Record::new(RecordType::Txt, name, value)
}

#[tokio::test]
async fn acme_challenge_lifecycle() {
    let (backend, zone_id) = backend_with_zone().await;
    seed(&backend, &zone_id, "_acme-challenge.example.com.", RecordType::Txt, &["\"abc\""]).await;
    let provider = provider(Arc::new(backend.clone()));
    let cancel = CancellationToken::new();
    let name = "_acme-challenge.example.com.";

    assert_ok!(provider.append_records(&cancel, ZONE, vec![txt("_acme-challenge", "xyz")]).await);
    assert_eq!(txt_values(&backend, &zone_id, name).await, vec!["abc", "xyz"]);

    assert_ok!(provider.set_records(&cancel, ZONE, vec![txt("_acme-challenge", "new")]).await);
    assert_eq!(txt_values(&backend, &zone_id, name).await, vec!["new"]);

    assert_ok!(provider.delete_records(&cancel, ZONE, vec![txt("_acme-challenge", "new")]).await);
    let records = assert_ok!(provider.get_records(&cancel, ZONE).await);
    assert!(records.iter().all(|r| r.name != "_acme-challenge"));
}

#[tokio::test]
async fn appending_an_existing_value_is_idempotent() {
    let (backend, zone_id) = backend_with_zone().await;
    seed(&backend, &zone_id, "t.example.com.", RecordType::Txt, &["\"a\"", "\"b\"", "\"c\""]).await;
    let provider = provider(Arc::new(backend.clone()));

    let created = assert_ok!(
        provider
            .append_records(&CancellationToken::new(), ZONE, vec![txt("t", "b")])
            .await
    );

    assert_eq!(txt_values(&backend, &zone_id, "t.example.com.").await, vec!["a", "b", "c"]);
    assert_eq!(created[0].id, Some(RecordId::new("t.example.com.", RecordType::Txt)));
}

#[tokio::test]
async fn appending_a_new_value_keeps_prior_values() {
    let (backend, zone_id) = backend_with_zone().await;
    seed(&backend, &zone_id, "t.example.com.", RecordType::Txt, &["\"a\"", "\"b\""]).await;
    let provider = provider(Arc::new(backend.clone()));

    assert_ok!(
        provider
            .append_records(&CancellationToken::new(), ZONE, vec![txt("t", "c"), txt("t", "a")])
            .await
    );

    assert_eq!(txt_values(&backend, &zone_id, "t.example.com.").await, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn setting_replaces_all_values() {
    let (backend, zone_id) = backend_with_zone().await;
    seed(&backend, &zone_id, "www.example.com.", RecordType::A, &["1.1.1.1", "2.2.2.2"]).await;
    let provider = provider(Arc::new(backend.clone()));

    let updated = assert_ok!(
        provider
            .set_records(
                &CancellationToken::new(),
                ZONE,
                vec![Record::new(RecordType::A, "www", "3.3.3.3").with_ttl(Duration::from_secs(60))],
            )
            .await
    );

    let set = backend
        .record_set(&zone_id, "www.example.com.", &RecordType::A)
        .await
        .unwrap();
    assert_eq!(set.resource_records, vec!["3.3.3.3"]);
    assert_eq!(set.ttl, Some(60));
    assert_eq!(updated[0].ttl, Duration::from_secs(60));
}

#[tokio::test]
async fn deleting_a_missing_set_returns_the_input() {
    let (backend, _) = backend_with_zone().await;
    let provider = provider(Arc::new(backend.clone()));
    let record = txt("nothing-here", "x");

    let deleted = assert_ok!(
        provider
            .delete_records(&CancellationToken::new(), ZONE, vec![record.clone()])
            .await
    );

    assert_eq!(deleted, vec![record]);
    assert!(backend.submissions().await.is_empty());
}

#[tokio::test]
async fn deleting_echoes_the_current_values() {
    let (backend, zone_id) = backend_with_zone().await;
    seed(&backend, &zone_id, "www.example.com.", RecordType::A, &["1.2.3.4", "5.6.7.8"]).await;
    let provider = provider(Arc::new(backend.clone()));
    let cancel = CancellationToken::new();

    assert_ok!(
        provider
            .delete_records(&cancel, ZONE, vec![Record::new(RecordType::A, "www", "1.2.3.4")])
            .await
    );

    let submissions = backend.submissions().await;
    assert_eq!(submissions.len(), 1);
    let change = &submissions[0].1.changes[0];
    assert_eq!(change.action, ChangeAction::Delete);
    assert_eq!(change.record_set.resource_records, vec!["1.2.3.4", "5.6.7.8"]);
    assert_eq!(change.record_set.ttl, Some(300));

    let records = assert_ok!(provider.get_records(&cancel, ZONE).await);
    assert!(records.is_empty());
}

#[tokio::test]
async fn delete_by_id_targets_the_identified_set() {
    let (backend, zone_id) = backend_with_zone().await;
    seed(&backend, &zone_id, "a.example.com.", RecordType::Txt, &["\"1\""]).await;
    seed(&backend, &zone_id, "b.example.com.", RecordType::Txt, &["\"2\""]).await;
    let provider = provider(Arc::new(backend.clone()));
    let cancel = CancellationToken::new();

    let listed = assert_ok!(provider.get_records(&cancel, ZONE).await);
    let b = listed.iter().find(|r| r.name == "b").unwrap().clone();

    assert_ok!(provider.delete_records(&cancel, ZONE, vec![b]).await);
    assert_eq!(txt_values(&backend, &zone_id, "a.example.com.").await, vec!["1"]);
    assert!(txt_values(&backend, &zone_id, "b.example.com.").await.is_empty());
}

#[tokio::test]
async fn multi_value_set_lists_as_separate_records() {
    let (backend, zone_id) = backend_with_zone().await;
    seed(&backend, &zone_id, "www.example.com.", RecordType::A, &["1.2.3.4", "5.6.7.8"]).await;
    let provider = provider(Arc::new(backend));

    let records = assert_ok!(provider.get_records(&CancellationToken::new(), ZONE).await);

    assert_eq!(records.len(), 2);
    let values: Vec<_> = records.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(values, ["1.2.3.4", "5.6.7.8"]);
    for record in &records {
        assert_eq!(record.name, "www");
        assert_eq!(record.record_type, RecordType::A);
        assert_eq!(record.ttl, Duration::from_secs(300));
    }
}

#[tokio::test]
async fn listed_records_round_trip_through_set() {
    let (backend, zone_id) = backend_with_zone().await;
    let provider = provider(Arc::new(backend.clone()));
    let cancel = CancellationToken::new();
    let long = "k".repeat(400);

    assert_ok!(provider.set_records(&cancel, ZONE, vec![txt("dkim", &long)]).await);

    let set = backend
        .record_set(&zone_id, "dkim.example.com.", &RecordType::Txt)
        .await
        .unwrap();
    assert!(set.resource_records[0].starts_with('"'));
    assert!(set.resource_records[0].contains("\" \""));

    let records = assert_ok!(provider.get_records(&cancel, ZONE).await);
    assert_eq!(records[0].value, long);
}

#[tokio::test]
async fn appending_without_ttl_keeps_the_set_ttl() {
    let (backend, zone_id) = backend_with_zone().await;
    let name = "_acme-challenge.example.com.";
    assert_ok!(
        backend
            .put_record_set(
                &zone_id,
                dnsrec_route53::api::ResourceRecordSet::new(
                    name,
                    RecordType::Txt,
                    60,
                    vec!["\"abc\"".to_string()],
                ),
            )
            .await
    );
    let provider = provider(Arc::new(backend.clone()));

    let created = assert_ok!(
        provider
            .append_records(&CancellationToken::new(), ZONE, vec![txt("_acme-challenge", "xyz")])
            .await
    );

    let set = backend.record_set(&zone_id, name, &RecordType::Txt).await.unwrap();
    assert_eq!(set.ttl, Some(60));
    assert_eq!(created[0].ttl, Duration::from_secs(60));
    assert_eq!(txt_values(&backend, &zone_id, name).await, vec!["abc", "xyz"]);
}

#[tokio::test]
async fn id_of_another_type_never_crosses_sets() {
    let (backend, zone_id) = backend_with_zone().await;
    seed(&backend, &zone_id, "www.example.com.", RecordType::Txt, &["\"hello\""]).await;
    let provider = provider(Arc::new(backend.clone()));
    let cancel = CancellationToken::new();
    let foreign_id = RecordId::new("www.example.com", RecordType::Txt);

    let record = Record::new(RecordType::A, "www", "1.2.3.4").with_id(foreign_id.clone());
    let created = assert_ok!(provider.append_records(&cancel, ZONE, vec![record.clone()]).await);

    assert_eq!(created[0].id, Some(RecordId::new("www.example.com", RecordType::A)));
    let a = backend.record_set(&zone_id, "www.example.com.", &RecordType::A).await.unwrap();
    assert_eq!(a.resource_records, vec!["1.2.3.4"]);
    assert_eq!(txt_values(&backend, &zone_id, "www.example.com.").await, vec!["hello"]);

    let deleted = assert_ok!(provider.delete_records(&cancel, ZONE, vec![record]).await);
    assert_eq!(deleted[0].id, Some(RecordId::new("www.example.com", RecordType::A)));
    assert!(backend.record_set(&zone_id, "www.example.com.", &RecordType::A).await.is_none());
    assert_eq!(txt_values(&backend, &zone_id, "www.example.com.").await, vec!["hello"]);
}
