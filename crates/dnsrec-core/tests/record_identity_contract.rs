//! Contract Test: Record Identity
//!
//! Verifies that record IDs identify a record set by `(name, type)` only:
//! - Same name with a different type is a different ID
//! - Case and trailing dots never create distinct IDs
//! - IDs survive a trip through their opaque string form and through JSON

use std::collections::HashSet;
use std::time::Duration;

use dnsrec_core::name::{absolute_name, relative_name};
use dnsrec_core::{Record, RecordId, RecordType};

#[test]
fn same_name_different_type_never_collides() {
    let txt = RecordId::new("_acme-challenge.example.com.", RecordType::Txt);
    let cname = RecordId::new("_acme-challenge.example.com.", RecordType::Cname);

    assert_ne!(txt, cname);
    assert!(!txt.matches("_acme-challenge.example.com", &RecordType::Cname));
}

#[test]
fn spelling_of_the_name_does_not_matter() {
    let ids: HashSet<RecordId> = [
        "www.example.com.",
        "www.example.com",
        "WWW.Example.COM.",
    ]
    .into_iter()
    .map(|name| RecordId::new(name, RecordType::A))
    .collect();

    assert_eq!(ids.len(), 1);
}

#[test]
fn opaque_form_parses_back() {
    let id = RecordId::new("*.example.com.", RecordType::Other("HTTPS".to_string()));
    let text = id.to_string();

    assert_eq!(text, "*.example.com:HTTPS");
    assert_eq!(text.parse::<RecordId>().unwrap(), id);
    assert!("no-separator".parse::<RecordId>().is_err());
}

#[test]
fn records_serialize_with_id_and_ttl_seconds() {
    let record = Record::new(RecordType::Txt, "_acme-challenge", "token")
        .with_ttl(Duration::from_secs(120))
        .with_id(RecordId::new("_acme-challenge.example.com", RecordType::Txt));

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "id": "_acme-challenge.example.com:TXT",
            "type": "TXT",
            "name": "_acme-challenge",
            "value": "token",
            "ttl": 120
        })
    );

    let caller_built: Record =
        serde_json::from_value(serde_json::json!({ "type": "a", "name": "www", "value": "192.0.2.1" }))
            .unwrap();
    assert_eq!(caller_built.id, None);
    assert_eq!(caller_built.record_type, RecordType::A);
    assert_eq!(caller_built.ttl, Duration::ZERO);
}

#[test]
fn relative_and_absolute_names_round_trip() {
    for name in ["@", "www", "_acme-challenge.sub", "*"] {
        let fqdn = absolute_name(name, "example.com");
        assert_eq!(relative_name(&fqdn, "example.com."), name);
    }
}
