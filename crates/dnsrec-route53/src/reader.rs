//! Record reading
//!
//! Lists every record set of a zone and expands each into one [`Record`] per
//! value.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use dnsrec_core::name::relative_name;
use dnsrec_core::{Record, RecordId, Result, cancel};

use crate::api::{ResourceRecordSet, Route53Api, lookup_error};
use crate::wire;
use crate::zone::ResolvedZone;

/// All record sets of a zone, in provider order
pub async fn list_record_sets(
    client: &dyn Route53Api,
    cancel: &CancellationToken,
    zone: &ResolvedZone,
) -> Result<Vec<ResourceRecordSet>> {
    let mut sets = Vec::new();
    let mut start = None;

    loop {
        let page = cancel::cancellable(cancel, async {
            client
                .list_resource_record_sets(&zone.id, start.as_ref())
                .await
                .map_err(lookup_error)
        })
        .await?;

        sets.extend(page.record_sets);
        match page.next {
            Some(next) => start = Some(next),
            None => break,
        }
    }

    tracing::debug!(zone = %zone.name, record_sets = sets.len(), "listed record sets");
    Ok(sets)
}

/// Expand a record set into records with names relative to `zone`
///
/// Alias sets carry no values and yield nothing.
pub fn expand(zone: &ResolvedZone, set: &ResourceRecordSet) -> Vec<Record> {
    if set.is_alias() {
        return Vec::new();
    }

    let fqdn = wire::decode_name(&set.name);
    let id = RecordId::new(&fqdn, set.record_type.clone());
    let name = relative_name(&fqdn, &zone.name);
    let ttl = Duration::from_secs(set.ttl.unwrap_or_default());

    set.resource_records
        .iter()
        .map(|value| {
            Record::new(
                set.record_type.clone(),
                name.clone(),
                wire::decode_value(&set.record_type, value),
            )
            .with_ttl(ttl)
            .with_id(id.clone())
        })
        .collect()
}

/// All records of a zone
pub async fn list_records(
    client: &dyn Route53Api,
    cancel: &CancellationToken,
    zone: &ResolvedZone,
) -> Result<Vec<Record>> {
    let sets = list_record_sets(client, cancel, zone).await?;
    Ok(sets.iter().flat_map(|set| expand(zone, set)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryRoute53, MemoryOptions};
    use dnsrec_core::RecordType;

    fn zone(id: String) -> ResolvedZone {
        ResolvedZone {
            id,
            name: "example.com.".to_string(),
        }
    }

    #[tokio::test]
    async fn multi_value_sets_expand_to_one_record_per_value() {
        let backend = InMemoryRoute53::new();
        let zone = zone(backend.add_zone("example.com", false).await);
        backend
            .put_record_set(
                &zone.id,
                ResourceRecordSet::new(
                    "www.example.com.",
                    RecordType::A,
                    600,
                    vec!["1.2.3.4".into(), "5.6.7.8".into()],
                ),
            )
            .await
            .unwrap();

        let records = list_records(&backend, &CancellationToken::new(), &zone).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.name == "www"
            && r.record_type == RecordType::A
            && r.ttl == Duration::from_secs(600)));
        assert_eq!(records[0].value, "1.2.3.4");
        assert_eq!(records[1].value, "5.6.7.8");
        assert_eq!(
            records[0].id,
            Some(RecordId::new("www.example.com", RecordType::A))
        );
    }

    #[test]
    fn expand_translates_wire_forms() {
        let zone = zone("Z1".to_string());

        let apex = ResourceRecordSet::new(
            "example.com.",
            RecordType::Txt,
            300,
            vec!["\"v=spf1 \" \"-all\"".into()],
        );
        let records = expand(&zone, &apex);
        assert_eq!(records[0].name, "@");
        assert_eq!(records[0].value, "v=spf1 -all");

        let wildcard =
            ResourceRecordSet::new("\\052.example.com.", RecordType::Cname, 300, vec!["a.example.com.".into()]);
        let records = expand(&zone, &wildcard);
        assert_eq!(records[0].name, "*");
        assert_eq!(records[0].value, "a.example.com.");
    }

    #[test]
    fn alias_sets_are_skipped() {
        let mut alias = ResourceRecordSet::new("cdn.example.com.", RecordType::A, 0, Vec::new());
        alias.ttl = None;
        alias.alias_target = Some("d111.cloudfront.net.".to_string());
        assert!(expand(&zone("Z1".to_string()), &alias).is_empty());
    }

    #[tokio::test]
    async fn listing_follows_pagination() {
        let backend = InMemoryRoute53::with_options(MemoryOptions {
            page_size: 2,
            ..MemoryOptions::default()
        });
        let zone = zone(backend.add_zone("example.com", false).await);
        for name in ["a", "b", "c", "d", "e"] {
            backend
                .put_record_set(
                    &zone.id,
                    ResourceRecordSet::new(
                        format!("{name}.example.com."),
                        RecordType::A,
                        300,
                        vec!["10.0.0.1".into()],
                    ),
                )
                .await
                .unwrap();
        }

        let sets = list_record_sets(&backend, &CancellationToken::new(), &zone).await.unwrap();
        assert_eq!(sets.len(), 5);
        assert_eq!(backend.calls().await.list_resource_record_sets, 3);
    }
}
