//! Record locating
//!
//! Finds the record set a caller's record refers to. An ID, when present
//! and of the record's own type, is tried first; otherwise (or when the ID
//! matches nothing) the record's name and type are used. Values are never part of the key because updates
//! and deletes act on the whole set.

use tokio_util::sync::CancellationToken;

use dnsrec_core::name::{absolute_name, names_equal};
use dnsrec_core::{Record, Result};

use crate::api::{ResourceRecordSet, Route53Api};
use crate::reader::list_record_sets;
use crate::wire;
use crate::zone::ResolvedZone;

/// Pick the record set `record` refers to from `sets`
///
/// The first matching set wins if the provider ever returns duplicates.
pub fn locate<'a>(
    sets: &'a [ResourceRecordSet],
    zone: &ResolvedZone,
    record: &Record,
) -> Option<&'a ResourceRecordSet> {
    let identity_of = |set: &ResourceRecordSet| (wire::decode_name(&set.name), set.record_type.clone());

    // An ID of another type never selects the set, so values of one type
    // cannot leak into a set of another.
    if let Some(id) = &record.id
        && *id.record_type() == record.record_type
        && let Some(set) = sets.iter().find(|set| {
            let (name, record_type) = identity_of(set);
            id.matches(&name, &record_type)
        })
    {
        return Some(set);
    }

    let fqdn = absolute_name(&record.name, &zone.name);
    sets.iter().find(|set| {
        let (name, record_type) = identity_of(set);
        record_type == record.record_type && names_equal(&name, &fqdn)
    })
}

/// Fetch the zone's record sets and locate the one `record` refers to
pub async fn find_record_set(
    client: &dyn Route53Api,
    cancel: &CancellationToken,
    zone: &ResolvedZone,
    record: &Record,
) -> Result<Option<ResourceRecordSet>> {
    let sets = list_record_sets(client, cancel, zone).await?;
    let found = locate(&sets, zone, record).cloned();
    tracing::debug!(
        name = %record.name,
        record_type = %record.record_type,
        found = found.is_some(),
        "located record set"
    );
    Ok(found)
}
