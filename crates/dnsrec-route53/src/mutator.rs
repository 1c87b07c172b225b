//! Record mutation
//!
//! Every mutation is a single-change batch, so a failure affects one record
//! at a time:
//!
//! | Operation | Existing set | Submitted change |
//! |-----------|--------------|------------------|
//! | create    | any          | UPSERT of existing values plus the new one |
//! | update    | any          | UPSERT of the new value only |
//! | delete    | found        | DELETE echoing the current set |
//! | delete    | missing      | nothing |

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use dnsrec_core::config::PropagationConfig;
use dnsrec_core::name::absolute_name;
use dnsrec_core::{AdapterEvent, ChangeAction, EventSink, Record, RecordId, Result, RetryPolicy, cancel};

use crate::api::{ChangeBatch, ChangeInfo, ResourceRecordSet, Route53Api, submission_error};
use crate::locator::find_record_set;
use crate::propagation::wait_for_change;
use crate::wire;
use crate::zone::ResolvedZone;

/// TTL used when a record carries none
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Applies record changes to one resolved zone
pub struct Mutator<'a> {
    pub(crate) client: &'a dyn Route53Api,
    pub(crate) cancel: &'a CancellationToken,
    pub(crate) zone: &'a ResolvedZone,
    pub(crate) retry: &'a RetryPolicy,
    pub(crate) propagation: &'a PropagationConfig,
    pub(crate) events: &'a EventSink,
}

impl Mutator<'_> {
    /// Add `record`'s value to its record set, creating the set if needed
    ///
    /// Appending a value that is already present changes nothing. A record
    /// without a TTL keeps the TTL of the set it joins.
    pub async fn create(&self, record: &Record) -> Result<Record> {
        let existing = find_record_set(self.client, self.cancel, self.zone, record).await?;
        let value = wire::encode_value(&record.record_type, &record.value);

        let (fqdn, mut values, current_ttl) = match existing {
            Some(set) => (wire::decode_name(&set.name), set.resource_records, set.ttl),
            None => (absolute_name(&record.name, &self.zone.name), Vec::new(), None),
        };
        let present = values.iter().any(|v| {
            wire::decode_value(&record.record_type, v) == wire::decode_value(&record.record_type, &value)
        });
        if !present {
            values.push(value);
        }

        let ttl = match current_ttl {
            Some(secs) if record.ttl.is_zero() => Duration::from_secs(secs),
            _ => record.ttl,
        };
        self.upsert(record, fqdn, values, ttl).await
    }

    /// Replace the whole record set with `record`'s value
    pub async fn update(&self, record: &Record) -> Result<Record> {
        let existing = find_record_set(self.client, self.cancel, self.zone, record).await?;
        let fqdn = match existing {
            Some(set) => wire::decode_name(&set.name),
            None => absolute_name(&record.name, &self.zone.name),
        };
        let values = vec![wire::encode_value(&record.record_type, &record.value)];

        self.upsert(record, fqdn, values, record.ttl).await
    }

    /// Delete the record set `record` refers to
    ///
    /// A missing set is not an error; the record is returned unchanged.
    pub async fn delete(&self, record: &Record) -> Result<Record> {
        let Some(set) = find_record_set(self.client, self.cancel, self.zone, record).await? else {
            info!(
                name = %record.name,
                record_type = %record.record_type,
                "no record set to delete"
            );
            self.events.emit(AdapterEvent::DeleteSkipped {
                name: record.name.clone(),
                record_type: record.record_type.clone(),
            });
            return Ok(record.clone());
        };

        let id = RecordId::new(&wire::decode_name(&set.name), set.record_type.clone());
        self.submit(ChangeAction::Delete, set).await?;

        Ok(Record {
            id: Some(id),
            ..record.clone()
        })
    }

    async fn upsert(
        &self,
        record: &Record,
        fqdn: String,
        values: Vec<String>,
        ttl: Duration,
    ) -> Result<Record> {
        let ttl = if ttl.is_zero() { DEFAULT_TTL } else { ttl };
        let id = RecordId::new(&fqdn, record.record_type.clone());
        let set = ResourceRecordSet::new(fqdn, record.record_type.clone(), ttl.as_secs(), values);

        self.submit(ChangeAction::Upsert, set).await?;

        Ok(Record {
            id: Some(id),
            ttl,
            ..record.clone()
        })
    }

    /// Submit a single-change batch, retrying transient failures, then wait
    /// for propagation when enabled
    async fn submit(&self, action: ChangeAction, set: ResourceRecordSet) -> Result<ChangeInfo> {
        let name = set.name.clone();
        let record_type = set.record_type.clone();
        let values = set.resource_records.len();
        let batch = ChangeBatch::single(action, set);

        let client = self.client;
        let zone_id = self.zone.id.as_str();
        let cancel = self.cancel;
        let events = self.events;

        let change = self
            .retry
            .run_observed(
                cancel,
                "change_resource_record_sets",
                |attempt, err| {
                    events.emit(AdapterEvent::SubmissionRetried {
                        attempt,
                        error: err.to_string(),
                    })
                },
                |_attempt| {
                    let batch = batch.clone();
                    async move {
                        cancel::cancellable(cancel, async {
                            client
                                .change_resource_record_sets(zone_id, batch)
                                .await
                                .map_err(submission_error)
                        })
                        .await
                    }
                },
            )
            .await?;

        info!(
            zone_id = %zone_id,
            change_id = %change.id,
            action = %action,
            name = %name,
            record_type = %record_type,
            values,
            "change submitted"
        );
        self.events.emit(AdapterEvent::ChangeSubmitted {
            zone_id: zone_id.to_string(),
            change_id: change.id.clone(),
            action,
            name,
            record_type,
            values,
        });

        if self.propagation.enabled {
            wait_for_change(self.client, self.cancel, self.propagation, self.events, &change).await?;
        }
        Ok(change)
    }
}
