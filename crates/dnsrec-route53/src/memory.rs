// # In-Memory Route 53
//
// In-memory implementation of the Route53Api client capability.
//
// ## Purpose
//
// Behaves like the parts of Route 53 the adapter relies on, without any
// network or credentials:
// - Hosted zones (public and private), listed page by page
// - Record sets listed page by page, in insertion order
// - Atomic change batches with CREATE / UPSERT / DELETE semantics
// - Change IDs that move from PENDING to INSYNC after a number of polls
//
// ## When to Use
//
// - Tests of code built on the adapter
// - Demos and dry runs
//
// Failures can be injected for the next submissions or listings, and every
// accepted batch is kept in a log for assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use dnsrec_core::name::{names_equal, zone_fqdn};
use dnsrec_core::{ChangeAction, RecordType};

use crate::api::{
    ApiError, ChangeBatch, ChangeInfo, ChangeStatus, HostedZone, HostedZonePage, RecordSetCursor,
    RecordSetPage, ResourceRecordSet, Route53Api,
};
use crate::wire;

/// Behavior knobs for [`InMemoryRoute53`]
#[derive(Debug, Clone)]
pub struct MemoryOptions {
    /// Maximum items per listing page
    pub page_size: usize,
    /// Number of status polls after which a change is INSYNC
    ///
    /// `Some(0)` reports INSYNC right away, `None` never does.
    pub sync_after_polls: Option<usize>,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            sync_after_polls: Some(1),
        }
    }
}

/// Number of calls made per API operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_hosted_zones: usize,
    pub list_resource_record_sets: usize,
    pub change_resource_record_sets: usize,
    pub get_change: usize,
}

#[derive(Debug)]
struct ZoneEntry {
    zone: HostedZone,
    record_sets: Vec<ResourceRecordSet>,
}

#[derive(Debug)]
struct TrackedChange {
    info: ChangeInfo,
    polls_left: Option<usize>,
}

#[derive(Debug, Default)]
struct State {
    zones: Vec<ZoneEntry>,
    changes: HashMap<String, TrackedChange>,
    next_zone: u64,
    next_change: u64,
    listing_failures: VecDeque<ApiError>,
    change_failures: VecDeque<ApiError>,
    submissions: Vec<(String, ChangeBatch)>,
    calls: CallCounts,
}

impl State {
    fn zone_mut(&mut self, zone_id: &str) -> Result<&mut ZoneEntry, ApiError> {
        self.zones
            .iter_mut()
            .find(|entry| entry.zone.id == zone_id)
            .ok_or_else(|| ApiError::NoSuchHostedZone(zone_id.to_string()))
    }

    fn zone(&self, zone_id: &str) -> Result<&ZoneEntry, ApiError> {
        self.zones
            .iter()
            .find(|entry| entry.zone.id == zone_id)
            .ok_or_else(|| ApiError::NoSuchHostedZone(zone_id.to_string()))
    }
}

/// In-memory Route 53 backend
///
/// Cloning shares the underlying state.
///
/// # Example
///
/// ```rust,no_run
/// use dnsrec_core::RecordType;
/// use dnsrec_route53::api::ResourceRecordSet;
/// use dnsrec_route53::memory::InMemoryRoute53;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryRoute53::new();
///     let zone_id = backend.add_zone("example.com.", false).await;
///
///     backend
///         .put_record_set(
///             &zone_id,
///             ResourceRecordSet::new("www.example.com.", RecordType::A, 300, vec!["1.2.3.4".into()]),
///         )
///         .await?;
///
///     assert_eq!(backend.record_sets(&zone_id).await.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryRoute53 {
    inner: Arc<RwLock<State>>,
    options: MemoryOptions,
}

impl Default for InMemoryRoute53 {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoute53 {
    /// Create an empty backend with default options
    pub fn new() -> Self {
        Self::with_options(MemoryOptions::default())
    }

    /// Create an empty backend
    pub fn with_options(options: MemoryOptions) -> Self {
        Self {
            inner: Arc::new(RwLock::new(State::default())),
            options: MemoryOptions {
                page_size: options.page_size.max(1),
                ..options
            },
        }
    }

    /// Add a hosted zone and return its ID
    pub async fn add_zone(&self, name: &str, private_zone: bool) -> String {
        let mut state = self.inner.write().await;
        state.next_zone += 1;
        let id = format!("/hostedzone/ZMEM{:06}", state.next_zone);
        state.zones.push(ZoneEntry {
            zone: HostedZone {
                id: id.clone(),
                name: zone_fqdn(name),
                private_zone,
            },
            record_sets: Vec::new(),
        });
        id
    }

    /// Insert or replace a record set directly, bypassing change tracking
    pub async fn put_record_set(
        &self,
        zone_id: &str,
        record_set: ResourceRecordSet,
    ) -> Result<(), ApiError> {
        let mut state = self.inner.write().await;
        let entry = state.zone_mut(zone_id)?;
        upsert(&mut entry.record_sets, canonical(record_set));
        Ok(())
    }

    /// All record sets of a zone, in listing order
    pub async fn record_sets(&self, zone_id: &str) -> Vec<ResourceRecordSet> {
        let state = self.inner.read().await;
        state
            .zone(zone_id)
            .map(|entry| entry.record_sets.clone())
            .unwrap_or_default()
    }

    /// The record set `name`/`record_type` of a zone, if any
    pub async fn record_set(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &RecordType,
    ) -> Option<ResourceRecordSet> {
        let state = self.inner.read().await;
        let entry = state.zone(zone_id).ok()?;
        position(&entry.record_sets, name, record_type).map(|i| entry.record_sets[i].clone())
    }

    /// Fail the next change submission with `error`
    pub async fn fail_next_change(&self, error: ApiError) {
        self.inner.write().await.change_failures.push_back(error);
    }

    /// Fail the next listing call (zones or record sets) with `error`
    pub async fn fail_next_listing(&self, error: ApiError) {
        self.inner.write().await.listing_failures.push_back(error);
    }

    /// Accepted change batches, oldest first, with their zone IDs
    pub async fn submissions(&self) -> Vec<(String, ChangeBatch)> {
        self.inner.read().await.submissions.clone()
    }

    /// Calls made so far
    pub async fn calls(&self) -> CallCounts {
        self.inner.read().await.calls
    }
}

#[async_trait]
impl Route53Api for InMemoryRoute53 {
    async fn list_hosted_zones(&self, marker: Option<&str>) -> Result<HostedZonePage, ApiError> {
        let mut state = self.inner.write().await;
        state.calls.list_hosted_zones += 1;
        if let Some(error) = state.listing_failures.pop_front() {
            return Err(error);
        }

        let start = match marker {
            Some(marker) => state
                .zones
                .iter()
                .position(|entry| entry.zone.id == marker)
                .ok_or_else(|| ApiError::InvalidInput(format!("unknown marker: {marker}")))?,
            None => 0,
        };
        let end = (start + self.options.page_size).min(state.zones.len());

        Ok(HostedZonePage {
            hosted_zones: state.zones[start..end]
                .iter()
                .map(|entry| entry.zone.clone())
                .collect(),
            next_marker: state.zones.get(end).map(|entry| entry.zone.id.clone()),
        })
    }

    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordSetCursor>,
    ) -> Result<RecordSetPage, ApiError> {
        let mut state = self.inner.write().await;
        state.calls.list_resource_record_sets += 1;
        if let Some(error) = state.listing_failures.pop_front() {
            return Err(error);
        }

        let sets = &state.zone(zone_id)?.record_sets;
        let begin = match start {
            Some(cursor) => match position(sets, &cursor.name, &cursor.record_type) {
                Some(i) => i,
                None => return Ok(RecordSetPage::default()),
            },
            None => 0,
        };
        let end = (begin + self.options.page_size).min(sets.len());

        Ok(RecordSetPage {
            record_sets: sets[begin..end].to_vec(),
            next: sets.get(end).map(|set| RecordSetCursor {
                name: set.name.clone(),
                record_type: set.record_type.clone(),
                identifier: None,
            }),
        })
    }

    async fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: ChangeBatch,
    ) -> Result<ChangeInfo, ApiError> {
        let mut state = self.inner.write().await;
        state.calls.change_resource_record_sets += 1;
        if let Some(error) = state.change_failures.pop_front() {
            return Err(error);
        }
        if batch.changes.is_empty() {
            return Err(ApiError::InvalidInput("change batch has no changes".to_string()));
        }

        // Apply to a copy so a failing change leaves the zone untouched.
        let mut sets = state.zone(zone_id)?.record_sets.clone();
        for change in &batch.changes {
            apply(&mut sets, change.action, canonical(change.record_set.clone()))?;
        }
        state.zone_mut(zone_id)?.record_sets = sets;

        state.next_change += 1;
        let polls_left = self.options.sync_after_polls;
        let info = ChangeInfo {
            id: format!("/change/CMEM{:08}", state.next_change),
            status: if polls_left == Some(0) {
                ChangeStatus::InSync
            } else {
                ChangeStatus::Pending
            },
            submitted_at: Utc::now(),
        };
        state.changes.insert(
            info.id.clone(),
            TrackedChange {
                info: info.clone(),
                polls_left,
            },
        );
        state.submissions.push((zone_id.to_string(), batch));

        Ok(info)
    }

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo, ApiError> {
        let mut state = self.inner.write().await;
        state.calls.get_change += 1;

        let tracked = state
            .changes
            .get_mut(change_id)
            .ok_or_else(|| ApiError::NoSuchChange(change_id.to_string()))?;

        if let Some(left) = tracked.polls_left.as_mut() {
            *left = left.saturating_sub(1);
            if *left == 0 {
                tracked.info.status = ChangeStatus::InSync;
            }
        }
        Ok(tracked.info.clone())
    }
}

/// Store names the way Route 53 lists them: lower-case, absolute, escaped
fn canonical(mut record_set: ResourceRecordSet) -> ResourceRecordSet {
    record_set.name = wire::encode_name(&zone_fqdn(&record_set.name));
    record_set
}

fn position(sets: &[ResourceRecordSet], name: &str, record_type: &RecordType) -> Option<usize> {
    let name = wire::decode_name(name);
    sets.iter().position(|set| {
        set.record_type == *record_type && names_equal(&wire::decode_name(&set.name), &name)
    })
}

fn upsert(sets: &mut Vec<ResourceRecordSet>, record_set: ResourceRecordSet) {
    match position(sets, &record_set.name, &record_set.record_type) {
        Some(i) => sets[i] = record_set,
        None => sets.push(record_set),
    }
}

fn describe(set: &ResourceRecordSet) -> String {
    format!("[name='{}', type='{}']", set.name, set.record_type)
}

fn same_values(a: &[String], b: &[String]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

fn apply(
    sets: &mut Vec<ResourceRecordSet>,
    action: ChangeAction,
    record_set: ResourceRecordSet,
) -> Result<(), ApiError> {
    if !record_set.is_alias() {
        if record_set.resource_records.is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "resource record set {} has no values",
                describe(&record_set)
            )));
        }
        if record_set.ttl.is_none() {
            return Err(ApiError::InvalidInput(format!(
                "resource record set {} has no TTL",
                describe(&record_set)
            )));
        }
    }

    let existing = position(sets, &record_set.name, &record_set.record_type);
    match action {
        ChangeAction::Create => {
            if existing.is_some() {
                return Err(ApiError::InvalidChangeBatch(format!(
                    "Tried to create resource record set {} but it already exists",
                    describe(&record_set)
                )));
            }
            sets.push(record_set);
        }
        ChangeAction::Upsert => upsert(sets, record_set),
        ChangeAction::Delete => {
            let Some(i) = existing else {
                return Err(ApiError::InvalidChangeBatch(format!(
                    "Tried to delete resource record set {} but it was not found",
                    describe(&record_set)
                )));
            };
            let current = &sets[i];
            if current.ttl != record_set.ttl
                || !same_values(&current.resource_records, &record_set.resource_records)
            {
                return Err(ApiError::InvalidChangeBatch(format!(
                    "Tried to delete resource record set {} but the values provided do not match the current values",
                    describe(&record_set)
                )));
            }
            sets.remove(i);
        }
    }
    Ok(())
}
