//! Route 53 client capability
//!
//! The adapter talks to Route 53 through [`Route53Api`]. Implementations own
//! authentication, request signing, HTTP transport and connection-level
//! retries; the adapter treats them as already authenticated. The types in
//! this module mirror the Route 53 API shapes the adapter needs and
//! serialize to the field names of the Route 53 JSON representation.
//! [`crate::http::HttpRoute53`] is the implementation that talks to AWS.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dnsrec_core::{ChangeAction, RecordType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A hosted zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// Provider zone ID (e.g. `/hostedzone/Z123` or `Z123`)
    pub id: String,
    /// Fully-qualified zone name, with trailing dot
    pub name: String,
    /// Private (VPC-associated) zone
    pub private_zone: bool,
}

/// One page of hosted zones
#[derive(Debug, Clone, Default)]
pub struct HostedZonePage {
    pub hosted_zones: Vec<HostedZone>,
    /// Marker for the next page, `None` on the last page
    pub next_marker: Option<String>,
}

/// A resource record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRecordSet {
    /// Fully-qualified name as returned by the API (`*` escaped as `\052`)
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: RecordType,
    /// TTL in seconds, absent for alias sets
    #[serde(rename = "TTL", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// Wire-format values (TXT values quoted)
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "resource_values")]
    pub resource_records: Vec<String>,
    /// DNS name of the alias target, for alias sets
    #[serde(default, skip_serializing_if = "Option::is_none", with = "alias_dns_name")]
    pub alias_target: Option<String>,
}

impl ResourceRecordSet {
    /// Create a plain (non-alias) record set
    pub fn new(
        name: impl Into<String>,
        record_type: RecordType,
        ttl: u64,
        resource_records: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl: Some(ttl),
            resource_records,
            alias_target: None,
        }
    }

    /// Whether this is an alias record set
    pub fn is_alias(&self) -> bool {
        self.alias_target.is_some()
    }
}

/// `ResourceRecords` is a list of `{"Value": ..}` objects
mod resource_values {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct ResourceRecord {
        #[serde(rename = "Value")]
        value: String,
    }

    pub fn serialize<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|value| ResourceRecord {
            value: value.clone(),
        }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let records = Vec::<ResourceRecord>::deserialize(deserializer)?;
        Ok(records.into_iter().map(|record| record.value).collect())
    }
}

/// Only the target's `DNSName` of an `AliasTarget` is kept
mod alias_dns_name {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct AliasTarget {
        #[serde(rename = "DNSName")]
        dns_name: String,
    }

    pub fn serialize<S: Serializer>(target: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        target
            .as_ref()
            .map(|dns_name| AliasTarget {
                dns_name: dns_name.clone(),
            })
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<AliasTarget>::deserialize(deserializer)?.map(|target| target.dns_name))
    }
}

/// Where to start listing record sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSetCursor {
    pub name: String,
    pub record_type: RecordType,
    /// Set identifier, when the page boundary falls inside routing-policy sets
    pub identifier: Option<String>,
}

/// One page of record sets
#[derive(Debug, Clone, Default)]
pub struct RecordSetPage {
    pub record_sets: Vec<ResourceRecordSet>,
    /// Start of the next page, `None` on the last page
    pub next: Option<RecordSetCursor>,
}

/// A single change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Change {
    pub action: ChangeAction,
    #[serde(rename = "ResourceRecordSet")]
    pub record_set: ResourceRecordSet,
}

/// Changes applied atomically
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeBatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub changes: Vec<Change>,
}

impl ChangeBatch {
    /// A batch holding one change
    pub fn single(action: ChangeAction, record_set: ResourceRecordSet) -> Self {
        Self {
            comment: None,
            changes: vec![Change { action, record_set }],
        }
    }
}

/// Propagation status of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeStatus {
    Pending,
    InSync,
}

/// Status of a submitted change batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeInfo {
    pub id: String,
    pub status: ChangeStatus,
    pub submitted_at: DateTime<Utc>,
}

/// Errors reported by the client capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Request rate exceeded (`Throttling`, `PriorRequestNotComplete`)
    #[error("throttled: {0}")]
    Throttled(String),

    /// Route 53 temporarily unavailable (HTTP 5xx)
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Network fault below the API layer
    #[error("transport error: {0}")]
    Transport(String),

    /// Batch contents conflict with the zone (`InvalidChangeBatch`)
    #[error("invalid change batch: {0}")]
    InvalidChangeBatch(String),

    /// Malformed request (`InvalidInput`)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no such hosted zone: {0}")]
    NoSuchHostedZone(String),

    #[error("no such change: {0}")]
    NoSuchChange(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A response body that could not be understood
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Whether repeating the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Throttled(_) | ApiError::ServiceUnavailable(_) | ApiError::Transport(_)
        )
    }
}

/// Map a failure of a listing call
pub(crate) fn lookup_error(err: ApiError) -> dnsrec_core::Error {
    dnsrec_core::Error::lookup(err.to_string())
}

/// Map a failure of a change submission
pub(crate) fn submission_error(err: ApiError) -> dnsrec_core::Error {
    if err.is_transient() {
        dnsrec_core::Error::transient(err.to_string())
    } else {
        dnsrec_core::Error::rejected(err.to_string())
    }
}

/// Authenticated Route 53 client capability
///
/// Implementations must be safe for concurrent use by several in-flight
/// adapter calls.
#[async_trait]
pub trait Route53Api: Send + Sync {
    /// List hosted zones, starting at `marker`
    async fn list_hosted_zones(&self, marker: Option<&str>) -> Result<HostedZonePage, ApiError>;

    /// List record sets of `zone_id`, starting at `start`
    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordSetCursor>,
    ) -> Result<RecordSetPage, ApiError>;

    /// Submit a change batch
    async fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: ChangeBatch,
    ) -> Result<ChangeInfo, ApiError>;

    /// Look up the status of a submitted change
    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo, ApiError>;
}
