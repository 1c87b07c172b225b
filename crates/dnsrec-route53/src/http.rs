//! Route 53 over HTTPS
//!
//! [`HttpRoute53`] implements [`Route53Api`] against the 2013-04-01 REST
//! API. Bodies are XML; every request is signed with SigV4 as service
//! `route53`. Route 53 is a global service, so the configured region only
//! selects the partition (`aws`, `aws-cn`, `aws-us-gov`).
//!
//! The client does not retry. Transient failures surface as
//! [`ApiError::Throttled`], [`ApiError::ServiceUnavailable`] or
//! [`ApiError::Transport`] and the adapter's retry policy decides.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use dnsrec_core::config::Route53Settings;
use dnsrec_core::{Error, RecordType};

use crate::PROVIDER_NAME;
use crate::api::{
    ApiError, ChangeBatch, ChangeInfo, ChangeStatus, HostedZone, HostedZonePage, RecordSetCursor,
    RecordSetPage, ResourceRecordSet, Route53Api,
};
use crate::credentials::Credentials;
use crate::sigv4::{self, SigningRequest};

const API_VERSION: &str = "2013-04-01";

const XMLNS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

const SERVICE: &str = "route53";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Where requests go and how they are signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Scheme and authority, e.g. `https://route53.amazonaws.com`
    pub base_url: String,
    /// Value of the signed `host` header
    pub host: String,
    pub signing_region: String,
}

impl Endpoint {
    /// Route 53 endpoint of the partition `region` belongs to
    ///
    /// No region means the commercial partition.
    pub fn for_region(region: Option<&str>) -> Self {
        let (host, signing_region) = match region {
            Some(region) if region.starts_with("cn-") => ("route53.amazonaws.com.cn", "cn-northwest-1"),
            Some(region) if region.starts_with("us-gov-") => {
                ("route53.us-gov.amazonaws.com", "us-gov-west-1")
            }
            _ => ("route53.amazonaws.com", "us-east-1"),
        };
        Self {
            base_url: format!("https://{host}"),
            host: host.to_string(),
            signing_region: signing_region.to_string(),
        }
    }
}

/// Route 53 client over HTTPS
///
/// # Security
///
/// The Debug implementation does NOT expose the secret key or session token.
pub struct HttpRoute53 {
    client: reqwest::Client,
    endpoint: Endpoint,
    credentials: Credentials,
}

impl std::fmt::Debug for HttpRoute53 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRoute53")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl HttpRoute53 {
    pub fn new(credentials: Credentials, endpoint: Endpoint) -> dnsrec_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::provider(PROVIDER_NAME, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            credentials,
        })
    }

    /// Build a client from connection settings
    ///
    /// Unset options fall back to the AWS environment: credentials as
    /// described in [`crate::credentials`], the region from `AWS_REGION` or
    /// `AWS_DEFAULT_REGION`.
    pub fn connect(settings: &Route53Settings) -> dnsrec_core::Result<Self> {
        let credentials = Credentials::resolve(settings)?;
        let region = settings
            .region
            .clone()
            .or_else(|| std::env::var("AWS_REGION").ok())
            .or_else(|| std::env::var("AWS_DEFAULT_REGION").ok());
        let endpoint = Endpoint::for_region(region.as_deref());

        tracing::info!(
            host = %endpoint.host,
            access_key_id = %credentials.access_key_id,
            "connecting to Route 53"
        );
        Self::new(credentials, endpoint)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<String>,
    ) -> Result<String, ApiError> {
        let payload = body.unwrap_or_default();
        let mut headers = vec![("host".to_string(), self.endpoint.host.clone())];
        if !payload.is_empty() {
            headers.push(("content-type".to_string(), "application/xml".to_string()));
        }

        let request = SigningRequest {
            method: method.as_str(),
            path,
            query,
            headers: &headers,
            payload: payload.as_bytes(),
        };
        let signed = sigv4::sign(
            &self.credentials,
            &self.endpoint.signing_region,
            SERVICE,
            &request,
            Utc::now(),
        )
        .map_err(|e| ApiError::Transport(format!("request signing failed: {e}")))?;

        let mut url = format!("{}{}", self.endpoint.base_url, path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&sigv4::canonical_query(query));
        }

        tracing::debug!(method = %method, path = %path, "Route 53 request");
        let mut builder = self.client.request(method, &url);
        // reqwest derives `host` from the URL
        for (name, value) in headers.iter().chain(&signed).filter(|(name, _)| name != "host") {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !payload.is_empty() {
            builder = builder.body(payload);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("HTTP request failed: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let error = parse_error(status.as_u16(), &text);
            tracing::debug!(status = status.as_u16(), error = %error, "Route 53 request failed");
            return Err(error);
        }
        Ok(text)
    }
}

#[async_trait]
impl Route53Api for HttpRoute53 {
    async fn list_hosted_zones(&self, marker: Option<&str>) -> Result<HostedZonePage, ApiError> {
        let query: Vec<(String, String)> = marker
            .map(|marker| vec![("marker".to_string(), marker.to_string())])
            .unwrap_or_default();
        let body = self
            .send(Method::GET, &format!("/{API_VERSION}/hostedzone"), &query, None)
            .await?;
        parse_hosted_zones(&body)
    }

    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordSetCursor>,
    ) -> Result<RecordSetPage, ApiError> {
        let mut query = Vec::new();
        if let Some(cursor) = start {
            query.push(("name".to_string(), cursor.name.clone()));
            query.push(("type".to_string(), cursor.record_type.to_string()));
            if let Some(identifier) = &cursor.identifier {
                query.push(("identifier".to_string(), identifier.clone()));
            }
        }
        let path = format!("/{API_VERSION}/hostedzone/{}/rrset", bare_id(zone_id, "hostedzone"));
        let body = self.send(Method::GET, &path, &query, None).await?;
        parse_record_sets(&body)
    }

    async fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: ChangeBatch,
    ) -> Result<ChangeInfo, ApiError> {
        let path = format!("/{API_VERSION}/hostedzone/{}/rrset/", bare_id(zone_id, "hostedzone"));
        let request = change_request_xml(&batch)?;
        let body = self.send(Method::POST, &path, &[], Some(request)).await?;
        parse_change_info(&body)
    }

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo, ApiError> {
        let path = format!("/{API_VERSION}/change/{}", bare_id(change_id, "change"));
        let body = self.send(Method::GET, &path, &[], None).await?;
        parse_change_info(&body)
    }
}

/// `/hostedzone/Z123` and `Z123` both name zone `Z123`
fn bare_id<'a>(id: &'a str, kind: &str) -> &'a str {
    id.trim_start_matches('/')
        .strip_prefix(kind)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(id)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListHostedZonesResponse {
    #[serde(default)]
    hosted_zones: HostedZoneList,
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HostedZoneList {
    #[serde(rename = "HostedZone", default)]
    items: Vec<XmlHostedZone>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XmlHostedZone {
    id: String,
    name: String,
    #[serde(default)]
    config: Option<XmlZoneConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XmlZoneConfig {
    #[serde(default)]
    private_zone: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListResourceRecordSetsResponse {
    #[serde(default)]
    resource_record_sets: RecordSetList,
    #[serde(default)]
    is_truncated: bool,
    #[serde(default)]
    next_record_name: Option<String>,
    #[serde(default)]
    next_record_type: Option<RecordType>,
    #[serde(default)]
    next_record_identifier: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RecordSetList {
    #[serde(rename = "ResourceRecordSet", default)]
    items: Vec<XmlRecordSet>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XmlRecordSet {
    name: String,
    #[serde(rename = "Type")]
    record_type: RecordType,
    #[serde(rename = "TTL", default, skip_serializing_if = "Option::is_none")]
    ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_records: Option<ResourceRecordList>,
    #[serde(default, skip_serializing)]
    alias_target: Option<XmlAliasTarget>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResourceRecordList {
    #[serde(rename = "ResourceRecord", default)]
    items: Vec<XmlResourceRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct XmlResourceRecord {
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct XmlAliasTarget {
    #[serde(rename = "DNSName")]
    dns_name: String,
}

impl From<XmlRecordSet> for ResourceRecordSet {
    fn from(set: XmlRecordSet) -> Self {
        Self {
            name: set.name,
            record_type: set.record_type,
            ttl: set.ttl,
            resource_records: set
                .resource_records
                .map(|list| list.items.into_iter().map(|record| record.value).collect())
                .unwrap_or_default(),
            alias_target: set.alias_target.map(|target| target.dns_name),
        }
    }
}

impl From<&ResourceRecordSet> for XmlRecordSet {
    fn from(set: &ResourceRecordSet) -> Self {
        Self {
            name: set.name.clone(),
            record_type: set.record_type.clone(),
            ttl: set.ttl,
            resource_records: (!set.resource_records.is_empty()).then(|| ResourceRecordList {
                items: set
                    .resource_records
                    .iter()
                    .map(|value| XmlResourceRecord {
                        value: value.clone(),
                    })
                    .collect(),
            }),
            alias_target: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename = "ChangeResourceRecordSetsRequest")]
struct ChangeRequest {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "ChangeBatch")]
    change_batch: XmlChangeBatch,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct XmlChangeBatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    changes: XmlChanges,
}

#[derive(Debug, Serialize)]
struct XmlChanges {
    #[serde(rename = "Change")]
    items: Vec<XmlChange>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct XmlChange {
    action: &'static str,
    resource_record_set: XmlRecordSet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ChangeInfoResponse {
    change_info: XmlChangeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XmlChangeInfo {
    id: String,
    status: String,
    submitted_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorResponse {
    error: XmlError,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XmlError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InvalidChangeBatchResponse {
    #[serde(default)]
    messages: MessageList,
}

#[derive(Debug, Default, Deserialize)]
struct MessageList {
    #[serde(rename = "Message", default)]
    items: Vec<String>,
}

fn from_xml<'de, T: Deserialize<'de>>(body: &'de str) -> Result<T, ApiError> {
    quick_xml::de::from_str(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

fn parse_hosted_zones(body: &str) -> Result<HostedZonePage, ApiError> {
    let response: ListHostedZonesResponse = from_xml(body)?;
    Ok(HostedZonePage {
        hosted_zones: response
            .hosted_zones
            .items
            .into_iter()
            .map(|zone| HostedZone {
                id: zone.id,
                name: zone.name,
                private_zone: zone.config.is_some_and(|config| config.private_zone),
            })
            .collect(),
        next_marker: response.next_marker.filter(|_| response.is_truncated),
    })
}

fn parse_record_sets(body: &str) -> Result<RecordSetPage, ApiError> {
    let response: ListResourceRecordSetsResponse = from_xml(body)?;
    let next = match (response.is_truncated, response.next_record_name, response.next_record_type) {
        (true, Some(name), Some(record_type)) => Some(RecordSetCursor {
            name,
            record_type,
            identifier: response.next_record_identifier,
        }),
        (true, _, _) => {
            return Err(ApiError::MalformedResponse(
                "truncated record set listing without a next record".to_string(),
            ));
        }
        (false, _, _) => None,
    };

    Ok(RecordSetPage {
        record_sets: response
            .resource_record_sets
            .items
            .into_iter()
            .map(ResourceRecordSet::from)
            .collect(),
        next,
    })
}

fn parse_change_info(body: &str) -> Result<ChangeInfo, ApiError> {
    let info = from_xml::<ChangeInfoResponse>(body)?.change_info;
    let status = match info.status.as_str() {
        "PENDING" => ChangeStatus::Pending,
        "INSYNC" => ChangeStatus::InSync,
        other => {
            return Err(ApiError::MalformedResponse(format!("unknown change status '{other}'")));
        }
    };
    Ok(ChangeInfo {
        id: info.id,
        status,
        submitted_at: info.submitted_at,
    })
}

fn change_request_xml(batch: &ChangeBatch) -> Result<String, ApiError> {
    let request = ChangeRequest {
        xmlns: XMLNS,
        change_batch: XmlChangeBatch {
            comment: batch.comment.clone(),
            changes: XmlChanges {
                items: batch
                    .changes
                    .iter()
                    .map(|change| XmlChange {
                        action: change.action.as_str(),
                        resource_record_set: XmlRecordSet::from(&change.record_set),
                    })
                    .collect(),
            },
        },
    };
    let xml = quick_xml::se::to_string(&request)
        .map_err(|e| ApiError::InvalidInput(format!("failed to encode change batch: {e}")))?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{xml}"))
}

/// Map an error response to an [`ApiError`]
fn parse_error(status: u16, body: &str) -> ApiError {
    if body.contains("<InvalidChangeBatch")
        && let Ok(response) = from_xml::<InvalidChangeBatchResponse>(body)
    {
        return ApiError::InvalidChangeBatch(response.messages.items.join("; "));
    }

    let (code, message) = match from_xml::<ErrorResponse>(body) {
        Ok(response) => (response.error.code, response.error.message),
        Err(_) => (String::new(), format!("HTTP {status}")),
    };

    match code.as_str() {
        "Throttling" | "ThrottlingException" | "PriorRequestNotComplete" => ApiError::Throttled(message),
        "InvalidChangeBatch" => ApiError::InvalidChangeBatch(message),
        "NoSuchHostedZone" => ApiError::NoSuchHostedZone(message),
        "NoSuchChange" => ApiError::NoSuchChange(message),
        "AccessDenied" | "AccessDeniedException" | "InvalidClientTokenId" | "SignatureDoesNotMatch"
        | "ExpiredToken" | "IncompleteSignature" | "MissingAuthenticationToken" => {
            ApiError::AccessDenied(message)
        }
        _ => match status {
            429 => ApiError::Throttled(message),
            401 | 403 => ApiError::AccessDenied(message),
            500..=599 => ApiError::ServiceUnavailable(message),
            _ if code.is_empty() => ApiError::InvalidInput(message),
            _ => ApiError::InvalidInput(format!("{code}: {message}")),
        },
    }
}
