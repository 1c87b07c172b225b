//! Test doubles and common utilities for Route 53 contract tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dnsrec_core::config::{AdapterConfig, PropagationConfig, RetryConfig};
use dnsrec_core::{CancellationToken, EventSink, RecordType};
use dnsrec_route53::Route53Provider;
use dnsrec_route53::api::{
    ApiError, ChangeBatch, ChangeInfo, HostedZonePage, RecordSetCursor, RecordSetPage,
    ResourceRecordSet, Route53Api,
};
use dnsrec_route53::memory::InMemoryRoute53;

pub const ZONE: &str = "example.com.";

/// A backend holding `example.com.` and its zone ID
pub async fn backend_with_zone() -> (InMemoryRoute53, String) {
    let backend = InMemoryRoute53::new();
    let zone_id = backend.add_zone(ZONE, false).await;
    (backend, zone_id)
}

/// Config with fast retries and no propagation wait
pub fn fast_config(max_attempts: u32) -> AdapterConfig {
    AdapterConfig {
        retry: RetryConfig {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        },
        propagation: PropagationConfig::default(),
        ..AdapterConfig::default()
    }
}

/// Provider over `client` using [`fast_config`]
pub fn provider(client: Arc<dyn Route53Api>) -> Route53Provider {
    Route53Provider::new(client, &fast_config(3)).expect("valid config")
}

/// Provider with a channel sink attached
pub fn provider_with_events(
    client: Arc<dyn Route53Api>,
    config: &AdapterConfig,
) -> (Route53Provider, tokio::sync::mpsc::Receiver<dnsrec_core::AdapterEvent>) {
    let (sink, rx) = EventSink::channel(64);
    let provider = Route53Provider::new(client, config).expect("valid config");
    (provider.with_events(sink), rx)
}

/// Seed a plain record set
pub async fn seed(
    backend: &InMemoryRoute53,
    zone_id: &str,
    name: &str,
    record_type: RecordType,
    values: &[&str],
) {
    backend
        .put_record_set(
            zone_id,
            ResourceRecordSet::new(
                name,
                record_type,
                300,
                values.iter().map(|v| v.to_string()).collect(),
            ),
        )
        .await
        .expect("seeding succeeds");
}

/// Current values of a TXT set, unquoted, or empty if the set is gone
pub async fn txt_values(backend: &InMemoryRoute53, zone_id: &str, name: &str) -> Vec<String> {
    backend
        .record_set(zone_id, name, &RecordType::Txt)
        .await
        .map(|set| {
            set.resource_records
                .iter()
                .map(|v| dnsrec_route53::wire::unquote_text(v))
                .collect()
        })
        .unwrap_or_default()
}

/// Client that cancels a token once a number of submissions succeeded
pub struct CancellingApi {
    inner: InMemoryRoute53,
    cancel: CancellationToken,
    cancel_after: usize,
    submitted: AtomicUsize,
}

impl CancellingApi {
    pub fn new(inner: InMemoryRoute53, cancel: CancellationToken, cancel_after: usize) -> Self {
        Self {
            inner,
            cancel,
            cancel_after,
            submitted: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Route53Api for CancellingApi {
    async fn list_hosted_zones(&self, marker: Option<&str>) -> Result<HostedZonePage, ApiError> {
        self.inner.list_hosted_zones(marker).await
    }

    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordSetCursor>,
    ) -> Result<RecordSetPage, ApiError> {
        self.inner.list_resource_record_sets(zone_id, start).await
    }

    async fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: ChangeBatch,
    ) -> Result<ChangeInfo, ApiError> {
        let info = self.inner.change_resource_record_sets(zone_id, batch).await?;
        if self.submitted.fetch_add(1, Ordering::SeqCst) + 1 >= self.cancel_after {
            self.cancel.cancel();
        }
        Ok(info)
    }

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo, ApiError> {
        self.inner.get_change(change_id).await
    }
}

/// Client whose submissions never complete
pub struct HangingApi {
    pub inner: InMemoryRoute53,
}

#[async_trait]
impl Route53Api for HangingApi {
    async fn list_hosted_zones(&self, marker: Option<&str>) -> Result<HostedZonePage, ApiError> {
        self.inner.list_hosted_zones(marker).await
    }

    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordSetCursor>,
    ) -> Result<RecordSetPage, ApiError> {
        self.inner.list_resource_record_sets(zone_id, start).await
    }

    async fn change_resource_record_sets(
        &self,
        _zone_id: &str,
        _batch: ChangeBatch,
    ) -> Result<ChangeInfo, ApiError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(ApiError::Transport("timed out".to_string()))
    }

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo, ApiError> {
        self.inner.get_change(change_id).await
    }
}

/// Client that fails the `fail_on`-th submission (1-based) with `error`
pub struct FailingNthApi {
    inner: InMemoryRoute53,
    fail_on: usize,
    error: ApiError,
    submitted: AtomicUsize,
}

impl FailingNthApi {
    pub fn new(inner: InMemoryRoute53, fail_on: usize, error: ApiError) -> Self {
        Self {
            inner,
            fail_on,
            error,
            submitted: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Route53Api for FailingNthApi {
    async fn list_hosted_zones(&self, marker: Option<&str>) -> Result<HostedZonePage, ApiError> {
        self.inner.list_hosted_zones(marker).await
    }

    async fn list_resource_record_sets(
        &self,
        zone_id: &str,
        start: Option<&RecordSetCursor>,
    ) -> Result<RecordSetPage, ApiError> {
        self.inner.list_resource_record_sets(zone_id, start).await
    }

    async fn change_resource_record_sets(
        &self,
        zone_id: &str,
        batch: ChangeBatch,
    ) -> Result<ChangeInfo, ApiError> {
        if self.submitted.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
            return Err(self.error.clone());
        }
        self.inner.change_resource_record_sets(zone_id, batch).await
    }

    async fn get_change(&self, change_id: &str) -> Result<ChangeInfo, ApiError> {
        self.inner.get_change(change_id).await
    }
}
