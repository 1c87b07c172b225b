// # Route 53 Record Provider
//
// This crate provides a Route 53 implementation of the record provider
// traits defined in `dnsrec-core`.
//
// ## Behavior
//
// - Resolves the zone once per call by walking every page of hosted zones
// - Lists record sets page by page and expands each into one record per value
// - Appends by merging the new value into the existing set (UPSERT)
// - Sets by replacing the whole set with the new value (UPSERT)
// - Deletes by echoing the exact current set (DELETE), missing sets are a no-op
// - One single-change batch per record, records processed in order
// - Transient submission failures retried per the configured `RetryPolicy`
// - Optional bounded wait for changes to reach INSYNC
//
// ## Failure Model
//
// The first failing record aborts the call and no partial result is
// returned. Records processed before it stay applied; there is no rollback.
//
// ## Client Capability
//
// Authentication, signing and HTTP transport live behind the `Route53Api`
// trait. The client is built once, either by the caller or by the
// connector given to `Route53Factory`, and shared by every call.
//
// - `HttpRoute53`: the AWS REST API over HTTPS, SigV4-signed (the default
//   factory's connector)
// - `InMemoryRoute53`: an in-process zone store for tests and demos
//
// ## API Reference
//
// - ListHostedZones: GET `/2013-04-01/hostedzone`
// - ListResourceRecordSets: GET `/2013-04-01/hostedzone/:id/rrset`
// - ChangeResourceRecordSets: POST `/2013-04-01/hostedzone/:id/rrset`
// - GetChange: GET `/2013-04-01/change/:id`

pub mod api;
pub mod credentials;
pub mod http;
pub mod locator;
pub mod memory;
pub mod mutator;
pub mod propagation;
pub mod reader;
pub mod sigv4;
pub mod wire;
pub mod zone;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use dnsrec_core::config::{AdapterConfig, PropagationConfig, ProviderConfig, Route53Settings};
use dnsrec_core::traits::{
    RecordAppender, RecordDeleter, RecordGetter, RecordProvider, RecordProviderFactory,
    RecordSetter,
};
use dnsrec_core::{
    AdapterEvent, Error, EventSink, ProviderRegistry, Record, Result, RetryPolicy, cancel,
};

use crate::api::Route53Api;
use crate::http::HttpRoute53;
use crate::mutator::Mutator;
use crate::zone::{ResolvedZone, resolve_zone};

/// Provider type name used in configuration and the registry
pub const PROVIDER_NAME: &str = "route53";

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Append,
    Set,
    Delete,
}

/// Route 53 record provider
///
/// Holds no state between calls besides the shared client. Every public
/// operation takes a [`CancellationToken`]; when it fires the operation
/// stops at the next remote call, backoff sleep or status poll and returns
/// [`Error::Cancelled`].
pub struct Route53Provider {
    client: Arc<dyn Route53Api>,
    private_zone: Option<bool>,
    retry: RetryPolicy,
    propagation: PropagationConfig,
    events: EventSink,
}

impl std::fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53Provider")
            .field("private_zone", &self.private_zone)
            .field("retry", &self.retry)
            .field("propagation", &self.propagation)
            .finish_non_exhaustive()
    }
}

impl Route53Provider {
    /// Create a provider around an already-built client
    ///
    /// Retry and propagation settings come from `config`; so does the
    /// `private_zone` filter when the provider section is a Route 53 one.
    /// `config` is validated first, so a zero poll interval or retry count
    /// is an [`Error::Config`].
    pub fn new(client: Arc<dyn Route53Api>, config: &AdapterConfig) -> Result<Self> {
        config.validate()?;
        let private_zone = match &config.provider {
            ProviderConfig::Route53(settings) => settings.private_zone,
            ProviderConfig::Custom { .. } => None,
        };

        Ok(Self {
            client,
            private_zone,
            retry: RetryPolicy::from_config(&config.retry),
            propagation: config.propagation.clone(),
            events: EventSink::disabled(),
        })
    }

    /// Send adapter events to `events`
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Replace the retry policy derived from configuration
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn resolve(&self, cancel: &CancellationToken, zone: &str) -> Result<ResolvedZone> {
        let resolved = resolve_zone(self.client.as_ref(), cancel, zone, self.private_zone).await?;
        self.events.emit(AdapterEvent::ZoneResolved {
            zone: resolved.name.clone(),
            zone_id: resolved.id.clone(),
        });
        Ok(resolved)
    }

    async fn mutate(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: Vec<Record>,
        mutation: Mutation,
    ) -> Result<Vec<Record>> {
        let zone = self.resolve(cancel, zone).await?;
        let mutator = Mutator {
            client: self.client.as_ref(),
            cancel,
            zone: &zone,
            retry: &self.retry,
            propagation: &self.propagation,
            events: &self.events,
        };

        let mut results = Vec::with_capacity(records.len());
        for record in &records {
            cancel::check(cancel)?;
            let done = match mutation {
                Mutation::Append => mutator.create(record).await,
                Mutation::Set => mutator.update(record).await,
                Mutation::Delete => mutator.delete(record).await,
            };
            match done {
                Ok(done) => results.push(done),
                Err(err) => {
                    if !results.is_empty() {
                        tracing::warn!(
                            zone = %zone.name,
                            applied = results.len(),
                            remaining = records.len() - results.len(),
                            error = %err,
                            "record change failed, earlier changes remain applied"
                        );
                    }
                    return Err(err);
                }
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl RecordGetter for Route53Provider {
    async fn get_records(&self, cancel: &CancellationToken, zone: &str) -> Result<Vec<Record>> {
        let zone = self.resolve(cancel, zone).await?;
        reader::list_records(self.client.as_ref(), cancel, &zone).await
    }
}

#[async_trait]
impl RecordAppender for Route53Provider {
    async fn append_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: Vec<Record>,
    ) -> Result<Vec<Record>> {
        self.mutate(cancel, zone, records, Mutation::Append).await
    }
}

#[async_trait]
impl RecordSetter for Route53Provider {
    async fn set_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: Vec<Record>,
    ) -> Result<Vec<Record>> {
        self.mutate(cancel, zone, records, Mutation::Set).await
    }
}

#[async_trait]
impl RecordDeleter for Route53Provider {
    async fn delete_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: Vec<Record>,
    ) -> Result<Vec<Record>> {
        self.mutate(cancel, zone, records, Mutation::Delete).await
    }
}

impl RecordProvider for Route53Provider {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Builds the client capability from connection settings
pub type Connector = dyn Fn(&Route53Settings) -> Result<Arc<dyn Route53Api>> + Send + Sync;

/// Factory for creating Route 53 providers
///
/// The connector runs once per created provider; its client is then shared
/// by every call made through that provider. [`Route53Factory::default`]
/// connects to AWS with [`HttpRoute53::connect`].
pub struct Route53Factory {
    connect: Box<Connector>,
    events: EventSink,
}

impl Route53Factory {
    pub fn new<F>(connect: F) -> Self
    where
        F: Fn(&Route53Settings) -> Result<Arc<dyn Route53Api>> + Send + Sync + 'static,
    {
        Self {
            connect: Box::new(connect),
            events: EventSink::disabled(),
        }
    }

    /// Factory handing out clones of one existing client
    pub fn with_client(client: Arc<dyn Route53Api>) -> Self {
        Self::new(move |_| Ok(Arc::clone(&client)))
    }

    /// Send events of created providers to `events`
    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }
}

impl Default for Route53Factory {
    fn default() -> Self {
        Self::new(|settings| {
            let client: Arc<dyn Route53Api> = Arc::new(HttpRoute53::connect(settings)?);
            Ok(client)
        })
    }
}

impl RecordProviderFactory for Route53Factory {
    fn create(&self, config: &AdapterConfig) -> Result<Box<dyn RecordProvider>> {
        match &config.provider {
            ProviderConfig::Route53(settings) => {
                let client = (self.connect)(settings)?;
                tracing::info!(
                    region = settings.region.as_deref().unwrap_or("default"),
                    static_credentials = settings.has_static_credentials(),
                    "created Route 53 provider"
                );
                Ok(Box::new(
                    Route53Provider::new(client, config)?.with_events(self.events.clone()),
                ))
            }
            _ => Err(Error::config("Invalid config for Route 53 provider")),
        }
    }
}

/// Register the Route 53 provider with a registry
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use dnsrec_core::ProviderRegistry;
/// use dnsrec_route53::Route53Factory;
/// use dnsrec_route53::memory::InMemoryRoute53;
///
/// let registry = ProviderRegistry::new();
/// dnsrec_route53::register(&registry, Route53Factory::with_client(Arc::new(InMemoryRoute53::new())));
/// assert!(registry.has_provider("route53"));
/// ```
pub fn register(registry: &ProviderRegistry, factory: Route53Factory) {
    registry.register_provider(PROVIDER_NAME, Box::new(factory));
}
