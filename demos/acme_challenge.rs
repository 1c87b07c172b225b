//! ACME DNS-01 challenge walkthrough
//!
//! Drives the Route 53 adapter through the registry the way an ACME client
//! would: publish a challenge token, replace it, clean it up. By default the
//! client is the in-memory backend, so no AWS account is needed.
//!
//! ```bash
//! DNSREC_LOG_LEVEL=debug DNSREC_WAIT_FOR_PROPAGATION=true \
//!     cargo run -p dnsrec-demos --bin acme_challenge
//! ```
//!
//! Setting `DNSREC_DEMO_ZONE` to one of your hosted zones runs the same
//! steps against Route 53 itself, with credentials from the `DNSREC_*`
//! variables or the usual AWS environment.
//!
//! Adapter settings are read from the usual `DNSREC_*` variables.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use dnsrec_core::traits::{RecordAppender, RecordDeleter, RecordGetter, RecordSetter};
use dnsrec_core::{
    AdapterConfig, CancellationToken, EventSink, ProviderRegistry, Record, RecordType,
};
use dnsrec_route53::Route53Factory;
use dnsrec_route53::api::{ResourceRecordSet, Route53Api};
use dnsrec_route53::memory::{InMemoryRoute53, MemoryOptions};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

const ZONE: &str = "example.com.";
const CHALLENGE: &str = "_acme-challenge";

fn log_level() -> Result<Level> {
    let level = env::var("DNSREC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DNSREC_LOG_LEVEL '{}' is not valid. Use one of: trace, debug, info, warn, error",
            level
        ),
    }
}

async fn seeded_backend() -> Result<InMemoryRoute53> {
    let backend = InMemoryRoute53::with_options(MemoryOptions {
        page_size: 2,
        sync_after_polls: Some(2),
    });
    let zone_id = backend.add_zone(ZONE, false).await;
    backend.add_zone("example.org.", false).await;

    backend
        .put_record_set(
            &zone_id,
            ResourceRecordSet::new(
                format!("{CHALLENGE}.{ZONE}"),
                RecordType::Txt,
                300,
                vec!["\"abc\"".to_string()],
            ),
        )
        .await?;
    backend
        .put_record_set(
            &zone_id,
            ResourceRecordSet::new(
                format!("www.{ZONE}"),
                RecordType::A,
                300,
                vec!["192.0.2.10".to_string(), "192.0.2.11".to_string()],
            ),
        )
        .await?;

    Ok(backend)
}

fn show(stage: &str, records: &[Record]) {
    for record in records {
        info!(
            stage,
            name = %record.name,
            record_type = %record.record_type,
            value = %record.value,
            ttl_secs = record.ttl.as_secs(),
            "record"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(log_level()?).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let config = AdapterConfig::from_env().context("invalid DNSREC_* configuration")?;

    let (events, mut event_rx) = EventSink::channel(64);
    let event_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            info!(?event, "adapter event");
        }
    });

    let live_zone = env::var("DNSREC_DEMO_ZONE").ok();
    let backend = match &live_zone {
        Some(_) => None,
        None => Some(seeded_backend().await?),
    };
    let zone = live_zone.as_deref().unwrap_or(ZONE);

    let factory = match &backend {
        Some(backend) => {
            let client: Arc<dyn Route53Api> = Arc::new(backend.clone());
            Route53Factory::new(move |settings| {
                info!(region = ?settings.region, "connecting in-memory Route 53 client");
                Ok(Arc::clone(&client))
            })
        }
        None => Route53Factory::default(),
    }
    .with_events(events);

    let registry = ProviderRegistry::new();
    dnsrec_route53::register(&registry, factory);
    let provider = registry.create_provider(&config)?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    show("initial", &provider.get_records(&cancel, zone).await?);

    let token = Record::new(RecordType::Txt, CHALLENGE, "xyz");
    let appended = provider.append_records(&cancel, zone, vec![token]).await?;
    show("appended", &appended);
    show("after append", &provider.get_records(&cancel, zone).await?);

    let replacement = Record::new(RecordType::Txt, CHALLENGE, "new");
    provider.set_records(&cancel, zone, vec![replacement.clone()]).await?;
    show("after set", &provider.get_records(&cancel, zone).await?);

    let deleted = provider.delete_records(&cancel, zone, vec![replacement]).await?;
    show("deleted", &deleted);
    show("after delete", &provider.get_records(&cancel, zone).await?);

    if let Some(backend) = &backend {
        info!(submissions = backend.submissions().await.len(), "done");
    }

    drop(registry);
    drop(provider);
    event_task.await?;
    Ok(())
}
