//! Contract Test: Provider Registry
//!
//! Verifies that the Route 53 provider is created through the registry from
//! configuration, with the client built once by the factory's connector.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::*;
use dnsrec_core::config::{AdapterConfig, ProviderConfig};
use dnsrec_core::traits::{RecordAppender, RecordGetter, RecordProvider};
use dnsrec_core::{CancellationToken, Error, ProviderRegistry, Record, RecordType};
use dnsrec_route53::Route53Factory;
use dnsrec_route53::api::Route53Api;
use tokio_test::assert_ok;

#[tokio::test]
async fn registry_creates_working_provider_from_env() {
    let (backend, _) = backend_with_zone().await;
    let connects = Arc::new(AtomicUsize::new(0));

    let client: Arc<dyn Route53Api> = Arc::new(backend.clone());
    let counter = Arc::clone(&connects);
    let factory = Route53Factory::new(move |settings| {
        assert_eq!(settings.region.as_deref(), Some("eu-west-1"));
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&client))
    });

    let registry = ProviderRegistry::new();
    dnsrec_route53::register(&registry, factory);

    let env: HashMap<&str, &str> = HashMap::from([
        ("DNSREC_REGION", "eu-west-1"),
        ("DNSREC_MAX_RETRIES", "2"),
    ]);
    let config = assert_ok!(AdapterConfig::from_lookup(|key: &str| {
        env.get(key).map(|v| v.to_string())
    }));

    let provider = registry
        .create_provider(&config)
        .expect("route53 provider is registered");
    assert_eq!(provider.provider_name(), "route53");

    let cancel = CancellationToken::new();
    assert_ok!(
        provider
            .append_records(&cancel, ZONE, vec![Record::new(RecordType::Txt, "t", "v")])
            .await
    );
    let records = assert_ok!(provider.get_records(&cancel, ZONE).await);
    assert_eq!(records.len(), 1);
    assert_eq!(connects.load(Ordering::SeqCst), 1);
}

#[test]
fn unregistered_provider_is_a_config_error() {
    let registry = ProviderRegistry::new();
    let result = registry.create_provider(&AdapterConfig::default());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn invalid_credentials_are_rejected_before_connecting() {
    let registry = ProviderRegistry::new();
    dnsrec_route53::register(
        &registry,
        Route53Factory::new(|_| panic!("connector must not run for invalid config")),
    );

    let mut config = AdapterConfig::default();
    if let ProviderConfig::Route53(settings) = &mut config.provider {
        settings.access_key_id = Some("AKIDEXAMPLE".to_string());
    }

    let result = registry.create_provider(&config);
    assert!(matches!(result, Err(Error::Config(_))));
}
