//! Zone resolution
//!
//! Maps a zone name to its hosted-zone ID by walking every page of
//! `ListHostedZones`. Nothing is cached; each public operation resolves its
//! zone afresh.

use tokio_util::sync::CancellationToken;

use dnsrec_core::name::{names_equal, zone_fqdn};
use dnsrec_core::{Error, Result, cancel};

use crate::api::{HostedZone, Route53Api, lookup_error};

/// A hosted zone resolved for the duration of one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedZone {
    /// Provider zone ID
    pub id: String,
    /// Fully-qualified zone name, lower-case with trailing dot
    pub name: String,
}

/// Resolve `zone` to exactly one hosted zone
///
/// Names are compared ignoring case and the trailing dot. When
/// `private_zone` is set, only zones of that visibility are candidates.
///
/// # Errors
///
/// - [`Error::ZoneNotFound`] when no zone matches
/// - [`Error::AmbiguousZone`] when several zones remain
/// - [`Error::RecordLookup`] when a listing call fails
/// - [`Error::Cancelled`] when the token fires
pub async fn resolve_zone(
    client: &dyn Route53Api,
    cancel: &CancellationToken,
    zone: &str,
    private_zone: Option<bool>,
) -> Result<ResolvedZone> {
    let mut matches: Vec<HostedZone> = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let page = cancel::cancellable(cancel, async {
            client
                .list_hosted_zones(marker.as_deref())
                .await
                .map_err(lookup_error)
        })
        .await?;

        matches.extend(page.hosted_zones.into_iter().filter(|hosted| {
            names_equal(&hosted.name, zone)
                && private_zone.is_none_or(|private| hosted.private_zone == private)
        }));

        match page.next_marker {
            Some(next) => marker = Some(next),
            None => break,
        }
    }

    match matches.len() {
        0 => Err(Error::zone_not_found(zone_fqdn(zone))),
        1 => {
            let hosted = matches.remove(0);
            tracing::debug!(zone = %hosted.name, zone_id = %hosted.id, "resolved hosted zone");
            Ok(ResolvedZone {
                id: hosted.id,
                name: zone_fqdn(&hosted.name),
            })
        }
        n => Err(Error::ambiguous_zone(zone_fqdn(zone), n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryRoute53, MemoryOptions};

    #[tokio::test]
    async fn resolves_across_pages_ignoring_case_and_dot() {
        let backend = InMemoryRoute53::with_options(MemoryOptions {
            page_size: 1,
            ..MemoryOptions::default()
        });
        backend.add_zone("other.org", false).await;
        backend.add_zone("another.net", false).await;
        let id = backend.add_zone("example.com", false).await;
        let cancel = CancellationToken::new();

        for name in ["example.com", "example.com.", "EXAMPLE.Com."] {
            let zone = resolve_zone(&backend, &cancel, name, None).await.unwrap();
            assert_eq!(zone.id, id);
            assert_eq!(zone.name, "example.com.");
        }
        assert_eq!(backend.calls().await.list_hosted_zones, 9);
    }

    #[tokio::test]
    async fn missing_zone_is_not_found() {
        let backend = InMemoryRoute53::new();
        backend.add_zone("example.com", false).await;

        let result = resolve_zone(&backend, &CancellationToken::new(), "example.org", None).await;
        assert!(matches!(result, Err(Error::ZoneNotFound(ref zone)) if zone == "example.org."));
    }

    #[tokio::test]
    async fn private_zone_setting_disambiguates() {
        let backend = InMemoryRoute53::new();
        let public = backend.add_zone("example.com", false).await;
        let private = backend.add_zone("example.com", true).await;
        let cancel = CancellationToken::new();

        let result = resolve_zone(&backend, &cancel, "example.com", None).await;
        assert!(matches!(result, Err(Error::AmbiguousZone { matches: 2, .. })));

        let zone = resolve_zone(&backend, &cancel, "example.com", Some(true)).await.unwrap();
        assert_eq!(zone.id, private);
        let zone = resolve_zone(&backend, &cancel, "example.com", Some(false)).await.unwrap();
        assert_eq!(zone.id, public);
    }

    #[tokio::test]
    async fn listing_failure_is_a_lookup_error() {
        let backend = InMemoryRoute53::new();
        backend
            .fail_next_listing(crate::api::ApiError::AccessDenied("no".into()))
            .await;

        let result = resolve_zone(&backend, &CancellationToken::new(), "example.com", None).await;
        assert!(matches!(result, Err(Error::RecordLookup(_))));
    }

    #[tokio::test]
    async fn cancelled_before_listing() {
        let backend = InMemoryRoute53::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = resolve_zone(&backend, &cancel, "example.com", None).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(backend.calls().await.list_hosted_zones, 0);
    }
}
