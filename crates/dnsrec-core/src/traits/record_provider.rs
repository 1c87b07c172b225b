// # Record Provider Traits
//
// Defines the caller-facing interface of every record adapter: list, append,
// set and delete records in a zone.
//
// ## Implementations
//
// - Route 53: `dnsrec-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use dnsrec_core::{Record, RecordType};
// use dnsrec_core::traits::{RecordAppender, RecordDeleter};
// use tokio_util::sync::CancellationToken;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* RecordProvider implementation */;
//     let cancel = CancellationToken::new();
//
//     let challenge = Record::new(RecordType::Txt, "_acme-challenge", "token");
//     provider.append_records(&cancel, "example.com.", vec![challenge.clone()]).await?;
//     // ... let the CA validate ...
//     provider.delete_records(&cancel, "example.com.", vec![challenge]).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::record::Record;

/// Lists the records of a zone
#[async_trait]
pub trait RecordGetter: Send + Sync {
    /// List all records in `zone`
    ///
    /// A provider record set with several values yields one record per
    /// value. Ordering is provider-defined; callers must not rely on it.
    async fn get_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
    ) -> Result<Vec<Record>, crate::Error>;
}

/// Adds records to a zone
#[async_trait]
pub trait RecordAppender: Send + Sync {
    /// Add `records` to `zone`, keeping any values already present
    ///
    /// # Idempotency
    ///
    /// Appending a value that already exists is a successful no-op.
    ///
    /// # Returns
    ///
    /// The appended records, in input order, with IDs populated.
    async fn append_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, crate::Error>;
}

/// Creates or replaces records in a zone
#[async_trait]
pub trait RecordSetter: Send + Sync {
    /// Make each record the only value of its (name, type) in `zone`
    ///
    /// # Returns
    ///
    /// The records as set, in input order, with IDs populated.
    async fn set_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, crate::Error>;
}

/// Removes records from a zone
#[async_trait]
pub trait RecordDeleter: Send + Sync {
    /// Delete `records` from `zone`
    ///
    /// Records without an ID are looked up by (name, type). Deleting a
    /// record that does not exist is not an error; the input record is
    /// returned unchanged.
    async fn delete_records(
        &self,
        cancel: &CancellationToken,
        zone: &str,
        records: Vec<Record>,
    ) -> Result<Vec<Record>, crate::Error>;
}

/// A complete record adapter
///
/// # Batch semantics
///
/// Records of one call are processed sequentially in input order. The first
/// failure aborts the call and no partial result is returned, but records
/// processed before the failure stay applied remotely. Callers that need
/// per-record durability should submit one record per call.
pub trait RecordProvider: RecordGetter + RecordAppender + RecordSetter + RecordDeleter {
    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "route53")
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing record providers from configuration
pub trait RecordProviderFactory: Send + Sync {
    /// Create a RecordProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Full adapter configuration (provider, retry, propagation)
    ///
    /// # Returns
    ///
    /// A boxed RecordProvider trait object
    fn create(
        &self,
        config: &crate::config::AdapterConfig,
    ) -> Result<Box<dyn RecordProvider>, crate::Error>;
}
