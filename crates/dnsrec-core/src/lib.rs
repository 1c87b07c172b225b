// # dnsrec-core
//
// Core library for DNS record adapters.
//
// ## Architecture Overview
//
// This library provides the provider-agnostic half of a record adapter:
// - **Record**: Generic record model (type, relative name, value, TTL, optional ID)
// - **RecordProvider**: Traits for listing, appending, setting and deleting records
// - **ProviderRegistry**: Plugin-based registry for record providers
// - **RetryPolicy**: Explicit retry policy for remote submissions
// - **EventSink**: Injected destination for structured adapter events
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Provider APIs live in their own crates
// 2. **Stateless**: Nothing is cached between calls; every call resolves its zone afresh
// 3. **Sequential**: Records of one call are processed one at a time, in order
// 4. **Cancellable**: Every blocking step races the caller's cancellation token
// 5. **Library-First**: Configuration, logging setup and credentials belong to the caller

pub mod cancel;
pub mod config;
pub mod error;
pub mod events;
pub mod name;
pub mod record;
pub mod registry;
pub mod retry;
pub mod traits;

// Re-export core types for convenience
pub use config::{AdapterConfig, PropagationConfig, ProviderConfig, RetryConfig, Route53Settings};
pub use error::{Error, Result};
pub use events::{AdapterEvent, ChangeAction, EventSink};
pub use record::{Record, RecordId, RecordType};
pub use registry::ProviderRegistry;
pub use retry::{Backoff, RetryPolicy};
pub use traits::{
    RecordAppender, RecordDeleter, RecordGetter, RecordProvider, RecordProviderFactory,
    RecordSetter,
};
pub use tokio_util::sync::CancellationToken;
