//! Core traits for dnsrec
//!
//! This module defines the abstract interfaces that all record adapters implement.
//!
//! - [`RecordGetter`], [`RecordAppender`], [`RecordSetter`], [`RecordDeleter`]:
//!   the four record operations
//! - [`RecordProvider`]: all four together
//! - [`RecordProviderFactory`]: construction from configuration

pub mod record_provider;

pub use record_provider::{
    RecordAppender, RecordDeleter, RecordGetter, RecordProvider, RecordProviderFactory,
    RecordSetter,
};
