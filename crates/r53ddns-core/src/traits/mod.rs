//! Core traits for the reconciler
//!
//! - [`IpSource`]: Resolve the current public IP address
//! - [`DnsProvider`]: List and change record sets via a provider API

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{Change, ChangeAction, ChangeBatch, ChangeInfo, DnsProvider, RecordSet};
