// # r53ddns-core
//
// Core library for a single-pass dynamic DNS updater.
//
// ## Architecture Overview
//
// - **IpSource**: Trait for resolving the current public IP address
// - **DnsProvider**: Trait for listing and changing record sets via a provider API
// - **Reconciler**: Compares the record value with the public IP and upserts on divergence
// - **ReconcileConfig**: Environment-style configuration for one pass
//
// ## Design Principles
//
// 1. **Single pass**: No scheduling, retries or state between runs
// 2. **Injected seams**: Providers and IP sources are trait objects, fakes in tests
// 3. **Observable**: Each pass emits events on a channel the caller owns
// 4. **Library-First**: The binary is only wiring

pub mod traits;
pub mod reconciler;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, IpSource};
pub use reconciler::{Outcome, ReconcileEvent, Reconciler, SkipReason};
pub use config::{ReconcileConfig, RunMode};
pub use error::{Error, Result};
