// # IP Source Trait
//
// Defines the interface for determining the caller's current public address.
//
// ## Implementations
//
// - HTTP lookup service: `r53ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use r53ddns_core::IpSource;
//
// match source.resolve().await {
//     Some(ip) => println!("public IP is {}", ip),
//     None => println!("could not determine public IP"),
// }
// ```

use async_trait::async_trait;

/// Trait for public IP resolvers
///
/// # Failure Model
///
/// Resolution never fails the run. Any failure (transport error, bad status,
/// unparseable body) is logged by the implementation and reported as `None`,
/// which the reconciler reads as "no information".
///
/// Implementations make a single outbound request per call, with no retries
/// and no caching across calls.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Resolve the current public IP address
    ///
    /// # Returns
    ///
    /// - `Some(String)`: The address as reported by the source
    /// - `None`: The address could not be determined
    async fn resolve(&self) -> Option<String>;

    /// Get the source name (for logging)
    fn source_name(&self) -> &'static str;
}
