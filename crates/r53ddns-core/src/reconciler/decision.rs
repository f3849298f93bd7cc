//! The compare step of a pass
//!
//! An absent public IP carries no information and never triggers a change,
//! whatever the record holds. Otherwise the existing value and the public IP
//! are compared as exact strings, and an absent existing value always counts
//! as different.

/// Why a pass submitted no change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// Existing value equals the public IP
    Matched,
    /// Public IP could not be determined
    IpUnavailable,
}

/// What a pass should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Leave the record alone
    NoOp(NoOpReason),
    /// Upsert the record with this value
    Upsert(String),
}

/// Compare the existing record value with the resolved public IP
pub fn decide(existing: Option<&str>, resolved: Option<&str>) -> Decision {
    match (existing, resolved) {
        (_, None) => Decision::NoOp(NoOpReason::IpUnavailable),
        (Some(existing), Some(resolved)) if existing == resolved => {
            Decision::NoOp(NoOpReason::Matched)
        }
        (_, Some(resolved)) => Decision::Upsert(resolved.to_string()),
    }
}
