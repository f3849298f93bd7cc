//! Single-pass DNS reconciler
//!
//! The Reconciler is responsible for:
//! - Looking up the existing record set via DnsProvider
//! - Resolving the current public IP via IpSource
//! - Deciding whether the two diverge
//! - Upserting the record set when they do
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  list_record_sets   ┌──────────────┐
//! │ DnsProvider  │◀────────────────────│              │
//! │              │◀────────────────────│  Reconciler  │──── ReconcileEvent ───▶ observer
//! └──────────────┘  change_record_sets │              │
//!                                      └──────────────┘
//!                                             │ resolve
//!                                             ▼
//!                                      ┌──────────────┐
//!                                      │   IpSource   │
//!                                      └──────────────┘
//! ```
//!
//! ## Pass
//!
//! 1. RecordLookup: find the `(name, type)` record set, read its value
//! 2. IpResolution: resolve the public IP (may be absent)
//! 3. Decide: see [`decide`]
//! 4. NoOp or Upsert
//! 5. Done: one summary line is logged, the [`Outcome`] is returned

mod decision;

pub use decision::{Decision, NoOpReason, decide};

use crate::config::{ReconcileConfig, RunMode};
use crate::error::Result;
use crate::traits::{ChangeBatch, ChangeInfo, DnsProvider, IpSource, RecordSet};
use std::fmt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// Why a pass reported [`ReconcileEvent::UpsertSkipped`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Existing value equals the public IP
    Matched,
    /// Public IP could not be determined
    IpUnavailable,
    /// An upsert was due but the run is in dry-run mode
    DryRun,
}

impl From<NoOpReason> for SkipReason {
    fn from(reason: NoOpReason) -> Self {
        match reason {
            NoOpReason::Matched => SkipReason::Matched,
            NoOpReason::IpUnavailable => SkipReason::IpUnavailable,
        }
    }
}

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Record lookup finished
    RecordLookedUp {
        record_name: String,
        existing: Option<String>,
    },

    /// Public IP resolution finished
    IpResolved { ip: Option<String> },

    /// Upsert about to be submitted
    UpsertStarted { record_name: String, value: String },

    /// Provider accepted the upsert
    UpsertSucceeded {
        record_name: String,
        value: String,
        change: ChangeInfo,
    },

    /// No change submitted
    UpsertSkipped {
        record_name: String,
        reason: SkipReason,
    },

    /// Pass finished
    Finished { summary: String },
}

/// Result of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Record value already equals the public IP
    Matched { value: String },

    /// Record set was upserted
    Updated {
        previous: Option<String>,
        current: String,
        change: ChangeInfo,
    },

    /// Upsert was needed but the run is in dry-run mode
    DryRun {
        previous: Option<String>,
        current: String,
        batch: ChangeBatch,
    },

    /// Public IP could not be determined, record left untouched
    IpUnavailable { existing: Option<String> },
}

impl Outcome {
    /// Whether the provider was asked to change anything
    pub fn changed(&self) -> bool {
        matches!(self, Outcome::Updated { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Matched { value } => write!(f, "matched ({})", value),
            Outcome::Updated {
                previous,
                current,
                change,
            } => write!(
                f,
                "updated {} -> {} ({})",
                display_value(previous.as_deref()),
                current,
                change
            ),
            Outcome::DryRun { previous, current, .. } => write!(
                f,
                "dry-run, would update {} -> {}",
                display_value(previous.as_deref()),
                current
            ),
            Outcome::IpUnavailable { existing } => write!(
                f,
                "public IP unavailable, left {} untouched",
                display_value(existing.as_deref())
            ),
        }
    }
}

/// Single-pass DNS reconciler
///
/// Holds the injected IP source and DNS provider plus the target record.
/// Each call to [`Reconciler::run`] performs at most three sequential
/// network operations: list, resolve, upsert. Nothing is cached between
/// runs and nothing is retried.
pub struct Reconciler {
    /// Public IP resolver
    ip_source: Box<dyn IpSource>,

    /// DNS provider for listing and changing record sets
    provider: Box<dyn DnsProvider>,

    /// Target hosted zone
    zone_id: String,

    /// Target record name
    record_name: String,

    /// Target record type
    record_type: String,

    /// TTL applied on upsert
    ttl: i64,

    /// Live or dry-run
    mode: RunMode,

    /// Event sender for external observers
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields
    /// the events of each pass
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: ReconcileConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let reconciler = Self {
            ip_source,
            provider,
            zone_id: config.zone_id,
            record_name: config.domain_name,
            record_type: config.domain_type,
            ttl: config.domain_ttl,
            mode: config.mode,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome)`: The pass completed (including no-op passes)
    /// - `Err(Error)`: Listing or upsert failed; the pass was aborted
    pub async fn run(&self) -> Result<Outcome> {
        info!(
            "Pulling record sets for zone {} from {}",
            self.zone_id,
            self.provider.provider_name()
        );

        // RecordLookup
        let record_set = self
            .find_record_set(&self.zone_id, &self.record_name, &self.record_type)
            .await?;

        let existing = match record_set {
            Some(ref set) if set.values.is_empty() => {
                warn!(
                    "{} ({}) has no values (alias record set?); it will be replaced by a plain record on upsert",
                    self.record_name, self.record_type
                );
                None
            }
            Some(ref set) => Self::extract_value(set).map(str::to_string),
            None => {
                info!("No records found for {}", self.record_name);
                None
            }
        };

        self.emit_event(ReconcileEvent::RecordLookedUp {
            record_name: self.record_name.clone(),
            existing: existing.clone(),
        });

        // IpResolution
        let current = self.ip_source.resolve().await;
        debug!(
            "Public IP from {}: {}",
            self.ip_source.source_name(),
            display_value(current.as_deref())
        );
        self.emit_event(ReconcileEvent::IpResolved {
            ip: current.clone(),
        });

        // Decide
        let outcome = match decide(existing.as_deref(), current.as_deref()) {
            Decision::NoOp(reason) => {
                self.emit_event(ReconcileEvent::UpsertSkipped {
                    record_name: self.record_name.clone(),
                    reason: reason.into(),
                });

                match reason {
                    NoOpReason::Matched => {
                        info!("DNS for {} matches. No action taken.", self.record_name);
                        Outcome::Matched {
                            value: current.unwrap_or_default(),
                        }
                    }
                    NoOpReason::IpUnavailable => {
                        warn!(
                            "Could not determine current public IP; leaving {} ({}) untouched",
                            self.record_name,
                            display_value(existing.as_deref())
                        );
                        Outcome::IpUnavailable { existing }
                    }
                }
            }
            Decision::Upsert(value) => {
                info!(
                    "Current IP {} doesn't match {}. Updating...",
                    value,
                    display_value(existing.as_deref())
                );
                self.apply(existing, value).await?
            }
        };

        self.emit_event(ReconcileEvent::Finished {
            summary: format!("{}: {}", self.record_name, outcome),
        });

        Ok(outcome)
    }

    /// Submit the upsert, or log it in dry-run mode
    async fn apply(&self, previous: Option<String>, value: String) -> Result<Outcome> {
        if self.mode == RunMode::DryRun {
            let batch = upsert_batch(
                &self.record_name,
                &self.record_type,
                self.ttl,
                &value,
            );
            info!(
                "[DRY-RUN] Would submit change batch to zone {}: {}",
                self.zone_id,
                serde_json::to_string(&batch)?
            );
            self.emit_event(ReconcileEvent::UpsertSkipped {
                record_name: self.record_name.clone(),
                reason: SkipReason::DryRun,
            });
            return Ok(Outcome::DryRun {
                previous,
                current: value,
                batch,
            });
        }

        self.emit_event(ReconcileEvent::UpsertStarted {
            record_name: self.record_name.clone(),
            value: value.clone(),
        });

        let change = self
            .upsert(
                &self.zone_id,
                &self.record_name,
                &self.record_type,
                self.ttl,
                &value,
            )
            .await?;

        info!("Completed Request. Status is: {}", change);
        self.emit_event(ReconcileEvent::UpsertSucceeded {
            record_name: self.record_name.clone(),
            value: value.clone(),
            change: change.clone(),
        });

        Ok(Outcome::Updated {
            previous,
            current: value,
            change,
        })
    }

    /// List every record set the provider returns for a zone
    ///
    /// Only the provider's first page is visible.
    pub async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
        let record_sets = self.provider.list_record_sets(zone_id).await?;
        debug!("Zone {} returned {} record set(s)", zone_id, record_sets.len());
        Ok(record_sets)
    }

    /// Find the first record set whose name and type match exactly
    ///
    /// # Returns
    ///
    /// - `Ok(Some(RecordSet))`: First match in listing order
    /// - `Ok(None)`: No set matches both name and type
    /// - `Err(Error)`: The listing failed
    pub async fn find_record_set(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Option<RecordSet>> {
        let record_sets = self.list_record_sets(zone_id).await?;
        Ok(record_sets
            .into_iter()
            .find(|set| set.matches(name, record_type)))
    }

    /// Read the current value of a record set
    ///
    /// When the set holds several values the last one is returned. The set
    /// is not modified, so repeated calls return the same value.
    pub fn extract_value(record_set: &RecordSet) -> Option<&str> {
        record_set.last_value()
    }

    /// Replace the whole value list of a record set with a single value
    ///
    /// Provider errors are not handled here and abort the pass.
    pub async fn upsert(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
        ttl: i64,
        value: &str,
    ) -> Result<ChangeInfo> {
        let batch = upsert_batch(name, record_type, ttl, value);
        self.provider.change_record_sets(zone_id, &batch).await
    }

    fn emit_event(&self, event: ReconcileEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, event discarded");
            }
        }
    }
}

fn upsert_batch(name: &str, record_type: &str, ttl: i64, value: &str) -> ChangeBatch {
    ChangeBatch::upsert(RecordSet::single(name, record_type, ttl, value))
}

fn display_value(value: Option<&str>) -> &str {
    value.unwrap_or("<none>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_summary_lines() {
        let outcome = Outcome::IpUnavailable {
            existing: Some("1.2.3.4".to_string()),
        };
        assert_eq!(
            outcome.to_string(),
            "public IP unavailable, left 1.2.3.4 untouched"
        );
        assert!(!outcome.changed());

        let outcome = Outcome::Updated {
            previous: None,
            current: "9.9.9.9".to_string(),
            change: ChangeInfo {
                id: "C1".to_string(),
                status: "PENDING".to_string(),
                submitted_at: None,
                comment: None,
            },
        };
        assert_eq!(
            outcome.to_string(),
            "updated <none> -> 9.9.9.9 (Id: C1, Status: PENDING)"
        );
        assert!(outcome.changed());
    }

    #[test]
    fn decision_reasons_map_onto_skip_reasons() {
        assert_eq!(SkipReason::from(NoOpReason::Matched), SkipReason::Matched);
        assert_eq!(
            SkipReason::from(NoOpReason::IpUnavailable),
            SkipReason::IpUnavailable
        );
    }

    #[test]
    fn upsert_batch_holds_single_value() {
        let batch = upsert_batch("home.example.com.", "A", 60, "5.6.7.8");

        assert_eq!(batch.changes.len(), 1);
        let set = &batch.changes[0].record_set;
        assert_eq!(set.values, vec!["5.6.7.8".to_string()]);
        assert_eq!(set.ttl, Some(60));
    }
}
