//! Test doubles and common utilities for reconciler contract tests
//!
//! The doubles share their counters through `Arc`s so a test can hand one
//! copy to the reconciler and keep another for assertions.

#![allow(dead_code)]

use r53ddns_core::config::ReconcileConfig;
use r53ddns_core::error::{Error, Result};
use r53ddns_core::reconciler::ReconcileEvent;
use r53ddns_core::traits::{ChangeBatch, ChangeInfo, DnsProvider, IpSource, RecordSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Zone id used by every test
pub const TEST_ZONE: &str = "ZTESTZONE";

/// Record name used by every test
pub const TEST_RECORD: &str = "home.example.com.";

/// How the fake provider should behave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailure {
    None,
    Listing,
    Change,
}

/// A fake DnsProvider serving a fixed listing and recording submitted batches
pub struct FakeDnsProvider {
    record_sets: Arc<Vec<RecordSet>>,
    failure: ProviderFailure,
    list_call_count: Arc<AtomicUsize>,
    submitted: Arc<Mutex<Vec<(String, ChangeBatch)>>>,
}

impl FakeDnsProvider {
    pub fn new(record_sets: Vec<RecordSet>) -> Self {
        Self {
            record_sets: Arc::new(record_sets),
            failure: ProviderFailure::None,
            list_call_count: Arc::new(AtomicUsize::new(0)),
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(mut self, failure: ProviderFailure) -> Self {
        self.failure = failure;
        self
    }

    /// Create a FakeDnsProvider that shares listing and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            record_sets: Arc::clone(&other.record_sets),
            failure: other.failure,
            list_call_count: Arc::clone(&other.list_call_count),
            submitted: Arc::clone(&other.submitted),
        }
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Number of change_record_sets() calls that reached the provider
    pub fn change_call_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }

    pub fn submitted(&self) -> Vec<(String, ChangeBatch)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for FakeDnsProvider {
    async fn list_record_sets(&self, _zone_id: &str) -> Result<Vec<RecordSet>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if self.failure == ProviderFailure::Listing {
            return Err(Error::auth("The security token included in the request is invalid"));
        }
        Ok(self.record_sets.as_ref().clone())
    }

    async fn change_record_sets(&self, zone_id: &str, batch: &ChangeBatch) -> Result<ChangeInfo> {
        self.submitted
            .lock()
            .unwrap()
            .push((zone_id.to_string(), batch.clone()));

        if self.failure == ProviderFailure::Change {
            return Err(Error::rate_limited("Rate exceeded"));
        }

        Ok(ChangeInfo {
            id: "/change/CFAKE".to_string(),
            status: "PENDING".to_string(),
            submitted_at: Some("2024-01-01T00:00:00Z".to_string()),
            comment: None,
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

/// An IpSource that always resolves to the same answer
pub struct FixedIpSource {
    ip: Option<String>,
    resolve_call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: Option<&str>) -> Self {
        Self {
            ip: ip.map(str::to_string),
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            ip: other.ip.clone(),
            resolve_call_count: Arc::clone(&other.resolve_call_count),
        }
    }

    pub fn resolve_call_count(&self) -> usize {
        self.resolve_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn resolve(&self) -> Option<String> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);
        self.ip.clone()
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

/// An A record set for the test record
pub fn a_record(values: &[&str]) -> RecordSet {
    RecordSet {
        name: TEST_RECORD.to_string(),
        record_type: "A".to_string(),
        ttl: Some(300),
        values: values.iter().map(|v| v.to_string()).collect(),
    }
}

/// Helper to create a minimal ReconcileConfig for testing
pub fn minimal_config(ttl: i64) -> ReconcileConfig {
    ReconcileConfig::new(TEST_ZONE, TEST_RECORD, "A", ttl)
}

/// Collect every event currently queued
pub fn drain_events(rx: &mut mpsc::Receiver<ReconcileEvent>) -> Vec<ReconcileEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
