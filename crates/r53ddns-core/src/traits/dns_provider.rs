// # DNS Provider Trait
//
// Defines the capability the reconciler needs from a managed DNS service:
// list the record sets of a zone, and submit a change batch against it.
//
// ## Implementations
//
// - Route53: `r53ddns-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use r53ddns_core::traits::{ChangeBatch, DnsProvider, RecordSet};
//
// let sets = provider.list_record_sets("Z123").await?;
// let batch = ChangeBatch::upsert(RecordSet::single("home.example.com.", "A", 300, "1.2.3.4"));
// let info = provider.change_record_sets("Z123", &batch).await?;
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named, typed group of DNS values sharing a TTL
///
/// Addressed within a zone by its `(name, record_type)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Fully-qualified name exactly as the provider stores it
    #[serde(rename = "Name")]
    pub name: String,

    /// Record type, e.g. "A"
    #[serde(rename = "Type")]
    pub record_type: String,

    /// Time-to-live in seconds (absent on alias record sets)
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,

    /// Record values, in provider order
    #[serde(rename = "ResourceRecords", with = "resource_records")]
    pub values: Vec<String>,
}

impl RecordSet {
    /// Create a record set holding exactly one value
    pub fn single(
        name: impl Into<String>,
        record_type: impl Into<String>,
        ttl: i64,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            ttl: Some(ttl),
            values: vec![value.into()],
        }
    }

    /// Whether this set is addressed by the given `(name, type)` pair
    ///
    /// Comparison is exact and case-sensitive.
    pub fn matches(&self, name: &str, record_type: &str) -> bool {
        self.name == name && self.record_type == record_type
    }

    /// The last value of the set, without touching the value list
    ///
    /// Returns `None` for sets with no values (alias records).
    pub fn last_value(&self) -> Option<&str> {
        self.values.last().map(String::as_str)
    }
}

/// Change action understood by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    /// Create a record set that must not exist yet
    Create,
    /// Delete an existing record set
    Delete,
    /// Create the record set, or replace its whole value list
    Upsert,
}

/// A single action applied to a record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    #[serde(rename = "Action")]
    pub action: ChangeAction,

    #[serde(rename = "ResourceRecordSet")]
    pub record_set: RecordSet,
}

/// A batch of changes submitted in one provider call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch {
    #[serde(rename = "Changes")]
    pub changes: Vec<Change>,
}

impl ChangeBatch {
    /// A batch holding a single upsert of `record_set`
    pub fn upsert(record_set: RecordSet) -> Self {
        Self {
            changes: vec![Change {
                action: ChangeAction::Upsert,
                record_set,
            }],
        }
    }
}

/// Status metadata the provider returns for a submitted change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeInfo {
    /// Provider-assigned change id
    pub id: String,
    /// Status token, e.g. "PENDING" or "INSYNC"
    pub status: String,
    /// Submission timestamp as reported by the provider
    pub submitted_at: Option<String>,
    /// Optional comment echoed back by the provider
    pub comment: Option<String>,
}

impl fmt::Display for ChangeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id: {}, Status: {}", self.id, self.status)?;
        if let Some(ref submitted_at) = self.submitted_at {
            write!(f, ", SubmittedAt: {}", submitted_at)?;
        }
        if let Some(ref comment) = self.comment {
            write!(f, ", Comment: {}", comment)?;
        }
        Ok(())
    }
}

/// Trait for DNS provider implementations
///
/// Providers are single-shot: one call maps to one API request, with no
/// retries, caching or decisions about whether an update is needed. Errors
/// are returned as-is and abort the run.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List the record sets of a zone
    ///
    /// Only the provider's default first page is returned. Record sets
    /// beyond it are not visible to the caller.
    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>, crate::Error>;

    /// Submit a change batch against a zone
    ///
    /// # Returns
    ///
    /// - `Ok(ChangeInfo)`: The provider accepted the batch
    /// - `Err(Error)`: Rejected, unauthorized, throttled or unreachable
    async fn change_record_sets(
        &self,
        zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<ChangeInfo, crate::Error>;

    /// Get the provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Serializes `values` as `[{"Value": ...}]`, the provider's wire shape.
mod resource_records {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct ResourceRecord {
        #[serde(rename = "Value")]
        value: String,
    }

    pub fn serialize<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        let records: Vec<ResourceRecord> = values
            .iter()
            .map(|value| ResourceRecord {
                value: value.clone(),
            })
            .collect();
        records.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let records = Vec::<ResourceRecord>::deserialize(deserializer)?;
        Ok(records.into_iter().map(|r| r.value).collect())
    }
}
