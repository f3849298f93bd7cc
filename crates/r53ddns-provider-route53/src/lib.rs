// # Route53 DNS Provider
//
// This crate provides an AWS Route53 implementation of `DnsProvider`.
//
// - One SDK request per trait call, errors returned as-is (no retry, no backoff)
// - Listing returns the first page only (up to 300 record sets by default)
// - Credentials and region come from the AWS default provider chain
//   (environment, shared config/credentials files, SSO, instance metadata)
//
// ## API Reference
//
// - ListResourceRecordSets: GET `/2013-04-01/hostedzone/{Id}/rrset`
// - ChangeResourceRecordSets: POST `/2013-04-01/hostedzone/{Id}/rrset`

use async_trait::async_trait;
use aws_sdk_route53::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_route53::primitives::DateTimeFormat;
use aws_sdk_route53::types as sdk;
use r53ddns_core::traits::{ChangeAction, ChangeBatch, ChangeInfo, DnsProvider, RecordSet};
use r53ddns_core::{Error, Result};

const PROVIDER_NAME: &str = "route53";

/// AWS Route53 DNS provider
#[derive(Debug, Clone)]
pub struct Route53Provider {
    client: aws_sdk_route53::Client,
}

impl Route53Provider {
    /// Wrap an already configured SDK client
    pub fn new(client: aws_sdk_route53::Client) -> Self {
        Self { client }
    }

    /// Build a client from the AWS default credential and region chain
    pub async fn from_env() -> Self {
        let config = config_loader().load().await;
        Self::new(aws_sdk_route53::Client::new(&config))
    }
}

/// SDK config loader with the SDK's own retries turned off
///
/// A failed request aborts the pass; the next scheduled run is the retry.
fn config_loader() -> aws_config::ConfigLoader {
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .retry_config(aws_config::retry::RetryConfig::disabled())
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn list_record_sets(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
        tracing::debug!("Listing record sets for hosted zone {}", zone_id);

        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone_id)
            .send()
            .await
            .map_err(|e| map_sdk_error("ListResourceRecordSets", e))?;

        if output.is_truncated() {
            tracing::warn!(
                "Record set listing for zone {} is truncated; record sets after {} are not visible",
                zone_id,
                output.next_record_name().unwrap_or("the first page")
            );
        }

        Ok(output
            .resource_record_sets()
            .iter()
            .map(record_set_from_sdk)
            .collect())
    }

    async fn change_record_sets(&self, zone_id: &str, batch: &ChangeBatch) -> Result<ChangeInfo> {
        let sdk_batch = change_batch_to_sdk(batch)?;

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(sdk_batch)
            .send()
            .await
            .map_err(|e| map_sdk_error("ChangeResourceRecordSets", e))?;

        let info = output
            .change_info()
            .ok_or_else(|| Error::dns_provider("ChangeResourceRecordSets returned no ChangeInfo"))?;

        Ok(change_info_from_sdk(info))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Convert an SDK record set; alias record sets get an empty value list
fn record_set_from_sdk(set: &sdk::ResourceRecordSet) -> RecordSet {
    RecordSet {
        name: set.name().to_string(),
        record_type: set.r#type().as_str().to_string(),
        ttl: set.ttl(),
        values: set
            .resource_records()
            .iter()
            .map(|record| record.value().to_string())
            .collect(),
    }
}

fn change_batch_to_sdk(batch: &ChangeBatch) -> Result<sdk::ChangeBatch> {
    let changes = batch
        .changes
        .iter()
        .map(|change| {
            let set = &change.record_set;

            let records = set
                .values
                .iter()
                .map(|value| sdk::ResourceRecord::builder().value(value).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(build_error)?;

            let record_set = sdk::ResourceRecordSet::builder()
                .name(&set.name)
                .r#type(sdk::RrType::from(set.record_type.as_str()))
                .set_ttl(set.ttl)
                .set_resource_records(Some(records))
                .build()
                .map_err(build_error)?;

            sdk::Change::builder()
                .action(change_action_to_sdk(change.action))
                .resource_record_set(record_set)
                .build()
                .map_err(build_error)
        })
        .collect::<Result<Vec<_>>>()?;

    sdk::ChangeBatch::builder()
        .set_changes(Some(changes))
        .build()
        .map_err(build_error)
}

fn change_action_to_sdk(action: ChangeAction) -> sdk::ChangeAction {
    match action {
        ChangeAction::Create => sdk::ChangeAction::Create,
        ChangeAction::Delete => sdk::ChangeAction::Delete,
        ChangeAction::Upsert => sdk::ChangeAction::Upsert,
    }
}

fn change_info_from_sdk(info: &sdk::ChangeInfo) -> ChangeInfo {
    ChangeInfo {
        id: info.id().to_string(),
        status: info.status().as_str().to_string(),
        submitted_at: info.submitted_at().fmt(DateTimeFormat::DateTime).ok(),
        comment: info.comment().map(str::to_string),
    }
}

fn build_error(err: aws_sdk_route53::error::BuildError) -> Error {
    Error::invalid_input(format!("Malformed change batch: {}", err))
}

fn map_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let transport = matches!(
        err,
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_)
    );
    let code = err.code().map(str::to_string);
    let message = format!("{} failed: {}", operation, DisplayErrorContext(&err));

    if transport && code.is_none() {
        return Error::http(message);
    }
    classify_error(code.as_deref(), message)
}

/// Map a Route53 error code onto the core error taxonomy
fn classify_error(code: Option<&str>, message: String) -> Error {
    match code {
        Some(
            "AccessDenied"
            | "AccessDeniedException"
            | "InvalidClientTokenId"
            | "SignatureDoesNotMatch"
            | "ExpiredToken"
            | "UnrecognizedClientException",
        ) => Error::auth(message),
        Some("Throttling" | "ThrottlingException" | "PriorRequestNotComplete") => {
            Error::rate_limited(message)
        }
        Some("NoSuchHostedZone") => Error::not_found(message),
        Some("InvalidChangeBatch" | "InvalidInput") => Error::invalid_input(message),
        _ => Error::provider(PROVIDER_NAME, message),
    }
}
