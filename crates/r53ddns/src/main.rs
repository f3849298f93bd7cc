// # r53ddns
//
// Runs one reconciliation pass and exits. Meant to be invoked periodically
// by an external scheduler (systemd timer, cron).
//
// The binary is responsible for:
// 1. Loading configuration from the environment (and `./.env`)
// 2. Initializing logging
// 3. Wiring the Route53 provider and the HTTP IP source
// 4. Running the reconciler once
//
// ## Configuration
//
// - `ZONE_ID`: Route53 hosted zone id
// - `DOMAIN_NAME`: Record name as Route53 stores it (e.g. `home.example.com.`)
// - `DOMAIN_TYPE`: Record type (e.g. `A`)
// - `DOMAIN_TTL`: TTL in seconds, used on upsert
// - `IP_LOOKUP_URL`: Public IP service (default `https://ifconfig.me/ip`)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
// - `DDNS_MODE`: `live` or `dry-run`
//
// AWS credentials and region are resolved by the AWS SDK default chain.
//
// ## Example
//
// ```bash
// export ZONE_ID=Z0123456789ABCDEFGHIJ
// export DOMAIN_NAME=home.example.com.
// export DOMAIN_TYPE=A
// export DOMAIN_TTL=300
//
// r53ddns
// ```

use anyhow::Result;
use r53ddns_core::{ReconcileConfig, Reconciler};
use r53ddns_ip_http::HttpIpSource;
use r53ddns_provider_route53::Route53Provider;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Pass completed (whether or not a change was made)
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Provider failure during the pass
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let config = match ReconcileConfig::load(".env") {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stdout)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Loaded configuration for {} ({})", config.domain_name, config.domain_type);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    rt.block_on(async {
        match run_once(config).await {
            Ok(()) => DdnsExitCode::Success,
            Err(e) => {
                error!("Reconciliation failed: {:#}", e);
                DdnsExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Wire the components and run a single pass
async fn run_once(config: ReconcileConfig) -> Result<()> {
    info!("Connecting to AWS and pulling records");
    let provider = Route53Provider::from_env().await;
    let ip_source = HttpIpSource::new(config.ip_lookup_url.clone());

    // Receiver stays alive for the whole pass; events are also logged by the reconciler.
    let (reconciler, _events) =
        Reconciler::new(Box::new(ip_source), Box::new(provider), config)?;

    let outcome = reconciler.run().await?;
    info!("Pass finished: {}", outcome);

    Ok(())
}
