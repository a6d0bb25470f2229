//! ONVIF Probe - headless discovery and endpoint inspection for ONVIF cameras.
//!
//! Either probes a network interface with WS-Discovery or connects to
//! explicit device addresses, then prints every device's service endpoints
//! (and optionally its identity and a stream URI).

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use onvif_core::{
    Device, DeviceInfo, DeviceParams, EndpointDiagnostic, ErrorCode, HttpSoapTransport, MediaUri,
    OnvifError, Prober, SoapTransport,
};
use serde::Serialize;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::config::ProbeToolConfig;

/// ONVIF Probe - find ONVIF cameras and inspect their service endpoints.
#[derive(Parser, Debug)]
#[command(name = "onvif-probe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "ONVIF_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Network interface to probe (overrides config file).
    #[arg(short, long)]
    interface: Option<String>,

    /// Device address host[:port]; repeat for several (skips probing).
    #[arg(short = 'x', long = "xaddr")]
    xaddrs: Vec<String>,

    #[arg(short, long)]
    username: Option<String>,

    #[arg(short, long)]
    password: Option<String>,

    /// Probe reply window in milliseconds (overrides config file).
    #[arg(short, long)]
    window_ms: Option<u64>,

    /// Fetch manufacturer/model/firmware for every device.
    #[arg(long)]
    device_info: bool,

    /// Media profile token to request a stream URI for.
    #[arg(long)]
    stream_profile: Option<String>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

/// Everything learned about one device.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviceReport {
    xaddr: String,
    endpoints: Vec<EndpointDiagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<DeviceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_uri: Option<MediaUri>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

/// A device that could not be reached or a reply that could not be used.
#[derive(Debug, Serialize)]
struct FailureReport {
    target: String,
    code: &'static str,
    message: String,
}

impl FailureReport {
    fn new(target: String, error: &OnvifError) -> Self {
        Self {
            target,
            code: error.code(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct Report {
    devices: Vec<DeviceReport>,
    failures: Vec<FailureReport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("ONVIF Probe v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ProbeToolConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(interface) = args.interface {
        config.interface = Some(interface);
    }
    if !args.xaddrs.is_empty() {
        config.xaddrs = args.xaddrs;
    }
    if let Some(username) = args.username {
        config.username = Some(username);
    }
    if let Some(password) = args.password {
        config.password = Some(password);
    }
    if let Some(window_ms) = args.window_ms {
        config.probe_window_ms = window_ms;
    }
    if args.device_info {
        config.device_info = true;
    }
    if let Some(profile) = args.stream_profile {
        config.stream_profile = Some(profile);
    }

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let transport: Arc<dyn SoapTransport> =
        HttpSoapTransport::shared().context("Failed to create HTTP client")?;

    let mut report = Report::default();
    let devices = if !config.xaddrs.is_empty() {
        log::info!("Connecting to {} configured device(s)", config.xaddrs.len());
        connect_all(&config, transport, &cancel, &mut report).await?
    } else if let Some(interface) = config.interface.as_deref() {
        let filter = config.probe_filter()?;
        let outcome = Prober::new(config.probe_config())
            .credentials(config.credentials())
            .soap_transport(transport)
            .probe_cancellable(interface, &filter, &cancel)
            .await
            .with_context(|| format!("Probe on {interface} failed"))?;
        report.failures.extend(
            outcome
                .failures
                .iter()
                .map(|f| FailureReport::new(f.target.clone(), &f.error)),
        );
        outcome.devices
    } else {
        bail!("Nothing to do: set --interface to probe or --xaddr to connect directly");
    };

    for device in &devices {
        report.devices.push(inspect(device, &config).await?);
    }

    print_report(&report, args.json)?;
    Ok(())
}

/// Connects to every configured address, recording failures.
async fn connect_all(
    config: &ProbeToolConfig,
    transport: Arc<dyn SoapTransport>,
    cancel: &CancellationToken,
    report: &mut Report,
) -> Result<Vec<Device>> {
    let mut devices = Vec::new();
    for xaddr in &config.xaddrs {
        let params = DeviceParams::new(xaddr.clone())
            .with_credentials(config.credentials())
            .with_transport(Arc::clone(&transport));
        match Device::new_cancellable(params, cancel).await {
            Ok(device) => devices.push(device),
            Err(e) if e.is_cancelled() => return Err(e).context("Interrupted"),
            Err(e) => {
                log::warn!("Could not connect to {}: {}", xaddr, e);
                report.failures.push(FailureReport::new(xaddr.clone(), &e));
            }
        }
    }
    Ok(devices)
}

/// Runs the optional per-device calls. Call failures are kept in the report.
async fn inspect(device: &Device, config: &ProbeToolConfig) -> Result<DeviceReport> {
    let mut report = DeviceReport {
        xaddr: device.xaddr().to_string(),
        endpoints: device.debug_endpoints(),
        info: None,
        stream_uri: None,
        errors: Vec::new(),
    };

    if config.device_info {
        match device.fetch_device_info().await {
            Ok(info) => report.info = Some(info),
            Err(e) => report.errors.push(format!("GetDeviceInformation: {e}")),
        }
    }

    if let Some(profile) = config.stream_profile.as_deref() {
        match device.get_stream_uri(profile, config.stream_protocol()?).await {
            Ok(uri) => report.stream_uri = Some(uri),
            Err(e) => report.errors.push(format!("GetStreamUri: {e}")),
        }
    }

    Ok(report)
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialize report")?
        );
        return Ok(());
    }

    if report.devices.is_empty() {
        println!("No devices found.");
    }
    for device in &report.devices {
        println!("{}", device.xaddr);
        if let Some(info) = &device.info {
            println!(
                "  {} {} (firmware {}, serial {})",
                info.manufacturer, info.model, info.firmware_version, info.serial_number
            );
        }
        for entry in &device.endpoints {
            let status = format!("{:?}", entry.status);
            println!("  {:<12} {:<12} {}", entry.service, status, entry.endpoint);
        }
        if let Some(uri) = &device.stream_uri {
            println!("  stream       {}", uri.uri);
        }
        for error in &device.errors {
            println!("  error        {}", error);
        }
    }
    for failure in &report.failures {
        println!("failed {} [{}]: {}", failure.target, failure.code, failure.message);
    }
    Ok(())
}

/// Cancels in-flight work on Ctrl+C.
async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if let Err(e) = signal::ctrl_c().await {
        log::warn!("Failed to install Ctrl+C handler: {}", e);
        return;
    }
    log::info!("Interrupted, cancelling...");
    cancel.cancel();
}
