//! Probe tool configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use onvif_core::{Credentials, DeviceType, ProbeConfig, ProbeFilter, TransportProtocol};
use serde::Deserialize;

/// Probe tool configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProbeToolConfig {
    /// Network interface (name or IPv4 address) to probe on.
    /// Override: `ONVIF_INTERFACE`
    pub interface: Option<String>,

    /// Explicit device addresses (`host[:port]`). When set, no probe is sent.
    /// Override: `ONVIF_XADDRS` (comma separated)
    pub xaddrs: Vec<String>,

    /// Override: `ONVIF_USERNAME`
    pub username: Option<String>,

    /// Override: `ONVIF_PASSWORD`
    pub password: Option<String>,

    /// How long to collect probe replies, in milliseconds.
    /// Override: `ONVIF_PROBE_WINDOW_MS`
    pub probe_window_ms: u64,

    /// Device type to probe for: `nvt`, `nvd`, `nvs` or `nva`.
    pub device_type: String,

    /// Scope URIs devices must match.
    pub scopes: Vec<String>,

    /// Call `GetDeviceInformation` on every device.
    pub device_info: bool,

    /// Media profile token to request a stream URI for.
    pub stream_profile: Option<String>,

    /// Transport protocol for the stream URI request.
    pub stream_protocol: String,
}

impl Default for ProbeToolConfig {
    fn default() -> Self {
        Self {
            interface: None,
            xaddrs: Vec::new(),
            username: None,
            password: None,
            probe_window_ms: onvif_core::protocol_constants::DEFAULT_PROBE_WINDOW_MS,
            device_type: "nvt".to_string(),
            scopes: Vec::new(),
            device_info: false,
            stream_profile: None,
            stream_protocol: "RTSP".to_string(),
        }
    }
}

impl ProbeToolConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies `ONVIF_*` overrides looked up through `var`.
    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("ONVIF_INTERFACE") {
            self.interface = Some(val);
        }

        if let Some(val) = var("ONVIF_XADDRS") {
            self.xaddrs = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(val) = var("ONVIF_USERNAME") {
            self.username = Some(val);
        }

        if let Some(val) = var("ONVIF_PASSWORD") {
            self.password = Some(val);
        }

        if let Some(val) = var("ONVIF_PROBE_WINDOW_MS") {
            match val.parse() {
                Ok(ms) => self.probe_window_ms = ms,
                Err(_) => log::warn!("Ignoring invalid ONVIF_PROBE_WINDOW_MS: {}", val),
            }
        }
    }

    /// Credentials, if both username and password are set.
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::from_parts(self.username.as_deref(), self.password.as_deref())
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            window: Duration::from_millis(self.probe_window_ms),
        }
    }

    pub fn probe_filter(&self) -> Result<ProbeFilter> {
        let device_type = match self.device_type.to_ascii_lowercase().as_str() {
            "nvt" => DeviceType::Nvt,
            "nvd" => DeviceType::Nvd,
            "nvs" => DeviceType::Nvs,
            "nva" => DeviceType::Nva,
            other => bail!("Unknown device type: {other} (expected nvt, nvd, nvs or nva)"),
        };
        let mut filter = ProbeFilter::for_device_type(device_type);
        filter.scopes.extend(self.scopes.iter().cloned());
        Ok(filter)
    }

    pub fn stream_protocol(&self) -> Result<TransportProtocol> {
        self.stream_protocol
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
    }
}
