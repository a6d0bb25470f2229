//! Capability discovery (`GetCapabilities`).
//!
//! The device management service reports one block per supported service,
//! each with an `XAddr`. Blocks appear either directly under `Capabilities`
//! or under `Capabilities/Extension` (DeviceIO, Recording, ...).

use serde::Serialize;

use super::address::normalize;
use super::request::{wire_enum, OnvifRequest};
use super::services::OnvifService;
use super::soap::SoapResult;
use super::xml::text_nodes;

/// Capability category requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityCategory {
    #[default]
    All,
    Analytics,
    Device,
    Events,
    Imaging,
    Media,
    Ptz,
}

impl CapabilityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Analytics => "Analytics",
            Self::Device => "Device",
            Self::Events => "Events",
            Self::Imaging => "Imaging",
            Self::Media => "Media",
            Self::Ptz => "PTZ",
        }
    }
}

wire_enum!(CapabilityCategory);

/// `tds:GetCapabilities` request.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename = "tds:GetCapabilities")]
pub struct GetCapabilities {
    #[serde(rename = "tds:Category")]
    pub category: CapabilityCategory,
}

impl GetCapabilities {
    #[must_use]
    pub fn all() -> Self {
        Self {
            category: CapabilityCategory::All,
        }
    }
}

impl OnvifRequest for GetCapabilities {
    const SERVICE: OnvifService = OnvifService::Device;
    const OPERATION: &'static str = "GetCapabilities";
}

/// One service block from a capability response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityBlock {
    /// Element local name as sent by the device, e.g. `Media`.
    pub name: String,
    pub xaddr: String,
    /// True if the block sat under `Capabilities/Extension`.
    pub extension: bool,
}

/// Parsed `GetCapabilitiesResponse`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    blocks: Vec<CapabilityBlock>,
}

impl Capabilities {
    /// Parses a `GetCapabilitiesResponse` body.
    ///
    /// Namespace prefixes are ignored. Blocks without an `XAddr` are skipped,
    /// as is an `XAddr` placed directly on `Extension`.
    ///
    /// # Errors
    /// Returns `SoapError::Parse` if the body is not well-formed XML.
    pub fn parse(xml: &str) -> SoapResult<Self> {
        let mut blocks = Vec::new();

        for node in text_nodes(xml)? {
            if node.name() != "XAddr" {
                continue;
            }
            let Some(root) = node
                .path
                .windows(2)
                .position(|w| w[0] == "GetCapabilitiesResponse" && w[1] == "Capabilities")
            else {
                continue;
            };

            let relative = &node.path[root + 2..];
            let block = match relative {
                [name, _] if name != "Extension" => (name, false),
                [ext, name, _] if ext == "Extension" => (name, true),
                _ => continue,
            };

            blocks.push(CapabilityBlock {
                name: block.0.clone(),
                xaddr: node.text,
                extension: block.1,
            });
        }

        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[CapabilityBlock] {
        &self.blocks
    }

    /// Returns the address of the named block (case-insensitive).
    pub fn xaddr(&self, name: &str) -> Option<&str> {
        self.blocks
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
            .map(|b| b.xaddr.as_str())
    }

    /// Rewrites placeholder hosts in every block address.
    pub fn fix_endpoint_addresses(&mut self, base_address: &str) {
        for block in &mut self.blocks {
            block.xaddr = normalize(&block.xaddr, base_address);
        }
    }

    /// Yields `(name, xaddr)` pairs for the endpoint registry.
    pub fn into_endpoints(self) -> impl Iterator<Item = (String, String)> {
        self.blocks.into_iter().map(|b| (b.name, b.xaddr))
    }
}
