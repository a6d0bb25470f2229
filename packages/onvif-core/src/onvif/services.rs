//! ONVIF service definitions.
//!
//! Single source of truth for the service categories a request can target,
//! the registry key each one resolves through and the WSDL namespace used to
//! build its SOAP action.

use serde::Serialize;

/// ONVIF services a request can be addressed to.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OnvifService {
    /// Device management (capabilities, information, system).
    Device,
    /// Media profiles and stream/snapshot URIs.
    Media,
    /// Event subscriptions and pull points.
    Event,
    /// Pan/tilt/zoom control.
    Ptz,
    /// Imaging settings (focus, exposure, ...).
    Imaging,
    /// Video analytics modules and rules.
    Analytics,
    /// Device IO (relays, digital inputs).
    DeviceIo,
    /// Recording control.
    Recording,
    /// Recording search.
    Search,
    /// Recording replay.
    Replay,
}

impl OnvifService {
    /// Returns the endpoint registry key used to resolve this service.
    ///
    /// Keys are matched exactly first, then by substring, so `event` also
    /// resolves through an `events` capability block.
    #[must_use]
    pub fn registry_key(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Media => "media",
            Self::Event => "event",
            Self::Ptz => "ptz",
            Self::Imaging => "imaging",
            Self::Analytics => "analytics",
            Self::DeviceIo => "deviceio",
            Self::Recording => "recording",
            Self::Search => "search",
            Self::Replay => "replay",
        }
    }

    /// Returns the WSDL namespace the service's operations live in.
    #[must_use]
    pub fn wsdl_namespace(&self) -> &'static str {
        match self {
            Self::Device => "http://www.onvif.org/ver10/device/wsdl",
            Self::Media => "http://www.onvif.org/ver10/media/wsdl",
            Self::Event => "http://www.onvif.org/ver10/events/wsdl",
            Self::Ptz => "http://www.onvif.org/ver20/ptz/wsdl",
            Self::Imaging => "http://www.onvif.org/ver20/imaging/wsdl",
            Self::Analytics => "http://www.onvif.org/ver20/analytics/wsdl",
            Self::DeviceIo => "http://www.onvif.org/ver10/deviceIO/wsdl",
            Self::Recording => "http://www.onvif.org/ver10/recording/wsdl",
            Self::Search => "http://www.onvif.org/ver10/search/wsdl",
            Self::Replay => "http://www.onvif.org/ver10/replay/wsdl",
        }
    }

    /// Returns a human-readable name for this service.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Device => "Device",
            Self::Media => "Media",
            Self::Event => "Event",
            Self::Ptz => "PTZ",
            Self::Imaging => "Imaging",
            Self::Analytics => "Analytics",
            Self::DeviceIo => "DeviceIO",
            Self::Recording => "Recording",
            Self::Search => "Search",
            Self::Replay => "Replay",
        }
    }
}

impl std::fmt::Display for OnvifService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// ONVIF device types advertised in WS-Discovery `Types`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum DeviceType {
    /// Network video display.
    Nvd,
    /// Network video storage.
    Nvs,
    /// Network video analytics.
    Nva,
    /// Network video transmitter (cameras, encoders).
    Nvt,
}

impl DeviceType {
    /// Returns the WS-Discovery type name, e.g. `NetworkVideoTransmitter`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nvd => "NetworkVideoDisplay",
            Self::Nvs => "NetworkVideoStorage",
            Self::Nva => "NetworkVideoAnalytics",
            Self::Nvt => "NetworkVideoTransmitter",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}
