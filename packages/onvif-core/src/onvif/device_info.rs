//! `GetDeviceInformation`: manufacturer, model and firmware details.

use serde::Serialize;

use super::request::OnvifRequest;
use super::services::OnvifService;
use super::soap::{HttpReply, SoapError, SoapResult};
use super::xml::text_nodes;

/// `tds:GetDeviceInformation` request (no arguments).
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename = "tds:GetDeviceInformation")]
pub struct GetDeviceInformation {}

impl OnvifRequest for GetDeviceInformation {
    const SERVICE: OnvifService = OnvifService::Device;
    const OPERATION: &'static str = "GetDeviceInformation";
}

/// Identity of a device as reported by `GetDeviceInformation`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub firmware_version: String,
    pub serial_number: String,
    pub hardware_id: String,
}

impl DeviceInfo {
    /// Decodes a `GetDeviceInformationResponse`.
    ///
    /// Missing fields are left empty; a reply without the response element
    /// at all is a parse error.
    pub fn from_reply(reply: &HttpReply) -> SoapResult<Self> {
        let nodes = text_nodes(&reply.body)?;
        let mut info = DeviceInfo::default();
        let mut found = false;

        for node in nodes {
            if node.parent() != Some("GetDeviceInformationResponse") {
                continue;
            }
            found = true;
            let field = match node.name() {
                "Manufacturer" => &mut info.manufacturer,
                "Model" => &mut info.model,
                "FirmwareVersion" => &mut info.firmware_version,
                "SerialNumber" => &mut info.serial_number,
                "HardwareId" => &mut info.hardware_id,
                _ => continue,
            };
            field.clone_from(&node.text);
        }

        if !found {
            return Err(SoapError::Parse(
                "reply has no GetDeviceInformationResponse".into(),
            ));
        }
        Ok(info)
    }
}
