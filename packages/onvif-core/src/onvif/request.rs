//! Boundary between typed request payloads and the dispatcher.

use quick_xml::SeError;
use serde::Serialize;

use super::services::OnvifService;

/// A request payload that can be dispatched to a device.
///
/// The target service is a compile-time tag: the dispatcher never inspects
/// the payload to decide where it goes. Payloads serialize (via quick-xml's
/// serde serializer) to a single root element whose namespace prefixes come
/// from [`ONVIF_NAMESPACES`](crate::protocol_constants::ONVIF_NAMESPACES).
///
/// # Example
/// ```ignore
/// #[derive(Serialize)]
/// #[serde(rename = "tptz:GetStatus")]
/// struct GetStatus {
///     #[serde(rename = "tptz:ProfileToken")]
///     profile_token: String,
/// }
///
/// impl OnvifRequest for GetStatus {
///     const SERVICE: OnvifService = OnvifService::Ptz;
///     const OPERATION: &'static str = "GetStatus";
/// }
/// ```
pub trait OnvifRequest: Serialize + Send + Sync {
    const SERVICE: OnvifService;
    const OPERATION: &'static str;

    /// Serializes the payload to XML.
    fn to_xml(&self) -> Result<String, SeError> {
        quick_xml::se::to_string(self)
    }
}

/// Serializes a fieldless enum as its wire string.
macro_rules! wire_enum {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use wire_enum;
