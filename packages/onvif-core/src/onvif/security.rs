//! WS-Security UsernameToken authentication (password digest profile).
//!
//! ONVIF devices authenticate SOAP calls with a `wsse:UsernameToken` whose
//! password is `Base64(SHA-1(nonce + created + password))`. The clear
//! password never leaves the process.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha1::{Digest, Sha1};

use crate::protocol_constants::{
    SOAP_ENVELOPE_PREFIX, WSSE_BASE64_BINARY, WSSE_NONCE_LEN, WSSE_NS, WSSE_PASSWORD_DIGEST,
    WSU_NS,
};

/// Username and password for a device.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds credentials only when both parts are non-empty.
    ///
    /// A half-configured pair means "no authentication".
    pub fn from_parts(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some(Self::new(u, p)),
            _ => None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// True when both username and password are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Computes the UsernameToken password digest.
#[must_use]
pub fn password_digest(nonce: &[u8], created: &str, password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(nonce);
    hasher.update(created.as_bytes());
    hasher.update(password.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// A single-use UsernameToken, ready to render into a `wsse:Security` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameToken {
    username: String,
    digest: String,
    nonce: String,
    created: String,
}

impl UsernameToken {
    /// Creates a token with a fresh random nonce and the current UTC time.
    pub fn generate(credentials: &Credentials) -> Self {
        let nonce = rand::random::<[u8; WSSE_NONCE_LEN]>();
        let created = chrono::Utc::now()
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        Self::with_parts(credentials, nonce.to_vec(), created)
    }

    /// Creates a token from an explicit nonce and timestamp.
    pub fn with_parts(credentials: &Credentials, nonce: Vec<u8>, created: String) -> Self {
        Self {
            username: credentials.username.clone(),
            digest: password_digest(&nonce, &created, &credentials.password),
            nonce: BASE64.encode(&nonce),
            created,
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn created(&self) -> &str {
        &self.created
    }

    /// Renders the `wsse:Security` header element.
    pub fn to_security_header(&self) -> String {
        format!(
            concat!(
                r#"<wsse:Security {env}:mustUnderstand="1" xmlns:wsse="{wsse}" xmlns:wsu="{wsu}">"#,
                "<wsse:UsernameToken>",
                "<wsse:Username>{username}</wsse:Username>",
                r#"<wsse:Password Type="{digest_type}">{digest}</wsse:Password>"#,
                r#"<wsse:Nonce EncodingType="{encoding}">{nonce}</wsse:Nonce>"#,
                "<wsu:Created>{created}</wsu:Created>",
                "</wsse:UsernameToken>",
                "</wsse:Security>"
            ),
            env = SOAP_ENVELOPE_PREFIX,
            wsse = WSSE_NS,
            wsu = WSU_NS,
            username = html_escape::encode_text(&self.username),
            digest_type = WSSE_PASSWORD_DIGEST,
            digest = self.digest,
            encoding = WSSE_BASE64_BINARY,
            nonce = self.nonce,
            created = self.created,
        )
    }
}
