// Public IP lookup via a third-party echo service.
//
// Unauthenticated, single attempt. Callers decide whether to retry.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, preview};
use crate::transport::TransportConfig;

/// Default echo endpoint.
pub const IPIFY_URL: &str = "https://api.ipify.org?format=json";

#[derive(Deserialize)]
struct IpEcho {
    ip: String,
}

/// Resolves the caller's public IP address.
#[derive(Clone)]
pub struct PublicIpClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl PublicIpClient {
    /// Client for the default ipify endpoint.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Self::with_endpoint(IPIFY_URL, transport)
    }

    /// Client for a custom echo endpoint returning `{"ip": "..."}`.
    pub fn with_endpoint(endpoint: &str, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            endpoint: Url::parse(endpoint)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `GET {endpoint}` → the `ip` field, trimmed.
    pub async fn fetch_public_ip(&self) -> Result<String, Error> {
        debug!("GET {}", self.endpoint);

        let resp = self.http.get(self.endpoint.clone()).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
                body: preview(&body).to_owned(),
            });
        }

        let echo: IpEcho = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;
        let ip = echo.ip.trim();
        if ip.is_empty() {
            return Err(Error::Deserialization {
                message: "public IP service returned an empty address".into(),
                body,
            });
        }
        Ok(ip.to_owned())
    }
}
