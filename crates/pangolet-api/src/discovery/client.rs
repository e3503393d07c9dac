// Async HTTP client for the Seerr discovery API.
//
// Auth: optional `X-Api-Key` default header. Results are normalized into
// `MediaResult` before they leave this module.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::types::{
    DiscoverEndpoint, DiscoverParams, DiscoverResponse, Genre, MediaKind, RawDiscoverResponse,
};
use crate::error::{Error, preview};
use crate::transport::TransportConfig;

const API_KEY_HEADER: &str = "x-api-key";

/// Async client for `/api/v1/discover/*`.
#[derive(Clone)]
pub struct DiscoveryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DiscoveryClient {
    /// Build a client; `api_key` becomes a sensitive `X-Api-Key` header
    /// when present and non-empty.
    pub fn new(
        base_url: &str,
        api_key: Option<&SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.map(ExposeSecret::expose_secret).filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(key).map_err(|e| Error::InvalidApiKey {
                message: format!("invalid discovery API key header value: {e}"),
            })?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }
        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["api", "v1", "discover"])
                .extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let url = resp.url().to_string();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url,
                body: preview(&body).to_owned(),
            });
        }
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    // ── Discover lists ───────────────────────────────────────────────

    /// `GET /api/v1/discover/{endpoint}?page&language&genre&watchProviders`
    pub async fn discover(
        &self,
        endpoint: DiscoverEndpoint,
        params: &DiscoverParams,
    ) -> Result<DiscoverResponse, Error> {
        let mut url = self.endpoint(&[endpoint.as_ref()]);
        let query = params.to_query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let raw: RawDiscoverResponse = self.get_json(url).await?;
        Ok(raw.into())
    }

    pub async fn discover_movies(&self, params: &DiscoverParams) -> Result<DiscoverResponse, Error> {
        self.discover(DiscoverEndpoint::Movies, params).await
    }

    pub async fn discover_tv(&self, params: &DiscoverParams) -> Result<DiscoverResponse, Error> {
        self.discover(DiscoverEndpoint::Tv, params).await
    }

    // ── Genres ───────────────────────────────────────────────────────

    /// `GET /api/v1/discover/genreslider/{movie|tv}`
    pub async fn fetch_genres(&self, kind: MediaKind) -> Result<Vec<Genre>, Error> {
        let url = self.endpoint(&["genreslider", kind.as_ref()]);
        self.get_json(url).await
    }
}
