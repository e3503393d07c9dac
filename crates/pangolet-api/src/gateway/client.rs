// Async HTTP client for the Pangolin gateway API.
//
// Auth: `Authorization: Bearer <api key>` default header.
// Every call is single-shot. Nothing here retries, because a rule mutation
// repeated after an ambiguous failure would duplicate server-side state.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};
use url::Url;

use super::types::{
    AccessRuleRequest, AddRuleOptions, AddRuleResponse, ResourceListEnvelope, ResourceResponse,
    RulesPayload,
};
use crate::error::{Error, preview};
use crate::transport::TransportConfig;

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the gateway's resource and rule endpoints.
///
/// Holds the organization id so org-scoped calls can be made without
/// threading it through every call site.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
    org_id: String,
}

impl GatewayClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects `Authorization: Bearer <key>` as a sensitive default header.
    /// `base_url` may carry a path prefix (e.g. `https://api.example.com/v1`).
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        org_id: &str,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::InvalidApiKey {
                message: format!("invalid API key header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http, org_id)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client, org_id: &str) -> Result<Self, Error> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(Self {
            http,
            base_url,
            org_id: org_id.trim().to_owned(),
        })
    }

    /// The gateway base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The organization this client is scoped to.
    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append path segments (percent-encoded) to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // ── Response handling ────────────────────────────────────────────

    /// Return the body of a 2xx response, or `Error::Http` carrying status,
    /// URL, and a body preview.
    async fn success_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let url = resp.url().to_string();
        let body = resp.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(Error::Http {
                status: status.as_u16(),
                url,
                body: preview(&body).to_owned(),
            })
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Resources ────────────────────────────────────────────────────

    /// `GET /org/{orgId}/resources?public=true`
    ///
    /// A 2xx body that does not have the `{data:{resources}}` shape degrades
    /// to an empty list instead of failing.
    pub async fn list_public_resources(&self) -> Result<Vec<ResourceResponse>, Error> {
        if self.org_id.is_empty() {
            return Err(Error::MissingOrgId);
        }
        let mut url = self.endpoint(&["org", &self.org_id, "resources"]);
        url.query_pairs_mut().append_pair("public", "true");
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let body = Self::success_body(resp).await?;

        match serde_json::from_str::<ResourceListEnvelope>(&body) {
            Ok(envelope) => Ok(envelope.data.resources),
            Err(e) => {
                warn!(error = %e, body = preview(&body), "unparseable resource list, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    // ── Access rules ─────────────────────────────────────────────────

    /// `GET /resource/{id}/rules`
    ///
    /// Returns the raw payload; see [`RulesPayload::into_rules`] for the
    /// accepted shapes.
    pub async fn list_resource_rules(&self, resource_id: i64) -> Result<RulesPayload, Error> {
        let id = resource_id.to_string();
        let url = self.endpoint(&["resource", &id, "rules"]);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let body = Self::success_body(resp).await?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    /// `PUT /resource/{id}/rule`
    pub async fn add_access_rule(
        &self,
        resource_id: i64,
        value: &str,
        options: AddRuleOptions,
    ) -> Result<AddRuleResponse, Error> {
        let id = resource_id.to_string();
        let url = self.endpoint(&["resource", &id, "rule"]);
        debug!(rule_value = value, "PUT {url}");

        let body = AccessRuleRequest::new(value, options);
        let resp = self.http.put(url).json(&body).send().await?;
        let text = Self::success_body(resp).await?;

        Ok(serde_json::from_str(&text).map_or(AddRuleResponse::Text(text), AddRuleResponse::Json))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str, org: &str) -> GatewayClient {
        GatewayClient::from_reqwest(base, reqwest::Client::new(), org).unwrap()
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let c = client("https://api.example.com/v1/", "acme");
        let url = c.endpoint(&["org", "acme", "resources"]);
        assert_eq!(url.as_str(), "https://api.example.com/v1/org/acme/resources");
    }

    #[test]
    fn endpoint_percent_encodes_segments() {
        let c = client("https://api.example.com", "a b");
        let url = c.endpoint(&["org", c.org_id(), "resources"]);
        assert_eq!(url.as_str(), "https://api.example.com/org/a%20b/resources");
    }

    #[test]
    fn rejects_non_base_url() {
        let result = GatewayClient::from_reqwest("mailto:ops@example.com", reqwest::Client::new(), "x");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn empty_org_id_fails_before_any_request() {
        let c = client("http://127.0.0.1:9", "  ");
        let err = c.list_public_resources().await.unwrap_err();
        assert!(matches!(err, Error::MissingOrgId));
    }
}
