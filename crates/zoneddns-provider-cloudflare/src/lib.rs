// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `DnsProvider`.
//
// ## Architectural Constraints
//
// ### Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to the Cloudflare API only
// - ✅ Parse Cloudflare responses
//
// **Forbidden Capabilities** (enforced by code review):
// - ❌ Spawn tasks or threads
// - ❌ Implement retry logic (the next tick is the retry)
// - ❌ Access the state store
// - ❌ Decide between create and edit (owned by `RecordReconciler`)
// - ❌ Cache records beyond a single call
//
// ## Security Requirements
//
// - API token NEVER appears in logs, errors or `Debug` output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&page=N&per_page=100`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Edit DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

pub mod api;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use zoneddns_core::config::DomainConfig;
use zoneddns_core::traits::{
    DnsProvider, DnsProviderFactory, RecordPayload, RemoteRecord, ADDRESS_RECORD_TYPE,
};
use zoneddns_core::{Error, Result};

use api::{Envelope, ResultInfo, PER_PAGE};

/// Provider name used in errors and logs
pub const PROVIDER_NAME: &str = "cloudflare";

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on list pages followed in one call
const MAX_LIST_PAGES: u32 = 1000;

/// Cloudflare DNS provider
///
/// One instance holds one API token. The zone is chosen per call, so the
/// registry builds one provider per configured domain.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all list requests
/// - Log the intended create/edit payload
/// - **NOT** actually modify DNS records
///
/// # Security
///
/// The Debug implementation does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API endpoint (overridable for tests and proxies)
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform list requests but skip mutations
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `dry_run`: If true, perform list requests but skip create/edit
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be built.
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            api_base: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a new Cloudflare provider (production/live mode)
    pub fn new_live(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, false)
    }

    /// Create a new Cloudflare provider (dry-run mode)
    pub fn new_dry_run(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, true)
    }

    /// Override the API endpoint
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether mutations are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    /// Send a request and unwrap the response envelope
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<(T, Option<ResultInfo>)> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::network(format!("HTTP request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(api::status_error(status, &body));
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            Error::provider_api(PROVIDER_NAME, format!("Failed to parse response: {}", e))
        })?;

        envelope.into_result()
    }

    /// Record returned in place of a mutation result in dry-run mode
    fn dry_run_record(record_id: Option<&str>, payload: &RecordPayload) -> RemoteRecord {
        RemoteRecord {
            id: record_id.unwrap_or("dry-run").to_string(),
            name: payload.name.clone(),
            record_type: payload.record_type.to_string(),
            content: payload.content.clone(),
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// List the zone's `A` records, following every page
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&page=1&per_page=100
    /// Authorization: Bearer <token>
    /// ```
    async fn list_records(&self, zone_id: &str) -> Result<Vec<RemoteRecord>> {
        let url = self.records_url(zone_id);
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let request = self.client.get(&url).query(&[
                ("type", ADDRESS_RECORD_TYPE.to_string()),
                ("page", page.to_string()),
                ("per_page", PER_PAGE.to_string()),
            ]);

            let (batch, info): (Vec<RemoteRecord>, _) = self.send(request).await?;
            records.extend(batch);

            let total_pages = info.map(|i| i.total_pages).unwrap_or(1);
            if page >= total_pages || page >= MAX_LIST_PAGES {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            "Listed {} A record(s) in zone {} ({} page(s))",
            records.len(),
            zone_id,
            page
        );
        Ok(records)
    }

    /// Create an address record
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// {"type": "A", "name": "...", "content": "1.2.3.4", "ttl": 1, "proxied": false}
    /// ```
    async fn create_record(&self, zone_id: &str, payload: &RecordPayload) -> Result<RemoteRecord> {
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would create record in zone {}: {}",
                zone_id,
                serde_json::to_string(payload)?
            );
            return Ok(Self::dry_run_record(None, payload));
        }

        let request = self.client.post(self.records_url(zone_id)).json(payload);
        let (record, _) = self.send(request).await?;
        Ok(record)
    }

    /// Edit an existing record in place
    ///
    /// # API Call
    ///
    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// {"type": "A", "name": "...", "content": "1.2.3.4", "ttl": 1, "proxied": false}
    /// ```
    async fn edit_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: &RecordPayload,
    ) -> Result<RemoteRecord> {
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would edit record {} in zone {}: {}",
                record_id,
                zone_id,
                serde_json::to_string(payload)?
            );
            return Ok(Self::dry_run_record(Some(record_id), payload));
        }

        let url = format!("{}/{}", self.records_url(zone_id), record_id);
        let request = self.client.patch(url).json(payload);
        let (record, _) = self.send(request).await?;
        Ok(record)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating one Cloudflare provider per configured domain
#[derive(Debug, Clone, Default)]
pub struct CloudflareFactory {
    dry_run: bool,
    api_base: Option<String>,
}

impl CloudflareFactory {
    /// Factory producing providers in the given mode
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            api_base: None,
        }
    }

    /// Point every created provider at another endpoint
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, domain: &str, config: &DomainConfig) -> Result<Box<dyn DnsProvider>> {
        if config.api_token.trim().is_empty() {
            return Err(Error::config(format!(
                "Cloudflare API token is required for domain {}",
                domain
            )));
        }
        if config.zone_id.trim().is_empty() {
            return Err(Error::config(format!(
                "Cloudflare zone_id is required for domain {}",
                domain
            )));
        }

        let mut provider = CloudflareProvider::new(config.api_token.clone(), self.dry_run)?;
        if let Some(api_base) = &self.api_base {
            provider = provider.with_api_base(api_base.clone());
        }

        tracing::debug!("Created Cloudflare client for domain {}", domain);
        Ok(Box::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creation() {
        let factory = CloudflareFactory::new(false);
        let config = DomainConfig::new("test_zone", "test_token");

        let provider = factory.create("example.com", &config);
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().provider_name(), "cloudflare");
    }

    #[test]
    fn test_factory_missing_token() {
        let factory = CloudflareFactory::default();

        let provider = factory.create("example.com", &DomainConfig::new("zone", ""));
        assert!(matches!(provider, Err(Error::Config(_))));
    }

    #[test]
    fn test_factory_missing_zone_id() {
        let factory = CloudflareFactory::default();

        let provider = factory.create("example.com", &DomainConfig::new(" ", "token"));
        assert!(matches!(provider, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_token_is_rejected() {
        assert!(matches!(
            CloudflareProvider::new("", false),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_dry_run_mode() {
        let provider_dry = CloudflareProvider::new_dry_run("token").unwrap();
        let provider_live = CloudflareProvider::new_live("token").unwrap();

        assert!(provider_dry.is_dry_run(), "Dry-run provider should have dry_run=true");
        assert!(!provider_live.is_dry_run(), "Live provider should have dry_run=false");
    }

    #[test]
    fn test_api_base_trailing_slash_is_trimmed() {
        let provider = CloudflareProvider::new_live("token")
            .unwrap()
            .with_api_base("http://127.0.0.1:8080/client/v4/");
        assert_eq!(
            provider.records_url("z1"),
            "http://127.0.0.1:8080/client/v4/zones/z1/dns_records"
        );
    }

    #[test]
    fn test_api_token_not_exposed_in_debug() {
        let provider = CloudflareProvider::new("secret_token_12345", false).unwrap();

        let debug_str = format!("{:?}", provider);
        assert!(!debug_str.contains("secret_token_12345"));
        assert!(!debug_str.contains("secret_token"));
        assert!(debug_str.contains("CloudflareProvider"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[tokio::test]
    async fn test_dry_run_skips_mutations() {
        // Unroutable base: any real request would fail
        let provider = CloudflareProvider::new_dry_run("token")
            .unwrap()
            .with_api_base("http://127.0.0.1:1");
        let payload = RecordPayload::address("home.example.com", "9.9.9.9");

        let created = provider.create_record("zone", &payload).await.unwrap();
        assert_eq!(created.id, "dry-run");
        assert_eq!(created.content, "9.9.9.9");

        let edited = provider.edit_record("zone", "r1", &payload).await.unwrap();
        assert_eq!(edited.id, "r1");
        assert!(edited.is_address_for("home.example.com"));
    }
}
