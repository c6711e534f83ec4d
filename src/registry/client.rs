// src/registry/client.rs

//! HTTP client for bundle registry operations
//!
//! Wraps a blocking reqwest client speaking the registry's JSON API.
//! Implements the write operations the importer needs plus the
//! paginated source-side listing used by `collect` and `sync`.
//!
//! The client itself never retries write operations; the importer owns
//! the attempt budget and the droppable-vs-fatal policy.

use crate::bundle::VersionedBundle;
use crate::error::{Error, Result};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::reader::RegistryReader;
use super::writer::{RegistryWriter, VersionLookup};

/// Default timeout for registry requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for listing pages
const LIST_MAX_RETRIES: u32 = 3;

/// Delay between listing retries in milliseconds
const LIST_RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Serialize)]
struct CreateNamespaceRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateFamilyRequest<'a> {
    namespace: &'a str,
    shortname: &'a str,
}

#[derive(Debug, Serialize)]
struct PublishVersionRequest<'a> {
    version: &'a str,
    source: &'a str,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BundlePage {
    items: Vec<BundleEntry>,
    next_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct BundleEntry {
    reference: String,
    source: String,
}

/// Blocking HTTP client for one registry instance
pub struct HttpRegistry {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpRegistry {
    /// Create a client for the registry at `base_url`
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{path}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        self.authorized(request)
            .send()
            .map_err(|e| Error::RegistryError(format!("Request failed for {what}: {e}")))
    }

    /// Map a response to an error unless its status is a success
    fn expect_success(response: Response, what: &str) -> Result<Response> {
        if !response.status().is_success() {
            return Err(Error::RegistryError(format!(
                "HTTP {} while {what}",
                response.status()
            )));
        }
        Ok(response)
    }

    fn parse_id(response: Response, what: &str) -> Result<String> {
        let body: IdResponse = response
            .json()
            .map_err(|e| Error::RegistryError(format!("Invalid response while {what}: {e}")))?;
        Ok(body.id)
    }

    /// Percent-encode a ref or name for use as a path segment
    fn encode_segment(value: &str) -> String {
        utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
    }

    fn fetch_page(&self, page: u32, include_uncertified: bool) -> Result<BundlePage> {
        let url = self.url(&format!(
            "bundles?page={page}&include_uncertified={include_uncertified}"
        ));
        debug!("Fetching bundle listing page {}", page);

        let mut attempt = 0;
        loop {
            attempt += 1;

            let result = self
                .send(self.client.get(&url), "listing bundles")
                .and_then(|r| Self::expect_success(r, "listing bundles"))
                .and_then(|r| {
                    r.json::<BundlePage>().map_err(|e| {
                        Error::RegistryError(format!("Invalid listing response: {e}"))
                    })
                });

            match result {
                Ok(listing) => return Ok(listing),
                Err(e) => {
                    if attempt >= LIST_MAX_RETRIES {
                        return Err(e);
                    }
                    warn!("Listing attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(LIST_RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }

    /// Fetch one bundle by ref; `None` when the registry reports 404
    pub fn fetch_bundle(&self, reference: &str) -> Result<Option<VersionedBundle>> {
        let url = self.url(&format!("bundles/{}", Self::encode_segment(reference)));
        let response = self.send(self.client.get(&url), "fetching bundle")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::expect_success(response, "fetching bundle")?;
        let entry: BundleEntry = response
            .json()
            .map_err(|e| Error::RegistryError(format!("Invalid bundle response: {e}")))?;

        Ok(Some(VersionedBundle::new(entry.reference, entry.source)))
    }
}

impl RegistryReader for HttpRegistry {
    /// Walks the paginated listing endpoint; page fetches are retried
    /// here because listing happens outside the importer's budget.
    /// A `must_include` ref the registry does not know is skipped with
    /// a warning.
    fn list_bundles(
        &self,
        include_uncertified: bool,
        must_include: &[String],
    ) -> Result<Vec<VersionedBundle>> {
        let mut bundles = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        let mut page = Some(0u32);
        while let Some(current) = page {
            let listing = self.fetch_page(current, include_uncertified)?;

            for entry in listing.items {
                if seen.insert(entry.reference.clone()) {
                    bundles.push(VersionedBundle::new(entry.reference, entry.source));
                }
            }

            page = listing.next_page;
        }

        info!("Listed {} bundles from {}", bundles.len(), self.base_url);

        for reference in must_include {
            if seen.contains(reference) {
                continue;
            }

            match self.fetch_bundle(reference)? {
                Some(bundle) => {
                    seen.insert(reference.clone());
                    bundles.push(bundle);
                }
                None => warn!("Hidden bundle {} not found on registry, skipping", reference),
            }
        }

        Ok(bundles)
    }
}

impl RegistryWriter for HttpRegistry {
    fn namespace_exists(&self, namespace: &str) -> Result<bool> {
        let url = self.url(&format!("namespaces/{}", Self::encode_segment(namespace)));
        let response = self.send(self.client.get(&url), "querying namespace")?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(Error::RegistryError(format!(
                "HTTP {status} while querying namespace {namespace}"
            ))),
        }
    }

    fn create_namespace(&self, namespace: &str) -> Result<String> {
        let url = self.url("namespaces");
        let request = self
            .client
            .post(&url)
            .json(&CreateNamespaceRequest { name: namespace });

        let response = self.send(request, "creating namespace")?;
        let response = Self::expect_success(response, "creating namespace")?;
        Self::parse_id(response, "creating namespace")
    }

    fn find_family_id(&self, name: &str) -> Result<Option<String>> {
        let url = self.url(&format!("families/{}", Self::encode_segment(name)));
        let response = self.send(self.client.get(&url), "querying family")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::expect_success(response, "querying family")?;
        Self::parse_id(response, "querying family").map(Some)
    }

    fn create_family(&self, namespace: &str, shortname: &str) -> Result<String> {
        let url = self.url("families");
        let request = self.client.post(&url).json(&CreateFamilyRequest {
            namespace,
            shortname,
        });

        let response = self.send(request, "creating family")?;
        let response = Self::expect_success(response, "creating family")?;
        Self::parse_id(response, "creating family")
    }

    fn version_exists(&self, reference: &str) -> Result<VersionLookup> {
        let url = self.url(&format!("bundles/{}", Self::encode_segment(reference)));
        let response = self.send(self.client.get(&url), "querying version")?;

        match response.status() {
            // The definite "not found" signal the importer may publish on
            StatusCode::NOT_FOUND => Ok(VersionLookup::NotFound),
            status if status.is_success() => Ok(VersionLookup::Exists),
            status => Err(Error::RegistryError(format!(
                "HTTP {status} while querying version {reference}"
            ))),
        }
    }

    fn publish_version(&self, source: &str, family_id: &str, version: &str) -> Result<String> {
        let url = self.url(&format!(
            "families/{}/versions",
            Self::encode_segment(family_id)
        ));
        let request = self
            .client
            .post(&url)
            .json(&PublishVersionRequest { version, source });

        let response = self
            .authorized(request)
            .send()
            .map_err(|e| Error::PublishError(format!("Publish request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::PublishError(format!(
                "HTTP {} while publishing version {version}",
                response.status()
            )));
        }

        Self::parse_id(response, "publishing version")
    }
}
