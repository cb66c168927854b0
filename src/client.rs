/*!
 * BloomAPI query client
 *
 * Every lookup is a single blocking GET. The client composes the query
 * string, checks that the server answered 200 OK and hands the decoded body
 * to the response builder.
 */

use std::time::Duration;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{self, BloomConfig, MAX_LIMIT};
use crate::data_types::{MedicareSpecialty, ProviderRecord};
use crate::response::{self, ResultField};
use crate::{BloomError, Result};

/// Provider search endpoint
pub const SEARCH_NPI_PATH: &str = "/api/search/npi";

/// Single provider lookup endpoint; the NPI is appended as a path segment
pub const NPI_PATH: &str = "/api/npis";

/// Medicare specialty to NUCC taxonomy crosswalk search endpoint
pub const MEDICARE_SPECIALTY_PATH: &str = "/api/search/usgov.hhs.medicare_specialty_codes";

/// Field the specialty lookup filters on
pub const TAXONOMY_CODE_FIELD: &str = "nucc_taxonomy_codes.code";

/// A single `name=value` query parameter, before encoding
pub type QueryParam = (String, String);

/// Ordered equality filters for the search endpoint
///
/// The search API pairs `key{i}`, `op{i}` and `value{i}` by index, so the
/// order in which criteria are added is the order they are numbered in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    entries: Vec<(String, String)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field == value` filter
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(field, value);
        self
    }

    pub fn push(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.entries.push((field.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut criteria = Criteria::new();
        for (field, value) in iter {
            criteria.push(field, value);
        }
        criteria
    }
}

impl<K: Into<String>, V: Into<String>> From<Vec<(K, V)>> for Criteria {
    fn from(entries: Vec<(K, V)>) -> Self {
        entries.into_iter().collect()
    }
}

/// Query parameters for a provider search, without the secret
pub fn search_params(criteria: &Criteria, limit: u32, offset: u32) -> Vec<QueryParam> {
    let mut params = Vec::with_capacity(criteria.len() * 3 + 3);

    for (i, (field, value)) in criteria.iter().enumerate() {
        let index = i + 1;
        params.push((format!("key{}", index), field.to_string()));
        params.push((format!("op{}", index), "eq".to_string()));
        params.push((format!("value{}", index), value.to_string()));
    }

    params.push(("limit".to_string(), limit.to_string()));
    params.push(("offset".to_string(), offset.to_string()));
    params
}

/// Query parameters for a Medicare specialty lookup, without the secret
pub fn specialty_params(code: &str) -> Vec<QueryParam> {
    let criteria = Criteria::new().equals(TAXONOMY_CODE_FIELD, code);
    let mut params = search_params(&criteria, 0, 0);
    params.truncate(3);
    params
}

/// Percent-encode parameters into a query string
pub fn encode_query(params: &[QueryParam]) -> String {
    params
        .iter()
        .map(|(name, value)| format!("{}={}", urlencoding::encode(name), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Blocking client for the BloomAPI registry
#[derive(Debug, Clone)]
pub struct BloomClient {
    config: BloomConfig,
    http: Client,
}

impl BloomClient {
    /// Create a client from the global configuration
    ///
    /// The configuration is copied once; later changes to the global do not
    /// affect this client.
    pub fn new() -> Result<Self> {
        Self::with_config(config::global_config())
    }

    /// Create a client with an explicit configuration
    pub fn with_config(config: BloomConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| BloomError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                suggestion: Some("Check your network configuration".to_string()),
            })?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BloomConfig {
        &self.config
    }

    /// Search providers with the configured default page size
    pub fn search(&self, criteria: &Criteria) -> Result<Vec<ProviderRecord>> {
        self.find_by(criteria, self.config.default_limit, 0)
    }

    /// Look up providers and organizations matching every criterion
    ///
    /// `limit` caps the number of records returned (the server allows at
    /// most 100) and `offset` skips that many records first.
    pub fn find_by(&self, criteria: &Criteria, limit: u32, offset: u32) -> Result<Vec<ProviderRecord>> {
        if limit > MAX_LIMIT {
            warn!(limit, max = MAX_LIMIT, "search limit exceeds the documented server maximum");
        }

        let params = search_params(criteria, limit, offset);
        let records = match self.get(SEARCH_NPI_PATH, params)? {
            ResultField::Present(value) => response::build_providers(value)?,
            ResultField::Null => Vec::new(),
            ResultField::Absent => return Err(missing_result(SEARCH_NPI_PATH)),
        };

        debug!(criteria = criteria.len(), records = records.len(), "provider search complete");
        Ok(records)
    }

    /// Look up a provider by National Provider Identifier
    ///
    /// Returns `BloomError::ProviderNotFound` when the registry has no record
    /// for the NPI.
    pub fn find_by_npi(&self, npi: &str) -> Result<ProviderRecord> {
        let npi = npi.trim();
        let path = format!("{}/{}", NPI_PATH, urlencoding::encode(npi));

        match self.get(&path, Vec::new())? {
            ResultField::Present(Value::Array(items)) => {
                if items.len() > 1 {
                    warn!(npi, records = items.len(), "NPI lookup returned several records, using the first");
                }
                match items.into_iter().next() {
                    Some(first) => response::build_provider(first),
                    None => Err(BloomError::provider_not_found(npi)),
                }
            }
            ResultField::Present(value) => response::build_provider(value),
            ResultField::Absent | ResultField::Null => Err(BloomError::provider_not_found(npi)),
        }
    }

    /// Look up Medicare provider/supplier types mapped to a taxonomy code
    /// (e.g. `2086S0122X`)
    pub fn find_by_specialty_code(&self, code: &str) -> Result<Vec<MedicareSpecialty>> {
        match self.get(MEDICARE_SPECIALTY_PATH, specialty_params(code))? {
            ResultField::Present(value) => response::build_medicare_specialties(value),
            ResultField::Null => Ok(Vec::new()),
            ResultField::Absent => Err(missing_result(MEDICARE_SPECIALTY_PATH)),
        }
    }

    /// Full request URL for a path and its parameters, secret included
    fn request_url(&self, path: &str, params: &[QueryParam]) -> String {
        let mut url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&encode_query(params));
        }
        url
    }

    /// Request parameters with the secret appended last when a key is configured
    fn signed_params(&self, mut params: Vec<QueryParam>) -> Vec<QueryParam> {
        if let Some(secret) = self.config.api_key.as_deref() {
            params.push(("secret".to_string(), secret.to_string()));
        }
        params
    }

    fn get(&self, path: &str, params: Vec<QueryParam>) -> Result<ResultField> {
        let params = self.signed_params(params);

        // The URL carries the secret; log the path only.
        let url = self.request_url(path, &params);
        debug!(endpoint = path, params = params.len(), "sending BloomAPI request");

        let response = self.http
            .get(&url)
            .send()
            .map_err(|e| BloomError::transport(path, e.without_url()))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(endpoint = path, status = status.as_u16(), "BloomAPI request failed");
            return Err(BloomError::HttpStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let body = response
            .text()
            .map_err(|e| BloomError::transport(path, e.without_url()))?;

        debug!(endpoint = path, bytes = body.len(), "received BloomAPI response");
        response::parse_body(&body)
    }
}

fn missing_result(endpoint: &str) -> BloomError {
    BloomError::malformed(format!("response from {} has no `result` field", endpoint))
}
