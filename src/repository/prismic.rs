//! Prismic REST API adapter

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

use super::{ContentRepository, Query, RepositoryError, SearchPage};

/// How long a fetched master ref is reused before asking the API again
const MASTER_REF_TTL: Duration = Duration::from_secs(30);

/// API descriptor returned by `GET {endpoint}`
#[derive(Debug, Deserialize)]
struct ApiDescriptor {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Client for a Prismic repository (`https://<repo>.cdn.prismic.io/api/v2`)
pub struct PrismicRepository {
    http: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
    master_ref: Mutex<Option<(String, Instant)>>,
}

impl PrismicRepository {
    pub fn new(
        endpoint: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RepositoryError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| RepositoryError::Config(format!("endpoint {:?}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(RepositoryError::Config(format!(
                "endpoint {} is not a base URL",
                endpoint
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepositoryError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            access_token: access_token.filter(|t| !t.is_empty()),
            master_ref: Mutex::new(None),
        })
    }

    /// Reference of the currently published content
    pub async fn master_ref(&self) -> Result<String, RepositoryError> {
        let mut cached = self.master_ref.lock().await;
        if let Some((reference, fetched)) = cached.as_ref() {
            if fetched.elapsed() < MASTER_REF_TTL {
                return Ok(reference.clone());
            }
        }

        let mut url = self.endpoint.clone();
        if let Some(token) = &self.access_token {
            url.query_pairs_mut().append_pair("access_token", token);
        }
        let api: ApiDescriptor = self.get_json(url).await?;
        let master = api
            .refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .ok_or(RepositoryError::NoMasterRef)?;

        tracing::debug!(
            "Master ref {} ({})",
            master.reference,
            master.label.as_deref().unwrap_or("Master")
        );
        *cached = Some((master.reference.clone(), Instant::now()));
        Ok(master.reference)
    }

    /// URL of the search endpoint for `query` under `reference`
    pub fn search_url(&self, query: &Query, reference: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("documents").push("search");
        }

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", reference);
            pairs.append_pair("q", &query.predicate_string());
            if let Some(orderings) = query.orderings_string() {
                pairs.append_pair("orderings", &orderings);
            }
            if let Some(after) = &query.after {
                pairs.append_pair("after", after);
            }
            pairs.append_pair("page", &query.page.to_string());
            pairs.append_pair("pageSize", &query.page_size.to_string());
            if let Some(token) = &self.access_token {
                pairs.append_pair("access_token", token);
            }
        }

        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RepositoryError> {
        let shown = redact(&url);
        tracing::debug!("GET {}", shown);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| RepositoryError::Transport {
                url: shown.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepositoryError::Status {
                url: shown,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| RepositoryError::Transport {
                url: shown.clone(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|e| RepositoryError::Malformed {
            url: shown,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl ContentRepository for PrismicRepository {
    async fn query(&self, query: &Query) -> Result<SearchPage, RepositoryError> {
        let reference = match &query.reference {
            Some(reference) => reference.clone(),
            None => self.master_ref().await?,
        };
        self.get_json(self.search_url(query, &reference)).await
    }
}

/// URL for logs and errors, without the access token
fn redact(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        shown.set_query(None);
    } else {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}
