//! REST/JSON client for the ERP material-master gateway
//!
//! Resources, relative to the configured base URL:
//!
//! | Call             | Request                                        |
//! |------------------|------------------------------------------------|
//! | `get_records`    | `GET materials?$skip=&$top=&$filter=&$search=` |
//! | `get_record`     | `GET materials/{BISMT}`                        |
//! | `create_record`  | `POST materials`                               |
//! | `update_record`  | `PUT materials/{BISMT}`                        |
//! | `delete_record`  | `DELETE materials/{BISMT}`                     |
//! | `test_connection`| `GET health`                                   |

use std::time::Duration;

use async_trait::async_trait;
use matsync_core::MaterialClient;
use matsync_domain::{
    ConnectionProbe, ErpClientConfig, ExternalRecord, MatSyncError, MaterialDraft, MaterialPage,
    MaterialQuery, Result,
};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::errors::ErpError;
use crate::errors::InfraError;
use crate::http::HttpClient;

const USER_AGENT: &str = concat!("matsync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    system_info: Option<String>,
}

/// Material client talking to an HTTP gateway in front of the ERP.
pub struct HttpMaterialClient {
    base_url: Url,
    http: HttpClient,
    probe: HttpClient,
}

impl HttpMaterialClient {
    /// Build a client for `base_url` using credentials and timeout from
    /// `config`.
    pub fn new(base_url: &str, config: &ErpClientConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let build = |attempts: u32| {
            let mut builder =
                HttpClient::builder().timeout(timeout).max_attempts(attempts).user_agent(USER_AGENT);
            if let Some(username) = &config.username {
                builder = builder.basic_auth(username.clone(), config.password.clone());
            }
            builder.build()
        };

        Self::with_http_clients(base_url, build(3)?, build(1)?)
    }

    /// Build a client from preconfigured HTTP clients. `probe` serves
    /// `test_connection` and should not retry on its own.
    pub fn with_http_clients(base_url: &str, http: HttpClient, probe: HttpClient) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| MatSyncError::Config(format!("invalid ERP base URL '{base_url}': {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MatSyncError::Config(format!("ERP base URL '{base_url}' cannot be a base")));
        }
        Ok(Self { base_url, http, probe })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| MatSyncError::Config("ERP base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ErpError::from_response(status, &body).into())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    response.json::<T>().await.map_err(|err| MatSyncError::from(InfraError::from(err)))
}

#[async_trait]
impl MaterialClient for HttpMaterialClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn get_records(&self, query: &MaterialQuery) -> Result<MaterialPage> {
        let mut params = vec![("$skip", query.skip.to_string()), ("$top", query.top.to_string())];
        if let Some(filter) = &query.filter {
            params.push(("$filter", filter.clone()));
        }
        if let Some(search) = &query.search {
            params.push(("$search", search.clone()));
        }

        let request = self.http.request(Method::GET, self.url(&["materials"])?).query(&params);
        let page: MaterialPage = read_json(self.http.send(request).await?).await?;
        debug!(returned = page.results.len(), total = page.total_count, "Fetched material page");
        Ok(page)
    }

    async fn get_record(&self, business_key: &str) -> Result<Option<ExternalRecord>> {
        let request = self.http.request(Method::GET, self.url(&["materials", business_key])?);
        let response = self.http.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    async fn create_record(&self, draft: &MaterialDraft) -> Result<ExternalRecord> {
        let request = self.http.request(Method::POST, self.url(&["materials"])?).json(draft);
        let created: ExternalRecord = read_json(self.http.send(request).await?).await?;
        debug!(business_key = %created.business_key, material = %created.material_number, "Material created");
        Ok(created)
    }

    async fn update_record(
        &self,
        business_key: &str,
        draft: &MaterialDraft,
    ) -> Result<ExternalRecord> {
        let request =
            self.http.request(Method::PUT, self.url(&["materials", business_key])?).json(draft);
        read_json(self.http.send(request).await?).await
    }

    async fn delete_record(&self, business_key: &str) -> Result<bool> {
        let request = self.http.request(Method::DELETE, self.url(&["materials", business_key])?);
        let response = self.http.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(response).await.map(|_| true)
    }

    async fn test_connection(&self) -> Result<ConnectionProbe> {
        let request = self.probe.request(Method::GET, self.url(&["health"])?);
        let response = ensure_success(self.probe.send(request).await?).await?;
        let info = response
            .json::<HealthResponse>()
            .await
            .ok()
            .and_then(|health| health.system_info)
            .unwrap_or_else(|| format!("ERP gateway at {}", self.base_url));
        Ok(ConnectionProbe::ok(info))
    }
}
