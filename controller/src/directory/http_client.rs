use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{DirectoryError, InstanceDirectory, RequestSigner};
use crate::config::CrusoeConfig;
use crate::types::{InstanceRecord, ListInstancesResponse, PartitionRecord};

/// REST client for the Crusoe v1alpha5 API, scoped to one project
#[derive(Clone)]
pub struct CrusoeApiClient {
    base_url: Url,
    project_id: String,
    signer: RequestSigner,
    client: Client,
    user_agent: String,
}

impl CrusoeApiClient {
    pub fn new(config: &CrusoeConfig) -> Result<Self, DirectoryError> {
        // Url::join drops the last segment unless the base ends with '/'
        let mut endpoint = config.api_endpoint.clone();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let base_url = Url::parse(&endpoint)
            .map_err(|e| DirectoryError::Config(format!("invalid API endpoint {}: {}", config.api_endpoint, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            project_id: config.project_id.clone(),
            signer: RequestSigner::new(&config.access_key, &config.secret_key),
            client,
            user_agent: format!("crusoe-cloud-controller/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn project_id(&self) -> Result<&str, DirectoryError> {
        if self.project_id.is_empty() {
            return Err(DirectoryError::Config("CRUSOE_PROJECT_ID is not set".into()));
        }
        Ok(&self.project_id)
    }

    /// Endpoint URL from path segments. Each segment is percent-encoded, so an
    /// identifier can never add path components, a query or a fragment.
    fn build_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, DirectoryError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(DirectoryError::InvalidPath(format!(
                "segment {:?} in {}",
                bad,
                segments.join("/")
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DirectoryError::Config(format!("API endpoint {} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, resource: String) -> Result<T, DirectoryError> {
        let req_id = Uuid::new_v4().to_string();
        let headers = self.signer.headers(&Method::GET, &url)?;

        debug!("HTTP GET {} (request_id={})", url, req_id);
        let resp = self
            .client
            .get(url.clone())
            .headers(headers)
            .header("user-agent", &self.user_agent)
            .header("x-request-id", &req_id)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound { resource });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DirectoryError::Api {
                status,
                message: body,
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| DirectoryError::Decode(format!("GET {}: {}", url, e)))
    }
}

#[async_trait]
impl InstanceDirectory for CrusoeApiClient {
    async fn instance_by_name(&self, name: &str) -> Result<InstanceRecord, DirectoryError> {
        let project_id = self.project_id()?;
        let url = self.build_url(
            &["projects", project_id, "compute", "vms", "instances"],
            &[("names", name)],
        )?;

        let list: ListInstancesResponse = self.get_json(url, format!("instance named {}", name)).await?;
        let instance = list
            .items
            .into_iter()
            .next()
            .ok_or_else(|| DirectoryError::NotFound {
                resource: format!("instance named {}", name),
            })?;

        info!("Found instance by name: name={}, id={}", name, instance.id);
        Ok(instance)
    }

    async fn instance_by_id(&self, instance_id: &str) -> Result<InstanceRecord, DirectoryError> {
        let project_id = self.project_id()?;
        let url = self.build_url(
            &["projects", project_id, "compute", "vms", "instances", instance_id],
            &[],
        )?;

        let instance: InstanceRecord = self.get_json(url, format!("instance {}", instance_id)).await?;
        debug!("Found instance by ID: id={}, state={}", instance.id, instance.state);
        Ok(instance)
    }

    async fn network_partition(
        &self,
        project_id: &str,
        partition_id: &str,
    ) -> Result<PartitionRecord, DirectoryError> {
        let url = self.build_url(
            &["projects", project_id, "networking", "ib-partitions", partition_id],
            &[],
        )?;

        let partition: PartitionRecord = self
            .get_json(url, format!("IB partition {}", partition_id))
            .await?;
        debug!("Found IB partition: id={}, name={}", partition.id, partition.name);
        Ok(partition)
    }
}
