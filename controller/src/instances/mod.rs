//! Node → instance resolution and liveness.
//!
//! A node's declared provider ID is treated as a cached identity: it is
//! trusted unless the kubelet-reported system UUID disagrees with it, in
//! which case the instance is looked up again by node name.
//!
//! Existence and shutdown are answered by different policies. A 404 from the
//! directory only counts as deletion once it has persisted for the grace
//! period, while a powered-off state is reported as soon as it is seen.

pub mod liveness;
pub mod metadata;

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::directory::InstanceDirectory;
use crate::error::{Error, Result};
use crate::types::{InstanceMetadata, NodeAddress, NodeIdentity, PROVIDER_NAME, PROVIDER_PREFIX};

pub use liveness::{liveness_sweeper, LivenessTracker, DEFAULT_GRACE_PERIOD};

/// Instance ID part of a `crusoe://<id>` provider ID.
///
/// The ID becomes a single URL path segment, so path separators, query and
/// fragment markers and dot segments are rejected.
pub fn instance_id_from_provider_id(provider_id: &str) -> Result<&str> {
    match provider_id.strip_prefix(PROVIDER_PREFIX) {
        Some(id)
            if !id.is_empty()
                && id != "."
                && id != ".."
                && !id.contains(['/', '?', '#', '\\']) =>
        {
            Ok(id)
        }
        _ => Err(Error::InvalidProviderId(provider_id.to_string())),
    }
}

/// Instance name for a node name, tolerating fully qualified names
pub fn node_short_name(node_name: &str) -> &str {
    node_name.split('.').next().unwrap_or(node_name)
}

pub struct Instances {
    directory: Arc<dyn InstanceDirectory>,
    liveness: Arc<LivenessTracker>,
}

impl Instances {
    pub fn new(directory: Arc<dyn InstanceDirectory>, liveness: Arc<LivenessTracker>) -> Self {
        Self {
            directory,
            liveness,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    pub fn liveness(&self) -> &Arc<LivenessTracker> {
        &self.liveness
    }

    /// Canonical provider ID for a node
    pub async fn resolve_provider_id(&self, node: &NodeIdentity) -> Result<String> {
        let mut provider_id = node.provider_id.as_str();

        if !provider_id.is_empty()
            && !node.system_uuid.is_empty()
            && provider_id.strip_prefix(PROVIDER_PREFIX) != Some(node.system_uuid.as_str())
        {
            warn!(
                "ProviderID and SystemUUID do not match for node {}; providerID: {}; systemUUID: {}. Fetching instance from Crusoe Cloud directly.",
                node.name, provider_id, node.system_uuid
            );
            provider_id = "";
        }

        if !provider_id.is_empty() {
            return Ok(provider_id.to_string());
        }

        let name = node_short_name(&node.name);
        let instance = self
            .directory
            .instance_by_name(name)
            .await
            .map_err(|e| Error::lookup("get instance by name", name, e))?;

        let provider_id = metadata::provider_id_for(&instance);
        debug!("Resolved node {} to {}", node.name, provider_id);
        Ok(provider_id)
    }

    pub async fn node_addresses(&self, node_name: &str) -> Result<Vec<NodeAddress>> {
        let name = node_short_name(node_name);
        let instance = self
            .directory
            .instance_by_name(name)
            .await
            .map_err(|e| Error::lookup("get instance by name", name, e))?;

        metadata::node_addresses(&instance)
    }

    pub async fn node_addresses_by_provider_id(&self, provider_id: &str) -> Result<Vec<NodeAddress>> {
        let instance_id = instance_id_from_provider_id(provider_id)?;
        let instance = self
            .directory
            .instance_by_id(instance_id)
            .await
            .map_err(|e| Error::lookup("get instance by provider ID", provider_id, e))?;

        let addresses = metadata::node_addresses(&instance)?;
        info!(
            "NodeAddressesByProviderID({}) resolved to {:?}",
            provider_id, addresses
        );
        Ok(addresses)
    }

    pub async fn instance_id(&self, node_name: &str) -> Result<String> {
        let name = node_short_name(node_name);
        let instance = self
            .directory
            .instance_by_name(name)
            .await
            .map_err(|e| Error::lookup("get instance by name", name, e))?;

        Ok(instance.id)
    }

    pub async fn instance_type(&self, node_name: &str) -> Result<String> {
        let name = node_short_name(node_name);
        let instance = self
            .directory
            .instance_by_name(name)
            .await
            .map_err(|e| Error::lookup("get instance by name", name, e))?;

        info!("InstanceType({}) is {}", node_name, instance.instance_type);
        Ok(instance.instance_type)
    }

    pub async fn instance_type_by_provider_id(&self, provider_id: &str) -> Result<String> {
        let instance_id = instance_id_from_provider_id(provider_id)?;
        let instance = self
            .directory
            .instance_by_id(instance_id)
            .await
            .map_err(|e| Error::lookup("get instance by provider ID", provider_id, e))?;

        info!(
            "InstanceTypeByProviderID({}) is {}",
            provider_id, instance.instance_type
        );
        Ok(instance.instance_type)
    }

    /// Whether the instance behind `provider_id` still exists.
    ///
    /// A 404 is reported as existing until it has persisted for the grace
    /// period. Any other failure is returned as an error.
    pub async fn instance_exists_by_provider_id(&self, provider_id: &str) -> Result<bool> {
        let instance_id = instance_id_from_provider_id(provider_id)?;

        match self.directory.instance_by_id(instance_id).await {
            Ok(_) => {
                self.liveness.record_present(provider_id);
                Ok(true)
            }
            Err(e) if e.is_not_found() => Ok(self.liveness.record_absent(provider_id)),
            Err(e) => {
                warn!("Error getting instance {} by ID: {}", provider_id, e);
                Err(Error::lookup("get instance by provider ID", provider_id, e))
            }
        }
    }

    pub async fn instance_exists(&self, node: &NodeIdentity) -> Result<bool> {
        let provider_id = self.resolve_provider_id(node).await?;
        self.instance_exists_by_provider_id(&provider_id).await
    }

    /// Whether the instance is currently reported as powered off
    pub async fn instance_shutdown_by_provider_id(&self, provider_id: &str) -> Result<bool> {
        let instance_id = instance_id_from_provider_id(provider_id)?;
        let instance = self
            .directory
            .instance_by_id(instance_id)
            .await
            .map_err(|e| Error::lookup("get instance by provider ID", provider_id, e))?;

        if instance.lifecycle().is_powered_off() {
            info!("Instance {} is shut down ({})", provider_id, instance.state);
            return Ok(true);
        }
        Ok(false)
    }

    pub async fn instance_shutdown(&self, node: &NodeIdentity) -> Result<bool> {
        let provider_id = self.resolve_provider_id(node).await?;
        self.instance_shutdown_by_provider_id(&provider_id).await
    }

    pub async fn instance_metadata(&self, node: &NodeIdentity) -> Result<InstanceMetadata> {
        info!("Get instance metadata for {}", node.name);
        let provider_id = self.resolve_provider_id(node).await?;
        let instance_id = instance_id_from_provider_id(&provider_id)?;

        let instance = self
            .directory
            .instance_by_id(instance_id)
            .await
            .map_err(|e| Error::lookup("get instance by ID", &provider_id, e))?;

        let partition = match instance.host_channel_adapters.first() {
            Some(hca) => {
                let partition = self
                    .directory
                    .network_partition(&instance.project_id, &hca.ib_partition_id)
                    .await
                    .map_err(|e| Error::lookup("get IB partition", &hca.ib_partition_id, e))?;
                Some(partition)
            }
            None => None,
        };

        let metadata = metadata::instance_metadata(&instance, partition.as_ref())?;
        info!("InstanceMetadata for {}: {:?}", node.name, metadata);
        Ok(metadata)
    }

    /// Node name for a hostname; no lookup is involved
    pub fn current_node_name(&self, hostname: &str) -> String {
        hostname.to_string()
    }

    /// SSH key injection has no Crusoe counterpart, so this only yields the
    /// error to report.
    pub fn add_ssh_key_to_all_instances(&self, _user: &str, _key_data: &[u8]) -> Error {
        Error::Unsupported("adding SSH keys to instances")
    }
}
