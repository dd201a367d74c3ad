use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scheme prefix of every provider ID this controller issues or accepts
pub const PROVIDER_PREFIX: &str = "crusoe://";

/// Name under which the provider is registered with the orchestrator
pub const PROVIDER_NAME: &str = "crusoe";

// ============================================================================
// Node Types
// ============================================================================

/// The parts of a Kubernetes node object used to find its instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub name: String,
    /// `spec.providerID`, empty when the node has not been initialised yet
    #[serde(default)]
    pub provider_id: String,
    /// `status.nodeInfo.systemUUID` as reported by the kubelet
    #[serde(default)]
    pub system_uuid: String,
}

impl NodeIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_provider_id(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = provider_id.into();
        self
    }

    pub fn with_system_uuid(mut self, system_uuid: impl Into<String>) -> Self {
        self.system_uuid = system_uuid.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeAddressType {
    InternalIP,
    ExternalIP,
    Hostname,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    #[serde(rename = "type")]
    pub address_type: NodeAddressType,
    pub address: String,
}

impl NodeAddress {
    pub fn new(address_type: NodeAddressType, address: impl Into<String>) -> Self {
        Self {
            address_type,
            address: address.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMetadata {
    pub provider_id: String,
    pub instance_type: String,
    pub region: String,
    pub node_addresses: Vec<NodeAddress>,
    pub additional_labels: BTreeMap<String, String>,
}

// ============================================================================
// Crusoe API Types (v1alpha5)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub state: String,
    pub location: String,
    pub project_id: String,
    pub instance_group_id: String,
    pub instance_template_id: String,
    pub network_interfaces: Vec<NetworkInterface>,
    pub host_channel_adapters: Vec<HostChannelAdapter>,
}

impl InstanceRecord {
    pub fn lifecycle(&self) -> InstanceState {
        InstanceState::from_api(&self.state)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInterface {
    pub ips: Vec<IpAddresses>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpAddresses {
    pub private_ipv4: Option<Ipv4Address>,
    pub public_ipv4: Option<Ipv4Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ipv4Address {
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostChannelAdapter {
    pub ib_partition_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionRecord {
    pub id: String,
    pub name: String,
    pub ib_network_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListInstancesResponse {
    #[serde(default)]
    pub items: Vec<InstanceRecord>,
}

/// Lifecycle state as far as the controller cares about it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Running,
    ShutOff,
    ShutDown,
    Other,
}

impl InstanceState {
    pub fn from_api(state: &str) -> Self {
        match state {
            "STATE_RUNNING" => Self::Running,
            "STATE_SHUTOFF" => Self::ShutOff,
            "STATE_SHUTDOWN" => Self::ShutDown,
            _ => Self::Other,
        }
    }

    pub fn is_powered_off(self) -> bool {
        matches!(self, Self::ShutOff | Self::ShutDown)
    }
}

// ============================================================================
// Provider API Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderIdQuery {
    pub provider_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressesResponse {
    pub addresses: Vec<NodeAddress>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceIdResponse {
    pub instance_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceTypeResponse {
    pub instance_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownResponse {
    pub shutdown: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeNameResponse {
    pub node_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSshKeyRequest {
    pub user: String,
    pub key_data: String,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub tracked_instances: usize,
}
