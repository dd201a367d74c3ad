use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::{
    InstanceMetadata, InstanceRecord, NodeAddress, NodeAddressType, PartitionRecord,
    PROVIDER_PREFIX,
};

pub const LABEL_INSTANCE_ID: &str = "crusoe.ai/instance.id";
pub const LABEL_INSTANCE_GROUP_ID: &str = "crusoe.ai/instance.group.id";
pub const LABEL_INSTANCE_TEMPLATE_ID: &str = "crusoe.ai/instance.template.id";
pub const LABEL_INSTANCE_STATE: &str = "crusoe.ai/instance.state";
pub const LABEL_IB_PARTITION_NAME: &str = "crusoe.ai/ib.partition.name";
pub const LABEL_IB_PARTITION_ID: &str = "crusoe.ai/ib.partition.id";
pub const LABEL_IB_PARTITION_NETWORK_ID: &str = "crusoe.ai/ib.partition.networkId";

pub fn provider_id_for(instance: &InstanceRecord) -> String {
    format!("{}{}", PROVIDER_PREFIX, instance.id)
}

pub fn hostname_for(instance: &InstanceRecord) -> String {
    format!("{}.{}.compute.internal", instance.name, instance.location)
}

/// Internal IP, external IP and hostname, always in that order.
///
/// Both IPs come from the first address pair of the first interface.
pub fn node_addresses(instance: &InstanceRecord) -> Result<Vec<NodeAddress>> {
    let missing = |reason| Error::MissingAddress {
        instance_id: instance.id.clone(),
        reason,
    };

    let pair = instance
        .network_interfaces
        .first()
        .ok_or_else(|| missing("no network interfaces"))?
        .ips
        .first()
        .ok_or_else(|| missing("first network interface has no addresses"))?;

    let private = pair
        .private_ipv4
        .as_ref()
        .ok_or_else(|| missing("no private IPv4 address"))?;
    let public = pair
        .public_ipv4
        .as_ref()
        .ok_or_else(|| missing("no public IPv4 address"))?;

    Ok(vec![
        NodeAddress::new(NodeAddressType::InternalIP, &private.address),
        NodeAddress::new(NodeAddressType::ExternalIP, &public.address),
        NodeAddress::new(NodeAddressType::Hostname, hostname_for(instance)),
    ])
}

/// Build the orchestrator view of an instance. `partition` is the resolved
/// partition of the first host channel adapter, if the instance has one.
pub fn instance_metadata(
    instance: &InstanceRecord,
    partition: Option<&PartitionRecord>,
) -> Result<InstanceMetadata> {
    let node_addresses = node_addresses(instance)?;

    let mut labels = BTreeMap::new();
    if let Some(partition) = partition {
        labels.insert(LABEL_IB_PARTITION_NAME.to_string(), partition.name.clone());
        labels.insert(LABEL_IB_PARTITION_ID.to_string(), partition.id.clone());
        labels.insert(
            LABEL_IB_PARTITION_NETWORK_ID.to_string(),
            partition.ib_network_id.clone(),
        );
    }
    labels.insert(LABEL_INSTANCE_ID.to_string(), instance.id.clone());
    labels.insert(
        LABEL_INSTANCE_GROUP_ID.to_string(),
        instance.instance_group_id.clone(),
    );
    labels.insert(
        LABEL_INSTANCE_TEMPLATE_ID.to_string(),
        instance.instance_template_id.clone(),
    );
    labels.insert(LABEL_INSTANCE_STATE.to_string(), instance.state.clone());

    Ok(InstanceMetadata {
        provider_id: provider_id_for(instance),
        instance_type: instance.instance_type.clone(),
        region: instance.location.clone(),
        node_addresses,
        additional_labels: labels,
    })
}
