use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{DirectoryError, InstanceDirectory};
use crate::types::{InstanceRecord, PartitionRecord};

/// In-memory directory for resolver tests
#[derive(Default)]
pub struct FakeDirectory {
    instances: Mutex<HashMap<String, InstanceRecord>>,
    partitions: Mutex<HashMap<String, PartitionRecord>>,
    /// Instance IDs whose lookups fail with the given status
    failures: Mutex<HashMap<String, StatusCode>>,
    calls: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(self, instance: InstanceRecord) -> Self {
        self.insert(instance);
        self
    }

    pub fn with_partition(self, partition: PartitionRecord) -> Self {
        self.partitions
            .lock()
            .unwrap()
            .insert(partition.id.clone(), partition);
        self
    }

    pub fn insert(&self, instance: InstanceRecord) {
        self.instances
            .lock()
            .unwrap()
            .insert(instance.id.clone(), instance);
    }

    pub fn remove(&self, instance_id: &str) {
        self.instances.lock().unwrap().remove(instance_id);
    }

    pub fn fail_with(&self, instance_id: &str, status: StatusCode) {
        self.failures
            .lock()
            .unwrap()
            .insert(instance_id.to_string(), status);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Lookups made so far, as `by_name:<name>`, `by_id:<id>` or `partition:<id>`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl InstanceDirectory for FakeDirectory {
    async fn instance_by_name(&self, name: &str) -> Result<InstanceRecord, DirectoryError> {
        self.record_call(format!("by_name:{}", name));
        let instances = self.instances.lock().unwrap();
        let mut matches: Vec<&InstanceRecord> =
            instances.values().filter(|i| i.name == name).collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
            .first()
            .map(|i| (*i).clone())
            .ok_or_else(|| DirectoryError::NotFound {
                resource: format!("instance named {}", name),
            })
    }

    async fn instance_by_id(&self, instance_id: &str) -> Result<InstanceRecord, DirectoryError> {
        self.record_call(format!("by_id:{}", instance_id));
        if let Some(status) = self.failures.lock().unwrap().get(instance_id) {
            return Err(DirectoryError::Api {
                status: *status,
                message: "injected failure".into(),
            });
        }
        self.instances
            .lock()
            .unwrap()
            .get(instance_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound {
                resource: format!("instance {}", instance_id),
            })
    }

    async fn network_partition(
        &self,
        _project_id: &str,
        partition_id: &str,
    ) -> Result<PartitionRecord, DirectoryError> {
        self.record_call(format!("partition:{}", partition_id));
        self.partitions
            .lock()
            .unwrap()
            .get(partition_id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound {
                resource: format!("IB partition {}", partition_id),
            })
    }
}
