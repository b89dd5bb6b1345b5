use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::FlagValue;

pub type FlagSet = BTreeMap<String, FlagValue>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Hands out instance ids that never repeat within one launcher run, even
/// after the instance they named has been reaped.
#[derive(Debug, Default)]
pub struct InstanceIdGenerator {
    next: AtomicU64,
}

impl InstanceIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> InstanceId {
        let seq = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        InstanceId(format!(
            "instance_{}_{}",
            Utc::now().timestamp_millis(),
            seq
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: InstanceId,
    pub pid: u32,
    pub start_time: DateTime<Utc>,
    pub flags: FlagSet,
}

impl Instance {
    pub fn new(id: InstanceId, pid: u32, flags: FlagSet) -> Self {
        Self {
            id,
            pid,
            start_time: Utc::now(),
            flags,
        }
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.start_time
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStatus {
    pub is_running: bool,
    pub instances: Vec<Instance>,
    /// Admission is decided by `launch`; this is always reported as true.
    pub can_launch: bool,
}

impl ProcessStatus {
    pub fn from_instances(instances: Vec<Instance>) -> Self {
        Self {
            is_running: !instances.is_empty(),
            instances,
            can_launch: true,
        }
    }
}
