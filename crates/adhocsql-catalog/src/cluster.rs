use std::fmt;

use adhocsql_common::types::Value;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionId(pub u32);

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    name: String,
    partition_count: u32,
}

impl Cluster {
    pub fn new(name: impl Into<String>, partition_count: u32) -> Self {
        Self {
            name: name.into(),
            partition_count: partition_count.max(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partition_count(&self) -> u32 {
        self.partition_count
    }

    /// The partition owning rows whose partition column equals `key`.
    pub fn partition_for(&self, key: &Value) -> PartitionId {
        let hash = xxh3_64(&partition_key_bytes(key));
        PartitionId((hash % self.partition_count as u64) as u32)
    }
}

/// Equal keys must produce equal bytes however the literal was written.
fn partition_key_bytes(key: &Value) -> Vec<u8> {
    match key {
        Value::Null => Vec::new(),
        Value::Boolean(b) => vec![u8::from(*b)],
        Value::Integer(i) | Value::Timestamp(i) => i.to_le_bytes().to_vec(),
        Value::Float(f) => {
            let f = if f.0 == 0.0 {
                0.0
            } else if f.0.is_nan() {
                f64::NAN
            } else {
                f.0
            };
            f.to_bits().to_le_bytes().to_vec()
        }
        Value::Decimal(d) => d.normalize().serialize().to_vec(),
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Bytes(b) => b.clone(),
    }
}
