use serde::{Deserialize, Serialize};

/// Progress of one partition during a partition-scoped scan or query.
///
/// Only the resume position (`bval`, `digest`) and the partition id are
/// persisted; node assignment and retry bookkeeping are per attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStatus {
    /// Last block value returned.
    pub bval: u64,
    /// Digest of the last record returned.
    pub digest: Option<[u8; 20]>,
    pub id: u16,
    /// Node currently serving the partition.
    #[serde(skip)]
    pub node: Option<String>,
    #[serde(skip)]
    pub replica_index: usize,
    #[serde(skip)]
    pub unavailable: bool,
    #[serde(default = "retry_default")]
    pub retry: bool,
}

fn retry_default() -> bool {
    true
}

impl PartitionStatus {
    pub fn new(id: u16) -> Self {
        PartitionStatus {
            bval: 0,
            digest: None,
            id,
            node: None,
            replica_index: 0,
            unavailable: false,
            retry: true,
        }
    }
}
