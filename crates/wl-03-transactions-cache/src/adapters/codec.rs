//! Snapshot codecs.

use crate::domain::{CacheSnapshot, CodecError};
use crate::ports::SnapshotCodec;

/// Compact binary codec using bincode.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeCodec;

impl SnapshotCodec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode(&self, snapshot: &CacheSnapshot) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(snapshot).map_err(|e| CodecError::Encode {
            codec: self.name(),
            message: e.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<CacheSnapshot, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode {
            codec: self.name(),
            message: e.to_string(),
        })
    }
}

/// Human-readable codec using JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec {
    /// Indent the output.
    pub pretty: bool,
}

impl SnapshotCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, snapshot: &CacheSnapshot) -> Result<Vec<u8>, CodecError> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(snapshot)
        } else {
            serde_json::to_vec(snapshot)
        };
        encoded.map_err(|e| CodecError::Encode {
            codec: self.name(),
            message: e.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<CacheSnapshot, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
            codec: self.name(),
            message: e.to_string(),
        })
    }
}
