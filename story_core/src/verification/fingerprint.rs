//! Stable hash of the decision-relevant part of a state.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use story_rules::GameState;

/// Fingerprint length in bytes; enough to make accidental merges negligible.
const FINGERPRINT_BYTES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateFingerprint(pub String);

/// Hash trust, flags, patterns, mysteries and skills. Position and session
/// fields are ignored, so states that only differ there collapse.
pub fn fingerprint(state: &GameState) -> StateFingerprint {
    let projection = state.decision_projection();
    let mut hasher = Sha256::new();
    match serde_json::to_vec(&projection) {
        Ok(bytes) => hasher.update(&bytes),
        Err(err) => {
            tracing::debug!(error = %err, "projection not serializable, hashing debug form");
            hasher.update(format!("{projection:?}").as_bytes());
        }
    }
    let digest = hasher.finalize();
    StateFingerprint(hex::encode(&digest[..FINGERPRINT_BYTES]))
}
