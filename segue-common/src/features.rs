//! Track feature vectors and the feature store read contract
//!
//! Feature vectors are produced by the external analysis stage (tempo,
//! key, loudness, energy extraction) and consumed read-only by the
//! sequencing and planning layers. The store contract models the metadata
//! persistence boundary: a read-heavy mapping from track id to features.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Per-track feature vector from the analysis stage
///
/// Immutable once produced. `camelot_key` carries the raw code string as
/// stored in metadata; malformed codes surface as harmonic incompatibility
/// during scoring, never as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFeatures {
    /// Track UUID (unique per track)
    pub track_id: Uuid,

    /// Tempo in beats per minute (positive)
    pub tempo_bpm: f64,

    /// Camelot code, e.g. "8B" (raw, unparsed)
    pub camelot_key: String,

    /// Integrated loudness in dB (typically negative)
    pub loudness_db: f64,

    /// Normalized energy: average squared amplitude (non-negative)
    pub energy: f64,
}

/// Read contract over persisted track features
///
/// Queried read-heavy at playlist-build time; writes belong to the
/// analysis/persistence layers and are out of scope here.
pub trait FeatureStore: Send + Sync {
    /// Look up the feature vector for a track
    fn get(&self, track_id: Uuid) -> Option<TrackFeatures>;
}

/// In-memory feature store
///
/// Backs tests and callers that already hold extracted features.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureStore {
    entries: HashMap<Uuid, TrackFeatures>,
}

impl MemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a track's features
    pub fn insert(&mut self, features: TrackFeatures) {
        self.entries.insert(features.track_id, features);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<TrackFeatures> for MemoryFeatureStore {
    fn from_iter<I: IntoIterator<Item = TrackFeatures>>(iter: I) -> Self {
        let mut store = Self::new();
        for features in iter {
            store.insert(features);
        }
        store
    }
}

impl FeatureStore for MemoryFeatureStore {
    fn get(&self, track_id: Uuid) -> Option<TrackFeatures> {
        self.entries.get(&track_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_features() -> TrackFeatures {
        TrackFeatures {
            track_id: Uuid::new_v4(),
            tempo_bpm: 120.0,
            camelot_key: "8B".to_string(),
            loudness_db: -8.0,
            energy: 0.04,
        }
    }

    #[test]
    fn test_store_round_trip() {
        let features = sample_features();
        let id = features.track_id;

        let store: MemoryFeatureStore = [features.clone()].into_iter().collect();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id), Some(features));
        assert_eq!(store.get(Uuid::new_v4()), None);
    }

    #[test]
    fn test_insert_replaces() {
        let mut features = sample_features();
        let id = features.track_id;

        let mut store = MemoryFeatureStore::new();
        store.insert(features.clone());

        features.tempo_bpm = 128.0;
        store.insert(features);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).unwrap().tempo_bpm, 128.0);
    }

    #[test]
    fn test_serde_round_trip() {
        let features = sample_features();
        let json = serde_json::to_string(&features).unwrap();
        let back: TrackFeatures = serde_json::from_str(&json).unwrap();
        assert_eq!(features, back);
    }
}
