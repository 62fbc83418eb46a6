//! Collaborator contracts and per-track analysis artifacts
//!
//! Feature extraction, stem separation, beat tracking, and time-stretching
//! are external subsystems. The engine consumes their results through the
//! traits here and validates artifact shape at the boundary; anything
//! malformed surfaces as `AnalysisFailed` before it can reach the
//! synthesis paths.
//!
//! Trait implementations are expected to be CPU-bound and synchronous;
//! the pipeline layer handles dispatching them onto worker threads.

use crate::audio::AudioClip;
use crate::error::{Error, Result};
use segue_common::TrackFeatures;
use uuid::Uuid;

/// Tempo/key/loudness/energy extraction contract
pub trait FeatureExtractor: Send + Sync {
    /// Analyze a clip and produce its feature vector
    ///
    /// `track_id` identifies the track the clip was cut from; the returned
    /// features must carry it.
    fn extract(&self, track_id: Uuid, clip: &AudioClip) -> Result<TrackFeatures>;
}

/// Source separation contract
///
/// Implementations must return all four stems at the input clip's sample
/// rate and length; the `StemSet` constructor enforces this.
pub trait StemSeparator: Send + Sync {
    fn separate(&self, clip: &AudioClip) -> Result<StemSet>;
}

/// Beat detection contract
pub trait BeatTracker: Send + Sync {
    /// Detect beat timestamps across the clip, in seconds from clip start
    fn beat_grid(&self, clip: &AudioClip) -> Result<BeatGrid>;
}

/// Pitch-preserving time-stretch contract
///
/// Output duration is input duration / `ratio`: a ratio below 1.0 slows
/// the material down (longer output). Implementations must accept ratios
/// in [0.5, 2.0] at minimum; the planner only requests ratios inside its
/// much narrower acceptance band.
pub trait TimeStretcher: Send + Sync {
    fn stretch(&self, clip: &AudioClip, ratio: f64) -> Result<AudioClip>;
}

/// The four separated layers of one track excerpt
///
/// Read-only input to transition planning; derived buffers are built by
/// slicing and overlaying, never by mutating the stems.
#[derive(Debug, Clone)]
pub struct StemSet {
    pub vocals: AudioClip,
    pub drums: AudioClip,
    pub bass: AudioClip,
    pub other: AudioClip,
}

impl StemSet {
    /// Build a stem set, validating that all four stems share one format
    /// and length
    pub fn new(
        vocals: AudioClip,
        drums: AudioClip,
        bass: AudioClip,
        other: AudioClip,
    ) -> Result<Self> {
        let reference = (vocals.sample_rate, vocals.channels, vocals.frames());
        for (name, stem) in [("drums", &drums), ("bass", &bass), ("other", &other)] {
            if (stem.sample_rate, stem.channels, stem.frames()) != reference {
                return Err(Error::AnalysisFailed(format!(
                    "stem '{name}' does not match vocals format/length"
                )));
            }
        }

        Ok(Self {
            vocals,
            drums,
            bass,
            other,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.vocals.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.vocals.channels
    }

    /// Excerpt duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.vocals.duration_ms()
    }

    /// The combined non-vocal layers: bass over drums over other
    pub fn instrumental(&self) -> AudioClip {
        self.bass.overlay(&self.drums, 0.0).overlay(&self.other, 0.0)
    }

    /// The full mix: instrumental plus vocals
    pub fn full_mix(&self) -> AudioClip {
        self.instrumental().overlay(&self.vocals, 0.0)
    }
}

/// Ordered beat timestamps for one track excerpt, seconds from excerpt
/// start
#[derive(Debug, Clone, PartialEq)]
pub struct BeatGrid {
    beats: Vec<f64>,
}

impl BeatGrid {
    /// Build a beat grid, validating monotonicity
    ///
    /// Timestamps must be finite, non-negative, and strictly increasing.
    pub fn new(beats: Vec<f64>) -> Result<Self> {
        for pair in beats.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::AnalysisFailed(
                    "beat grid timestamps must be strictly increasing".to_string(),
                ));
            }
        }
        if beats.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(Error::AnalysisFailed(
                "beat grid timestamps must be finite and non-negative".to_string(),
            ));
        }

        Ok(Self { beats })
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Beat timestamp by index, seconds
    pub fn beat_secs(&self, index: usize) -> Option<f64> {
        self.beats.get(index).copied()
    }

    /// Beat timestamp by index, milliseconds
    pub fn beat_ms(&self, index: usize) -> Option<u64> {
        self.beat_secs(index).map(|t| (t * 1000.0).round() as u64)
    }

    /// Index of the first beat at or after `secs`
    pub fn first_at_or_after(&self, secs: f64) -> Option<usize> {
        self.beats.iter().position(|t| *t >= secs)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.beats
    }
}

/// A track excerpt awaiting analysis: identity plus audio
#[derive(Debug, Clone)]
pub struct TrackSource {
    pub track_id: Uuid,
    pub excerpt: AudioClip,
}

/// A track with every artifact transition planning needs
///
/// Construction precomputes the instrumental and full-mix buffers so each
/// planner invocation slices instead of re-mixing.
#[derive(Debug, Clone)]
pub struct PreparedTrack {
    pub features: TrackFeatures,
    pub stems: StemSet,
    pub beats: BeatGrid,
    instrumental: AudioClip,
    full_mix: AudioClip,
}

impl PreparedTrack {
    pub fn new(features: TrackFeatures, stems: StemSet, beats: BeatGrid) -> Self {
        let instrumental = stems.instrumental();
        let full_mix = instrumental.overlay(&stems.vocals, 0.0);

        Self {
            features,
            stems,
            beats,
            instrumental,
            full_mix,
        }
    }

    /// Combined non-vocal layers (precomputed)
    pub fn instrumental(&self) -> &AudioClip {
        &self.instrumental
    }

    /// Full mix of all stems (precomputed)
    pub fn full_mix(&self) -> &AudioClip {
        &self.full_mix
    }

    /// Excerpt duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        self.full_mix.duration_ms()
    }
}
