//! Shared fixtures for engine integration tests
//!
//! Generates deterministic synthetic tracks: constant-valued stems (so
//! splice arithmetic is checkable sample-by-sample), uniform beat grids,
//! and stub collaborator implementations.

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use segue_common::TrackFeatures;
use segue_engine::analysis::{
    BeatGrid, BeatTracker, FeatureExtractor, PreparedTrack, StemSeparator, StemSet, TimeStretcher,
};
use segue_engine::audio::AudioClip;
use segue_engine::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Small test sample rate keeps fixtures light
pub const TEST_RATE: u32 = 8000;

/// Install a test log subscriber once; honors `RUST_LOG`
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Stereo clip holding one constant value
pub fn constant_clip(value: f32, duration_ms: u64) -> AudioClip {
    let frames = (TEST_RATE as u64 * duration_ms / 1000) as usize;
    AudioClip::new(vec![value; frames * 2], TEST_RATE, 2)
}

/// Four constant stems with distinct, non-clipping levels
///
/// vocals 0.08, drums 0.04, bass 0.02, other 0.01: instrumental sums to
/// 0.07 and the full mix to 0.15.
pub fn constant_stems(duration_ms: u64) -> StemSet {
    StemSet::new(
        constant_clip(0.08, duration_ms),
        constant_clip(0.04, duration_ms),
        constant_clip(0.02, duration_ms),
        constant_clip(0.01, duration_ms),
    )
    .expect("synthetic stems share one format")
}

/// Uniform beat grid: `count` beats spaced `interval_secs` apart,
/// starting one interval in
pub fn uniform_grid(interval_secs: f64, count: usize) -> BeatGrid {
    let beats = (1..=count).map(|i| i as f64 * interval_secs).collect();
    BeatGrid::new(beats).expect("uniform grid is strictly increasing")
}

pub fn features(bpm: f64, key: &str, loudness: f64, energy: f64) -> TrackFeatures {
    TrackFeatures {
        track_id: Uuid::new_v4(),
        tempo_bpm: bpm,
        camelot_key: key.to_string(),
        loudness_db: loudness,
        energy,
    }
}

/// A fully prepared 8-second track with beats every 250 ms
pub fn prepared_track(bpm: f64, key: &str) -> PreparedTrack {
    PreparedTrack::new(
        features(bpm, key, -8.0, 0.04),
        constant_stems(8000),
        uniform_grid(0.25, 32),
    )
}

/// Identity-at-ratio-one time stretch via nearest-sample resampling
///
/// Test double only: real implementations are pitch-preserving; this one
/// just honors the duration contract (output = input / ratio).
pub struct NearestStretcher;

impl TimeStretcher for NearestStretcher {
    fn stretch(&self, clip: &AudioClip, ratio: f64) -> Result<AudioClip> {
        if !(0.5..=2.0).contains(&ratio) {
            return Err(Error::AnalysisFailed(format!(
                "stretch ratio {ratio} outside [0.5, 2.0]"
            )));
        }

        let in_frames = clip.frames();
        let out_frames = (in_frames as f64 / ratio).round() as usize;
        let ch = clip.channels as usize;

        let mut samples = Vec::with_capacity(out_frames * ch);
        for frame in 0..out_frames {
            let src = ((frame as f64 * ratio) as usize).min(in_frames.saturating_sub(1));
            samples.extend_from_slice(&clip.samples[src * ch..(src + 1) * ch]);
        }

        Ok(AudioClip::new(samples, clip.sample_rate, clip.channels))
    }
}

/// Feature extractor backed by a pre-seeded map
pub struct MapExtractor {
    entries: HashMap<Uuid, TrackFeatures>,
}

impl MapExtractor {
    pub fn new(entries: impl IntoIterator<Item = TrackFeatures>) -> Self {
        Self {
            entries: entries.into_iter().map(|f| (f.track_id, f)).collect(),
        }
    }
}

impl FeatureExtractor for MapExtractor {
    fn extract(&self, track_id: Uuid, _clip: &AudioClip) -> Result<TrackFeatures> {
        self.entries
            .get(&track_id)
            .cloned()
            .ok_or_else(|| Error::AnalysisFailed(format!("unknown track {track_id}")))
    }
}

/// Extractor that always fails, for propagation tests
pub struct FailingExtractor;

impl FeatureExtractor for FailingExtractor {
    fn extract(&self, track_id: Uuid, _clip: &AudioClip) -> Result<TrackFeatures> {
        Err(Error::AnalysisFailed(format!(
            "analysis refused for {track_id}"
        )))
    }
}

/// Separator producing deterministic constant stems scaled off the input
/// clip's first sample
pub struct ConstantSeparator;

impl StemSeparator for ConstantSeparator {
    fn separate(&self, clip: &AudioClip) -> Result<StemSet> {
        let base = clip.samples.first().copied().unwrap_or(0.1);

        let stem = |scale: f32| {
            let mut s = clip.clone();
            s.samples.iter_mut().for_each(|v| *v = base * scale);
            s
        };

        StemSet::new(stem(0.8), stem(0.4), stem(0.2), stem(0.1))
    }
}

/// Beat tracker emitting a uniform 250 ms grid across the clip
pub struct UniformTracker;

impl BeatTracker for UniformTracker {
    fn beat_grid(&self, clip: &AudioClip) -> Result<BeatGrid> {
        let count = (clip.duration_ms() / 250) as usize;
        Ok(uniform_grid(0.25, count))
    }
}

/// Collaborator bundle wiring all stubs together
pub fn stub_collaborators(
    extractor: Arc<dyn FeatureExtractor>,
) -> segue_engine::pipeline::Collaborators {
    segue_engine::pipeline::Collaborators {
        features: extractor,
        stems: Arc::new(ConstantSeparator),
        beats: Arc::new(UniformTracker),
        stretcher: Arc::new(NearestStretcher),
    }
}
