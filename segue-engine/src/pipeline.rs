//! End-to-end mix pipeline
//!
//! Wires the collaborators, sequencer, planner, and assembler together.
//! Per-track analysis (feature extraction, stem separation, beat
//! tracking) is embarrassingly parallel and runs on blocking worker
//! threads; assembly stays strictly sequential, but while pair *i* is
//! being spliced the artifacts for pair *i+1* are already being prepared.
//!
//! Collaborator failures are not retried here; retry policy belongs to
//! the caller.

use crate::analysis::{
    BeatTracker, FeatureExtractor, PreparedTrack, StemSeparator, TimeStretcher, TrackSource,
};
use crate::assembler::Assembly;
use crate::audio::AudioClip;
use crate::error::{Error, Result};
use crate::planner::{EffectBank, TransitionPlanner};
use crate::scoring::TransitionScorer;
use crate::sequencer::{MixPlan, PlaylistSequencer};
use crate::styles::TransitionStyle;
use segue_common::config::EngineConfig;
use segue_common::TrackFeatures;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info};
use uuid::Uuid;

/// The external subsystems the pipeline drives
#[derive(Clone)]
pub struct Collaborators {
    pub features: Arc<dyn FeatureExtractor>,
    pub stems: Arc<dyn StemSeparator>,
    pub beats: Arc<dyn BeatTracker>,
    pub stretcher: Arc<dyn TimeStretcher>,
}

/// A finished pipeline run: the ordering decision plus the audio
#[derive(Debug)]
pub struct MixOutput {
    pub plan: MixPlan,
    pub mix: AudioClip,
}

/// Orchestrates sequencing and assembly over collaborator-produced
/// artifacts
pub struct MixPipeline {
    collaborators: Collaborators,
    config: EngineConfig,
    effects: EffectBank,
}

impl MixPipeline {
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Self {
        Self {
            collaborators,
            config,
            effects: EffectBank::default(),
        }
    }

    /// Attach effect samples for the scratch styles
    pub fn with_effects(mut self, effects: EffectBank) -> Self {
        self.effects = effects;
        self
    }

    /// Build a full mix from unordered track excerpts
    ///
    /// Extracts features concurrently, sequences, then assembles with the
    /// given style on every transition, prefetching each track's stems
    /// and beat grid one pair ahead.
    pub async fn build_mix(
        &self,
        sources: Vec<TrackSource>,
        style: TransitionStyle,
    ) -> Result<MixOutput> {
        let (features, mut clips) = self.extract_features(sources).await?;

        let sequencer =
            PlaylistSequencer::new(TransitionScorer::new(self.config.scoring.clone()));
        let plan = sequencer.sequence(features)?;
        info!(
            placed = plan.len(),
            complete = plan.is_complete(),
            "playlist sequenced"
        );

        let ordered = plan.tracks().to_vec();
        if ordered.len() < 2 {
            return Err(Error::InsufficientTracks(ordered.len()));
        }

        let planner = TransitionPlanner::new(self.config.planner.clone())
            .with_effects(self.effects.clone())
            .with_stretcher(self.collaborators.stretcher.clone());

        // Prepare the first two tracks concurrently, then stay one pair
        // ahead of the splice loop
        let first_handle = self.spawn_prepare(&ordered[0], &mut clips)?;
        let mut pending = Some(self.spawn_prepare(&ordered[1], &mut clips)?);
        let mut current = Self::join_prepare(first_handle).await?;

        let mut assembly = Assembly::new(current.stems.sample_rate(), current.stems.channels());
        let mut index = 1;

        while let Some(handle) = pending.take() {
            let target = Self::join_prepare(handle).await?;
            if index + 1 < ordered.len() {
                pending = Some(self.spawn_prepare(&ordered[index + 1], &mut clips)?);
            }

            assembly.push_pair(&planner, &current, &target, style)?;
            current = target;
            index += 1;
        }

        let mix = assembly.finish();
        info!(
            tracks = ordered.len(),
            duration_ms = mix.duration_ms(),
            "pipeline mix complete"
        );

        Ok(MixOutput { plan, mix })
    }

    /// Extract features for every source concurrently, preserving input
    /// order (the sequencer's tie-breaks depend on it)
    async fn extract_features(
        &self,
        sources: Vec<TrackSource>,
    ) -> Result<(Vec<TrackFeatures>, HashMap<Uuid, AudioClip>)> {
        let count = sources.len();
        let mut clips = HashMap::with_capacity(count);
        let mut set: JoinSet<(usize, Result<TrackFeatures>)> = JoinSet::new();

        for (index, source) in sources.into_iter().enumerate() {
            let extractor = self.collaborators.features.clone();
            let clip = source.excerpt.clone();
            let track_id = source.track_id;
            clips.insert(source.track_id, source.excerpt);

            set.spawn_blocking(move || (index, extractor.extract(track_id, &clip)));
        }

        let mut slots: Vec<Option<TrackFeatures>> = vec![None; count];
        while let Some(joined) = set.join_next().await {
            let (index, result) =
                joined.map_err(|e| Error::AnalysisFailed(format!("worker task failed: {e}")))?;
            debug!(index, "features extracted");
            slots[index] = Some(result?);
        }

        let features = slots
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| Error::AnalysisFailed("missing feature result".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((features, clips))
    }

    /// Spawn stem separation + beat tracking for one track on a worker
    /// thread
    fn spawn_prepare(
        &self,
        features: &TrackFeatures,
        clips: &mut HashMap<Uuid, AudioClip>,
    ) -> Result<JoinHandle<Result<PreparedTrack>>> {
        let clip = clips.remove(&features.track_id).ok_or_else(|| {
            Error::AnalysisFailed(format!("no excerpt for track {}", features.track_id))
        })?;

        let separator = self.collaborators.stems.clone();
        let tracker = self.collaborators.beats.clone();
        let features = features.clone();

        Ok(tokio::task::spawn_blocking(move || {
            let stems = separator.separate(&clip)?;
            let beats = tracker.beat_grid(&clip)?;
            Ok(PreparedTrack::new(features, stems, beats))
        }))
    }

    async fn join_prepare(handle: JoinHandle<Result<PreparedTrack>>) -> Result<PreparedTrack> {
        handle
            .await
            .map_err(|e| Error::AnalysisFailed(format!("worker task failed: {e}")))?
    }
}
