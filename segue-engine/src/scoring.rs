//! Transition scoring
//!
//! Scores how well one track follows another: a weighted sum of squared
//! distances over harmonic compatibility, tempo, loudness, and energy.
//! Lower is better; zero only for an identical feature vector with a
//! compatible key.

use crate::error::{Error, Result};
use segue_common::camelot::keys_compatible;
use segue_common::config::ScoringWeights;
use segue_common::TrackFeatures;

/// Flat penalty applied when the keys do not mix
const CAMELOT_PENALTY: f64 = 10.0;

/// Pairwise transition scorer
#[derive(Debug, Clone)]
pub struct TransitionScorer {
    weights: ScoringWeights,
}

impl TransitionScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a candidate transition; lower is better, never negative
    pub fn score(&self, source: &TrackFeatures, target: &TrackFeatures) -> f64 {
        let camelot_penalty = if keys_compatible(&source.camelot_key, &target.camelot_key) {
            0.0
        } else {
            CAMELOT_PENALTY
        };

        let tempo_diff = source.tempo_bpm - target.tempo_bpm;
        let loudness_diff = source.loudness_db - target.loudness_db;
        let energy_diff = source.energy - target.energy;

        self.weights.key * camelot_penalty.powi(2)
            + self.weights.tempo * tempo_diff.powi(2)
            + self.weights.loudness * loudness_diff.powi(2)
            + self.weights.energy * energy_diff.powi(2)
    }

    /// Pick the best candidate to follow `source`
    ///
    /// Candidates scoring below `score_min` are near-duplicates of the
    /// source and are excluded before ranking so the sequencer never
    /// chains a track to a copy of itself.
    ///
    /// # Returns
    /// Index into `candidates` of the lowest-scoring survivor, or
    /// `NoCandidates` when the filtered set is empty.
    pub fn best_candidate(
        &self,
        source: &TrackFeatures,
        candidates: &[TrackFeatures],
    ) -> Result<usize> {
        let mut best: Option<(usize, f64)> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            let score = self.score(source, candidate);
            if score < self.weights.score_min {
                continue;
            }

            // Ties keep the earliest candidate (stable input order)
            if best.map_or(true, |(_, best_score)| score < best_score) {
                best = Some((index, score));
            }
        }

        best.map(|(index, _)| index).ok_or(Error::NoCandidates)
    }
}

impl Default for TransitionScorer {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}
