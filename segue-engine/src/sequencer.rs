//! Greedy playlist sequencing
//!
//! Orders an unordered set of track feature vectors into a mix plan by
//! repeatedly choosing the best-scoring successor for the current track.
//! The pool and output are owned collections threaded through the call,
//! not module state, so each step is independently testable.
//!
//! Sequencing degrades gracefully: when no remaining candidate clears the
//! score threshold the plan ends there, keeping every track placed so far.
//! Only an empty input set is an error.

use crate::error::{Error, Result};
use crate::scoring::TransitionScorer;
use segue_common::TrackFeatures;
use tracing::{debug, warn};

/// An ordered playlist produced by the sequencer
///
/// No track id appears twice. `is_complete` distinguishes a plan that
/// consumed the whole input set from one that terminated early because no
/// candidate cleared the threshold.
#[derive(Debug, Clone)]
pub struct MixPlan {
    tracks: Vec<TrackFeatures>,
    complete: bool,
}

impl MixPlan {
    pub fn tracks(&self) -> &[TrackFeatures] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Whether every input track was placed
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Consume the plan, yielding the ordered tracks
    pub fn into_tracks(self) -> Vec<TrackFeatures> {
        self.tracks
    }
}

/// Greedy chain builder over a pool of unused tracks
#[derive(Debug, Clone, Default)]
pub struct PlaylistSequencer {
    scorer: TransitionScorer,
}

impl PlaylistSequencer {
    pub fn new(scorer: TransitionScorer) -> Self {
        Self { scorer }
    }

    /// Order `tracks` into a mix plan
    ///
    /// The first input track seeds the chain (stable input order is the
    /// tie-break). Each step moves the best-scoring candidate from the
    /// pool to the plan and makes it the new chain head.
    ///
    /// # Errors
    /// `EmptyInput` when `tracks` is empty. Threshold exhaustion is not an
    /// error; it ends the plan early with `is_complete() == false`.
    pub fn sequence(&self, tracks: Vec<TrackFeatures>) -> Result<MixPlan> {
        let mut pool = tracks;
        if pool.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut ordered = Vec::with_capacity(pool.len());
        ordered.push(pool.remove(0));

        // Single-track input: nothing to score
        if pool.is_empty() {
            return Ok(MixPlan {
                tracks: ordered,
                complete: true,
            });
        }

        while !pool.is_empty() {
            let current = ordered.last().expect("plan is never empty here");

            match self.scorer.best_candidate(current, &pool) {
                Ok(index) => {
                    // Plain remove keeps the pool in stable input order for
                    // later tie-breaks
                    let chosen = pool.remove(index);
                    debug!(
                        score = self.scorer.score(current, &chosen),
                        from = %current.track_id,
                        to = %chosen.track_id,
                        "sequenced next track"
                    );
                    ordered.push(chosen);
                }
                Err(Error::NoCandidates) => {
                    warn!(
                        placed = ordered.len(),
                        remaining = pool.len(),
                        "no candidate cleared the score threshold; ending plan early"
                    );
                    return Ok(MixPlan {
                        tracks: ordered,
                        complete: false,
                    });
                }
                Err(other) => return Err(other),
            }
        }

        Ok(MixPlan {
            tracks: ordered,
            complete: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segue_common::config::ScoringWeights;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn track(bpm: f64, key: &str, loudness: f64, energy: f64) -> TrackFeatures {
        TrackFeatures {
            track_id: Uuid::new_v4(),
            tempo_bpm: bpm,
            camelot_key: key.to_string(),
            loudness_db: loudness,
            energy,
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        let sequencer = PlaylistSequencer::default();
        assert!(matches!(
            sequencer.sequence(vec![]),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_single_track_plan() {
        let sequencer = PlaylistSequencer::default();
        let a = track(120.0, "8B", -8.0, 0.04);
        let id = a.track_id;

        let plan = sequencer.sequence(vec![a]).unwrap();
        assert_eq!(plan.len(), 1);
        assert!(plan.is_complete());
        assert_eq!(plan.tracks()[0].track_id, id);
    }

    #[test]
    fn test_best_match_follows_seed() {
        let sequencer = PlaylistSequencer::default();
        let a = track(120.0, "8B", -8.0, 0.04);
        let b = track(121.0, "9B", -9.0, 0.045);
        let c = track(95.0, "2A", -20.0, 0.01);
        let (ida, idb, idc) = (a.track_id, b.track_id, c.track_id);

        let plan = sequencer.sequence(vec![a, c, b]).unwrap();
        let order: Vec<_> = plan.tracks().iter().map(|t| t.track_id).collect();
        assert_eq!(order, vec![ida, idb, idc]);
        assert!(plan.is_complete());
    }

    #[test]
    fn test_no_duplicate_track_ids() {
        let sequencer = PlaylistSequencer::default();
        let tracks: Vec<_> = (0..8)
            .map(|i| track(100.0 + i as f64 * 3.0, "5A", -10.0 - i as f64, 0.02))
            .collect();

        let plan = sequencer.sequence(tracks).unwrap();
        let ids: HashSet<_> = plan.tracks().iter().map(|t| t.track_id).collect();
        assert_eq!(ids.len(), plan.len());
        assert_eq!(plan.len(), 8);
    }

    #[test]
    fn test_duplicate_features_terminate_partially() {
        let sequencer = PlaylistSequencer::default();
        let a = track(120.0, "8B", -8.0, 0.04);
        let mut twin = a.clone();
        twin.track_id = Uuid::new_v4();

        // The twin scores 0.0 against the seed and is filtered out
        let plan = sequencer.sequence(vec![a, twin]).unwrap();
        assert_eq!(plan.len(), 1);
        assert!(!plan.is_complete());
    }

    #[test]
    fn test_partial_plan_keeps_placed_tracks() {
        let sequencer = PlaylistSequencer::default();
        let a = track(120.0, "8B", -8.0, 0.04);
        let b = track(124.0, "9B", -9.0, 0.05);
        let b_twin = {
            let mut t = b.clone();
            t.track_id = Uuid::new_v4();
            t
        };

        // After a -> b, only b's twin remains and is rejected as a
        // near-duplicate of the new chain head
        let plan = sequencer.sequence(vec![a, b, b_twin]).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(!plan.is_complete());
    }

    #[test]
    fn test_zero_threshold_accepts_everything() {
        let weights = ScoringWeights {
            score_min: 0.0,
            ..ScoringWeights::default()
        };
        let sequencer = PlaylistSequencer::new(TransitionScorer::new(weights));

        let a = track(120.0, "8B", -8.0, 0.04);
        let twin = {
            let mut t = a.clone();
            t.track_id = Uuid::new_v4();
            t
        };

        let plan = sequencer.sequence(vec![a, twin]).unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan.is_complete());
    }
}
