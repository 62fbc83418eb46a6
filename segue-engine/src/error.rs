//! Error types for the mix-assembly engine
//!
//! Sequencing failures degrade gracefully (the sequencer returns a partial
//! plan instead of erroring); the variants here are the failures that stop
//! a mix build or a single planner invocation. Collaborator retry policy
//! belongs to the calling layer, not here.

use thiserror::Error;

/// Convenience Result type using the engine Error
pub type Result<T> = std::result::Result<T, Error>;

/// Mix-assembly error taxonomy
#[derive(Error, Debug)]
pub enum Error {
    /// Sequencing was asked to order an empty track set
    #[error("No tracks to sequence")]
    EmptyInput,

    /// Every candidate was filtered out as a near-duplicate of the source
    #[error("No transition candidates cleared the score threshold")]
    NoCandidates,

    /// Timeline assembly needs at least two tracks
    #[error("Mix requires at least 2 tracks, got {0}")]
    InsufficientTracks(usize),

    /// Style tag has no implementation, or its required asset is missing
    #[error("Unsupported transition style: {0}")]
    UnsupportedTransitionStyle(String),

    /// Beat grid is too short for the cut points a style indexes into
    #[error("Beat grid too short: need {needed} beats, have {available}")]
    InsufficientBeatData { needed: usize, available: usize },

    /// Collaborator produced an error or a malformed artifact
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    /// A planner invocation failed for a specific pair of the mix plan
    #[error("Transition pair {pair}: {reason}")]
    PairFailed {
        /// Zero-based index of the (source, target) pair in the plan
        pair: usize,
        reason: Box<Error>,
    },
}

impl Error {
    /// Attach the failing pair index to an assembly-stage error
    pub fn for_pair(self, pair: usize) -> Error {
        Error::PairFailed {
            pair,
            reason: Box::new(self),
        }
    }
}
