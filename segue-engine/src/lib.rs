//! # Segue Engine
//!
//! The mix-assembly engine: orders an unordered set of tracks into a
//! playlist and synthesizes the audio that bridges each adjacent pair
//! into one continuous, gapless mix.
//!
//! The engine does not acquire audio, estimate features, separate stems,
//! or encode output; those subsystems plug in through the contracts in
//! [`analysis`]. What lives here:
//!
//! - [`scoring`]: harmonic/tempo/loudness/energy compatibility scoring
//! - [`sequencer`]: greedy playlist construction over feature vectors
//! - [`planner`]: cut-point selection and per-style bridge synthesis
//! - [`assembler`]: sequential splicing with carried-offset state
//! - [`pipeline`]: tokio orchestration with one-pair-ahead prefetch
//! - [`audio`]: PCM buffer compositing primitives

pub mod analysis;
pub mod assembler;
pub mod audio;
pub mod error;
pub mod pipeline;
pub mod planner;
pub mod scoring;
pub mod sequencer;
pub mod styles;

pub use analysis::{BeatGrid, PreparedTrack, StemSet, TrackSource};
pub use assembler::{Assembly, FinalMix, TimelineAssembler};
pub use audio::AudioClip;
pub use error::{Error, Result};
pub use planner::{EffectBank, TransitionClip, TransitionPlanner};
pub use scoring::TransitionScorer;
pub use sequencer::{MixPlan, PlaylistSequencer};
pub use styles::{StyleChooser, TransitionStyle};
