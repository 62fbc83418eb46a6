//! Transition styles and weighted style selection
//!
//! Each style is a distinct synthesis algorithm in the planner; the enum
//! here is the tag that selects one. String tags from callers are parsed
//! at this boundary so unknown names fail once, up front, instead of deep
//! inside planning.

use crate::error::Error;
use rand::Rng;
use segue_common::config::StyleWeights;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transition style selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStyle {
    /// Beat-aligned crossfade of instrumentals with a staggered vocal
    /// handoff
    Crossfade,

    /// Hard cut with a short scratch effect between the tracks
    Scratch,

    /// Hard cut with a longer, wilder scratch effect
    CrazyScratch,

    /// Tempo-matched vocal swap over the source instrumental, then an
    /// instrumental handoff
    VocalCrossover,
}

impl TransitionStyle {
    pub fn all_variants() -> &'static [TransitionStyle] {
        &[
            TransitionStyle::Crossfade,
            TransitionStyle::Scratch,
            TransitionStyle::CrazyScratch,
            TransitionStyle::VocalCrossover,
        ]
    }

    fn tag(&self) -> &'static str {
        match self {
            TransitionStyle::Crossfade => "crossfade",
            TransitionStyle::Scratch => "scratch",
            TransitionStyle::CrazyScratch => "crazy_scratch",
            TransitionStyle::VocalCrossover => "vocal_crossover",
        }
    }
}

impl fmt::Display for TransitionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for TransitionStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crossfade" => Ok(TransitionStyle::Crossfade),
            "scratch" => Ok(TransitionStyle::Scratch),
            "crazy_scratch" => Ok(TransitionStyle::CrazyScratch),
            "vocal_crossover" => Ok(TransitionStyle::VocalCrossover),
            other => Err(Error::UnsupportedTransitionStyle(other.to_string())),
        }
    }
}

/// Weighted random style selection
///
/// Probabilities come from configuration and need not sum to 1; they are
/// treated as relative weights. Callers that need deterministic output
/// pass an explicit style instead of choosing.
#[derive(Debug, Clone)]
pub struct StyleChooser {
    weights: StyleWeights,
}

impl StyleChooser {
    pub fn new(weights: StyleWeights) -> Self {
        Self { weights }
    }

    /// Choose a style using the provided RNG
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> TransitionStyle {
        let entries = [
            (TransitionStyle::Crossfade, self.weights.crossfade),
            (TransitionStyle::Scratch, self.weights.scratch),
            (TransitionStyle::CrazyScratch, self.weights.crazy_scratch),
            (TransitionStyle::VocalCrossover, self.weights.vocal_crossover),
        ];

        let total: f64 = entries.iter().map(|(_, w)| w).sum();
        let mut roll = rng.gen_range(0.0..total.max(f64::MIN_POSITIVE));

        for (style, weight) in entries {
            if roll < weight {
                return style;
            }
            roll -= weight;
        }

        // Rounding at the top of the range lands on the last positive weight
        TransitionStyle::Crossfade
    }

    /// Choose a style using the thread-local RNG
    pub fn choose_default(&self) -> TransitionStyle {
        self.choose(&mut rand::thread_rng())
    }
}

impl Default for StyleChooser {
    fn default() -> Self {
        Self::new(StyleWeights::default())
    }
}
