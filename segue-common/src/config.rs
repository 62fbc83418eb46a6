//! Engine configuration loading and defaults
//!
//! All tunable parameters for scoring, transition planning, and style
//! selection live here. Defaults are compiled in; a TOML file can override
//! any subset. Resolution priority order:
//! 1. Explicit path passed by the caller (highest priority)
//! 2. `SEGUE_CONFIG` environment variable
//! 3. Compiled defaults (fallback)

use crate::fade_curves::FadeCurve;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Environment variable naming a TOML config file
pub const CONFIG_ENV_VAR: &str = "SEGUE_CONFIG";

/// Transition scoring weights
///
/// Each term of the score is a squared distance scaled by its weight, so
/// weights compensate for the differing numeric ranges of the features.
/// Energy sits in [0, ~0.1] while tempo spans tens of BPM, which is why
/// energy carries a weight 40x the tempo weight; recalibrate the set
/// together, not one weight in isolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight on the squared Camelot penalty
    pub key: f64,

    /// Weight on squared BPM distance
    pub tempo: f64,

    /// Weight on squared loudness distance (dB)
    pub loudness: f64,

    /// Weight on squared normalized-energy distance
    pub energy: f64,

    /// Candidates scoring below this are treated as near-duplicates of the
    /// source and excluded from ranking
    pub score_min: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            key: 10.0,
            tempo: 5.0,
            loudness: 10.0,
            energy: 200.0,
            score_min: 0.01,
        }
    }
}

/// Transition planner parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerParams {
    /// Minimum time into the source before a transition may begin, seconds.
    /// Sized for full tracks; callers working on shorter analysis excerpts
    /// scale this down proportionally.
    pub min_lead_secs: f64,

    /// Crossfade window length in source beats
    pub crossfade_beats: usize,

    /// Beat index in the target grid where the incoming instrumental starts
    pub target_cue_beat_index: usize,

    /// Vocal fade-out length as a fraction of the crossfade window
    pub vocal_fade_fraction: f64,

    /// Vocal/instrumental switch crossfade length for the vocal-crossover
    /// style, milliseconds
    pub vocal_crossfade_ms: u64,

    /// Tease window length (source instrumental under target vocals),
    /// milliseconds
    pub tease_ms: u64,

    /// Tempo-ratio acceptance band for vocal crossover; outside the band
    /// the style falls back to crossfade
    pub tempo_ratio_min: f64,
    pub tempo_ratio_max: f64,

    /// Effect clip length for the scratch style, milliseconds
    pub scratch_effect_ms: u64,

    /// Effect clip length for the crazy-scratch style, milliseconds
    pub crazy_scratch_effect_ms: u64,

    /// Curve shape applied to planner fades
    pub fade_curve: FadeCurve,
}

impl Default for PlannerParams {
    fn default() -> Self {
        Self {
            min_lead_secs: 45.0,
            crossfade_beats: 4,
            target_cue_beat_index: 8,
            vocal_fade_fraction: 0.6,
            vocal_crossfade_ms: 3000,
            tease_ms: 10_000,
            tempo_ratio_min: 0.97,
            tempo_ratio_max: 1.03,
            scratch_effect_ms: 600,
            crazy_scratch_effect_ms: 750,
            fade_curve: FadeCurve::Linear,
        }
    }
}

/// Relative probabilities for random style selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleWeights {
    pub crossfade: f64,
    pub scratch: f64,
    pub crazy_scratch: f64,
    pub vocal_crossover: f64,
}

impl Default for StyleWeights {
    fn default() -> Self {
        Self {
            crossfade: 0.60,
            scratch: 0.25,
            crazy_scratch: 0.10,
            vocal_crossover: 0.05,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringWeights,
    pub planner: PlannerParams,
    pub styles: StyleWeights,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        config.validate()?;
        info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Resolve configuration following the priority order
    ///
    /// An explicit path wins; otherwise `SEGUE_CONFIG` is consulted; with
    /// neither set the compiled defaults are returned.
    pub fn resolve(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&path));
        }

        Ok(Self::default())
    }

    /// Validate parameter ranges
    pub fn validate(&self) -> Result<()> {
        let w = &self.scoring;
        if w.key < 0.0 || w.tempo < 0.0 || w.loudness < 0.0 || w.energy < 0.0 {
            return Err(Error::Config(
                "scoring weights must be non-negative".to_string(),
            ));
        }
        if w.score_min < 0.0 {
            return Err(Error::Config("score_min must be non-negative".to_string()));
        }

        let p = &self.planner;
        if p.crossfade_beats == 0 {
            return Err(Error::Config(
                "crossfade_beats must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&p.vocal_fade_fraction) {
            return Err(Error::Config(
                "vocal_fade_fraction must be within [0.0, 1.0]".to_string(),
            ));
        }
        if p.tempo_ratio_min <= 0.0 || p.tempo_ratio_max < p.tempo_ratio_min {
            return Err(Error::Config(
                "tempo ratio band must satisfy 0 < min <= max".to_string(),
            ));
        }

        let s = &self.styles;
        let total = s.crossfade + s.scratch + s.crazy_scratch + s.vocal_crossover;
        if total <= 0.0 || [s.crossfade, s.scratch, s.crazy_scratch, s.vocal_crossover]
            .iter()
            .any(|p| *p < 0.0)
        {
            return Err(Error::Config(
                "style weights must be non-negative with a positive sum".to_string(),
            ));
        }

        Ok(())
    }
}
