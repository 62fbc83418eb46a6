//! Timeline assembly
//!
//! Drives the planner across every adjacent pair of a mix plan and
//! splices the resulting clips into one gapless output buffer. Assembly
//! is strictly sequential: each pair's planning depends on the carried
//! offset produced by the previous pair, so pairs cannot be reordered or
//! parallelized (prefetching their *inputs* is the pipeline's job).
//!
//! The running state is explicit: `Assembly` owns the accumulated mix,
//! the carried offset, and the pair counter, and each `push_pair` call
//! advances all three. Nothing global, so the loop can be driven and
//! tested pair by pair with injected state.

use crate::analysis::PreparedTrack;
use crate::audio::AudioClip;
use crate::error::{Error, Result};
use crate::planner::TransitionPlanner;
use crate::styles::TransitionStyle;
use tracing::{debug, info};

/// The finished, concatenated output buffer
pub type FinalMix = AudioClip;

/// Running assembly state, advanced one pair at a time
#[derive(Debug)]
pub struct Assembly {
    mix: AudioClip,
    carry_ms: u64,
    pairs_done: usize,
}

impl Assembly {
    /// Start an empty assembly in the given audio format
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            mix: AudioClip::empty(sample_rate, channels),
            carry_ms: 0,
            pairs_done: 0,
        }
    }

    /// Carried offset for the next pair's source side, ms
    pub fn carry_ms(&self) -> u64 {
        self.carry_ms
    }

    /// Number of pairs spliced so far
    pub fn pairs_done(&self) -> usize {
        self.pairs_done
    }

    /// Accumulated duration so far, ms
    pub fn duration_ms(&self) -> u64 {
        self.mix.duration_ms()
    }

    /// Plan one pair and splice its clip onto the accumulated mix
    ///
    /// The clip's `lead_trim` drops the stale tail the mix is still
    /// holding from the previous pair (clamped: on the first pair it
    /// exceeds the accumulated length and trims nothing below empty),
    /// then the clip is appended with its own `tail_trim` head dropped.
    pub fn push_pair(
        &mut self,
        planner: &TransitionPlanner,
        source: &PreparedTrack,
        target: &PreparedTrack,
        style: TransitionStyle,
    ) -> Result<()> {
        let pair = self.pairs_done;
        let clip = planner
            .plan(source, target, style, self.carry_ms)
            .map_err(|e| e.for_pair(pair))?;

        if clip.audio.sample_rate != self.mix.sample_rate
            || clip.audio.channels != self.mix.channels
        {
            return Err(Error::AnalysisFailed(
                "track audio format does not match the mix format".to_string(),
            )
            .for_pair(pair));
        }

        self.mix.trim_tail_ms(clip.lead_trim_ms);
        self.mix.append(&clip.audio.tail_from_ms(clip.tail_trim_ms));
        self.carry_ms = clip.carry_ms;
        self.pairs_done += 1;

        debug!(
            pair,
            lead_trim_ms = clip.lead_trim_ms,
            tail_trim_ms = clip.tail_trim_ms,
            carry_ms = clip.carry_ms,
            mix_ms = self.mix.duration_ms(),
            "spliced transition clip"
        );

        Ok(())
    }

    /// Finish the assembly, yielding the final mix
    pub fn finish(self) -> FinalMix {
        self.mix
    }
}

/// Convenience driver: assembles a whole prepared plan in one call
pub struct TimelineAssembler {
    planner: TransitionPlanner,
}

impl TimelineAssembler {
    pub fn new(planner: TransitionPlanner) -> Self {
        Self { planner }
    }

    pub fn planner(&self) -> &TransitionPlanner {
        &self.planner
    }

    /// Assemble a mix using one style for every transition
    pub fn assemble(&self, tracks: &[PreparedTrack], style: TransitionStyle) -> Result<FinalMix> {
        let styles = vec![style; tracks.len().saturating_sub(1)];
        self.assemble_with_styles(tracks, &styles)
    }

    /// Assemble a mix with a per-pair style choice
    ///
    /// # Panics
    /// Panics if `styles` does not hold exactly one entry per adjacent
    /// pair.
    pub fn assemble_with_styles(
        &self,
        tracks: &[PreparedTrack],
        styles: &[TransitionStyle],
    ) -> Result<FinalMix> {
        if tracks.len() < 2 {
            return Err(Error::InsufficientTracks(tracks.len()));
        }
        assert_eq!(
            styles.len(),
            tracks.len() - 1,
            "one style per adjacent pair"
        );

        let first = &tracks[0].stems;
        let mut assembly = Assembly::new(first.sample_rate(), first.channels());

        for (pair, style) in tracks.windows(2).zip(styles) {
            assembly.push_pair(&self.planner, &pair[0], &pair[1], *style)?;
        }

        let mix = assembly.finish();
        info!(
            tracks = tracks.len(),
            duration_ms = mix.duration_ms(),
            "mix assembly complete"
        );
        Ok(mix)
    }
}
