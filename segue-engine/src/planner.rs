//! Transition planning and synthesis
//!
//! Given an ordered pair of prepared tracks and a transition style, the
//! planner chooses beat-aligned cut points and composites the bridging
//! audio from the pair's stems. Each invocation yields one
//! `TransitionClip`: a standalone-playable buffer spanning the source
//! excerpt's start through the target excerpt's end, plus the trim
//! markers the assembler uses to splice consecutive clips without
//! duplicated audio.
//!
//! The clip's trim markers encode the splice contract:
//! - `tail_trim_ms` equals the elapsed offset: the clip head up to that
//!   point was already emitted as the previous clip's tail.
//! - `lead_trim_ms` equals the source excerpt length minus the elapsed
//!   offset: the stale source-excerpt tail the accumulated mix is still
//!   holding from the previous pair.
//! - `carry_ms` is where in the target excerpt bridge processing ended;
//!   it becomes the next pair's elapsed offset.

use crate::analysis::{BeatGrid, PreparedTrack, TimeStretcher};
use crate::audio::AudioClip;
use crate::error::{Error, Result};
use crate::styles::TransitionStyle;
use segue_common::config::PlannerParams;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pre-recorded effect samples for the scratch styles
///
/// Loaded by the caller from fixed assets; the planner only truncates
/// them to the configured effect length.
#[derive(Debug, Clone, Default)]
pub struct EffectBank {
    pub scratch: Option<AudioClip>,
    pub crazy_scratch: Option<AudioClip>,
}

/// One planned transition: synthesized audio plus splice markers
#[derive(Debug, Clone)]
pub struct TransitionClip {
    /// The synthesized bridge, standalone-playable
    pub audio: AudioClip,

    /// Duration to drop from the end of the previously accumulated mix
    pub lead_trim_ms: u64,

    /// Duration to drop from the start of this clip when appending
    pub tail_trim_ms: u64,

    /// Position in the target excerpt where bridge processing ended;
    /// carried into the next pair as its elapsed offset
    pub carry_ms: u64,
}

/// Beat-aligned cut points on the source side
struct SourceWindow {
    /// Cue point: transition start, ms
    cue_ms: u64,

    /// End of the crossfade window, ms
    window_end_ms: u64,
}

impl SourceWindow {
    fn window_ms(&self) -> u64 {
        self.window_end_ms - self.cue_ms
    }
}

/// Plans and synthesizes one transition per invocation
pub struct TransitionPlanner {
    params: PlannerParams,
    effects: EffectBank,
    stretcher: Option<Arc<dyn TimeStretcher>>,
}

impl TransitionPlanner {
    pub fn new(params: PlannerParams) -> Self {
        Self {
            params,
            effects: EffectBank::default(),
            stretcher: None,
        }
    }

    /// Attach effect samples for the scratch styles
    pub fn with_effects(mut self, effects: EffectBank) -> Self {
        self.effects = effects;
        self
    }

    /// Attach the time-stretch collaborator (required for tempo-matched
    /// vocal crossover)
    pub fn with_stretcher(mut self, stretcher: Arc<dyn TimeStretcher>) -> Self {
        self.stretcher = Some(stretcher);
        self
    }

    pub fn params(&self) -> &PlannerParams {
        &self.params
    }

    /// Plan the transition from `source` into `target`
    ///
    /// `elapsed_ms` is the position in the source excerpt where the
    /// previous pair's bridge left the listener; zero for the first pair.
    pub fn plan(
        &self,
        source: &PreparedTrack,
        target: &PreparedTrack,
        style: TransitionStyle,
        elapsed_ms: u64,
    ) -> Result<TransitionClip> {
        debug!(
            style = %style,
            source = %source.features.track_id,
            target = %target.features.track_id,
            elapsed_ms,
            "planning transition"
        );

        let (src, tgt) = (&source.stems, &target.stems);
        if src.sample_rate() != tgt.sample_rate() || src.channels() != tgt.channels() {
            return Err(Error::AnalysisFailed(
                "source and target audio formats differ".to_string(),
            ));
        }

        match style {
            TransitionStyle::Crossfade => self.plan_crossfade(source, target, elapsed_ms),
            TransitionStyle::Scratch | TransitionStyle::CrazyScratch => {
                self.plan_scratch(source, target, style, elapsed_ms)
            }
            TransitionStyle::VocalCrossover => {
                self.plan_vocal_crossover(source, target, elapsed_ms)
            }
        }
    }

    /// Locate the cue beat: the first beat at or after the minimum lead
    /// time (or the elapsed offset, whichever is later)
    ///
    /// Falls back to the first beat when no beat clears the threshold.
    fn cue_index(&self, grid: &BeatGrid, elapsed_ms: u64) -> usize {
        let min_lead_secs = self.params.min_lead_secs.max(elapsed_ms as f64 / 1000.0);
        grid.first_at_or_after(min_lead_secs).unwrap_or(0)
    }

    /// Cue point only, for the hard-cut styles
    fn locate_cue(&self, grid: &BeatGrid, elapsed_ms: u64) -> Result<u64> {
        let index = self.cue_index(grid, elapsed_ms);
        grid.beat_ms(index).ok_or(Error::InsufficientBeatData {
            needed: index + 1,
            available: grid.len(),
        })
    }

    /// Cue point plus crossfade-window end, for the fading styles
    fn source_window(&self, grid: &BeatGrid, elapsed_ms: u64) -> Result<SourceWindow> {
        let index = self.cue_index(grid, elapsed_ms);
        let end_index = index + self.params.crossfade_beats;

        let (Some(cue_ms), Some(window_end_ms)) = (grid.beat_ms(index), grid.beat_ms(end_index))
        else {
            return Err(Error::InsufficientBeatData {
                needed: end_index + 1,
                available: grid.len(),
            });
        };

        Ok(SourceWindow {
            cue_ms,
            window_end_ms,
        })
    }

    /// Splice markers shared by every style
    fn markers(source: &PreparedTrack, elapsed_ms: u64, carry_ms: u64, audio: AudioClip) -> TransitionClip {
        let source_len_ms = source.duration_ms();
        TransitionClip {
            audio,
            lead_trim_ms: source_len_ms.saturating_sub(elapsed_ms),
            tail_trim_ms: elapsed_ms.min(source_len_ms),
            carry_ms,
        }
    }

    /// Beat-aligned crossfade
    ///
    /// Source instrumentals fade out across the window while its vocals
    /// drop out over a shorter sub-window; the target instrumental fades
    /// in from its cue beat. A second window of equal length brings the
    /// target vocals in; the remainder is the target's untouched full mix.
    fn plan_crossfade(
        &self,
        source: &PreparedTrack,
        target: &PreparedTrack,
        elapsed_ms: u64,
    ) -> Result<TransitionClip> {
        let window = self.source_window(&source.beats, elapsed_ms)?;
        let window_ms = window.window_ms();
        let curve = self.params.fade_curve;

        let target_index = self.params.target_cue_beat_index;
        let Some(target_cue_ms) = target.beats.beat_ms(target_index) else {
            return Err(Error::InsufficientBeatData {
                needed: target_index + 1,
                available: target.beats.len(),
            });
        };

        // Part 1: source full mix up to the cue
        let intro = source.full_mix().slice_ms(0, window.cue_ms);

        // Part 2: crossfade window
        let mut fading_instr = source
            .instrumental()
            .slice_ms(window.cue_ms, window.window_end_ms);
        fading_instr.fade_out_ms(window_ms, curve);

        let vocal_fade_ms = (window_ms as f64 * self.params.vocal_fade_fraction) as u64;
        let mut fading_vocals = source
            .stems
            .vocals
            .slice_ms(window.cue_ms, window.window_end_ms);
        fading_vocals.fade_out_ms(vocal_fade_ms, curve);

        let mut rising_instr = target
            .instrumental()
            .slice_ms(target_cue_ms, target_cue_ms + window_ms);
        rising_instr.fade_in_ms(window_ms, curve);

        let crossfade = fading_instr
            .overlay(&fading_vocals, 0.0)
            .overlay(&rising_instr, 0.0);

        // Part 3: target vocals fade in over the next window
        let handoff_end_ms = target_cue_ms + 2 * window_ms;
        let mut rising_vocals = target
            .stems
            .vocals
            .slice_ms(target_cue_ms + window_ms, handoff_end_ms);
        rising_vocals.fade_in_ms(window_ms, curve);

        let handoff = rising_vocals.overlay(
            &target
                .instrumental()
                .slice_ms(target_cue_ms + window_ms, handoff_end_ms),
            0.0,
        );

        // Part 4: target full mix, untouched
        let remainder = target.full_mix().tail_from_ms(handoff_end_ms);

        let audio = AudioClip::concat(&[intro, crossfade, handoff, remainder]);
        debug!(
            cue_ms = window.cue_ms,
            window_ms,
            target_cue_ms,
            "crossfade planned"
        );

        Ok(Self::markers(source, elapsed_ms, handoff_end_ms, audio))
    }

    /// Hard cut with an effect sample between the tracks
    fn plan_scratch(
        &self,
        source: &PreparedTrack,
        target: &PreparedTrack,
        style: TransitionStyle,
        elapsed_ms: u64,
    ) -> Result<TransitionClip> {
        let (effect, effect_ms) = match style {
            TransitionStyle::Scratch => (&self.effects.scratch, self.params.scratch_effect_ms),
            TransitionStyle::CrazyScratch => (
                &self.effects.crazy_scratch,
                self.params.crazy_scratch_effect_ms,
            ),
            _ => unreachable!("plan_scratch only handles the scratch styles"),
        };

        let effect = effect.as_ref().ok_or_else(|| {
            Error::UnsupportedTransitionStyle(format!("{style} (no effect clip loaded)"))
        })?;

        let mix = source.full_mix();
        if effect.sample_rate != mix.sample_rate || effect.channels != mix.channels {
            return Err(Error::AnalysisFailed(
                "effect clip format does not match track audio".to_string(),
            ));
        }

        let cue_ms = self.locate_cue(&source.beats, elapsed_ms)?;

        let intro = mix.slice_ms(0, cue_ms);
        let effect = effect.slice_ms(0, effect_ms);

        let audio = AudioClip::concat(&[intro, effect, target.full_mix().clone()]);
        debug!(cue_ms, effect_ms, "hard cut planned");

        // The target plays from its start, so nothing of its head is
        // consumed by the bridge
        Ok(Self::markers(source, elapsed_ms, 0, audio))
    }

    /// Tempo-matched vocal crossover
    ///
    /// Five phases: untouched source; a short crossfade swapping only the
    /// vocal layer to the tempo-matched target vocals; a tease window with
    /// the source instrumental under those vocals; a second crossfade
    /// swapping the instrumental layer; the target's untouched remainder.
    /// Target-side offsets in the last two phases are scaled by the
    /// stretch ratio, since the matched vocals run on the source timeline
    /// while the target's own buffers do not.
    fn plan_vocal_crossover(
        &self,
        source: &PreparedTrack,
        target: &PreparedTrack,
        elapsed_ms: u64,
    ) -> Result<TransitionClip> {
        let ratio = source.features.tempo_bpm / target.features.tempo_bpm;

        if ratio < self.params.tempo_ratio_min || ratio > self.params.tempo_ratio_max {
            warn!(
                ratio,
                band_min = self.params.tempo_ratio_min,
                band_max = self.params.tempo_ratio_max,
                "tempo alignment rejected; falling back to crossfade"
            );
            return self.plan_crossfade(source, target, elapsed_ms);
        }

        let Some(stretcher) = &self.stretcher else {
            warn!("no time-stretch collaborator attached; falling back to crossfade");
            return self.plan_crossfade(source, target, elapsed_ms);
        };

        let window = self.source_window(&source.beats, elapsed_ms)?;
        let curve = self.params.fade_curve;
        let fade_ms = self.params.vocal_crossfade_ms;
        let tease_ms = self.params.tease_ms;

        let mut matched_vocals = stretcher.stretch(&target.stems.vocals, ratio)?;
        if matched_vocals.sample_rate != target.stems.sample_rate()
            || matched_vocals.channels != target.stems.channels()
        {
            return Err(Error::AnalysisFailed(
                "time-stretch changed the audio format".to_string(),
            ));
        }
        matched_vocals.normalize();

        // Source-timeline anchors: the cue starts the vocal swap, the
        // window end anchors reads into the matched vocals
        let swap_ms = window.cue_ms;
        let anchor_ms = window.window_end_ms;
        let scaled = |ms: u64| (ms as f64 * ratio).round() as u64;

        // Phase 1: untouched source
        let intro = source
            .full_mix()
            .slice_ms(0, swap_ms.saturating_sub(fade_ms));

        // Phase 2: vocal swap, instrumental held from the source
        let mut outgoing_vocals = source
            .stems
            .vocals
            .slice_ms(swap_ms.saturating_sub(fade_ms), swap_ms);
        outgoing_vocals.fade_out_ms(fade_ms, curve);

        let mut incoming_vocals =
            matched_vocals.slice_ms(anchor_ms.saturating_sub(fade_ms), anchor_ms);
        incoming_vocals.fade_in_ms(fade_ms, curve);

        let vocal_swap = outgoing_vocals
            .overlay(
                &source
                    .instrumental()
                    .slice_ms(swap_ms.saturating_sub(fade_ms), swap_ms),
                0.0,
            )
            .overlay(&incoming_vocals, 0.0);

        // Phase 3: tease, source instrumental under the matched vocals
        let tease = source
            .instrumental()
            .slice_ms(swap_ms, swap_ms + tease_ms)
            .overlay(&matched_vocals.slice_ms(anchor_ms, anchor_ms + tease_ms), 0.0);

        // Phase 4: instrumental swap to the target's own instrumentals
        let mut outgoing_instr = source
            .instrumental()
            .slice_ms(swap_ms + tease_ms, swap_ms + tease_ms + fade_ms);
        outgoing_instr.fade_out_ms(fade_ms, curve);

        let mut incoming_instr = target.instrumental().slice_ms(
            scaled(anchor_ms + tease_ms),
            scaled(anchor_ms + tease_ms + fade_ms),
        );
        incoming_instr.fade_in_ms(fade_ms, curve);

        let instr_swap = outgoing_instr
            .overlay(
                &matched_vocals.slice_ms(anchor_ms + tease_ms, anchor_ms + tease_ms + fade_ms),
                0.0,
            )
            .overlay(&incoming_instr, 0.0);

        // Phase 5: target remainder on its own timeline
        let resume_ms = scaled(anchor_ms + tease_ms + fade_ms);
        let remainder = target.full_mix().tail_from_ms(resume_ms);

        let audio = AudioClip::concat(&[intro, vocal_swap, tease, instr_swap, remainder]);
        debug!(ratio, swap_ms, resume_ms, "vocal crossover planned");

        Ok(Self::markers(source, elapsed_ms, resume_ms, audio))
    }
}
