//! Integration tests for timeline assembly
//!
//! Uses the same fixture geometry as the planner tests: 8-second tracks,
//! beats every 250 ms, minimum lead 1 s, so the first pair's clip runs
//! 6750 ms with a carry of 4250 ms.

mod helpers;

use helpers::{constant_stems, prepared_track, uniform_grid, NearestStretcher};
use segue_common::config::PlannerParams;
use segue_engine::analysis::PreparedTrack;
use segue_engine::assembler::{Assembly, TimelineAssembler};
use segue_engine::error::Error;
use segue_engine::planner::TransitionPlanner;
use segue_engine::styles::TransitionStyle;
use std::sync::Arc;

fn planner() -> TransitionPlanner {
    TransitionPlanner::new(PlannerParams {
        min_lead_secs: 1.0,
        ..PlannerParams::default()
    })
    .with_stretcher(Arc::new(NearestStretcher))
}

fn assembler() -> TimelineAssembler {
    TimelineAssembler::new(planner())
}

#[test]
fn test_too_few_tracks_rejected() {
    let assembler = assembler();

    let result = assembler.assemble(&[], TransitionStyle::Crossfade);
    assert!(matches!(result, Err(Error::InsufficientTracks(0))));

    let one = [prepared_track(120.0, "8B")];
    let result = assembler.assemble(&one, TransitionStyle::Crossfade);
    assert!(matches!(result, Err(Error::InsufficientTracks(1))));
}

#[test]
fn test_two_track_mix_length() {
    let tracks = [prepared_track(120.0, "8B"), prepared_track(121.0, "9B")];

    let mix = assembler()
        .assemble(&tracks, TransitionStyle::Crossfade)
        .unwrap();

    // First pair: lead trim clamps against the empty mix, tail trim is
    // zero, so the mix is exactly the clip
    assert_eq!(mix.duration_ms(), 6750);
}

#[test]
fn test_first_pair_lead_trim_clamps_on_empty_mix() {
    let tracks = [prepared_track(120.0, "8B"), prepared_track(121.0, "9B")];

    let mut assembly = Assembly::new(
        tracks[0].stems.sample_rate(),
        tracks[0].stems.channels(),
    );

    // lead_trim_ms on the first clip equals the whole source excerpt
    // (8000 ms) while the accumulated mix is empty; the trim must clamp
    assembly
        .push_pair(&planner(), &tracks[0], &tracks[1], TransitionStyle::Crossfade)
        .unwrap();

    assert_eq!(assembly.duration_ms(), 6750);
    assert_eq!(assembly.carry_ms(), 4250);
    assert_eq!(assembly.pairs_done(), 1);
}

#[test]
fn test_three_track_splice_arithmetic() {
    let tracks = [
        prepared_track(120.0, "8B"),
        prepared_track(121.0, "9B"),
        prepared_track(122.0, "10B"),
    ];
    let planner = planner();

    // Drive the loop manually, checking the threaded state at each step
    let mut assembly = Assembly::new(
        tracks[0].stems.sample_rate(),
        tracks[0].stems.channels(),
    );

    assembly
        .push_pair(&planner, &tracks[0], &tracks[1], TransitionStyle::Crossfade)
        .unwrap();
    let after_first = assembly.duration_ms();
    assert_eq!(after_first, 6750);
    assert_eq!(assembly.carry_ms(), 4250);

    // Second pair plans with elapsed = 4250: its clip re-renders the
    // middle track from its start, drops the already-played head
    // (tail trim 4250) and asks the mix to drop the stale remainder of
    // the middle track it is still holding (lead trim 8000 - 4250)
    let clip = planner
        .plan(&tracks[1], &tracks[2], TransitionStyle::Crossfade, 4250)
        .unwrap();
    assembly
        .push_pair(&planner, &tracks[1], &tracks[2], TransitionStyle::Crossfade)
        .unwrap();

    let expected = after_first - clip.lead_trim_ms
        + (clip.audio.duration_ms() - clip.tail_trim_ms);
    assert_eq!(assembly.duration_ms(), expected);
    assert_eq!(assembly.carry_ms(), clip.carry_ms);

    // And the one-call driver produces the identical mix
    let driven = assembler()
        .assemble(&tracks, TransitionStyle::Crossfade)
        .unwrap();
    assert_eq!(driven.samples, assembly.finish().samples);
}

#[test]
fn test_spliced_mix_has_no_duplicated_bridge_audio() {
    let tracks = [
        prepared_track(120.0, "8B"),
        prepared_track(121.0, "9B"),
        prepared_track(122.0, "10B"),
    ];
    let planner = planner();

    let first = planner
        .plan(&tracks[0], &tracks[1], TransitionStyle::Crossfade, 0)
        .unwrap();
    let second = planner
        .plan(&tracks[1], &tracks[2], TransitionStyle::Crossfade, first.carry_ms)
        .unwrap();

    let mix = assembler()
        .assemble(&tracks, TransitionStyle::Crossfade)
        .unwrap();

    // Total length: clip 1 with its stale tail dropped, plus clip 2
    // minus its already-played head
    let kept_from_first = first.audio.duration_ms() - second.lead_trim_ms;
    let kept_from_second = second.audio.duration_ms() - second.tail_trim_ms;
    assert_eq!(mix.duration_ms(), kept_from_first + kept_from_second);
}

#[test]
fn test_mixed_styles_per_pair() {
    let tracks = [
        prepared_track(120.0, "8B"),
        prepared_track(121.0, "9B"),
        prepared_track(122.0, "10B"),
    ];

    let effects = segue_engine::planner::EffectBank {
        scratch: Some(helpers::constant_clip(0.2, 1000)),
        crazy_scratch: None,
    };
    let planner = TransitionPlanner::new(PlannerParams {
        min_lead_secs: 1.0,
        ..PlannerParams::default()
    })
    .with_effects(effects);
    let assembler = TimelineAssembler::new(planner);

    let mix = assembler
        .assemble_with_styles(
            &tracks,
            &[TransitionStyle::Crossfade, TransitionStyle::Scratch],
        )
        .unwrap();

    // Crossfade pair leaves 6750 ms with carry 4250; the scratch pair's
    // clip is 4250 (cue at the carried offset) + 600 (effect) + 8000
    // (full target), spliced with lead trim 3750 and tail trim 4250
    assert_eq!(mix.duration_ms(), 6750 - 3750 + (4250 + 600 + 8000 - 4250));
}

#[test]
fn test_pair_failures_carry_the_pair_index() {
    let sparse_middle = PreparedTrack::new(
        helpers::features(121.0, "9B", -9.0, 0.045),
        constant_stems(8000),
        uniform_grid(0.25, 5),
    );
    let tracks = [
        prepared_track(120.0, "8B"),
        sparse_middle,
        prepared_track(122.0, "10B"),
    ];

    // Pair 0 fails immediately: the middle track cannot serve as a
    // crossfade target with only 5 beats
    let result = assembler().assemble(&tracks, TransitionStyle::Crossfade);
    match result {
        Err(Error::PairFailed { pair, reason }) => {
            assert_eq!(pair, 0);
            assert!(matches!(*reason, Error::InsufficientBeatData { .. }));
        }
        other => panic!("expected PairFailed, got {other:?}"),
    }
}
