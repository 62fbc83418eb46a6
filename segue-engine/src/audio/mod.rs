//! PCM buffer type and compositing primitives
//!
//! Everything the planner and assembler do to audio reduces to a small set
//! of operations on interleaved f32 buffers: slice, append, overlay, fade,
//! gain, normalize. All millisecond arithmetic clamps to buffer bounds, so
//! out-of-range windows produce shorter (possibly empty) clips rather than
//! panics.
//!
//! **Format:**
//! - Samples are f32 (floating point -1.0 to 1.0)
//! - Interleaved by channel: [L, R, L, R, ...] for stereo
//! - Mono clips are supported (channels = 1)

use segue_common::FadeCurve;

/// Decoded PCM audio, interleaved by channel
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    /// PCM samples, interleaved
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count (1 = mono, 2 = stereo)
    pub channels: u16,
}

/// Convert a dB gain to a linear amplitude factor
pub fn db_to_amplitude(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

impl AudioClip {
    /// Create a clip from interleaved samples
    ///
    /// # Panics
    /// Panics if the sample count is not a multiple of the channel count.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        assert!(channels > 0, "channel count must be positive");
        assert_eq!(
            samples.len() % channels as usize,
            0,
            "samples must form whole frames"
        );

        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Zero-length clip with the given format
    pub fn empty(sample_rate: u32, channels: u16) -> Self {
        Self::new(Vec::new(), sample_rate, channels)
    }

    /// Silent clip of the given duration
    pub fn silent(duration_ms: u64, sample_rate: u32, channels: u16) -> Self {
        let frames = (sample_rate as u64 * duration_ms / 1000) as usize;
        Self::new(vec![0.0; frames * channels as usize], sample_rate, channels)
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    /// Frame index for a millisecond offset (unclamped, saturating)
    fn frame_at_ms(&self, ms: u64) -> usize {
        ((self.sample_rate as u64).saturating_mul(ms) / 1000) as usize
    }

    /// Copy of the clip between two millisecond offsets
    ///
    /// Both bounds clamp to the clip length; an inverted or out-of-range
    /// window yields an empty clip.
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> AudioClip {
        let total = self.frames();
        let start = self.frame_at_ms(start_ms).min(total);
        let end = self.frame_at_ms(end_ms).min(total).max(start);

        let ch = self.channels as usize;
        AudioClip::new(
            self.samples[start * ch..end * ch].to_vec(),
            self.sample_rate,
            self.channels,
        )
    }

    /// Copy of the clip from a millisecond offset to the end
    pub fn tail_from_ms(&self, start_ms: u64) -> AudioClip {
        self.slice_ms(start_ms, u64::MAX / 1000)
    }

    /// Remove the final `ms` milliseconds in place, clamping at empty
    pub fn trim_tail_ms(&mut self, ms: u64) {
        let drop_frames = self.frame_at_ms(ms).min(self.frames());
        let keep = (self.frames() - drop_frames) * self.channels as usize;
        self.samples.truncate(keep);
    }

    /// Append another clip's samples
    ///
    /// # Panics
    /// Panics if the formats differ; callers normalize formats at the
    /// collaborator boundary before compositing.
    pub fn append(&mut self, other: &AudioClip) {
        assert_eq!(self.sample_rate, other.sample_rate, "sample rate mismatch");
        assert_eq!(self.channels, other.channels, "channel count mismatch");
        self.samples.extend_from_slice(&other.samples);
    }

    /// Concatenate clips into one
    ///
    /// # Panics
    /// Panics on an empty slice or mismatched formats.
    pub fn concat(parts: &[AudioClip]) -> AudioClip {
        let first = &parts[0];
        let mut out = AudioClip::empty(first.sample_rate, first.channels);
        out.samples
            .reserve(parts.iter().map(|p| p.samples.len()).sum());
        for part in parts {
            out.append(part);
        }
        out
    }

    /// Mix another clip on top of this one
    ///
    /// Output length equals this clip's length; the overlay is truncated
    /// where it is longer and leaves the base untouched where it is
    /// shorter. `gain_db` scales the overlay. Summed samples clamp to
    /// [-1.0, 1.0].
    pub fn overlay(&self, other: &AudioClip, gain_db: f32) -> AudioClip {
        assert_eq!(self.sample_rate, other.sample_rate, "sample rate mismatch");
        assert_eq!(self.channels, other.channels, "channel count mismatch");

        let gain = db_to_amplitude(gain_db);
        let mut samples = self.samples.clone();
        let n = samples.len().min(other.samples.len());
        for i in 0..n {
            samples[i] = (samples[i] + other.samples[i] * gain).clamp(-1.0, 1.0);
        }

        AudioClip::new(samples, self.sample_rate, self.channels)
    }

    /// Ramp the first `duration_ms` up from silence
    pub fn fade_in_ms(&mut self, duration_ms: u64, curve: FadeCurve) {
        let fade_frames = self.frame_at_ms(duration_ms).min(self.frames());
        if fade_frames == 0 {
            return;
        }

        let ch = self.channels as usize;
        for frame in 0..fade_frames {
            let t = frame as f32 / fade_frames as f32;
            let gain = curve.gain_in(t);
            for sample in &mut self.samples[frame * ch..(frame + 1) * ch] {
                *sample *= gain;
            }
        }
    }

    /// Ramp the final `duration_ms` down to silence
    pub fn fade_out_ms(&mut self, duration_ms: u64, curve: FadeCurve) {
        let total = self.frames();
        let fade_frames = self.frame_at_ms(duration_ms).min(total);
        if fade_frames == 0 {
            return;
        }

        let ch = self.channels as usize;
        let start = total - fade_frames;
        for frame in start..total {
            let t = (frame - start) as f32 / fade_frames as f32;
            let gain = curve.gain_out(t);
            for sample in &mut self.samples[frame * ch..(frame + 1) * ch] {
                *sample *= gain;
            }
        }
    }

    /// Scale all samples by a dB gain
    pub fn apply_gain_db(&mut self, db: f32) {
        let gain = db_to_amplitude(db);
        for sample in &mut self.samples {
            *sample *= gain;
        }
    }

    /// Scale so the peak amplitude hits 1.0
    ///
    /// Silent clips are left untouched.
    pub fn normalize(&mut self) {
        let peak = self.samples.iter().fold(0f32, |acc, s| acc.max(s.abs()));
        if peak > 0.0 {
            let gain = 1.0 / peak;
            for sample in &mut self.samples {
                *sample *= gain;
            }
        }
    }
}
