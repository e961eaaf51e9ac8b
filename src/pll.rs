//! PLL timecode decoder (C2, §4.2).
//!
//! The stereo timecode is two sinusoids in phase quadrature (90 or 270
//! degrees apart). Treating the (primary, secondary) channel pair as one
//! complex-valued baseband sample lets a single phase-locked loop recover
//! both the instantaneous carrier frequency (pitch) and its phase. The
//! decoder is amplitude-invariant (R2): a complex sample's phase doesn't
//! depend on its magnitude, and the only place magnitude matters is the
//! EMA-gated signal-level threshold in `submit`.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::profile::VinylProfile;

/// Minimum squared signal level (normalized [-1,1] samples) to consider the
/// timecode present at all.
pub const MIN_SIGNAL_SQ: f64 = 1e-3;

/// Level-detection averaging window, in tone cycles.
const LEVEL_WINDOW_CYCLES: f64 = 10.0;

/// Phase-error averaging window: `kappa_p = 1 / (PHASE_ERROR_AVG_STEPS + 1)`.
const PHASE_ERROR_AVG_STEPS: f64 = 100.0;

/// Pitch-average window used to schedule the adaptive loop gain.
/// Not specified numerically by source; chosen to match the phase-error
/// averaging window so both EMAs settle on a comparable timescale. See
/// `DESIGN.md` for the rationale.
const PITCH_AVG_STEPS: f64 = 100.0;

/// Phase-error gate for "PLL is locked" (5 degrees).
pub const PHASE_ERROR_LOCK_THRESHOLD: f64 = PI / 36.0;

/// Wrap a phase into (-pi, pi].
fn wrap_phase(mut p: f64) -> f64 {
    const TAU: f64 = 2.0 * PI;
    p %= TAU;
    if p <= -PI {
        p += TAU;
    } else if p > PI {
        p -= TAU;
    }
    p
}

/// Owns the running PLL state for one deck's timecode decode (§3 `DecoderState`).
#[derive(Debug, Clone)]
pub struct Decoder {
    sample_rate_hz: u32,
    rpm_nominal: f64,
    profile: VinylProfile,

    phase_est: f64,
    freq_est: f64,

    phase_error: f64,
    phase_error_avg: f64,

    level_sq_avg: f64,
    pitch_avg: f64,

    have_signal: bool,
}

impl Decoder {
    pub fn new(profile: VinylProfile, sample_rate_hz: u32, rpm_nominal: f64) -> Self {
        Decoder {
            sample_rate_hz,
            rpm_nominal,
            profile,
            phase_est: 0.0,
            freq_est: 0.0,
            phase_error: 0.0,
            phase_error_avg: PI,
            level_sq_avg: 0.0,
            pitch_avg: 0.0,
            have_signal: false,
        }
    }

    fn kappa_level(&self) -> f64 {
        let w = LEVEL_WINDOW_CYCLES * self.sample_rate_hz as f64 / self.profile.tone_freq_hz as f64;
        1.0 / (w + 1.0)
    }

    fn reset_pll(&mut self) {
        self.phase_est = 0.0;
        self.freq_est = 0.0;
        self.phase_error_avg = PI;
        self.pitch_avg = 0.0;
        self.have_signal = false;
    }

    /// Submit one audio buffer of interleaved stereo `f32` samples.
    ///
    /// `pcm.len()` must be `2 * n_frames`; extra trailing samples (when a
    /// caller over-allocates a reusable buffer) are ignored. Returns
    /// whether the running signal level is currently above threshold
    /// (B1: `n_frames == 0` is a no-op and returns the prior state
    /// unchanged; B2: a single sub-threshold buffer immediately resets
    /// the loop).
    pub fn submit(&mut self, pcm: &[f32], n_frames: usize) -> bool {
        if n_frames == 0 {
            return self.have_signal;
        }

        let kappa_l = self.kappa_level();
        let kappa_p = 1.0 / (PHASE_ERROR_AVG_STEPS + 1.0);
        let kappa_r = 1.0 / (PITCH_AVG_STEPS + 1.0);

        for i in 0..n_frames {
            let left = pcm[2 * i] as f64;
            let right = pcm[2 * i + 1] as f64;
            // `switch_polarity`/`switch_phase` describe how the two tones'
            // quadrature relationship maps onto bit values for absolute
            // position decoding (§9); that decoder is a stub, and the
            // pitch/PLL path here only ever consumes `switch_primary`,
            // matching the source decoder it's grounded on.
            let (primary, secondary) = if self.profile.switch_primary {
                (left, right)
            } else {
                (right, left)
            };
            let sample = Complex64::new(primary, secondary);

            let level_sq = sample.norm_sqr();
            self.level_sq_avg = level_sq * kappa_l + self.level_sq_avg * (1.0 - kappa_l);

            self.have_signal = self.level_sq_avg >= MIN_SIGNAL_SQ;
            if !self.have_signal {
                self.reset_pll();
                continue;
            }

            // Reference oscillator at the current phase estimate.
            let reference = Complex64::from_polar(1.0, self.phase_est);
            let err = (sample * reference.conj()).arg();
            self.phase_error = err;
            self.phase_error_avg = err * kappa_p + self.phase_error_avg * (1.0 - kappa_p);

            let alpha = if self.pitch_avg.abs() >= 1.0 {
                0.02
            } else {
                -0.03 * self.pitch_avg.abs() + 0.05
            };

            let correction = alpha * err;
            self.phase_est += correction;
            self.freq_est += 0.5 * alpha * correction;
            self.phase_est += self.freq_est;
            self.phase_est = wrap_phase(self.phase_est);

            let inst_tone_hz = self.freq_est * self.sample_rate_hz as f64 / (2.0 * PI);
            let inst_pitch = inst_tone_hz / self.profile.tone_freq_hz as f64;
            self.pitch_avg += kappa_r * (inst_pitch - self.pitch_avg);
        }

        self.have_signal
    }

    /// Detected carrier tone frequency in Hz, or `None` if the loop isn't
    /// locked (signed phase error average above the 5-degree gate — the
    /// gate is on the signed EMA, not its magnitude, matching the source
    /// this is grounded on; see `DESIGN.md`).
    pub fn tone_freq_hz(&self) -> Option<f64> {
        if self.phase_error_avg <= PHASE_ERROR_LOCK_THRESHOLD {
            Some(self.freq_est * self.sample_rate_hz as f64 / (2.0 * PI))
        } else {
            None
        }
    }

    /// Pitch: ratio of detected tone frequency to this format's nominal tone.
    pub fn pitch(&self) -> Option<f64> {
        self.tone_freq_hz()
            .map(|hz| hz / self.profile.tone_freq_hz as f64)
    }

    /// Revolutions per second implied by the current pitch.
    pub fn rev_per_second(&self) -> Option<f64> {
        self.pitch().map(|p| self.rpm_nominal * p / 60.0)
    }

    /// Absolute position within the timecode, in milliseconds. Stubbed —
    /// bit-decoding (LFSR correlation against the format's pseudorandom
    /// sequence) is not implemented; see §9. Always `None`.
    pub fn position_ms(&self) -> Option<i32> {
        None
    }

    /// Latest instantaneous phase error, in radians.
    pub fn phase_error(&self) -> f64 {
        self.phase_error
    }

    /// EMA of phase error, in radians — the PLL "lock quality" signal.
    pub fn phase_error_avg(&self) -> f64 {
        self.phase_error_avg
    }

    /// Whether the last submitted sample was above the signal-level gate.
    pub fn has_signal(&self) -> bool {
        self.have_signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::VinylFormat;

    fn synth_tone(freq_hz: f64, sample_rate_hz: u32, n_frames: usize, amplitude: f64) -> Vec<f32> {
        let mut pcm = Vec::with_capacity(n_frames * 2);
        for i in 0..n_frames {
            let t = i as f64 / sample_rate_hz as f64;
            let phase = 2.0 * PI * freq_hz * t;
            // Serato 2a: primary=right, secondary=left, no polarity/phase switch,
            // 90 degree quadrature -> right=cos, left=sin.
            pcm.push((amplitude * phase.sin()) as f32); // left
            pcm.push((amplitude * phase.cos()) as f32); // right
        }
        pcm
    }

    #[test]
    fn p1_phase_always_in_range() {
        let mut dec = Decoder::new(VinylFormat::Serato2a.profile(), 48_000, 100.0 / 3.0);
        let pcm = synth_tone(1000.0, 48_000, 48_000 / 2, 0.8);
        for chunk in pcm.chunks(2 * 64) {
            dec.submit(chunk, chunk.len() / 2);
            assert!(dec.phase_est > -PI && dec.phase_est <= PI + 1e-9);
        }
    }

    #[test]
    fn r1_locks_to_nominal_pitch() {
        let mut dec = Decoder::new(VinylFormat::Serato2a.profile(), 48_000, 100.0 / 3.0);
        let pcm = synth_tone(1000.0, 48_000, 48_000 / 2, 0.8);
        for chunk in pcm.chunks(2 * 512) {
            dec.submit(chunk, chunk.len() / 2);
        }
        let pitch = dec.pitch().expect("should be locked after 0.5s");
        assert!((pitch - 1.0).abs() <= 0.003, "pitch={pitch}");
        assert!(dec.phase_error_avg().abs() <= PHASE_ERROR_LOCK_THRESHOLD);
    }

    #[test]
    fn r2_amplitude_invariant() {
        let mut pitches = vec![];
        for amp in [0.1, 1.0, 5.0_f64] {
            let mut dec = Decoder::new(VinylFormat::Serato2a.profile(), 48_000, 100.0 / 3.0);
            let pcm = synth_tone(1000.0, 48_000, 48_000 / 2, amp);
            for chunk in pcm.chunks(2 * 512) {
                dec.submit(chunk, chunk.len() / 2);
            }
            pitches.push(dec.pitch().unwrap());
        }
        for p in &pitches[1..] {
            assert!((p - pitches[0]).abs() < 1e-6);
        }
    }

    #[test]
    fn b1_zero_frames_is_noop() {
        let mut dec = Decoder::new(VinylFormat::Serato2a.profile(), 48_000, 100.0 / 3.0);
        let before = dec.clone_state_for_test();
        assert!(!dec.submit(&[], 0));
        assert_eq!(before, dec.clone_state_for_test());
    }

    #[test]
    fn b2_sub_threshold_resets_pll() {
        let mut dec = Decoder::new(VinylFormat::Serato2a.profile(), 48_000, 100.0 / 3.0);
        let pcm = synth_tone(1000.0, 48_000, 4800, 0.8);
        for chunk in pcm.chunks(2 * 512) {
            dec.submit(chunk, chunk.len() / 2);
        }
        assert!(dec.pitch().is_some());

        let silence = vec![0.0f32; 2 * 64];
        assert!(!dec.submit(&silence, 64));
        assert!(dec.pitch().is_none());
        assert_eq!(dec.phase_error_avg(), PI);
    }

    #[test]
    fn r3_disable_then_enable_matches_fresh() {
        let profile = VinylFormat::Serato2a.profile();
        let mut dec = Decoder::new(profile, 48_000, 100.0 / 3.0);
        let pcm = synth_tone(1000.0, 48_000, 48_000, 0.8);
        for chunk in pcm.chunks(2 * 512) {
            dec.submit(chunk, chunk.len() / 2);
        }
        // Simulate "disabled then re-enabled" by dropping and rebuilding,
        // exactly what Deck::set_enabled(true) does after a prior disable.
        let rebuilt = Decoder::new(profile, 48_000, 100.0 / 3.0);
        assert_eq!(rebuilt.clone_state_for_test(), Decoder::new(profile, 48_000, 100.0 / 3.0).clone_state_for_test());
    }

    // Test-only helper exposing enough state to assert no-mutation / equality
    // without making every DSP field `pub`.
    impl Decoder {
        fn clone_state_for_test(&self) -> (u64, u64, u64, u64, u64, bool) {
            (
                self.phase_est.to_bits(),
                self.freq_est.to_bits(),
                self.phase_error_avg.to_bits(),
                self.level_sq_avg.to_bits(),
                self.pitch_avg.to_bits(),
                self.have_signal,
            )
        }
    }
}
