//! Steady-pitch monitors (C4, §4.4).
//!
//! Two independent instances run per deck, `subtle` and `gross`, each with
//! its own tolerance. Both score how long the observed pitch has stayed
//! within tolerance of a reference pitch: the score grows from 0 toward 1
//! over a convergence window as long as the pitch stays put, and collapses
//! back to 0 (re-anchoring the reference to the pitch that broke the
//! tolerance) the instant it doesn't.

/// Subtle tolerance on vinyl (§4.4).
pub const SUBTLE_TOLERANCE_VINYL: f64 = 0.12;
/// Subtle tolerance on a timecoded CD — CDJs hold pitch far more precisely.
pub const SUBTLE_TOLERANCE_CD: f64 = 0.06;
/// Gross (scratch-detection) tolerance on vinyl.
pub const GROSS_TOLERANCE_VINYL: f64 = 0.5;
/// Gross tolerance on CD.
pub const GROSS_TOLERANCE_CD: f64 = 0.25;

/// Time, in seconds, over which the score converges from 0 to 1 once the
/// pitch has settled within tolerance. Not given a numeric value by the
/// distilled spec ("growing window"); chosen as a one-second convergence
/// time, a conventional choice for a DJ-perceptible "has it settled yet"
/// signal. See `DESIGN.md`.
pub const CONVERGE_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
pub struct SteadyPitch {
    tolerance: f64,
    cd_mode: bool,
    pitch_ref: f64,
    time_ref: f64,
    score: f64,
}

impl SteadyPitch {
    pub fn new(tolerance: f64, cd_mode: bool) -> Self {
        SteadyPitch {
            tolerance,
            cd_mode,
            pitch_ref: 0.0,
            time_ref: 0.0,
            score: 0.0,
        }
    }

    pub fn cd_mode(&self) -> bool {
        self.cd_mode
    }

    /// Re-anchor the reference pitch/time and collapse the score to 0.
    pub fn reset(&mut self, pitch_ref: f64, time_ref: f64) {
        self.pitch_ref = pitch_ref;
        self.time_ref = time_ref;
        self.score = 0.0;
    }

    /// Score how steady `pitch` has been since the last re-anchor, given
    /// the current time `time` (file-position seconds, monotonic while
    /// playing). Returns the new score in `[0, 1]`.
    pub fn check(&mut self, pitch: f64, time: f64) -> f64 {
        if (pitch - self.pitch_ref).abs() > self.tolerance {
            self.reset(pitch, time);
            return self.score;
        }

        let elapsed = time - self.time_ref;
        self.score = (elapsed / CONVERGE_SECONDS).clamp(0.0, 1.0);
        self.score
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}
