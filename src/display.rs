//! Display-pitch filter (C6, §4.6).
//!
//! The raw smoothed pitch can show a misleading amount of variance — a
//! 0.1% wobble can read as a 1-2 BPM jump on screen — so the value shown
//! to the user converges slowly except on a hard start/stop, where it
//! snaps immediately.

const SNAP_THRESHOLD: f64 = 0.5;
const MEDIUM_THRESHOLD: f64 = 0.005;
const BETA_SNAP: f64 = 1.0;
const BETA_MEDIUM: f64 = 0.25;
const BETA_SLOW: f64 = 0.01;

/// Gate: at most one update per 50ms of file time.
const UPDATE_PERIOD_S: f64 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct DisplayPitchFilter {
    display: f64,
    last_update_s: f64,
}

impl Default for DisplayPitchFilter {
    fn default() -> Self {
        DisplayPitchFilter {
            display: 1.0,
            last_update_s: -1.0,
        }
    }
}

impl DisplayPitchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether it's time for another update, given the current file-time
    /// clock `now`. Also fires if `now` has gone backward (a seek), not
    /// just forward past the 50ms gate.
    pub fn should_update(&mut self, now: f64) -> bool {
        if self.last_update_s > now || now - self.last_update_s > UPDATE_PERIOD_S {
            self.last_update_s = now;
            true
        } else {
            false
        }
    }

    /// Step the filter toward `true_pitch` (smoothed pitch + drift correction).
    pub fn step(&mut self, true_pitch: f64) {
        let diff = true_pitch - self.display;
        let beta = if diff.abs() > SNAP_THRESHOLD {
            BETA_SNAP
        } else if diff.abs() > MEDIUM_THRESHOLD {
            BETA_MEDIUM
        } else {
            BETA_SLOW
        };
        self.display += beta * diff;
    }

    /// Value to publish as `rate_ratio`: the filtered display pitch when
    /// playing, not scratching, and within the sane display range; 1.0
    /// otherwise.
    pub fn published_rate_ratio(&self, playing: bool, scratching: bool) -> f64 {
        if playing && !scratching && self.display > 0.2 && self.display < 1.9 {
            self.display
        } else {
            1.0
        }
    }

    pub fn display_pitch(&self) -> f64 {
        self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_on_large_change() {
        let mut f = DisplayPitchFilter::new();
        f.step(0.0);
        assert_eq!(f.display_pitch(), 0.0);
    }

    #[test]
    fn converges_slowly_on_small_change() {
        let mut f = DisplayPitchFilter::new();
        f.step(1.001);
        // diff = 0.001 < MEDIUM_THRESHOLD -> slow beta.
        assert!((f.display_pitch() - (1.0 + 0.01 * 0.001)).abs() < 1e-12);
    }

    #[test]
    fn gate_fires_at_most_every_50ms() {
        let mut f = DisplayPitchFilter::new();
        assert!(f.should_update(0.0));
        assert!(!f.should_update(0.02));
        assert!(f.should_update(0.051));
    }

    #[test]
    fn gate_fires_on_backward_time() {
        let mut f = DisplayPitchFilter::new();
        assert!(f.should_update(10.0));
        assert!(f.should_update(2.0));
    }

    #[test]
    fn hides_out_of_range_or_scratching() {
        let mut f = DisplayPitchFilter::new();
        f.step(1.95);
        assert_eq!(f.published_rate_ratio(true, false), 1.0);
        f.step(1.0);
        // still converging, not exactly within range necessarily; force display
        for _ in 0..50 {
            f.step(1.0);
        }
        assert!(f.published_rate_ratio(true, true) == 1.0);
    }
}
