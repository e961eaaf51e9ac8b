//! Pitch-smoothing ring (C5, §4.5).
//!
//! While position is valid and play is on, every callback appends the
//! instantaneous vinyl pitch to a quarter-revolution window and the
//! smoothed pitch is the mean of what's in it. A full revolution's worth
//! of smoothing was tried upstream and found too "sticky" — noticeably
//! laggy pitch bends — hence the quarter-revolution sizing below.

/// Quarter-revolution window size per §3/B3: `floor(60000 / (rpm * latency_ms * 4))`.
pub fn window_size(rpm_nominal: f64, latency_ms: u32) -> usize {
    (60_000.0 / (rpm_nominal * latency_ms as f64 * 4.0)).floor() as usize
}

#[derive(Debug, Clone)]
pub struct PitchRing {
    buf: Vec<f64>,
    write_idx: usize,
    fill: usize,
}

impl PitchRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        PitchRing {
            buf: vec![0.0; capacity],
            write_idx: 0,
            fill: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn fill(&self) -> usize {
        self.fill
    }

    /// Grow capacity for a buffer-size/latency reconfiguration (§5: allowed
    /// to allocate exactly once per growth, outside the real-time path).
    /// No-op if `new_capacity` isn't larger than the current one.
    pub fn grow(&mut self, new_capacity: usize) {
        if new_capacity > self.buf.len() {
            self.buf.resize(new_capacity, 0.0);
        }
        self.clear();
    }

    pub fn push(&mut self, pitch: f64) {
        self.buf[self.write_idx] = pitch;
        self.write_idx = (self.write_idx + 1) % self.buf.len();
        self.fill = (self.fill + 1).min(self.buf.len());
    }

    pub fn clear(&mut self) {
        self.write_idx = 0;
        self.fill = 0;
    }

    /// Arithmetic mean of the filled entries, quantized to 1e-4.
    pub fn mean(&self) -> f64 {
        if self.fill == 0 {
            return 0.0;
        }
        let sum: f64 = self.buf[..self.fill].iter().sum();
        let avg = sum / self.fill as f64;
        (avg * 10_000.0).round() / 10_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn b3_window_size_formula() {
        assert_eq!(window_size(45.0, 20), (60_000.0 / (45.0 * 20.0 * 4.0)).floor() as usize);
        assert_eq!(window_size(100.0 / 3.0, 20), (60_000.0 / ((100.0 / 3.0) * 20.0 * 4.0)).floor() as usize);
        assert_ne!(window_size(45.0, 20), window_size(100.0 / 3.0, 20));
    }

    #[test]
    fn mean_is_quantized() {
        let mut ring = PitchRing::new(3);
        ring.push(1.00001);
        ring.push(1.00002);
        ring.push(1.00003);
        assert_eq!(ring.mean(), 1.0);
    }

    #[test]
    fn fill_never_exceeds_capacity() {
        let mut ring = PitchRing::new(4);
        for i in 0..10 {
            ring.push(i as f64);
            assert!(ring.fill() <= ring.capacity());
        }
        assert_eq!(ring.fill(), 4);
    }

    #[test]
    fn clear_empties_ring() {
        let mut ring = PitchRing::new(4);
        ring.push(1.0);
        ring.clear();
        assert_eq!(ring.fill(), 0);
        assert_eq!(ring.mean(), 0.0);
    }

    #[test]
    fn grow_only_upward() {
        let mut ring = PitchRing::new(4);
        ring.push(1.0);
        ring.grow(2);
        assert_eq!(ring.capacity(), 4);
        ring.grow(8);
        assert_eq!(ring.capacity(), 8);
        assert_eq!(ring.fill(), 0);
    }
}
