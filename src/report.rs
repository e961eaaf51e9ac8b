//! Quality report pull API (§6.4).
//!
//! A snapshot a host UI can poll on its own schedule (e.g. to paint a
//! signal-quality meter or a spinning-platter indicator) without having to
//! shadow the deck's internal per-buffer bookkeeping.

/// One poll of the deck's current signal health.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityReport {
    /// Fraction of recent buffers with a valid position fix, in `[0, 1]`.
    pub timecode_quality: f32,
    /// Rotational angle in degrees `[0, 360)`, or `-1.0` if position or
    /// revolutions-per-second are unavailable.
    pub angle: f32,
}

/// Build a report from the decoder's current readings.
///
/// Angle is inverted relative to raw position ("to make vinyl spin
/// direction correct", per the source this is grounded on) and wraps at
/// 360 degrees.
pub fn build(timecode_quality: f32, position_ms: Option<i32>, rev_per_second: Option<f64>) -> QualityReport {
    let angle = match (position_ms, rev_per_second) {
        (Some(pos_ms), Some(rps)) => {
            let raw = (pos_ms as f64 / 1000.0 * 360.0 * rps).floor() as i64;
            let wrapped = raw.rem_euclid(360);
            (360 - wrapped) as f32 % 360.0
        }
        _ => -1.0,
    };

    QualityReport {
        timecode_quality,
        angle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_position_gives_negative_angle() {
        let r = build(0.8, None, Some(1.0));
        assert_eq!(r.angle, -1.0);
    }

    #[test]
    fn unavailable_rps_gives_negative_angle() {
        let r = build(0.8, Some(500), None);
        assert_eq!(r.angle, -1.0);
    }

    #[test]
    fn angle_wraps_within_0_360() {
        let r = build(1.0, Some(10_000), Some(100.0 / 3.0));
        assert!(r.angle >= 0.0 && r.angle < 360.0);
    }

    #[test]
    fn quality_passes_through() {
        let r = build(0.42, None, None);
        assert_eq!(r.timecode_quality, 0.42);
    }
}
