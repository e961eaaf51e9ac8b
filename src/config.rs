//! Host-facing configuration (§6.2) and its validation/defaulting (§7).
//!
//! `DeckConfig` is what a host constructs from its own preferences store
//! (out of scope for this crate — see §1). `resolve()` turns it into a
//! `ResolvedConfig`, the infallible struct the decoder and deck actually
//! consume; resolving happens once, at enable time or on a preference
//! change, never inside the per-buffer path (§3 Lifecycles, §5).

use serde::{Deserialize, Serialize};

use crate::profile::{VinylFormat, VinylProfile, DEFAULT_FORMAT};

/// Vinyl rotation speed, §6.2 `vinyl_speed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VinylSpeed {
    #[serde(rename = "33")]
    Rpm33,
    #[serde(rename = "45")]
    Rpm45,
}

impl VinylSpeed {
    pub fn rpm(self) -> f64 {
        match self {
            VinylSpeed::Rpm33 => 100.0 / 3.0,
            VinylSpeed::Rpm45 => 45.0,
        }
    }
}

/// Default sample rate substituted when a host config reports zero.
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44_100;

/// Default and fallback latency, in milliseconds, per §6.2.
pub const DEFAULT_LATENCY_MS: u32 = 20;

/// Host-supplied, possibly-invalid configuration (§6.2 recognized keys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckConfig {
    pub vinyl_type: String,
    pub vinyl_speed: VinylSpeed,
    pub sample_rate_hz: u32,
    /// 1-200; values outside that range default to 20 (§6.2).
    pub latency_ms: u32,
    pub lead_in_s: f64,
    pub safe_zone_ms: i32,
    pub show_signal_quality: bool,
}

impl Default for DeckConfig {
    fn default() -> Self {
        DeckConfig {
            vinyl_type: "serato_2a".to_string(),
            vinyl_speed: VinylSpeed::Rpm33,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            latency_ms: DEFAULT_LATENCY_MS,
            lead_in_s: 0.0,
            safe_zone_ms: 0,
            show_signal_quality: false,
        }
    }
}

/// Fully-defaulted configuration ready to build a `Decoder`/`Deck` from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedConfig {
    pub format: VinylFormat,
    pub profile: VinylProfile,
    pub rpm_nominal: f64,
    pub sample_rate_hz: u32,
    pub latency_ms: u32,
    pub lead_in_s: f64,
    pub safe_zone_ms: i32,
    pub show_signal_quality: bool,
}

impl DeckConfig {
    /// Validate and default every recognized key (§6.2/§7 `ConfigInvalid`).
    ///
    /// Never fails: an unknown `vinyl_type` or an out-of-range `latency_ms`
    /// is logged and replaced with a documented default rather than
    /// surfaced to the caller, matching §7's "recovered locally by
    /// defaulting + warning; never surfaced to the audio path".
    pub fn resolve(&self) -> ResolvedConfig {
        let format = VinylFormat::parse(&self.vinyl_type).unwrap_or_else(|_| {
            log::warn!(
                "unknown vinyl_type '{}', defaulting to serato_2a",
                self.vinyl_type
            );
            DEFAULT_FORMAT
        });

        let latency_ms = if (1..=200).contains(&self.latency_ms) {
            self.latency_ms
        } else {
            log::warn!(
                "latency_ms {} out of range [1,200], defaulting to {}",
                self.latency_ms,
                DEFAULT_LATENCY_MS
            );
            DEFAULT_LATENCY_MS
        };

        let sample_rate_hz = if self.sample_rate_hz > 0 {
            self.sample_rate_hz
        } else {
            log::warn!(
                "sample_rate_hz is 0, defaulting to {}",
                DEFAULT_SAMPLE_RATE_HZ
            );
            DEFAULT_SAMPLE_RATE_HZ
        };

        ResolvedConfig {
            format,
            profile: format.profile(),
            rpm_nominal: self.vinyl_speed.rpm(),
            sample_rate_hz,
            latency_ms,
            lead_in_s: self.lead_in_s,
            safe_zone_ms: self.safe_zone_ms,
            show_signal_quality: self.show_signal_quality,
        }
    }
}
