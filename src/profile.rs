//! Static per-format timecode parameters (C1).
//!
//! Values are taken from the known settings table for each supported
//! timecode pressing/CD: tone frequency and the three channel-routing
//! switches that distinguish one manufacturer's encoding from another.

use crate::error::Error;

/// Immutable per-format decode parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VinylProfile {
    /// Nominal carrier tone frequency in Hz at pitch 1.0.
    pub tone_freq_hz: u32,
    /// Swap L/R before treating (primary, secondary) as the complex sample.
    pub switch_primary: bool,
    /// Read the quadrature sense as negative rather than positive.
    pub switch_polarity: bool,
    /// Tone phase offset between channels is 270 degrees, not the usual 90.
    pub switch_phase: bool,
}

/// Recognized timecode format identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VinylFormat {
    Serato2a,
    Serato2b,
    SeratoCd,
    TraktorA,
    TraktorB,
    TraktorMk2A,
    TraktorMk2B,
    MixvibesV2,
    Mixvibes7inch,
}

/// Default format used when a config names an unrecognized `vinyl_type`.
pub const DEFAULT_FORMAT: VinylFormat = VinylFormat::Serato2a;

impl VinylFormat {
    /// Parse a host-facing identifier string (§4.1/§6.2).
    pub fn parse(id: &str) -> Result<Self, Error> {
        Ok(match id {
            "serato_2a" => VinylFormat::Serato2a,
            "serato_2b" => VinylFormat::Serato2b,
            "serato_cd" => VinylFormat::SeratoCd,
            "traktor_a" => VinylFormat::TraktorA,
            "traktor_b" => VinylFormat::TraktorB,
            "traktor_mk2_a" => VinylFormat::TraktorMk2A,
            "traktor_mk2_b" => VinylFormat::TraktorMk2B,
            "mixvibes_v2" => VinylFormat::MixvibesV2,
            "mixvibes_7inch" => VinylFormat::Mixvibes7inch,
            other => return Err(Error::UnknownProfile(other.to_string())),
        })
    }

    /// Whether this format is a timecoded CD rather than a vinyl pressing.
    ///
    /// CDs get tighter steady-pitch tolerances (§4.4) and are exempted from
    /// track-selection mode (§4.7) since there is no reliable "track 2"
    /// detection for them yet.
    pub fn is_cd(self) -> bool {
        matches!(self, VinylFormat::SeratoCd)
    }

    /// Look up the static decode parameters for this format.
    pub fn profile(self) -> VinylProfile {
        use VinylFormat::*;
        match self {
            Serato2a | Serato2b | SeratoCd => VinylProfile {
                tone_freq_hz: 1000,
                switch_primary: false,
                switch_polarity: false,
                switch_phase: false,
            },
            TraktorA | TraktorB => VinylProfile {
                tone_freq_hz: 2000,
                switch_primary: true,
                switch_polarity: true,
                switch_phase: true,
            },
            TraktorMk2A | TraktorMk2B => VinylProfile {
                tone_freq_hz: 2500,
                switch_primary: false,
                switch_polarity: true,
                switch_phase: true,
            },
            MixvibesV2 | Mixvibes7inch => VinylProfile {
                tone_freq_hz: 1300,
                switch_primary: false,
                switch_polarity: false,
                switch_phase: true,
            },
        }
    }
}
