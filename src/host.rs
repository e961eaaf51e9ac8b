//! Host scalar bus (C9, §6.3, §9).
//!
//! The deck never reaches into a global registry for host state. Instead
//! it is handed a capability set at construction: read a named scalar,
//! write a named scalar, optionally subscribe to changes. Named scalars
//! use the identifiers below so host and deck agree without either side
//! owning a shared enum.

/// Something the deck can read host-owned scalars from and write
/// deck-owned scalars to. The host implements this over whatever control
/// bus it already has; this crate has no opinion on its representation.
pub trait ControlBus {
    fn read(&self, name: &str) -> f64;
    fn write(&mut self, name: &str, value: f64);

    /// Register for change notifications on a scalar. Most hosts poll
    /// instead (the deck itself never needs push notification — see §5,
    /// "mode reads from the host are taken once at the top of the
    /// callback"), so the default is a no-op.
    fn subscribe(&mut self, _name: &str, _handler: Box<dyn FnMut(f64) + Send>) {}
}

/// Input scalar names (§6.3).
pub mod inputs {
    pub const ENABLED: &str = "enabled";
    pub const WANT_ENABLED: &str = "want_enabled";
    pub const MODE: &str = "mode";
    pub const PLAY_BUTTON: &str = "play_button";
    pub const REVERSE_BUTTON: &str = "reverse_button";
    pub const PLAY_POS: &str = "play_pos";
    pub const LOOP_ENABLED: &str = "loop_enabled";
    pub const CUEING: &str = "cueing";
    pub const SCRATCHING: &str = "scratching";
    pub const TRACK_SAMPLES: &str = "track_samples";
    pub const TRACK_SAMPLE_RATE: &str = "track_sample_rate";
    pub const DURATION: &str = "duration";
    pub const RATE_RATIO: &str = "rate_ratio";
    pub const VC_INPUT_GAIN: &str = "vc_input_gain";
}

/// Output scalar names (§6.3).
pub mod outputs {
    pub const MODE: &str = "mode";
    pub const SCRATCH_RATE: &str = "scratch_rate";
    pub const RATE_RATIO: &str = "rate_ratio";
    pub const PLAY_BUTTON: &str = "play_button";
    pub const VINYL_SEEK: &str = "vinyl_seek";
    pub const VINYL_STATUS: &str = "vinyl_status";
    pub const SCRATCHING: &str = "scratching";
    pub const SIGNAL_ENABLED: &str = "signal_enabled";
    pub const SELECT_TRACK_KNOB: &str = "select_track_knob";
    pub const LOAD_SELECTED_TRACK: &str = "load_selected_track";
}

/// `mode` scalar encoding (§6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Absolute = 0,
    Relative = 1,
    Constant = 2,
}

impl Mode {
    pub fn from_scalar(v: f64) -> Mode {
        match v.round() as i64 {
            0 => Mode::Absolute,
            2 => Mode::Constant,
            _ => Mode::Relative,
        }
    }

    pub fn as_scalar(self) -> f64 {
        self as i32 as f64
    }
}

/// `vinyl_status` scalar encoding (§6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VinylStatus {
    Ok = 0,
    Warning = 1,
    Disabled = 2,
    Error = 3,
}

impl VinylStatus {
    pub fn as_scalar(self) -> f64 {
        self as i32 as f64
    }
}

/// `cueing`/relative-cue scalar value meaning "off" (§3 invariants).
pub const RELATIVE_CUE_OFF: f64 = 0.0;
