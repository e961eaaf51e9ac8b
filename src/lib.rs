//! Real-time PLL timecode decoder and vinyl-control deck FSM.
//!
//! This crate is the per-buffer core described in the design: it turns a
//! stereo PCM timecode signal into a phase-locked pitch/position estimate
//! (`pll`) and a mode-mixing decision engine (`deck`) that drives a digital
//! audio file's playback as if it were the physical record. Everything
//! outside that — audio I/O, the UI, the host's preference store, the
//! generic control-value bus, and track metadata/loading — is the host's
//! responsibility; this crate only defines the narrow interfaces (`host`,
//! `config`) it needs from those collaborators.
//!
//! No allocation, locking, or I/O happens on the `Deck::process` hot path
//! except the one-time growth of reusable buffers when a host reconfigures
//! audio I/O (see the module docs on `deck` and `pitch_ring`).

#![forbid(unsafe_code)]

pub mod config;
pub mod deck;
pub mod display;
pub mod error;
pub mod host;
pub mod pitch_ring;
pub mod pll;
pub mod profile;
pub mod quality;
pub mod report;
pub mod steady;
pub mod track_select;

pub use config::{DeckConfig, ResolvedConfig, VinylSpeed};
pub use deck::Deck;
pub use error::{Error, Result};
pub use host::{ControlBus, Mode, VinylStatus};
pub use profile::{VinylFormat, VinylProfile};
pub use report::QualityReport;
