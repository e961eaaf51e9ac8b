//! Crate-wide error type.
//!
//! Per the error-handling design, this is the *only* condition in the
//! crate that is ever returned as a hard `Result::Err`. Everything else a
//! real DJ rig can throw at the decoder — signal loss, phase unlock, a
//! missing position fix, a huge position jump — is a normal, expected
//! operating state and is represented with `Option`/status fields, not an
//! error, so it never has to be propagated out of the real-time path.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown vinyl profile: {0}")]
    UnknownProfile(String),
}

pub type Result<T> = std::result::Result<T, Error>;
