//! Small helpers shared across modules.

pub mod fingerprint;
