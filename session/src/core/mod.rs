//! Pure, deterministic sequencing logic.
//!
//! Everything here is free of I/O: given the same inputs (including the
//! injected RNG), every function returns the same outputs.

pub mod attention;
pub mod context;
pub mod sampler;
pub mod state;
pub mod timeline;
