//! External seams of the engine: participant front end and data sink.

pub mod frontend;
pub mod sink;
