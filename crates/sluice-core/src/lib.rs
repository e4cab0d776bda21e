//! Core sluice library: bridges one agent conversation to an ordered
//! client event stream, with an out-of-band permission gate.

pub mod config;
pub mod engine;
pub mod logging;
pub mod permission;
pub mod sanitize;
pub mod session;
