#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wiring for the `prefire` binary: configuration loading and the frame loop
//! that connects the world to audio, persistence and rendering.

pub mod config;
pub mod simulation;

pub use config::{AppConfig, ConfigError};
pub use simulation::Simulation;
