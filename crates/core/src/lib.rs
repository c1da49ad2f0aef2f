//! Core primitives for the Sharp SM83 (Game Boy CPU) engine.
//!
//! The engine lives in [`cpu_sm83`]; [`fixture`] runs single-step conformance
//! cases against it and [`logging`] is the shared diagnostics facility.

pub mod cpu_sm83;
pub mod fixture;
pub mod logging;

/// A CPU-like component that can be stepped; returns T-cycles consumed.
pub trait Cpu {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Return to the power-on state.
    fn reset(&mut self);

    /// Execute exactly one instruction.
    fn step(&mut self) -> Result<u32, Self::Error>;
}
